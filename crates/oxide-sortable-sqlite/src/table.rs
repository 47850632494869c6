//! Table layout of a sortable collection.

use oxide_sortable::SortableConfig;
use serde::Deserialize;

use crate::error::{Result, SqliteStoreError};

/// Describes where a sortable collection lives.
///
/// ```
/// use oxide_sortable_sqlite::SqliteOrderTable;
///
/// let table = SqliteOrderTable::new("chapters").scope_column("book_id");
/// assert!(table.validate().is_ok());
/// assert!(SqliteOrderTable::new("chapters; DROP TABLE x").validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteOrderTable {
    /// Table name.
    pub table: String,
    /// Integer primary key column.
    #[serde(default = "default_id_column")]
    pub id_column: String,
    /// Integer order column.
    #[serde(default = "default_order_column")]
    pub order_column: String,
    /// Foreign key column grouping siblings, if ordering is scoped.
    #[serde(default)]
    pub scope_column: Option<String>,
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_order_column() -> String {
    "order".to_string()
}

impl SqliteOrderTable {
    /// Creates a layout with `id` and `order` columns and no scope.
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            id_column: default_id_column(),
            order_column: default_order_column(),
            scope_column: None,
        }
    }

    /// Sets the primary key column.
    #[must_use]
    pub fn id_column(mut self, column: &str) -> Self {
        self.id_column = column.to_string();
        self
    }

    /// Sets the order column.
    #[must_use]
    pub fn order_column(mut self, column: &str) -> Self {
        self.order_column = column.to_string();
        self
    }

    /// Sets the scope (parent foreign key) column.
    #[must_use]
    pub fn scope_column(mut self, column: &str) -> Self {
        self.scope_column = Some(column.to_string());
        self
    }

    /// Returns the field names matching this table's columns, for
    /// [`OrderedView::with_config`](oxide_sortable::OrderedView::with_config).
    pub fn sortable_config(&self) -> SortableConfig {
        SortableConfig::new()
            .order_field(&self.order_column)
            .id_field(&self.id_column)
    }

    /// Maps an ordering field to its column.
    ///
    /// Column names win; the default field names `order` and `id` map to
    /// the order and id columns whatever those are called.
    pub(crate) fn column_for(&self, field: &str) -> Option<&str> {
        let defaults = SortableConfig::default();
        if field == self.order_column {
            Some(self.order_column.as_str())
        } else if field == self.id_column {
            Some(self.id_column.as_str())
        } else if field == defaults.order_field {
            Some(self.order_column.as_str())
        } else if field == defaults.id_field {
            Some(self.id_column.as_str())
        } else {
            None
        }
    }

    /// Checks every name is a plain identifier, since they are interpolated
    /// into SQL.
    pub fn validate(&self) -> Result<()> {
        let names = [&self.table, &self.id_column, &self.order_column]
            .into_iter()
            .chain(self.scope_column.as_ref());
        for name in names {
            if !is_identifier(name) {
                return Err(SqliteStoreError::InvalidIdentifier(name.clone()));
            }
        }
        Ok(())
    }

    /// Returns the SQL creating the table if it is missing.
    pub fn create_table_sql(&self) -> String {
        let scope = self
            .scope_column
            .as_deref()
            .map(|c| format!(", {} INTEGER", quote(c)))
            .unwrap_or_default();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({} INTEGER PRIMARY KEY AUTOINCREMENT{}, {} INTEGER)",
            quote(&self.table),
            quote(&self.id_column),
            scope,
            quote(&self.order_column),
        )
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Quotes an identifier; `order` is a keyword in SQLite.
pub(crate) fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("order"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("a\"b"));
        assert!(!is_identifier("name with space"));
    }

    #[test]
    fn test_validate_checks_scope_column() {
        let table = SqliteOrderTable::new("items").scope_column("list id");
        assert!(matches!(
            table.validate(),
            Err(SqliteStoreError::InvalidIdentifier(name)) if name == "list id"
        ));
    }

    #[test]
    fn test_create_table_sql() {
        let sql = SqliteOrderTable::new("items")
            .scope_column("list_id")
            .create_table_sql();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"items\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
             \"list_id\" INTEGER, \"order\" INTEGER)"
        );
    }

    #[test]
    fn test_deserialize_defaults() {
        let table: SqliteOrderTable =
            serde_json::from_str(r#"{"table":"slides","scope_column":"deck_id"}"#).unwrap();
        assert_eq!(table, SqliteOrderTable::new("slides").scope_column("deck_id"));
    }

    #[test]
    fn test_column_for_maps_default_field_names() {
        let table = SqliteOrderTable::new("slides")
            .id_column("slide_id")
            .order_column("position");
        assert_eq!(table.column_for("position"), Some("position"));
        assert_eq!(table.column_for("order"), Some("position"));
        assert_eq!(table.column_for("id"), Some("slide_id"));
        assert_eq!(table.column_for("title"), None);

        let config = table.sortable_config();
        assert_eq!(config.order_field, "position");
        assert_eq!(config.id_field, "slide_id");
    }
}

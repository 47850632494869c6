//! Ordering keys and the deterministic listing view.

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;
use crate::record::{OrderedRecord, Scope};
use crate::store::OrderStore;

/// Order direction for sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order (ASC)
    Asc,
    /// Descending order (DESC)
    Desc,
}

/// An ordering specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field to order by
    pub field: String,
    /// Order direction
    pub direction: OrderDirection,
}

impl OrderBy {
    /// Creates a new ascending order specification.
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: OrderDirection::Asc,
        }
    }

    /// Creates a new descending order specification.
    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: OrderDirection::Desc,
        }
    }

    /// Parses a Django-style order specification (`"-id"` is descending).
    pub fn parse(spec: &str) -> Self {
        spec.strip_prefix('-')
            .map_or_else(|| Self::asc(spec), Self::desc)
    }

    /// Returns the Django-style specification, the inverse of [`OrderBy::parse`].
    pub fn to_spec(&self) -> String {
        match self.direction {
            OrderDirection::Asc => self.field.clone(),
            OrderDirection::Desc => format!("-{}", self.field),
        }
    }

    /// Returns the SQL representation.
    pub fn to_sql(&self) -> String {
        match self.direction {
            OrderDirection::Asc => format!("{} ASC", self.field),
            OrderDirection::Desc => format!("{} DESC", self.field),
        }
    }
}

/// Names of the fields the ordering core works with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SortableConfig {
    /// Integer field holding the display position.
    pub order_field: String,
    /// Primary key field, used as tie-break.
    pub id_field: String,
}

impl Default for SortableConfig {
    fn default() -> Self {
        Self {
            order_field: "order".to_string(),
            id_field: "id".to_string(),
        }
    }
}

impl SortableConfig {
    /// Creates the default configuration (`order` / `id`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the order field name.
    #[must_use]
    pub fn order_field(mut self, name: &str) -> Self {
        self.order_field = name.to_string();
        self
    }

    /// Sets the primary key field name.
    #[must_use]
    pub fn id_field(mut self, name: &str) -> Self {
        self.id_field = name.to_string();
        self
    }

    /// The only ordering used to present a sortable collection:
    /// order ascending, then newest record first among equals.
    pub fn ordering_key(&self) -> Vec<OrderBy> {
        vec![OrderBy::asc(&self.order_field), OrderBy::desc(&self.id_field)]
    }
}

/// Reads a scope in its editing order.
///
/// Whatever default ordering the host would apply is ignored; records are
/// always returned by order ascending with ties broken on descending id.
#[derive(Debug)]
pub struct OrderedView<'a, S> {
    store: &'a S,
    config: SortableConfig,
}

impl<'a, S: OrderStore> OrderedView<'a, S> {
    /// Creates a view over `store` using the default field names.
    pub fn new(store: &'a S) -> Self {
        Self::with_config(store, SortableConfig::default())
    }

    /// Creates a view with custom field names.
    pub fn with_config(store: &'a S, config: SortableConfig) -> Self {
        Self { store, config }
    }

    /// Returns the `(field, direction)` pairs the view sorts by.
    pub fn ordering_key(&self) -> Vec<OrderBy> {
        self.config.ordering_key()
    }

    /// Renders the ordering key as an SQL `ORDER BY` body.
    pub fn sql_order_clause(&self) -> String {
        self.ordering_key()
            .iter()
            .map(OrderBy::to_sql)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Fetches every record of `scope` in editing order.
    pub async fn read(&self, scope: &Scope) -> Result<Vec<OrderedRecord>> {
        let ordering = self.ordering_key();
        let records = self.store.read_scope(scope, &ordering).await?;
        debug!(scope = %scope, count = records.len(), "Read ordered scope");
        Ok(records)
    }
}

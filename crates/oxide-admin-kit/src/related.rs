//! Change-list columns that follow relations.
//!
//! A `list_display` entry such as `address__city` walks from the row to its
//! `address` and shows that record's `city`. Prefixing the entry with
//! `link_to_` renders the final record as a link to its admin change page,
//! so `link_to_address` links to the row's address and
//! `link_to_address__country` to the address's country.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{AdminError, Result};
use crate::options::{push_unique, ModelAdmin};

/// Prefix of list_display entries rendered as admin links.
pub const LINK_PREFIX: &str = "link_to_";

/// Separator between relation hops in a list_display entry.
pub const PATH_SEPARATOR: &str = "__";

/// Read access to a record for column resolution.
pub trait RecordAccess {
    /// Returns the named attribute or related record, if present.
    fn attribute(&self, name: &str) -> Option<&Self>;

    /// Returns true for an unset value or a missing relation.
    fn is_null(&self) -> bool;

    /// Returns the text shown for the value.
    fn display(&self) -> String;

    /// Returns where the record is edited, if it is an admin-managed record.
    fn admin_target(&self) -> Option<AdminTarget>;
}

/// Identifies a record's admin change page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminTarget {
    /// Application the model belongs to.
    pub app_label: String,
    /// Lowercase model name.
    pub model_name: String,
    /// Primary key; `None` for records not saved yet.
    pub pk: Option<String>,
}

/// Builds admin URLs.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdminUrls {
    /// Path the admin is mounted at.
    pub prefix: String,
}

impl Default for AdminUrls {
    fn default() -> Self {
        Self {
            prefix: "/admin".to_string(),
        }
    }
}

impl AdminUrls {
    /// Creates URLs under `prefix`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Returns the change page URL, or `None` when the target has no pk.
    pub fn change_url(&self, target: &AdminTarget) -> Option<String> {
        let pk = target.pk.as_deref()?;
        Some(format!(
            "{}/{}/{}/{}/change/",
            self.prefix, target.app_label, target.model_name, pk
        ))
    }
}

/// A resolved change-list cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// A hop on the path was missing or null.
    Empty,
    /// The value's display text.
    Text(String),
    /// A related record linked to its change page.
    Link {
        /// Change page URL.
        url: String,
        /// The record's display text.
        text: String,
    },
}

/// A list_display entry that follows relations or links to a related record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedField {
    /// The list_display entry this field was parsed from.
    pub name: String,
    /// Attribute names walked from the row.
    pub path: Vec<String>,
    /// Whether the final record is rendered as a link.
    pub as_link: bool,
    /// Column title.
    pub short_description: String,
    /// Field the column sorts by.
    pub admin_order_field: String,
}

impl RelatedField {
    /// Parses a list_display entry; plain field names return `None`.
    ///
    /// ```
    /// use oxide_admin_kit::RelatedField;
    ///
    /// let field = RelatedField::parse("link_to_address__country_code").unwrap();
    /// assert_eq!(field.path, vec!["address", "country_code"]);
    /// assert!(field.as_link);
    /// assert_eq!(field.short_description, "Country Code");
    /// assert_eq!(field.admin_order_field, "address__country_code");
    ///
    /// assert!(RelatedField::parse("title").is_none());
    /// ```
    pub fn parse(name: &str) -> Option<Self> {
        let (as_link, target) = match name.strip_prefix(LINK_PREFIX) {
            Some(rest) => (true, rest),
            None => (false, name),
        };
        if target.is_empty() || (!as_link && !target.contains(PATH_SEPARATOR)) {
            return None;
        }

        let path: Vec<String> = target.split(PATH_SEPARATOR).map(str::to_string).collect();
        let short_description = path.last().map(|s| title_case(s)).unwrap_or_default();

        Some(Self {
            name: name.to_string(),
            path,
            as_link,
            short_description,
            admin_order_field: target.to_string(),
        })
    }

    /// Overrides the column title.
    #[must_use]
    pub fn short_description(mut self, title: &str) -> Self {
        self.short_description = title.to_string();
        self
    }

    /// Overrides the field the column sorts by.
    #[must_use]
    pub fn admin_order_field(mut self, field: &str) -> Self {
        self.admin_order_field = field.to_string();
        self
    }

    /// Walks the path from `record` and renders the value it reaches.
    pub fn resolve<R: RecordAccess>(&self, record: &R, urls: &AdminUrls) -> Cell {
        let mut current = record;
        for segment in &self.path {
            match current.attribute(segment) {
                Some(next) if !next.is_null() => current = next,
                _ => return Cell::Empty,
            }
        }

        let text = current.display();
        if !self.as_link {
            return Cell::Text(text);
        }
        match current
            .admin_target()
            .and_then(|target| urls.change_url(&target))
        {
            Some(url) => Cell::Link { url, text },
            None => Cell::Text(text),
        }
    }
}

/// `"country_code"` -> `"Country Code"`.
///
/// Every letter that follows a non-letter starts a word, so digits split
/// words too: `"address2city"` -> `"Address2City"`.
fn title_case(name: &str) -> String {
    let mut title = String::with_capacity(name.len());
    let mut in_word = false;
    for c in name.chars() {
        if in_word {
            title.extend(c.to_lowercase());
        } else {
            title.extend(c.to_uppercase());
        }
        in_word = c.is_alphabetic();
    }
    title.replace('_', " ")
}

/// Plans the relations to eager-load for a change list.
///
/// Includes the parent path of every dotted column, then every column (or
/// `link_to_` target) that is itself one of `foreign_keys`. Duplicates are
/// dropped and first-seen order is kept.
pub fn select_related(list_display: &[String], foreign_keys: &[&str]) -> Vec<String> {
    let targets: Vec<&str> = list_display
        .iter()
        .map(|field| field.strip_prefix(LINK_PREFIX).unwrap_or(field.as_str()))
        .collect();

    let mut related = Vec::new();
    for target in &targets {
        if let Some((parent, _)) = target.rsplit_once(PATH_SEPARATOR) {
            push_unique(&mut related, parent);
        }
    }
    for target in &targets {
        if foreign_keys.contains(target) {
            push_unique(&mut related, target);
        }
    }
    related
}

/// A [`ModelAdmin`] whose list_display may use related and linked columns.
#[derive(Debug, Clone)]
pub struct RelatedFieldAdmin {
    admin: ModelAdmin,
    related: Vec<RelatedField>,
    urls: AdminUrls,
}

impl RelatedFieldAdmin {
    /// Parses the related columns of `admin.list_display`.
    pub fn new(admin: ModelAdmin) -> Self {
        let related: Vec<RelatedField> = admin
            .list_display
            .iter()
            .filter_map(|name| RelatedField::parse(name))
            .collect();
        debug!(columns = related.len(), "Parsed related list_display columns");
        Self {
            admin,
            related,
            urls: AdminUrls::default(),
        }
    }

    /// Sets where the admin is mounted.
    #[must_use]
    pub fn urls(mut self, urls: AdminUrls) -> Self {
        self.urls = urls;
        self
    }

    /// Replaces the generated column for `field.name`.
    pub fn with_field(mut self, field: RelatedField) -> Result<Self> {
        let slot = self
            .related
            .iter_mut()
            .find(|f| f.name == field.name)
            .ok_or_else(|| {
                AdminError::InvalidField(format!("{:?} is not a related column", field.name))
            })?;
        *slot = field;
        Ok(self)
    }

    /// Returns the wrapped admin options.
    pub fn admin(&self) -> &ModelAdmin {
        &self.admin
    }

    /// Returns the related columns in list_display order.
    pub fn related_fields(&self) -> &[RelatedField] {
        &self.related
    }

    /// Returns the related column generated for a list_display entry.
    pub fn related_field(&self, name: &str) -> Option<&RelatedField> {
        self.related.iter().find(|f| f.name == name)
    }

    /// Returns the column titles.
    pub fn column_titles(&self) -> Vec<String> {
        self.admin
            .list_display
            .iter()
            .map(|name| match self.related_field(name) {
                Some(field) => field.short_description.clone(),
                None => title_case(name),
            })
            .collect()
    }

    /// Returns the relations to eager-load, see [`select_related`].
    pub fn select_related(&self, foreign_keys: &[&str]) -> Vec<String> {
        select_related(&self.admin.list_display, foreign_keys)
    }

    /// Renders one change-list row.
    pub fn row<R: RecordAccess>(&self, record: &R) -> Vec<Cell> {
        self.admin
            .list_display
            .iter()
            .map(|name| match self.related_field(name) {
                Some(field) => field.resolve(record, &self.urls),
                None => match record.attribute(name) {
                    Some(value) if !value.is_null() => Cell::Text(value.display()),
                    _ => Cell::Empty,
                },
            })
            .collect()
    }
}

/// JSON records: related records are nested objects, `"__str__"` holds the
/// display text and `"_meta"` the `app_label` / `model_name` pair.
impl RecordAccess for Value {
    fn attribute(&self, name: &str) -> Option<&Self> {
        self.get(name)
    }

    fn is_null(&self) -> bool {
        Value::is_null(self)
    }

    fn display(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Object(map) => match map.get("__str__") {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => self.to_string(),
            },
            other => other.to_string(),
        }
    }

    fn admin_target(&self) -> Option<AdminTarget> {
        let meta = self.get("_meta")?;
        let pk = match self.get("pk") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        };
        Some(AdminTarget {
            app_label: meta.get("app_label")?.as_str()?.to_string(),
            model_name: meta.get("model_name")?.as_str()?.to_string(),
            pk,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn customer() -> Value {
        json!({
            "pk": 1,
            "name": "Ada",
            "address": {
                "pk": 12,
                "__str__": "12 Analytical Row",
                "_meta": {"app_label": "crm", "model_name": "address"},
                "city": "London",
                "country": {
                    "pk": "gb",
                    "__str__": "United Kingdom",
                    "_meta": {"app_label": "geo", "model_name": "country"},
                    "country_code": "GB"
                }
            },
            "user": null
        })
    }

    #[test]
    fn test_parse_related_field() {
        let field = RelatedField::parse("address__city").unwrap();
        assert_eq!(field.path, vec!["address", "city"]);
        assert!(!field.as_link);
        assert_eq!(field.short_description, "City");
        assert_eq!(field.admin_order_field, "address__city");

        let link = RelatedField::parse("link_to_user").unwrap();
        assert_eq!(link.path, vec!["user"]);
        assert!(link.as_link);
        assert_eq!(link.admin_order_field, "user");

        assert!(RelatedField::parse("name").is_none());
        assert!(RelatedField::parse("link_to_").is_none());
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("country_code"), "Country Code");
        assert_eq!(title_case("city"), "City");
        assert_eq!(title_case("VAT_number"), "Vat Number");
        assert_eq!(title_case("address2city"), "Address2City");
        assert_eq!(title_case("line_2"), "Line 2");
    }

    #[test]
    fn test_overrides() {
        let field = RelatedField::parse("address__country__country_code")
            .unwrap()
            .short_description("Country")
            .admin_order_field("address__country__name");
        assert_eq!(field.short_description, "Country");
        assert_eq!(field.admin_order_field, "address__country__name");
    }

    #[test]
    fn test_resolve_value_and_links() {
        let urls = AdminUrls::default();
        let record = customer();

        let city = RelatedField::parse("address__city").unwrap();
        assert_eq!(city.resolve(&record, &urls), Cell::Text("London".to_string()));

        let address = RelatedField::parse("link_to_address").unwrap();
        assert_eq!(
            address.resolve(&record, &urls),
            Cell::Link {
                url: "/admin/crm/address/12/change/".to_string(),
                text: "12 Analytical Row".to_string(),
            }
        );

        let country = RelatedField::parse("link_to_address__country").unwrap();
        assert_eq!(
            country.resolve(&record, &AdminUrls::new("/backoffice/")),
            Cell::Link {
                url: "/backoffice/geo/country/gb/change/".to_string(),
                text: "United Kingdom".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_missing_hops() {
        let urls = AdminUrls::default();
        let record = customer();

        let user = RelatedField::parse("link_to_user").unwrap();
        assert_eq!(user.resolve(&record, &urls), Cell::Empty);

        let missing = RelatedField::parse("user__email").unwrap();
        assert_eq!(missing.resolve(&record, &urls), Cell::Empty);

        let unknown = RelatedField::parse("address__zip").unwrap();
        assert_eq!(unknown.resolve(&record, &urls), Cell::Empty);
    }

    #[test]
    fn test_link_without_pk_renders_text() {
        let record = json!({
            "address": {
                "__str__": "Unsaved",
                "_meta": {"app_label": "crm", "model_name": "address"}
            }
        });
        let field = RelatedField::parse("link_to_address").unwrap();
        assert_eq!(
            field.resolve(&record, &AdminUrls::default()),
            Cell::Text("Unsaved".to_string())
        );
    }

    #[test]
    fn test_select_related() {
        let list_display: Vec<String> = [
            "name",
            "link_to_user",
            "address__city",
            "link_to_address__city",
            "address__country__country_code",
            "company",
        ]
        .iter()
        .map(|s| (*s).to_string())
        .collect();

        assert_eq!(
            select_related(&list_display, &["user", "company", "address"]),
            vec!["address", "address__country", "user", "company"]
        );
        assert!(select_related(&[], &["user"]).is_empty());
    }

    #[test]
    fn test_related_field_admin_row() {
        let admin = RelatedFieldAdmin::new(ModelAdmin::new().list_display(&[
            "name",
            "address__city",
            "link_to_address__country",
            "email",
        ]));

        assert_eq!(admin.related_fields().len(), 2);
        assert_eq!(
            admin.column_titles(),
            vec!["Name", "City", "Country", "Email"]
        );
        assert_eq!(
            admin.row(&customer()),
            vec![
                Cell::Text("Ada".to_string()),
                Cell::Text("London".to_string()),
                Cell::Link {
                    url: "/admin/geo/country/gb/change/".to_string(),
                    text: "United Kingdom".to_string(),
                },
                Cell::Empty,
            ]
        );
    }

    #[test]
    fn test_related_field_admin_override() {
        let admin = RelatedFieldAdmin::new(ModelAdmin::new().list_display(&["address__city"]))
            .with_field(RelatedField::parse("address__city").unwrap().short_description("Town"))
            .unwrap();
        assert_eq!(admin.column_titles(), vec!["Town"]);

        let err = admin
            .with_field(RelatedField::parse("address__zip").unwrap())
            .unwrap_err();
        assert!(matches!(err, AdminError::InvalidField(_)));
    }
}

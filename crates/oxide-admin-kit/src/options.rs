//! ModelAdmin and inline configuration options.

use serde::Deserialize;

/// Configuration for how a model is displayed in the admin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModelAdmin {
    /// Columns to display in the list view.
    pub list_display: Vec<String>,
    /// Columns that link to the edit page.
    pub list_display_links: Vec<String>,
    /// Columns editable directly in the list view.
    pub list_editable: Vec<String>,
    /// Default ordering (prefix with - for descending).
    pub ordering: Vec<String>,
    /// Number of items per page.
    pub list_per_page: usize,
    /// Fields to show in the detail view (None = all).
    pub fields: Option<Vec<String>>,
    /// Fields to exclude from the detail view.
    pub exclude: Vec<String>,
    /// Field groupings for the detail view.
    pub fieldsets: Vec<Fieldset>,
}

impl Default for ModelAdmin {
    fn default() -> Self {
        Self {
            list_display: Vec::new(),
            list_display_links: Vec::new(),
            list_editable: Vec::new(),
            ordering: Vec::new(),
            list_per_page: 25,
            fields: None,
            exclude: Vec::new(),
            fieldsets: Vec::new(),
        }
    }
}

impl ModelAdmin {
    /// Creates a new ModelAdmin with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the columns to display in the list view.
    #[must_use]
    pub fn list_display(mut self, cols: &[&str]) -> Self {
        self.list_display = to_strings(cols);
        self
    }

    /// Sets the columns that link to the edit page.
    #[must_use]
    pub fn list_display_links(mut self, cols: &[&str]) -> Self {
        self.list_display_links = to_strings(cols);
        self
    }

    /// Sets the columns editable in the list view.
    #[must_use]
    pub fn list_editable(mut self, cols: &[&str]) -> Self {
        self.list_editable = to_strings(cols);
        self
    }

    /// Sets the default ordering.
    #[must_use]
    pub fn ordering(mut self, cols: &[&str]) -> Self {
        self.ordering = to_strings(cols);
        self
    }

    /// Sets the number of items per page.
    #[must_use]
    pub fn list_per_page(mut self, n: usize) -> Self {
        self.list_per_page = n;
        self
    }

    /// Sets the fields to show in detail view.
    #[must_use]
    pub fn fields(mut self, cols: &[&str]) -> Self {
        self.fields = Some(to_strings(cols));
        self
    }

    /// Sets the fields to exclude.
    #[must_use]
    pub fn exclude(mut self, cols: &[&str]) -> Self {
        self.exclude = to_strings(cols);
        self
    }

    /// Adds a fieldset.
    #[must_use]
    pub fn fieldset(mut self, fieldset: Fieldset) -> Self {
        self.fieldsets.push(fieldset);
        self
    }
}

/// A fieldset groups related fields together in the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Fieldset {
    /// Optional name/title.
    #[serde(default)]
    pub name: Option<String>,
    /// Fields in this set.
    pub fields: Vec<String>,
    /// CSS classes (e.g., "collapse" to make collapsible).
    #[serde(default)]
    pub classes: Vec<String>,
}

impl Fieldset {
    /// Creates a new fieldset with the given fields.
    pub fn new(fields: &[&str]) -> Self {
        Self {
            name: None,
            fields: to_strings(fields),
            classes: Vec::new(),
        }
    }

    /// Creates a named fieldset.
    pub fn named(name: &str, fields: &[&str]) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::new(fields)
        }
    }

    /// Adds CSS classes.
    #[must_use]
    pub fn classes(mut self, classes: &[&str]) -> Self {
        self.classes = to_strings(classes);
        self
    }
}

/// Configuration for inline editing of related models.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InlineAdmin {
    /// The foreign key field name.
    pub fk_field: String,
    /// Formset prefix used in posted form data.
    #[serde(default)]
    pub prefix: Option<String>,
    /// Fields to display.
    #[serde(default)]
    pub fields: Vec<String>,
    /// Field groupings (stacked inlines).
    #[serde(default)]
    pub fieldsets: Vec<Fieldset>,
    /// Ordering of the inline rows.
    #[serde(default)]
    pub ordering: Vec<String>,
    /// Number of extra empty forms.
    #[serde(default = "default_extra")]
    pub extra: usize,
}

const fn default_extra() -> usize {
    3
}

impl InlineAdmin {
    /// Creates a new inline admin.
    pub fn new(fk_field: &str) -> Self {
        Self {
            fk_field: fk_field.to_string(),
            prefix: None,
            fields: Vec::new(),
            fieldsets: Vec::new(),
            ordering: Vec::new(),
            extra: default_extra(),
        }
    }

    /// Sets the formset prefix.
    #[must_use]
    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    /// Sets the fields to display.
    #[must_use]
    pub fn fields(mut self, fields: &[&str]) -> Self {
        self.fields = to_strings(fields);
        self
    }

    /// Adds a fieldset.
    #[must_use]
    pub fn fieldset(mut self, fieldset: Fieldset) -> Self {
        self.fieldsets.push(fieldset);
        self
    }

    /// Sets the number of extra forms.
    #[must_use]
    pub fn extra(mut self, n: usize) -> Self {
        self.extra = n;
        self
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Appends `field` unless it is already listed.
pub(crate) fn push_unique(list: &mut Vec<String>, field: &str) {
    if !list.iter().any(|f| f == field) {
        list.push(field.to_string());
    }
}

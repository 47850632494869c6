//! Drag-and-drop sortable change lists.

use std::collections::HashMap;

use oxide_sortable::{
    ApplyReport, OrderAssigner, OrderBy, OrderPersister, OrderStore, OrderedRecord, Scope,
    SortableConfig,
};
use tracing::info;

use crate::error::{AdminError, Result};
use crate::formset::{ReorderForm, CHANGELIST_PREFIX};
use crate::options::{push_unique, ModelAdmin};

/// Rows per page of a sortable change list; the whole list must be on
/// screen for dragging to make sense.
pub const SORTABLE_LIST_PER_PAGE: usize = 500;

/// The number input that carries a row's order and serves as drag handle.
///
/// The page script hides the input, attaches the handle to its row, and
/// renumbers the inputs after every drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderInput {
    /// HTML input type.
    pub input_type: &'static str,
    /// CSS classes the page script looks for.
    pub classes: Vec<String>,
    /// CSS class added to the enclosing row, if any.
    pub row_class: Option<String>,
}

impl OrderInput {
    /// Input used by change lists and tabular inlines.
    pub fn handle() -> Self {
        Self {
            input_type: "number",
            classes: vec![
                "hide".to_string(),
                "input-mini".to_string(),
                "sortable-handle".to_string(),
            ],
            row_class: None,
        }
    }

    /// Input used by stacked inlines, where each record is a fieldset.
    pub fn stacked_handle() -> Self {
        let mut input = Self::handle();
        input.classes.push("sortable-handle-stacked".to_string());
        input.row_class = Some("sortable-stacked-row".to_string());
        input
    }

    /// Returns the `class` attribute value.
    pub fn class_attr(&self) -> String {
        self.classes.join(" ")
    }
}

/// Checks the order field can be edited in a list.
pub(crate) fn check_order_field(config: &SortableConfig) -> Result<()> {
    let field = config.order_field.as_str();
    if field.is_empty() || field.contains("__") {
        return Err(AdminError::InvalidField(format!(
            "{field:?} cannot be used as order field"
        )));
    }
    Ok(())
}

/// A [`ModelAdmin`] whose change list is ordered by hand.
///
/// Wrapping an admin:
///
/// - forces its ordering to the order field, and the change list to
///   order-then-newest;
/// - shows the order column (when columns are configured) and makes it
///   editable, since the drag handle lives in that cell;
/// - hides the order field from the add/change form: new records are
///   numbered by [`SortableModelAdmin::prepare_new`];
/// - raises the page size to [`SORTABLE_LIST_PER_PAGE`].
///
/// # Example
///
/// ```
/// use oxide_admin_kit::{ModelAdmin, SortableModelAdmin};
///
/// let admin = SortableModelAdmin::new(ModelAdmin::new().list_display(&["title"]));
/// assert_eq!(admin.admin().list_display, vec!["title", "order"]);
/// assert_eq!(admin.changelist_ordering(), vec!["order", "-id"]);
/// ```
#[derive(Debug, Clone)]
pub struct SortableModelAdmin {
    admin: ModelAdmin,
    config: SortableConfig,
}

impl SortableModelAdmin {
    /// Wraps `admin` with the default `order` / `id` fields.
    pub fn new(admin: ModelAdmin) -> Self {
        Self::build(admin, SortableConfig::default())
    }

    /// Wraps `admin` with custom field names.
    pub fn with_config(admin: ModelAdmin, config: SortableConfig) -> Result<Self> {
        check_order_field(&config)?;
        Ok(Self::build(admin, config))
    }

    fn build(mut admin: ModelAdmin, config: SortableConfig) -> Self {
        let field = config.order_field.as_str();

        admin.ordering = vec![field.to_string()];
        if !admin.list_display.is_empty() {
            push_unique(&mut admin.list_display, field);
        }
        push_unique(&mut admin.list_editable, field);
        push_unique(&mut admin.exclude, field);
        admin.list_per_page = SORTABLE_LIST_PER_PAGE;

        Self { admin, config }
    }

    /// Returns the adjusted admin options.
    pub fn admin(&self) -> &ModelAdmin {
        &self.admin
    }

    /// Returns the field configuration.
    pub fn config(&self) -> &SortableConfig {
        &self.config
    }

    /// Returns the order field name.
    pub fn order_field(&self) -> &str {
        &self.config.order_field
    }

    /// The change list's sole ordering, as Django-style specs.
    pub fn changelist_ordering(&self) -> Vec<String> {
        self.config
            .ordering_key()
            .iter()
            .map(OrderBy::to_spec)
            .collect()
    }

    /// Returns the input rendered in the order column.
    pub fn order_input(&self) -> OrderInput {
        OrderInput::handle()
    }

    /// Numbers a record about to be created so it lands at the end of the
    /// list. Records that already carry an order are left alone.
    pub async fn prepare_new<S: OrderStore>(
        &self,
        store: &S,
        record: &mut OrderedRecord,
    ) -> Result<i64> {
        Ok(OrderAssigner::new(store).assign(record).await?)
    }

    /// Applies the reorder posted from the change list.
    pub async fn apply_reorder<S: OrderStore>(
        &self,
        store: &S,
        data: &HashMap<String, String>,
    ) -> Result<ApplyReport> {
        let batch = ReorderForm::new(CHANGELIST_PREFIX, &self.config).parse(data)?;
        let report = OrderPersister::new(store)
            .apply_in(&Scope::Global, &batch)
            .await?;
        info!(rows = report.updated, "Saved change list order");
        Ok(report)
    }
}

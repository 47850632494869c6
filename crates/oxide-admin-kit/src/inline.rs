//! Sortable inlines: child records reordered on their parent's page.

use std::collections::HashMap;

use oxide_sortable::{
    ApplyReport, OrderAssigner, OrderPersister, OrderStore, OrderedRecord, Scope, SortableConfig,
};
use tracing::info;

use crate::error::Result;
use crate::formset::ReorderForm;
use crate::options::{push_unique, Fieldset, InlineAdmin};
use crate::sortable::{check_order_field, OrderInput};

/// How an inline lays out its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineLayout {
    /// One table row per record.
    Tabular,
    /// One fieldset per record.
    Stacked,
}

/// An [`InlineAdmin`] whose rows are ordered by hand within one parent.
#[derive(Debug, Clone)]
pub struct SortableInline {
    inline: InlineAdmin,
    layout: InlineLayout,
    config: SortableConfig,
}

impl SortableInline {
    /// Wraps `inline` as a tabular sortable inline.
    pub fn tabular(inline: InlineAdmin) -> Self {
        Self::build(inline, InlineLayout::Tabular, SortableConfig::default())
    }

    /// Wraps `inline` as a stacked sortable inline.
    pub fn stacked(inline: InlineAdmin) -> Self {
        Self::build(inline, InlineLayout::Stacked, SortableConfig::default())
    }

    /// Wraps `inline` with custom field names.
    pub fn with_config(
        inline: InlineAdmin,
        layout: InlineLayout,
        config: SortableConfig,
    ) -> Result<Self> {
        check_order_field(&config)?;
        Ok(Self::build(inline, layout, config))
    }

    fn build(mut inline: InlineAdmin, layout: InlineLayout, config: SortableConfig) -> Self {
        let field = config.order_field.as_str();

        inline.ordering = vec![field.to_string()];
        if layout == InlineLayout::Tabular && !inline.fields.is_empty() {
            push_unique(&mut inline.fields, field);
        }

        Self {
            inline,
            layout,
            config,
        }
    }

    /// Returns the adjusted inline options.
    pub fn inline(&self) -> &InlineAdmin {
        &self.inline
    }

    /// Returns the inline layout.
    pub fn layout(&self) -> InlineLayout {
        self.layout
    }

    /// Returns the order field name.
    pub fn order_field(&self) -> &str {
        &self.config.order_field
    }

    /// Returns the formset prefix of posted rows.
    pub fn prefix(&self) -> &str {
        self.inline.prefix.as_deref().unwrap_or(&self.inline.fk_field)
    }

    /// Returns the fieldsets each record is rendered with.
    ///
    /// Stacked inlines show the order field (and so the drag handle) first
    /// in the first fieldset. Tabular inlines return their fieldsets as
    /// configured.
    pub fn fieldsets(&self) -> Vec<Fieldset> {
        let field = self.order_field();
        let mut fieldsets = if !self.inline.fieldsets.is_empty() {
            self.inline.fieldsets.clone()
        } else if !self.inline.fields.is_empty() {
            vec![Fieldset {
                name: None,
                fields: self.inline.fields.clone(),
                classes: Vec::new(),
            }]
        } else {
            vec![Fieldset::new(&[field])]
        };

        if self.layout == InlineLayout::Stacked {
            relocate_order_field(&mut fieldsets, field);
        }
        fieldsets
    }

    /// Returns the input rendered for the order field.
    pub fn order_input(&self) -> OrderInput {
        match self.layout {
            InlineLayout::Tabular => OrderInput::handle(),
            InlineLayout::Stacked => OrderInput::stacked_handle(),
        }
    }

    /// Scope holding the children of `parent`.
    pub fn scope_for(&self, parent: i64) -> Scope {
        Scope::Parent(parent)
    }

    /// Numbers a new child of `parent` so it lands after its siblings.
    pub async fn prepare_new<S: OrderStore>(
        &self,
        store: &S,
        record: &mut OrderedRecord,
    ) -> Result<i64> {
        Ok(OrderAssigner::new(store).assign(record).await?)
    }

    /// Applies the reorder posted for the children of `parent`.
    pub async fn apply_reorder<S: OrderStore>(
        &self,
        store: &S,
        parent: i64,
        data: &HashMap<String, String>,
    ) -> Result<ApplyReport> {
        let batch = ReorderForm::new(self.prefix(), &self.config).parse(data)?;
        let report = OrderPersister::new(store)
            .apply_in(&self.scope_for(parent), &batch)
            .await?;
        info!(
            prefix = self.prefix(),
            parent,
            rows = report.updated,
            "Saved inline order"
        );
        Ok(report)
    }
}

/// Moves `field` to the front of the first fieldset.
///
/// The field is removed from every fieldset first, so it appears exactly
/// once. Nothing happens when `fieldsets` is empty.
pub fn relocate_order_field(fieldsets: &mut [Fieldset], field: &str) {
    for fieldset in fieldsets.iter_mut() {
        fieldset.fields.retain(|f| f != field);
    }
    if let Some(first) = fieldsets.first_mut() {
        first.fields.insert(0, field.to_string());
    }
}

//! # oxide-admin-kit
//!
//! Change-list and inline helpers for Django-like admin interfaces, built
//! on [`oxide_sortable`].
//!
//! - [`SortableModelAdmin`] - a change list the user reorders by dragging
//!   rows
//! - [`SortableInline`] - the same for child records edited on their
//!   parent's page, in tabular or stacked layout
//! - [`ReorderForm`] - turns the posted formset into a `ReorderBatch`
//! - [`RelatedFieldAdmin`] - `list_display` columns such as
//!   `address__city` or `link_to_address` that follow relations, plus the
//!   matching eager-loading plan
//!
//! Rendering is left to the host: this crate describes inputs, columns and
//! cells, and applies reorders through any [`oxide_sortable::OrderStore`].

mod error;
mod formset;
mod inline;
mod options;
mod related;
mod sortable;

pub use error::{AdminError, Result};
pub use formset::{parse_urlencoded, ReorderForm, CHANGELIST_PREFIX, DEFAULT_MAX_FORMS};
pub use inline::{relocate_order_field, InlineLayout, SortableInline};
pub use options::{Fieldset, InlineAdmin, ModelAdmin};
pub use related::{
    select_related, AdminTarget, AdminUrls, Cell, RecordAccess, RelatedField, RelatedFieldAdmin,
    LINK_PREFIX, PATH_SEPARATOR,
};
pub use sortable::{OrderInput, SortableModelAdmin, SORTABLE_LIST_PER_PAGE};

//! Reorder batches from posted change-list and inline formsets.
//!
//! The drag handle lives in each row's order input; after a drop the page
//! renumbers those inputs and posts the whole formset. Rows are named
//! `{prefix}-{index}-{field}` and the row count is `{prefix}-TOTAL_FORMS`.

use std::collections::HashMap;

use oxide_sortable::{RecordId, ReorderBatch, SortableConfig};
use tracing::debug;

use crate::error::{AdminError, Result};

/// Formset prefix of the change-list form.
pub const CHANGELIST_PREFIX: &str = "form";

/// Largest row count accepted from a posted formset by default.
pub const DEFAULT_MAX_FORMS: usize = 1000;

/// Reads a [`ReorderBatch`] out of posted formset data.
#[derive(Debug, Clone)]
pub struct ReorderForm<'a> {
    prefix: &'a str,
    config: &'a SortableConfig,
    max_forms: usize,
}

impl<'a> ReorderForm<'a> {
    /// Creates a reader for the formset named `prefix`.
    pub const fn new(prefix: &'a str, config: &'a SortableConfig) -> Self {
        Self {
            prefix,
            config,
            max_forms: DEFAULT_MAX_FORMS,
        }
    }

    /// Sets the largest `TOTAL_FORMS` value accepted.
    #[must_use]
    pub const fn max_forms(mut self, max_forms: usize) -> Self {
        self.max_forms = max_forms;
        self
    }

    /// Builds the batch from decoded form fields.
    ///
    /// Blank extra rows (no id) and rows ticked for deletion are skipped.
    pub fn parse(&self, data: &HashMap<String, String>) -> Result<ReorderBatch> {
        let total_key = format!("{}-TOTAL_FORMS", self.prefix);
        let total: usize = field(data, &total_key)
            .ok_or_else(|| AdminError::InvalidForm(format!("missing {total_key}")))?
            .parse()
            .map_err(|_| AdminError::InvalidForm(format!("{total_key} is not a count")))?;
        if total > self.max_forms {
            return Err(AdminError::InvalidForm(format!(
                "{total_key} is {total}, at most {} rows are accepted",
                self.max_forms
            )));
        }

        let mut batch = ReorderBatch::new();
        for index in 0..total {
            let key = |name: &str| format!("{}-{index}-{name}", self.prefix);

            let Some(raw_id) = field(data, &key(&self.config.id_field)) else {
                continue;
            };
            if field(data, &key("DELETE")).is_some_and(is_checked) {
                debug!(row = index, "Skipping row marked for deletion");
                continue;
            }

            let id: i64 = raw_id.parse().map_err(|_| {
                AdminError::InvalidForm(format!("row {index}: invalid id {raw_id:?}"))
            })?;
            let order_key = key(&self.config.order_field);
            let raw_order = field(data, &order_key)
                .ok_or_else(|| AdminError::InvalidForm(format!("missing {order_key}")))?;
            let order: i64 = raw_order.parse().map_err(|_| {
                AdminError::InvalidForm(format!("row {index}: invalid order {raw_order:?}"))
            })?;

            batch.push(RecordId(id), order);
        }

        debug!(prefix = self.prefix, rows = batch.len(), "Parsed reorder formset");
        Ok(batch)
    }

    /// Builds the batch from an `application/x-www-form-urlencoded` body.
    pub fn parse_body(&self, body: &str) -> Result<ReorderBatch> {
        self.parse(&parse_urlencoded(body))
    }
}

/// Returns a trimmed, non-empty form value.
fn field<'d>(data: &'d HashMap<String, String>, key: &str) -> Option<&'d str> {
    data.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn is_checked(value: &str) -> bool {
    matches!(value, "on" | "true" | "1")
}

/// Decodes a urlencoded form body into a map (last value wins).
pub fn parse_urlencoded(body: &str) -> HashMap<String, String> {
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(value))
        })
        .collect()
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                if let Some(byte) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    out.push(byte);
                    i += 3;
                    continue;
                }
                out.push(b'%');
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

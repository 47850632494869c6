//! Records, scopes and reorder batches.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{OrderingError, Result};

/// Primary key of an orderable record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// The grouping inside which order values are compared.
///
/// A top-level change list is [`Scope::Global`]; an inline editor orders
/// the children of one parent record, i.e. [`Scope::Parent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Every record of the collection.
    #[default]
    Global,
    /// Records whose foreign key points at the given parent.
    Parent(i64),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "global"),
            Self::Parent(id) => write!(f, "parent={id}"),
        }
    }
}

/// A persisted record carrying an integer order field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedRecord {
    /// Primary key.
    pub id: RecordId,
    /// Grouping the record is ordered within.
    pub scope: Scope,
    /// Display position; `None` while unset.
    pub order: Option<i64>,
}

impl OrderedRecord {
    /// Creates a record description.
    pub fn new(id: impl Into<RecordId>, scope: Scope, order: Option<i64>) -> Self {
        Self {
            id: id.into(),
            scope,
            order,
        }
    }
}

/// A single row write issued to a store.
///
/// Unlike [`OrderUpdate`], the order may be `None` so that rollbacks can
/// restore records whose order was never set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderWrite {
    /// Record to update.
    pub id: RecordId,
    /// Value to store in the order field.
    pub order: Option<i64>,
}

impl From<&OrderUpdate> for OrderWrite {
    fn from(update: &OrderUpdate) -> Self {
        Self {
            id: update.id,
            order: Some(update.order),
        }
    }
}

impl From<&OrderedRecord> for OrderWrite {
    fn from(record: &OrderedRecord) -> Self {
        Self {
            id: record.id,
            order: record.order,
        }
    }
}

/// New position for one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUpdate {
    /// Record to move.
    pub id: RecordId,
    /// Its new order value.
    pub order: i64,
}

/// The set of order updates produced by one drag-and-drop interaction.
///
/// A batch is applied all-or-nothing by
/// [`OrderPersister`](crate::OrderPersister).
///
/// # Example
///
/// ```
/// use oxide_sortable::{RecordId, ReorderBatch};
///
/// // Rows as they appear after the drop, top to bottom.
/// let batch = ReorderBatch::from_positions([3_i64, 1, 2]);
/// assert_eq!(batch.ids(), vec![RecordId(3), RecordId(1), RecordId(2)]);
/// assert_eq!(batch.updates()[0].order, 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderBatch {
    updates: Vec<OrderUpdate>,
}

impl ReorderBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a batch from explicit `(id, order)` pairs.
    pub fn from_pairs<I, R>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (R, i64)>,
        R: Into<RecordId>,
    {
        Self {
            updates: pairs
                .into_iter()
                .map(|(id, order)| OrderUpdate {
                    id: id.into(),
                    order,
                })
                .collect(),
        }
    }

    /// Builds a batch from the visible row sequence, numbering rows from 1.
    pub fn from_positions<I, R>(ids: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RecordId>,
    {
        Self::from_pairs(ids.into_iter().zip(1..))
    }

    /// Appends an update.
    #[must_use]
    pub fn with(mut self, id: impl Into<RecordId>, order: i64) -> Self {
        self.push(id, order);
        self
    }

    /// Appends an update in place.
    pub fn push(&mut self, id: impl Into<RecordId>, order: i64) {
        self.updates.push(OrderUpdate {
            id: id.into(),
            order,
        });
    }

    /// Returns the updates in submission order.
    pub fn updates(&self) -> &[OrderUpdate] {
        &self.updates
    }

    /// Returns the record ids in submission order.
    pub fn ids(&self) -> Vec<RecordId> {
        self.updates.iter().map(|u| u.id).collect()
    }

    /// Returns the number of updates.
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Returns whether the batch carries no updates.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    /// Checks the batch is well-formed on its own: no record appears twice.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.updates.len());
        for update in &self.updates {
            if !seen.insert(update.id) {
                return Err(OrderingError::validation(format!(
                    "record {} appears more than once in the batch",
                    update.id
                )));
            }
        }
        Ok(())
    }
}

impl FromIterator<OrderUpdate> for ReorderBatch {
    fn from_iter<T: IntoIterator<Item = OrderUpdate>>(iter: T) -> Self {
        Self {
            updates: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_positions_numbers_from_one() {
        let batch = ReorderBatch::from_positions([10_i64, 20, 30]);
        let orders: Vec<i64> = batch.updates().iter().map(|u| u.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
        assert_eq!(batch.ids(), vec![RecordId(10), RecordId(20), RecordId(30)]);
    }

    #[test]
    fn test_validate_rejects_duplicates() {
        let batch = ReorderBatch::new()
            .with(RecordId(1), 1)
            .with(RecordId(2), 2)
            .with(RecordId(1), 3);
        let err = batch.validate().unwrap_err();
        assert!(matches!(err, OrderingError::Validation(_)));
        assert!(err.to_string().contains("record 1"));
    }

    #[test]
    fn test_validate_accepts_equal_orders() {
        // Ties are allowed; the read path breaks them on id.
        let batch = ReorderBatch::from_pairs([(RecordId(1), 5), (RecordId(2), 5)]);
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn test_batch_json_shape() {
        let batch: ReorderBatch =
            serde_json::from_str(r#"{"updates":[{"id":3,"order":1},{"id":1,"order":2}]}"#)
                .unwrap();
        assert_eq!(batch, ReorderBatch::from_pairs([(RecordId(3), 1), (RecordId(1), 2)]));
    }

    #[test]
    fn test_scope_display() {
        assert_eq!(Scope::Global.to_string(), "global");
        assert_eq!(Scope::Parent(4).to_string(), "parent=4");
    }
}

//! Order assignment for newly created records.

use tracing::{debug, info};

use crate::error::{OrderingError, Result};
use crate::record::{OrderedRecord, Scope};
use crate::store::OrderStore;

/// Computes the order value of a record about to be created.
///
/// New records go to the end of their scope: one past the current maximum,
/// or `1` when the scope has no ordered record yet.
#[derive(Debug)]
pub struct OrderAssigner<'a, S> {
    store: &'a S,
}

impl<'a, S: OrderStore> OrderAssigner<'a, S> {
    /// Creates an assigner reading from `store`.
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Returns the order value for the next record of `scope`.
    ///
    /// This only reads; persisting the value on the new record is up to the
    /// caller.
    pub async fn next_order(&self, scope: &Scope) -> Result<i64> {
        let next = match self.store.max_order(scope).await? {
            None => 1,
            Some(max) => max.checked_add(1).ok_or_else(|| {
                OrderingError::validation(format!(
                    "order field overflow: scope {scope} already holds the maximum value"
                ))
            })?,
        };
        debug!(scope = %scope, next_order = next, "Computed next order");
        Ok(next)
    }

    /// Fills the order of an unsaved record and returns it.
    ///
    /// A record that already carries an order keeps it.
    pub async fn assign(&self, record: &mut OrderedRecord) -> Result<i64> {
        if let Some(order) = record.order {
            return Ok(order);
        }
        let order = self.next_order(&record.scope).await?;
        record.order = Some(order);
        info!(scope = %record.scope, order, "Assigned order to new record");
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryStore, WriteFault};
    use crate::record::RecordId;
    use crate::store::OrderStore;

    #[tokio::test]
    async fn test_empty_scope_starts_at_one() {
        let store = MemoryStore::new();
        let assigner = OrderAssigner::new(&store);

        assert_eq!(assigner.next_order(&Scope::Global).await.unwrap(), 1);

        store.insert(&Scope::Global, Some(1)).await.unwrap();
        assert_eq!(assigner.next_order(&Scope::Global).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_next_is_max_plus_one() {
        let store = MemoryStore::new();
        for order in [3, 17, 5] {
            store.insert_record(Scope::Parent(1), Some(order)).unwrap();
        }
        store.insert_record(Scope::Parent(2), Some(40)).unwrap();

        let assigner = OrderAssigner::new(&store);
        assert_eq!(assigner.next_order(&Scope::Parent(1)).await.unwrap(), 18);
        assert_eq!(assigner.next_order(&Scope::Parent(2)).await.unwrap(), 41);
        assert_eq!(assigner.next_order(&Scope::Parent(3)).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unset_orders_count_as_empty() {
        let store = MemoryStore::new();
        store.insert_record(Scope::Global, None).unwrap();
        store.insert_record(Scope::Global, None).unwrap();

        let next = OrderAssigner::new(&store)
            .next_order(&Scope::Global)
            .await
            .unwrap();
        assert_eq!(next, 1);
    }

    #[tokio::test]
    async fn test_overflow_is_reported() {
        let store = MemoryStore::new();
        store.insert_record(Scope::Global, Some(i64::MAX)).unwrap();

        let result = OrderAssigner::new(&store).next_order(&Scope::Global).await;
        assert!(matches!(result, Err(OrderingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_assign_keeps_existing_order() {
        let store = MemoryStore::new();
        store.insert_record(Scope::Global, Some(8)).unwrap();
        let assigner = OrderAssigner::new(&store);

        let mut fresh = OrderedRecord::new(RecordId(0), Scope::Global, None);
        assert_eq!(assigner.assign(&mut fresh).await.unwrap(), 9);
        assert_eq!(fresh.order, Some(9));

        let mut placed = OrderedRecord::new(RecordId(0), Scope::Global, Some(2));
        assert_eq!(assigner.assign(&mut placed).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_write_faults_do_not_affect_reads() {
        let store = MemoryStore::new();
        store.insert_record(Scope::Global, Some(1)).unwrap();
        store.fail_writes(WriteFault::From(1)).unwrap();

        let next = OrderAssigner::new(&store)
            .next_order(&Scope::Global)
            .await
            .unwrap();
        assert_eq!(next, 2);
    }
}

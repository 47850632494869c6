//! Atomic application of drag-and-drop reorders.

use std::collections::HashMap;
use std::slice;

use tracing::{debug, info, warn};

use crate::error::{OrderingError, Result, StorageError};
use crate::record::{OrderWrite, OrderedRecord, RecordId, ReorderBatch, Scope};
use crate::store::OrderStore;

/// Outcome of a successful [`OrderPersister::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    /// Scope the batch was applied to; `None` for an empty batch.
    pub scope: Option<Scope>,
    /// Number of records written.
    pub updated: usize,
}

/// Applies [`ReorderBatch`]es to a store as single all-or-nothing units.
///
/// Concurrent batches against one scope are not merged: whichever commits
/// last determines the stored order.
#[derive(Debug)]
pub struct OrderPersister<'a, S> {
    store: &'a S,
}

impl<'a, S: OrderStore> OrderPersister<'a, S> {
    /// Creates a persister writing to `store`.
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Validates and applies `batch`.
    ///
    /// Fails with [`OrderingError::Validation`] without writing anything when
    /// the batch repeats a record, names a record that does not exist, or
    /// mixes records from several scopes.
    pub async fn apply(&self, batch: &ReorderBatch) -> Result<ApplyReport> {
        self.apply_checked(None, batch).await
    }

    /// Like [`OrderPersister::apply`], additionally requiring every record to
    /// belong to `scope` (e.g. the parent an inline editor was opened for).
    pub async fn apply_in(&self, scope: &Scope, batch: &ReorderBatch) -> Result<ApplyReport> {
        self.apply_checked(Some(scope), batch).await
    }

    async fn apply_checked(
        &self,
        expected: Option<&Scope>,
        batch: &ReorderBatch,
    ) -> Result<ApplyReport> {
        if batch.is_empty() {
            debug!("Empty reorder batch, nothing to apply");
            return Ok(ApplyReport {
                scope: None,
                updated: 0,
            });
        }

        batch.validate()?;
        let ids = batch.ids();
        let snapshot = self.store.lookup(&ids).await?;
        let scope = check_batch_scope(&ids, &snapshot, expected)?;

        let writes: Vec<OrderWrite> = batch.updates().iter().map(OrderWrite::from).collect();
        if self.store.is_transactional() {
            self.write_transactional(&ids, &writes, &snapshot).await?;
        } else {
            self.write_compensated(&writes, &snapshot).await?;
        }

        info!(scope = %scope, updated = writes.len(), "Applied reorder batch");
        Ok(ApplyReport {
            scope: Some(scope),
            updated: writes.len(),
        })
    }

    async fn write_transactional(
        &self,
        ids: &[RecordId],
        writes: &[OrderWrite],
        snapshot: &[OrderedRecord],
    ) -> Result<()> {
        let Err(err) = self.store.write_orders(writes).await else {
            return Ok(());
        };

        // The store promises atomicity; check that nothing leaked anyway.
        match self.store.lookup(ids).await {
            Ok(after) => {
                let modified = changed_records(snapshot, &after);
                if modified.is_empty() {
                    Err(err.into())
                } else {
                    warn!(?modified, "Transactional reorder left records modified");
                    Err(OrderingError::PartialFailure {
                        modified,
                        source: err,
                    })
                }
            }
            Err(check_err) => {
                warn!(error = %check_err, "Could not verify store state after failed reorder");
                Err(err.into())
            }
        }
    }

    async fn write_compensated(
        &self,
        writes: &[OrderWrite],
        snapshot: &[OrderedRecord],
    ) -> Result<()> {
        for (done, write) in writes.iter().enumerate() {
            if let Err(err) = self.store.write_orders(slice::from_ref(write)).await {
                warn!(
                    record = %write.id,
                    written = done,
                    error = %err,
                    "Reorder write failed, rolling back"
                );
                return Err(self.roll_back(&writes[..done], snapshot, err).await);
            }
        }
        Ok(())
    }

    /// Restores the pre-apply order of every record in `written`.
    async fn roll_back(
        &self,
        written: &[OrderWrite],
        snapshot: &[OrderedRecord],
        cause: StorageError,
    ) -> OrderingError {
        let previous: HashMap<RecordId, &OrderedRecord> =
            snapshot.iter().map(|r| (r.id, r)).collect();

        let mut modified = Vec::new();
        for write in written.iter().rev() {
            let Some(record) = previous.get(&write.id) else {
                continue;
            };
            let restore = OrderWrite::from(*record);
            if let Err(err) = self.store.write_orders(slice::from_ref(&restore)).await {
                warn!(record = %write.id, error = %err, "Rollback write failed");
                modified.push(write.id);
            }
        }

        if modified.is_empty() {
            cause.into()
        } else {
            modified.sort_unstable();
            OrderingError::PartialFailure {
                modified,
                source: cause,
            }
        }
    }
}

/// Checks that every id exists and that they share one scope, returning it.
fn check_batch_scope(
    ids: &[RecordId],
    found: &[OrderedRecord],
    expected: Option<&Scope>,
) -> Result<Scope> {
    let known: HashMap<RecordId, Scope> = found.iter().map(|r| (r.id, r.scope)).collect();

    let missing: Vec<String> = ids
        .iter()
        .filter(|id| !known.contains_key(*id))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        debug!(?missing, "Rejecting reorder batch with unknown records");
        return Err(OrderingError::validation(format!(
            "unknown records in batch: {}",
            missing.join(", ")
        )));
    }

    let mut scopes = ids.iter().filter_map(|id| known.get(id).copied());
    let Some(scope) = scopes.next() else {
        return Err(OrderingError::validation("batch has no records"));
    };
    if let Some(other) = scopes.find(|s| *s != scope) {
        return Err(OrderingError::validation(format!(
            "batch spans several scopes ({scope} and {other})"
        )));
    }

    match expected {
        Some(expected) if *expected != scope => Err(OrderingError::validation(format!(
            "batch belongs to scope {scope}, expected {expected}"
        ))),
        _ => Ok(scope),
    }
}

fn changed_records(before: &[OrderedRecord], after: &[OrderedRecord]) -> Vec<RecordId> {
    let previous: HashMap<RecordId, Option<i64>> = before.iter().map(|r| (r.id, r.order)).collect();
    let mut changed: Vec<RecordId> = after
        .iter()
        .filter(|r| previous.get(&r.id).is_some_and(|order| *order != r.order))
        .map(|r| r.id)
        .collect();
    changed.sort_unstable();
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryStore, WriteFault};
    use crate::ordering::{OrderBy, OrderedView};
    use crate::store::{OrderStore, StoreResult};

    /// Claims to be transactional but keeps the first row of a failed write.
    struct LeakyStore {
        inner: MemoryStore,
    }

    impl OrderStore for LeakyStore {
        async fn max_order(&self, scope: &Scope) -> StoreResult<Option<i64>> {
            self.inner.max_order(scope).await
        }

        async fn lookup(&self, ids: &[RecordId]) -> StoreResult<Vec<OrderedRecord>> {
            self.inner.lookup(ids).await
        }

        async fn read_scope(
            &self,
            scope: &Scope,
            ordering: &[OrderBy],
        ) -> StoreResult<Vec<OrderedRecord>> {
            self.inner.read_scope(scope, ordering).await
        }

        async fn write_orders(&self, writes: &[OrderWrite]) -> StoreResult<()> {
            self.inner.write_orders(&writes[..1]).await?;
            Err(StorageError::msg("connection lost after first row"))
        }

        async fn insert(&self, scope: &Scope, order: Option<i64>) -> StoreResult<RecordId> {
            self.inner.insert(scope, order).await
        }
    }

    async fn ids_in_order(store: &MemoryStore, scope: Scope) -> Vec<RecordId> {
        OrderedView::new(store)
            .read(&scope)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect()
    }

    fn abc(store: &MemoryStore, scope: Scope) -> (RecordId, RecordId, RecordId) {
        let a = store.insert_record(scope, Some(1)).unwrap();
        let b = store.insert_record(scope, Some(2)).unwrap();
        let c = store.insert_record(scope, Some(3)).unwrap();
        (a, b, c)
    }

    #[tokio::test]
    async fn test_reorder_scenario() {
        let store = MemoryStore::new();
        let (a, b, c) = abc(&store, Scope::Global);

        let batch = ReorderBatch::from_pairs([(c, 1), (a, 2), (b, 3)]);
        let report = OrderPersister::new(&store).apply(&batch).await.unwrap();

        assert_eq!(report.scope, Some(Scope::Global));
        assert_eq!(report.updated, 3);
        assert_eq!(ids_in_order(&store, Scope::Global).await, vec![c, a, b]);
    }

    #[tokio::test]
    async fn test_equal_orders_fall_back_to_newest_first() {
        let store = MemoryStore::new();
        let (a, b, c) = abc(&store, Scope::Global);

        let batch = ReorderBatch::from_pairs([(a, 1), (b, 1), (c, 0)]);
        OrderPersister::new(&store).apply(&batch).await.unwrap();

        assert_eq!(ids_in_order(&store, Scope::Global).await, vec![c, b, a]);
    }

    #[tokio::test]
    async fn test_applying_twice_is_idempotent() {
        let store = MemoryStore::new();
        let (a, b, c) = abc(&store, Scope::Global);
        let batch = ReorderBatch::from_positions([b, c, a]);
        let persister = OrderPersister::new(&store);

        persister.apply(&batch).await.unwrap();
        let once = store.records().unwrap();
        persister.apply(&batch).await.unwrap();

        assert_eq!(store.records().unwrap(), once);
        assert_eq!(ids_in_order(&store, Scope::Global).await, vec![b, c, a]);
    }

    #[tokio::test]
    async fn test_unknown_record_rejects_whole_batch() {
        let store = MemoryStore::new();
        let (a, b, _) = abc(&store, Scope::Global);
        let before = store.records().unwrap();

        let batch = ReorderBatch::from_pairs([(b, 1), (a, 2)]).with(RecordId(404), 3);
        let err = OrderPersister::new(&store).apply(&batch).await.unwrap_err();

        assert!(matches!(err, OrderingError::Validation(_)));
        assert!(err.to_string().contains("404"));
        assert_eq!(store.records().unwrap(), before);
    }

    #[tokio::test]
    async fn test_cross_scope_batch_is_rejected() {
        let store = MemoryStore::new();
        let a = store.insert_record(Scope::Parent(1), Some(1)).unwrap();
        let b = store.insert_record(Scope::Parent(2), Some(1)).unwrap();
        let before = store.records().unwrap();

        let batch = ReorderBatch::from_positions([b, a]);
        let err = OrderPersister::new(&store).apply(&batch).await.unwrap_err();

        assert!(matches!(err, OrderingError::Validation(_)));
        assert_eq!(store.records().unwrap(), before);
    }

    #[tokio::test]
    async fn test_apply_in_checks_expected_scope() {
        let store = MemoryStore::new();
        let (a, b, _) = abc(&store, Scope::Parent(7));
        let persister = OrderPersister::new(&store);
        let batch = ReorderBatch::from_positions([b, a]);

        let err = persister.apply_in(&Scope::Parent(8), &batch).await.unwrap_err();
        assert!(matches!(err, OrderingError::Validation(_)));

        let report = persister.apply_in(&Scope::Parent(7), &batch).await.unwrap();
        assert_eq!(report.scope, Some(Scope::Parent(7)));
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_rejected() {
        let store = MemoryStore::new();
        let (a, _, _) = abc(&store, Scope::Global);

        let batch = ReorderBatch::from_pairs([(a, 1), (a, 2)]);
        let err = OrderPersister::new(&store).apply(&batch).await.unwrap_err();
        assert!(matches!(err, OrderingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_batch_is_noop() {
        let store = MemoryStore::new();
        let report = OrderPersister::new(&store)
            .apply(&ReorderBatch::new())
            .await
            .unwrap();
        assert_eq!(
            report,
            ApplyReport {
                scope: None,
                updated: 0
            }
        );
    }

    #[tokio::test]
    async fn test_transactional_failure_keeps_previous_order() {
        let store = MemoryStore::new();
        let (a, b, c) = abc(&store, Scope::Global);
        let before = store.records().unwrap();
        store.fail_writes(WriteFault::Once(3)).unwrap();

        let batch = ReorderBatch::from_positions([c, b, a]);
        let err = OrderPersister::new(&store).apply(&batch).await.unwrap_err();

        assert!(matches!(err, OrderingError::Storage(_)));
        assert_eq!(store.records().unwrap(), before);
        assert_eq!(ids_in_order(&store, Scope::Global).await, vec![a, b, c]);
    }

    #[tokio::test]
    async fn test_non_transactional_failure_is_rolled_back() {
        let store = MemoryStore::new().non_transactional();
        let (a, b, c) = abc(&store, Scope::Global);
        let before = store.records().unwrap();
        // Third row write fails; the two rollback writes succeed.
        store.fail_writes(WriteFault::Once(3)).unwrap();

        let batch = ReorderBatch::from_positions([c, b, a]);
        let err = OrderPersister::new(&store).apply(&batch).await.unwrap_err();

        assert!(matches!(err, OrderingError::Storage(_)));
        assert_eq!(store.records().unwrap(), before);
    }

    #[tokio::test]
    async fn test_failed_rollback_reports_partial_failure() {
        let store = MemoryStore::new().non_transactional();
        let (a, b, c) = abc(&store, Scope::Global);
        // Every write from the third on fails, including the rollback.
        store.fail_writes(WriteFault::From(3)).unwrap();

        let batch = ReorderBatch::from_pairs([(c, 1), (b, 5), (a, 3)]);
        let err = OrderPersister::new(&store).apply(&batch).await.unwrap_err();

        match err {
            OrderingError::PartialFailure { modified, .. } => {
                let mut expected = vec![c, b];
                expected.sort_unstable();
                assert_eq!(modified, expected);
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_leaked_transactional_write_reports_partial_failure() {
        let store = LeakyStore {
            inner: MemoryStore::new(),
        };
        let (a, b, c) = abc(&store.inner, Scope::Global);
        assert!(store.is_transactional());

        let batch = ReorderBatch::from_positions([c, b, a]);
        let err = OrderPersister::new(&store).apply(&batch).await.unwrap_err();

        match err {
            OrderingError::PartialFailure { modified, source } => {
                assert_eq!(modified, vec![c]);
                assert_eq!(source.to_string(), "connection lost after first row");
            }
            other => panic!("expected partial failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_transactional_write_without_leak_is_storage_error() {
        let store = LeakyStore {
            inner: MemoryStore::new(),
        };
        let (a, b, _) = abc(&store.inner, Scope::Global);

        // The leaked first row keeps its current order, so nothing changed.
        let batch = ReorderBatch::from_pairs([(a, 1), (b, 1)]);
        let err = OrderPersister::new(&store).apply(&batch).await.unwrap_err();
        assert!(matches!(err, OrderingError::Storage(_)));
    }

    #[test]
    fn test_changed_records() {
        let before = vec![
            OrderedRecord::new(RecordId(1), Scope::Global, Some(1)),
            OrderedRecord::new(RecordId(2), Scope::Global, None),
        ];
        let after = vec![
            OrderedRecord::new(RecordId(2), Scope::Global, Some(4)),
            OrderedRecord::new(RecordId(1), Scope::Global, Some(1)),
        ];
        assert_eq!(changed_records(&before, &after), vec![RecordId(2)]);
    }
}

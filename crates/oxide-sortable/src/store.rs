//! The storage seam the ordering core runs against.

use crate::error::StorageError;
use crate::ordering::OrderBy;
use crate::record::{OrderWrite, OrderedRecord, RecordId, Scope};

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StorageError>;

/// A persistent collection of orderable records.
///
/// The host's model layer implements this trait; the ordering core never
/// talks to a database directly.
///
/// # Example
///
/// ```ignore
/// use oxide_sortable::{OrderAssigner, OrderStore, Scope};
///
/// async fn add_item<S: OrderStore>(store: &S, list: i64) -> oxide_sortable::Result<()> {
///     let scope = Scope::Parent(list);
///     let order = OrderAssigner::new(store).next_order(&scope).await?;
///     store.insert(&scope, Some(order)).await?;
///     Ok(())
/// }
/// ```
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Returns whether [`OrderStore::write_orders`] is all-or-nothing.
    ///
    /// Stores without transactions get a compensating rollback from the
    /// persister instead.
    fn is_transactional(&self) -> bool {
        true
    }

    /// Returns the largest order value in `scope`, `None` when the scope is
    /// empty or every order is unset.
    async fn max_order(&self, scope: &Scope) -> StoreResult<Option<i64>>;

    /// Returns the records among `ids` that exist, in no particular order.
    async fn lookup(&self, ids: &[RecordId]) -> StoreResult<Vec<OrderedRecord>>;

    /// Returns every record of `scope` sorted by `ordering`.
    async fn read_scope(
        &self,
        scope: &Scope,
        ordering: &[OrderBy],
    ) -> StoreResult<Vec<OrderedRecord>>;

    /// Writes the order field of each listed record.
    async fn write_orders(&self, writes: &[OrderWrite]) -> StoreResult<()>;

    /// Creates a record in `scope` and returns its id.
    async fn insert(&self, scope: &Scope, order: Option<i64>) -> StoreResult<RecordId>;
}

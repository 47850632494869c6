//! # oxide-sortable
//!
//! Drag-and-drop ordering for admin record lists.
//!
//! Records carry an integer order field and optionally belong to a scope
//! (the children of one parent record). This crate provides:
//!
//! - `OrderAssigner` - computes the order of a newly created record
//! - `OrderedView` - reads a scope in a deterministic editing order
//! - `OrderPersister` - applies a drag-and-drop `ReorderBatch` atomically
//! - `OrderStore` - the storage trait the three components run against
//! - `MemoryStore` - an in-process `OrderStore`
//!
//! ## Quick Start
//!
//! ```ignore
//! use oxide_sortable::{MemoryStore, OrderAssigner, OrderPersister, OrderedView};
//! use oxide_sortable::{OrderStore, ReorderBatch, Scope};
//!
//! async fn example() -> oxide_sortable::Result<()> {
//!     let store = MemoryStore::new();
//!     let scope = Scope::Global;
//!
//!     // New records go to the end of their scope.
//!     let assigner = OrderAssigner::new(&store);
//!     let a = store.insert(&scope, Some(assigner.next_order(&scope).await?)).await?;
//!     let b = store.insert(&scope, Some(assigner.next_order(&scope).await?)).await?;
//!
//!     // The user drags `b` above `a`.
//!     let batch = ReorderBatch::from_positions([b, a]);
//!     OrderPersister::new(&store).apply(&batch).await?;
//!
//!     let rows = OrderedView::new(&store).read(&scope).await?;
//!     assert_eq!(rows[0].id, b);
//!     Ok(())
//! }
//! ```
//!
//! ## Ordering
//!
//! Listings are always sorted by order ascending, then by id descending, so
//! records sharing an order value (or having none) show newest first.
//!
//! ## Failure handling
//!
//! A batch that fails validation writes nothing. Stores that support
//! transactions apply a batch in one transaction; for other stores the
//! persister restores the previous values itself and reports
//! `OrderingError::PartialFailure` if that restore cannot complete.

mod assigner;
mod error;
pub mod memory;
mod ordering;
mod persister;
mod record;
mod store;

pub use assigner::OrderAssigner;
pub use error::{OrderingError, Result, StorageError};
pub use memory::{MemoryStore, WriteFault};
pub use ordering::{OrderBy, OrderDirection, OrderedView, SortableConfig};
pub use persister::{ApplyReport, OrderPersister};
pub use record::{OrderUpdate, OrderWrite, OrderedRecord, RecordId, ReorderBatch, Scope};
pub use store::{OrderStore, StoreResult};

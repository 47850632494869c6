//! # oxide-sortable-sqlite
//!
//! A SQLite implementation of `oxide_sortable::OrderStore` built on sqlx.
//!
//! Every reorder batch is written inside one database transaction, so a
//! failing row leaves the whole scope in its previous order.
//!
//! ```ignore
//! use oxide_sortable::{OrderPersister, OrderedView, ReorderBatch, Scope};
//! use oxide_sortable_sqlite::{SqliteOrderStore, SqliteOrderTable};
//!
//! let table = SqliteOrderTable::new("chapters").scope_column("book_id");
//! let store = SqliteOrderStore::new(pool, table)?;
//!
//! OrderPersister::new(&store)
//!     .apply_in(&Scope::Parent(book_id), &ReorderBatch::from_positions(dropped_ids))
//!     .await?;
//! let chapters = OrderedView::new(&store).read(&Scope::Parent(book_id)).await?;
//! ```
//!
//! Table and column names are interpolated into SQL and must be plain
//! identifiers; `SqliteOrderStore::new` rejects anything else.

mod error;
mod store;
mod table;

pub use error::{Result, SqliteStoreError};
pub use store::SqliteOrderStore;
pub use table::SqliteOrderTable;

//! In-memory [`OrderStore`].
//!
//! Useful for hosts that keep small collections in process and for tests:
//! the store can run with or without transactional writes and can be told
//! to fail specific row writes.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::StorageError;
use crate::ordering::{OrderBy, OrderDirection, SortableConfig};
use crate::record::{OrderWrite, OrderedRecord, RecordId, Scope};
use crate::store::{OrderStore, StoreResult};

/// Makes row writes fail, counting attempts from the moment it is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFault {
    /// Only the n-th row write (1-based) fails.
    Once(usize),
    /// The n-th row write and every one after it fail.
    From(usize),
}

impl WriteFault {
    const fn triggers(self, attempt: usize) -> bool {
        match self {
            Self::Once(n) => attempt == n,
            Self::From(n) => attempt >= n,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<RecordId, (Scope, Option<i64>)>,
    next_id: i64,
    fault: Option<WriteFault>,
    attempts: usize,
}

impl Inner {
    fn attempt_write(&mut self, write: &OrderWrite) -> StoreResult<()> {
        self.attempts += 1;
        if self.fault.is_some_and(|f| f.triggers(self.attempts)) {
            return Err(StorageError::msg(format!(
                "injected failure writing record {}",
                write.id
            )));
        }
        if !self.records.contains_key(&write.id) {
            return Err(StorageError::msg(format!("record {} not found", write.id)));
        }
        Ok(())
    }
}

/// An [`OrderStore`] kept in process memory.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    config: SortableConfig,
    transactional: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty transactional store with default field names.
    pub fn new() -> Self {
        Self::with_config(SortableConfig::default())
    }

    /// Creates an empty store that understands the given field names.
    pub fn with_config(config: SortableConfig) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            config,
            transactional: true,
        }
    }

    /// Commits each row as soon as it is written instead of staging the
    /// whole batch.
    #[must_use]
    pub fn non_transactional(mut self) -> Self {
        self.transactional = false;
        self
    }

    /// Installs a write fault and resets the attempt counter.
    pub fn fail_writes(&self, fault: WriteFault) -> StoreResult<()> {
        let mut inner = self.write_lock()?;
        inner.fault = Some(fault);
        inner.attempts = 0;
        Ok(())
    }

    /// Removes any installed write fault.
    pub fn clear_fault(&self) -> StoreResult<()> {
        self.write_lock()?.fault = None;
        Ok(())
    }

    /// Inserts a record without going through the async trait.
    pub fn insert_record(&self, scope: Scope, order: Option<i64>) -> StoreResult<RecordId> {
        let mut inner = self.write_lock()?;
        inner.next_id += 1;
        let id = RecordId(inner.next_id);
        inner.records.insert(id, (scope, order));
        Ok(id)
    }

    /// Returns every record sorted by id.
    pub fn records(&self) -> StoreResult<Vec<OrderedRecord>> {
        let inner = self.read_lock()?;
        Ok(inner
            .records
            .iter()
            .map(|(id, (scope, order))| OrderedRecord::new(*id, *scope, *order))
            .collect())
    }

    fn read_lock(&self) -> StoreResult<RwLockReadGuard<'_, Inner>> {
        self.inner
            .read()
            .map_err(|_| StorageError::msg("memory store lock poisoned"))
    }

    fn write_lock(&self) -> StoreResult<RwLockWriteGuard<'_, Inner>> {
        self.inner
            .write()
            .map_err(|_| StorageError::msg("memory store lock poisoned"))
    }

    fn compare(&self, ordering: &[OrderBy], a: &OrderedRecord, b: &OrderedRecord) -> Ordering {
        for key in ordering {
            let ord = if key.field == self.config.order_field {
                a.order.cmp(&b.order)
            } else {
                a.id.cmp(&b.id)
            };
            let ord = match key.direction {
                OrderDirection::Asc => ord,
                OrderDirection::Desc => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }
}

impl OrderStore for MemoryStore {
    fn is_transactional(&self) -> bool {
        self.transactional
    }

    async fn max_order(&self, scope: &Scope) -> StoreResult<Option<i64>> {
        let inner = self.read_lock()?;
        Ok(inner
            .records
            .values()
            .filter(|(s, _)| s == scope)
            .filter_map(|(_, order)| *order)
            .max())
    }

    async fn lookup(&self, ids: &[RecordId]) -> StoreResult<Vec<OrderedRecord>> {
        let inner = self.read_lock()?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                inner
                    .records
                    .get(id)
                    .map(|(scope, order)| OrderedRecord::new(*id, *scope, *order))
            })
            .collect())
    }

    async fn read_scope(
        &self,
        scope: &Scope,
        ordering: &[OrderBy],
    ) -> StoreResult<Vec<OrderedRecord>> {
        if let Some(unknown) = ordering
            .iter()
            .find(|o| o.field != self.config.order_field && o.field != self.config.id_field)
        {
            return Err(StorageError::msg(format!(
                "cannot order by unknown field '{}'",
                unknown.field
            )));
        }

        let mut records: Vec<OrderedRecord> = {
            let inner = self.read_lock()?;
            inner
                .records
                .iter()
                .filter(|(_, (s, _))| s == scope)
                .map(|(id, (s, order))| OrderedRecord::new(*id, *s, *order))
                .collect()
        };
        records.sort_by(|a, b| self.compare(ordering, a, b));
        Ok(records)
    }

    async fn write_orders(&self, writes: &[OrderWrite]) -> StoreResult<()> {
        let mut inner = self.write_lock()?;

        if self.transactional {
            // Stage every row before touching the map.
            for write in writes {
                inner.attempt_write(write)?;
            }
            for write in writes {
                if let Some(entry) = inner.records.get_mut(&write.id) {
                    entry.1 = write.order;
                }
            }
        } else {
            for write in writes {
                inner.attempt_write(write)?;
                if let Some(entry) = inner.records.get_mut(&write.id) {
                    entry.1 = write.order;
                }
            }
        }

        debug!(rows = writes.len(), "Wrote orders to memory store");
        Ok(())
    }

    async fn insert(&self, scope: &Scope, order: Option<i64>) -> StoreResult<RecordId> {
        self.insert_record(*scope, order)
    }
}

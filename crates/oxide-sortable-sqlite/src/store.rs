//! [`OrderStore`] over a SQLite connection pool.

use oxide_sortable::{
    OrderBy, OrderDirection, OrderStore, OrderWrite, OrderedRecord, RecordId, Scope, StoreResult,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::error::{Result, SqliteStoreError};
use crate::table::{quote, SqliteOrderTable};

/// Stores orders in a SQLite table; reorders run in one transaction.
#[derive(Debug, Clone)]
pub struct SqliteOrderStore {
    pool: SqlitePool,
    table: SqliteOrderTable,
}

impl SqliteOrderStore {
    /// Creates a store for `table`, rejecting names that are not plain
    /// identifiers.
    pub fn new(pool: SqlitePool, table: SqliteOrderTable) -> Result<Self> {
        table.validate()?;
        Ok(Self { pool, table })
    }

    /// Returns the table layout.
    pub fn table(&self) -> &SqliteOrderTable {
        &self.table
    }

    /// Creates the table if it does not exist.
    pub async fn ensure_table(&self) -> Result<()> {
        sqlx::query(&self.table.create_table_sql())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Builds the `WHERE` condition selecting `scope`, with its parameter.
    fn scope_filter(&self, scope: &Scope) -> Result<(String, Option<i64>)> {
        match (scope, self.table.scope_column.as_deref()) {
            (Scope::Global, None) => Ok(("1 = 1".to_string(), None)),
            (Scope::Global, Some(column)) => Ok((format!("{} IS NULL", quote(column)), None)),
            (Scope::Parent(parent), Some(column)) => {
                Ok((format!("{} = ?", quote(column)), Some(*parent)))
            }
            (Scope::Parent(_), None) => Err(SqliteStoreError::Unscoped(self.table.table.clone())),
        }
    }

    fn select_columns(&self) -> String {
        let scope = self
            .table
            .scope_column
            .as_deref()
            .map_or_else(|| "NULL".to_string(), quote);
        format!(
            "{}, {}, {}",
            quote(&self.table.id_column),
            scope,
            quote(&self.table.order_column)
        )
    }

    fn order_clause(&self, ordering: &[OrderBy]) -> Result<String> {
        let parts = ordering
            .iter()
            .map(|o| {
                let column = self
                    .table
                    .column_for(&o.field)
                    .ok_or_else(|| SqliteStoreError::UnknownColumn(o.field.clone()))?;
                let direction = match o.direction {
                    OrderDirection::Asc => "ASC",
                    OrderDirection::Desc => "DESC",
                };
                Ok(format!("{} {direction}", quote(column)))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(", "))
    }

    async fn fetch_max(&self, scope: &Scope) -> Result<Option<i64>> {
        let (condition, param) = self.scope_filter(scope)?;
        let sql = format!(
            "SELECT MAX({}) FROM {} WHERE {condition}",
            quote(&self.table.order_column),
            quote(&self.table.table)
        );
        debug!(sql = %sql, "Executing SQL");

        let mut query = sqlx::query(&sql);
        if let Some(parent) = param {
            query = query.bind(parent);
        }
        let row = query.fetch_one(&self.pool).await?;
        Ok(row.try_get::<Option<i64>, _>(0)?)
    }

    async fn fetch_ids(&self, ids: &[RecordId]) -> Result<Vec<OrderedRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM {} WHERE {} IN ({placeholders})",
            self.select_columns(),
            quote(&self.table.table),
            quote(&self.table.id_column)
        );
        debug!(sql = %sql, "Executing SQL");

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.0);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(decode_record).collect()
    }

    async fn fetch_scope(&self, scope: &Scope, ordering: &[OrderBy]) -> Result<Vec<OrderedRecord>> {
        let (condition, param) = self.scope_filter(scope)?;
        let mut sql = format!(
            "SELECT {} FROM {} WHERE {condition}",
            self.select_columns(),
            quote(&self.table.table)
        );
        if !ordering.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_clause(ordering)?);
        }
        debug!(sql = %sql, "Executing SQL");

        let mut query = sqlx::query(&sql);
        if let Some(parent) = param {
            query = query.bind(parent);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(decode_record).collect()
    }

    async fn update_orders(&self, writes: &[OrderWrite]) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET {} = ? WHERE {} = ?",
            quote(&self.table.table),
            quote(&self.table.order_column),
            quote(&self.table.id_column)
        );
        debug!(sql = %sql, rows = writes.len(), "Executing SQL in transaction");

        // Dropping the transaction without commit rolls it back.
        let mut tx = self.pool.begin().await?;
        for write in writes {
            let result = sqlx::query(&sql)
                .bind(write.order)
                .bind(write.id.0)
                .execute(&mut *tx)
                .await?;
            if result.rows_affected() == 0 {
                return Err(SqliteStoreError::RecordNotFound(write.id.0));
            }
        }
        tx.commit().await?;
        Ok(())
    }

    async fn insert_row(&self, scope: &Scope, order: Option<i64>) -> Result<RecordId> {
        let result = match (scope, self.table.scope_column.as_deref()) {
            (Scope::Parent(_), None) => {
                return Err(SqliteStoreError::Unscoped(self.table.table.clone()));
            }
            (_, Some(column)) => {
                let parent = match scope {
                    Scope::Parent(parent) => Some(*parent),
                    Scope::Global => None,
                };
                let sql = format!(
                    "INSERT INTO {} ({}, {}) VALUES (?, ?)",
                    quote(&self.table.table),
                    quote(column),
                    quote(&self.table.order_column)
                );
                sqlx::query(&sql)
                    .bind(parent)
                    .bind(order)
                    .execute(&self.pool)
                    .await?
            }
            (Scope::Global, None) => {
                let sql = format!(
                    "INSERT INTO {} ({}) VALUES (?)",
                    quote(&self.table.table),
                    quote(&self.table.order_column)
                );
                sqlx::query(&sql).bind(order).execute(&self.pool).await?
            }
        };
        Ok(RecordId(result.last_insert_rowid()))
    }
}

fn decode_record(row: &SqliteRow) -> Result<OrderedRecord> {
    let id: i64 = row.try_get(0)?;
    let parent: Option<i64> = row.try_get(1)?;
    let order: Option<i64> = row.try_get(2)?;
    let scope = parent.map_or(Scope::Global, Scope::Parent);
    Ok(OrderedRecord::new(RecordId(id), scope, order))
}

impl OrderStore for SqliteOrderStore {
    async fn max_order(&self, scope: &Scope) -> StoreResult<Option<i64>> {
        Ok(self.fetch_max(scope).await?)
    }

    async fn lookup(&self, ids: &[RecordId]) -> StoreResult<Vec<OrderedRecord>> {
        Ok(self.fetch_ids(ids).await?)
    }

    async fn read_scope(
        &self,
        scope: &Scope,
        ordering: &[OrderBy],
    ) -> StoreResult<Vec<OrderedRecord>> {
        Ok(self.fetch_scope(scope, ordering).await?)
    }

    async fn write_orders(&self, writes: &[OrderWrite]) -> StoreResult<()> {
        Ok(self.update_orders(writes).await?)
    }

    async fn insert(&self, scope: &Scope, order: Option<i64>) -> StoreResult<RecordId> {
        Ok(self.insert_row(scope, order).await?)
    }
}

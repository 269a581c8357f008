//! SQLite table handle.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};

use arrow::array::RecordBatch;
use itersink_core::TableHandle;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use crate::error::ConnectorError;
use crate::sql::{
    batch_rows, column_names, create_table_sql, insert_builder, rows_per_statement, SqlKind,
};
use crate::table::{blocking_runtime, TableOptions};

pub const MEMORY_PATH: &str = ":memory:";

/// A SQLite table that sink batches are appended to.
pub struct SqliteTable {
    pool: SqlitePool,
    table: String,
    path: String,
    create_if_missing: bool,
    created: AtomicBool,
    runtime: Runtime,
}

impl fmt::Debug for SqliteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteTable")
            .field("path", &self.path)
            .field("table", &self.table)
            .field("create_if_missing", &self.create_if_missing)
            .finish()
    }
}

impl SqliteTable {
    /// Open (creating if needed) the database file at `path` and bind to
    /// `table`. [`MEMORY_PATH`] opens a private in-memory database.
    pub fn connect(path: &str, table: &str, options: TableOptions) -> Result<Self, ConnectorError> {
        let runtime = blocking_runtime()?;

        let pool = if path == MEMORY_PATH {
            // Every connection would see its own empty database, so pin one.
            let connect = SqliteConnectOptions::from_str("sqlite::memory:")?;
            runtime.block_on(
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .min_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_with(connect),
            )?
        } else {
            let connect = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);
            runtime.block_on(
                SqlitePoolOptions::new()
                    .max_connections(options.max_connections)
                    .connect_with(connect),
            )?
        };
        info!("Opened SQLite table '{}' in {}", table, path);

        Ok(Self {
            pool,
            table: table.to_string(),
            path: path.to_string(),
            create_if_missing: options.create_if_missing,
            created: AtomicBool::new(false),
            runtime,
        })
    }

    pub fn in_memory(table: &str, options: TableOptions) -> Result<Self, ConnectorError> {
        Self::connect(MEMORY_PATH, table, options)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run a future on the handle's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    async fn insert(&self, batch: &RecordBatch) -> anyhow::Result<()> {
        if self.create_if_missing && !self.created.load(Ordering::Acquire) {
            let ddl = create_table_sql(&self.table, batch, SqlKind::sqlite_type);
            debug!("{}", ddl);
            sqlx::query(&ddl).execute(&self.pool).await?;
            self.created.store(true, Ordering::Release);
        }

        let names = column_names(batch);
        let chunk_size = rows_per_statement(names.len());
        let mut rows = batch_rows(batch)?.into_iter().peekable();

        let mut tx = self.pool.begin().await?;
        while rows.peek().is_some() {
            let chunk: Vec<_> = rows.by_ref().take(chunk_size).collect();
            let mut builder = insert_builder::<Sqlite>(&self.table, &names, chunk);
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

impl TableHandle for SqliteTable {
    fn connection(&self) -> String {
        format!("sqlite:{}", self.path)
    }

    fn table_name(&self) -> &str {
        &self.table
    }

    fn append(&self, batch: &RecordBatch) -> anyhow::Result<()> {
        if batch.num_rows() == 0 {
            return Ok(());
        }
        self.runtime.block_on(self.insert(batch))?;
        debug!("Appended {} rows to '{}'", batch.num_rows(), self.table);
        Ok(())
    }
}

impl Drop for SqliteTable {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}

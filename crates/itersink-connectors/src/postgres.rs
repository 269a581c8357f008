//! PostgreSQL table handle.
//!
//! Appends each batch with multi-row `INSERT` statements inside one
//! transaction. The pool is driven by a runtime owned by the handle.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use arrow::array::RecordBatch;
use itersink_core::TableHandle;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Postgres;
use tokio::runtime::Runtime;
use tracing::{debug, info};
use url::Url;

use crate::error::ConnectorError;
use crate::sql::{
    batch_rows, column_names, create_table_sql, insert_builder, rows_per_statement, SqlKind,
};
use crate::table::{blocking_runtime, TableOptions};

/// A Postgres table that sink batches are appended to.
pub struct PgTable {
    // Dropped before `runtime`.
    pool: PgPool,
    table: String,
    connection: String,
    create_if_missing: bool,
    created: AtomicBool,
    runtime: Runtime,
}

impl fmt::Debug for PgTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgTable")
            .field("connection", &self.connection)
            .field("table", &self.table)
            .field("create_if_missing", &self.create_if_missing)
            .finish()
    }
}

impl PgTable {
    /// Connect to `conn_string` and bind to `table`. The table itself is not
    /// checked until the first append.
    pub fn connect(
        conn_string: &str,
        table: &str,
        options: TableOptions,
    ) -> Result<Self, ConnectorError> {
        let connection = redact(conn_string)?;
        let runtime = blocking_runtime()?;
        let pool = runtime.block_on(
            PgPoolOptions::new()
                .max_connections(options.max_connections)
                .connect(conn_string),
        )?;
        info!("Connected to Postgres table '{}' on {}", table, connection);

        Ok(Self {
            pool,
            table: table.to_string(),
            connection,
            create_if_missing: options.create_if_missing,
            created: AtomicBool::new(false),
            runtime,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run a future on the handle's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    async fn insert(&self, batch: &RecordBatch) -> anyhow::Result<()> {
        if self.create_if_missing && !self.created.load(Ordering::Acquire) {
            let ddl = create_table_sql(&self.table, batch, SqlKind::postgres_type);
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
            let mut builder = insert_builder::<Postgres>(&self.table, &names, chunk);
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

impl TableHandle for PgTable {
    fn connection(&self) -> String {
        self.connection.clone()
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

impl Drop for PgTable {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}

/// The connection string with the password masked and no query, for logs
/// and errors.
fn redact(conn_string: &str) -> Result<String, ConnectorError> {
    let mut url = Url::parse(conn_string)?;
    if url.password().is_some() {
        url.set_password(Some("***"))
            .map_err(|_| ConnectorError::ConfigError("cannot redact password".to_string()))?;
    }
    url.set_query(None);
    Ok(url.to_string())
}

//! Sink that appends every batch directly to a live database table.

use std::fmt;
use std::sync::Arc;

use arrow::array::RecordBatch;
use tracing::debug;

use crate::batch::build_batch;
use crate::error::{Result, SinkError};
use crate::validate::ExtraColumns;
use crate::value::Args;

/// A handle to a table in an external database.
///
/// Implementations own (or share) a live connection. `append` performs one
/// write of the whole batch; it is never retried by the sink.
pub trait TableHandle: fmt::Debug + Send + Sync {
    /// Human-readable description of the connection, without credentials.
    fn connection(&self) -> String;

    /// Name of the target table.
    fn table_name(&self) -> &str;

    /// Append the rows of `batch`, keyed by column name.
    fn append(&self, batch: &RecordBatch) -> anyhow::Result<()>;
}

/// Builds one batch per call and writes it through the handle.
///
/// Nothing is buffered between calls, and the sink never reads back from the
/// table.
pub struct DatabaseSink {
    handle: Arc<dyn TableHandle>,
    extra: ExtraColumns,
    writes: u64,
}

impl DatabaseSink {
    pub fn new(handle: Arc<dyn TableHandle>, extra: ExtraColumns) -> Self {
        Self {
            handle,
            extra,
            writes: 0,
        }
    }

    pub fn handle(&self) -> &Arc<dyn TableHandle> {
        &self.handle
    }

    /// Number of successful writes issued so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }

    /// Build the call's batch and append it to the table.
    pub fn write(&mut self, args: Args) -> Result<()> {
        let batch = build_batch(args, &self.extra)?;
        self.handle.append(&batch).map_err(|e| {
            SinkError::write_failed(
                format!("table '{}' on {}", self.handle.table_name(), self.handle.connection()),
                e,
            )
        })?;
        self.writes += 1;
        debug!(
            "Appended {} rows to table '{}'",
            batch.num_rows(),
            self.handle.table_name()
        );
        Ok(())
    }
}

impl fmt::Debug for DatabaseSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSink")
            .field("handle", &self.handle)
            .field("extra_columns", &self.extra.len())
            .field("writes", &self.writes)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// In-memory table handle that records every appended batch.
    #[derive(Debug, Default)]
    pub struct RecordingTable {
        pub batches: Mutex<Vec<RecordBatch>>,
        pub fail_with: Option<String>,
    }

    impl TableHandle for RecordingTable {
        fn connection(&self) -> String {
            "memory".to_string()
        }

        fn table_name(&self) -> &str {
            "results"
        }

        fn append(&self, batch: &RecordBatch) -> anyhow::Result<()> {
            if let Some(reason) = &self.fail_with {
                anyhow::bail!("{}", reason);
            }
            self.batches.lock().unwrap().push(batch.clone());
            Ok(())
        }
    }
}

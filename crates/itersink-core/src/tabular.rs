//! In-memory accumulation of call batches into an Arrow table.

use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::{Field, Schema};
use tracing::debug;

use crate::batch::{self, build_batch};
use crate::error::Result;
use crate::validate::ExtraColumns;
use crate::value::Args;

/// Accumulates every batch into a single table, in call order.
#[derive(Debug, Clone)]
pub struct TabularSink {
    table: RecordBatch,
    extra: ExtraColumns,
}

impl TabularSink {
    /// Accumulate on top of `seed`, keeping any rows it already holds.
    pub fn new(seed: RecordBatch, extra: ExtraColumns) -> Self {
        Self { table: seed, extra }
    }

    /// The accumulated table.
    pub fn table(&self) -> &RecordBatch {
        &self.table
    }

    /// Append the call's batch and return the updated table.
    pub fn append(&mut self, args: Args) -> Result<RecordBatch> {
        let batch = build_batch(args, &self.extra)?;
        self.table = batch::append(&self.table, &batch)?;
        Ok(self.table.clone())
    }
}

/// A tabular sink that has no table until its first data-call.
///
/// The first data-call seeds a zero-row table with exactly that call's
/// columns plus the extra columns, then behaves as a [`TabularSink`].
#[derive(Debug, Clone)]
pub enum DeferredSink {
    Uninitialized { extra: ExtraColumns },
    Initialized(TabularSink),
}

impl DeferredSink {
    pub fn new(extra: ExtraColumns) -> Self {
        DeferredSink::Uninitialized { extra }
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self, DeferredSink::Initialized(_))
    }

    /// The accumulated table, or an empty table with no columns before the
    /// first data-call.
    pub fn table(&self) -> RecordBatch {
        match self {
            DeferredSink::Uninitialized { .. } => batch::empty_table(),
            DeferredSink::Initialized(sink) => sink.table().clone(),
        }
    }

    /// Append the call's batch, initializing the table on the first call.
    ///
    /// A failing first call leaves the sink uninitialized.
    pub fn append(&mut self, args: Args) -> Result<RecordBatch> {
        match self {
            DeferredSink::Initialized(sink) => sink.append(args),
            DeferredSink::Uninitialized { extra } => {
                let batch = build_batch(args, extra)?;
                let seed = RecordBatch::new_empty(zero_row_schema(&batch));
                let table = batch::append(&seed, &batch)?;
                debug!(
                    "Initialized deferred table with {} columns",
                    table.num_columns()
                );
                *self = DeferredSink::Initialized(TabularSink::new(
                    table.clone(),
                    std::mem::take(extra),
                ));
                Ok(table)
            }
        }
    }
}

fn zero_row_schema(batch: &RecordBatch) -> Arc<Schema> {
    let fields: Vec<Field> = batch
        .schema_ref()
        .fields()
        .iter()
        .map(|f| Field::new(f.name(), f.data_type().clone(), true))
        .collect();
    Arc::new(Schema::new(fields))
}

//! The sink factory and the unified sink type it returns.

use std::fmt;
use std::sync::Arc;

use arrow::array::RecordBatch;
use tracing::info;

use crate::database::{DatabaseSink, TableHandle};
use crate::error::Result;
use crate::stream::StreamSink;
use crate::tabular::{DeferredSink, TabularSink};
use crate::target::Target;
use crate::validate;
use crate::value::Args;

/// What a sink call hands back.
#[derive(Clone)]
pub enum SinkOutput {
    /// The full accumulated table (tabular and deferred sinks).
    Table(RecordBatch),
    /// The database handle, returned by the finish call of a database sink.
    Handle(Arc<dyn TableHandle>),
    /// A write happened (or nothing did); there is no value to return.
    Written,
}

impl SinkOutput {
    pub fn into_table(self) -> Option<RecordBatch> {
        match self {
            SinkOutput::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn into_handle(self) -> Option<Arc<dyn TableHandle>> {
        match self {
            SinkOutput::Handle(handle) => Some(handle),
            _ => None,
        }
    }
}

impl fmt::Debug for SinkOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkOutput::Table(table) => f
                .debug_struct("Table")
                .field("rows", &table.num_rows())
                .field("columns", &table.num_columns())
                .finish(),
            SinkOutput::Handle(handle) => f.debug_tuple("Handle").field(handle).finish(),
            SinkOutput::Written => f.write_str("Written"),
        }
    }
}

/// A stateful sink created by [`create_sink`].
///
/// Calls with arguments accumulate or write a batch; a call with no
/// arguments retrieves the result without changing anything. A sink is not
/// meant to be shared between threads without external serialization.
#[derive(Debug)]
pub enum Sink<'a> {
    Tabular(TabularSink),
    Deferred(DeferredSink),
    Database(DatabaseSink),
    Stream(StreamSink<'a>),
}

impl<'a> Sink<'a> {
    /// Invoke the sink. An empty `args` is the finish call.
    pub fn call(&mut self, args: Args) -> Result<SinkOutput> {
        if args.is_empty() {
            return Ok(self.finish());
        }

        match self {
            Sink::Tabular(sink) => sink.append(args).map(SinkOutput::Table),
            Sink::Deferred(sink) => sink.append(args).map(SinkOutput::Table),
            Sink::Database(sink) => sink.write(args).map(|_| SinkOutput::Written),
            Sink::Stream(sink) => sink.write(args).map(|_| SinkOutput::Written),
        }
    }

    /// Retrieve the sink's result: the accumulated table, the database
    /// handle, or nothing for streams.
    pub fn finish(&self) -> SinkOutput {
        match self {
            Sink::Tabular(sink) => SinkOutput::Table(sink.table().clone()),
            Sink::Deferred(sink) => SinkOutput::Table(sink.table()),
            Sink::Database(sink) => SinkOutput::Handle(Arc::clone(sink.handle())),
            Sink::Stream(_) => SinkOutput::Written,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Sink::Tabular(_) => "tabular",
            Sink::Deferred(_) => "deferred",
            Sink::Database(_) => "database",
            Sink::Stream(_) => "stream",
        }
    }
}

/// Create a sink over `target`, with `extra` constant columns merged into
/// every batch.
///
/// Extra columns must be named, unique and of length 1. Stream sinks ignore
/// them, since stream lines carry no names.
pub fn create_sink<'a>(target: impl Into<Target<'a>>, extra: Args) -> Result<Sink<'a>> {
    let extra = validate::extra_columns(extra)?;
    let target = target.into();

    info!(
        "Creating {} sink with {} extra columns",
        target.kind(),
        extra.len()
    );

    let sink = match target {
        Target::Table(seed) => Sink::Tabular(TabularSink::new(seed, extra)),
        Target::Database(handle) => Sink::Database(DatabaseSink::new(handle, extra)),
        Target::Stream(writer) => Sink::Stream(StreamSink::new(writer)),
        Target::Empty => Sink::Deferred(DeferredSink::new(extra)),
    };
    Ok(sink)
}

//! itersink core - output sinks for iterative computations
//!
//! A sink accepts named values once per iteration and either accumulates
//! them into an Arrow table, appends them to a database table, or writes
//! them as text lines to a stream. Calling a sink with no arguments
//! retrieves the result.
//!
//! ```
//! use itersink_core::{args, create_sink, Target};
//!
//! let mut sink = create_sink(Target::Empty, args![run = 1]).unwrap();
//! for i in 1..=5 {
//!     sink.call(args![a = i, b = i + 1]).unwrap();
//! }
//! let table = sink.finish().into_table().unwrap();
//! assert_eq!(table.num_rows(), 5);
//! ```

pub mod batch;
pub mod database;
pub mod error;
pub mod sink;
pub mod stream;
pub mod tabular;
pub mod target;
pub mod validate;
pub mod value;

pub use database::{DatabaseSink, TableHandle};
pub use error::{Result, SinkError};
pub use sink::{create_sink, Sink, SinkOutput};
pub use stream::StreamSink;
pub use tabular::{DeferredSink, TabularSink};
pub use target::{Target, TargetKind};
pub use validate::ExtraColumns;
pub use value::{Arg, Args, IntoValue};

// Re-export for downstream consumers
pub use arrow::array::RecordBatch;

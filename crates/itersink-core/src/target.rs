//! Target descriptors: what a sink writes into.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::RecordBatch;

use crate::database::TableHandle;
use crate::error::{Result, SinkError};

/// The closed set of things a sink can be created over.
pub enum Target<'a> {
    /// An in-memory table to accumulate into, rows included.
    Table(RecordBatch),
    /// A live database table.
    Database(Arc<dyn TableHandle>),
    /// A writable text stream owned by the caller.
    Stream(Box<dyn Write + 'a>),
    /// No target: a table is created on the first data-call.
    Empty,
}

impl<'a> Target<'a> {
    /// Wrap any writer, including a `&mut` borrow of a caller-owned one.
    pub fn stream(writer: impl Write + 'a) -> Self {
        Target::Stream(Box::new(writer))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Target::Table(_) => "table",
            Target::Database(_) => "database",
            Target::Stream(_) => "stream",
            Target::Empty => "empty",
        }
    }
}

impl fmt::Debug for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Table(batch) => f
                .debug_struct("Table")
                .field("rows", &batch.num_rows())
                .field("columns", &batch.num_columns())
                .finish(),
            Target::Database(handle) => f.debug_tuple("Database").field(handle).finish(),
            Target::Stream(_) => f.write_str("Stream"),
            Target::Empty => f.write_str("Empty"),
        }
    }
}

impl From<RecordBatch> for Target<'_> {
    fn from(batch: RecordBatch) -> Self {
        Target::Table(batch)
    }
}

impl From<Arc<dyn TableHandle>> for Target<'_> {
    fn from(handle: Arc<dyn TableHandle>) -> Self {
        Target::Database(handle)
    }
}

/// Which target a textual descriptor names, before anything is opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    /// `""` or `memory:`
    Memory,
    /// `-` or `stdout:`
    Stdout,
    /// `file:PATH` or a bare path
    File(PathBuf),
    /// `postgres://...` or `postgresql://...`
    Postgres(String),
    /// `sqlite:...`
    Sqlite(String),
}

impl TargetKind {
    /// Classify a target URI.
    ///
    /// A `scheme://...` URI whose scheme is not listed on [`TargetKind`] is
    /// rejected with [`SinkError::UnsupportedTargetKind`]. Without `//`, an
    /// unknown `prefix:` is part of a file name (`results:v2.txt`).
    pub fn from_uri(uri: &str) -> Result<Self> {
        let uri = uri.trim();
        match uri {
            "" | "memory:" => return Ok(TargetKind::Memory),
            "-" | "stdout:" => return Ok(TargetKind::Stdout),
            _ => {}
        }

        if let Some(path) = uri.strip_prefix("file:") {
            let path = path.strip_prefix("//").unwrap_or(path);
            return Ok(TargetKind::File(PathBuf::from(path)));
        }

        match scheme(uri) {
            Some("postgres") | Some("postgresql") => Ok(TargetKind::Postgres(uri.to_string())),
            Some("sqlite") => Ok(TargetKind::Sqlite(uri.to_string())),
            Some(other) if uri[other.len() + 1..].starts_with("//") => {
                Err(SinkError::UnsupportedTargetKind(other.to_string()))
            }
            _ => Ok(TargetKind::File(PathBuf::from(uri))),
        }
    }
}

/// The URI scheme, if `uri` starts with one (`scheme:` with at least two
/// characters, so Windows drive letters stay paths).
fn scheme(uri: &str) -> Option<&str> {
    let (head, _) = uri.split_once(':')?;
    let valid = head.len() > 1
        && head.starts_with(|c: char| c.is_ascii_alphabetic())
        && head
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid.then_some(head)
}

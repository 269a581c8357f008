//! Typed errors for sink creation and sink calls.

use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use thiserror::Error;

/// Errors raised by the sink factory and by sink calls.
///
/// Every error is local to the call that raised it; nothing is retried or
/// rolled back.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("unsupported sink target kind: {0}")]
    UnsupportedTargetKind(String),

    #[error("argument {position} must be named")]
    UnnamedArgument { position: usize },

    #[error("duplicate argument names: {}", .0.join(", "))]
    DuplicateArgumentName(Vec<String>),

    #[error("extra columns must have length 1: {}", describe_lengths(.0))]
    NonScalarExtraColumn(Vec<(String, usize)>),

    #[error("argument lengths cannot be recycled to a common length: {}", describe_lengths(.0))]
    IncompatibleLengths(Vec<(String, usize)>),

    #[error("column '{column}' holds {existing} but the batch supplies {incoming}")]
    ColumnTypeConflict {
        column: String,
        existing: DataType,
        incoming: DataType,
    },

    #[error("write to {target} failed")]
    WriteFailed {
        target: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

pub type Result<T> = std::result::Result<T, SinkError>;

fn describe_lengths(entries: &[(String, usize)]) -> String {
    entries
        .iter()
        .map(|(name, len)| format!("{} (length {})", name, len))
        .collect::<Vec<_>>()
        .join(", ")
}

impl SinkError {
    pub(crate) fn write_failed(
        target: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        SinkError::WriteFailed {
            target: target.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_lengths_message_lists_every_argument() {
        let err = SinkError::IncompatibleLengths(vec![("a".to_string(), 2), ("b".to_string(), 5)]);
        assert_eq!(
            err.to_string(),
            "argument lengths cannot be recycled to a common length: a (length 2), b (length 5)"
        );
    }

    #[test]
    fn test_duplicate_names_message() {
        let err = SinkError::DuplicateArgumentName(vec!["x".to_string(), "y".to_string()]);
        assert_eq!(err.to_string(), "duplicate argument names: x, y");
    }

    #[test]
    fn test_write_failed_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = SinkError::write_failed("stream", io);
        assert_eq!(err.to_string(), "write to stream failed");
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "pipe closed");
    }
}

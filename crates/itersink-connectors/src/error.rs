//! Typed errors for the connectors crate.

use std::fmt;
use std::io;

use itersink_core::SinkError;

/// Errors that can occur while opening a sink target.
#[derive(Debug)]
pub enum ConnectorError {
    /// Failed to establish a connection to the database.
    ConnectionFailed(String),
    /// Invalid or missing configuration in the target URI.
    ConfigError(String),
    /// Opening a file target failed.
    Io(io::Error),
    /// The target was rejected before anything was opened.
    Target(SinkError),
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectorError::ConnectionFailed(msg) => write!(f, "connection failed: {}", msg),
            ConnectorError::ConfigError(msg) => write!(f, "config error: {}", msg),
            ConnectorError::Io(e) => write!(f, "io error: {}", e),
            ConnectorError::Target(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ConnectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectorError::Io(e) => Some(e),
            ConnectorError::Target(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for ConnectorError {
    fn from(e: sqlx::Error) -> Self {
        ConnectorError::ConnectionFailed(e.to_string())
    }
}

impl From<io::Error> for ConnectorError {
    fn from(e: io::Error) -> Self {
        ConnectorError::Io(e)
    }
}

impl From<url::ParseError> for ConnectorError {
    fn from(e: url::ParseError) -> Self {
        ConnectorError::ConfigError(format!("invalid target URI: {}", e))
    }
}

impl From<SinkError> for ConnectorError {
    fn from(e: SinkError) -> Self {
        ConnectorError::Target(e)
    }
}

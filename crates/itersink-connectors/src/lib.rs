//! itersink connectors - database and file targets for sinks
//!
//! This crate opens sink targets from URIs:
//! - PostgreSQL tables
//! - SQLite tables
//! - text files and standard output

pub mod error;
pub mod open;
pub mod postgres;
pub mod sql;
pub mod sqlite;
pub mod table;

pub use error::ConnectorError;
pub use open::{open_target, parse_database_uri, DatabaseTarget};
pub use postgres::PgTable;
pub use sqlite::SqliteTable;
pub use table::TableOptions;

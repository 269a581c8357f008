//! Options shared by the database table handles.

use tokio::runtime::{Builder, Runtime};

/// Default pool size for database targets.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 2;

/// How a database table handle is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    /// Create the table from the first written batch's schema if it does
    /// not exist yet.
    pub create_if_missing: bool,
    pub max_connections: u32,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            create_if_missing: false,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

/// A single-threaded runtime owned by a table handle, so sink calls can stay
/// synchronous.
pub(crate) fn blocking_runtime() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

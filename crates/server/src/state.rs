//! Application state shared across handlers.

use std::sync::Arc;

use crate::store::Database;

/// Application state shared across all handlers.
///
/// Cheap to clone; all clones share one [`Database`].
#[derive(Clone, Debug)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    db: Database,
}

impl AppState {
    /// Wrap a database in shared state.
    #[must_use]
    pub fn new(db: Database) -> Self {
        Self {
            inner: Arc::new(AppStateInner { db }),
        }
    }

    /// The in-memory database.
    #[must_use]
    pub fn db(&self) -> &Database {
        &self.inner.db
    }
}

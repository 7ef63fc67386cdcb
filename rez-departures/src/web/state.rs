//! Application state for the web layer.

use std::sync::Arc;

use crate::dashboard::{Dashboard, SnapshotStore};

/// Shared application state.
///
/// Contains all the services needed to handle requests.
pub struct AppState<T> {
    /// Board fetcher, estimator and their caches
    pub dashboard: Arc<Dashboard<T>>,

    /// Latest snapshot published by the poller
    pub snapshots: Arc<SnapshotStore>,
}

impl<T> AppState<T> {
    /// Create a new app state.
    pub fn new(dashboard: Arc<Dashboard<T>>, snapshots: Arc<SnapshotStore>) -> Self {
        Self {
            dashboard,
            snapshots,
        }
    }
}

// Derived Clone would require `T: Clone`.
impl<T> Clone for AppState<T> {
    fn clone(&self) -> Self {
        Self {
            dashboard: Arc::clone(&self.dashboard),
            snapshots: Arc::clone(&self.snapshots),
        }
    }
}

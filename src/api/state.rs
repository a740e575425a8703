use std::sync::Arc;

use crate::services::DEFAULT_SHORTLIST_SIZE;
use crate::storage::Snapshot;

/// Shared application state
///
/// The snapshot never changes after startup, so handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<Snapshot>,
    pub shortlist_size: usize,
}

impl AppState {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(snapshot),
            shortlist_size: DEFAULT_SHORTLIST_SIZE,
        }
    }

    pub fn with_shortlist_size(mut self, shortlist_size: usize) -> Self {
        self.shortlist_size = shortlist_size;
        self
    }
}

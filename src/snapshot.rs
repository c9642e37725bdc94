//! Read-only snapshot view for the presentation layer.

use std::sync::Arc;

use crate::domain::AgentRecord;
use crate::store::PresenceStore;

/// Stateless reader over a shared [`PresenceStore`].
///
/// Renderers poll this on their own cadence; every call reflects the store's
/// state at call time, with no caching in between.
#[derive(Clone)]
pub struct SnapshotReader {
    store: Arc<PresenceStore>,
}

impl SnapshotReader {
    #[must_use]
    pub fn new(store: Arc<PresenceStore>) -> Self {
        Self { store }
    }

    /// Flattened copy of all current agent records.
    #[must_use]
    pub fn read(&self) -> Vec<AgentRecord> {
        self.store.snapshot()
    }

    /// Whether the feed behind the snapshot is currently connected.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.store.is_connected()
    }
}

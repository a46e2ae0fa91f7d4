//! RAM-only column storage.
//!
//! Keeps encoded snapshots in memory. Useful for tests and worlds that are thrown away
//! on shutdown.

use cubic_utils::{ColumnPos, locks::SyncRwLock};
use rustc_hash::FxHashMap;

/// In-memory column storage.
#[derive(Debug, Default)]
pub struct RamOnlyStorage {
    /// Encoded snapshots by column.
    saved_columns: SyncRwLock<FxHashMap<ColumnPos, Vec<u8>>>,
}

impl RamOnlyStorage {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot saved for a column.
    #[must_use]
    pub fn read_column(&self, pos: ColumnPos) -> Option<Vec<u8>> {
        self.saved_columns.read().get(&pos).cloned()
    }

    /// Stores a snapshot, replacing the previous one.
    pub fn write_column(&self, pos: ColumnPos, bytes: Vec<u8>) {
        self.saved_columns.write().insert(pos, bytes);
    }

    /// Checks if a column has been saved.
    #[must_use]
    pub fn column_exists(&self, pos: ColumnPos) -> bool {
        self.saved_columns.read().contains_key(&pos)
    }

    /// Number of saved columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.saved_columns.read().len()
    }

    /// Returns true if nothing was saved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.saved_columns.read().is_empty()
    }
}

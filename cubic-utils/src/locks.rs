//! Lock aliases so the rest of the workspace does not name `parking_lot` directly.

/// A synchronous reader-writer lock.
pub type SyncRwLock<T> = parking_lot::RwLock<T>;

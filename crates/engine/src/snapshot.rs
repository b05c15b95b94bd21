//! Atomically replaceable snapshots
//!
//! A [`SnapshotCell`] holds the current version of some immutable state
//! behind an `Arc`. Publishing swaps the pointer; readers clone the `Arc`
//! and keep the version they got for as long as they need it.
//!
//! # Snapshot Guarantees
//!
//! - A reader sees one complete version, never a mix of two
//! - A version stays alive until its last reader drops it
//! - A reader that loads after `publish` returns sees the new version
//!
//! The write lock is held only for the pointer swap, never while a new
//! version is being built.

use parking_lot::RwLock;
use std::sync::Arc;

/// Single-writer, multi-reader holder of an immutable snapshot
#[derive(Debug)]
pub struct SnapshotCell<T> {
    current: RwLock<Arc<T>>,
}

impl<T> SnapshotCell<T> {
    /// Create a cell holding `initial`
    pub fn new(initial: T) -> Self {
        SnapshotCell {
            current: RwLock::new(Arc::new(initial)),
        }
    }

    /// The current version
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.current.read())
    }

    /// Replace the current version, returning the previous one
    pub fn publish(&self, next: T) -> Arc<T> {
        let next = Arc::new(next);
        std::mem::replace(&mut *self.current.write(), next)
    }
}

impl<T: Default> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

//! Atomically swapped snapshot cells.
//!
//! A [`SnapshotCell`] holds an optional `Arc<T>` that readers load without
//! locking. Writers publish a whole new snapshot or invalidate the current
//! one; a reader holding the previous snapshot keeps using it untouched.
//! This is how cached topology, primvar descriptors and instancer data are
//! shared between data sources that may be queried from many threads.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

/// Lock-free, lazily built, invalidatable snapshot.
pub struct SnapshotCell<T> {
    slot: ArcSwapOption<T>,
    /// Number of times a snapshot was built (diagnostics).
    builds: AtomicUsize,
}

impl<T> SnapshotCell<T> {
    /// Create an empty cell.
    pub fn new() -> Self {
        Self {
            slot: ArcSwapOption::from(None),
            builds: AtomicUsize::new(0),
        }
    }

    /// Create a cell holding `value`.
    pub fn with_value(value: T) -> Self {
        Self {
            slot: ArcSwapOption::from(Some(Arc::new(value))),
            builds: AtomicUsize::new(0),
        }
    }

    /// Current snapshot, if populated.
    #[inline]
    pub fn load(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    /// Publish a new snapshot.
    #[inline]
    pub fn store(&self, value: Arc<T>) {
        self.slot.store(Some(value));
    }

    /// Current snapshot, building and publishing one if empty.
    ///
    /// Concurrent callers may both build; the last store wins and every
    /// caller gets a consistent snapshot.
    pub fn get_or_build<F: FnOnce() -> T>(&self, build: F) -> Arc<T> {
        if let Some(existing) = self.slot.load_full() {
            return existing;
        }
        let built = Arc::new(build());
        self.builds.fetch_add(1, Ordering::Relaxed);
        self.slot.store(Some(Arc::clone(&built)));
        built
    }

    /// Drop the current snapshot.
    #[inline]
    pub fn invalidate(&self) {
        self.slot.store(None);
    }

    #[inline]
    pub fn is_populated(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Number of snapshots built through [`get_or_build`](Self::get_or_build).
    #[inline]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl<T> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for SnapshotCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotCell")
            .field("populated", &self.is_populated())
            .field("builds", &self.build_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_once() {
        let cell = SnapshotCell::new();
        assert!(!cell.is_populated());
        let a = cell.get_or_build(|| 5);
        let b = cell.get_or_build(|| 6);
        assert_eq!((*a, *b), (5, 5));
        assert_eq!(cell.build_count(), 1);
    }

    #[test]
    fn test_invalidate_keeps_old_snapshot() {
        let cell = SnapshotCell::with_value(vec![1, 2]);
        let old = cell.load().unwrap();
        cell.invalidate();
        assert!(cell.load().is_none());
        assert_eq!(*old, vec![1, 2]);
        let new = cell.get_or_build(|| vec![3]);
        assert_eq!(*new, vec![3]);
        assert_eq!(*old, vec![1, 2]);
    }

    #[test]
    fn test_concurrent_readers() {
        let cell = Arc::new(SnapshotCell::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cell = Arc::clone(&cell);
                std::thread::spawn(move || *cell.get_or_build(|| 42u32))
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 42);
        }
    }
}

//! Scene index trait and observer protocol.
//!
//! A [`SceneIndex`] maps prim paths to [`Prim`]s and reports changes to
//! registered [`SceneIndexObserver`]s. Observers are held weakly: a scene
//! index never keeps its downstream filters alive.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::core::{ContainerHandle, LocatorSet};
use crate::scene::PrimView;
use crate::util::{Path, Token};

// ============================================================================
// Prim
// ============================================================================

/// A prim as seen through a scene index.
#[derive(Clone, Default)]
pub struct Prim {
    /// Prim type; empty for typeless prims and hidden prims.
    pub prim_type: Token,
    /// Prim-level container; `None` when the prim has no data.
    pub data_source: Option<ContainerHandle>,
}

impl Prim {
    /// Create a new prim.
    pub fn new(prim_type: Token, data_source: Option<ContainerHandle>) -> Self {
        Self {
            prim_type,
            data_source,
        }
    }

    /// Check if the prim carries neither a type nor data.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prim_type.is_empty() && self.data_source.is_none()
    }
}

impl fmt::Debug for Prim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Prim")
            .field("prim_type", &self.prim_type)
            .field("has_data_source", &self.data_source.is_some())
            .finish()
    }
}

// ============================================================================
// Notice entries
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddedPrimEntry {
    pub prim_path: Path,
    pub prim_type: Token,
}

impl AddedPrimEntry {
    pub fn new(prim_path: Path, prim_type: Token) -> Self {
        Self {
            prim_path,
            prim_type,
        }
    }
}

/// Removal of a prim and its whole subtree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemovedPrimEntry {
    pub prim_path: Path,
}

impl RemovedPrimEntry {
    pub fn new(prim_path: Path) -> Self {
        Self { prim_path }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirtiedPrimEntry {
    pub prim_path: Path,
    pub dirty_locators: LocatorSet,
}

impl DirtiedPrimEntry {
    pub fn new(prim_path: Path, dirty_locators: LocatorSet) -> Self {
        Self {
            prim_path,
            dirty_locators,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenamedPrimEntry {
    pub old_prim_path: Path,
    pub new_prim_path: Path,
}

impl RenamedPrimEntry {
    pub fn new(old_prim_path: Path, new_prim_path: Path) -> Self {
        Self {
            old_prim_path,
            new_prim_path,
        }
    }
}

// ============================================================================
// Observer
// ============================================================================

/// Receiver of scene index change notices.
///
/// Notices are delivered synchronously on the thread that caused the
/// change, in batches.
pub trait SceneIndexObserver: Send + Sync {
    fn prims_added(&self, sender: &dyn SceneIndex, entries: &[AddedPrimEntry]);

    fn prims_removed(&self, sender: &dyn SceneIndex, entries: &[RemovedPrimEntry]);

    fn prims_dirtied(&self, sender: &dyn SceneIndex, entries: &[DirtiedPrimEntry]);

    /// Renames default to a removal of the old subtree followed by an
    /// addition of every prim under the new path.
    fn prims_renamed(&self, sender: &dyn SceneIndex, entries: &[RenamedPrimEntry]) {
        let (removed, added) = convert_renamed_entries(sender, entries);
        if !removed.is_empty() {
            self.prims_removed(sender, &removed);
        }
        if !added.is_empty() {
            self.prims_added(sender, &added);
        }
    }
}

/// Express renames as removals plus additions of the renamed subtrees.
pub fn convert_renamed_entries(
    sender: &dyn SceneIndex,
    entries: &[RenamedPrimEntry],
) -> (Vec<RemovedPrimEntry>, Vec<AddedPrimEntry>) {
    let removed = entries
        .iter()
        .map(|e| RemovedPrimEntry::new(e.old_prim_path.clone()))
        .collect();

    let mut added = Vec::new();
    for entry in entries {
        for path in PrimView::new(sender, entry.new_prim_path.clone()) {
            let prim_type = sender.prim(&path).prim_type;
            added.push(AddedPrimEntry::new(path, prim_type));
        }
    }
    (removed, added)
}

// ============================================================================
// ObserverList
// ============================================================================

/// Weakly held observers of one scene index.
#[derive(Default)]
pub struct ObserverList {
    observers: RwLock<Vec<Weak<dyn SceneIndexObserver>>>,
}

impl ObserverList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; registering the same one twice is a no-op.
    pub fn add(&self, observer: Weak<dyn SceneIndexObserver>) {
        let mut observers = self.observers.write();
        observers.retain(|o| o.strong_count() > 0);
        if !observers.iter().any(|o| Weak::ptr_eq(o, &observer)) {
            observers.push(observer);
        }
    }

    /// Unregister an observer.
    pub fn remove(&self, observer: &Weak<dyn SceneIndexObserver>) {
        self.observers
            .write()
            .retain(|o| o.strong_count() > 0 && !Weak::ptr_eq(o, observer));
    }

    /// Check if at least one live observer is registered.
    pub fn is_observed(&self) -> bool {
        self.observers.read().iter().any(|o| o.strong_count() > 0)
    }

    /// Number of live observers.
    pub fn len(&self) -> usize {
        self.observers
            .read()
            .iter()
            .filter(|o| o.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        !self.is_observed()
    }

    // Snapshot so observers may register or unregister while notified.
    fn live(&self) -> Vec<Arc<dyn SceneIndexObserver>> {
        self.observers.read().iter().filter_map(Weak::upgrade).collect()
    }

    pub fn send_added(&self, sender: &dyn SceneIndex, entries: &[AddedPrimEntry]) {
        if entries.is_empty() {
            return;
        }
        for observer in self.live() {
            observer.prims_added(sender, entries);
        }
    }

    pub fn send_removed(&self, sender: &dyn SceneIndex, entries: &[RemovedPrimEntry]) {
        if entries.is_empty() {
            return;
        }
        for observer in self.live() {
            observer.prims_removed(sender, entries);
        }
    }

    pub fn send_dirtied(&self, sender: &dyn SceneIndex, entries: &[DirtiedPrimEntry]) {
        if entries.is_empty() {
            return;
        }
        for observer in self.live() {
            observer.prims_dirtied(sender, entries);
        }
    }

    pub fn send_renamed(&self, sender: &dyn SceneIndex, entries: &[RenamedPrimEntry]) {
        if entries.is_empty() {
            return;
        }
        for observer in self.live() {
            observer.prims_renamed(sender, entries);
        }
    }
}

impl fmt::Debug for ObserverList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObserverList({} live)", self.len())
    }
}

// ============================================================================
// SceneIndex
// ============================================================================

/// Queryable scene: prims by path plus change notification.
pub trait SceneIndex: Send + Sync {
    /// Prim at `path`. A missing prim is `Prim::default()`.
    fn prim(&self, path: &Path) -> Prim;

    /// Immediate children of `path`.
    fn child_prim_paths(&self, path: &Path) -> Vec<Path>;

    fn observers(&self) -> &ObserverList;

    fn add_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
        self.observers().add(Arc::downgrade(observer));
    }

    fn remove_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
        self.observers().remove(&Arc::downgrade(observer));
    }

    fn is_observed(&self) -> bool {
        self.observers().is_observed()
    }

    /// Name for diagnostics.
    fn display_name(&self) -> String {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full).to_string()
    }
}

pub type SceneIndexHandle = Arc<dyn SceneIndex>;

// ============================================================================
// FilteringSceneIndex
// ============================================================================

/// Scene index computed from a single input scene index.
///
/// Filters observe their input and must forward equivalent or widened
/// notices; anything a filter does not understand passes through.
pub trait FilteringSceneIndex: SceneIndex + SceneIndexObserver {
    fn input_scene_index(&self) -> &SceneIndexHandle;
}

/// Share `filter` and register it as an observer of its input.
pub fn connect_filter<F>(filter: F) -> Arc<F>
where
    F: FilteringSceneIndex + 'static,
{
    let filter = Arc::new(filter);
    let weak: Weak<F> = Arc::downgrade(&filter);
    let weak: Weak<dyn SceneIndexObserver> = weak;
    filter.input_scene_index().observers().add(weak);
    filter
}

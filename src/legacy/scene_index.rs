//! Retained scene index populated from scene delegates.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::ContainerHandle;
use crate::legacy::prim::LegacyPrimDataSource;
use crate::legacy::DelegateHandle;
use crate::scene::{
    AddedPrimEntry, DirtiedPrimEntry, ObserverList, Prim, PrimTable, RemovedPrimEntry,
    RetainedAddedPrimEntry, SceneIndex,
};
use crate::util::{Path, Token};

/// Retained scene index whose prims may be backed by a [`SceneDelegate`].
///
/// Legacy prims keep their [`LegacyPrimDataSource`] so dirty notices can
/// drop its caches before observers hear about the change.
///
/// [`SceneDelegate`]: crate::legacy::SceneDelegate
#[derive(Default)]
pub struct LegacyPrimSceneIndex {
    table: RwLock<PrimTable>,
    legacy: RwLock<BTreeMap<Path, Arc<LegacyPrimDataSource>>>,
    observers: ObserverList,
}

impl LegacyPrimSceneIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the prim at `id` with one pulled from `delegate`.
    pub fn add_legacy_prim(&self, id: Path, prim_type: Token, delegate: DelegateHandle) {
        let data_source = Arc::new(LegacyPrimDataSource::new(
            delegate,
            id.clone(),
            prim_type.clone(),
        ));
        let container: ContainerHandle = data_source.clone();
        self.table
            .write()
            .insert(&id, Prim::new(prim_type.clone(), Some(container)));
        self.legacy.write().insert(id.clone(), data_source);
        tracing::trace!(target: "scene_index::legacy", %id, %prim_type, "legacy prim added");
        self.observers
            .send_added(self, &[AddedPrimEntry::new(id, prim_type)]);
    }

    /// Add or replace prims with explicit data sources.
    pub fn add_prims(&self, entries: &[RetainedAddedPrimEntry]) {
        let mut added = Vec::with_capacity(entries.len());
        {
            let mut table = self.table.write();
            let mut legacy = self.legacy.write();
            for entry in entries {
                legacy.remove(&entry.prim_path);
                table.insert(
                    &entry.prim_path,
                    Prim::new(entry.prim_type.clone(), entry.data_source.clone()),
                );
                added.push(AddedPrimEntry::new(
                    entry.prim_path.clone(),
                    entry.prim_type.clone(),
                ));
            }
        }
        self.observers.send_added(self, &added);
    }

    /// Remove prims with their subtrees, then send removed notices.
    pub fn remove_prims(&self, paths: &[Path]) {
        let mut removed = Vec::with_capacity(paths.len());
        {
            let mut table = self.table.write();
            let mut legacy = self.legacy.write();
            for path in paths {
                if table.remove_subtree(path) {
                    legacy.retain(|p, _| !p.has_prefix(path));
                    removed.push(RemovedPrimEntry::new(path.clone()));
                }
            }
        }
        self.observers.send_removed(self, &removed);
    }

    /// Let legacy prims drop stale caches, then send dirtied notices.
    pub fn dirty_prims(&self, entries: &[DirtiedPrimEntry]) {
        {
            let legacy = self.legacy.read();
            for entry in entries {
                if let Some(ds) = legacy.get(&entry.prim_path) {
                    ds.prim_dirtied(&entry.dirty_locators);
                }
            }
        }
        self.observers.send_dirtied(self, entries);
    }

    /// Legacy data source of the prim at `id`, if it was added through
    /// [`add_legacy_prim`](Self::add_legacy_prim).
    pub fn legacy_prim(&self, id: &Path) -> Option<Arc<LegacyPrimDataSource>> {
        self.legacy.read().get(id).cloned()
    }
}

impl SceneIndex for LegacyPrimSceneIndex {
    fn prim(&self, path: &Path) -> Prim {
        self.table.read().prim(path)
    }

    fn child_prim_paths(&self, path: &Path) -> Vec<Path> {
        self.table.read().child_prim_paths(path)
    }

    fn observers(&self) -> &ObserverList {
        &self.observers
    }
}

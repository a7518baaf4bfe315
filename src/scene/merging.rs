//! Scene index merging several inputs by precedence.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::core::{ContainerHandle, OverlayContainer};
use crate::scene::{
    AddedPrimEntry, DirtiedPrimEntry, ObserverList, Prim, PrimView, RemovedPrimEntry, SceneIndex,
    SceneIndexHandle, SceneIndexObserver,
};
use crate::util::Path;

/// Union of several scene indices, strongest input first.
///
/// Prim data sources are overlaid strongest first and the prim type is the
/// first non-empty type. Child paths are the ordered union over inputs.
pub struct MergingSceneIndex {
    inputs: RwLock<Vec<SceneIndexHandle>>,
    observers: ObserverList,
    this: Weak<MergingSceneIndex>,
}

impl MergingSceneIndex {
    /// Create a merging index over `inputs` and observe each of them.
    pub fn new(inputs: Vec<SceneIndexHandle>) -> Arc<Self> {
        let index = Arc::new_cyclic(|this| Self {
            inputs: RwLock::new(Vec::new()),
            observers: ObserverList::new(),
            this: this.clone(),
        });
        for input in inputs {
            index.observe(&input);
            index.inputs.write().push(input);
        }
        index
    }

    fn observe(&self, input: &SceneIndexHandle) {
        let weak: Weak<dyn SceneIndexObserver> = self.this.clone();
        input.observers().add(weak);
    }

    /// Append a weakest input and announce its prims.
    pub fn add_input(&self, input: SceneIndexHandle) {
        self.observe(&input);
        self.inputs.write().push(input.clone());
        if !self.is_observed() {
            return;
        }
        let added: Vec<AddedPrimEntry> = PrimView::new(input.as_ref(), Path::absolute_root())
            .map(|path| {
                let prim_type = self.prim(&path).prim_type;
                AddedPrimEntry::new(path, prim_type)
            })
            .collect();
        self.observers.send_added(self, &added);
    }

    /// Remove an input, announcing removals for prims only it provided.
    pub fn remove_input(&self, input: &SceneIndexHandle) {
        let removed_input = {
            let mut inputs = self.inputs.write();
            let Some(pos) = inputs.iter().position(|i| Arc::ptr_eq(i, input)) else {
                return;
            };
            inputs.remove(pos)
        };
        let weak: Weak<dyn SceneIndexObserver> = self.this.clone();
        removed_input.observers().remove(&weak);
        if !self.is_observed() {
            return;
        }

        let mut removed = Vec::new();
        let mut view = PrimView::new(removed_input.as_ref(), Path::absolute_root());
        while let Some(path) = view.next() {
            if path.is_absolute_root() {
                continue;
            }
            if !self.exists_in_any_input(&path) {
                removed.push(RemovedPrimEntry::new(path));
                view.skip_descendants();
            }
        }
        self.observers.send_removed(self, &removed);
    }

    /// Current inputs, strongest first.
    pub fn inputs(&self) -> Vec<SceneIndexHandle> {
        self.inputs.read().clone()
    }

    fn exists_in_any_input(&self, path: &Path) -> bool {
        let parent = path.parent();
        self.inputs
            .read()
            .iter()
            .any(|input| input.child_prim_paths(&parent).contains(path))
    }

    fn is_sender(input: &SceneIndexHandle, sender: &dyn SceneIndex) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(input), sender as *const dyn SceneIndex)
    }
}

impl SceneIndex for MergingSceneIndex {
    fn prim(&self, path: &Path) -> Prim {
        let inputs = self.inputs.read();
        let mut prim_type = None;
        let mut containers: Vec<ContainerHandle> = Vec::new();
        for input in inputs.iter() {
            let prim = input.prim(path);
            if prim_type.is_none() && !prim.prim_type.is_empty() {
                prim_type = Some(prim.prim_type);
            }
            if let Some(ds) = prim.data_source {
                containers.push(ds);
            }
        }
        let data_source = match containers.len() {
            0 => None,
            1 => containers.pop(),
            _ => Some(Arc::new(OverlayContainer::from_inputs(containers)) as ContainerHandle),
        };
        Prim::new(prim_type.unwrap_or_default(), data_source)
    }

    fn child_prim_paths(&self, path: &Path) -> Vec<Path> {
        let mut result: Vec<Path> = Vec::new();
        for input in self.inputs.read().iter() {
            for child in input.child_prim_paths(path) {
                if !result.contains(&child) {
                    result.push(child);
                }
            }
        }
        result
    }

    fn observers(&self) -> &ObserverList {
        &self.observers
    }
}

impl SceneIndexObserver for MergingSceneIndex {
    fn prims_added(&self, _sender: &dyn SceneIndex, entries: &[AddedPrimEntry]) {
        if !self.is_observed() {
            return;
        }
        // The merged type may come from a stronger input.
        let merged: Vec<AddedPrimEntry> = entries
            .iter()
            .map(|e| {
                let prim_type = self.prim(&e.prim_path).prim_type;
                AddedPrimEntry::new(e.prim_path.clone(), prim_type)
            })
            .collect();
        self.observers.send_added(self, &merged);
    }

    fn prims_removed(&self, sender: &dyn SceneIndex, entries: &[RemovedPrimEntry]) {
        if !self.is_observed() {
            return;
        }
        self.observers.send_removed(self, entries);

        // Prims still provided by other inputs come back.
        let others: Vec<SceneIndexHandle> = self
            .inputs
            .read()
            .iter()
            .filter(|i| !Self::is_sender(i, sender))
            .cloned()
            .collect();
        let mut readded = Vec::new();
        for entry in entries {
            for input in &others {
                let parent = entry.prim_path.parent();
                if !input.child_prim_paths(&parent).contains(&entry.prim_path) {
                    continue;
                }
                for path in PrimView::new(input.as_ref(), entry.prim_path.clone()) {
                    let prim_type = self.prim(&path).prim_type;
                    let added = AddedPrimEntry::new(path, prim_type);
                    if !readded.contains(&added) {
                        readded.push(added);
                    }
                }
            }
        }
        self.observers.send_added(self, &readded);
    }

    fn prims_dirtied(&self, _sender: &dyn SceneIndex, entries: &[DirtiedPrimEntry]) {
        self.observers.send_dirtied(self, entries);
    }
}

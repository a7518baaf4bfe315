//! Prefix path pruning filter.
//!
//! Hides every prim at or below a set of excluded path prefixes. Pruned
//! prims read as empty, disappear from their parent's child list, and
//! their notices are dropped.

use parking_lot::RwLock;

use crate::core::{sampled_at, Array, ContainerHandle, Locator};
use crate::scene::tokens::pruning;
use crate::scene::{
    AddedPrimEntry, DirtiedPrimEntry, FilteringSceneIndex, ObserverList, Prim, PrimView,
    RemovedPrimEntry, SceneIndex, SceneIndexHandle, SceneIndexObserver,
};
use crate::util::Path;

/// Configuration of a [`PrefixPathPruningSceneIndex`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrefixPathPruningConfig {
    pub exclude_path_prefixes: Vec<Path>,
}

impl PrefixPathPruningConfig {
    /// Read `excludePathPrefixes` from an input-args container.
    pub fn from_input_args(args: Option<&ContainerHandle>) -> Self {
        let exclude_path_prefixes = args
            .and_then(|args| {
                sampled_at(args, &Locator::new([pruning::EXCLUDE_PATH_PREFIXES]))
            })
            .map(|ds| ds.typed_value::<Array<Path>>(0.0).to_vec())
            .unwrap_or_default();
        Self {
            exclude_path_prefixes,
        }
    }
}

/// Sort, dedup and drop prefixes already covered by another prefix.
fn sanitize(mut prefixes: Vec<Path>) -> Vec<Path> {
    prefixes.retain(|p| !p.is_empty());
    Path::remove_descendent_paths(&mut prefixes);
    prefixes
}

/// Check `path` against sanitized (sorted, minimal) prefixes.
fn is_pruned_by(prefixes: &[Path], path: &Path) -> bool {
    // Last prefix ordered at or before `path`; descendants of a prefix
    // sort directly after it.
    let upper = prefixes.partition_point(|p| p <= path);
    upper > 0 && path.has_prefix(&prefixes[upper - 1])
}

fn covered_by(prefixes: &[Path], path: &Path) -> bool {
    prefixes.iter().any(|p| path.has_prefix(p))
}

/// Filter pruning whole subtrees by path prefix.
pub struct PrefixPathPruningSceneIndex {
    input: SceneIndexHandle,
    prefixes: RwLock<Vec<Path>>,
    observers: ObserverList,
}

impl PrefixPathPruningSceneIndex {
    /// Create a new filter over `input`.
    pub fn new(input: SceneIndexHandle, config: PrefixPathPruningConfig) -> Self {
        Self {
            input,
            prefixes: RwLock::new(sanitize(config.exclude_path_prefixes)),
            observers: ObserverList::new(),
        }
    }

    /// Create a new filter configured from an input-args container.
    pub fn from_input_args(input: SceneIndexHandle, args: Option<&ContainerHandle>) -> Self {
        Self::new(input, PrefixPathPruningConfig::from_input_args(args))
    }

    /// Current prefixes, sanitized.
    pub fn exclude_path_prefixes(&self) -> Vec<Path> {
        self.prefixes.read().clone()
    }

    pub fn is_pruned(&self, path: &Path) -> bool {
        is_pruned_by(&self.prefixes.read(), path)
    }

    /// Replace the excluded prefixes.
    ///
    /// When observed, prims exposed by the change are announced as added,
    /// then newly pruned subtrees as removed.
    pub fn set_exclude_path_prefixes(&self, prefixes: Vec<Path>) {
        let new = sanitize(prefixes);
        let old = {
            let mut current = self.prefixes.write();
            if *current == new {
                return;
            }
            std::mem::replace(&mut *current, new.clone())
        };
        if !self.is_observed() {
            return;
        }

        let mut added = Vec::new();
        for prefix in old.iter().filter(|p| !covered_by(&new, p)) {
            let exists = prefix.is_absolute_root()
                || self.input.child_prim_paths(&prefix.parent()).contains(prefix);
            if exists {
                for path in PrimView::new(self, prefix.clone()) {
                    let prim_type = self.input.prim(&path).prim_type;
                    added.push(AddedPrimEntry::new(path, prim_type));
                }
            }
        }

        let removed: Vec<RemovedPrimEntry> = new
            .iter()
            .filter(|p| !covered_by(&old, p))
            .map(|p| RemovedPrimEntry::new(p.clone()))
            .collect();

        tracing::debug!(
            target: "scene_index::notices",
            exposed = added.len(),
            pruned = removed.len(),
            "exclude path prefixes changed"
        );
        self.observers.send_added(self, &added);
        self.observers.send_removed(self, &removed);
    }
}

impl SceneIndex for PrefixPathPruningSceneIndex {
    fn prim(&self, path: &Path) -> Prim {
        if self.is_pruned(path) {
            return Prim::default();
        }
        self.input.prim(path)
    }

    fn child_prim_paths(&self, path: &Path) -> Vec<Path> {
        let prefixes = self.prefixes.read();
        if is_pruned_by(&prefixes, path) {
            return Vec::new();
        }
        let mut children = self.input.child_prim_paths(path);
        if !prefixes.is_empty() {
            children.retain(|child| !is_pruned_by(&prefixes, child));
        }
        children
    }

    fn observers(&self) -> &ObserverList {
        &self.observers
    }
}

impl SceneIndexObserver for PrefixPathPruningSceneIndex {
    fn prims_added(&self, _sender: &dyn SceneIndex, entries: &[AddedPrimEntry]) {
        let kept: Vec<AddedPrimEntry> = {
            let prefixes = self.prefixes.read();
            entries
                .iter()
                .filter(|e| !is_pruned_by(&prefixes, &e.prim_path))
                .cloned()
                .collect()
        };
        self.observers.send_added(self, &kept);
    }

    fn prims_removed(&self, _sender: &dyn SceneIndex, entries: &[RemovedPrimEntry]) {
        let kept: Vec<RemovedPrimEntry> = {
            let prefixes = self.prefixes.read();
            entries
                .iter()
                .filter(|e| !is_pruned_by(&prefixes, &e.prim_path))
                .cloned()
                .collect()
        };
        self.observers.send_removed(self, &kept);
    }

    fn prims_dirtied(&self, _sender: &dyn SceneIndex, entries: &[DirtiedPrimEntry]) {
        let kept: Vec<DirtiedPrimEntry> = {
            let prefixes = self.prefixes.read();
            entries
                .iter()
                .filter(|e| !is_pruned_by(&prefixes, &e.prim_path))
                .cloned()
                .collect()
        };
        self.observers.send_dirtied(self, &kept);
    }
}

impl FilteringSceneIndex for PrefixPathPruningSceneIndex {
    fn input_scene_index(&self) -> &SceneIndexHandle {
        &self.input
    }
}

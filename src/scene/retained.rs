//! In-memory scene index.
//!
//! [`PrimTable`] stores prims with ordered child lists; ancestors of an
//! inserted prim are created implicitly as empty prims. The absolute root
//! always exists. [`RetainedSceneIndex`] wraps a table and sends notices
//! for every edit.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::core::ContainerHandle;
use crate::scene::{
    AddedPrimEntry, DirtiedPrimEntry, ObserverList, Prim, RemovedPrimEntry, SceneIndex,
};
use crate::util::{Path, Token};

// ============================================================================
// PrimTable
// ============================================================================

#[derive(Clone, Default)]
struct TableEntry {
    prim: Prim,
    children: Vec<Path>,
}

/// Path-keyed prim storage with child lists.
#[derive(Clone)]
pub(crate) struct PrimTable {
    entries: BTreeMap<Path, TableEntry>,
}

impl PrimTable {
    pub(crate) fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(Path::absolute_root(), TableEntry::default());
        Self { entries }
    }

    pub(crate) fn prim(&self, path: &Path) -> Prim {
        self.entries
            .get(path)
            .map(|e| e.prim.clone())
            .unwrap_or_default()
    }

    pub(crate) fn child_prim_paths(&self, path: &Path) -> Vec<Path> {
        self.entries
            .get(path)
            .map(|e| e.children.clone())
            .unwrap_or_default()
    }

    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    /// Insert or overwrite the prim at `path`, keeping its children.
    pub(crate) fn insert(&mut self, path: &Path, prim: Prim) {
        if !path.is_prim_path() {
            crate::coding_error!("cannot insert prim at non-prim path <{}>", path);
            return;
        }
        self.ensure(path);
        if let Some(entry) = self.entries.get_mut(path) {
            entry.prim = prim;
        }
    }

    fn ensure(&mut self, path: &Path) {
        if self.entries.contains_key(path) {
            return;
        }
        let parent = path.parent();
        self.ensure(&parent);
        if let Some(parent_entry) = self.entries.get_mut(&parent) {
            parent_entry.children.push(path.clone());
        }
        self.entries.insert(path.clone(), TableEntry::default());
    }

    /// Remove `path` and its subtree. Removing the root clears the table.
    /// Returns whether anything was removed.
    pub(crate) fn remove_subtree(&mut self, path: &Path) -> bool {
        if path.is_absolute_root() {
            let had_children = self.entries.len() > 1;
            *self = Self::new();
            return had_children;
        }
        if !self.entries.contains_key(path) {
            return false;
        }
        let doomed: Vec<Path> = self
            .entries
            .range(path.clone()..)
            .map(|(p, _)| p)
            .take_while(|p| p.has_prefix(path))
            .cloned()
            .collect();
        for p in &doomed {
            self.entries.remove(p);
        }
        if let Some(parent_entry) = self.entries.get_mut(&path.parent()) {
            parent_entry.children.retain(|c| c != path);
        }
        true
    }
}

impl Default for PrimTable {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// RetainedSceneIndex
// ============================================================================

/// Prim to add to a [`RetainedSceneIndex`].
#[derive(Clone)]
pub struct RetainedAddedPrimEntry {
    pub prim_path: Path,
    pub prim_type: Token,
    pub data_source: Option<ContainerHandle>,
}

impl RetainedAddedPrimEntry {
    pub fn new(prim_path: Path, prim_type: Token, data_source: Option<ContainerHandle>) -> Self {
        Self {
            prim_path,
            prim_type,
            data_source,
        }
    }
}

/// Scene index backed by an editable in-memory table.
#[derive(Default)]
pub struct RetainedSceneIndex {
    table: RwLock<PrimTable>,
    observers: ObserverList,
}

impl RetainedSceneIndex {
    /// Create an index holding only the absolute root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite prims, then send added notices.
    pub fn add_prims(&self, entries: &[RetainedAddedPrimEntry]) {
        let mut added = Vec::with_capacity(entries.len());
        {
            let mut table = self.table.write();
            for entry in entries {
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
        tracing::trace!(count = added.len(), "retained prims added");
        self.observers.send_added(self, &added);
    }

    /// Remove prims with their subtrees, then send removed notices.
    pub fn remove_prims(&self, paths: &[Path]) {
        let mut removed = Vec::with_capacity(paths.len());
        {
            let mut table = self.table.write();
            for path in paths {
                if table.remove_subtree(path) {
                    removed.push(RemovedPrimEntry::new(path.clone()));
                }
            }
        }
        self.observers.send_removed(self, &removed);
    }

    /// Send dirtied notices. The stored data is not touched.
    pub fn dirty_prims(&self, entries: &[DirtiedPrimEntry]) {
        self.observers.send_dirtied(self, entries);
    }

    /// Check if a prim is stored at `path` (explicitly or implicitly).
    pub fn contains(&self, path: &Path) -> bool {
        self.table.read().contains(path)
    }
}

impl SceneIndex for RetainedSceneIndex {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn p(text: &str) -> Path {
        Path::parse(text).unwrap()
    }

    #[test]
    fn test_implicit_ancestors() {
        let mut table = PrimTable::new();
        table.insert(&p("/a/b/c"), Prim::new(Token::new("mesh"), None));
        assert!(table.contains(&p("/a")));
        assert_eq!(table.child_prim_paths(&p("/")), vec![p("/a")]);
        assert_eq!(table.child_prim_paths(&p("/a")), vec![p("/a/b")]);
        assert_eq!(table.prim(&p("/a/b/c")).prim_type, "mesh");
        assert!(table.prim(&p("/a")).is_empty());
    }

    #[test]
    fn test_overwrite_keeps_children() {
        let mut table = PrimTable::new();
        table.insert(&p("/a/b"), Prim::default());
        table.insert(&p("/a"), Prim::new(Token::new("xform"), None));
        assert_eq!(table.child_prim_paths(&p("/a")), vec![p("/a/b")]);
        assert_eq!(table.child_prim_paths(&p("/")), vec![p("/a")]);
    }

    #[test]
    fn test_remove_subtree() {
        let mut table = PrimTable::new();
        for path in ["/a/b", "/a/c", "/ab", "/a.x"] {
            if let Ok(path) = Path::parse(path) {
                if path.is_prim_path() {
                    table.insert(&path, Prim::default());
                }
            }
        }
        assert!(table.remove_subtree(&p("/a")));
        assert!(!table.contains(&p("/a/b")));
        assert!(!table.contains(&p("/a/c")));
        assert!(table.contains(&p("/ab")));
        assert_eq!(table.child_prim_paths(&p("/")), vec![p("/ab")]);
        assert!(!table.remove_subtree(&p("/a")));
    }

    #[test]
    fn test_child_order_is_insertion_order() {
        let index = RetainedSceneIndex::new();
        index.add_prims(&[
            RetainedAddedPrimEntry::new(p("/z"), Token::EMPTY, None),
            RetainedAddedPrimEntry::new(p("/a"), Token::EMPTY, None),
        ]);
        assert_eq!(index.child_prim_paths(&p("/")), vec![p("/z"), p("/a")]);
    }
}

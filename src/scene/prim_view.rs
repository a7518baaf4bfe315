//! Depth-first traversal over a scene index.

use rayon::prelude::*;

use crate::scene::{Prim, SceneIndex};
use crate::util::Path;

/// Depth-first, pre-order iterator over the paths under a root.
///
/// The root itself is yielded first. Children are expanded lazily, so
/// [`skip_descendants`](Self::skip_descendants) called right after a path
/// was yielded prunes its subtree.
pub struct PrimView<'a> {
    index: &'a dyn SceneIndex,
    stack: Vec<Path>,
    expand: Option<Path>,
}

impl<'a> PrimView<'a> {
    /// Create a view rooted at `root`.
    pub fn new(index: &'a dyn SceneIndex, root: Path) -> Self {
        Self {
            index,
            stack: vec![root],
            expand: None,
        }
    }

    /// Do not descend below the most recently yielded path.
    pub fn skip_descendants(&mut self) {
        self.expand = None;
    }
}

impl Iterator for PrimView<'_> {
    type Item = Path;

    fn next(&mut self) -> Option<Path> {
        if let Some(parent) = self.expand.take() {
            let children = self.index.child_prim_paths(&parent);
            self.stack.extend(children.into_iter().rev());
        }
        let path = self.stack.pop()?;
        self.expand = Some(path.clone());
        Some(path)
    }
}

/// Query many prims in parallel. Results keep the order of `paths`.
pub fn fetch_prims(index: &dyn SceneIndex, paths: &[Path]) -> Vec<(Path, Prim)> {
    paths
        .par_iter()
        .map(|path| (path.clone(), index.prim(path)))
        .collect()
}

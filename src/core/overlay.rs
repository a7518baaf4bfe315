//! Overlay container data source.
//!
//! Composes several containers by precedence: for each child name the
//! strongest input that has an opinion wins. A [`DataSourceHandle::Block`]
//! is an opinion that hides weaker inputs and reads as absent.
//!
//! The overlay is shallow. Containers found under the same name in two
//! inputs are not merged recursively; the stronger one is returned whole.

use std::sync::Arc;

use smallvec::SmallVec;

use crate::core::{ContainerDataSource, ContainerHandle, DataSourceHandle};
use crate::util::Token;

/// Ordered list of containers, strongest first.
#[derive(Clone, Default)]
pub struct OverlayContainer {
    inputs: SmallVec<[ContainerHandle; 2]>,
}

impl OverlayContainer {
    /// Create an overlay of `strong` over `weak`.
    pub fn new(strong: ContainerHandle, weak: ContainerHandle) -> Self {
        let mut inputs = SmallVec::new();
        inputs.push(strong);
        inputs.push(weak);
        Self { inputs }
    }

    /// Create an overlay of inputs ordered strongest first.
    pub fn from_inputs<I: IntoIterator<Item = ContainerHandle>>(inputs: I) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
        }
    }

    /// Overlay two optional containers. A single present input is
    /// returned as is.
    pub fn overlay_or(
        strong: Option<ContainerHandle>,
        weak: Option<ContainerHandle>,
    ) -> Option<ContainerHandle> {
        match (strong, weak) {
            (Some(s), Some(w)) => Some(Arc::new(Self::new(s, w))),
            (s, w) => s.or(w),
        }
    }

    #[inline]
    pub fn inputs(&self) -> &[ContainerHandle] {
        &self.inputs
    }
}

impl ContainerDataSource for OverlayContainer {
    fn names(&self) -> Vec<Token> {
        let mut names: Vec<Token> = Vec::new();
        for input in &self.inputs {
            for name in input.names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        for input in &self.inputs {
            match input.get(name) {
                Some(DataSourceHandle::Block) => return None,
                Some(ds) => return Some(ds),
                None => {}
            }
        }
        None
    }
}

//! # Scene Index
//!
//! Lazily evaluated scene description and composable scene index filters.
//!
//! Scene data is exposed as trees of data sources: containers of named
//! children, vectors, and time-sampled values pulled on demand. A scene
//! index maps prim paths to a prim type plus a container, and tells its
//! observers when prims are added, removed or dirtied. Filters stack on
//! top of each other, each one rewriting what passes through.
//!
//! ## Modules
//!
//! - [`util`] - Basic types (Token, Path, math, errors, logging)
//! - [`core`] - Data sources, locators, values and time samples
//! - [`scene`] - Scene index protocol, retained and merging scene indices
//! - [`legacy`] - Emulation of prim-by-prim scene delegates as data sources
//! - [`filters`] - Pruning, scene globals and velocity motion filters
//!
//! ## Example
//!
//! ```ignore
//! use scene_index::prelude::*;
//!
//! let scene = Arc::new(RetainedSceneIndex::new());
//! let globals = connect_filter(SceneGlobalsSceneIndex::new(scene.clone()));
//! let motion = connect_filter(VelocityMotionResolvingSceneIndex::new(globals.clone()));
//!
//! globals.set_time_codes_per_second(30.0);
//! let prim = motion.prim(&Path::parse("/points")?);
//! ```

pub mod util;
pub mod core;
pub mod scene;
pub mod legacy;
pub mod filters;

// Re-export commonly used types
pub use util::{Error, Path, Result, Token};
pub use core::{ContainerHandle, DataSourceHandle, Locator, LocatorSet, Value};
pub use scene::{Prim, SceneIndex, SceneIndexHandle, SceneIndexObserver};

/// Prelude module for convenient imports
pub mod prelude {
    pub use std::sync::Arc;

    pub use crate::util::{Error, Path, Result, Token};
    pub use crate::core::{
        container_get, sampled_at, ContainerDataSource, ContainerHandle, DataSourceHandle,
        Locator, LocatorSet, OverlayContainer, RetainedContainer, RetainedTypedSampled,
        SampledDataSource, SampledHandle, Time, Value,
    };
    pub use crate::scene::{
        connect_filter, AddedPrimEntry, DirtiedPrimEntry, FilteringSceneIndex,
        MergingSceneIndex, Prim, PrimView, RemovedPrimEntry, RetainedAddedPrimEntry,
        RetainedSceneIndex, SceneGlobalsSchema, SceneIndex, SceneIndexHandle,
        SceneIndexObserver,
    };
    pub use crate::legacy::{DelegateHandle, LegacyPrimSceneIndex, SceneDelegate};
    pub use crate::filters::*;
}

//! Scene layer - scene indices and change notification.
//!
//! This module provides:
//! - [`SceneIndex`] / [`SceneIndexObserver`] - The query and notice protocol
//! - [`FilteringSceneIndex`] / [`connect_filter`] - Single-input filters
//! - [`RetainedSceneIndex`] - Editable in-memory scene
//! - [`MergingSceneIndex`] - Precedence-ordered union of scenes
//! - [`PrimView`] - Depth-first traversal
//! - [`SceneGlobalsSchema`] - Reading scene globals back
//! - [`tokens`] - Well-known prim types, schema names and locators

mod globals;
mod index;
mod merging;
mod prim_view;
mod retained;
pub mod tokens;

pub use globals::{
    dependency, time_codes_per_second_dependency, SceneGlobalsSchema,
    DEFAULT_TIME_CODES_PER_SECOND, TIME_CODES_PER_SECOND_DEPENDENCY,
};
pub use index::{
    connect_filter, convert_renamed_entries, AddedPrimEntry, DirtiedPrimEntry,
    FilteringSceneIndex, ObserverList, Prim, RemovedPrimEntry, RenamedPrimEntry, SceneIndex,
    SceneIndexHandle, SceneIndexObserver,
};
pub use merging::MergingSceneIndex;
pub use prim_view::{fetch_prims, PrimView};
pub(crate) use retained::PrimTable;
pub use retained::{RetainedAddedPrimEntry, RetainedSceneIndex};

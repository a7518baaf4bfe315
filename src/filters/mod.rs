//! Filter layer - single-input scene indices shipped with the crate.
//!
//! This module provides:
//! - [`SceneGlobalsSceneIndex`] - Publishes frame, frame rate and render globals at `/`
//! - [`PrimTypePruningSceneIndex`] - Hides prims of configured types
//! - [`PrefixPathPruningSceneIndex`] - Hides subtrees under excluded prefixes
//! - [`VelocityMotionResolvingSceneIndex`] - Extrapolates motion from velocities
//!
//! Every filter is built from its input (and a typed config or an
//! input-args container), then shared with
//! [`connect_filter`](crate::scene::connect_filter) to receive notices.

mod prefix_path_pruning;
mod prim_type_pruning;
mod scene_globals;
mod velocity_motion;

pub use prefix_path_pruning::{PrefixPathPruningConfig, PrefixPathPruningSceneIndex};
pub use prim_type_pruning::{PrimTypePruningConfig, PrimTypePruningSceneIndex};
pub use scene_globals::{SceneGlobals, SceneGlobalsSceneIndex};
pub use velocity_motion::{
    prim_type_supports_velocity_motion, VelocityMotionMode, VelocityMotionResolvingSceneIndex,
};

//! Scene globals and dependency declarations.
//!
//! Scene globals live in a `sceneGlobals` container on a designated prim,
//! `/` by default. [`SceneGlobalsSchema`] reads them back from any scene
//! index. [`time_codes_per_second_dependency`] builds the `__dependencies`
//! entry declaring that a whole prim depends on the frame rate.

use std::sync::{Arc, LazyLock};

use crate::core::{
    container_at, ContainerHandle, DataSourceHandle, Locator, RetainedContainer,
    RetainedTypedSampled,
};
use crate::scene::tokens::{dependencies, scene_globals, SCENE_GLOBALS_LOCATOR};
use crate::scene::SceneIndex;
use crate::util::{Path, Token};

/// Frame rate assumed when no scene globals declare one.
pub const DEFAULT_TIME_CODES_PER_SECOND: f64 = 24.0;

/// Typed reader over a `sceneGlobals` container.
#[derive(Clone)]
pub struct SceneGlobalsSchema {
    container: Option<ContainerHandle>,
}

impl SceneGlobalsSchema {
    /// Wrap a `sceneGlobals` container.
    pub fn new(container: Option<ContainerHandle>) -> Self {
        Self { container }
    }

    /// Read the globals at the default prim `/`.
    pub fn from_scene_index(index: &dyn SceneIndex) -> Self {
        Self::from_scene_index_at(index, &Path::absolute_root())
    }

    /// Read the globals at `prim_path`.
    pub fn from_scene_index_at(index: &dyn SceneIndex, prim_path: &Path) -> Self {
        let container = index
            .prim(prim_path)
            .data_source
            .and_then(|ds| container_at(&ds, &SCENE_GLOBALS_LOCATOR));
        Self::new(container)
    }

    #[inline]
    pub fn is_defined(&self) -> bool {
        self.container.is_some()
    }

    fn typed<T: crate::core::ValueType>(&self, name: &Token) -> Option<T> {
        let ds = self.container.as_ref()?.get(name)?;
        let sampled = ds.as_sampled()?;
        T::from_value(&sampled.value(0.0))
    }

    pub fn active_render_pass_prim(&self) -> Option<Path> {
        self.typed(&scene_globals::ACTIVE_RENDER_PASS_PRIM)
    }

    pub fn active_render_settings_prim(&self) -> Option<Path> {
        self.typed(&scene_globals::ACTIVE_RENDER_SETTINGS_PRIM)
    }

    pub fn primary_camera_prim(&self) -> Option<Path> {
        self.typed(&scene_globals::PRIMARY_CAMERA_PRIM)
    }

    pub fn current_frame(&self) -> Option<f64> {
        self.typed(&scene_globals::CURRENT_FRAME)
    }

    pub fn time_codes_per_second(&self) -> Option<f64> {
        self.typed(&scene_globals::TIME_CODES_PER_SECOND)
    }

    /// Frame rate, or [`DEFAULT_TIME_CODES_PER_SECOND`].
    pub fn time_codes_per_second_or_default(&self) -> f64 {
        self.time_codes_per_second()
            .unwrap_or(DEFAULT_TIME_CODES_PER_SECOND)
    }

    pub fn scene_state_id(&self) -> Option<i32> {
        self.typed(&scene_globals::SCENE_STATE_ID)
    }
}

/// Name of the dependency on the scene frame rate.
pub const TIME_CODES_PER_SECOND_DEPENDENCY: Token =
    Token::from_static("prim_dep_globals_timeCodesPerSecond");

/// Build one dependency entry container.
pub fn dependency(
    depended_on_prim_path: Path,
    depended_on_locator: Locator,
    affected_locator: Locator,
) -> DataSourceHandle {
    RetainedContainer::handle([
        (
            dependencies::DEPENDED_ON_PRIM_PATH,
            Some(RetainedTypedSampled::handle(depended_on_prim_path)),
        ),
        (
            dependencies::DEPENDED_ON_DATA_SOURCE_LOCATOR,
            Some(RetainedTypedSampled::handle(depended_on_locator)),
        ),
        (
            dependencies::AFFECTED_DATA_SOURCE_LOCATOR,
            Some(RetainedTypedSampled::handle(affected_locator)),
        ),
    ])
}

static TIME_CODES_PER_SECOND_DEPENDENCIES: LazyLock<ContainerHandle> = LazyLock::new(|| {
    Arc::new(RetainedContainer::new([(
        TIME_CODES_PER_SECOND_DEPENDENCY,
        Some(dependency(
            Path::absolute_root(),
            SCENE_GLOBALS_LOCATOR.append(&scene_globals::TIME_CODES_PER_SECOND),
            Locator::empty(),
        )),
    )]))
});

/// `__dependencies` container making the whole prim depend on
/// `/.sceneGlobals.timeCodesPerSecond`. Shared between callers.
pub fn time_codes_per_second_dependency() -> ContainerHandle {
    TIME_CODES_PER_SECOND_DEPENDENCIES.clone()
}

//! Scene globals filter.
//!
//! Publishes the frame, frame rate, active render settings and friends as
//! a `sceneGlobals` container on `/`, overlaid over whatever the input
//! provides there.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{
    ContainerDataSource, ContainerHandle, DataSourceHandle, LocatorSet, OverlayContainer,
    RetainedContainer, RetainedTypedSampled,
};
use crate::scene::tokens::{scene_globals, scene_globals_locator};
use crate::scene::{
    AddedPrimEntry, DirtiedPrimEntry, FilteringSceneIndex, ObserverList, Prim, RemovedPrimEntry,
    RenamedPrimEntry, SceneIndex, SceneIndexHandle, SceneIndexObserver,
    DEFAULT_TIME_CODES_PER_SECOND,
};
use crate::util::{Path, Token};

// ============================================================================
// State
// ============================================================================

/// Values published under `sceneGlobals`.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneGlobals {
    pub active_render_pass_prim: Path,
    pub active_render_settings_prim: Option<Path>,
    pub primary_camera_prim: Option<Path>,
    /// NaN until a frame is set.
    pub current_frame: f64,
    pub time_codes_per_second: f64,
    pub scene_state_id: i32,
}

impl Default for SceneGlobals {
    fn default() -> Self {
        Self {
            active_render_pass_prim: Path::empty(),
            active_render_settings_prim: None,
            primary_camera_prim: None,
            current_frame: f64::NAN,
            time_codes_per_second: DEFAULT_TIME_CODES_PER_SECOND,
            scene_state_id: 0,
        }
    }
}

/// `sceneGlobals` container reading the filter state at query time.
struct SceneGlobalsContainer {
    state: Arc<RwLock<SceneGlobals>>,
}

impl ContainerDataSource for SceneGlobalsContainer {
    fn names(&self) -> Vec<Token> {
        vec![
            scene_globals::ACTIVE_RENDER_PASS_PRIM,
            scene_globals::ACTIVE_RENDER_SETTINGS_PRIM,
            scene_globals::PRIMARY_CAMERA_PRIM,
            scene_globals::CURRENT_FRAME,
            scene_globals::TIME_CODES_PER_SECOND,
            scene_globals::SCENE_STATE_ID,
        ]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let state = self.state.read();
        let optional_path =
            |path: &Option<Path>| path.clone().map(RetainedTypedSampled::handle);
        match name.as_str() {
            "activeRenderPassPrim" => Some(RetainedTypedSampled::handle(
                state.active_render_pass_prim.clone(),
            )),
            "activeRenderSettingsPrim" => optional_path(&state.active_render_settings_prim),
            "primaryCameraPrim" => optional_path(&state.primary_camera_prim),
            "currentFrame" => Some(RetainedTypedSampled::handle(state.current_frame)),
            "timeCodesPerSecond" => Some(RetainedTypedSampled::handle(
                state.time_codes_per_second,
            )),
            "sceneStateId" => Some(RetainedTypedSampled::handle(state.scene_state_id)),
            _ => None,
        }
    }
}

// ============================================================================
// SceneGlobalsSceneIndex
// ============================================================================

/// Filter publishing scene globals at `/`.
///
/// Each setter that changes a value sends one dirtied notice on `/` for
/// the changed member, and only while the filter is observed.
pub struct SceneGlobalsSceneIndex {
    input: SceneIndexHandle,
    state: Arc<RwLock<SceneGlobals>>,
    prim_container: ContainerHandle,
    observers: ObserverList,
}

impl SceneGlobalsSceneIndex {
    /// Create a new filter over `input`. Use
    /// [`connect_filter`](crate::scene::connect_filter) to start forwarding
    /// notices.
    pub fn new(input: SceneIndexHandle) -> Self {
        let state = Arc::new(RwLock::new(SceneGlobals::default()));
        let globals = DataSourceHandle::Container(Arc::new(SceneGlobalsContainer {
            state: state.clone(),
        }));
        let prim_container: ContainerHandle = Arc::new(RetainedContainer::new([(
            scene_globals::SCENE_GLOBALS,
            Some(globals),
        )]));
        Self {
            input,
            state,
            prim_container,
            observers: ObserverList::new(),
        }
    }

    /// Snapshot of the current values.
    pub fn globals(&self) -> SceneGlobals {
        self.state.read().clone()
    }

    pub fn set_active_render_pass_prim(&self, path: Path) {
        let changed = Self::replace(&mut self.state.write().active_render_pass_prim, path);
        self.changed(changed, &scene_globals::ACTIVE_RENDER_PASS_PRIM);
    }

    /// `None` clears the active render settings prim.
    pub fn set_active_render_settings_prim(&self, path: impl Into<Option<Path>>) {
        let changed =
            Self::replace(&mut self.state.write().active_render_settings_prim, path.into());
        self.changed(changed, &scene_globals::ACTIVE_RENDER_SETTINGS_PRIM);
    }

    pub fn set_primary_camera_prim(&self, path: impl Into<Option<Path>>) {
        let changed = Self::replace(&mut self.state.write().primary_camera_prim, path.into());
        self.changed(changed, &scene_globals::PRIMARY_CAMERA_PRIM);
    }

    /// Set the current frame. NaN counts as equal to NaN.
    pub fn set_current_frame(&self, frame: f64) {
        let changed = {
            let mut state = self.state.write();
            let old = state.current_frame;
            let same = old == frame || (old.is_nan() && frame.is_nan());
            state.current_frame = frame;
            !same
        };
        self.changed(changed, &scene_globals::CURRENT_FRAME);
    }

    pub fn set_time_codes_per_second(&self, time_codes_per_second: f64) {
        let changed = Self::replace(
            &mut self.state.write().time_codes_per_second,
            time_codes_per_second,
        );
        self.changed(changed, &scene_globals::TIME_CODES_PER_SECOND);
    }

    pub fn set_scene_state_id(&self, id: i32) {
        let changed = Self::replace(&mut self.state.write().scene_state_id, id);
        self.changed(changed, &scene_globals::SCENE_STATE_ID);
    }

    fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    // Called with the state lock released: observers may query us.
    fn changed(&self, changed: bool, member: &Token) {
        if !changed || !self.is_observed() {
            return;
        }
        tracing::trace!(target: "scene_index::notices", %member, "scene globals changed");
        let locators = LocatorSet::from(scene_globals_locator(member));
        self.observers.send_dirtied(
            self,
            &[DirtiedPrimEntry::new(Path::absolute_root(), locators)],
        );
    }
}

impl SceneIndex for SceneGlobalsSceneIndex {
    fn prim(&self, path: &Path) -> Prim {
        let mut prim = self.input.prim(path);
        if path.is_absolute_root() {
            prim.data_source =
                OverlayContainer::overlay_or(Some(self.prim_container.clone()), prim.data_source);
        }
        prim
    }

    fn child_prim_paths(&self, path: &Path) -> Vec<Path> {
        self.input.child_prim_paths(path)
    }

    fn observers(&self) -> &ObserverList {
        &self.observers
    }
}

impl SceneIndexObserver for SceneGlobalsSceneIndex {
    fn prims_added(&self, _sender: &dyn SceneIndex, entries: &[AddedPrimEntry]) {
        self.observers.send_added(self, entries);
    }

    fn prims_removed(&self, _sender: &dyn SceneIndex, entries: &[RemovedPrimEntry]) {
        self.observers.send_removed(self, entries);
    }

    fn prims_dirtied(&self, _sender: &dyn SceneIndex, entries: &[DirtiedPrimEntry]) {
        self.observers.send_dirtied(self, entries);
    }

    fn prims_renamed(&self, _sender: &dyn SceneIndex, entries: &[RenamedPrimEntry]) {
        self.observers.send_renamed(self, entries);
    }
}

impl FilteringSceneIndex for SceneGlobalsSceneIndex {
    fn input_scene_index(&self) -> &SceneIndexHandle {
        &self.input
    }
}

//! Velocity motion over delegate-backed and retained scenes.

mod common;

use std::sync::Arc;

use common::{p, setup, Log, MockDelegate};
use scene_index::core::{
    container_get, create_typed_retained, sampled_at, Array, ContainerHandle, Locator,
    LocatorSet, RetainedContainer, RetainedTypedSampled, SampledHandle, Value,
};
use scene_index::filters::{SceneGlobalsSceneIndex, VelocityMotionResolvingSceneIndex};
use scene_index::legacy::{DelegateHandle, Interpolation, LegacyPrimSceneIndex};
use scene_index::scene::tokens::{prim_type, primvars, velocity_motion};
use scene_index::scene::{
    connect_filter, DirtiedPrimEntry, RetainedAddedPrimEntry, RetainedSceneIndex, SceneIndex,
};
use scene_index::util::{Quat, Token, Vec3};

fn vec3s(values: &[[f32; 3]]) -> Array<Vec3> {
    values.iter().map(|v| Vec3::from_array(*v)).collect()
}

fn loc(text: &str) -> Locator {
    Locator::parse(text).unwrap()
}

fn assert_close(actual: Vec3, expected: Vec3) {
    assert!(
        (actual - expected).length() < 1e-5,
        "{:?} != {:?}",
        actual,
        expected
    );
}

struct Stack {
    delegate: Arc<MockDelegate>,
    legacy: Arc<LegacyPrimSceneIndex>,
    globals: Arc<SceneGlobalsSceneIndex>,
    motion: Arc<VelocityMotionResolvingSceneIndex>,
}

impl Stack {
    fn new() -> Self {
        setup();
        let delegate = MockDelegate::new();
        delegate.set_primvar(
            "/particles",
            "points",
            Interpolation::Vertex,
            "point",
            vec![(0.0, Value::Vec3fArray(vec3s(&[[0.0, 0.0, 0.0], [1.0, 1.0, 1.0]])))],
        );
        delegate.set_primvar(
            "/particles",
            "velocities",
            Interpolation::Vertex,
            "vector",
            vec![(0.0, Value::Vec3fArray(vec3s(&[[48.0, 0.0, 0.0], [0.0, 0.0, -48.0]])))],
        );

        let legacy = Arc::new(LegacyPrimSceneIndex::new());
        let handle: DelegateHandle = delegate.clone();
        legacy.add_legacy_prim(p("/particles"), prim_type::POINTS, handle.clone());
        legacy.add_legacy_prim(p("/cam"), prim_type::CAMERA, handle);

        let globals = connect_filter(SceneGlobalsSceneIndex::new(legacy.clone()));
        let motion = connect_filter(VelocityMotionResolvingSceneIndex::new(globals.clone()));
        Self {
            delegate,
            legacy,
            globals,
            motion,
        }
    }

    fn points(&self) -> SampledHandle {
        let ds = self.motion.prim(&p("/particles")).data_source.unwrap();
        sampled_at(&ds, &loc("primvars.points.primvarValue")).unwrap()
    }
}

fn positions(value: Value) -> Vec<Vec3> {
    value.get::<Array<Vec3>>().unwrap().to_vec()
}

#[test]
fn test_delegate_points_follow_velocities() {
    let stack = Stack::new();
    let points = stack.points();
    assert!(points.cast::<Array<Vec3>>().is_some());

    // 48 units per second at 24 frames per second.
    let moved = positions(points.value(1.0));
    assert_close(moved[0], Vec3::new(2.0, 0.0, 0.0));
    assert_close(moved[1], Vec3::new(1.0, 1.0, -1.0));
    assert_eq!(points.contributing_sample_times(-0.5, 0.5), Some(vec![-0.5, 0.5]));
}

#[test]
fn test_frame_rate_from_scene_globals() {
    let stack = Stack::new();
    stack.globals.set_time_codes_per_second(48.0);
    let moved = positions(stack.points().value(1.0));
    assert_close(moved[0], Vec3::new(1.0, 0.0, 0.0));

    let ds = stack.motion.prim(&p("/particles")).data_source.unwrap();
    let dependency = container_get(
        &ds,
        &loc("__dependencies.prim_dep_globals_timeCodesPerSecond"),
    );
    assert!(dependency.is_some());
}

#[test]
fn test_frame_rate_change_reaches_observers() {
    let stack = Stack::new();
    let log = Log::attach(stack.motion.as_ref());
    stack.globals.set_time_codes_per_second(30.0);
    assert_eq!(log.dirtied_locators(), vec!["/:sceneGlobals.timeCodesPerSecond"]);
}

#[test]
fn test_other_prims_pass_through() {
    let stack = Stack::new();
    let cam = stack.motion.prim(&p("/cam"));
    assert_eq!(cam.prim_type, prim_type::CAMERA);
    let ds = cam.data_source.unwrap();
    assert!(ds.get(&Token::new("__dependencies")).is_none());
}

#[test]
fn test_velocity_dirty_widened_to_points() {
    let stack = Stack::new();
    let log = Log::attach(stack.motion.as_ref());
    stack.legacy.dirty_prims(&[DirtiedPrimEntry::new(
        p("/particles"),
        LocatorSet::from(loc("primvars.velocities")),
    )]);

    let dirtied = log.dirtied_locators();
    assert!(dirtied.contains(&"/particles:primvars.velocities".to_string()));
    assert!(dirtied.contains(&"/particles:primvars.points".to_string()));
    assert!(dirtied.contains(&"/particles:primvars.instanceScales".to_string()));
    assert!(!dirtied.contains(&"/particles:primvars.instanceRotations".to_string()));
}

#[test]
fn test_updated_velocities_after_dirty() {
    let stack = Stack::new();
    stack.delegate.set_primvar(
        "/particles",
        "velocities",
        Interpolation::Vertex,
        "vector",
        vec![(0.0, Value::Vec3fArray(vec3s(&[[0.0, 24.0, 0.0], [0.0, 0.0, 0.0]])))],
    );
    stack.legacy.dirty_prims(&[DirtiedPrimEntry::new(
        p("/particles"),
        LocatorSet::from(loc("primvars.velocities")),
    )]);
    let moved = positions(stack.points().value(2.0));
    assert_close(moved[0], Vec3::new(0.0, 2.0, 0.0));
    assert_close(moved[1], Vec3::new(1.0, 1.0, 1.0));
}

fn instancer_scene(mode: Option<&str>) -> Arc<VelocityMotionResolvingSceneIndex> {
    let primvar = |value: Value| {
        Some(RetainedContainer::handle([(
            primvars::PRIMVAR_VALUE,
            Some(create_typed_retained(value)),
        )]))
    };
    let primvars_ds = RetainedContainer::handle([
        (
            primvars::INSTANCE_TRANSLATIONS,
            primvar(Value::Vec3fArray(vec3s(&[[0.0, 0.0, 0.0]]))),
        ),
        (
            primvars::VELOCITIES,
            primvar(Value::Vec3fArray(vec3s(&[[0.0, 0.0, 24.0]]))),
        ),
        (
            primvars::INSTANCE_ROTATIONS,
            primvar(Value::QuatfArray(Array::new(vec![Quat::IDENTITY]))),
        ),
        (
            primvars::ANGULAR_VELOCITIES,
            primvar(Value::Vec3fArray(vec3s(&[[0.0, 0.0, 24.0 * 90.0]]))),
        ),
        (
            primvars::INSTANCE_SCALES,
            primvar(Value::Vec3fArray(vec3s(&[[2.0, 2.0, 2.0]]))),
        ),
    ]);
    let mut entries = vec![(primvars::PRIMVARS, Some(primvars_ds))];
    if let Some(mode) = mode {
        entries.push((
            velocity_motion::VELOCITY_MOTION_MODE,
            Some(RetainedTypedSampled::handle(Token::new(mode))),
        ));
    }
    let container: ContainerHandle = Arc::new(RetainedContainer::new(entries));

    let scene = Arc::new(RetainedSceneIndex::new());
    scene.add_prims(&[RetainedAddedPrimEntry::new(
        p("/instancer"),
        prim_type::INSTANCER,
        Some(container),
    )]);
    connect_filter(VelocityMotionResolvingSceneIndex::new(scene))
}

fn instancer_value(index: &VelocityMotionResolvingSceneIndex, name: &str, t: f32) -> Value {
    let ds = index.prim(&p("/instancer")).data_source.unwrap();
    sampled_at(&ds, &loc(&format!("primvars.{name}.primvarValue")))
        .unwrap()
        .value(t)
}

#[test]
fn test_instancer_translations_and_rotations() {
    setup();
    let index = instancer_scene(None);

    let translations = instancer_value(&index, "instanceTranslations", 1.0);
    assert_close(positions(translations)[0], Vec3::new(0.0, 0.0, 1.0));

    let rotations = instancer_value(&index, "instanceRotations", 1.0);
    let rotation = rotations.get::<Array<Quat>>().unwrap()[0];
    let expected = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);
    assert!((rotation.dot(expected).abs() - 1.0).abs() < 1e-5);

    let scales = instancer_value(&index, "instanceScales", 1.0);
    assert_close(positions(scales)[0], Vec3::new(2.0, 2.0, 2.0));
}

#[test]
fn test_instancer_disable_freezes() {
    setup();
    let index = instancer_scene(Some("disable"));
    let translations = instancer_value(&index, "instanceTranslations", 1.0);
    assert_close(positions(translations)[0], Vec3::ZERO);
    let rotations = instancer_value(&index, "instanceRotations", 1.0);
    let rotation = rotations.get::<Array<Quat>>().unwrap()[0];
    assert!(rotation.abs_diff_eq(Quat::IDENTITY, 1e-5));
}

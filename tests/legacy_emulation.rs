//! Scene delegate prims read through the data source interface.

mod common;

use std::sync::Arc;

use common::{p, setup, Log, MockDelegate};
use rayon::prelude::*;
use scene_index::core::{sampled_at, Array, ContainerHandle, Locator, LocatorSet, Value};
use scene_index::legacy::{DelegateHandle, Interpolation, LegacyPrimSceneIndex};
use scene_index::scene::tokens::{camera, prim_type, primvars, schema, topology};
use scene_index::scene::{DirtiedPrimEntry, SceneIndex};
use scene_index::util::{DMat4, DVec3, Token, Vec3};

fn vec3s(values: &[[f32; 3]]) -> Value {
    Value::Vec3fArray(values.iter().map(|v| Vec3::from_array(*v)).collect())
}

fn loc(text: &str) -> Locator {
    Locator::parse(text).unwrap()
}

fn cube_scene() -> (Arc<MockDelegate>, Arc<LegacyPrimSceneIndex>) {
    let delegate = MockDelegate::new();
    delegate.set_mesh("/cube", vec![4, 4], vec![0, 1, 2, 3, 4, 5, 6, 7]);
    delegate.set_primvar(
        "/cube",
        "points",
        Interpolation::Vertex,
        "point",
        vec![
            (-1.0, vec3s(&[[0.0, 0.0, 0.0]])),
            (1.0, vec3s(&[[2.0, 0.0, 0.0]])),
        ],
    );
    delegate.set_primvar(
        "/cube",
        "displayColor",
        Interpolation::Constant,
        "color",
        vec![(0.0, vec3s(&[[1.0, 0.5, 0.0]]))],
    );
    delegate.set_transform(
        "/cube",
        vec![
            (0.0, DMat4::IDENTITY),
            (1.0, DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0))),
        ],
    );
    delegate.set_param("/cam", "focalLength", Value::Float(50.0));
    delegate.set_param("/cam", "projection", Value::Token(camera::ORTHOGRAPHIC));

    let scene = Arc::new(LegacyPrimSceneIndex::new());
    let handle: DelegateHandle = delegate.clone();
    scene.add_legacy_prim(p("/cube"), prim_type::MESH, handle.clone());
    scene.add_legacy_prim(p("/cam"), prim_type::CAMERA, handle);
    (delegate, scene)
}

fn prim_source(scene: &LegacyPrimSceneIndex, path: &str) -> ContainerHandle {
    scene.prim(&p(path)).data_source.unwrap()
}

#[test]
fn test_prim_names_follow_type() {
    setup();
    let (_, scene) = cube_scene();
    let cube = prim_source(&scene, "/cube");
    let names = cube.names();
    assert_eq!(names[0], topology::MESH);
    assert_eq!(names[1], primvars::PRIMVARS);
    assert!(names.contains(&schema::XFORM));
    assert!(names.contains(&schema::SCENE_DELEGATE));
    assert!(!names.contains(&camera::CAMERA));
    // Names are advisory: `get` answers by name alone.
    assert!(cube.get(&camera::CAMERA).is_some());

    let cam = prim_source(&scene, "/cam");
    assert!(cam.names().contains(&camera::CAMERA));
    assert!(cam.get(&topology::MESH).is_none());
}

#[test]
fn test_primvars_from_descriptors() {
    let (_, scene) = cube_scene();
    let cube = prim_source(&scene, "/cube");
    let primvars_ds = cube.get(&primvars::PRIMVARS).unwrap();
    let primvars_ds = primvars_ds.as_container().unwrap();
    assert_eq!(primvars_ds.names(), vec!["displayColor", "points"]);

    let interpolation = sampled_at(primvars_ds, &loc("points.interpolation")).unwrap();
    assert_eq!(interpolation.typed_value::<Token>(0.0), "vertex");
    let role = sampled_at(primvars_ds, &loc("displayColor.role")).unwrap();
    assert_eq!(role.typed_value::<Token>(0.0), "color");
    assert!(sampled_at(primvars_ds, &loc("points.indices")).is_none());
}

#[test]
fn test_primvar_sampling() {
    let (delegate, scene) = cube_scene();
    let cube = prim_source(&scene, "/cube");
    let points = sampled_at(&cube, &loc("primvars.points.primvarValue")).unwrap();

    // Offset 0 goes through the untimed query.
    let at_zero = points.typed_value::<Array<Vec3>>(0.0);
    assert_eq!(at_zero[0], Vec3::new(1.0, 0.0, 0.0));
    assert_eq!(MockDelegate::count(&delegate.sample_calls), 0);

    let late = points.typed_value::<Array<Vec3>>(0.5);
    assert_eq!(late[0], Vec3::new(1.5, 0.0, 0.0));
    assert_eq!(
        points.contributing_sample_times(-0.25, 0.25),
        Some(vec![-1.0, 1.0])
    );
    points.value(0.75);
    assert_eq!(MockDelegate::count(&delegate.sample_calls), 1);

    let color = sampled_at(&cube, &loc("primvars.displayColor.primvarValue")).unwrap();
    assert_eq!(color.contributing_sample_times(-1.0, 1.0), None);
}

#[test]
fn test_transform_sampling() {
    let (_, scene) = cube_scene();
    let cube = prim_source(&scene, "/cube");
    let matrix = sampled_at(&cube, &loc("xform.matrix")).unwrap();
    assert_eq!(matrix.typed_value::<DMat4>(0.0), DMat4::IDENTITY);
    let half = matrix.typed_value::<DMat4>(0.5);
    assert!((half.w_axis.x - 5.0).abs() < 1e-9);
    assert_eq!(matrix.contributing_sample_times(0.0, 1.0), Some(vec![0.0, 1.0]));
}

#[test]
fn test_topology_fetched_once_until_dirtied() {
    setup();
    let (delegate, scene) = cube_scene();
    let log = Log::attach(scene.as_ref());
    let cube = prim_source(&scene, "/cube");

    let counts = sampled_at(&cube, &loc("mesh.topology.faceVertexCounts")).unwrap();
    let indices = sampled_at(&cube, &loc("mesh.topology.faceVertexIndices")).unwrap();
    assert_eq!(&counts.typed_value::<Array<i32>>(0.0)[..], &[4, 4]);
    assert_eq!(indices.typed_value::<Array<i32>>(0.0).len(), 8);
    assert_eq!(MockDelegate::count(&delegate.topology_calls), 1);

    delegate.set_mesh("/cube", vec![3], vec![0, 1, 2]);
    assert_eq!(&counts.typed_value::<Array<i32>>(0.0)[..], &[4, 4]);

    scene.dirty_prims(&[DirtiedPrimEntry::new(
        p("/cube"),
        LocatorSet::from(loc("mesh.topology")),
    )]);
    assert_eq!(&counts.typed_value::<Array<i32>>(0.0)[..], &[3]);
    assert_eq!(MockDelegate::count(&delegate.topology_calls), 2);
    assert_eq!(log.dirtied_locators(), vec!["/cube:mesh.topology"]);
}

#[test]
fn test_primvars_refreshed_after_dirty() {
    let (delegate, scene) = cube_scene();
    let cube = prim_source(&scene, "/cube");
    cube.get(&primvars::PRIMVARS);
    let per_build = Interpolation::ALL.len();
    assert_eq!(MockDelegate::count(&delegate.descriptor_calls), per_build);

    delegate.set_primvar(
        "/cube",
        "normals",
        Interpolation::Vertex,
        "normal",
        vec![(0.0, vec3s(&[[0.0, 1.0, 0.0]]))],
    );
    scene.dirty_prims(&[DirtiedPrimEntry::new(
        p("/cube"),
        LocatorSet::from(loc("xform")),
    )]);
    let primvars_ds = cube.get(&primvars::PRIMVARS).unwrap();
    assert!(!primvars_ds.as_container().unwrap().names().contains(&primvars::NORMALS));

    scene.dirty_prims(&[DirtiedPrimEntry::new(
        p("/cube"),
        LocatorSet::from(loc("primvars.normals")),
    )]);
    let primvars_ds = cube.get(&primvars::PRIMVARS).unwrap();
    assert!(primvars_ds.as_container().unwrap().names().contains(&primvars::NORMALS));
    assert_eq!(MockDelegate::count(&delegate.descriptor_calls), 2 * per_build);
}

#[test]
fn test_camera_params() {
    let (_, scene) = cube_scene();
    let cam = prim_source(&scene, "/cam");
    let focal = sampled_at(&cam, &loc("camera.focalLength")).unwrap();
    assert!(focal.cast::<f32>().is_some());
    assert_eq!(focal.typed_value::<f32>(0.0), 50.0);
    let projection = sampled_at(&cam, &loc("camera.projection")).unwrap();
    assert_eq!(projection.typed_value::<Token>(0.0), camera::ORTHOGRAPHIC);
    let f_stop = sampled_at(&cam, &loc("camera.fStop")).unwrap();
    assert_eq!(f_stop.typed_value::<f32>(0.0), 0.0);
}

#[test]
fn test_concurrent_topology_reads() {
    let (delegate, scene) = cube_scene();
    let cube = prim_source(&scene, "/cube");
    // Racing first reads may each fetch; later readers share the snapshot.
    sampled_at(&cube, &loc("mesh.topology.faceVertexCounts"))
        .unwrap()
        .value(0.0);
    let sizes: Vec<usize> = (0..256)
        .into_par_iter()
        .map(|i| {
            let name = if i % 2 == 0 {
                "mesh.topology.faceVertexCounts"
            } else {
                "mesh.topology.faceVertexIndices"
            };
            sampled_at(&cube, &loc(name))
                .unwrap()
                .typed_value::<Array<i32>>(0.0)
                .len()
        })
        .collect();
    assert!(sizes.iter().all(|&n| n == 2 || n == 8));
    assert_eq!(MockDelegate::count(&delegate.topology_calls), 1);
}

#[test]
fn test_scene_delegate_handle_exposed() {
    let (delegate, scene) = cube_scene();
    let cube = prim_source(&scene, "/cube");
    let entry = sampled_at(&cube, &Locator::new([schema::SCENE_DELEGATE])).unwrap();
    let value = entry.value(0.0);
    let handle = value.downcast_ref::<DelegateHandle>().unwrap();
    let expected: DelegateHandle = delegate;
    assert!(Arc::ptr_eq(handle, &expected));
}

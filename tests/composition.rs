//! Data source composition and retained/merging scene indices.

mod common;

use std::sync::Arc;

use common::{p, setup, Log};
use scene_index::core::{
    container_get, sampled_at, to_json, ContainerHandle, DataSourceHandle, Locator, LocatorSet,
    OverlayContainer, RetainedContainer, RetainedTypedMultisampled, RetainedTypedSampled,
    RetainedVector,
};
use scene_index::scene::{
    connect_filter, fetch_prims, DirtiedPrimEntry, MergingSceneIndex, PrimView,
    RetainedAddedPrimEntry, RetainedSceneIndex, SceneIndex, SceneIndexHandle,
};
use scene_index::util::Token;

fn leaf(value: i32) -> Option<DataSourceHandle> {
    Some(RetainedTypedSampled::handle(value))
}

fn container(entries: Vec<(&str, Option<DataSourceHandle>)>) -> ContainerHandle {
    Arc::new(RetainedContainer::new(
        entries.into_iter().map(|(name, ds)| (Token::new(name), ds)),
    ))
}

fn int_at(c: &ContainerHandle, text: &str) -> Option<i32> {
    sampled_at(c, &Locator::parse(text).unwrap()).map(|s| s.typed_value::<i32>(0.0))
}

#[test]
fn test_overlay_precedence_and_names() {
    setup();
    let strong = container(vec![("a", leaf(1)), ("b", leaf(2))]);
    let weak = container(vec![("b", leaf(20)), ("c", leaf(30))]);
    let overlay: ContainerHandle = Arc::new(OverlayContainer::new(strong, weak));

    assert_eq!(int_at(&overlay, "a"), Some(1));
    assert_eq!(int_at(&overlay, "b"), Some(2));
    assert_eq!(int_at(&overlay, "c"), Some(30));
    assert_eq!(overlay.names(), vec!["a", "b", "c"]);
}

#[test]
fn test_block_masks_weaker_inputs() {
    let strong = container(vec![("hidden", Some(DataSourceHandle::Block))]);
    let middle = container(vec![("hidden", leaf(5)), ("kept", leaf(6))]);
    let weak = container(vec![("kept", leaf(60))]);
    let overlay: ContainerHandle =
        Arc::new(OverlayContainer::from_inputs([strong, middle, weak]));

    assert!(overlay.get(&Token::new("hidden")).is_none());
    assert_eq!(int_at(&overlay, "kept"), Some(6));
}

#[test]
fn test_overlay_is_shallow() {
    let strong = container(vec![("xform", Some(container(vec![("a", leaf(1))]).into()))]);
    let weak = container(vec![("xform", Some(container(vec![("b", leaf(2))]).into()))]);
    let overlay: ContainerHandle = Arc::new(OverlayContainer::new(strong, weak));

    assert_eq!(int_at(&overlay, "xform.a"), Some(1));
    assert_eq!(int_at(&overlay, "xform.b"), None);
}

#[test]
fn test_nested_lookup_and_json() {
    let root = container(vec![
        ("primvars", Some(container(vec![("points", leaf(3))]).into())),
        (
            "list",
            Some(RetainedVector::handle([leaf(1), leaf(2)])),
        ),
    ]);
    assert!(container_get(&root, &Locator::parse("primvars.points").unwrap()).is_some());
    assert!(container_get(&root, &Locator::parse("primvars.missing").unwrap()).is_none());
    assert!(container_get(&root, &Locator::parse("list.points").unwrap()).is_none());

    let json = to_json(Some(&DataSourceHandle::Container(root.clone())));
    assert_eq!(json["primvars"]["points"], 3);
    assert_eq!(json["list"][1], 2);
}

#[test]
fn test_multisampled_interpolation() {
    let ds = RetainedTypedMultisampled::handle([(-1.0f32, 0.0f32), (1.0, 10.0)]);
    let sampled = ds.as_sampled().unwrap();
    assert_eq!(sampled.typed_value::<f32>(0.0), 5.0);
    assert_eq!(sampled.typed_value::<f32>(4.0), 10.0);
    assert_eq!(
        sampled.contributing_sample_times(-0.5, 0.5),
        Some(vec![-1.0, 1.0])
    );
}

#[test]
fn test_locator_set_properties() {
    let mut set = LocatorSet::new();
    set.insert(Locator::parse("primvars.points").unwrap());
    set.insert(Locator::parse("primvars").unwrap());
    set.insert(Locator::parse("xform.matrix").unwrap());
    assert_eq!(set.len(), 2);
    assert!(set.contains(&Locator::parse("primvars.normals.primvarValue").unwrap()));
    assert!(!set.contains(&Locator::parse("xform").unwrap()));
    assert!(set.intersects_locator(&Locator::parse("xform").unwrap()));
    assert!(!set.intersects_locator(&Locator::parse("mesh").unwrap()));

    let moved = set.replace_prefix(
        &Locator::parse("xform").unwrap(),
        &Locator::parse("instancer.xform").unwrap(),
    );
    assert!(moved.contains(&Locator::parse("instancer.xform.matrix").unwrap()));
}

#[test]
fn test_retained_notices_and_traversal() {
    setup();
    let scene = Arc::new(RetainedSceneIndex::new());
    let log = Log::attach(scene.as_ref());

    scene.add_prims(&[
        RetainedAddedPrimEntry::new(p("/world"), Token::new("scope"), None),
        RetainedAddedPrimEntry::new(p("/world/a"), Token::new("mesh"), None),
        RetainedAddedPrimEntry::new(p("/world/a/b"), Token::new("mesh"), None),
        RetainedAddedPrimEntry::new(p("/world/c"), Token::new("points"), None),
    ]);
    let paths: Vec<String> = PrimView::new(scene.as_ref(), p("/"))
        .map(|path| path.to_string())
        .collect();
    assert_eq!(paths, vec!["/", "/world", "/world/a", "/world/a/b", "/world/c"]);

    let mut view = PrimView::new(scene.as_ref(), p("/world"));
    let mut visited = Vec::new();
    while let Some(path) = view.next() {
        if path == p("/world/a") {
            view.skip_descendants();
        }
        visited.push(path.to_string());
    }
    assert_eq!(visited, vec!["/world", "/world/a", "/world/c"]);

    scene.dirty_prims(&[DirtiedPrimEntry::new(
        p("/world/c"),
        LocatorSet::from(Locator::parse("primvars.points").unwrap()),
    )]);
    scene.remove_prims(&[p("/world/a")]);
    assert!(!scene.contains(&p("/world/a/b")));
    assert_eq!(
        log.events(),
        vec!["+/world", "+/world/a", "+/world/a/b", "+/world/c", "~/world/c", "-/world/a"]
    );
    assert_eq!(log.dirtied_locators(), vec!["/world/c:primvars.points"]);
}

#[test]
fn test_fetch_prims_keeps_order() {
    let scene = Arc::new(RetainedSceneIndex::new());
    let entries: Vec<RetainedAddedPrimEntry> = (0..64)
        .map(|i| RetainedAddedPrimEntry::new(p(&format!("/p{i}")), Token::new("mesh"), None))
        .collect();
    scene.add_prims(&entries);

    let paths: Vec<_> = entries.iter().rev().map(|e| e.prim_path.clone()).collect();
    let prims = fetch_prims(scene.as_ref(), &paths);
    assert_eq!(prims.len(), 64);
    for ((path, prim), expected) in prims.iter().zip(&paths) {
        assert_eq!(path, expected);
        assert_eq!(prim.prim_type, "mesh");
    }
}

#[test]
fn test_merging_precedence() {
    setup();
    let strong = Arc::new(RetainedSceneIndex::new());
    let weak = Arc::new(RetainedSceneIndex::new());
    strong.add_prims(&[RetainedAddedPrimEntry::new(
        p("/shared"),
        Token::EMPTY,
        Some(container(vec![("a", leaf(1))])),
    )]);
    weak.add_prims(&[
        RetainedAddedPrimEntry::new(
            p("/shared"),
            Token::new("mesh"),
            Some(container(vec![("a", leaf(10)), ("b", leaf(20))])),
        ),
        RetainedAddedPrimEntry::new(p("/weakOnly"), Token::new("points"), None),
    ]);

    let merged = MergingSceneIndex::new(vec![
        strong.clone() as SceneIndexHandle,
        weak.clone() as SceneIndexHandle,
    ]);
    let prim = merged.prim(&p("/shared"));
    assert_eq!(prim.prim_type, "mesh");
    let ds = prim.data_source.unwrap();
    assert_eq!(int_at(&ds, "a"), Some(1));
    assert_eq!(int_at(&ds, "b"), Some(20));
    assert_eq!(merged.child_prim_paths(&p("/")), vec![p("/shared"), p("/weakOnly")]);

    let log = Log::attach(merged.as_ref());
    strong.add_prims(&[RetainedAddedPrimEntry::new(
        p("/weakOnly"),
        Token::new("scope"),
        None,
    )]);
    assert_eq!(log.events(), vec!["+/weakOnly"]);
    assert_eq!(log.added_types(), vec![Token::new("scope")]);
}

#[test]
fn test_dropped_filter_stops_forwarding() {
    use scene_index::filters::SceneGlobalsSceneIndex;

    let scene = Arc::new(RetainedSceneIndex::new());
    let globals = connect_filter(SceneGlobalsSceneIndex::new(scene.clone()));
    let log = Log::attach(globals.as_ref());

    scene.add_prims(&[RetainedAddedPrimEntry::new(p("/a"), Token::new("mesh"), None)]);
    drop(globals);
    scene.add_prims(&[RetainedAddedPrimEntry::new(p("/b"), Token::new("mesh"), None)]);
    assert_eq!(log.events(), vec!["+/a"]);
}

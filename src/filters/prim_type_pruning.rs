//! Prim type pruning filter.
//!
//! While enabled, prims of the configured types read as empty and bindings
//! that target them (under the configured binding token) read as absent.
//! Child lists are untouched, so descendants of a pruned prim stay
//! reachable.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::core::{
    sampled_at, Array, ContainerDataSource, ContainerHandle, DataSourceHandle, Locator,
};
use crate::scene::tokens::{pruning, schema};
use crate::scene::{
    AddedPrimEntry, DirtiedPrimEntry, FilteringSceneIndex, ObserverList, Prim, RemovedPrimEntry,
    SceneIndex, SceneIndexHandle, SceneIndexObserver,
};
use crate::util::{Path, Token};

/// Configuration of a [`PrimTypePruningSceneIndex`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PrimTypePruningConfig {
    /// Types to prune.
    pub prim_types: Vec<Token>,
    /// Prim-level container holding bindings to filter, e.g.
    /// `materialBindings`. Empty disables binding filtering.
    pub binding_token: Token,
    /// Only prune prims at prim paths.
    pub do_not_prune_non_prim_paths: bool,
}

impl PrimTypePruningConfig {
    /// Read `primTypes`, `bindingToken` and `doNotPruneNonPrimPaths` from
    /// an input-args container. Missing members keep their defaults.
    pub fn from_input_args(args: Option<&ContainerHandle>) -> Self {
        let Some(args) = args else {
            return Self::default();
        };
        let read = |name: Token| sampled_at(args, &Locator::new([name]));
        Self {
            prim_types: read(pruning::PRIM_TYPES)
                .map(|ds| ds.typed_value::<Array<Token>>(0.0).to_vec())
                .unwrap_or_default(),
            binding_token: read(pruning::BINDING_TOKEN)
                .map(|ds| ds.typed_value::<Token>(0.0))
                .unwrap_or_default(),
            do_not_prune_non_prim_paths: read(pruning::DO_NOT_PRUNE_NON_PRIM_PATHS)
                .map(|ds| ds.typed_value::<bool>(0.0))
                .unwrap_or_default(),
        }
    }
}

// ============================================================================
// Pruning rules
// ============================================================================

/// Rules shared between the filter and the data sources it hands out.
struct Pruner {
    input: SceneIndexHandle,
    config: PrimTypePruningConfig,
    enabled: RwLock<bool>,
}

impl Pruner {
    fn enabled(&self) -> bool {
        *self.enabled.read()
    }

    fn prunes_type(&self, prim_type: &Token) -> bool {
        self.config.prim_types.contains(prim_type)
    }

    fn prunes_path(&self, path: &Path) -> bool {
        !self.config.do_not_prune_non_prim_paths || path.is_prim_path()
    }

    fn prunes(&self, path: &Path, prim_type: &Token) -> bool {
        self.enabled() && self.prunes_type(prim_type) && self.prunes_path(path)
    }

    /// Whether the prim at `target` is hidden by this filter.
    fn prunes_target(&self, target: &Path) -> bool {
        if !self.enabled() || target.is_empty() || !self.prunes_path(target) {
            return false;
        }
        self.prunes_type(&self.input.prim(target).prim_type)
    }
}

/// Path a binding entry points at: a path value, or a container with a
/// `path` member.
fn binding_target(binding: &DataSourceHandle) -> Option<Path> {
    match binding {
        DataSourceHandle::Sampled(sampled) => sampled.value(0.0).get::<Path>(),
        DataSourceHandle::Container(container) => container
            .get(&schema::MATERIAL_BINDING_PATH)?
            .as_sampled()?
            .value(0.0)
            .get::<Path>(),
        _ => None,
    }
}

// ============================================================================
// Data sources
// ============================================================================

/// Prim container whose binding container hides pruned targets.
struct PrimContainer {
    input: ContainerHandle,
    pruner: Arc<Pruner>,
}

impl ContainerDataSource for PrimContainer {
    fn names(&self) -> Vec<Token> {
        self.input.names()
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let ds = self.input.get(name)?;
        if *name != self.pruner.config.binding_token {
            return Some(ds);
        }
        match ds {
            DataSourceHandle::Container(bindings) => {
                Some(DataSourceHandle::container(BindingsContainer {
                    input: bindings,
                    pruner: self.pruner.clone(),
                }))
            }
            other => Some(other),
        }
    }
}

struct BindingsContainer {
    input: ContainerHandle,
    pruner: Arc<Pruner>,
}

impl ContainerDataSource for BindingsContainer {
    fn names(&self) -> Vec<Token> {
        self.input.names()
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let binding = self.input.get(name)?;
        match binding_target(&binding) {
            Some(target) if self.pruner.prunes_target(&target) => {
                tracing::trace!(%target, binding = %name, "binding to pruned prim hidden");
                None
            }
            _ => Some(binding),
        }
    }
}

// ============================================================================
// PrimTypePruningSceneIndex
// ============================================================================

/// Filter pruning prims by type. Disabled on creation.
pub struct PrimTypePruningSceneIndex {
    pruner: Arc<Pruner>,
    observers: ObserverList,
}

impl PrimTypePruningSceneIndex {
    /// Create a new, disabled filter over `input`.
    pub fn new(input: SceneIndexHandle, config: PrimTypePruningConfig) -> Self {
        Self {
            pruner: Arc::new(Pruner {
                input,
                config,
                enabled: RwLock::new(false),
            }),
            observers: ObserverList::new(),
        }
    }

    /// Create a new filter configured from an input-args container.
    pub fn from_input_args(input: SceneIndexHandle, args: Option<&ContainerHandle>) -> Self {
        Self::new(input, PrimTypePruningConfig::from_input_args(args))
    }

    #[inline]
    pub fn config(&self) -> &PrimTypePruningConfig {
        &self.pruner.config
    }

    #[inline]
    pub fn binding_token(&self) -> &Token {
        &self.pruner.config.binding_token
    }

    pub fn enabled(&self) -> bool {
        self.pruner.enabled()
    }

    /// Toggle pruning. No notices are sent; downstream consumers are
    /// expected to resync when they flip this.
    pub fn set_enabled(&self, enabled: bool) {
        *self.pruner.enabled.write() = enabled;
    }
}

impl SceneIndex for PrimTypePruningSceneIndex {
    fn prim(&self, path: &Path) -> Prim {
        let prim = self.pruner.input.prim(path);
        if !self.pruner.enabled() {
            return prim;
        }
        if self.pruner.prunes(path, &prim.prim_type) {
            return Prim::default();
        }
        if self.pruner.config.binding_token.is_empty() {
            return prim;
        }
        let data_source = prim.data_source.map(|input| {
            Arc::new(PrimContainer {
                input,
                pruner: self.pruner.clone(),
            }) as ContainerHandle
        });
        Prim::new(prim.prim_type, data_source)
    }

    fn child_prim_paths(&self, path: &Path) -> Vec<Path> {
        self.pruner.input.child_prim_paths(path)
    }

    fn observers(&self) -> &ObserverList {
        &self.observers
    }
}

impl SceneIndexObserver for PrimTypePruningSceneIndex {
    fn prims_added(&self, _sender: &dyn SceneIndex, entries: &[AddedPrimEntry]) {
        if !self.pruner.enabled() {
            self.observers.send_added(self, entries);
            return;
        }
        let entries: Vec<AddedPrimEntry> = entries
            .iter()
            .map(|e| {
                if self.pruner.prunes(&e.prim_path, &e.prim_type) {
                    AddedPrimEntry::new(e.prim_path.clone(), Token::EMPTY)
                } else {
                    e.clone()
                }
            })
            .collect();
        self.observers.send_added(self, &entries);
    }

    fn prims_removed(&self, _sender: &dyn SceneIndex, entries: &[RemovedPrimEntry]) {
        self.observers.send_removed(self, entries);
    }

    fn prims_dirtied(&self, _sender: &dyn SceneIndex, entries: &[DirtiedPrimEntry]) {
        self.observers.send_dirtied(self, entries);
    }
}

impl FilteringSceneIndex for PrimTypePruningSceneIndex {
    fn input_scene_index(&self) -> &SceneIndexHandle {
        &self.pruner.input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{container_get, RetainedContainer, RetainedTypedSampled};
    use crate::scene::tokens::prim_type;
    use crate::scene::{connect_filter, RetainedAddedPrimEntry, RetainedSceneIndex};
    use parking_lot::Mutex;

    fn p(text: &str) -> Path {
        Path::parse(text).unwrap()
    }

    fn bound_to(target: &str) -> ContainerHandle {
        let binding = RetainedContainer::handle([(
            schema::MATERIAL_BINDING_PATH,
            Some(RetainedTypedSampled::handle(p(target))),
        )]);
        Arc::new(RetainedContainer::new([(
            schema::MATERIAL_BINDINGS,
            Some(RetainedContainer::handle([(schema::ALL_PURPOSE, Some(binding))])),
        )]))
    }

    fn config() -> PrimTypePruningConfig {
        PrimTypePruningConfig {
            prim_types: vec![prim_type::MATERIAL],
            binding_token: schema::MATERIAL_BINDINGS,
            do_not_prune_non_prim_paths: false,
        }
    }

    fn scene() -> Arc<RetainedSceneIndex> {
        let input = Arc::new(RetainedSceneIndex::new());
        input.add_prims(&[
            RetainedAddedPrimEntry::new(p("/mat"), prim_type::MATERIAL, None),
            RetainedAddedPrimEntry::new(p("/mat/shader"), Token::new("shader"), None),
            RetainedAddedPrimEntry::new(p("/cube"), prim_type::MESH, Some(bound_to("/mat"))),
        ]);
        input
    }

    fn binding_locator() -> Locator {
        Locator::new([schema::MATERIAL_BINDINGS, schema::ALL_PURPOSE])
    }

    #[test]
    fn test_disabled_by_default() {
        let filter = connect_filter(PrimTypePruningSceneIndex::new(scene(), config()));
        assert!(!filter.enabled());
        assert_eq!(filter.prim(&p("/mat")).prim_type, "material");
        let cube = filter.prim(&p("/cube")).data_source.unwrap();
        assert!(container_get(&cube, &binding_locator()).is_some());
    }

    #[test]
    fn test_enabled_prunes_types_and_bindings() {
        let filter = connect_filter(PrimTypePruningSceneIndex::new(scene(), config()));
        filter.set_enabled(true);

        assert!(filter.prim(&p("/mat")).is_empty());
        assert_eq!(filter.child_prim_paths(&p("/mat")), vec![p("/mat/shader")]);
        assert_eq!(filter.prim(&p("/mat/shader")).prim_type, "shader");

        let cube = filter.prim(&p("/cube"));
        assert_eq!(cube.prim_type, "mesh");
        let cube = cube.data_source.unwrap();
        assert!(cube.get(&schema::MATERIAL_BINDINGS).is_some());
        assert!(container_get(&cube, &binding_locator()).is_none());
    }

    #[test]
    fn test_non_prim_paths_kept_when_asked() {
        let mut cfg = config();
        cfg.do_not_prune_non_prim_paths = true;
        let filter = PrimTypePruningSceneIndex::new(scene(), cfg);
        filter.set_enabled(true);
        assert!(!filter.pruner.prunes(&p("/mat.outputs"), &prim_type::MATERIAL));
        assert!(filter.pruner.prunes(&p("/mat"), &prim_type::MATERIAL));
    }

    #[test]
    fn test_added_notices_lose_pruned_types() {
        #[derive(Default)]
        struct Types(Mutex<Vec<String>>);

        impl SceneIndexObserver for Types {
            fn prims_added(&self, _sender: &dyn SceneIndex, entries: &[AddedPrimEntry]) {
                let mut types = self.0.lock();
                types.extend(entries.iter().map(|e| e.prim_type.to_string()));
            }

            fn prims_removed(&self, _sender: &dyn SceneIndex, _entries: &[RemovedPrimEntry]) {}

            fn prims_dirtied(&self, _sender: &dyn SceneIndex, _entries: &[DirtiedPrimEntry]) {}
        }

        let input = scene();
        let filter = connect_filter(PrimTypePruningSceneIndex::new(input.clone(), config()));
        let log = Arc::new(Types::default());
        let observer: Arc<dyn SceneIndexObserver> = log.clone();
        filter.add_observer(&observer);

        input.add_prims(&[RetainedAddedPrimEntry::new(p("/m2"), prim_type::MATERIAL, None)]);
        filter.set_enabled(true);
        input.add_prims(&[
            RetainedAddedPrimEntry::new(p("/m3"), prim_type::MATERIAL, None),
            RetainedAddedPrimEntry::new(p("/sphere"), prim_type::MESH, None),
        ]);
        assert_eq!(*log.0.lock(), vec!["material", "", "mesh"]);
    }

    #[test]
    fn test_config_from_input_args() {
        let args: ContainerHandle = Arc::new(RetainedContainer::new([
            (
                pruning::PRIM_TYPES,
                Some(RetainedTypedSampled::handle(Array::new(vec![prim_type::MATERIAL]))),
            ),
            (
                pruning::BINDING_TOKEN,
                Some(RetainedTypedSampled::handle(schema::MATERIAL_BINDINGS)),
            ),
            (
                pruning::DO_NOT_PRUNE_NON_PRIM_PATHS,
                Some(RetainedTypedSampled::handle(true)),
            ),
        ]));
        let filter = PrimTypePruningSceneIndex::from_input_args(scene(), Some(&args));
        assert_eq!(filter.binding_token(), &schema::MATERIAL_BINDINGS);
        assert_eq!(filter.config().prim_types, vec![prim_type::MATERIAL]);
        assert!(filter.config().do_not_prune_non_prim_paths);
        assert_eq!(
            PrimTypePruningConfig::from_input_args(None),
            PrimTypePruningConfig::default()
        );
    }
}

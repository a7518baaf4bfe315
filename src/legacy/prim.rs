//! Prim-level container of a legacy prim.
//!
//! [`LegacyPrimDataSource`] exposes a scene-delegate prim through the
//! container protocol. Which members it advertises depends on the prim
//! type. Primvars, ext computation primvars, instancer topology and
//! mesh / basis curves topology are cached per prim and dropped by
//! [`LegacyPrimDataSource::prim_dirtied`].

use std::sync::{Arc, OnceLock};

use crate::core::{
    Array, ContainerDataSource, ContainerHandle, DataSourceHandle, Locator, LocatorSet,
    RetainedContainer, RetainedSampled, RetainedTypedSampled, SampledDataSource, SnapshotCell,
    Time, TimeSampleArray, TypedSampledDataSource, Value,
};
use crate::legacy::camera::LegacyCameraContainer;
use crate::legacy::ext_computation::LegacyExtComputationContainer;
use crate::legacy::instancer::{
    categories_container, LegacyInstanceCategoriesContainer, LegacyInstancerTopologyContainer,
};
use crate::legacy::light::{LegacyLightCollections, LegacyLightContainer};
use crate::legacy::material::{material_bindings, material_container};
use crate::legacy::params::{
    volume_field_binding, LegacyDisplayStyleContainer, LegacyVolumeFieldContainer,
};
use crate::legacy::primvar::{LegacyExtComputationPrimvarsContainer, LegacyPrimvarsContainer};
use crate::legacy::render::{
    draw_target_container, render_terminal_resource, LegacyRenderBufferContainer,
    LegacyRenderSettingsContainer,
};
use crate::legacy::topology::{
    BasisCurvesTopologyStore, LegacyBasisCurvesContainer, LegacyMeshContainer,
    MeshTopologyStore, TopologyStore,
};
use crate::legacy::{DelegateHandle, ALL_SAMPLES};
use crate::scene::tokens::{
    self, ext_computation, instancer, light, prim_type, primvars, render, schema, topology,
};
use crate::util::{DMat4, Path, Token};

const COORD_SYS_PREFIX: &str = "coordSys:";
const BINDING_SUFFIX: &str = ":binding";

// ============================================================================
// Transform
// ============================================================================

/// Prim or instancer transform.
///
/// Offset 0 uses the untimed query; other offsets sample every authored
/// transform once and resample.
pub struct LegacyMatrixValue {
    delegate: DelegateHandle,
    id: Path,
    instancer: bool,
    samples: OnceLock<TimeSampleArray<DMat4>>,
}

impl LegacyMatrixValue {
    pub fn new(delegate: DelegateHandle, id: Path, instancer: bool) -> Self {
        Self {
            delegate,
            id,
            instancer,
            samples: OnceLock::new(),
        }
    }

    fn samples(&self) -> &TimeSampleArray<DMat4> {
        self.samples.get_or_init(|| {
            if self.instancer {
                self.delegate
                    .sample_instancer_transform(&self.id, ALL_SAMPLES)
            } else {
                self.delegate.sample_transform(&self.id, ALL_SAMPLES)
            }
        })
    }
}

impl SampledDataSource for LegacyMatrixValue {
    fn value(&self, shutter_offset: Time) -> Value {
        Value::Matrix4d(self.typed_value(shutter_offset))
    }

    fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>> {
        self.samples().contributing_sample_times(start, end)
    }
}

impl TypedSampledDataSource<DMat4> for LegacyMatrixValue {
    fn typed_value(&self, shutter_offset: Time) -> DMat4 {
        if shutter_offset == 0.0 {
            return if self.instancer {
                self.delegate.instancer_transform(&self.id)
            } else {
                self.delegate.transform(&self.id)
            };
        }
        self.samples().resample(shutter_offset)
    }
}

// ============================================================================
// Prim data source
// ============================================================================

/// Prim-level container over a scene delegate prim.
pub struct LegacyPrimDataSource {
    delegate: DelegateHandle,
    id: Path,
    prim_type: Token,
    primvars: SnapshotCell<LegacyPrimvarsContainer>,
    ext_computation_primvars: SnapshotCell<LegacyExtComputationPrimvarsContainer>,
    instancer_topology: SnapshotCell<LegacyInstancerTopologyContainer>,
    mesh_store: Option<Arc<MeshTopologyStore>>,
    curves_store: Option<Arc<BasisCurvesTopologyStore>>,
}

impl LegacyPrimDataSource {
    /// Create a new data source for prim `id` of type `ty`.
    pub fn new(delegate: DelegateHandle, id: Path, ty: Token) -> Self {
        let mesh_store = (ty == prim_type::MESH)
            .then(|| Arc::new(MeshTopologyStore::new(delegate.clone(), id.clone())));
        let curves_store = (ty == prim_type::BASIS_CURVES)
            .then(|| Arc::new(BasisCurvesTopologyStore::new(delegate.clone(), id.clone())));
        Self {
            delegate,
            id,
            prim_type: ty,
            primvars: SnapshotCell::new(),
            ext_computation_primvars: SnapshotCell::new(),
            instancer_topology: SnapshotCell::new(),
            mesh_store,
            curves_store,
        }
    }

    #[inline]
    pub fn id(&self) -> &Path {
        &self.id
    }

    #[inline]
    pub fn prim_type(&self) -> &Token {
        &self.prim_type
    }

    #[inline]
    pub fn delegate(&self) -> &DelegateHandle {
        &self.delegate
    }

    /// Drop caches whose locators intersect `locators`.
    pub fn prim_dirtied(&self, locators: &LocatorSet) {
        if locators.intersects_locator(&tokens::PRIMVARS_LOCATOR) {
            self.primvars.invalidate();
        }
        let ext_primvars = Locator::new([ext_computation::EXT_COMPUTATION_PRIMVARS]);
        if locators.intersects_locator(&ext_primvars) {
            self.ext_computation_primvars.invalidate();
        }
        if locators.intersects_locator(&tokens::INSTANCER_TOPOLOGY_LOCATOR) {
            self.instancer_topology.invalidate();
        }
        if let Some(store) = &self.mesh_store {
            if locators.intersects_locator(&Locator::new([topology::MESH])) {
                store.invalidate();
            }
        }
        if let Some(store) = &self.curves_store {
            if locators.intersects_locator(&Locator::new([topology::BASIS_CURVES])) {
                store.invalidate();
            }
        }
    }

    /// Locators of everything this data source caches.
    pub fn cached_locators(&self) -> LocatorSet {
        let mut set = LocatorSet::new();
        set.insert(tokens::PRIMVARS_LOCATOR.clone());
        set.insert(Locator::new([ext_computation::EXT_COMPUTATION_PRIMVARS]));
        set.insert(tokens::INSTANCER_TOPOLOGY_LOCATOR.clone());
        if self.mesh_store.is_some() {
            set.insert(Locator::new([topology::MESH]));
        }
        if self.curves_store.is_some() {
            set.insert(Locator::new([topology::BASIS_CURVES]));
        }
        set
    }

    fn is_light(&self) -> bool {
        tokens::is_light(&self.prim_type)
            || self
                .delegate
                .light_param_value(&self.id, &light::IS_LIGHT)
                .get_or(false)
    }

    fn is_instanceable(&self) -> bool {
        tokens::is_gprim(&self.prim_type)
            || tokens::is_light(&self.prim_type)
            || self.prim_type == prim_type::INSTANCER
    }

    fn xform(&self) -> DataSourceHandle {
        let matrix = LegacyMatrixValue::new(
            self.delegate.clone(),
            self.id.clone(),
            self.prim_type == prim_type::INSTANCER,
        );
        RetainedContainer::handle([
            (schema::MATRIX, Some(DataSourceHandle::typed::<DMat4, _>(matrix))),
            (
                schema::RESET_XFORM_STACK,
                Some(RetainedTypedSampled::handle(true)),
            ),
        ])
    }

    fn extent(&self) -> DataSourceHandle {
        let extent = self.delegate.extent(&self.id);
        RetainedContainer::handle([
            (schema::MIN, Some(RetainedTypedSampled::handle(extent.min))),
            (schema::MAX, Some(RetainedTypedSampled::handle(extent.max))),
        ])
    }

    fn categories(&self) -> Option<DataSourceHandle> {
        let categories = self.delegate.categories(&self.id);
        (!categories.is_empty()).then(|| categories_container(categories))
    }

    fn instanced_by(&self) -> Option<DataSourceHandle> {
        let instancer_id = self.delegate.instancer_id(&self.id);
        if instancer_id.is_empty() {
            return None;
        }
        Some(RetainedContainer::handle([(
            schema::PATHS,
            Some(RetainedTypedSampled::handle(Array::new(vec![instancer_id]))),
        )]))
    }

    /// Binding names are the relationship names without the `coordSys:`
    /// namespace and `:binding` suffix.
    fn coord_sys_binding(&self) -> Option<DataSourceHandle> {
        let bindings = self.delegate.coord_sys_bindings(&self.id);
        if bindings.is_empty() {
            return None;
        }
        Some(RetainedContainer::handle(bindings.into_iter().map(|path| {
            let full = path.name();
            let name = full.as_str();
            let name = name.strip_prefix(COORD_SYS_PREFIX).unwrap_or(name);
            let name = name.strip_suffix(BINDING_SUFFIX).unwrap_or(name);
            (Token::new(name), Some(RetainedTypedSampled::handle(path)))
        })))
    }

    fn material(&self) -> Option<DataSourceHandle> {
        self.delegate
            .material_resource(&self.id)
            .map(|map| material_container(&map))
    }

    fn cached<T, F>(cell: &SnapshotCell<T>, build: F) -> DataSourceHandle
    where
        T: ContainerDataSource + 'static,
        F: FnOnce() -> T,
    {
        let container: ContainerHandle = cell.get_or_build(build);
        container.into()
    }
}

impl ContainerDataSource for LegacyPrimDataSource {
    fn names(&self) -> Vec<Token> {
        let ty = &self.prim_type;
        let mut names = Vec::new();

        if *ty == prim_type::MESH {
            names.push(topology::MESH);
        } else if *ty == prim_type::BASIS_CURVES {
            names.push(topology::BASIS_CURVES);
        }

        names.push(primvars::PRIMVARS);

        if tokens::is_gprim(ty) {
            names.extend([
                ext_computation::EXT_COMPUTATION_PRIMVARS,
                schema::MATERIAL_BINDINGS,
                schema::DISPLAY_STYLE,
                schema::COORD_SYS_BINDING,
                schema::PURPOSE,
                schema::VISIBILITY,
                schema::CATEGORIES,
                schema::XFORM,
                schema::EXTENT,
            ]);
        }

        if self.is_light() || *ty == prim_type::LIGHT_FILTER {
            names.extend([
                schema::MATERIAL,
                schema::XFORM,
                light::LIGHT,
                schema::COLLECTIONS,
            ]);
        } else if *ty == prim_type::MATERIAL {
            names.push(schema::MATERIAL);
        }

        if *ty == prim_type::INSTANCER {
            names.extend([
                schema::XFORM,
                instancer::INSTANCER_TOPOLOGY,
                instancer::INSTANCE_CATEGORIES,
                schema::CATEGORIES,
            ]);
        }

        if self.is_instanceable() {
            names.push(schema::INSTANCED_BY);
        }

        if *ty == prim_type::CAMERA {
            names.extend([prim_type::CAMERA, schema::XFORM]);
        }

        match ty.as_str() {
            "renderBuffer" => names.push(render::RENDER_BUFFER),
            "renderSettings" => names.push(render::RENDER_SETTINGS),
            "integrator" => names.push(schema::INTEGRATOR),
            "sampleFilter" => names.push(schema::SAMPLE_FILTER),
            "displayFilter" => names.push(schema::DISPLAY_FILTER),
            "volume" => names.push(schema::VOLUME_FIELD_BINDING),
            "extComputation" => names.push(ext_computation::EXT_COMPUTATION),
            "coordSys" => names.push(schema::XFORM),
            "drawTarget" => names.push(schema::DRAW_TARGET),
            _ if tokens::is_volume_field(ty) => names.push(schema::VOLUME_FIELD),
            _ => {}
        }

        names.push(schema::SCENE_DELEGATE);

        let mut unique = Vec::with_capacity(names.len());
        for name in names {
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        unique
    }

    /// Dispatches on `name` alone; only topology and collections depend on
    /// the prim type. [`names`](Self::names) is not consulted.
    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let (d, id) = (&self.delegate, &self.id);
        match name.as_str() {
            "primvars" => Some(Self::cached(&self.primvars, || {
                LegacyPrimvarsContainer::new(d.clone(), id.clone())
            })),
            "extComputationPrimvars" => Some(Self::cached(&self.ext_computation_primvars, || {
                LegacyExtComputationPrimvarsContainer::new(d, id)
            })),
            "mesh" => self.mesh_store.as_ref().map(|store| {
                DataSourceHandle::container(LegacyMeshContainer::new(
                    d.clone(),
                    id.clone(),
                    store.clone(),
                ))
            }),
            "basisCurves" => self.curves_store.as_ref().map(|store| {
                DataSourceHandle::container(LegacyBasisCurvesContainer::new(store.clone()))
            }),
            "xform" => Some(self.xform()),
            "visibility" => Some(RetainedContainer::handle([(
                schema::VISIBILITY,
                Some(RetainedTypedSampled::handle(d.visible(id))),
            )])),
            "purpose" => Some(RetainedContainer::handle([(
                schema::PURPOSE,
                Some(RetainedTypedSampled::handle(d.render_tag(id))),
            )])),
            "extent" => Some(self.extent()),
            "categories" => self.categories(),
            "instancedBy" => self.instanced_by(),
            "coordSysBinding" => self.coord_sys_binding(),
            "materialBindings" => material_bindings(d.material_id(id)),
            "material" => self.material(),
            "displayStyle" => Some(DataSourceHandle::container(
                LegacyDisplayStyleContainer::new(d.clone(), id.clone()),
            )),
            "light" => Some(DataSourceHandle::container(LegacyLightContainer::new(
                d.clone(),
                id.clone(),
            ))),
            "collections" => {
                let collections = if self.is_light() {
                    LegacyLightCollections::light(d.clone(), id.clone())
                } else if self.prim_type == prim_type::LIGHT_FILTER {
                    LegacyLightCollections::filter(d.clone(), id.clone())
                } else {
                    return None;
                };
                Some(DataSourceHandle::container(collections))
            }
            "camera" => Some(DataSourceHandle::container(LegacyCameraContainer::new(
                d.clone(),
                id.clone(),
            ))),
            "renderBuffer" => Some(DataSourceHandle::container(
                LegacyRenderBufferContainer::new(d.clone(), id.clone()),
            )),
            "renderSettings" => Some(DataSourceHandle::container(
                LegacyRenderSettingsContainer::new(d.clone(), id.clone()),
            )),
            "integrator" | "sampleFilter" | "displayFilter" => render_terminal_resource(d, id),
            "instancerTopology" => Some(Self::cached(&self.instancer_topology, || {
                LegacyInstancerTopologyContainer::new(d.clone(), id.clone())
            })),
            "instanceCategories" => Some(DataSourceHandle::container(
                LegacyInstanceCategoriesContainer::new(d.clone(), id.clone()),
            )),
            "volumeField" => Some(DataSourceHandle::container(
                LegacyVolumeFieldContainer::new(d.clone(), id.clone()),
            )),
            "volumeFieldBinding" => volume_field_binding(d, id),
            "extComputation" => Some(DataSourceHandle::container(
                LegacyExtComputationContainer::new(d.clone(), id.clone()),
            )),
            "drawTarget" => Some(draw_target_container(d, id)),
            "sceneDelegate" => Some(DataSourceHandle::sampled(RetainedSampled::new(
                Value::from_any(d.clone()),
            ))),
            _ => None,
        }
    }
}

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use parking_lot::{Mutex, RwLock};
use scene_index::core::{TimeSampleArray, Value};
use scene_index::legacy::{Interpolation, MeshTopology, PrimvarDescriptor, SceneDelegate};
use scene_index::scene::{
    AddedPrimEntry, DirtiedPrimEntry, RemovedPrimEntry, SceneIndex, SceneIndexObserver,
};
use scene_index::util::{init_tracing, DMat4, Path, Token};

pub fn p(text: &str) -> Path {
    Path::parse(text).unwrap()
}

/// Install the test subscriber once per test binary.
pub fn setup() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        init_tracing();
    });
}

// ============================================================================
// MockDelegate
// ============================================================================

struct MockPrimvar {
    descriptor: PrimvarDescriptor,
    samples: TimeSampleArray<Value>,
}

/// In-memory delegate with counters on the queries tests care about.
#[derive(Default)]
pub struct MockDelegate {
    primvars: RwLock<BTreeMap<Path, Vec<MockPrimvar>>>,
    transforms: RwLock<BTreeMap<Path, TimeSampleArray<DMat4>>>,
    meshes: RwLock<BTreeMap<Path, MeshTopology>>,
    params: RwLock<BTreeMap<(Path, Token), Value>>,
    materials: RwLock<BTreeMap<Path, Path>>,
    pub descriptor_calls: AtomicUsize,
    pub topology_calls: AtomicUsize,
    pub sample_calls: AtomicUsize,
}

impl MockDelegate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Author a primvar with samples at the given shutter offsets.
    pub fn set_primvar(
        &self,
        id: &str,
        name: &str,
        interpolation: Interpolation,
        role: &str,
        samples: Vec<(f32, Value)>,
    ) {
        let primvar = MockPrimvar {
            descriptor: PrimvarDescriptor::new(name, interpolation).with_role(role),
            samples: TimeSampleArray::from_pairs(samples),
        };
        let mut primvars = self.primvars.write();
        let list = primvars.entry(p(id)).or_default();
        list.retain(|pv| pv.descriptor.name != name);
        list.push(primvar);
    }

    pub fn set_transform(&self, id: &str, samples: Vec<(f32, DMat4)>) {
        self.transforms
            .write()
            .insert(p(id), TimeSampleArray::from_pairs(samples));
    }

    pub fn set_mesh(&self, id: &str, counts: Vec<i32>, indices: Vec<i32>) {
        let topology = MeshTopology {
            scheme: Token::new("catmullClark"),
            orientation: Token::new("rightHanded"),
            face_vertex_counts: counts.into_iter().collect(),
            face_vertex_indices: indices.into_iter().collect(),
            hole_indices: Default::default(),
        };
        self.meshes.write().insert(p(id), topology);
    }

    pub fn set_param(&self, id: &str, name: &str, value: Value) {
        self.params.write().insert((p(id), Token::new(name)), value);
    }

    pub fn set_material(&self, id: &str, material: &str) {
        self.materials.write().insert(p(id), p(material));
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl SceneDelegate for MockDelegate {
    fn get(&self, id: &Path, key: &Token) -> Value {
        let primvars = self.primvars.read();
        primvars
            .get(id)
            .and_then(|list| list.iter().find(|pv| pv.descriptor.name == *key))
            .map(|pv| pv.samples.resample(0.0))
            .unwrap_or_default()
    }

    fn sample_primvar(
        &self,
        id: &Path,
        key: &Token,
        max_sample_count: usize,
    ) -> TimeSampleArray<Value> {
        self.sample_calls.fetch_add(1, Ordering::SeqCst);
        let primvars = self.primvars.read();
        let Some(samples) = primvars
            .get(id)
            .and_then(|list| list.iter().find(|pv| pv.descriptor.name == *key))
            .map(|pv| &pv.samples)
        else {
            return TimeSampleArray::new();
        };
        let n = samples.len().min(max_sample_count);
        TimeSampleArray::from_parts(
            samples.times()[..n].to_vec(),
            samples.values()[..n].to_vec(),
        )
    }

    fn primvar_descriptors(
        &self,
        id: &Path,
        interpolation: Interpolation,
    ) -> Vec<PrimvarDescriptor> {
        self.descriptor_calls.fetch_add(1, Ordering::SeqCst);
        self.primvars
            .read()
            .get(id)
            .map(|list| {
                list.iter()
                    .filter(|pv| pv.descriptor.interpolation == interpolation)
                    .map(|pv| pv.descriptor.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn mesh_topology(&self, id: &Path) -> MeshTopology {
        self.topology_calls.fetch_add(1, Ordering::SeqCst);
        self.meshes.read().get(id).cloned().unwrap_or_default()
    }

    fn transform(&self, id: &Path) -> DMat4 {
        self.transforms
            .read()
            .get(id)
            .map(|samples| samples.resample(0.0))
            .unwrap_or(DMat4::IDENTITY)
    }

    fn sample_transform(&self, id: &Path, _max_sample_count: usize) -> TimeSampleArray<DMat4> {
        match self.transforms.read().get(id) {
            Some(samples) => samples.clone(),
            None => TimeSampleArray::from_pairs([(0.0, DMat4::IDENTITY)]),
        }
    }

    fn material_id(&self, id: &Path) -> Path {
        self.materials.read().get(id).cloned().unwrap_or_default()
    }

    fn camera_param_value(&self, camera_id: &Path, param: &Token) -> Value {
        self.params
            .read()
            .get(&(camera_id.clone(), param.clone()))
            .cloned()
            .unwrap_or_default()
    }
}

// ============================================================================
// Recording observer
// ============================================================================

/// Observer recording notices as `+path`, `-path` and `~path`.
#[derive(Default)]
pub struct Log {
    events: Mutex<Vec<String>>,
    added_types: Mutex<Vec<Token>>,
    dirtied: Mutex<Vec<String>>,
}

impl Log {
    /// Create a log and register it on `index`. Keep the returned handle
    /// alive: observers are held weakly.
    pub fn attach(index: &dyn SceneIndex) -> Arc<Self> {
        let log = Arc::new(Self::default());
        let observer: Arc<dyn SceneIndexObserver> = log.clone();
        index.add_observer(&observer);
        log
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn added_types(&self) -> Vec<Token> {
        self.added_types.lock().clone()
    }

    /// Dirtied notices as `path:locator` strings.
    pub fn dirtied_locators(&self) -> Vec<String> {
        self.dirtied.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
        self.added_types.lock().clear();
        self.dirtied.lock().clear();
    }
}

impl SceneIndexObserver for Log {
    fn prims_added(&self, _sender: &dyn SceneIndex, entries: &[AddedPrimEntry]) {
        let mut events = self.events.lock();
        let mut types = self.added_types.lock();
        for entry in entries {
            events.push(format!("+{}", entry.prim_path));
            types.push(entry.prim_type.clone());
        }
    }

    fn prims_removed(&self, _sender: &dyn SceneIndex, entries: &[RemovedPrimEntry]) {
        let mut events = self.events.lock();
        events.extend(entries.iter().map(|e| format!("-{}", e.prim_path)));
    }

    fn prims_dirtied(&self, _sender: &dyn SceneIndex, entries: &[DirtiedPrimEntry]) {
        let mut events = self.events.lock();
        let mut dirtied = self.dirtied.lock();
        for entry in entries {
            events.push(format!("~{}", entry.prim_path));
            dirtied.extend(
                entry
                    .dirty_locators
                    .iter()
                    .map(|l| format!("{}:{}", entry.prim_path, l)),
            );
        }
    }
}

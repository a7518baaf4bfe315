//! Mesh and basis curves topology pulled from a [`SceneDelegate`].
//!
//! A topology store fetches the whole topology on first use and publishes
//! it as an immutable snapshot. Every per-field data source of a prim reads
//! the same store, so a dirty notice only has to invalidate one place.

use std::sync::Arc;

use crate::core::{
    ContainerDataSource, DataSourceHandle, RetainedContainer, RetainedTypedSampled,
    SampledDataSource, SnapshotCell, Time, TypedSampledDataSource, Value, ValueType,
};
use crate::legacy::{BasisCurvesTopology, DelegateHandle, MeshTopology};
use crate::scene::tokens::topology;
use crate::util::{Path, Token};

// ============================================================================
// Stores
// ============================================================================

/// Lazily fetched, invalidatable topology snapshot.
pub trait TopologyStore: Send + Sync + 'static {
    type Topology: Send + Sync + 'static;

    /// Current snapshot, fetching it from the delegate if needed.
    fn get(&self) -> Arc<Self::Topology>;

    /// Drop the snapshot; the next `get` fetches again.
    fn invalidate(&self);
}

macro_rules! define_store {
    ($(#[$meta:meta])* $name:ident, $topology:ty, $fetch:ident) => {
        $(#[$meta])*
        pub struct $name {
            delegate: DelegateHandle,
            id: Path,
            cell: SnapshotCell<$topology>,
        }

        impl $name {
            pub fn new(delegate: DelegateHandle, id: Path) -> Self {
                Self {
                    delegate,
                    id,
                    cell: SnapshotCell::new(),
                }
            }

            /// Number of delegate fetches so far.
            pub fn fetch_count(&self) -> usize {
                self.cell.build_count()
            }
        }

        impl TopologyStore for $name {
            type Topology = $topology;

            fn get(&self) -> Arc<$topology> {
                self.cell.get_or_build(|| {
                    tracing::trace!(
                        target: "scene_index::legacy",
                        id = %self.id,
                        query = stringify!($fetch),
                        "topology fetched"
                    );
                    self.delegate.$fetch(&self.id)
                })
            }

            fn invalidate(&self) {
                self.cell.invalidate();
            }
        }
    };
}

define_store!(
    /// Mesh topology store.
    MeshTopologyStore,
    MeshTopology,
    mesh_topology
);

define_store!(
    /// Basis curves topology store.
    BasisCurvesTopologyStore,
    BasisCurvesTopology,
    basis_curves_topology
);

// ============================================================================
// Field data sources
// ============================================================================

/// One field of a topology snapshot.
pub struct TopologyField<S: TopologyStore, T> {
    store: Arc<S>,
    read: fn(&S::Topology) -> T,
}

impl<S: TopologyStore, T: ValueType> TopologyField<S, T> {
    pub fn handle(store: &Arc<S>, read: fn(&S::Topology) -> T) -> DataSourceHandle {
        DataSourceHandle::typed::<T, _>(Self {
            store: store.clone(),
            read,
        })
    }
}

impl<S: TopologyStore, T: ValueType> SampledDataSource for TopologyField<S, T> {
    fn value(&self, shutter_offset: Time) -> Value {
        self.typed_value(shutter_offset).into_value()
    }

    fn contributing_sample_times(&self, _start: Time, _end: Time) -> Option<Vec<Time>> {
        None
    }
}

impl<S: TopologyStore, T: ValueType> TypedSampledDataSource<T> for TopologyField<S, T> {
    fn typed_value(&self, _shutter_offset: Time) -> T {
        (self.read)(&self.store.get())
    }
}

// ============================================================================
// Mesh
// ============================================================================

struct MeshTopologyContainer {
    store: Arc<MeshTopologyStore>,
}

impl ContainerDataSource for MeshTopologyContainer {
    fn names(&self) -> Vec<Token> {
        vec![
            topology::FACE_VERTEX_COUNTS,
            topology::FACE_VERTEX_INDICES,
            topology::HOLE_INDICES,
            topology::ORIENTATION,
        ]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let s = &self.store;
        let handle = match name.as_str() {
            "faceVertexCounts" => TopologyField::handle(s, |t: &MeshTopology| t.face_vertex_counts.clone()),
            "faceVertexIndices" => TopologyField::handle(s, |t: &MeshTopology| t.face_vertex_indices.clone()),
            "holeIndices" => TopologyField::handle(s, |t: &MeshTopology| t.hole_indices.clone()),
            "orientation" => TopologyField::handle(s, |t: &MeshTopology| t.orientation.clone()),
            _ => return None,
        };
        Some(handle)
    }
}

/// `mesh` container of a legacy mesh prim.
pub struct LegacyMeshContainer {
    delegate: DelegateHandle,
    id: Path,
    store: Arc<MeshTopologyStore>,
}

impl LegacyMeshContainer {
    pub fn new(delegate: DelegateHandle, id: Path, store: Arc<MeshTopologyStore>) -> Self {
        Self { delegate, id, store }
    }

    fn subdivision_tags(&self) -> DataSourceHandle {
        let tags = self.delegate.subdiv_tags(&self.id);
        RetainedContainer::handle([
            (
                topology::FACE_VARYING_LINEAR_INTERPOLATION,
                Some(RetainedTypedSampled::handle(tags.face_varying_interpolation_rule)),
            ),
            (
                topology::INTERPOLATE_BOUNDARY,
                Some(RetainedTypedSampled::handle(tags.vertex_interpolation_rule)),
            ),
            (
                topology::TRIANGLE_SUBDIVISION_RULE,
                Some(RetainedTypedSampled::handle(tags.triangle_subdivision)),
            ),
            (
                topology::CORNER_INDICES,
                Some(RetainedTypedSampled::handle(tags.corner_indices)),
            ),
            (
                topology::CORNER_SHARPNESSES,
                Some(RetainedTypedSampled::handle(tags.corner_weights)),
            ),
            (
                topology::CREASE_INDICES,
                Some(RetainedTypedSampled::handle(tags.crease_indices)),
            ),
            (
                topology::CREASE_LENGTHS,
                Some(RetainedTypedSampled::handle(tags.crease_lengths)),
            ),
            (
                topology::CREASE_SHARPNESSES,
                Some(RetainedTypedSampled::handle(tags.crease_weights)),
            ),
        ])
    }
}

impl ContainerDataSource for LegacyMeshContainer {
    fn names(&self) -> Vec<Token> {
        vec![
            topology::TOPOLOGY,
            topology::SUBDIVISION_SCHEME,
            topology::SUBDIVISION_TAGS,
            topology::DOUBLE_SIDED,
        ]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        match name.as_str() {
            "topology" => Some(DataSourceHandle::container(MeshTopologyContainer {
                store: self.store.clone(),
            })),
            "subdivisionScheme" => Some(TopologyField::handle(&self.store, |t: &MeshTopology| {
                t.scheme.clone()
            })),
            "subdivisionTags" => Some(self.subdivision_tags()),
            "doubleSided" => Some(RetainedTypedSampled::handle(
                self.delegate.double_sided(&self.id),
            )),
            _ => None,
        }
    }
}

// ============================================================================
// Basis curves
// ============================================================================

struct BasisCurvesTopologyContainer {
    store: Arc<BasisCurvesTopologyStore>,
}

impl ContainerDataSource for BasisCurvesTopologyContainer {
    fn names(&self) -> Vec<Token> {
        vec![
            topology::CURVE_VERTEX_COUNTS,
            topology::CURVE_INDICES,
            topology::BASIS,
            topology::TYPE,
            topology::WRAP,
        ]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let s = &self.store;
        let handle = match name.as_str() {
            "curveVertexCounts" => TopologyField::handle(s, |t: &BasisCurvesTopology| {
                t.curve_vertex_counts.clone()
            }),
            "curveIndices" => TopologyField::handle(s, |t: &BasisCurvesTopology| {
                t.curve_indices.clone()
            }),
            "basis" => TopologyField::handle(s, |t: &BasisCurvesTopology| t.basis.clone()),
            "type" => TopologyField::handle(s, |t: &BasisCurvesTopology| t.curve_type.clone()),
            "wrap" => TopologyField::handle(s, |t: &BasisCurvesTopology| t.wrap.clone()),
            _ => return None,
        };
        Some(handle)
    }
}

/// `basisCurves` container of a legacy curves prim.
pub struct LegacyBasisCurvesContainer {
    store: Arc<BasisCurvesTopologyStore>,
}

impl LegacyBasisCurvesContainer {
    pub fn new(store: Arc<BasisCurvesTopologyStore>) -> Self {
        Self { store }
    }
}

impl ContainerDataSource for LegacyBasisCurvesContainer {
    fn names(&self) -> Vec<Token> {
        vec![topology::TOPOLOGY]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        (*name == topology::TOPOLOGY).then(|| {
            DataSourceHandle::container(BasisCurvesTopologyContainer {
                store: self.store.clone(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{sampled_at, Array, ContainerHandle, Locator};
    use crate::legacy::SceneDelegate;
    use rayon::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Quad {
        calls: AtomicUsize,
    }

    impl SceneDelegate for Quad {
        fn mesh_topology(&self, _id: &Path) -> MeshTopology {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as i32;
            MeshTopology {
                scheme: Token::new("catmullClark"),
                orientation: Token::new("rightHanded"),
                face_vertex_counts: Array::new(vec![4 + n]),
                face_vertex_indices: Array::new(vec![0, 1, 2, 3]),
                hole_indices: Array::default(),
            }
        }

        fn double_sided(&self, _id: &Path) -> bool {
            true
        }
    }

    fn mesh(delegate: &Arc<Quad>) -> (Arc<MeshTopologyStore>, ContainerHandle) {
        let handle: DelegateHandle = delegate.clone();
        let id = Path::parse("/quad").unwrap();
        let store = Arc::new(MeshTopologyStore::new(handle.clone(), id.clone()));
        let container: ContainerHandle =
            Arc::new(LegacyMeshContainer::new(handle, id, store.clone()));
        (store, container)
    }

    #[test]
    fn test_fields_share_one_fetch() {
        let delegate = Arc::new(Quad::default());
        let (store, container) = mesh(&delegate);

        let counts = Locator::from_static(&["topology", "faceVertexCounts"]);
        let indices = Locator::from_static(&["topology", "faceVertexIndices"]);
        let c = sampled_at(&container, &counts).unwrap();
        let i = sampled_at(&container, &indices).unwrap();
        assert_eq!(&c.typed_value::<Array<i32>>(0.0)[..], &[4]);
        assert_eq!(i.typed_value::<Array<i32>>(0.0).len(), 4);
        let scheme = sampled_at(&container, &Locator::from_static(&["subdivisionScheme"])).unwrap();
        assert_eq!(scheme.typed_value::<Token>(0.0), "catmullClark");
        assert_eq!(store.fetch_count(), 1);
        assert!(c.contributing_sample_times(-1.0, 1.0).is_none());

        let double_sided = sampled_at(&container, &Locator::from_static(&["doubleSided"])).unwrap();
        assert!(double_sided.typed_value::<bool>(0.0));
    }

    #[test]
    fn test_invalidate_refetches() {
        let delegate = Arc::new(Quad::default());
        let (store, container) = mesh(&delegate);
        let counts = Locator::from_static(&["topology", "faceVertexCounts"]);
        let c = sampled_at(&container, &counts).unwrap();
        assert_eq!(&c.typed_value::<Array<i32>>(0.0)[..], &[4]);

        store.invalidate();
        assert_eq!(&c.typed_value::<Array<i32>>(0.0)[..], &[5]);
        assert_eq!(store.fetch_count(), 2);
    }

    #[test]
    fn test_concurrent_reads_see_whole_snapshots() {
        let delegate = Arc::new(Quad::default());
        let (store, _) = mesh(&delegate);
        (0..64).into_par_iter().for_each(|i| {
            if i % 16 == 0 {
                store.invalidate();
            }
            let topo = store.get();
            assert_eq!(topo.face_vertex_indices.len(), 4);
            assert!(topo.face_vertex_counts[0] >= 4);
        });
    }
}

//! Legacy layer - scene delegate emulation.
//!
//! This module provides:
//! - [`SceneDelegate`] - The pull interface of prim-by-prim scene delegates
//! - [`LegacyPrimDataSource`] - A delegate prim exposed as a container
//! - [`LegacyPrimSceneIndex`] - A retained scene index of delegate prims
//! - Primvar, transform, topology and per-schema containers backing them

use std::sync::Arc;

mod camera;
mod delegate;
mod ext_computation;
mod instancer;
mod light;
mod material;
mod params;
mod prim;
mod primvar;
mod render;
mod scene_index;
mod topology;

pub use camera::LegacyCameraContainer;
pub use delegate::{
    BasisCurvesTopology, CullStyle, DisplayStyle, ExtComputationInputDescriptor,
    ExtComputationOutputDescriptor, ExtComputationPrimvarDescriptor, Interpolation,
    MaterialNetwork, MaterialNetworkMap, MaterialNode, MaterialRelationship, MeshTopology,
    PrimvarDescriptor, RenderBufferDescriptor, RenderProduct, RenderProducts, RenderVar,
    SceneDelegate, SubdivTags, VolumeFieldDescriptor, ALL_SAMPLES,
};
pub use ext_computation::LegacyExtComputationContainer;
pub use instancer::{LegacyInstanceCategoriesContainer, LegacyInstancerTopologyContainer};
pub use light::{LegacyLightCollections, LegacyLightContainer};
pub use material::{material_bindings, material_container, node_container};
pub use params::{LegacyDisplayStyleContainer, LegacyGetContainer, LegacyVolumeFieldContainer};
pub use prim::{LegacyMatrixValue, LegacyPrimDataSource};
pub use primvar::{
    LegacyExtComputationInput, LegacyExtComputationPrimvarsContainer, LegacyIndexedPrimvarValue,
    LegacyPrimvarIndices, LegacyPrimvarValue, LegacyPrimvarsContainer,
};
pub use render::{LegacyRenderBufferContainer, LegacyRenderSettingsContainer};
pub use scene_index::LegacyPrimSceneIndex;
pub use topology::{
    BasisCurvesTopologyStore, LegacyBasisCurvesContainer, LegacyMeshContainer,
    MeshTopologyStore, TopologyStore,
};

/// Shared handle to a scene delegate.
pub type DelegateHandle = Arc<dyn SceneDelegate>;

//! Pull-based legacy scene delegate interface.
//!
//! A [`SceneDelegate`] answers per-prim queries by id, key and time. Every
//! method has a default that reports "nothing authored", so implementors
//! only override what their scene provides. The descriptor structs below
//! are the plain records the delegate hands back.

use std::collections::BTreeMap;

use crate::core::{Array, Dictionary, IndexedTimeSampleArray, Time, TimeSampleArray, Value};
use crate::scene::tokens::interpolation;
use crate::util::{BBox3d, DMat4, IVec2, IVec3, Path, Token, Vec2, Vec4};

/// Request every authored sample from a `sample_*` method.
pub const ALL_SAMPLES: usize = usize::MAX;

// ============================================================================
// Descriptors
// ============================================================================

/// Primvar interpolation mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Interpolation {
    Constant,
    Uniform,
    Varying,
    Vertex,
    FaceVarying,
    Instance,
}

impl Interpolation {
    /// All modes, in query order.
    pub const ALL: [Interpolation; 6] = [
        Self::Constant,
        Self::Uniform,
        Self::Varying,
        Self::Vertex,
        Self::FaceVarying,
        Self::Instance,
    ];

    pub fn as_token(self) -> Token {
        match self {
            Self::Constant => interpolation::CONSTANT,
            Self::Uniform => interpolation::UNIFORM,
            Self::Varying => interpolation::VARYING,
            Self::Vertex => interpolation::VERTEX,
            Self::FaceVarying => interpolation::FACE_VARYING,
            Self::Instance => interpolation::INSTANCE,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PrimvarDescriptor {
    pub name: Token,
    pub interpolation: Interpolation,
    pub role: Token,
    pub indexed: bool,
}

impl PrimvarDescriptor {
    pub fn new(name: impl Into<Token>, interpolation: Interpolation) -> Self {
        Self {
            name: name.into(),
            interpolation,
            role: Token::EMPTY,
            indexed: false,
        }
    }

    pub fn with_role(mut self, role: impl Into<Token>) -> Self {
        self.role = role.into();
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }
}

/// Primvar computed by an ext computation.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtComputationPrimvarDescriptor {
    pub name: Token,
    pub interpolation: Interpolation,
    pub role: Token,
    pub source_computation_id: Path,
    pub source_computation_output_name: Token,
    pub value_type: Token,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtComputationInputDescriptor {
    pub name: Token,
    pub source_computation_id: Path,
    pub source_computation_output_name: Token,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExtComputationOutputDescriptor {
    pub name: Token,
    pub value_type: Token,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshTopology {
    pub scheme: Token,
    pub orientation: Token,
    pub face_vertex_counts: Array<i32>,
    pub face_vertex_indices: Array<i32>,
    pub hole_indices: Array<i32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubdivTags {
    pub face_varying_interpolation_rule: Token,
    pub vertex_interpolation_rule: Token,
    pub triangle_subdivision: Token,
    pub corner_indices: Array<i32>,
    pub corner_weights: Array<f32>,
    pub crease_indices: Array<i32>,
    pub crease_lengths: Array<i32>,
    pub crease_weights: Array<f32>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BasisCurvesTopology {
    pub curve_type: Token,
    pub basis: Token,
    pub wrap: Token,
    pub curve_vertex_counts: Array<i32>,
    pub curve_indices: Array<i32>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VolumeFieldDescriptor {
    pub field_name: Token,
    pub field_prim_type: Token,
    pub field_id: Path,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderBufferDescriptor {
    pub dimensions: IVec3,
    pub format: Token,
    pub multi_sampled: bool,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayStyle {
    pub refine_level: i32,
    pub flat_shading_enabled: bool,
    pub displacement_enabled: bool,
    pub display_in_overlay: bool,
    pub occluded_selection_shows_through: bool,
    pub points_shading_enabled: bool,
    pub material_is_final: bool,
}

/// Face culling preference.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CullStyle {
    #[default]
    DontCare,
    Nothing,
    Back,
    Front,
    BackUnlessDoubleSided,
    FrontUnlessDoubleSided,
}

impl CullStyle {
    /// Token name, `None` for [`CullStyle::DontCare`].
    pub fn as_token(self) -> Option<Token> {
        let name = match self {
            Self::DontCare => return None,
            Self::Nothing => "nothing",
            Self::Back => "back",
            Self::Front => "front",
            Self::BackUnlessDoubleSided => "backUnlessDoubleSided",
            Self::FrontUnlessDoubleSided => "frontUnlessDoubleSided",
        };
        Some(Token::from_static(name))
    }
}

/// One output of a render settings prim.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderProduct {
    pub product_path: Path,
    pub product_type: Token,
    pub name: Token,
    pub resolution: IVec2,
    pub render_vars: Vec<RenderVar>,
    pub camera_path: Path,
    pub pixel_aspect_ratio: f32,
    pub aspect_ratio_conform_policy: Token,
    pub aperture_size: Vec2,
    /// `(min.x, min.y, max.x, max.y)`
    pub data_window_ndc: Vec4,
    pub disable_motion_blur: bool,
    pub disable_depth_of_field: bool,
    pub namespaced_settings: Dictionary,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderVar {
    pub var_path: Path,
    pub data_type: Token,
    pub source_name: String,
    pub source_type: Token,
    pub namespaced_settings: Dictionary,
}

/// Render products as published through [`SceneDelegate::get`].
pub type RenderProducts = Vec<RenderProduct>;

/// Shading node of a material network.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialNode {
    pub path: Path,
    pub identifier: Token,
    pub parameters: BTreeMap<Token, Value>,
}

/// Connection from an upstream output to a downstream input.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterialRelationship {
    pub input_id: Path,
    pub input_name: Token,
    pub output_id: Path,
    pub output_name: Token,
}

/// Nodes of one terminal, in dependency order (terminal node last).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialNetwork {
    pub nodes: Vec<MaterialNode>,
    pub relationships: Vec<MaterialRelationship>,
    pub primvars: Vec<Token>,
}

/// Networks keyed by terminal name (`surface`, `displacement`, ...).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialNetworkMap {
    pub map: BTreeMap<Token, MaterialNetwork>,
    pub terminals: Vec<Path>,
}

// ============================================================================
// SceneDelegate
// ============================================================================

/// Pull interface of a legacy scene. All queries are keyed by prim id.
///
/// `sample_*` methods return at most `max_sample_count` samples; pass
/// [`ALL_SAMPLES`] for every authored sample. Their defaults return the
/// untimed value as a single sample at offset 0.
#[allow(unused_variables)]
pub trait SceneDelegate: Send + Sync {
    // ------------------------------------------------------------------
    // Generic values and primvars
    // ------------------------------------------------------------------

    fn get(&self, id: &Path, key: &Token) -> Value {
        Value::Empty
    }

    /// Value and indices of an indexed primvar.
    fn get_indexed_primvar(&self, id: &Path, key: &Token) -> (Value, Array<i32>) {
        (Value::Empty, Array::default())
    }

    fn sample_primvar(
        &self,
        id: &Path,
        key: &Token,
        max_sample_count: usize,
    ) -> TimeSampleArray<Value> {
        single_sample(self.get(id, key), max_sample_count)
    }

    fn sample_indexed_primvar(
        &self,
        id: &Path,
        key: &Token,
        max_sample_count: usize,
    ) -> IndexedTimeSampleArray<Value> {
        let (value, indices) = self.get_indexed_primvar(id, key);
        if value.is_empty() || max_sample_count == 0 {
            return IndexedTimeSampleArray::default();
        }
        IndexedTimeSampleArray::from_parts(vec![0.0], vec![value], vec![indices])
    }

    fn primvar_descriptors(&self, id: &Path, interpolation: Interpolation) -> Vec<PrimvarDescriptor> {
        Vec::new()
    }

    fn ext_computation_primvar_descriptors(
        &self,
        id: &Path,
        interpolation: Interpolation,
    ) -> Vec<ExtComputationPrimvarDescriptor> {
        Vec::new()
    }

    // ------------------------------------------------------------------
    // Topology
    // ------------------------------------------------------------------

    fn mesh_topology(&self, id: &Path) -> MeshTopology {
        MeshTopology::default()
    }

    fn basis_curves_topology(&self, id: &Path) -> BasisCurvesTopology {
        BasisCurvesTopology::default()
    }

    fn subdiv_tags(&self, id: &Path) -> SubdivTags {
        SubdivTags::default()
    }

    fn double_sided(&self, id: &Path) -> bool {
        false
    }

    // ------------------------------------------------------------------
    // Transforms
    // ------------------------------------------------------------------

    fn transform(&self, id: &Path) -> DMat4 {
        DMat4::IDENTITY
    }

    fn sample_transform(&self, id: &Path, max_sample_count: usize) -> TimeSampleArray<DMat4> {
        single_sample(self.transform(id), max_sample_count)
    }

    fn instancer_transform(&self, instancer_id: &Path) -> DMat4 {
        DMat4::IDENTITY
    }

    fn sample_instancer_transform(
        &self,
        instancer_id: &Path,
        max_sample_count: usize,
    ) -> TimeSampleArray<DMat4> {
        single_sample(self.instancer_transform(instancer_id), max_sample_count)
    }

    // ------------------------------------------------------------------
    // Ext computations
    // ------------------------------------------------------------------

    fn ext_computation_scene_input_names(&self, computation_id: &Path) -> Vec<Token> {
        Vec::new()
    }

    fn ext_computation_input_descriptors(
        &self,
        computation_id: &Path,
    ) -> Vec<ExtComputationInputDescriptor> {
        Vec::new()
    }

    fn ext_computation_output_descriptors(
        &self,
        computation_id: &Path,
    ) -> Vec<ExtComputationOutputDescriptor> {
        Vec::new()
    }

    fn ext_computation_input(&self, computation_id: &Path, input: &Token) -> Value {
        Value::Empty
    }

    fn sample_ext_computation_input(
        &self,
        computation_id: &Path,
        input: &Token,
        max_sample_count: usize,
    ) -> TimeSampleArray<Value> {
        single_sample(self.ext_computation_input(computation_id, input), max_sample_count)
    }

    fn ext_computation_kernel(&self, computation_id: &Path) -> String {
        String::new()
    }

    // ------------------------------------------------------------------
    // Cameras and lights
    // ------------------------------------------------------------------

    fn camera_param_value(&self, camera_id: &Path, param: &Token) -> Value {
        Value::Empty
    }

    fn light_param_value(&self, light_id: &Path, param: &Token) -> Value {
        Value::Empty
    }

    // ------------------------------------------------------------------
    // Prim state
    // ------------------------------------------------------------------

    fn visible(&self, id: &Path) -> bool {
        true
    }

    fn render_tag(&self, id: &Path) -> Token {
        Token::from_static("geometry")
    }

    fn extent(&self, id: &Path) -> BBox3d {
        BBox3d::EMPTY
    }

    fn categories(&self, id: &Path) -> Vec<Token> {
        Vec::new()
    }

    fn coord_sys_bindings(&self, id: &Path) -> Vec<Path> {
        Vec::new()
    }

    fn display_style(&self, id: &Path) -> DisplayStyle {
        DisplayStyle::default()
    }

    fn shading_style(&self, id: &Path) -> Token {
        Token::EMPTY
    }

    fn repr_selector(&self, id: &Path) -> Vec<Token> {
        Vec::new()
    }

    fn cull_style(&self, id: &Path) -> CullStyle {
        CullStyle::DontCare
    }

    // ------------------------------------------------------------------
    // Instancing
    // ------------------------------------------------------------------

    fn instancer_id(&self, id: &Path) -> Path {
        Path::empty()
    }

    fn instancer_prototypes(&self, instancer_id: &Path) -> Vec<Path> {
        Vec::new()
    }

    fn instance_indices(&self, instancer_id: &Path, prototype_id: &Path) -> Array<i32> {
        Array::default()
    }

    fn instance_categories(&self, instancer_id: &Path) -> Vec<Vec<Token>> {
        Vec::new()
    }

    // ------------------------------------------------------------------
    // Materials, volumes, render resources
    // ------------------------------------------------------------------

    fn material_id(&self, id: &Path) -> Path {
        Path::empty()
    }

    fn material_resource(&self, material_id: &Path) -> Option<MaterialNetworkMap> {
        None
    }

    fn volume_field_descriptors(&self, volume_id: &Path) -> Vec<VolumeFieldDescriptor> {
        Vec::new()
    }

    fn render_buffer_descriptor(&self, id: &Path) -> RenderBufferDescriptor {
        RenderBufferDescriptor::default()
    }
}

fn single_sample<T>(value: T, max_sample_count: usize) -> TimeSampleArray<T>
where
    T: Default + crate::core::Interpolate,
{
    if max_sample_count == 0 {
        return TimeSampleArray::new();
    }
    TimeSampleArray::from_parts(vec![0.0 as Time], vec![value])
}

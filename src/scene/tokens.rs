//! Well-known names: prim types, schema members and their locators.

use std::sync::LazyLock;

use crate::core::Locator;
use crate::util::Token;

macro_rules! define_tokens {
    ($(#[$meta:meta])* $module:ident { $($name:ident = $text:literal),* $(,)? }) => {
        $(#[$meta])*
        pub mod $module {
            use crate::util::Token;
            $(pub const $name: Token = Token::from_static($text);)*
        }
    };
}

define_tokens! {
    /// Prim type names.
    prim_type {
        MESH = "mesh",
        BASIS_CURVES = "basisCurves",
        NURBS_CURVES = "nurbsCurves",
        NURBS_PATCH = "nurbsPatch",
        TET_MESH = "tetMesh",
        POINTS = "points",
        VOLUME = "volume",
        INSTANCER = "instancer",
        CAMERA = "camera",
        MATERIAL = "material",
        COORD_SYS = "coordSys",
        DRAW_TARGET = "drawTarget",
        EXT_COMPUTATION = "extComputation",
        RENDER_BUFFER = "renderBuffer",
        RENDER_SETTINGS = "renderSettings",
        INTEGRATOR = "integrator",
        SAMPLE_FILTER = "sampleFilter",
        DISPLAY_FILTER = "displayFilter",
        OPENVDB_ASSET = "openvdbAsset",
        FIELD3D_ASSET = "field3dAsset",
        LIGHT_FILTER = "lightFilter",
        LIGHT = "light",
        SIMPLE_LIGHT = "simpleLight",
        CYLINDER_LIGHT = "cylinderLight",
        DISK_LIGHT = "diskLight",
        DISTANT_LIGHT = "distantLight",
        DOME_LIGHT = "domeLight",
        MESH_LIGHT = "meshLight",
        PORTAL_LIGHT = "portalLight",
        RECT_LIGHT = "rectLight",
        SPHERE_LIGHT = "sphereLight",
        PLUGIN_LIGHT = "pluginLight",
    }
}

/// Check if `ty` is a renderable geometry type.
pub fn is_gprim(ty: &Token) -> bool {
    [
        prim_type::MESH,
        prim_type::BASIS_CURVES,
        prim_type::NURBS_CURVES,
        prim_type::NURBS_PATCH,
        prim_type::TET_MESH,
        prim_type::POINTS,
        prim_type::VOLUME,
    ]
    .contains(ty)
}

/// Check if `ty` is a light type.
pub fn is_light(ty: &Token) -> bool {
    [
        prim_type::LIGHT,
        prim_type::SIMPLE_LIGHT,
        prim_type::CYLINDER_LIGHT,
        prim_type::DISK_LIGHT,
        prim_type::DISTANT_LIGHT,
        prim_type::DOME_LIGHT,
        prim_type::MESH_LIGHT,
        prim_type::PORTAL_LIGHT,
        prim_type::RECT_LIGHT,
        prim_type::SPHERE_LIGHT,
        prim_type::PLUGIN_LIGHT,
    ]
    .contains(ty)
}

/// Check if `ty` is a volume field asset.
pub fn is_volume_field(ty: &Token) -> bool {
    *ty == prim_type::OPENVDB_ASSET || *ty == prim_type::FIELD3D_ASSET
}

define_tokens! {
    /// Primvar schema members and common primvar names.
    primvars {
        PRIMVARS = "primvars",
        PRIMVAR_VALUE = "primvarValue",
        INDEXED_PRIMVAR_VALUE = "indexedPrimvarValue",
        INDICES = "indices",
        INTERPOLATION = "interpolation",
        ROLE = "role",
        POINTS = "points",
        NORMALS = "normals",
        WIDTHS = "widths",
        VELOCITIES = "velocities",
        ACCELERATIONS = "accelerations",
        ANGULAR_VELOCITIES = "angularVelocities",
        NONLINEAR_SAMPLE_COUNT = "nonlinearSampleCount",
        INSTANCE_TRANSLATIONS = "instanceTranslations",
        INSTANCE_ROTATIONS = "instanceRotations",
        INSTANCE_SCALES = "instanceScales",
        INSTANCE_TRANSFORMS = "instanceTransforms",
    }
}

define_tokens! {
    /// Primvar interpolation modes.
    interpolation {
        CONSTANT = "constant",
        UNIFORM = "uniform",
        VARYING = "varying",
        VERTEX = "vertex",
        FACE_VARYING = "faceVarying",
        INSTANCE = "instance",
    }
}

define_tokens! {
    /// Mesh and basis curves schema members.
    topology {
        MESH = "mesh",
        BASIS_CURVES = "basisCurves",
        TOPOLOGY = "topology",
        FACE_VERTEX_COUNTS = "faceVertexCounts",
        FACE_VERTEX_INDICES = "faceVertexIndices",
        HOLE_INDICES = "holeIndices",
        ORIENTATION = "orientation",
        SUBDIVISION_SCHEME = "subdivisionScheme",
        SUBDIVISION_TAGS = "subdivisionTags",
        DOUBLE_SIDED = "doubleSided",
        CURVE_VERTEX_COUNTS = "curveVertexCounts",
        CURVE_INDICES = "curveIndices",
        BASIS = "basis",
        TYPE = "type",
        WRAP = "wrap",
        FACE_VARYING_LINEAR_INTERPOLATION = "faceVaryingLinearInterpolation",
        INTERPOLATE_BOUNDARY = "interpolateBoundary",
        TRIANGLE_SUBDIVISION_RULE = "triangleSubdivisionRule",
        CORNER_INDICES = "cornerIndices",
        CORNER_SHARPNESSES = "cornerSharpnesses",
        CREASE_INDICES = "creaseIndices",
        CREASE_LENGTHS = "creaseLengths",
        CREASE_SHARPNESSES = "creaseSharpnesses",
    }
}

define_tokens! {
    /// Prim-level schema names and their members.
    schema {
        XFORM = "xform",
        MATRIX = "matrix",
        RESET_XFORM_STACK = "resetXformStack",
        VISIBILITY = "visibility",
        PURPOSE = "purpose",
        EXTENT = "extent",
        MIN = "min",
        MAX = "max",
        CATEGORIES = "categories",
        INCLUDED_CATEGORY_NAMES = "includedCategoryNames",
        INSTANCED_BY = "instancedBy",
        PATHS = "paths",
        PROTOTYPE_ROOTS = "prototypeRoots",
        COORD_SYS_BINDING = "coordSysBinding",
        MATERIAL_BINDINGS = "materialBindings",
        MATERIAL_BINDING_PATH = "path",
        ALL_PURPOSE = "",
        MATERIAL = "material",
        DISPLAY_STYLE = "displayStyle",
        REFINE_LEVEL = "refineLevel",
        FLAT_SHADING_ENABLED = "flatShadingEnabled",
        DISPLACEMENT_ENABLED = "displacementEnabled",
        OCCLUDED_SELECTION_SHOWS_THROUGH = "occludedSelectionShowsThrough",
        POINTS_SHADING_ENABLED = "pointsShadingEnabled",
        MATERIAL_IS_FINAL = "materialIsFinal",
        SHADING_STYLE = "shadingStyle",
        REPR_SELECTOR = "reprSelector",
        CULL_STYLE = "cullStyle",
        VOLUME_FIELD_BINDING = "volumeFieldBinding",
        VOLUME_FIELD = "volumeField",
        FILE_PATH = "filePath",
        FIELD_NAME = "fieldName",
        FIELD_INDEX = "fieldIndex",
        FIELD_DATA_TYPE = "fieldDataType",
        VECTOR_DATA_ROLE_HINT = "vectorDataRoleHint",
        SCENE_DELEGATE = "sceneDelegate",
        COLLECTIONS = "collections",
        MEMBERSHIP_EXPRESSION = "membershipExpression",
        DRAW_TARGET = "drawTarget",
        RESOURCE = "resource",
        CAMERA = "camera",
        COLLECTION = "collection",
        DRAW_TARGET_SET = "drawTargetSet",
        ENABLE = "enable",
        RESOLUTION = "resolution",
        AOV_BINDINGS = "aovBindings",
        DEPTH_PRIORITY = "depthPriority",
        INTEGRATOR = "integrator",
        SAMPLE_FILTER = "sampleFilter",
        DISPLAY_FILTER = "displayFilter",
    }
}

define_tokens! {
    /// Material network schema members.
    material {
        NODES = "nodes",
        TERMINALS = "terminals",
        NODE_IDENTIFIER = "nodeIdentifier",
        PARAMETERS = "parameters",
        VALUE = "value",
        INPUT_CONNECTIONS = "inputConnections",
        UPSTREAM_NODE_PATH = "upstreamNodePath",
        UPSTREAM_NODE_OUTPUT_NAME = "upstreamNodeOutputName",
        UNIVERSAL_RENDER_CONTEXT = "",
    }
}

define_tokens! {
    /// Camera schema members.
    camera {
        CAMERA = "camera",
        PROJECTION = "projection",
        PERSPECTIVE = "perspective",
        ORTHOGRAPHIC = "orthographic",
        HORIZONTAL_APERTURE = "horizontalAperture",
        VERTICAL_APERTURE = "verticalAperture",
        HORIZONTAL_APERTURE_OFFSET = "horizontalApertureOffset",
        VERTICAL_APERTURE_OFFSET = "verticalApertureOffset",
        FOCAL_LENGTH = "focalLength",
        CLIPPING_RANGE = "clippingRange",
        CLIPPING_PLANES = "clippingPlanes",
        F_STOP = "fStop",
        FOCUS_DISTANCE = "focusDistance",
        SHUTTER_OPEN = "shutterOpen",
        SHUTTER_CLOSE = "shutterClose",
        EXPOSURE = "exposure",
        FOCUS_ON = "focusOn",
        DOF_ASPECT = "dofAspect",
        SPLIT_DIOPTER = "splitDiopter",
        COUNT = "count",
        ANGLE = "angle",
        OFFSET1 = "offset1",
        WIDTH1 = "width1",
        FOCUS_DISTANCE1 = "focusDistance1",
        OFFSET2 = "offset2",
        WIDTH2 = "width2",
        FOCUS_DISTANCE2 = "focusDistance2",
        LENS_DISTORTION = "lensDistortion",
        TYPE = "type",
        K1 = "k1",
        K2 = "k2",
        CENTER = "center",
        ANA_SQ = "anaSq",
        ASYM = "asym",
        SCALE = "scale",
        IOR = "ior",
    }
}

define_tokens! {
    /// Light schema members.
    light {
        LIGHT = "light",
        PARAMS = "params",
        SHADOW_PARAMS = "shadowParams",
        SHADOW_COLLECTION = "shadowCollection",
        LIGHT_LINK = "lightLink",
        SHADOW_LINK = "shadowLink",
        FILTER_LINK = "filterLink",
        LIGHT_FILTER_LINK = "lightFilterLink",
        IS_LIGHT = "isLight",
        MATERIAL_SYNC_MODE = "materialSyncMode",
        FILTERS = "filters",
        PORTALS = "portals",
        LIGHT_LINK_MEMBERSHIP = "collection:lightLink:membershipExpression",
        SHADOW_LINK_MEMBERSHIP = "collection:shadowLink:membershipExpression",
        FILTER_LINK_MEMBERSHIP = "collection:filterLink:membershipExpression",
    }
}

define_tokens! {
    /// Render buffer and render settings schema members.
    render {
        RENDER_BUFFER = "renderBuffer",
        DIMENSIONS = "dimensions",
        FORMAT = "format",
        MULTI_SAMPLED = "multiSampled",
        RENDER_SETTINGS = "renderSettings",
        NAMESPACED_SETTINGS = "namespacedSettings",
        RENDER_PRODUCTS = "renderProducts",
        INCLUDED_PURPOSES = "includedPurposes",
        MATERIAL_BINDING_PURPOSES = "materialBindingPurposes",
        RENDERING_COLOR_SPACE = "renderingColorSpace",
        ACTIVE = "active",
        SHUTTER_INTERVAL = "shutterInterval",
        FRAME_NUMBER = "frameNumber",
        PATH = "path",
        TYPE = "type",
        NAME = "name",
        RESOLUTION = "resolution",
        RENDER_VARS = "renderVars",
        CAMERA_PRIM = "cameraPrim",
        PIXEL_ASPECT_RATIO = "pixelAspectRatio",
        ASPECT_RATIO_CONFORM_POLICY = "aspectRatioConformPolicy",
        APERTURE_SIZE = "apertureSize",
        DATA_WINDOW_NDC = "dataWindowNDC",
        DISABLE_MOTION_BLUR = "disableMotionBlur",
        DISABLE_DEPTH_OF_FIELD = "disableDepthOfField",
        DATA_TYPE = "dataType",
        SOURCE_NAME = "sourceName",
        SOURCE_TYPE = "sourceType",
    }
}

define_tokens! {
    /// Instancer schema members.
    instancer {
        INSTANCER_TOPOLOGY = "instancerTopology",
        PROTOTYPES = "prototypes",
        INSTANCE_INDICES = "instanceIndices",
        MASK = "mask",
        INSTANCE_LOCATIONS = "instanceLocations",
        INSTANCE_CATEGORIES = "instanceCategories",
        CATEGORIES_VALUES = "categoriesValues",
        IS_LEGACY_INSTANCER = "isLegacyInstancer",
    }
}

define_tokens! {
    /// Ext computation schema members.
    ext_computation {
        EXT_COMPUTATION = "extComputation",
        EXT_COMPUTATION_PRIMVARS = "extComputationPrimvars",
        INPUT_VALUES = "inputValues",
        INPUT_COMPUTATIONS = "inputComputations",
        OUTPUTS = "outputs",
        GLSL_KERNEL = "glslKernel",
        CPU_CALLBACK = "cpuCallback",
        DISPATCH_COUNT = "dispatchCount",
        ELEMENT_COUNT = "elementCount",
        SOURCE_COMPUTATION = "sourceComputation",
        SOURCE_COMPUTATION_OUTPUT_NAME = "sourceComputationOutputName",
        VALUE_TYPE = "valueType",
    }
}

define_tokens! {
    /// Scene globals schema members.
    scene_globals {
        SCENE_GLOBALS = "sceneGlobals",
        ACTIVE_RENDER_PASS_PRIM = "activeRenderPassPrim",
        ACTIVE_RENDER_SETTINGS_PRIM = "activeRenderSettingsPrim",
        PRIMARY_CAMERA_PRIM = "primaryCameraPrim",
        CURRENT_FRAME = "currentFrame",
        TIME_CODES_PER_SECOND = "timeCodesPerSecond",
        SCENE_STATE_ID = "sceneStateId",
    }
}

define_tokens! {
    /// Dependencies schema members.
    dependencies {
        DEPENDENCIES = "__dependencies",
        DEPENDED_ON_PRIM_PATH = "dependedOnPrimPath",
        DEPENDED_ON_DATA_SOURCE_LOCATOR = "dependedOnDataSourceLocator",
        AFFECTED_DATA_SOURCE_LOCATOR = "affectedDataSourceLocator",
    }
}

define_tokens! {
    /// Velocity motion resolution settings.
    velocity_motion {
        VELOCITY_MOTION_MODE = "velocityMotionMode",
        ENABLE = "enable",
        DISABLE = "disable",
        NO_ACCELERATION = "noAcceleration",
        IGNORE = "ignore",
    }
}

define_tokens! {
    /// Input-argument names of the pruning filters.
    pruning {
        PRIM_TYPES = "primTypes",
        BINDING_TOKEN = "bindingToken",
        DO_NOT_PRUNE_NON_PRIM_PATHS = "doNotPruneNonPrimPaths",
        EXCLUDE_PATH_PREFIXES = "excludePathPrefixes",
    }
}

// ============================================================================
// Locators
// ============================================================================

/// `primvars`
pub static PRIMVARS_LOCATOR: LazyLock<Locator> =
    LazyLock::new(|| Locator::new([primvars::PRIMVARS]));

/// `primvars.points`
pub static POINTS_LOCATOR: LazyLock<Locator> =
    LazyLock::new(|| Locator::new([primvars::PRIMVARS, primvars::POINTS]));

/// `xform`
pub static XFORM_LOCATOR: LazyLock<Locator> = LazyLock::new(|| Locator::new([schema::XFORM]));

/// `mesh.topology`
pub static MESH_TOPOLOGY_LOCATOR: LazyLock<Locator> =
    LazyLock::new(|| Locator::new([topology::MESH, topology::TOPOLOGY]));

/// `basisCurves.topology`
pub static BASIS_CURVES_TOPOLOGY_LOCATOR: LazyLock<Locator> =
    LazyLock::new(|| Locator::new([topology::BASIS_CURVES, topology::TOPOLOGY]));

/// `instancerTopology`
pub static INSTANCER_TOPOLOGY_LOCATOR: LazyLock<Locator> =
    LazyLock::new(|| Locator::new([instancer::INSTANCER_TOPOLOGY]));

/// `sceneGlobals`
pub static SCENE_GLOBALS_LOCATOR: LazyLock<Locator> =
    LazyLock::new(|| Locator::new([scene_globals::SCENE_GLOBALS]));

/// `__dependencies`
pub static DEPENDENCIES_LOCATOR: LazyLock<Locator> =
    LazyLock::new(|| Locator::new([dependencies::DEPENDENCIES]));

/// `sceneGlobals.<member>`
pub fn scene_globals_locator(member: &Token) -> Locator {
    SCENE_GLOBALS_LOCATOR.append(member)
}

/// `primvars.<name>`
pub fn primvar_locator(name: &Token) -> Locator {
    PRIMVARS_LOCATOR.append(name)
}

/// `primvars.<name>.primvarValue`
pub fn primvar_value_locator(name: &Token) -> Locator {
    Locator::new([primvars::PRIMVARS, name.clone(), primvars::PRIMVAR_VALUE])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prim_type_classes() {
        assert!(is_gprim(&prim_type::MESH));
        assert!(!is_gprim(&prim_type::CAMERA));
        assert!(is_light(&prim_type::DOME_LIGHT));
        assert!(is_volume_field(&Token::new("openvdbAsset")));
    }

    #[test]
    fn test_locators() {
        assert_eq!(POINTS_LOCATOR.to_string(), "primvars.points");
        assert_eq!(
            primvar_value_locator(&primvars::VELOCITIES).to_string(),
            "primvars.velocities.primvarValue"
        );
        assert_eq!(
            scene_globals_locator(&scene_globals::CURRENT_FRAME).to_string(),
            "sceneGlobals.currentFrame"
        );
    }
}

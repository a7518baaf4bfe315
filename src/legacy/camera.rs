//! `camera` container of a legacy camera prim.

use crate::core::{Array, ContainerDataSource, DataSourceHandle, Value, ValueType};
use crate::legacy::params::{LazySampled, LazyTypedSampled};
use crate::legacy::DelegateHandle;
use crate::scene::tokens::camera;
use crate::util::{DVec4, Path, Range1f, Token, Vec2};

static SPLIT_DIOPTER_PARAMS: [Token; 8] = [
    camera::COUNT,
    camera::ANGLE,
    camera::OFFSET1,
    camera::WIDTH1,
    camera::FOCUS_DISTANCE1,
    camera::OFFSET2,
    camera::WIDTH2,
    camera::FOCUS_DISTANCE2,
];

static LENS_DISTORTION_PARAMS: [Token; 8] = [
    camera::TYPE,
    camera::K1,
    camera::K2,
    camera::CENTER,
    camera::ANA_SQ,
    camera::ASYM,
    camera::SCALE,
    camera::IOR,
];

/// Delegate parameter name of the clip planes.
const CLIP_PLANES_PARAM: Token = Token::from_static("clipPlanes");

fn typed_param<T: ValueType>(
    delegate: &DelegateHandle,
    id: &Path,
    param: Token,
) -> DataSourceHandle {
    let (delegate, id) = (delegate.clone(), id.clone());
    LazyTypedSampled::handle(move || delegate.camera_param_value(&id, &param).get_or(T::default()))
}

fn untyped_param(delegate: &DelegateHandle, id: &Path, param: Token) -> DataSourceHandle {
    let (delegate, id) = (delegate.clone(), id.clone());
    LazySampled::handle(move || delegate.camera_param_value(&id, &param))
}

/// Clipping range from either a `Vec2f` or an opaque [`Range1f`].
fn clipping_range(value: &Value) -> Vec2 {
    match value {
        Value::Vec2f(v) => *v,
        other => other
            .downcast_ref::<Range1f>()
            .map(Range1f::as_vec2)
            .unwrap_or_default(),
    }
}

/// Camera parameters read through `camera_param_value`.
pub struct LegacyCameraContainer {
    delegate: DelegateHandle,
    id: Path,
}

impl LegacyCameraContainer {
    pub fn new(delegate: DelegateHandle, id: Path) -> Self {
        Self { delegate, id }
    }
}

impl ContainerDataSource for LegacyCameraContainer {
    fn names(&self) -> Vec<Token> {
        vec![
            camera::PROJECTION,
            camera::HORIZONTAL_APERTURE,
            camera::VERTICAL_APERTURE,
            camera::HORIZONTAL_APERTURE_OFFSET,
            camera::VERTICAL_APERTURE_OFFSET,
            camera::FOCAL_LENGTH,
            camera::CLIPPING_RANGE,
            camera::CLIPPING_PLANES,
            camera::F_STOP,
            camera::FOCUS_DISTANCE,
            camera::SHUTTER_OPEN,
            camera::SHUTTER_CLOSE,
            camera::EXPOSURE,
            camera::FOCUS_ON,
            camera::DOF_ASPECT,
            camera::SPLIT_DIOPTER,
            camera::LENS_DISTORTION,
        ]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let (d, id) = (&self.delegate, &self.id);
        let handle = match name.as_str() {
            "projection" => {
                let (d, id) = (d.clone(), id.clone());
                LazyTypedSampled::handle(move || {
                    match d.camera_param_value(&id, &camera::PROJECTION) {
                        Value::Token(t) if t == camera::ORTHOGRAPHIC => camera::ORTHOGRAPHIC,
                        _ => camera::PERSPECTIVE,
                    }
                })
            }
            "clippingRange" => {
                let (d, id) = (d.clone(), id.clone());
                LazyTypedSampled::handle(move || {
                    clipping_range(&d.camera_param_value(&id, &camera::CLIPPING_RANGE))
                })
            }
            "clippingPlanes" => typed_param::<Array<DVec4>>(d, id, CLIP_PLANES_PARAM),
            "shutterOpen" | "shutterClose" => typed_param::<f64>(d, id, name.clone()),
            "focusOn" => typed_param::<bool>(d, id, name.clone()),
            "splitDiopter" => DataSourceHandle::container(NamespacedParams {
                delegate: d.clone(),
                id: id.clone(),
                namespace: camera::SPLIT_DIOPTER,
                names: &SPLIT_DIOPTER_PARAMS,
            }),
            "lensDistortion" => DataSourceHandle::container(NamespacedParams {
                delegate: d.clone(),
                id: id.clone(),
                namespace: camera::LENS_DISTORTION,
                names: &LENS_DISTORTION_PARAMS,
            }),
            "horizontalAperture"
            | "verticalAperture"
            | "horizontalApertureOffset"
            | "verticalApertureOffset"
            | "focalLength"
            | "fStop"
            | "focusDistance"
            | "exposure"
            | "dofAspect" => typed_param::<f32>(d, id, name.clone()),
            _ => untyped_param(d, id, name.clone()),
        };
        Some(handle)
    }
}

/// Parameters stored as `<namespace>:<name>`.
struct NamespacedParams {
    delegate: DelegateHandle,
    id: Path,
    namespace: Token,
    names: &'static [Token],
}

impl ContainerDataSource for NamespacedParams {
    fn names(&self) -> Vec<Token> {
        self.names.to_vec()
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        if !self.names.contains(name) {
            return None;
        }
        let param = Token::new(&format!("{}:{}", self.namespace, name));
        let (d, id) = (&self.delegate, &self.id);
        Some(match name.as_str() {
            "count" => typed_param::<i32>(d, id, param),
            "type" => typed_param::<Token>(d, id, param),
            "center" | "asym" => typed_param::<Vec2>(d, id, param),
            _ => typed_param::<f32>(d, id, param),
        })
    }
}

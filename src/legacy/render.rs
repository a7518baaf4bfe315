//! Render resource containers: render buffers, render settings, render
//! terminals (integrator, sample filter, display filter) and draw targets.

use crate::core::{
    create_typed_retained, ContainerDataSource, DataSourceHandle, RetainedContainer,
    RetainedSampled, RetainedTypedSampled, RetainedVector, Value,
};
use crate::legacy::material::node_container;
use crate::legacy::params::{dictionary_container, get_value, LegacyGetContainer};
use crate::legacy::{DelegateHandle, MaterialNode, RenderProduct, RenderProducts, RenderVar};
use crate::scene::tokens::{render, schema};
use crate::util::{Path, Token};

// ============================================================================
// Render buffer
// ============================================================================

/// `renderBuffer` container built from the render buffer descriptor.
pub struct LegacyRenderBufferContainer {
    delegate: DelegateHandle,
    id: Path,
}

impl LegacyRenderBufferContainer {
    pub fn new(delegate: DelegateHandle, id: Path) -> Self {
        Self { delegate, id }
    }
}

impl ContainerDataSource for LegacyRenderBufferContainer {
    fn names(&self) -> Vec<Token> {
        vec![render::DIMENSIONS, render::FORMAT, render::MULTI_SAMPLED]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let handle = match name.as_str() {
            "dimensions" => RetainedTypedSampled::handle(
                self.delegate.render_buffer_descriptor(&self.id).dimensions,
            ),
            "format" => RetainedTypedSampled::handle(
                self.delegate.render_buffer_descriptor(&self.id).format,
            ),
            "multiSampled" => RetainedTypedSampled::handle(
                self.delegate
                    .render_buffer_descriptor(&self.id)
                    .multi_sampled,
            ),
            _ => get_value(&self.delegate, &self.id, name),
        };
        Some(handle)
    }
}

// ============================================================================
// Render settings
// ============================================================================

fn render_var_container(var: &RenderVar) -> DataSourceHandle {
    RetainedContainer::handle([
        (
            render::PATH,
            Some(RetainedTypedSampled::handle(var.var_path.clone())),
        ),
        (
            render::DATA_TYPE,
            Some(RetainedTypedSampled::handle(var.data_type.clone())),
        ),
        (
            render::SOURCE_NAME,
            Some(RetainedTypedSampled::handle(var.source_name.clone())),
        ),
        (
            render::SOURCE_TYPE,
            Some(RetainedTypedSampled::handle(var.source_type.clone())),
        ),
        (
            render::NAMESPACED_SETTINGS,
            Some(dictionary_container(&var.namespaced_settings)),
        ),
    ])
}

fn render_product_container(product: &RenderProduct) -> DataSourceHandle {
    let vars = RetainedVector::handle(
        product
            .render_vars
            .iter()
            .map(|v| Some(render_var_container(v))),
    );
    RetainedContainer::handle([
        (
            render::PATH,
            Some(RetainedTypedSampled::handle(product.product_path.clone())),
        ),
        (
            render::TYPE,
            Some(RetainedTypedSampled::handle(product.product_type.clone())),
        ),
        (
            render::NAME,
            Some(RetainedTypedSampled::handle(product.name.clone())),
        ),
        (
            render::RESOLUTION,
            Some(RetainedTypedSampled::handle(product.resolution)),
        ),
        (render::RENDER_VARS, Some(vars)),
        (
            render::CAMERA_PRIM,
            Some(RetainedTypedSampled::handle(product.camera_path.clone())),
        ),
        (
            render::PIXEL_ASPECT_RATIO,
            Some(RetainedTypedSampled::handle(product.pixel_aspect_ratio)),
        ),
        (
            render::ASPECT_RATIO_CONFORM_POLICY,
            Some(RetainedTypedSampled::handle(
                product.aspect_ratio_conform_policy.clone(),
            )),
        ),
        (
            render::APERTURE_SIZE,
            Some(RetainedTypedSampled::handle(product.aperture_size)),
        ),
        (
            render::DATA_WINDOW_NDC,
            Some(RetainedTypedSampled::handle(product.data_window_ndc)),
        ),
        (
            render::DISABLE_MOTION_BLUR,
            Some(RetainedTypedSampled::handle(product.disable_motion_blur)),
        ),
        (
            render::DISABLE_DEPTH_OF_FIELD,
            Some(RetainedTypedSampled::handle(product.disable_depth_of_field)),
        ),
        (
            render::NAMESPACED_SETTINGS,
            Some(dictionary_container(&product.namespaced_settings)),
        ),
    ])
}

/// `renderSettings` container.
pub struct LegacyRenderSettingsContainer {
    delegate: DelegateHandle,
    id: Path,
}

impl LegacyRenderSettingsContainer {
    pub fn new(delegate: DelegateHandle, id: Path) -> Self {
        Self { delegate, id }
    }
}

impl ContainerDataSource for LegacyRenderSettingsContainer {
    fn names(&self) -> Vec<Token> {
        vec![
            render::NAMESPACED_SETTINGS,
            render::RENDER_PRODUCTS,
            render::INCLUDED_PURPOSES,
            render::MATERIAL_BINDING_PURPOSES,
            render::RENDERING_COLOR_SPACE,
        ]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let value = self.delegate.get(&self.id, name);
        match name.as_str() {
            "namespacedSettings" => match value {
                Value::Dictionary(dict) => Some(dictionary_container(&dict)),
                _ => None,
            },
            "renderProducts" => {
                let products = value.downcast_ref::<RenderProducts>()?;
                Some(RetainedVector::handle(
                    products.iter().map(|p| Some(render_product_container(p))),
                ))
            }
            "includedPurposes" | "materialBindingPurposes" => match value {
                Value::TokenArray(_) => Some(create_typed_retained(value)),
                _ => None,
            },
            "renderingColorSpace" => match value {
                Value::Token(_) => Some(create_typed_retained(value)),
                _ => None,
            },
            _ => Some(DataSourceHandle::sampled(RetainedSampled::new(value))),
        }
    }
}

// ============================================================================
// Render terminals and draw targets
// ============================================================================

/// `{resource: ...}` container of an integrator, sample filter or display
/// filter. `None` when the delegate has no resource.
pub fn render_terminal_resource(delegate: &DelegateHandle, id: &Path) -> Option<DataSourceHandle> {
    let value = delegate.get(id, &schema::RESOURCE);
    let resource = match value.downcast_ref::<MaterialNode>() {
        Some(node) => node_container(node, &[]),
        None if value.is_empty() => return None,
        None => DataSourceHandle::sampled(RetainedSampled::new(value)),
    };
    Some(RetainedContainer::handle([(schema::RESOURCE, Some(resource))]))
}

static DRAW_TARGET_NAMES: [Token; 7] = [
    schema::CAMERA,
    schema::COLLECTION,
    schema::DRAW_TARGET_SET,
    schema::ENABLE,
    schema::RESOLUTION,
    schema::AOV_BINDINGS,
    schema::DEPTH_PRIORITY,
];

/// `drawTarget` container: every member is a lazy `get`.
pub fn draw_target_container(delegate: &DelegateHandle, id: &Path) -> DataSourceHandle {
    DataSourceHandle::container(LegacyGetContainer::new(
        delegate.clone(),
        id.clone(),
        &DRAW_TARGET_NAMES,
    ))
}

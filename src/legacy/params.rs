//! Shared building blocks for legacy containers: lazily evaluated
//! sources, pass-through `get` containers and dictionary conversion, plus
//! the small per-prim containers (display style, volume fields).

use std::marker::PhantomData;

use crate::core::{
    create_typed_retained, Array, ContainerDataSource, DataSourceHandle, Dictionary,
    RetainedContainer, RetainedTypedSampled, SampledDataSource, Time, TypedSampledDataSource,
    Value, ValueType,
};
use crate::legacy::DelegateHandle;
use crate::scene::tokens::schema;
use crate::util::{Path, Token};

// ============================================================================
// Lazy sources
// ============================================================================

/// Constant untyped source that evaluates `read` on every query.
pub struct LazySampled<F> {
    read: F,
}

impl<F> LazySampled<F>
where
    F: Fn() -> Value + Send + Sync + 'static,
{
    pub fn handle(read: F) -> DataSourceHandle {
        DataSourceHandle::sampled(Self { read })
    }
}

impl<F> SampledDataSource for LazySampled<F>
where
    F: Fn() -> Value + Send + Sync,
{
    fn value(&self, _shutter_offset: Time) -> Value {
        (self.read)()
    }

    fn contributing_sample_times(&self, _start: Time, _end: Time) -> Option<Vec<Time>> {
        None
    }
}

/// Constant typed source that evaluates `read` on every query.
pub struct LazyTypedSampled<T, F> {
    read: F,
    _marker: PhantomData<fn() -> T>,
}

impl<T, F> LazyTypedSampled<T, F>
where
    T: ValueType,
    F: Fn() -> T + Send + Sync + 'static,
{
    pub fn handle(read: F) -> DataSourceHandle {
        DataSourceHandle::typed::<T, _>(Self {
            read,
            _marker: PhantomData,
        })
    }
}

impl<T, F> SampledDataSource for LazyTypedSampled<T, F>
where
    T: ValueType,
    F: Fn() -> T + Send + Sync,
{
    fn value(&self, _shutter_offset: Time) -> Value {
        (self.read)().into_value()
    }

    fn contributing_sample_times(&self, _start: Time, _end: Time) -> Option<Vec<Time>> {
        None
    }
}

impl<T, F> TypedSampledDataSource<T> for LazyTypedSampled<T, F>
where
    T: ValueType,
    F: Fn() -> T + Send + Sync,
{
    fn typed_value(&self, _shutter_offset: Time) -> T {
        (self.read)()
    }
}

/// Lazy `delegate.get(id, key)`.
pub fn get_value(delegate: &DelegateHandle, id: &Path, key: &Token) -> DataSourceHandle {
    let (delegate, id, key) = (delegate.clone(), id.clone(), key.clone());
    LazySampled::handle(move || delegate.get(&id, &key))
}

// ============================================================================
// Pass-through container
// ============================================================================

/// Container answering every name with a lazy `delegate.get`.
pub struct LegacyGetContainer {
    delegate: DelegateHandle,
    id: Path,
    names: &'static [Token],
}

impl LegacyGetContainer {
    pub fn new(delegate: DelegateHandle, id: Path, names: &'static [Token]) -> Self {
        Self {
            delegate,
            id,
            names,
        }
    }
}

impl ContainerDataSource for LegacyGetContainer {
    fn names(&self) -> Vec<Token> {
        self.names.to_vec()
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        Some(get_value(&self.delegate, &self.id, name))
    }
}

/// Convert a dictionary into nested containers with typed leaves.
pub fn dictionary_container(dict: &Dictionary) -> DataSourceHandle {
    RetainedContainer::handle(dict.iter().map(|(key, value)| {
        let child = match value {
            Value::Dictionary(nested) => dictionary_container(nested),
            other => create_typed_retained(other.clone()),
        };
        (Token::new(key), Some(child))
    }))
}

// ============================================================================
// Display style
// ============================================================================

/// `displayStyle` container of a legacy gprim.
pub struct LegacyDisplayStyleContainer {
    delegate: DelegateHandle,
    id: Path,
}

impl LegacyDisplayStyleContainer {
    pub fn new(delegate: DelegateHandle, id: Path) -> Self {
        Self { delegate, id }
    }
}

impl ContainerDataSource for LegacyDisplayStyleContainer {
    fn names(&self) -> Vec<Token> {
        vec![
            schema::REFINE_LEVEL,
            schema::FLAT_SHADING_ENABLED,
            schema::DISPLACEMENT_ENABLED,
            schema::OCCLUDED_SELECTION_SHOWS_THROUGH,
            schema::POINTS_SHADING_ENABLED,
            schema::MATERIAL_IS_FINAL,
            schema::SHADING_STYLE,
            schema::REPR_SELECTOR,
            schema::CULL_STYLE,
        ]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let (d, id) = (&self.delegate, &self.id);
        let flag = |on: bool| Some(RetainedTypedSampled::handle(on));
        match name.as_str() {
            "refineLevel" => {
                let level = d.display_style(id).refine_level;
                (level != 0).then(|| RetainedTypedSampled::handle(level))
            }
            "flatShadingEnabled" => flag(d.display_style(id).flat_shading_enabled),
            "displacementEnabled" => flag(d.display_style(id).displacement_enabled),
            "occludedSelectionShowsThrough" => {
                flag(d.display_style(id).occluded_selection_shows_through)
            }
            "pointsShadingEnabled" => flag(d.display_style(id).points_shading_enabled),
            "materialIsFinal" => flag(d.display_style(id).material_is_final),
            "shadingStyle" => {
                let style = d.shading_style(id);
                (!style.is_empty()).then(|| RetainedTypedSampled::handle(style))
            }
            "reprSelector" => {
                let selector = d.repr_selector(id);
                selector
                    .iter()
                    .any(|t| !t.is_empty())
                    .then(|| RetainedTypedSampled::handle(Array::new(selector)))
            }
            "cullStyle" => d
                .cull_style(id)
                .as_token()
                .map(RetainedTypedSampled::handle),
            _ => None,
        }
    }
}

// ============================================================================
// Volume fields
// ============================================================================

/// `volumeField` container of a legacy field asset prim.
pub struct LegacyVolumeFieldContainer {
    delegate: DelegateHandle,
    id: Path,
}

impl LegacyVolumeFieldContainer {
    pub fn new(delegate: DelegateHandle, id: Path) -> Self {
        Self { delegate, id }
    }
}

impl ContainerDataSource for LegacyVolumeFieldContainer {
    fn names(&self) -> Vec<Token> {
        vec![
            schema::FILE_PATH,
            schema::FIELD_NAME,
            schema::FIELD_INDEX,
            schema::FIELD_DATA_TYPE,
            schema::VECTOR_DATA_ROLE_HINT,
        ]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let value = self.delegate.get(&self.id, name);
        (!value.is_empty()).then(|| create_typed_retained(value))
    }
}

/// `volumeFieldBinding` container of a legacy volume, `None` without
/// fields.
pub fn volume_field_binding(delegate: &DelegateHandle, id: &Path) -> Option<DataSourceHandle> {
    let fields = delegate.volume_field_descriptors(id);
    if fields.is_empty() {
        return None;
    }
    Some(RetainedContainer::handle(fields.into_iter().map(|f| {
        (f.field_name, Some(RetainedTypedSampled::handle(f.field_id)))
    })))
}

//! Retained data sources.
//!
//! Retained data sources own their contents outright. They are the
//! building blocks used to author small containers (scene globals,
//! dependencies, test fixtures) and to wrap values pulled from a legacy
//! delegate.

use std::fmt;
use std::sync::Arc;

use half::f16;

use crate::core::{
    Array, ContainerDataSource, DataSourceHandle, Locator, SampledDataSource, Time,
    TimeSampleArray, TypedSampledDataSource, Value, ValueType, VectorDataSource,
};
use crate::util::{DMat4, DVec3, Path, Quat, Quath, Token, Vec2, Vec3, Vec4};

// ============================================================================
// Container
// ============================================================================

/// Container holding an explicit list of children.
///
/// A child may be `None`: its name is still reported by `names` but `get`
/// returns `None` for it.
#[derive(Clone, Default)]
pub struct RetainedContainer {
    entries: Vec<(Token, Option<DataSourceHandle>)>,
}

impl RetainedContainer {
    /// Create a container from `(name, child)` pairs.
    pub fn new<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Token, Option<DataSourceHandle>)>,
    {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// Create a container and wrap it as a handle.
    pub fn handle<I>(entries: I) -> DataSourceHandle
    where
        I: IntoIterator<Item = (Token, Option<DataSourceHandle>)>,
    {
        DataSourceHandle::Container(Arc::new(Self::new(entries)))
    }

    /// Build a container from present children only.
    pub fn from_present<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (Token, DataSourceHandle)>,
    {
        Self::new(entries.into_iter().map(|(name, ds)| (name, Some(ds))))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ContainerDataSource for RetainedContainer {
    fn names(&self) -> Vec<Token> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, ds)| ds.clone())
    }
}

impl fmt::Debug for RetainedContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(n, ds)| (n, ds)))
            .finish()
    }
}

/// Build a nested container holding `leaf` at `locator`.
///
/// The empty locator returns `leaf` unchanged.
pub fn nested_container(locator: &Locator, leaf: DataSourceHandle) -> DataSourceHandle {
    locator
        .elements()
        .iter()
        .rev()
        .fold(leaf, |child, name| {
            RetainedContainer::handle([(name.clone(), Some(child))])
        })
}

// ============================================================================
// Vector
// ============================================================================

/// Vector holding an explicit list of elements.
#[derive(Clone, Default)]
pub struct RetainedVector {
    elements: Vec<Option<DataSourceHandle>>,
}

impl RetainedVector {
    /// Create a vector from elements.
    pub fn new<I: IntoIterator<Item = Option<DataSourceHandle>>>(elements: I) -> Self {
        Self {
            elements: elements.into_iter().collect(),
        }
    }

    /// Create a vector and wrap it as a handle.
    pub fn handle<I: IntoIterator<Item = Option<DataSourceHandle>>>(elements: I) -> DataSourceHandle {
        DataSourceHandle::Vector(Arc::new(Self::new(elements)))
    }
}

impl VectorDataSource for RetainedVector {
    fn num_elements(&self) -> usize {
        self.elements.len()
    }

    fn element(&self, index: usize) -> Option<DataSourceHandle> {
        self.elements.get(index).cloned().flatten()
    }
}

// ============================================================================
// Sampled
// ============================================================================

/// Constant untyped value.
#[derive(Clone, Debug, Default)]
pub struct RetainedSampled {
    value: Value,
}

impl RetainedSampled {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

impl SampledDataSource for RetainedSampled {
    fn value(&self, _shutter_offset: Time) -> Value {
        self.value.clone()
    }

    fn contributing_sample_times(&self, _start: Time, _end: Time) -> Option<Vec<Time>> {
        None
    }
}

/// Constant typed value.
#[derive(Clone, Debug, Default)]
pub struct RetainedTypedSampled<T> {
    value: T,
}

impl<T: ValueType> RetainedTypedSampled<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// Create a typed constant and wrap it as a handle.
    pub fn handle(value: T) -> DataSourceHandle {
        DataSourceHandle::typed::<T, _>(Self::new(value))
    }
}

impl<T: ValueType> SampledDataSource for RetainedTypedSampled<T> {
    fn value(&self, _shutter_offset: Time) -> Value {
        self.value.clone().into_value()
    }

    fn contributing_sample_times(&self, _start: Time, _end: Time) -> Option<Vec<Time>> {
        None
    }
}

impl<T: ValueType> TypedSampledDataSource<T> for RetainedTypedSampled<T> {
    fn typed_value(&self, _shutter_offset: Time) -> T {
        self.value.clone()
    }
}

/// Typed value authored at several shutter offsets.
///
/// Queries between samples interpolate; queries outside the authored range
/// hold the nearest end sample.
#[derive(Clone, Debug)]
pub struct RetainedTypedMultisampled<T> {
    samples: TimeSampleArray<T>,
}

impl<T> RetainedTypedMultisampled<T>
where
    T: ValueType + crate::core::Interpolate,
{
    /// Create from `(time, value)` pairs; sorted by time.
    pub fn new<I: IntoIterator<Item = (Time, T)>>(samples: I) -> Self {
        Self {
            samples: TimeSampleArray::from_pairs(samples),
        }
    }

    /// Create and wrap as a handle.
    pub fn handle<I: IntoIterator<Item = (Time, T)>>(samples: I) -> DataSourceHandle {
        DataSourceHandle::typed::<T, _>(Self::new(samples))
    }

    #[inline]
    pub fn samples(&self) -> &TimeSampleArray<T> {
        &self.samples
    }
}

impl<T> SampledDataSource for RetainedTypedMultisampled<T>
where
    T: ValueType + crate::core::Interpolate,
{
    fn value(&self, shutter_offset: Time) -> Value {
        self.samples.resample(shutter_offset).into_value()
    }

    fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>> {
        self.samples.contributing_sample_times(start, end)
    }
}

impl<T> TypedSampledDataSource<T> for RetainedTypedMultisampled<T>
where
    T: ValueType + crate::core::Interpolate,
{
    fn typed_value(&self, shutter_offset: Time) -> T {
        self.samples.resample(shutter_offset)
    }
}

// ============================================================================
// Typed dispatch
// ============================================================================

fn typed_constant<T: ValueType>(value: &Value) -> Option<DataSourceHandle> {
    T::from_value(value).map(RetainedTypedSampled::handle)
}

/// Wrap `value` in a constant data source typed after its variant.
///
/// Variants without a typed counterpart fall back to an untyped constant.
pub fn create_typed_retained(value: Value) -> DataSourceHandle {
    let typed = match &value {
        Value::Bool(_) => typed_constant::<bool>(&value),
        Value::Int(_) => typed_constant::<i32>(&value),
        Value::Int64(_) => typed_constant::<i64>(&value),
        Value::Float(_) => typed_constant::<f32>(&value),
        Value::Double(_) => typed_constant::<f64>(&value),
        Value::Half(_) => typed_constant::<f16>(&value),
        Value::Token(_) => typed_constant::<Token>(&value),
        Value::String(_) => typed_constant::<String>(&value),
        Value::Path(_) => typed_constant::<Path>(&value),
        Value::Locator(_) => typed_constant::<Locator>(&value),
        Value::Vec2f(_) => typed_constant::<Vec2>(&value),
        Value::Vec3f(_) => typed_constant::<Vec3>(&value),
        Value::Vec4f(_) => typed_constant::<Vec4>(&value),
        Value::Vec3d(_) => typed_constant::<DVec3>(&value),
        Value::Matrix4d(_) => typed_constant::<DMat4>(&value),
        Value::Quatf(_) => typed_constant::<Quat>(&value),
        Value::Quath(_) => typed_constant::<Quath>(&value),
        Value::IntArray(_) => typed_constant::<Array<i32>>(&value),
        Value::FloatArray(_) => typed_constant::<Array<f32>>(&value),
        Value::DoubleArray(_) => typed_constant::<Array<f64>>(&value),
        Value::TokenArray(_) => typed_constant::<Array<Token>>(&value),
        Value::PathArray(_) => typed_constant::<Array<Path>>(&value),
        Value::Vec2fArray(_) => typed_constant::<Array<Vec2>>(&value),
        Value::Vec3fArray(_) => typed_constant::<Array<Vec3>>(&value),
        Value::Vec4fArray(_) => typed_constant::<Array<Vec4>>(&value),
        Value::QuatfArray(_) => typed_constant::<Array<Quat>>(&value),
        Value::QuathArray(_) => typed_constant::<Array<Quath>>(&value),
        Value::Matrix4dArray(_) => typed_constant::<Array<DMat4>>(&value),
        _ => None,
    };
    typed.unwrap_or_else(|| DataSourceHandle::sampled(RetainedSampled::new(value)))
}

//! Data source abstraction.
//!
//! A data source is an immutable, reference-counted, lazily evaluated view
//! over scene data. The closed set of kinds is modelled by
//! [`DataSourceHandle`]:
//!
//! - [`ContainerDataSource`] - named children
//! - [`VectorDataSource`] - indexed children
//! - [`SampledDataSource`] - a [`Value`] per shutter offset
//! - [`TypedSampledDataSource`] - sampled with a statically known value type
//! - `Block` - explicit "no opinion" marker that masks weaker opinions
//!
//! Absence is not failure: `get`/`element` returning `None` means the field
//! is not present, and callers treat it exactly like an undeclared field.

use std::any::Any;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use crate::core::{Locator, Value, ValueType};
use crate::util::Token;

/// Shutter offset relative to the current frame.
pub type Time = f32;

// ============================================================================
// Capability traits
// ============================================================================

/// Data source with named children.
pub trait ContainerDataSource: Send + Sync {
    /// Child names. Advisory: not guaranteed to be exhaustive or cheap.
    fn names(&self) -> Vec<Token>;

    /// Child data source for `name`, `None` if absent.
    fn get(&self, name: &Token) -> Option<DataSourceHandle>;
}

/// Data source with indexed children.
pub trait VectorDataSource: Send + Sync {
    fn num_elements(&self) -> usize;

    fn element(&self, index: usize) -> Option<DataSourceHandle>;
}

/// Data source holding a time-varying value.
pub trait SampledDataSource: Send + Sync {
    /// Value at the given shutter offset.
    fn value(&self, shutter_offset: Time) -> Value;

    /// Sample times contributing to the interval `[start, end]`.
    ///
    /// `None` means the value is constant over all time. Returned samples
    /// may extend outside the interval to include bracketing samples.
    fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>>;
}

/// Sampled data source with a statically known value type.
pub trait TypedSampledDataSource<T: ValueType>: SampledDataSource {
    /// Typed value; a default value on type mismatch.
    fn typed_value(&self, shutter_offset: Time) -> T {
        T::from_value(&self.value(shutter_offset)).unwrap_or_default()
    }
}

pub type ContainerHandle = Arc<dyn ContainerDataSource>;
pub type VectorHandle = Arc<dyn VectorDataSource>;
pub type TypedHandle<T> = Arc<dyn TypedSampledDataSource<T>>;

// ============================================================================
// SampledHandle
// ============================================================================

/// Shared handle to a sampled data source, with optional typed capability.
#[derive(Clone)]
pub struct SampledHandle {
    source: Arc<dyn SampledDataSource>,
    typed: Option<Arc<dyn Any + Send + Sync>>,
}

impl SampledHandle {
    /// Wrap an untyped sampled data source.
    pub fn new<S: SampledDataSource + 'static>(source: Arc<S>) -> Self {
        Self {
            source,
            typed: None,
        }
    }

    /// Wrap an untyped trait object.
    pub fn from_dyn(source: Arc<dyn SampledDataSource>) -> Self {
        Self {
            source,
            typed: None,
        }
    }

    /// Wrap a typed sampled data source; [`cast`](Self::cast) recovers it.
    pub fn typed<T, S>(source: Arc<S>) -> Self
    where
        T: ValueType,
        S: TypedSampledDataSource<T> + 'static,
    {
        let typed: TypedHandle<T> = source.clone();
        Self {
            source,
            typed: Some(Arc::new(typed)),
        }
    }

    /// Typed view, if the source was registered with value type `T`.
    pub fn cast<T: ValueType>(&self) -> Option<TypedHandle<T>> {
        self.typed
            .as_ref()?
            .downcast_ref::<TypedHandle<T>>()
            .cloned()
    }

    /// Typed value through the typed view, or extracted from the untyped
    /// value. Default on mismatch.
    pub fn typed_value<T: ValueType>(&self, shutter_offset: Time) -> T {
        match self.cast::<T>() {
            Some(typed) => typed.typed_value(shutter_offset),
            None => T::from_value(&self.source.value(shutter_offset)).unwrap_or_default(),
        }
    }

    #[inline]
    pub fn value(&self, shutter_offset: Time) -> Value {
        self.source.value(shutter_offset)
    }

    #[inline]
    pub fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>> {
        self.source.contributing_sample_times(start, end)
    }

    /// Underlying untyped source.
    #[inline]
    pub fn source(&self) -> &Arc<dyn SampledDataSource> {
        &self.source
    }

    /// Check whether two handles refer to the same data source.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.source), Arc::as_ptr(&other.source))
    }
}

// ============================================================================
// DataSourceHandle
// ============================================================================

/// Handle to any kind of data source.
#[derive(Clone)]
pub enum DataSourceHandle {
    Container(ContainerHandle),
    Vector(VectorHandle),
    Sampled(SampledHandle),
    /// Masks opinions from weaker inputs of an overlay
    Block,
}

impl DataSourceHandle {
    /// Wrap a container.
    pub fn container<C: ContainerDataSource + 'static>(container: C) -> Self {
        Self::Container(Arc::new(container))
    }

    /// Wrap a vector.
    pub fn vector<V: VectorDataSource + 'static>(vector: V) -> Self {
        Self::Vector(Arc::new(vector))
    }

    /// Wrap an untyped sampled data source.
    pub fn sampled<S: SampledDataSource + 'static>(source: S) -> Self {
        Self::Sampled(SampledHandle::new(Arc::new(source)))
    }

    /// Wrap a typed sampled data source.
    pub fn typed<T, S>(source: S) -> Self
    where
        T: ValueType,
        S: TypedSampledDataSource<T> + 'static,
    {
        Self::Sampled(SampledHandle::typed::<T, S>(Arc::new(source)))
    }

    #[inline]
    pub fn as_container(&self) -> Option<&ContainerHandle> {
        match self {
            Self::Container(c) => Some(c),
            _ => None,
        }
    }

    #[inline]
    pub fn into_container(self) -> Option<ContainerHandle> {
        match self {
            Self::Container(c) => Some(c),
            _ => None,
        }
    }

    #[inline]
    pub fn as_vector(&self) -> Option<&VectorHandle> {
        match self {
            Self::Vector(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_sampled(&self) -> Option<&SampledHandle> {
        match self {
            Self::Sampled(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn into_sampled(self) -> Option<SampledHandle> {
        match self {
            Self::Sampled(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block)
    }

    /// Name of the kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Container(_) => "container",
            Self::Vector(_) => "vector",
            Self::Sampled(_) => "sampled",
            Self::Block => "block",
        }
    }

    /// Check whether two handles refer to the same data source.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Container(a), Self::Container(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Self::Vector(a), Self::Vector(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (Self::Sampled(a), Self::Sampled(b)) => a.ptr_eq(b),
            (Self::Block, Self::Block) => true,
            _ => false,
        }
    }
}

impl From<ContainerHandle> for DataSourceHandle {
    fn from(container: ContainerHandle) -> Self {
        Self::Container(container)
    }
}

impl From<VectorHandle> for DataSourceHandle {
    fn from(vector: VectorHandle) -> Self {
        Self::Vector(vector)
    }
}

impl From<SampledHandle> for DataSourceHandle {
    fn from(sampled: SampledHandle) -> Self {
        Self::Sampled(sampled)
    }
}

impl fmt::Debug for DataSourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sampled(s) => write!(f, "DataSource::sampled({:?})", s.value(0.0)),
            other => write!(f, "DataSource::{}", other.kind()),
        }
    }
}

// ============================================================================
// Free functions
// ============================================================================

/// Walk `locator` through nested containers.
///
/// The empty locator yields `container` itself. Returns `None` as soon as a
/// child is absent or an intermediate child is not a container.
pub fn container_get(container: &ContainerHandle, locator: &Locator) -> Option<DataSourceHandle> {
    let count = locator.element_count();
    if count == 0 {
        return Some(DataSourceHandle::Container(container.clone()));
    }

    let mut current = container.clone();
    for (i, name) in locator.elements().iter().enumerate() {
        let child = current.get(name)?;
        if i + 1 == count {
            return Some(child);
        }
        current = child.into_container()?;
    }
    None
}

/// Sampled data source at `locator`, if present and sampled.
pub fn sampled_at(container: &ContainerHandle, locator: &Locator) -> Option<SampledHandle> {
    container_get(container, locator)?.into_sampled()
}

/// Container data source at `locator`, if present and a container.
pub fn container_at(container: &ContainerHandle, locator: &Locator) -> Option<ContainerHandle> {
    container_get(container, locator)?.into_container()
}

/// Union of the contributing sample times of `sources`.
///
/// `None` when no input varies over time. Times outside `[start, end]`
/// reported by inputs are kept, so the result may be a superset of what
/// the interval strictly needs.
pub fn merged_contributing_sample_times(
    sources: &[Option<SampledHandle>],
    start: Time,
    end: Time,
) -> Option<Vec<Time>> {
    let mut merged: Option<Vec<Time>> = None;
    for source in sources.iter().flatten() {
        let Some(times) = source.contributing_sample_times(start, end) else {
            continue;
        };
        if times.is_empty() {
            continue;
        }
        merged = Some(match merged {
            None => times,
            Some(existing) => sorted_union(&existing, &times),
        });
    }
    merged
}

fn sorted_union(a: &[Time], b: &[Time]) -> Vec<Time> {
    let mut result = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            result.push(a[i]);
            i += 1;
        } else if b[j] < a[i] {
            result.push(b[j]);
            j += 1;
        } else {
            result.push(a[i]);
            i += 1;
            j += 1;
        }
    }
    result.extend_from_slice(&a[i..]);
    result.extend_from_slice(&b[j..]);
    result
}

/// Write an indented dump of `data_source` sampled at offset 0.
///
/// Container children are listed in sorted name order; absent children
/// are skipped.
pub fn debug_print<W: Write>(
    out: &mut W,
    data_source: Option<&DataSourceHandle>,
    level: usize,
) -> io::Result<()> {
    let indent = "\t".repeat(level);
    match data_source {
        Some(DataSourceHandle::Container(container)) => {
            let mut names = container.names();
            names.sort();
            for name in names {
                if let Some(child) = container.get(&name) {
                    writeln!(out, "{}[{}]", indent, name)?;
                    debug_print(out, Some(&child), level + 1)?;
                }
            }
        }
        Some(DataSourceHandle::Vector(vector)) => {
            for i in 0..vector.num_elements() {
                writeln!(out, "{}[{}]", indent, i)?;
                debug_print(out, vector.element(i).as_ref(), level + 1)?;
            }
        }
        Some(DataSourceHandle::Sampled(sampled)) => {
            writeln!(out, "{}{}", indent, sampled.value(0.0))?;
        }
        Some(DataSourceHandle::Block) => writeln!(out, "{}BLOCK", indent)?,
        None => writeln!(out, "{}NULL", indent)?,
    }
    Ok(())
}

/// Render `data_source` sampled at offset 0 as JSON.
pub fn to_json(data_source: Option<&DataSourceHandle>) -> serde_json::Value {
    use serde_json::{Map, Value as Json};

    match data_source {
        Some(DataSourceHandle::Container(container)) => {
            let mut names = container.names();
            names.sort();
            let mut map = Map::new();
            for name in names {
                if let Some(child) = container.get(&name) {
                    map.insert(name.to_string(), to_json(Some(&child)));
                }
            }
            Json::Object(map)
        }
        Some(DataSourceHandle::Vector(vector)) => Json::Array(
            (0..vector.num_elements())
                .map(|i| to_json(vector.element(i).as_ref()))
                .collect(),
        ),
        Some(DataSourceHandle::Sampled(sampled)) => sampled.value(0.0).to_json(),
        Some(DataSourceHandle::Block) | None => Json::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{RetainedContainer, RetainedSampled, RetainedTypedSampled};

    struct Stepped;

    impl SampledDataSource for Stepped {
        fn value(&self, t: Time) -> Value {
            Value::Float(t)
        }

        fn contributing_sample_times(&self, _start: Time, _end: Time) -> Option<Vec<Time>> {
            Some(vec![-1.0, 1.0])
        }
    }

    struct Other;

    impl SampledDataSource for Other {
        fn value(&self, _t: Time) -> Value {
            Value::Empty
        }

        fn contributing_sample_times(&self, _start: Time, _end: Time) -> Option<Vec<Time>> {
            Some(vec![-2.0, 1.0])
        }
    }

    #[test]
    fn test_container_get_locator() {
        let leaf = RetainedTypedSampled::handle(3i32);
        let inner = RetainedContainer::handle([(Token::new("b"), Some(leaf))]);
        let root = RetainedContainer::new([(Token::new("a"), Some(inner.into()))]);
        let root: ContainerHandle = Arc::new(root);

        let found = container_get(&root, &Locator::parse("a.b").unwrap()).unwrap();
        assert_eq!(found.as_sampled().unwrap().typed_value::<i32>(0.0), 3);
        assert!(container_get(&root, &Locator::parse("a.c").unwrap()).is_none());
        assert!(container_get(&root, &Locator::parse("a.b.c").unwrap()).is_none());
        assert!(matches!(
            container_get(&root, &Locator::empty()),
            Some(DataSourceHandle::Container(_))
        ));
    }

    #[test]
    fn test_cast_typed() {
        let handle = RetainedTypedSampled::handle(2.5f32);
        let sampled = handle.as_sampled().unwrap();
        assert!(sampled.cast::<f32>().is_some());
        assert!(sampled.cast::<f64>().is_none());
        assert_eq!(sampled.typed_value::<f64>(0.0), 0.0);

        let untyped = DataSourceHandle::sampled(RetainedSampled::new(Value::Float(1.0)));
        let sampled = untyped.as_sampled().unwrap();
        assert!(sampled.cast::<f32>().is_none());
        assert_eq!(sampled.typed_value::<f32>(0.0), 1.0);
    }

    #[test]
    fn test_merged_sample_times_superset() {
        let a = SampledHandle::new(Arc::new(Stepped));
        let b = SampledHandle::new(Arc::new(Other));
        let constant = SampledHandle::new(Arc::new(RetainedSampled::new(Value::Int(1))));
        let merged = merged_contributing_sample_times(
            &[Some(a), None, Some(constant.clone()), Some(b)],
            0.0,
            1.0,
        );
        assert_eq!(merged, Some(vec![-2.0, -1.0, 1.0]));
        assert_eq!(merged_contributing_sample_times(&[Some(constant)], 0.0, 1.0), None);
    }

    #[test]
    fn test_debug_print_and_json() {
        let root = RetainedContainer::handle([
            (Token::new("b"), Some(RetainedTypedSampled::handle(Token::new("x")))),
            (Token::new("a"), Some(RetainedTypedSampled::handle(1i32))),
            (Token::new("z"), None),
        ]);
        let mut out = Vec::new();
        debug_print(&mut out, Some(&root), 0).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "[a]\n\t1\n[b]\n\tx\n");
        assert_eq!(to_json(Some(&root)), serde_json::json!({"a": 1, "b": "x"}));
    }
}

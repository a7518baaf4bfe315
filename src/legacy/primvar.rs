//! Primvar data sources pulled from a [`SceneDelegate`].
//!
//! Values at shutter offset 0 go through the untimed delegate queries.
//! Any other offset fetches every authored sample once and resamples.

use std::sync::{Arc, OnceLock};

use crate::core::{
    Array, ContainerDataSource, DataSourceHandle, IndexedTimeSampleArray, RetainedContainer,
    RetainedTypedSampled, SampledDataSource, Time, TimeSampleArray, TypedSampledDataSource, Value,
};
use crate::legacy::{
    DelegateHandle, ExtComputationPrimvarDescriptor, Interpolation, PrimvarDescriptor,
    ALL_SAMPLES,
};
use crate::scene::tokens::{ext_computation, primvars};
use crate::util::{Path, Token};

// ============================================================================
// Value sources
// ============================================================================

/// Value of a non-indexed primvar.
pub struct LegacyPrimvarValue {
    delegate: DelegateHandle,
    id: Path,
    key: Token,
    samples: OnceLock<TimeSampleArray<Value>>,
}

impl LegacyPrimvarValue {
    pub fn new(delegate: DelegateHandle, id: Path, key: Token) -> Self {
        Self {
            delegate,
            id,
            key,
            samples: OnceLock::new(),
        }
    }

    fn samples(&self) -> &TimeSampleArray<Value> {
        self.samples
            .get_or_init(|| self.delegate.sample_primvar(&self.id, &self.key, ALL_SAMPLES))
    }
}

impl SampledDataSource for LegacyPrimvarValue {
    fn value(&self, shutter_offset: Time) -> Value {
        if shutter_offset == 0.0 {
            let value = self.delegate.get(&self.id, &self.key);
            if !value.is_empty() {
                return value;
            }
            // Some delegates only answer the sampled query.
            return self
                .delegate
                .sample_primvar(&self.id, &self.key, 1)
                .values()
                .first()
                .cloned()
                .unwrap_or_default();
        }
        self.samples().resample(shutter_offset)
    }

    fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>> {
        self.samples().contributing_sample_times(start, end)
    }
}

impl TypedSampledDataSource<Value> for LegacyPrimvarValue {
    fn typed_value(&self, shutter_offset: Time) -> Value {
        self.value(shutter_offset)
    }
}

/// Shared lazily fetched samples of an indexed primvar.
struct IndexedSamples {
    delegate: DelegateHandle,
    id: Path,
    key: Token,
    samples: OnceLock<IndexedTimeSampleArray<Value>>,
}

impl IndexedSamples {
    fn get(&self) -> &IndexedTimeSampleArray<Value> {
        self.samples.get_or_init(|| {
            self.delegate
                .sample_indexed_primvar(&self.id, &self.key, ALL_SAMPLES)
        })
    }

    /// Always `Some`: indexed primvars report themselves as varying, with an
    /// empty list when at most one sample is authored.
    fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>> {
        Some(
            self.get()
                .contributing_sample_times(start, end)
                .unwrap_or_default(),
        )
    }
}

/// Flattened values of an indexed primvar.
pub struct LegacyIndexedPrimvarValue {
    shared: Arc<IndexedSamples>,
}

/// Indices of an indexed primvar.
pub struct LegacyPrimvarIndices {
    shared: Arc<IndexedSamples>,
}

/// Build the value and indices sources of one indexed primvar. Both share
/// one sample fetch.
pub fn indexed_primvar_sources(
    delegate: DelegateHandle,
    id: Path,
    key: Token,
) -> (LegacyIndexedPrimvarValue, LegacyPrimvarIndices) {
    let shared = Arc::new(IndexedSamples {
        delegate,
        id,
        key,
        samples: OnceLock::new(),
    });
    (
        LegacyIndexedPrimvarValue {
            shared: shared.clone(),
        },
        LegacyPrimvarIndices { shared },
    )
}

impl SampledDataSource for LegacyIndexedPrimvarValue {
    fn value(&self, shutter_offset: Time) -> Value {
        let s = &self.shared;
        if shutter_offset == 0.0 {
            return s.delegate.get_indexed_primvar(&s.id, &s.key).0;
        }
        s.get().resample_indexed(shutter_offset).0
    }

    fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>> {
        self.shared.contributing_sample_times(start, end)
    }
}

impl SampledDataSource for LegacyPrimvarIndices {
    fn value(&self, shutter_offset: Time) -> Value {
        Value::IntArray(self.typed_value(shutter_offset))
    }

    fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>> {
        self.shared.contributing_sample_times(start, end)
    }
}

impl TypedSampledDataSource<Array<i32>> for LegacyPrimvarIndices {
    fn typed_value(&self, shutter_offset: Time) -> Array<i32> {
        let s = &self.shared;
        if shutter_offset == 0.0 {
            return s.delegate.get_indexed_primvar(&s.id, &s.key).1;
        }
        s.get().resample_indexed(shutter_offset).1
    }
}

/// Value of a scene input of an ext computation.
pub struct LegacyExtComputationInput {
    delegate: DelegateHandle,
    id: Path,
    input: Token,
    samples: OnceLock<TimeSampleArray<Value>>,
}

impl LegacyExtComputationInput {
    pub fn new(delegate: DelegateHandle, id: Path, input: Token) -> Self {
        Self {
            delegate,
            id,
            input,
            samples: OnceLock::new(),
        }
    }

    fn samples(&self) -> &TimeSampleArray<Value> {
        self.samples.get_or_init(|| {
            self.delegate
                .sample_ext_computation_input(&self.id, &self.input, ALL_SAMPLES)
        })
    }
}

impl SampledDataSource for LegacyExtComputationInput {
    fn value(&self, shutter_offset: Time) -> Value {
        if shutter_offset == 0.0 {
            return self.delegate.ext_computation_input(&self.id, &self.input);
        }
        self.samples().resample(shutter_offset)
    }

    fn contributing_sample_times(&self, start: Time, end: Time) -> Option<Vec<Time>> {
        self.samples().contributing_sample_times(start, end)
    }
}

// ============================================================================
// Primvars containers
// ============================================================================

/// Upsert by name, keeping first-seen order.
fn upsert<T>(entries: &mut Vec<(Token, T)>, name: Token, entry: T) {
    match entries.iter_mut().find(|(n, _)| *n == name) {
        Some(slot) => slot.1 = entry,
        None => entries.push((name, entry)),
    }
}

/// `primvars` container of a legacy prim.
///
/// Descriptors for every interpolation are queried once on construction.
pub struct LegacyPrimvarsContainer {
    delegate: DelegateHandle,
    id: Path,
    entries: Vec<(Token, PrimvarDescriptor)>,
}

impl LegacyPrimvarsContainer {
    pub fn new(delegate: DelegateHandle, id: Path) -> Self {
        let mut entries = Vec::new();
        for interpolation in Interpolation::ALL {
            for desc in delegate.primvar_descriptors(&id, interpolation) {
                upsert(&mut entries, desc.name.clone(), desc);
            }
        }
        Self {
            delegate,
            id,
            entries,
        }
    }

    pub fn descriptor(&self, name: &Token) -> Option<&PrimvarDescriptor> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, d)| d)
    }
}

impl ContainerDataSource for LegacyPrimvarsContainer {
    fn names(&self) -> Vec<Token> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let desc = self.descriptor(name)?;
        let mut fields: Vec<(Token, Option<DataSourceHandle>)> = Vec::with_capacity(4);
        if desc.indexed {
            let (value, indices) =
                indexed_primvar_sources(self.delegate.clone(), self.id.clone(), name.clone());
            fields.push((
                primvars::INDEXED_PRIMVAR_VALUE,
                Some(DataSourceHandle::sampled(value)),
            ));
            fields.push((
                primvars::INDICES,
                Some(DataSourceHandle::typed::<Array<i32>, _>(indices)),
            ));
        } else {
            let value = LegacyPrimvarValue::new(self.delegate.clone(), self.id.clone(), name.clone());
            fields.push((
                primvars::PRIMVAR_VALUE,
                Some(DataSourceHandle::typed::<Value, _>(value)),
            ));
        }
        fields.push((
            primvars::INTERPOLATION,
            Some(RetainedTypedSampled::handle(desc.interpolation.as_token())),
        ));
        fields.push((
            primvars::ROLE,
            Some(RetainedTypedSampled::handle(desc.role.clone())),
        ));
        Some(RetainedContainer::handle(fields))
    }
}

/// `extComputationPrimvars` container of a legacy gprim.
pub struct LegacyExtComputationPrimvarsContainer {
    entries: Vec<(Token, ExtComputationPrimvarDescriptor)>,
}

impl LegacyExtComputationPrimvarsContainer {
    pub fn new(delegate: &DelegateHandle, id: &Path) -> Self {
        let mut entries = Vec::new();
        for interpolation in Interpolation::ALL {
            for desc in delegate.ext_computation_primvar_descriptors(id, interpolation) {
                upsert(&mut entries, desc.name.clone(), desc);
            }
        }
        Self { entries }
    }
}

impl ContainerDataSource for LegacyExtComputationPrimvarsContainer {
    fn names(&self) -> Vec<Token> {
        self.entries.iter().map(|(n, _)| n.clone()).collect()
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let (_, desc) = self.entries.iter().find(|(n, _)| n == name)?;
        Some(RetainedContainer::handle([
            (
                primvars::INTERPOLATION,
                Some(RetainedTypedSampled::handle(desc.interpolation.as_token())),
            ),
            (
                primvars::ROLE,
                Some(RetainedTypedSampled::handle(desc.role.clone())),
            ),
            (
                ext_computation::SOURCE_COMPUTATION,
                Some(RetainedTypedSampled::handle(desc.source_computation_id.clone())),
            ),
            (
                ext_computation::SOURCE_COMPUTATION_OUTPUT_NAME,
                Some(RetainedTypedSampled::handle(
                    desc.source_computation_output_name.clone(),
                )),
            ),
            (
                ext_computation::VALUE_TYPE,
                Some(RetainedTypedSampled::handle(desc.value_type.clone())),
            ),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{sampled_at, Locator};
    use crate::legacy::SceneDelegate;
    use crate::util::Vec3;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Points {
        sample_calls: Mutex<Vec<usize>>,
        untimed: bool,
    }

    fn points(a: f32, b: f32) -> Value {
        Value::Vec3fArray(Array::new(vec![Vec3::splat(a), Vec3::splat(b)]))
    }

    impl SceneDelegate for Points {
        fn get(&self, _id: &Path, key: &Token) -> Value {
            if self.untimed && *key == primvars::POINTS {
                points(0.0, 1.0)
            } else {
                Value::Empty
            }
        }

        fn sample_primvar(&self, _id: &Path, _key: &Token, max: usize) -> TimeSampleArray<Value> {
            self.sample_calls.lock().push(max);
            TimeSampleArray::from_parts(vec![0.0, 1.0], vec![points(0.0, 1.0), points(2.0, 3.0)])
        }

        fn primvar_descriptors(&self, _id: &Path, i: Interpolation) -> Vec<PrimvarDescriptor> {
            match i {
                Interpolation::Vertex => vec![PrimvarDescriptor::new("points", i).with_role("point")],
                Interpolation::FaceVarying => vec![PrimvarDescriptor::new("st", i).indexed()],
                _ => Vec::new(),
            }
        }

        fn get_indexed_primvar(&self, _id: &Path, _key: &Token) -> (Value, Array<i32>) {
            (Value::FloatArray(Array::new(vec![0.5])), Array::new(vec![0, 0, 0]))
        }
    }

    #[test]
    fn test_primvar_value_fetches_samples_once() {
        let delegate = Arc::new(Points {
            untimed: true,
            ..Default::default()
        });
        let handle: DelegateHandle = delegate.clone();
        let ds = LegacyPrimvarValue::new(handle, Path::parse("/m").unwrap(), primvars::POINTS);

        assert_eq!(ds.value(0.0), points(0.0, 1.0));
        assert!(delegate.sample_calls.lock().is_empty());

        assert_eq!(ds.value(0.5), points(1.0, 2.0));
        assert_eq!(ds.value(2.0), points(2.0, 3.0));
        assert_eq!(ds.contributing_sample_times(0.0, 1.0), Some(vec![0.0, 1.0]));
        assert_eq!(*delegate.sample_calls.lock(), vec![ALL_SAMPLES]);
    }

    #[test]
    fn test_primvar_value_single_sample_fallback() {
        let delegate = Arc::new(Points::default());
        let handle: DelegateHandle = delegate.clone();
        let ds = LegacyPrimvarValue::new(handle, Path::parse("/m").unwrap(), primvars::POINTS);
        assert_eq!(ds.value(0.0), points(0.0, 1.0));
        assert_eq!(*delegate.sample_calls.lock(), vec![1]);
    }

    #[test]
    fn test_indexed_sources_always_report_sample_times() {
        let handle: DelegateHandle = Arc::new(Points::default());
        let (value, indices) =
            indexed_primvar_sources(handle, Path::parse("/m").unwrap(), Token::new("st"));
        assert_eq!(value.contributing_sample_times(-1.0, 1.0), Some(Vec::new()));
        assert_eq!(indices.contributing_sample_times(-1.0, 1.0), Some(Vec::new()));
        assert_eq!(value.value(0.5), Value::FloatArray(Array::new(vec![0.5])));
    }

    #[test]
    fn test_primvars_container() {
        let delegate: DelegateHandle = Arc::new(Points::default());
        let container: Arc<dyn ContainerDataSource> =
            Arc::new(LegacyPrimvarsContainer::new(delegate, Path::parse("/m").unwrap()));
        assert_eq!(container.names(), vec![Token::new("points"), Token::new("st")]);

        let role = sampled_at(&container, &Locator::from_static(&["points", "role"])).unwrap();
        assert_eq!(role.typed_value::<Token>(0.0), "point");
        let interp =
            sampled_at(&container, &Locator::from_static(&["st", "interpolation"])).unwrap();
        assert_eq!(interp.typed_value::<Token>(0.0), "faceVarying");

        let indices = sampled_at(&container, &Locator::from_static(&["st", "indices"])).unwrap();
        assert_eq!(&indices.typed_value::<Array<i32>>(0.0)[..], &[0, 0, 0]);
        assert!(sampled_at(&container, &Locator::from_static(&["st", "primvarValue"])).is_none());
        assert!(container.get(&Token::new("missing")).is_none());
    }
}

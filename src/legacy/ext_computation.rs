//! `extComputation` container of a legacy ext computation prim.

use crate::core::{
    ContainerDataSource, DataSourceHandle, RetainedContainer, RetainedTypedSampled, Value,
};
use crate::legacy::params::LazyTypedSampled;
use crate::legacy::primvar::LegacyExtComputationInput;
use crate::legacy::DelegateHandle;
use crate::scene::tokens::ext_computation;
use crate::util::{Path, Token};

/// Read a count input; integer inputs of either width are accepted.
fn count_input(delegate: &DelegateHandle, id: &Path, input: &Token) -> i64 {
    match delegate.ext_computation_input(id, input) {
        Value::Int64(n) => n,
        Value::Int(n) => i64::from(n),
        other => {
            if !other.is_empty() {
                tracing::debug!(
                    target: "scene_index::legacy",
                    computation = %id,
                    %input,
                    found = other.type_name(),
                    "ext computation count is not an integer"
                );
            }
            0
        }
    }
}

/// Ext computation description pulled from the delegate.
pub struct LegacyExtComputationContainer {
    delegate: DelegateHandle,
    id: Path,
}

impl LegacyExtComputationContainer {
    pub fn new(delegate: DelegateHandle, id: Path) -> Self {
        Self { delegate, id }
    }

    fn input_values(&self) -> DataSourceHandle {
        let names = self.delegate.ext_computation_scene_input_names(&self.id);
        RetainedContainer::handle(names.into_iter().map(|name| {
            let source = LegacyExtComputationInput::new(
                self.delegate.clone(),
                self.id.clone(),
                name.clone(),
            );
            (name, Some(DataSourceHandle::sampled(source)))
        }))
    }

    fn input_computations(&self) -> DataSourceHandle {
        let descriptors = self.delegate.ext_computation_input_descriptors(&self.id);
        RetainedContainer::handle(descriptors.into_iter().map(|desc| {
            let entry = RetainedContainer::handle([
                (
                    ext_computation::SOURCE_COMPUTATION,
                    Some(RetainedTypedSampled::handle(desc.source_computation_id)),
                ),
                (
                    ext_computation::SOURCE_COMPUTATION_OUTPUT_NAME,
                    Some(RetainedTypedSampled::handle(
                        desc.source_computation_output_name,
                    )),
                ),
            ]);
            (desc.name, Some(entry))
        }))
    }

    fn outputs(&self) -> DataSourceHandle {
        let descriptors = self.delegate.ext_computation_output_descriptors(&self.id);
        RetainedContainer::handle(descriptors.into_iter().map(|desc| {
            let entry = RetainedContainer::handle([(
                ext_computation::VALUE_TYPE,
                Some(RetainedTypedSampled::handle(desc.value_type)),
            )]);
            (desc.name, Some(entry))
        }))
    }

    fn count(&self, input: Token) -> DataSourceHandle {
        let (delegate, id) = (self.delegate.clone(), self.id.clone());
        LazyTypedSampled::handle(move || count_input(&delegate, &id, &input))
    }
}

impl ContainerDataSource for LegacyExtComputationContainer {
    fn names(&self) -> Vec<Token> {
        vec![
            ext_computation::INPUT_VALUES,
            ext_computation::INPUT_COMPUTATIONS,
            ext_computation::OUTPUTS,
            ext_computation::GLSL_KERNEL,
            ext_computation::DISPATCH_COUNT,
            ext_computation::ELEMENT_COUNT,
        ]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let handle = match name.as_str() {
            "inputValues" => self.input_values(),
            "inputComputations" => self.input_computations(),
            "outputs" => self.outputs(),
            "glslKernel" => {
                let (delegate, id) = (self.delegate.clone(), self.id.clone());
                LazyTypedSampled::handle(move || delegate.ext_computation_kernel(&id))
            }
            "dispatchCount" | "elementCount" => self.count(name.clone()),
            _ => return None,
        };
        Some(handle)
    }
}

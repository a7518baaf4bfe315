//! Instancer topology and instance categories of legacy instancers.

use std::sync::Arc;

use crate::core::{
    Array, ContainerDataSource, DataSourceHandle, RetainedContainer, RetainedTypedSampled,
    SnapshotCell, VectorDataSource,
};
use crate::legacy::params::LazyTypedSampled;
use crate::legacy::DelegateHandle;
use crate::scene::tokens::{instancer, schema};
use crate::util::{Path, Token};

/// `instancerTopology` container.
///
/// Prototypes are fetched once per container; instance indices are
/// fetched per prototype on access.
pub struct LegacyInstancerTopologyContainer {
    delegate: DelegateHandle,
    id: Path,
    prototypes: SnapshotCell<Array<Path>>,
}

impl LegacyInstancerTopologyContainer {
    pub fn new(delegate: DelegateHandle, id: Path) -> Self {
        Self {
            delegate,
            id,
            prototypes: SnapshotCell::new(),
        }
    }

    fn prototypes(&self) -> Arc<Array<Path>> {
        self.prototypes
            .get_or_build(|| Array::new(self.delegate.instancer_prototypes(&self.id)))
    }
}

impl ContainerDataSource for LegacyInstancerTopologyContainer {
    fn names(&self) -> Vec<Token> {
        vec![
            instancer::PROTOTYPES,
            instancer::INSTANCE_INDICES,
            instancer::IS_LEGACY_INSTANCER,
        ]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        match name.as_str() {
            "prototypes" => Some(RetainedTypedSampled::handle((*self.prototypes()).clone())),
            "instanceIndices" => Some(DataSourceHandle::vector(InstanceIndicesVector {
                delegate: self.delegate.clone(),
                id: self.id.clone(),
                prototypes: self.prototypes(),
            })),
            "isLegacyInstancer" => Some(RetainedTypedSampled::handle(true)),
            _ => None,
        }
    }
}

/// Instance indices, one element per prototype.
struct InstanceIndicesVector {
    delegate: DelegateHandle,
    id: Path,
    prototypes: Arc<Array<Path>>,
}

impl VectorDataSource for InstanceIndicesVector {
    fn num_elements(&self) -> usize {
        self.prototypes.len()
    }

    fn element(&self, index: usize) -> Option<DataSourceHandle> {
        let prototype = self.prototypes.get(index)?.clone();
        let (delegate, id) = (self.delegate.clone(), self.id.clone());
        Some(LazyTypedSampled::handle(move || {
            delegate.instance_indices(&id, &prototype)
        }))
    }
}

/// `instanceCategories` container: `categoriesValues` holds one
/// `{includedCategoryNames}` container per instance.
pub struct LegacyInstanceCategoriesContainer {
    delegate: DelegateHandle,
    id: Path,
}

impl LegacyInstanceCategoriesContainer {
    pub fn new(delegate: DelegateHandle, id: Path) -> Self {
        Self { delegate, id }
    }
}

impl ContainerDataSource for LegacyInstanceCategoriesContainer {
    fn names(&self) -> Vec<Token> {
        vec![instancer::CATEGORIES_VALUES]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        (*name == instancer::CATEGORIES_VALUES).then(|| {
            DataSourceHandle::vector(InstanceCategoriesVector {
                delegate: self.delegate.clone(),
                id: self.id.clone(),
                values: SnapshotCell::new(),
            })
        })
    }
}

struct InstanceCategoriesVector {
    delegate: DelegateHandle,
    id: Path,
    values: SnapshotCell<Vec<Vec<Token>>>,
}

impl InstanceCategoriesVector {
    fn values(&self) -> Arc<Vec<Vec<Token>>> {
        self.values
            .get_or_build(|| self.delegate.instance_categories(&self.id))
    }
}

impl VectorDataSource for InstanceCategoriesVector {
    fn num_elements(&self) -> usize {
        self.values().len()
    }

    fn element(&self, index: usize) -> Option<DataSourceHandle> {
        let values = self.values();
        let categories = values.get(index)?;
        Some(categories_container(categories.clone()))
    }
}

/// `{includedCategoryNames}` container.
pub fn categories_container(categories: Vec<Token>) -> DataSourceHandle {
    RetainedContainer::handle([(
        schema::INCLUDED_CATEGORY_NAMES,
        Some(RetainedTypedSampled::handle(Array::new(categories))),
    )])
}

//! `light` and `collections` containers of legacy lights and light filters.

use crate::core::{
    create_typed_retained, ContainerDataSource, DataSourceHandle, RetainedContainer,
    RetainedSampled, RetainedTypedSampled, Value,
};
use crate::legacy::DelegateHandle;
use crate::scene::tokens::{light, schema};
use crate::util::{Path, Token};

/// Light parameters.
///
/// `params`, `shadowParams` and `shadowCollection` come through the
/// generic `get` as untyped values; everything else through
/// `light_param_value` with a typed wrapper.
pub struct LegacyLightContainer {
    delegate: DelegateHandle,
    id: Path,
}

impl LegacyLightContainer {
    pub fn new(delegate: DelegateHandle, id: Path) -> Self {
        Self { delegate, id }
    }

    fn uses_get(name: &Token) -> bool {
        *name == light::PARAMS || *name == light::SHADOW_PARAMS || *name == light::SHADOW_COLLECTION
    }
}

impl ContainerDataSource for LegacyLightContainer {
    fn names(&self) -> Vec<Token> {
        vec![
            light::FILTERS,
            light::LIGHT_LINK,
            light::SHADOW_LINK,
            light::LIGHT_FILTER_LINK,
            light::IS_LIGHT,
            light::MATERIAL_SYNC_MODE,
            light::PORTALS,
        ]
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        if Self::uses_get(name) {
            let value = self.delegate.get(&self.id, name);
            return Some(DataSourceHandle::sampled(RetainedSampled::new(value)));
        }
        Some(create_typed_retained(
            self.delegate.light_param_value(&self.id, name),
        ))
    }
}

/// Collection container whose membership expression comes from a light
/// parameter. `None` unless the parameter holds a string.
fn collection_from_param(
    delegate: &DelegateHandle,
    id: &Path,
    expression_param: &Token,
) -> Option<DataSourceHandle> {
    match delegate.light_param_value(id, expression_param) {
        Value::String(expression) => Some(RetainedContainer::handle([(
            schema::MEMBERSHIP_EXPRESSION,
            Some(RetainedTypedSampled::handle(expression)),
        )])),
        _ => None,
    }
}

/// `collections` of a light or light filter.
///
/// Linking expressions authored as light parameters are promoted to
/// collections so downstream linking sees one representation.
pub struct LegacyLightCollections {
    delegate: DelegateHandle,
    id: Path,
    is_filter: bool,
}

impl LegacyLightCollections {
    /// Collections of a light: `lightLink`, `shadowLink`.
    pub fn light(delegate: DelegateHandle, id: Path) -> Self {
        Self {
            delegate,
            id,
            is_filter: false,
        }
    }

    /// Collections of a light filter: `filterLink`.
    pub fn filter(delegate: DelegateHandle, id: Path) -> Self {
        Self {
            delegate,
            id,
            is_filter: true,
        }
    }
}

impl ContainerDataSource for LegacyLightCollections {
    fn names(&self) -> Vec<Token> {
        if self.is_filter {
            vec![light::FILTER_LINK]
        } else {
            vec![light::LIGHT_LINK, light::SHADOW_LINK]
        }
    }

    fn get(&self, name: &Token) -> Option<DataSourceHandle> {
        let param = match (self.is_filter, name.as_str()) {
            (false, "lightLink") => light::LIGHT_LINK_MEMBERSHIP,
            (false, "shadowLink") => light::SHADOW_LINK_MEMBERSHIP,
            (true, "filterLink") => light::FILTER_LINK_MEMBERSHIP,
            _ => return None,
        };
        collection_from_param(&self.delegate, &self.id, &param)
    }
}

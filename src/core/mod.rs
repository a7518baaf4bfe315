//! Core layer - data sources and fundamental value types.
//!
//! This module provides:
//! - [`Value`] / [`ValueType`] - Runtime values and typed extraction
//! - [`Locator`] / [`LocatorSet`] - Addresses of nested data
//! - [`DataSourceHandle`] and the data source capability traits
//! - Retained and overlay data sources
//! - [`TimeSampleArray`] - Time-sampled values with interpolation
//! - [`SnapshotCell`] - Atomically swapped cached snapshots

mod cache;
mod data_source;
mod locator;
mod overlay;
mod retained;
mod time_samples;
mod value;

pub use cache::SnapshotCell;
pub use data_source::{
    container_at, container_get, debug_print, merged_contributing_sample_times, sampled_at,
    to_json, ContainerDataSource, ContainerHandle, DataSourceHandle, SampledDataSource,
    SampledHandle, Time, TypedHandle, TypedSampledDataSource, VectorDataSource, VectorHandle,
};
pub use locator::{Locator, LocatorSet};
pub use overlay::OverlayContainer;
pub use retained::{
    create_typed_retained, nested_container, RetainedContainer, RetainedSampled,
    RetainedTypedMultisampled, RetainedTypedSampled, RetainedVector,
};
pub use time_samples::{contributing_times, IndexedTimeSampleArray, Interpolate, TimeSampleArray};
pub use value::{AnyValue, Array, Dictionary, Value, ValueType};

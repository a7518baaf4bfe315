//! Utility types and functions.
//!
//! This module contains fundamental types used throughout the library:
//! - [`Token`] - Cheap-to-clone names
//! - [`Path`] - Absolute prim and property paths
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam
//! - [`init_tracing`] - Logging setup

mod error;
mod logging;
mod math;
mod path;
mod token;

pub use error::*;
pub use logging::*;
pub use math::*;
pub use path::*;
pub use token::*;

//! Lazy, tile-by-tile reprojection of chunked rasters.
//!
//! A chunked source array is described by a [`graph::LazyArray`]; [`reproject`]
//! turns it into a new lazy array on a destination [`GeoBox`] whose blocks are
//! either resampled from a dense crop of the source or filled with a constant.

pub mod affine;
pub mod chunk;
pub mod config;
pub mod crs;
pub mod element;
pub mod error;
pub mod geobox;
pub mod graph;
pub mod resample;
pub mod warp;

#[cfg(feature = "python")]
mod py;

pub use affine::Affine;
pub use config::ReprojectOptions;
pub use crs::Crs;
pub use element::Element;
pub use error::{ConfigError, GraphError, PlanError, ProjError, TaskError, WarpError};
pub use geobox::{GeoBox, Window};
pub use graph::LazyArray;
pub use resample::ResamplingMethod;
pub use warp::{reproject, reproject_block, reproject_labeled, LabeledArray};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// A Python module implemented in Rust.
#[cfg(feature = "python")]
#[pymodule]
fn _rust(m: &Bound<'_, PyModule>) -> PyResult<()> {
    py::register(m)?;
    Ok(())
}

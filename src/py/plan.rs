//! PyO3 binding for plan_reproject.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::chunk::plan_tiles;
use crate::crs::Crs;
use crate::geobox::{GeoBox, Window};
use crate::resample::ResamplingMethod;

use super::reproject::affine_from_tuple;

/// Plan the tiles of a reprojection without reading any pixels.
///
/// Args:
///     src_crs: Source CRS string (e.g. "EPSG:32633").
///     src_transform: Source affine transform as 6-element tuple.
///     src_shape: Source raster shape as (rows, cols).
///     dst_crs: Destination CRS string.
///     dst_transform: Destination affine transform as 6-element tuple.
///     dst_shape: Destination raster shape as (rows, cols).
///     dst_chunks: Optional tile size as (rows, cols). Defaults to full image.
///     resampling: Resampling method name, sets the source halo.
///
/// Returns:
///     List of tile plan dicts, each with keys:
///     - tile: (row, col) index in the tile grid
///     - dst_slice: (row_start, row_end, col_start, col_end)
///     - src_slice: (row_start, row_end, col_start, col_end)
///     - src_transform: (a, b, c, d, e, f) shifted to src_slice origin
///     - dst_transform: (a, b, c, d, e, f) shifted to dst_slice origin
///     - has_data: bool
#[pyfunction]
#[pyo3(signature = (src_crs, src_transform, src_shape, dst_crs, dst_transform, dst_shape, dst_chunks=None, resampling="nearest"))]
#[allow(clippy::too_many_arguments)]
pub fn plan_reproject(
    py: Python<'_>,
    src_crs: &str,
    src_transform: (f64, f64, f64, f64, f64, f64),
    src_shape: (usize, usize),
    dst_crs: &str,
    dst_transform: (f64, f64, f64, f64, f64, f64),
    dst_shape: (usize, usize),
    dst_chunks: Option<(usize, usize)>,
    resampling: &str,
) -> PyResult<Vec<PyObject>> {
    let method = ResamplingMethod::from_name(resampling)
        .ok_or_else(|| PyValueError::new_err(format!("Unknown resampling method: '{resampling}'")))?;
    let padding = method.halo();

    let src = GeoBox::new(src_shape, affine_from_tuple(src_transform), Crs::new(src_crs));
    let dst = GeoBox::new(dst_shape, affine_from_tuple(dst_transform), Crs::new(dst_crs));
    let tile_shape = dst_chunks.unwrap_or(dst_shape);

    let plans = py
        .allow_threads(move || plan_tiles(&src, &dst, tile_shape, padding))
        .map_err(|e| PyValueError::new_err(e.to_string()))?;

    plans
        .iter()
        .map(|plan| -> PyResult<PyObject> {
            let dict = PyDict::new(py);
            dict.set_item("tile", plan.tile)?;
            dict.set_item("dst_slice", slice_tuple(&plan.dst_window))?;
            dict.set_item("src_slice", slice_tuple(&plan.src_window))?;
            dict.set_item("src_transform", plan.src_geobox.affine.to_tuple())?;
            dict.set_item("dst_transform", plan.dst_geobox.affine.to_tuple())?;
            dict.set_item("has_data", plan.has_data)?;
            Ok(dict.into_any().unbind())
        })
        .collect()
}

fn slice_tuple(w: &Window) -> (usize, usize, usize, usize) {
    (w.rows.start, w.rows.end, w.cols.start, w.cols.end)
}

//! PyO3 binding for reproject_chunked.

use ndarray::ArrayD;
use numpy::{PyArrayDyn, PyReadonlyArrayDyn};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::affine::Affine;
use crate::config::ReprojectOptions;
use crate::crs::Crs;
use crate::geobox::GeoBox;
use crate::graph::LazyArray;
use crate::resample::ResamplingMethod;
use crate::warp::tiled;

/// Reproject an f64 array tile by tile.
///
/// The array is split into blocks of `chunks` along its row/col axes (one
/// block per index along leading axes), the tiled reprojection graph is built
/// and evaluated in parallel.
///
/// Args:
///     src: Input array shaped (..., rows, cols) with the row axis at `axis`.
///     src_crs: Source CRS string (e.g. "EPSG:32633").
///     src_transform: Source affine transform as 6-element tuple (a, b, c, d, e, f).
///     dst_crs: Destination CRS string.
///     dst_transform: Destination affine transform as 6-element tuple.
///     dst_shape: Output grid shape as (rows, cols).
///     chunks: Tile size as (rows, cols). Defaults to the full grid.
///     resampling: Resampling method name.
///     src_nodata: Optional source nodata value.
///     dst_nodata: Optional output nodata value, defaults to `src_nodata`.
///     axis: Index of the row axis.
///
/// Returns:
///     Reprojected array shaped (..., dst_rows, dst_cols).
#[pyfunction]
#[pyo3(signature = (src, src_crs, src_transform, dst_crs, dst_transform, dst_shape, chunks=None, resampling="nearest", src_nodata=None, dst_nodata=None, axis=0))]
#[allow(clippy::too_many_arguments)]
pub fn reproject_chunked<'py>(
    py: Python<'py>,
    src: PyReadonlyArrayDyn<'py, f64>,
    src_crs: &str,
    src_transform: (f64, f64, f64, f64, f64, f64),
    dst_crs: &str,
    dst_transform: (f64, f64, f64, f64, f64, f64),
    dst_shape: (usize, usize),
    chunks: Option<(usize, usize)>,
    resampling: &str,
    src_nodata: Option<f64>,
    dst_nodata: Option<f64>,
    axis: usize,
) -> PyResult<Bound<'py, PyArrayDyn<f64>>> {
    let method = ResamplingMethod::from_name(resampling)
        .ok_or_else(|| PyValueError::new_err(format!("Unknown resampling method: {resampling}")))?;

    let src_array: ArrayD<f64> = src.as_array().to_owned();
    let shape = src_array.shape().to_vec();
    if shape.len() < axis + 2 {
        return Err(PyValueError::new_err(format!(
            "array of {} dimensions has no row/col axes at {axis}",
            shape.len()
        )));
    }

    let src_geobox = GeoBox::new(
        (shape[axis], shape[axis + 1]),
        affine_from_tuple(src_transform),
        Crs::new(src_crs),
    );
    let dst_geobox = GeoBox::new(dst_shape, affine_from_tuple(dst_transform), Crs::new(dst_crs));

    let mut options = ReprojectOptions::default()
        .with_resampling(method)
        .with_axis(axis);
    options.chunks = chunks;
    options.src_nodata = src_nodata;
    options.dst_nodata = dst_nodata;

    let result: ArrayD<f64> = py.allow_threads(move || {
        let mut chunk_shape = vec![1; shape.len()];
        let (tile_rows, tile_cols) = chunks.unwrap_or(src_geobox.shape);
        chunk_shape[axis] = tile_rows.max(1);
        chunk_shape[axis + 1] = tile_cols.max(1);

        let lazy = LazyArray::from_array(src_array, &chunk_shape)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        let out = tiled::reproject(&lazy, &src_geobox, &dst_geobox, &options)
            .map_err(|e| PyValueError::new_err(e.to_string()))?;
        out.compute()
            .map_err(|e| PyValueError::new_err(e.to_string()))
    })?;

    Ok(PyArrayDyn::from_owned_array(py, result))
}

pub(crate) fn affine_from_tuple(t: (f64, f64, f64, f64, f64, f64)) -> Affine {
    Affine::new(t.0, t.1, t.2, t.3, t.4, t.5)
}

//! Inverse-mapping warp engine.
//!
//! For each output pixel, projects the pixel centre back to the source CRS and
//! samples the source array there. Projection is exact per pixel.

use ndarray::{Array2, ArrayView2};

use crate::affine::Affine;
use crate::crs::CrsTransform;
use crate::element::Element;
use crate::error::WarpError;
use crate::resample::{self, ResamplingMethod};

/// Reproject a 2D array onto a destination grid.
///
/// # Arguments
/// * `src` - source raster data
/// * `src_affine` - source geotransform (pixel → source CRS coordinates)
/// * `dst_affine` - destination geotransform (pixel → destination CRS coordinates)
/// * `dst_shape` - (rows, cols) of the output array
/// * `transform` - CRS transform in the dst → src direction
/// * `method` - resampling method
/// * `nodata` - optional source nodata sentinel
/// * `fill` - value for output pixels with no valid source sample
#[allow(clippy::too_many_arguments)]
pub fn warp<T: Element>(
    src: &ArrayView2<'_, T>,
    src_affine: &Affine,
    dst_affine: &Affine,
    dst_shape: (usize, usize),
    transform: &CrsTransform,
    method: ResamplingMethod,
    nodata: Option<T>,
    fill: T,
) -> Result<Array2<T>, WarpError> {
    let src_inv = src_affine.inverse()?;
    let mut dst = Array2::from_elem(dst_shape, fill);
    if src.is_empty() {
        return Ok(dst);
    }

    let to_src_pixel = |col: f64, row: f64| -> Option<(f64, f64)> {
        let (x, y) = dst_affine.forward(col, row);
        let (sx, sy) = transform.transform(x, y).ok()?;
        let (c, r) = src_inv.forward(sx, sy);
        (c.is_finite() && r.is_finite()).then_some((c, r))
    };

    let scale = if method.uses_footprint() {
        local_scale(&to_src_pixel, dst_shape)
    } else {
        (1.0, 1.0)
    };

    let (rows, cols) = dst_shape;
    for row in 0..rows {
        for col in 0..cols {
            // Out-of-range projection leaves the fill value.
            let Some((src_col, src_row)) = to_src_pixel(col as f64 + 0.5, row as f64 + 0.5)
            else {
                continue;
            };
            if let Some(v) = resample::sample(method, src, src_col, src_row, nodata, scale) {
                dst[(row, col)] = v;
            }
        }
    }

    Ok(dst)
}

/// Size of one destination pixel in source pixels, measured at the grid centre.
fn local_scale<F>(to_src_pixel: &F, dst_shape: (usize, usize)) -> (f64, f64)
where
    F: Fn(f64, f64) -> Option<(f64, f64)>,
{
    let cx = dst_shape.1 as f64 / 2.0;
    let cy = dst_shape.0 as f64 / 2.0;
    let estimate = || {
        let origin = to_src_pixel(cx, cy)?;
        let right = to_src_pixel(cx + 1.0, cy)?;
        let down = to_src_pixel(cx, cy + 1.0)?;
        let sx = (right.0 - origin.0).hypot(right.1 - origin.1);
        let sy = (down.0 - origin.0).hypot(down.1 - origin.1);
        (sx.is_finite() && sy.is_finite() && sx > 0.0 && sy > 0.0).then_some((sx, sy))
    };
    estimate().unwrap_or((1.0, 1.0))
}

//! Nearest-neighbor resampling kernel.

use ndarray::ArrayView2;
use num_traits::NumCast;

use super::pixel;

/// Sample a 2D array using nearest-neighbor interpolation.
///
/// The containing pixel is `floor()` of the corner-based coordinate. Only the
/// explicit `nodata` sentinel is rejected; NaN values are passed through.
pub fn sample<T>(src: &ArrayView2<'_, T>, x: f64, y: f64, nodata: Option<T>) -> Option<T>
where
    T: Copy + NumCast + PartialEq,
{
    let val = pixel(src, y.floor() as isize, x.floor() as isize)?;
    match nodata {
        Some(nd) if val == nd => None,
        _ => Some(val),
    }
}

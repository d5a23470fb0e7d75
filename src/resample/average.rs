//! Area-weighted average over the destination pixel's footprint.

use ndarray::ArrayView2;
use num_traits::NumCast;

use super::{footprint_range, is_nodata_value, overlap};

/// Weighted mean of the source pixels under a footprint of half-width
/// `max(scale / 2, 0.5)` centred on (x, y).
///
/// Nodata and NaN pixels are skipped; `None` only when nothing valid remains.
pub fn sample<T>(
    src: &ArrayView2<'_, T>,
    x: f64,
    y: f64,
    nodata: Option<T>,
    scale: (f64, f64),
) -> Option<T>
where
    T: Copy + NumCast + PartialEq,
{
    let hx = (scale.0 / 2.0).max(0.5);
    let hy = (scale.1 / 2.0).max(0.5);
    let cols = footprint_range(x, hx, src.ncols());
    let rows = footprint_range(y, hy, src.nrows());

    let mut sum = 0.0_f64;
    let mut weight = 0.0_f64;
    for r in rows {
        let wy = overlap(r, y, hy);
        for c in cols.clone() {
            let val = src[(r as usize, c as usize)];
            if is_nodata_value(val, nodata) {
                continue;
            }
            let w = wy * overlap(c, x, hx);
            let v: f64 = NumCast::from(val)?;
            sum += w * v;
            weight += w;
        }
    }

    if weight < 1e-15 {
        return None;
    }
    NumCast::from(sum / weight)
}

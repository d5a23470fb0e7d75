//! Order statistics over the destination pixel's footprint: mode, min, max
//! and quantiles (median, q1, q3).
//!
//! Every source pixel that overlaps the footprint counts once, regardless of
//! how much of it is covered. Nodata and NaN pixels are skipped.

use ndarray::ArrayView2;
use num_traits::NumCast;

use super::{footprint_range, is_nodata_value, overlap};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Statistic {
    Mode,
    Min,
    Max,
    /// Value at rank `round((n - 1) * q)` of the sorted samples.
    Quantile(f64),
}

pub fn sample<T>(
    src: &ArrayView2<'_, T>,
    x: f64,
    y: f64,
    nodata: Option<T>,
    scale: (f64, f64),
    stat: Statistic,
) -> Option<T>
where
    T: Copy + NumCast + PartialEq,
{
    let mut values = collect(src, x, y, nodata, scale);
    if values.is_empty() {
        return None;
    }

    match stat {
        Statistic::Mode => mode(&values),
        Statistic::Min => values
            .iter()
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|v| v.1),
        Statistic::Max => values
            .iter()
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|v| v.1),
        Statistic::Quantile(q) => {
            values.sort_by(|a, b| a.0.total_cmp(&b.0));
            let rank = ((values.len() - 1) as f64 * q.clamp(0.0, 1.0)).round() as usize;
            values.get(rank).map(|v| v.1)
        }
    }
}

/// Valid pixels under the footprint, paired with their f64 value for ordering.
fn collect<T>(
    src: &ArrayView2<'_, T>,
    x: f64,
    y: f64,
    nodata: Option<T>,
    scale: (f64, f64),
) -> Vec<(f64, T)>
where
    T: Copy + NumCast + PartialEq,
{
    let hx = (scale.0 / 2.0).max(0.5);
    let hy = (scale.1 / 2.0).max(0.5);
    let cols = footprint_range(x, hx, src.ncols());
    let rows = footprint_range(y, hy, src.nrows());

    let mut out = Vec::with_capacity(rows.len() * cols.len());
    for r in rows.filter(|&r| overlap(r, y, hy) > 0.0) {
        for c in cols.clone().filter(|&c| overlap(c, x, hx) > 0.0) {
            let val = src[(r as usize, c as usize)];
            if is_nodata_value(val, nodata) {
                continue;
            }
            if let Some(v) = NumCast::from(val) {
                out.push((v, val));
            }
        }
    }
    out
}

/// Most frequent value; ties go to the one seen first in row-major order.
fn mode<T: Copy + PartialEq>(values: &[(f64, T)]) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for &(_, v) in values {
        match counts.iter_mut().find(|(seen, _)| *seen == v) {
            Some(entry) => entry.1 += 1,
            None => counts.push((v, 1)),
        }
    }
    let best = counts.iter().map(|&(_, n)| n).max()?;
    counts.into_iter().find(|&(_, n)| n == best).map(|(v, _)| v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn block() -> Array2<f64> {
        array![
            [1.0, 2.0, 2.0, 9.0],
            [3.0, 2.0, 7.0, 9.0],
            [4.0, 5.0, 6.0, 9.0],
            [8.0, 8.0, 8.0, 9.0],
        ]
    }

    #[test]
    fn test_mode() {
        let arr = block();
        // 3x3 footprint over the top-left corner.
        let val = sample(&arr.view(), 1.5, 1.5, None, (3.0, 3.0), Statistic::Mode);
        assert_eq!(val, Some(2.0));
    }

    #[test]
    fn test_mode_tie_prefers_first_seen() {
        let arr = array![[5.0, 3.0], [3.0, 5.0]];
        let val = sample(&arr.view(), 1.0, 1.0, None, (2.0, 2.0), Statistic::Mode);
        assert_eq!(val, Some(5.0));
    }

    #[test]
    fn test_min_max() {
        let arr = block();
        let v = arr.view();
        assert_eq!(sample(&v, 1.0, 1.0, None, (2.0, 2.0), Statistic::Min), Some(1.0));
        assert_eq!(sample(&v, 1.0, 1.0, None, (2.0, 2.0), Statistic::Max), Some(3.0));
        assert_eq!(sample(&v, 2.0, 2.0, None, (4.0, 4.0), Statistic::Max), Some(9.0));
    }

    #[test]
    fn test_quantiles() {
        let arr = block();
        let v = arr.view();
        // Sorted 3x3: 1 2 2 2 3 4 5 6 7
        let at = |q| sample(&v, 1.5, 1.5, None, (3.0, 3.0), Statistic::Quantile(q));
        assert_eq!(at(0.5), Some(3.0));
        assert_eq!(at(0.25), Some(2.0));
        assert_eq!(at(0.75), Some(5.0));
    }

    #[test]
    fn test_unit_scale_is_nearest() {
        let arr = block();
        let val = sample(&arr.view(), 2.5, 1.5, None, (1.0, 1.0), Statistic::Quantile(0.5));
        assert_eq!(val, Some(7.0));
    }

    #[test]
    fn test_skips_invalid() {
        let arr = array![[-1.0, f64::NAN], [4.0, -1.0]];
        let v = arr.view();
        assert_eq!(sample(&v, 1.0, 1.0, Some(-1.0), (2.0, 2.0), Statistic::Min), Some(4.0));

        let empty = Array2::from_elem((2, 2), -1.0);
        assert_eq!(
            sample(&empty.view(), 1.0, 1.0, Some(-1.0), (2.0, 2.0), Statistic::Mode),
            None
        );
    }

    #[test]
    fn test_integer_type() {
        let arr = array![[1u8, 1], [2, 200]];
        let v = arr.view();
        assert_eq!(sample(&v, 1.0, 1.0, None, (2.0, 2.0), Statistic::Mode), Some(1));
        assert_eq!(sample(&v, 1.0, 1.0, None, (2.0, 2.0), Statistic::Max), Some(200));
    }
}

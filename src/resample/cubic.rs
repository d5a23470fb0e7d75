//! Cubic convolution resampling kernel (Keys, a = -0.5) over a 4×4 neighbourhood.

use ndarray::ArrayView2;
use num_traits::NumCast;

use super::{is_nodata_value, pixel};

const A: f64 = -0.5;

fn keys(t: f64) -> f64 {
    let t = t.abs();
    if t <= 1.0 {
        ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0
    } else if t <= 2.0 {
        ((A * t - 5.0 * A) * t + 8.0 * A) * t - 4.0 * A
    } else {
        0.0
    }
}

/// Weights for taps at offsets -1..=2 from the anchor pixel.
fn weights(frac: f64) -> [f64; 4] {
    [keys(frac + 1.0), keys(frac), keys(frac - 1.0), keys(frac - 2.0)]
}

/// Sample a 2D array using cubic convolution.
///
/// Returns `None` if any of the 16 taps is out of bounds, nodata or NaN.
pub fn sample<T>(src: &ArrayView2<'_, T>, x: f64, y: f64, nodata: Option<T>) -> Option<T>
where
    T: Copy + NumCast + PartialEq,
{
    let cx = x - 0.5;
    let cy = y - 0.5;
    let col = cx.floor() as isize;
    let row = cy.floor() as isize;
    let wx = weights(cx - col as f64);
    let wy = weights(cy - row as f64);

    let mut acc = 0.0;
    for (j, wy) in wy.iter().enumerate() {
        let r = row + j as isize - 1;
        let mut line = 0.0;
        for (i, wx) in wx.iter().enumerate() {
            let val = pixel(src, r, col + i as isize - 1)?;
            if is_nodata_value(val, nodata) {
                return None;
            }
            let v: f64 = NumCast::from(val)?;
            line += wx * v;
        }
        acc += wy * line;
    }

    NumCast::from(acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;

    fn ramp(shape: (usize, usize)) -> Array2<f64> {
        Array2::from_shape_fn(shape, |(r, c)| (r * shape.1 + c) as f64)
    }

    #[test]
    fn test_kernel_shape() {
        assert_relative_eq!(keys(0.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(keys(1.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(keys(2.0), 0.0, epsilon = 1e-12);
        assert_relative_eq!(keys(0.7), keys(-0.7), epsilon = 1e-12);
        assert_eq!(keys(2.5), 0.0);
    }

    #[test]
    fn test_weights_sum_to_one() {
        for frac in [0.0, 0.25, 0.5, 0.75] {
            let sum: f64 = weights(frac).iter().sum();
            assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_pixel_center_exact() {
        let arr = ramp((6, 6));
        let val = sample(&arr.view(), 3.5, 3.5, None).unwrap();
        assert_relative_eq!(val, arr[(3, 3)], epsilon = 1e-10);
    }

    #[test]
    fn test_linear_ramp_preserved() {
        let arr = Array2::from_shape_fn((8, 8), |(_, c)| c as f64);
        let view = arr.view();
        assert_relative_eq!(sample(&view, 3.75, 3.5, None).unwrap(), 3.25, epsilon = 1e-10);
        assert_relative_eq!(sample(&view, 4.0, 3.5, None).unwrap(), 3.5, epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_taps() {
        let mut arr = Array2::from_elem((6, 6), 1.0_f64);
        arr[(3, 3)] = f64::NAN;
        assert!(sample::<f64>(&arr.view(), 3.5, 3.5, None).is_none());

        arr[(3, 3)] = -9999.0;
        assert!(sample(&arr.view(), 3.5, 3.5, Some(-9999.0)).is_none());
        assert!(sample(&arr.view(), 3.5, 3.5, None).is_some());
    }

    #[test]
    fn test_small_source_out_of_bounds() {
        let arr = ramp((4, 4));
        assert!(sample::<f64>(&arr.view(), 0.5, 0.5, None).is_none());
        assert!(sample::<f64>(&arr.view(), 2.5, 2.5, None).is_none());
    }

    #[test]
    fn test_integer_type() {
        let arr = Array2::from_shape_fn((6, 6), |(r, c)| (r * 6 + c) as i32);
        assert_eq!(sample(&arr.view(), 3.5, 3.5, None::<i32>), Some(21));
    }
}

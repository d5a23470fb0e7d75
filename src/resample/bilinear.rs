//! Bilinear interpolation resampling kernel.

use ndarray::ArrayView2;
use num_traits::NumCast;

use super::{is_nodata_value, pixel};

/// Sample a 2D array using bilinear interpolation.
///
/// The corner-based coordinate is shifted by half a pixel onto pixel centres
/// and the 2×2 neighbourhood is weighted by distance. Any neighbour that is
/// out of bounds, nodata or NaN makes the sample invalid.
pub fn sample<T>(src: &ArrayView2<'_, T>, x: f64, y: f64, nodata: Option<T>) -> Option<T>
where
    T: Copy + NumCast + PartialEq,
{
    let cx = x - 0.5;
    let cy = y - 0.5;
    let col = cx.floor() as isize;
    let row = cy.floor() as isize;

    let mut quad = [0.0_f64; 4];
    for (slot, (dr, dc)) in [(0, 0), (0, 1), (1, 0), (1, 1)].into_iter().enumerate() {
        let val = pixel(src, row + dr, col + dc)?;
        if is_nodata_value(val, nodata) {
            return None;
        }
        quad[slot] = NumCast::from(val)?;
    }

    let dx = cx - col as f64;
    let dy = cy - row as f64;
    let top = quad[0] + (quad[1] - quad[0]) * dx;
    let bottom = quad[2] + (quad[3] - quad[2]) * dx;
    NumCast::from(top + (bottom - top) * dy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    #[test]
    fn test_pixel_center_exact() {
        let arr = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let val = sample(&arr.view(), 1.5, 1.5, None).unwrap();
        assert_relative_eq!(val, 5.0, epsilon = 1e-10);
    }

    #[test]
    fn test_midpoint() {
        let arr = array![[0.0, 10.0], [0.0, 10.0]];
        let val = sample(&arr.view(), 1.0, 0.5, None).unwrap();
        assert_relative_eq!(val, 5.0, epsilon = 1e-10);
    }

    #[test]
    fn test_edge_needs_full_neighbourhood() {
        let arr = array![[1.0, 2.0], [3.0, 4.0]];
        let view = arr.view();
        assert!(sample::<f64>(&view, 0.0, 0.5, None).is_none());
        assert!(sample::<f64>(&view, 2.0, 0.5, None).is_none());
    }

    #[test]
    fn test_nan_and_nodata_invalidate() {
        let arr = array![[1.0, f64::NAN], [3.0, 4.0]];
        assert!(sample::<f64>(&arr.view(), 1.0, 1.0, None).is_none());

        let arr = array![[-9999.0, 2.0], [3.0, 4.0]];
        assert!(sample(&arr.view(), 1.0, 1.0, Some(-9999.0)).is_none());
        assert!(sample(&arr.view(), 1.0, 1.0, None).unwrap() < 0.0);
    }

    #[test]
    fn test_plane_is_reproduced() {
        let plane = |c: f64, r: f64| 3.0 * c - 2.0 * r + 7.0;
        let arr = Array2::from_shape_fn((10, 10), |(r, c)| plane(c as f64, r as f64));
        let view = arr.view();

        for y in [1.5, 2.0, 3.25, 4.75, 7.5] {
            for x in [1.5, 2.0, 3.25, 4.75, 7.5] {
                let val = sample(&view, x, y, None).unwrap();
                assert_relative_eq!(val, plane(x - 0.5, y - 0.5), epsilon = 1e-10);
            }
        }
    }
}

use std::fmt::Debug;

use num_traits::{NumCast, Zero};

/// Pixel types a chunked array can hold.
pub trait Element:
    Copy + Debug + Send + Sync + NumCast + PartialEq + PartialOrd + Zero + 'static
{
}

impl<T> Element for T where
    T: Copy + Debug + Send + Sync + NumCast + PartialEq + PartialOrd + Zero + 'static
{
}

/// Convert an optional nodata marker to the element type.
///
/// Returns `Err(value)` when the marker does not fit, e.g. NaN for integers.
pub fn cast_nodata<T: Element>(nodata: Option<f64>) -> Result<Option<T>, f64> {
    match nodata {
        None => Ok(None),
        Some(v) => <T as NumCast>::from(v).map(Some).ok_or(v),
    }
}

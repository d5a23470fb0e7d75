//! Resampling kernels for the warp engine.
//!
//! Every kernel samples a 2-D source at a corner-based pixel coordinate
//! (pixel (0, 0) spans [0, 1) × [0, 1), its centre is (0.5, 0.5)) and returns
//! `None` where no valid value can be produced.

pub mod average;
pub mod bilinear;
pub mod cubic;
pub mod footprint;
pub mod nearest;

use std::fmt;

use ndarray::ArrayView2;
use num_traits::NumCast;
use serde::{Deserialize, Serialize};

/// Available resampling methods.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResamplingMethod {
    #[default]
    #[serde(alias = "near")]
    Nearest,
    Bilinear,
    Cubic,
    Average,
    Mode,
    Min,
    Max,
    #[serde(alias = "med")]
    Median,
    Q1,
    Q3,
}

impl ResamplingMethod {
    /// Parse from a string name (GDAL aliases `near` and `med` accepted).
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "nearest" | "near" => Some(Self::Nearest),
            "bilinear" => Some(Self::Bilinear),
            "cubic" => Some(Self::Cubic),
            "average" => Some(Self::Average),
            "mode" => Some(Self::Mode),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "median" | "med" => Some(Self::Median),
            "q1" => Some(Self::Q1),
            "q3" => Some(Self::Q3),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Bilinear => "bilinear",
            Self::Cubic => "cubic",
            Self::Average => "average",
            Self::Mode => "mode",
            Self::Min => "min",
            Self::Max => "max",
            Self::Median => "median",
            Self::Q1 => "q1",
            Self::Q3 => "q3",
        }
    }

    /// Kernel radius in pixels (how far from center the kernel reaches).
    pub fn kernel_radius(&self) -> f64 {
        match self {
            Self::Nearest => 0.5,
            Self::Bilinear => 1.0,
            Self::Cubic => 2.0,
            _ => 1.0,
        }
    }

    /// Source pixels a tile crop needs beyond its own footprint. Nearest reads
    /// a single pixel, so aligned grids can be cropped exactly.
    pub fn halo(&self) -> usize {
        match self {
            Self::Nearest => 0,
            _ => self.kernel_radius().ceil() as usize,
        }
    }

    /// Kernels that aggregate over the destination pixel's footprint and so
    /// need the source/destination pixel scale.
    pub fn uses_footprint(&self) -> bool {
        !matches!(self, Self::Nearest | Self::Bilinear | Self::Cubic)
    }
}

impl fmt::Display for ResamplingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sample `src` at corner-based (x, y) with `method`.
///
/// `scale` is the destination/source pixel size ratio, used by footprint kernels.
pub fn sample<T>(
    method: ResamplingMethod,
    src: &ArrayView2<'_, T>,
    x: f64,
    y: f64,
    nodata: Option<T>,
    scale: (f64, f64),
) -> Option<T>
where
    T: Copy + NumCast + PartialEq,
{
    use footprint::Statistic;

    match method {
        ResamplingMethod::Nearest => nearest::sample(src, x, y, nodata),
        ResamplingMethod::Bilinear => bilinear::sample(src, x, y, nodata),
        ResamplingMethod::Cubic => cubic::sample(src, x, y, nodata),
        ResamplingMethod::Average => average::sample(src, x, y, nodata, scale),
        ResamplingMethod::Mode => footprint::sample(src, x, y, nodata, scale, Statistic::Mode),
        ResamplingMethod::Min => footprint::sample(src, x, y, nodata, scale, Statistic::Min),
        ResamplingMethod::Max => footprint::sample(src, x, y, nodata, scale, Statistic::Max),
        ResamplingMethod::Median => {
            footprint::sample(src, x, y, nodata, scale, Statistic::Quantile(0.5))
        }
        ResamplingMethod::Q1 => {
            footprint::sample(src, x, y, nodata, scale, Statistic::Quantile(0.25))
        }
        ResamplingMethod::Q3 => {
            footprint::sample(src, x, y, nodata, scale, Statistic::Quantile(0.75))
        }
    }
}

/// True for the nodata sentinel and for NaN.
pub(crate) fn is_nodata_value<T>(val: T, nodata: Option<T>) -> bool
where
    T: Copy + NumCast + PartialEq,
{
    if nodata.is_some_and(|nd| val == nd) {
        return true;
    }
    let as_f64: Option<f64> = NumCast::from(val);
    as_f64.map_or(true, f64::is_nan)
}

/// Value at (row, col), `None` outside the array.
pub(crate) fn pixel<T: Copy>(src: &ArrayView2<'_, T>, row: isize, col: isize) -> Option<T> {
    if row < 0 || col < 0 {
        return None;
    }
    src.get((row as usize, col as usize)).copied()
}

/// Half-open pixel range covered by the footprint [c - h, c + h], clipped to `len`.
pub(crate) fn footprint_range(c: f64, h: f64, len: usize) -> std::ops::Range<isize> {
    let lo = ((c - h).floor() as isize).max(0);
    let hi = ((c + h).ceil() as isize).min(len as isize);
    lo..hi.max(lo)
}

/// Length of the overlap of pixel [i, i + 1) with [c - h, c + h].
pub(crate) fn overlap(i: isize, c: f64, h: f64) -> f64 {
    let lo = (i as f64).max(c - h);
    let hi = ((i + 1) as f64).min(c + h);
    (hi - lo).max(0.0)
}

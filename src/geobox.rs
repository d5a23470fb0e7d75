//! Georeferenced pixel grids, pixel windows and footprints.

use std::ops::Range;

use tracing::warn;

use crate::affine::Affine;
use crate::crs::{Crs, CrsTransform};
use crate::error::{ProjError, WarpError};

/// Boundary samples per edge when densifying grid outlines for reprojection.
pub const PTS_PER_EDGE: usize = 21;

/// A pixel-space window, end-exclusive on both axes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Window {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl Window {
    pub fn new(rows: Range<usize>, cols: Range<usize>) -> Self {
        Self { rows, cols }
    }

    /// Window covering a whole grid of `shape`.
    pub fn full(shape: (usize, usize)) -> Self {
        Self::new(0..shape.0, 0..shape.1)
    }

    pub fn empty() -> Self {
        Self::new(0..0, 0..0)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.cols.len()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.cols.is_empty()
    }
}

/// Axis-aligned bounds in CRS units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub top: f64,
}

impl BoundingBox {
    pub fn new(left: f64, bottom: f64, right: f64, top: f64) -> Self {
        Self {
            left,
            bottom,
            right,
            top,
        }
    }

    /// Envelope of a set of points, `None` when empty.
    pub fn from_points(points: &[(f64, f64)]) -> Option<Self> {
        let (&(x0, y0), rest) = points.split_first()?;
        let mut bbox = Self::new(x0, y0, x0, y0);
        for &(x, y) in rest {
            bbox.left = bbox.left.min(x);
            bbox.right = bbox.right.max(x);
            bbox.bottom = bbox.bottom.min(y);
            bbox.top = bbox.top.max(y);
        }
        Some(bbox)
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }
}

/// The outline of a grid as a densified ring of points in some CRS.
#[derive(Clone, Debug, PartialEq)]
pub struct Footprint {
    pub crs: Crs,
    pub points: Vec<(f64, f64)>,
}

impl Footprint {
    /// Reproject the outline. Points that fail to project are dropped.
    pub fn to_crs(&self, crs: &Crs) -> Result<Footprint, ProjError> {
        let transform = CrsTransform::new(&self.crs, crs)?;
        if transform.is_identity() {
            return Ok(self.clone());
        }

        let mut dropped = 0usize;
        let points: Vec<(f64, f64)> = self
            .points
            .iter()
            .filter_map(|&(x, y)| match transform.transform(x, y) {
                Ok((tx, ty)) if tx.is_finite() && ty.is_finite() => Some((tx, ty)),
                _ => {
                    dropped += 1;
                    None
                }
            })
            .collect();

        if dropped > 0 {
            warn!(
                from = %self.crs,
                to = %crs,
                dropped,
                kept = points.len(),
                "footprint points failed to project"
            );
        }

        Ok(Footprint {
            crs: crs.clone(),
            points,
        })
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.points)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A georeferenced pixel grid: shape, pixel-to-world transform and CRS.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoBox {
    pub affine: Affine,
    /// (rows, cols)
    pub shape: (usize, usize),
    pub crs: Crs,
}

impl GeoBox {
    pub fn new(shape: (usize, usize), affine: Affine, crs: Crs) -> Self {
        Self { affine, shape, crs }
    }

    /// North-up grid snapped outward to whole pixels around `bbox`.
    pub fn from_bbox(bbox: &BoundingBox, crs: Crs, resolution: (f64, f64)) -> Self {
        let (rx, ry) = (resolution.0.abs(), resolution.1.abs());
        let cols = (bbox.width() / rx).ceil().max(0.0) as usize;
        let rows = (bbox.height() / ry).ceil().max(0.0) as usize;
        let affine = Affine::north_up(rx, ry, bbox.left, bbox.top);
        Self::new((rows, cols), affine, crs)
    }

    pub fn height(&self) -> usize {
        self.shape.0
    }

    pub fn width(&self) -> usize {
        self.shape.1
    }

    pub fn is_empty(&self) -> bool {
        self.shape.0 == 0 || self.shape.1 == 0
    }

    pub fn resolution(&self) -> (f64, f64) {
        self.affine.resolution()
    }

    /// The sub-grid covered by `window`.
    pub fn window(&self, window: &Window) -> GeoBox {
        GeoBox {
            affine: self
                .affine
                .shifted(window.cols.start as f64, window.rows.start as f64),
            shape: window.shape(),
            crs: self.crs.clone(),
        }
    }

    /// Outer boundary of the grid, densified, in the grid's CRS.
    pub fn extent(&self) -> Footprint {
        let points = edge_points(self.shape, PTS_PER_EDGE)
            .into_iter()
            .map(|(col, row)| self.affine.forward(col, row))
            .collect();
        Footprint {
            crs: self.crs.clone(),
            points,
        }
    }

    /// Envelope of the grid in CRS units.
    pub fn bounds(&self) -> BoundingBox {
        let (h, w) = (self.shape.0 as f64, self.shape.1 as f64);
        let corners = [
            self.affine.forward(0.0, 0.0),
            self.affine.forward(w, 0.0),
            self.affine.forward(0.0, h),
            self.affine.forward(w, h),
        ];
        // Four corners are never empty.
        BoundingBox::from_points(&corners).unwrap_or(BoundingBox::new(0.0, 0.0, 0.0, 0.0))
    }

    /// Pixel-centre coordinates along the row and column axes.
    ///
    /// Only meaningful for axis-aligned grids.
    pub fn coords(&self) -> Result<(Vec<f64>, Vec<f64>), WarpError> {
        if !self.affine.is_axis_aligned() {
            return Err(WarpError::Affine(
                "pixel-centre coordinates need an axis-aligned transform".into(),
            ));
        }
        let ys = (0..self.shape.0)
            .map(|r| self.affine.forward(0.5, r as f64 + 0.5).1)
            .collect();
        let xs = (0..self.shape.1)
            .map(|c| self.affine.forward(c as f64 + 0.5, 0.5).0)
            .collect();
        Ok((ys, xs))
    }

    /// Names of the row and column dimensions for this grid's CRS.
    pub fn dims(&self) -> (&'static str, &'static str) {
        if self.crs.is_geographic() {
            ("latitude", "longitude")
        } else {
            ("y", "x")
        }
    }
}

/// Sample points along the pixel-edge outline of a `shape` grid.
///
/// Returns (col, row) pairs running over all four edges, corners included once.
pub(crate) fn edge_points(shape: (usize, usize), pts_per_edge: usize) -> Vec<(f64, f64)> {
    let pts = pts_per_edge.max(2);
    let (h, w) = (shape.0 as f64, shape.1 as f64);
    let mut points = Vec::with_capacity(pts * 4);

    let step = |len: f64, i: usize| len * i as f64 / (pts - 1) as f64;

    for i in 0..pts {
        points.push((step(w, i), 0.0));
        points.push((step(w, i), h));
    }
    for i in 1..pts - 1 {
        points.push((0.0, step(h, i)));
        points.push((w, step(h, i)));
    }
    points
}

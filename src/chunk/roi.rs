//! Region-of-interest pairs: which source pixels feed a destination tile.

use crate::affine::Affine;
use crate::chunk::tiles::snap;
use crate::crs::CrsTransform;
use crate::error::PlanError;
use crate::geobox::{edge_points, BoundingBox, GeoBox, Window, PTS_PER_EDGE};

/// Read/write windows for reprojecting `src` onto `dst`.
#[derive(Clone, Debug, PartialEq)]
pub struct ReprojectRoi {
    /// Source pixels needed, halo included, clipped to the source shape.
    pub roi_src: Window,
    /// Destination pixels covered by the source, clipped to the destination shape.
    pub roi_dst: Window,
    /// Destination/source pixel size ratio along (x, y). Only set when the
    /// mapping is a pure scale and translation.
    pub scale: Option<(f64, f64)>,
    /// Source and destination pixels coincide up to an integer offset.
    pub aligned: bool,
}

/// Compute the ROI pair between `src` and `dst`.
///
/// When both grids share a CRS and are axis-aligned the mapping is linear and
/// the four corners give exact windows. Otherwise the outline is densified and
/// projected. The source window is widened by `padding` pixels for the
/// resampling kernel; only pixel-aligned pairs read with `padding == 0` get
/// no halo, everything else gets at least one pixel of projection slack.
pub fn compute_reproject_roi(
    src: &GeoBox,
    dst: &GeoBox,
    padding: usize,
) -> Result<ReprojectRoi, PlanError> {
    let to_src = CrsTransform::new(&dst.crs, &src.crs)?;
    let to_dst = CrsTransform::new(&src.crs, &dst.crs)?;
    let linear =
        to_src.is_identity() && src.affine.is_axis_aligned() && dst.affine.is_axis_aligned();
    let pts_per_edge = if linear { 2 } else { PTS_PER_EDGE };

    let src_inv = invert(&src.affine)?;
    let dst_inv = invert(&dst.affine)?;

    let dst_in_src = map_outline(dst, &to_src, &src_inv, pts_per_edge);
    let src_in_dst = map_outline(src, &to_dst, &dst_inv, pts_per_edge);

    let scale = linear.then(|| {
        (
            (dst.affine.a / src.affine.a).abs(),
            (dst.affine.e / src.affine.e).abs(),
        )
    });
    let aligned = scale.is_some_and(|(sx, sy)| {
        (sx - 1.0).abs() < 1e-9
            && (sy - 1.0).abs() < 1e-9
            && dst_in_src
                .iter()
                .all(|&(c, r)| snap(c).fract() == 0.0 && snap(r).fract() == 0.0)
    });

    let halo = if aligned && padding == 0 {
        0
    } else {
        padding.max(1)
    };
    Ok(ReprojectRoi {
        roi_src: bounding_window(&dst_in_src, halo, src.shape),
        roi_dst: bounding_window(&src_in_dst, 0, dst.shape),
        scale,
        aligned,
    })
}

fn invert(affine: &Affine) -> Result<Affine, PlanError> {
    affine
        .inverse()
        .map_err(|e| PlanError::General(e.to_string()))
}

/// Outline of `from` expressed in the pixel space of another grid.
fn map_outline(
    from: &GeoBox,
    transform: &CrsTransform,
    to_inv: &Affine,
    pts_per_edge: usize,
) -> Vec<(f64, f64)> {
    edge_points(from.shape, pts_per_edge)
        .into_iter()
        .filter_map(|(col, row)| {
            let (x, y) = from.affine.forward(col, row);
            let (tx, ty) = transform.transform(x, y).ok()?;
            let (c, r) = to_inv.forward(tx, ty);
            (c.is_finite() && r.is_finite()).then_some((c, r))
        })
        .collect()
}

/// Pixel window enclosing `points` (col, row), grown by `halo`, clipped to `shape`.
fn bounding_window(points: &[(f64, f64)], halo: usize, shape: (usize, usize)) -> Window {
    let Some(bbox) = BoundingBox::from_points(points) else {
        return Window::empty();
    };
    let halo = halo as f64;
    let clip = |lo: f64, hi: f64, len: usize| {
        let start = (snap(lo).floor() - halo).max(0.0);
        let end = (snap(hi).ceil() + halo).min(len as f64);
        if end > start {
            start as usize..end as usize
        } else {
            0..0
        }
    };
    let rows = clip(bbox.bottom, bbox.top, shape.0);
    let cols = clip(bbox.left, bbox.right, shape.1);
    if rows.is_empty() || cols.is_empty() {
        return Window::empty();
    }
    Window::new(rows, cols)
}

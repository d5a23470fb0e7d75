//! Eager reprojection of an n-d block whose spatial axes are `axis` and `axis + 1`.

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, Ix2, Slice};
use tracing::trace;

use crate::crs::CrsTransform;
use crate::element::Element;
use crate::error::WarpError;
use crate::geobox::GeoBox;
use crate::graph::ndindex;
use crate::resample::ResamplingMethod;

use super::engine::warp;

/// Reproject `src`, laid out on `src_geobox`, onto `dst_geobox`.
///
/// Axes before `axis` are looped over and each 2-D slice is warped
/// independently. The output has the input's prefix shape followed by the
/// destination grid shape. Pixels without a valid source sample get
/// `dst_nodata`, or zero when it is unset.
pub fn reproject_block<T: Element>(
    src: ArrayViewD<'_, T>,
    src_geobox: &GeoBox,
    dst_geobox: &GeoBox,
    method: ResamplingMethod,
    src_nodata: Option<T>,
    dst_nodata: Option<T>,
    axis: usize,
) -> Result<ArrayD<T>, WarpError> {
    let shape = src.shape().to_vec();
    if shape.len() < axis + 2 {
        return Err(WarpError::Shape(format!(
            "spatial axes {axis} and {} do not exist in a {}-d block",
            axis + 1,
            shape.len()
        )));
    }
    if shape.len() > axis + 2 {
        return Err(WarpError::Shape(format!(
            "block has {} axes after the spatial axes, expected none",
            shape.len() - axis - 2
        )));
    }
    if (shape[axis], shape[axis + 1]) != src_geobox.shape {
        return Err(WarpError::Shape(format!(
            "block spatial shape ({}, {}) does not match source grid {:?}",
            shape[axis],
            shape[axis + 1],
            src_geobox.shape
        )));
    }

    let transform = CrsTransform::new(&dst_geobox.crs, &src_geobox.crs)?;
    let fill = dst_nodata.unwrap_or_else(T::zero);

    let prefix = &shape[..axis];
    let mut out_shape = prefix.to_vec();
    out_shape.extend([dst_geobox.height(), dst_geobox.width()]);
    let mut out = ArrayD::from_elem(IxDyn(&out_shape), fill);

    for index in ndindex(prefix) {
        let plane = index
            .iter()
            .fold(src.view(), |view, &i| view.index_axis_move(Axis(0), i))
            .into_dimensionality::<Ix2>()
            .map_err(|e| WarpError::Shape(e.to_string()))?;

        let warped = warp(
            &plane,
            &src_geobox.affine,
            &dst_geobox.affine,
            dst_geobox.shape,
            &transform,
            method,
            src_nodata,
            fill,
        )?;
        trace!(index = ?index, shape = ?warped.dim(), "warped plane");

        out.slice_each_axis_mut(|ax| {
            let i = ax.axis.index();
            if i < axis {
                Slice::from(index[i]..index[i] + 1)
            } else {
                Slice::from(..)
            }
        })
        .assign(&warped);
    }

    Ok(out)
}

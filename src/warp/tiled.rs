//! Lazy, tile-by-tile reprojection of a chunked array.
//!
//! The destination grid is split into tiles of the output chunk size. Tiles
//! that intersect the source footprint get one resampling task per block of
//! the leading axes, each reading a dense crop of just the source pixels that
//! tile needs. Every other block is a constant fill.

use std::sync::Arc;

use tracing::debug;

use crate::chunk::{compute_reproject_roi, GeoboxTiles};
use crate::config::ReprojectOptions;
use crate::element::{cast_nodata, Element};
use crate::error::{GraphError, TaskError};
use crate::geobox::GeoBox;
use crate::graph::{ndindex, randomize, Chunks, LazyArray, Layer, Task, TaskGraph};
use crate::resample::ResamplingMethod;

use super::block::reproject_block;

/// Everything a resampling task for one destination tile needs.
struct TileJob<T> {
    src_geobox: GeoBox,
    dst_geobox: GeoBox,
    method: ResamplingMethod,
    src_nodata: Option<T>,
    dst_nodata: Option<T>,
    axis: usize,
}

/// Build the reprojection graph of `src` (laid out on `src_geobox`) onto `dst_geobox`.
///
/// The result has the source's leading axes and chunking followed by the
/// destination grid, tiled by `options.chunks` (default: the source's row/col
/// chunk size). Nothing is computed until the returned array is evaluated.
///
/// Fails before building anything when the row/col axes are missing, trailing
/// axes follow them, their extent differs from `src_geobox`, a chunk size is
/// zero, or a nodata marker does not fit `T`.
pub fn reproject<T: Element>(
    src: &LazyArray<T>,
    src_geobox: &GeoBox,
    dst_geobox: &GeoBox,
    options: &ReprojectOptions,
) -> Result<LazyArray<T>, GraphError> {
    let axis = options.axis;
    let shape = src.shape();
    if shape.len() < axis + 2 {
        return Err(GraphError::Dimension(format!(
            "row/col axes {axis} and {} missing from a {}-d array",
            axis + 1,
            shape.len()
        )));
    }
    if shape.len() > axis + 2 {
        return Err(GraphError::Shape(format!(
            "{} axes follow the row/col axes; only leading axes are supported",
            shape.len() - axis - 2
        )));
    }
    if (shape[axis], shape[axis + 1]) != src_geobox.shape {
        return Err(GraphError::Shape(format!(
            "source row/col extent ({}, {}) does not match its grid {:?}",
            shape[axis],
            shape[axis + 1],
            src_geobox.shape
        )));
    }

    let chunksize = src.chunksize();
    let tile_shape = options
        .chunks
        .unwrap_or((chunksize[axis], chunksize[axis + 1]));
    if tile_shape.0 == 0 || tile_shape.1 == 0 {
        return Err(GraphError::Chunks(format!(
            "output chunk size {tile_shape:?} must be positive"
        )));
    }

    let src_nodata = cast_nodata::<T>(options.src_nodata).map_err(GraphError::Nodata)?;
    let dst_nodata = cast_nodata::<T>(options.effective_dst_nodata()).map_err(GraphError::Nodata)?;
    let fill = dst_nodata.unwrap_or_else(T::zero);

    let gbt = GeoboxTiles::new(dst_geobox.clone(), tile_shape)?;
    let (row_chunks, col_chunks) = gbt.chunks();
    let mut axes = src.chunks().axes()[..axis].to_vec();
    axes.extend([row_chunks.to_vec(), col_chunks.to_vec()]);
    let dst_chunks = Chunks::new(axes);

    let with_data = gbt.tiles(&src_geobox.extent())?;
    let padding = options.resampling.halo();
    let prefix_blocks = &src.numblocks()[..axis];

    let name = randomize(&options.name);
    let mut layer = Layer::new(&name);
    let mut deps = vec![src.clone()];

    for &tile in &with_data {
        let tile_geobox = gbt.get(tile)?;
        let roi = compute_reproject_roi(src_geobox, &tile_geobox, padding)?;
        let cropped = src.crop_dense(&roi.roi_src, axis)?;

        let job = Arc::new(TileJob {
            src_geobox: src_geobox.window(&roi.roi_src),
            dst_geobox: tile_geobox,
            method: options.resampling,
            src_nodata,
            dst_nodata,
            axis,
        });

        for prefix in ndindex(prefix_blocks) {
            let mut src_index = prefix.clone();
            src_index.extend([0, 0]);
            let mut dst_index = prefix;
            dst_index.extend([tile.0, tile.1]);

            let job = Arc::clone(&job);
            let task = Task::apply("reproject", vec![cropped.block_key(&src_index)], move |args| {
                let block = args
                    .first()
                    .cloned()
                    .ok_or_else(|| TaskError::Shape("reproject task has no input block".into()))?;
                Ok(reproject_block(
                    block,
                    &job.src_geobox,
                    &job.dst_geobox,
                    job.method,
                    job.src_nodata,
                    job.dst_nodata,
                    job.axis,
                )?)
            });
            layer.insert(dst_index, task)?;
        }
        deps.push(cropped);
    }

    let mut fills = 0usize;
    for index in ndindex(&dst_chunks.numblocks()) {
        if layer.contains(&index) {
            continue;
        }
        let shape = dst_chunks.block_shape(&index);
        layer.insert(index, Task::Fill { shape, value: fill })?;
        fills += 1;
    }

    debug!(
        layer = %name,
        tiles = gbt.shape().0 * gbt.shape().1,
        with_data = with_data.len(),
        fill_blocks = fills,
        resampling = %options.resampling,
        "built reprojection graph"
    );

    LazyArray::new(TaskGraph::from_collections(layer, &deps), &name, dst_chunks)
}

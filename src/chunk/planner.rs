//! Tile plans: every destination tile with the source window it reads.

use std::collections::BTreeSet;

use tracing::debug;

use crate::chunk::roi::compute_reproject_roi;
use crate::chunk::tiles::GeoboxTiles;
use crate::error::PlanError;
use crate::geobox::{GeoBox, Window};

/// How one destination tile is produced.
#[derive(Clone, Debug, PartialEq)]
pub struct TilePlan {
    /// Tile index (row, col) in the tile grid.
    pub tile: (usize, usize),
    /// Destination pixels of the tile.
    pub dst_window: Window,
    /// Source pixels read for the tile, halo included. Empty without data.
    pub src_window: Window,
    /// Grid of the tile alone.
    pub dst_geobox: GeoBox,
    /// Grid of the source window.
    pub src_geobox: GeoBox,
    /// The tile intersects the source footprint and reads a non-empty window.
    pub has_data: bool,
}

/// Plan all tiles of `dst` split into `tile_shape` pieces, row-major.
///
/// Tiles outside the source footprint get an empty source window and
/// `has_data == false`.
pub fn plan_tiles(
    src: &GeoBox,
    dst: &GeoBox,
    tile_shape: (usize, usize),
    padding: usize,
) -> Result<Vec<TilePlan>, PlanError> {
    let gbt = GeoboxTiles::new(dst.clone(), tile_shape)?;
    let with_data: BTreeSet<(usize, usize)> = gbt.tiles(&src.extent())?.into_iter().collect();
    let (rows, cols) = gbt.shape();

    let mut plans = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            let tile = (row, col);
            let dst_geobox = gbt.get(tile)?;
            let src_window = if with_data.contains(&tile) {
                compute_reproject_roi(src, &dst_geobox, padding)?.roi_src
            } else {
                Window::empty()
            };
            plans.push(TilePlan {
                tile,
                dst_window: gbt.tile_window(tile)?,
                has_data: !src_window.is_empty(),
                src_geobox: src.window(&src_window),
                src_window,
                dst_geobox,
            });
        }
    }

    debug!(
        tiles = plans.len(),
        with_data = plans.iter().filter(|p| p.has_data).count(),
        "planned tiles"
    );
    Ok(plans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::Affine;
    use crate::crs::Crs;

    fn utm(shape: (usize, usize), left: f64) -> GeoBox {
        GeoBox::new(
            shape,
            Affine::north_up(100.0, 100.0, left, 6600000.0),
            Crs::new("EPSG:32633"),
        )
    }

    #[test]
    fn test_same_grid_four_tiles() {
        let gbox = utm((64, 64), 500000.0);
        let plans = plan_tiles(&gbox, &gbox, (32, 32), 0).unwrap();
        assert_eq!(plans.len(), 4);
        for plan in &plans {
            assert!(plan.has_data);
            assert_eq!(plan.src_window, plan.dst_window);
            assert_eq!(plan.src_geobox, plan.dst_geobox);
        }
        assert_eq!(plans[3].tile, (1, 1));
        assert_eq!(plans[3].dst_window, Window::new(32..64, 32..64));

        let padded = plan_tiles(&gbox, &gbox, (32, 32), 1).unwrap();
        assert_eq!(padded[3].src_window, Window::new(31..64, 31..64));
    }

    #[test]
    fn test_tiles_without_data() {
        let src = utm((4, 4), 500000.0);
        let dst = utm((4, 8), 500000.0);
        let plans = plan_tiles(&src, &dst, (4, 4), 1).unwrap();
        assert_eq!(plans.len(), 2);
        assert!(plans[0].has_data);
        assert!(!plans[1].has_data);
        assert!(plans[1].src_window.is_empty());
        assert_eq!(plans[1].src_geobox.shape, (0, 0));
    }

    #[test]
    fn test_cross_crs_windows_within_source() {
        let src = utm((64, 64), 500000.0);
        let dst = GeoBox::new(
            (32, 32),
            Affine::north_up(0.002, 0.001, 15.0, 59.53),
            Crs::new("EPSG:4326"),
        );
        let plans = plan_tiles(&src, &dst, (16, 16), 2).unwrap();
        assert_eq!(plans.len(), 4);
        assert!(plans.iter().any(|p| p.has_data));
        for plan in plans.iter().filter(|p| p.has_data) {
            assert!(plan.src_window.rows.end <= 64);
            assert!(plan.src_window.cols.end <= 64);
        }
    }

    #[test]
    fn test_zero_tile_size() {
        let gbox = utm((8, 8), 0.0);
        assert!(plan_tiles(&gbox, &gbox, (0, 4), 1).is_err());
    }
}

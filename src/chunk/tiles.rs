//! Destination tiling: a grid partitioned into fixed-size tiles.

use crate::error::PlanError;
use crate::geobox::{Footprint, GeoBox, Window};
use crate::graph::unpack_chunksize;

/// Coordinates closer than this to a whole pixel are treated as on it.
const SNAP_EPS: f64 = 1e-6;

pub(crate) fn snap(v: f64) -> f64 {
    let r = v.round();
    if (v - r).abs() < SNAP_EPS {
        r
    } else {
        v
    }
}

/// A [`GeoBox`] split into tiles of `tile_shape` pixels; edge tiles may be short.
#[derive(Clone, Debug, PartialEq)]
pub struct GeoboxTiles {
    geobox: GeoBox,
    tile_shape: (usize, usize),
    row_chunks: Vec<usize>,
    col_chunks: Vec<usize>,
}

impl GeoboxTiles {
    pub fn new(geobox: GeoBox, tile_shape: (usize, usize)) -> Result<Self, PlanError> {
        let (tile_h, tile_w) = tile_shape;
        if tile_h == 0 || tile_w == 0 {
            return Err(PlanError::General("Tile size must be > 0".into()));
        }
        let row_chunks = unpack_chunksize(tile_h, geobox.height());
        let col_chunks = unpack_chunksize(tile_w, geobox.width());
        Ok(Self {
            geobox,
            tile_shape,
            row_chunks,
            col_chunks,
        })
    }

    pub fn geobox(&self) -> &GeoBox {
        &self.geobox
    }

    pub fn tile_shape(&self) -> (usize, usize) {
        self.tile_shape
    }

    /// Number of tiles along (rows, cols).
    pub fn shape(&self) -> (usize, usize) {
        (self.row_chunks.len(), self.col_chunks.len())
    }

    /// Tile sizes along rows and along cols.
    pub fn chunks(&self) -> (&[usize], &[usize]) {
        (&self.row_chunks, &self.col_chunks)
    }

    /// Pixel window of tile `idx` within the full grid.
    pub fn tile_window(&self, idx: (usize, usize)) -> Result<Window, PlanError> {
        let (row, col) = idx;
        let (rows, cols) = self.shape();
        if row >= rows || col >= cols {
            return Err(PlanError::TileOutOfRange(idx));
        }
        let row0 = row * self.tile_shape.0;
        let col0 = col * self.tile_shape.1;
        Ok(Window::new(
            row0..row0 + self.row_chunks[row],
            col0..col0 + self.col_chunks[col],
        ))
    }

    /// The grid of tile `idx` alone.
    pub fn get(&self, idx: (usize, usize)) -> Result<GeoBox, PlanError> {
        Ok(self.geobox.window(&self.tile_window(idx)?))
    }

    /// Tiles whose extent intersects `footprint`, in row-major order.
    ///
    /// The footprint is projected into this grid's pixel space once and its
    /// bounding box selects a rectangular range of tiles. Tiles that only touch
    /// the footprint along an edge are excluded.
    pub fn tiles(&self, footprint: &Footprint) -> Result<Vec<(usize, usize)>, PlanError> {
        let local = footprint.to_crs(&self.geobox.crs)?;
        let inv = self
            .geobox
            .affine
            .inverse()
            .map_err(|e| PlanError::General(e.to_string()))?;

        let pixels: Vec<(f64, f64)> = local
            .points
            .iter()
            .map(|&(x, y)| inv.forward(x, y))
            .filter(|(c, r)| c.is_finite() && r.is_finite())
            .collect();

        let Some(bbox) = crate::geobox::BoundingBox::from_points(&pixels) else {
            return Ok(Vec::new());
        };

        // bbox is in (col, row) pixel units here.
        let rows = tile_range(
            snap(bbox.bottom),
            snap(bbox.top),
            self.geobox.height(),
            self.tile_shape.0,
            self.row_chunks.len(),
        );
        let cols = tile_range(
            snap(bbox.left),
            snap(bbox.right),
            self.geobox.width(),
            self.tile_shape.1,
            self.col_chunks.len(),
        );

        Ok(rows
            .flat_map(|r| cols.clone().map(move |c| (r, c)))
            .collect())
    }
}

/// Tiles along one axis overlapping the open pixel interval (lo, hi).
fn tile_range(lo: f64, hi: f64, len: usize, tile: usize, count: usize) -> std::ops::Range<usize> {
    let lo = lo.max(0.0);
    let hi = hi.min(len as f64);
    if hi <= lo {
        return 0..0;
    }
    let first = (lo / tile as f64).floor() as usize;
    let last = ((hi / tile as f64).ceil() as usize).min(count);
    first.min(last)..last
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::Affine;
    use crate::crs::Crs;

    fn grid(shape: (usize, usize), left: f64, top: f64) -> GeoBox {
        GeoBox::new(
            shape,
            Affine::north_up(100.0, 100.0, left, top),
            Crs::new("EPSG:32633"),
        )
    }

    #[test]
    fn test_shape_and_edge_tiles() {
        let gbt = GeoboxTiles::new(grid((100, 100), 500000.0, 6600000.0), (64, 64)).unwrap();
        assert_eq!(gbt.shape(), (2, 2));
        assert_eq!(gbt.chunks(), (&[64, 36][..], &[64, 36][..]));
        assert_eq!(gbt.tile_window((1, 1)).unwrap(), Window::new(64..100, 64..100));

        let last = gbt.get((1, 1)).unwrap();
        assert_eq!(last.shape, (36, 36));
        assert_eq!(last.affine.c, 500000.0 + 64.0 * 100.0);
        assert_eq!(last.affine.f, 6600000.0 - 64.0 * 100.0);
    }

    #[test]
    fn test_tiles_cover_full_extent_once() {
        let gbox = grid((64, 64), 500000.0, 6600000.0);
        let gbt = GeoboxTiles::new(gbox.clone(), (32, 32)).unwrap();
        let tiles = gbt.tiles(&gbox.extent()).unwrap();
        assert_eq!(tiles, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);

        let mut covered = vec![vec![false; 64]; 64];
        for idx in tiles {
            let w = gbt.tile_window(idx).unwrap();
            for row in &mut covered[w.rows.clone()] {
                for cell in &mut row[w.cols.clone()] {
                    assert!(!*cell, "Overlapping tiles");
                    *cell = true;
                }
            }
        }
        assert!(covered.iter().flatten().all(|&c| c), "Gap in coverage");
    }

    #[test]
    fn test_partial_overlap_selects_subset() {
        // Destination is 4x8 tiles-of-2; source covers its left half exactly.
        let dst = grid((4, 8), 0.0, 400.0);
        let src = grid((4, 4), 0.0, 400.0);
        let gbt = GeoboxTiles::new(dst, (2, 2)).unwrap();
        let tiles = gbt.tiles(&src.extent()).unwrap();
        assert_eq!(tiles, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn test_interior_footprint() {
        let dst = grid((8, 8), 0.0, 800.0);
        // Source spans pixels rows 3..5, cols 1..7 of the destination.
        let src = grid((2, 6), 100.0, 500.0);
        let gbt = GeoboxTiles::new(dst, (2, 2)).unwrap();
        let tiles = gbt.tiles(&src.extent()).unwrap();
        let expected: Vec<_> = (1..3).flat_map(|r| (0..4).map(move |c| (r, c))).collect();
        assert_eq!(tiles, expected);
    }

    #[test]
    fn test_disjoint_footprint_has_no_tiles() {
        let dst = grid((8, 8), 0.0, 800.0);
        let src = grid((4, 4), 10_000.0, 800.0);
        let gbt = GeoboxTiles::new(dst, (4, 4)).unwrap();
        assert!(gbt.tiles(&src.extent()).unwrap().is_empty());
    }

    #[test]
    fn test_cross_crs_far_away_has_no_tiles() {
        let src = grid((4, 4), 500000.0, 6600000.0);
        let dst = GeoBox::new(
            (4, 4),
            Affine::north_up(1.0, 1.0, -180.0, -60.0),
            Crs::new("EPSG:4326"),
        );
        let gbt = GeoboxTiles::new(dst, (4, 4)).unwrap();
        assert!(gbt.tiles(&src.extent()).unwrap().is_empty());
    }

    #[test]
    fn test_zero_tile_size_error() {
        assert!(GeoboxTiles::new(grid((64, 64), 0.0, 0.0), (0, 32)).is_err());
    }

    #[test]
    fn test_out_of_range_tile() {
        let gbt = GeoboxTiles::new(grid((4, 4), 0.0, 400.0), (2, 2)).unwrap();
        assert!(matches!(
            gbt.get((2, 0)),
            Err(PlanError::TileOutOfRange((2, 0)))
        ));
    }
}

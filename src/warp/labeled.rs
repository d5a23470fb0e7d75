//! Reprojection of arrays that carry named dimensions and coordinates.

use std::collections::BTreeMap;

use crate::config::ReprojectOptions;
use crate::element::Element;
use crate::error::GraphError;
use crate::geobox::GeoBox;
use crate::graph::LazyArray;
use crate::resample::ResamplingMethod;

/// Spatial dimension names, checked in order.
const SPATIAL_DIMS: [(&str, &str); 2] = [("y", "x"), ("latitude", "longitude")];

/// A lazy array with named dimensions, per-dimension coordinates, a grid for
/// its spatial dimensions and an optional nodata marker.
#[derive(Clone, Debug)]
pub struct LabeledArray<T> {
    pub name: Option<String>,
    pub data: LazyArray<T>,
    pub dims: Vec<String>,
    pub geobox: GeoBox,
    pub nodata: Option<f64>,
    pub coords: BTreeMap<String, Vec<f64>>,
}

impl<T> LabeledArray<T> {
    /// Wrap `data`; spatial coordinates are filled in from `geobox`.
    pub fn new(
        data: LazyArray<T>,
        dims: &[&str],
        geobox: GeoBox,
        nodata: Option<f64>,
    ) -> Result<Self, GraphError> {
        if dims.len() != data.ndim() {
            return Err(GraphError::Dimension(format!(
                "{} dimension names for a {}-d array",
                dims.len(),
                data.ndim()
            )));
        }
        let dims: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
        let axis = spatial_axis(&dims)?;
        let shape = data.shape();
        if (shape[axis], shape[axis + 1]) != geobox.shape {
            return Err(GraphError::Shape(format!(
                "spatial extent ({}, {}) does not match grid {:?}",
                shape[axis],
                shape[axis + 1],
                geobox.shape
            )));
        }

        let mut coords = BTreeMap::new();
        insert_spatial_coords(&mut coords, &dims[axis], &dims[axis + 1], &geobox)?;
        Ok(Self {
            name: None,
            data,
            dims,
            geobox,
            nodata,
            coords,
        })
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Attach coordinates for a non-spatial dimension.
    pub fn with_coord(mut self, dim: &str, values: Vec<f64>) -> Result<Self, GraphError> {
        let axis = self
            .dims
            .iter()
            .position(|d| d == dim)
            .ok_or_else(|| GraphError::Dimension(format!("no dimension named '{dim}'")))?;
        let len = self.data.shape()[axis];
        if values.len() != len {
            return Err(GraphError::Shape(format!(
                "{} coordinates for dimension '{dim}' of length {len}",
                values.len()
            )));
        }
        self.coords.insert(dim.to_string(), values);
        Ok(self)
    }

    /// Index of the row dimension; the column dimension follows it.
    pub fn spatial_axis(&self) -> Result<usize, GraphError> {
        spatial_axis(&self.dims)
    }
}

/// Position of the first spatial dimension pair, which must be adjacent.
fn spatial_axis(dims: &[String]) -> Result<usize, GraphError> {
    for (row, col) in SPATIAL_DIMS {
        if let Some(axis) = dims.iter().position(|d| d == row) {
            return match dims.get(axis + 1) {
                Some(next) if next == col => Ok(axis),
                _ => Err(GraphError::Dimension(format!(
                    "dimension '{row}' must be followed by '{col}' in {dims:?}"
                ))),
            };
        }
    }
    Err(GraphError::Dimension(format!(
        "no spatial dimensions in {dims:?}"
    )))
}

fn insert_spatial_coords(
    coords: &mut BTreeMap<String, Vec<f64>>,
    row_dim: &str,
    col_dim: &str,
    geobox: &GeoBox,
) -> Result<(), GraphError> {
    let (ys, xs) = geobox
        .coords()
        .map_err(|e| GraphError::Shape(e.to_string()))?;
    coords.insert(row_dim.to_string(), ys);
    coords.insert(col_dim.to_string(), xs);
    Ok(())
}

/// Reproject a labelled array onto `geobox`.
///
/// Spatial dimensions and their coordinates are replaced by the destination
/// grid's, other dimensions and coordinates pass through. The destination
/// nodata defaults to the source's.
pub fn reproject_labeled<T: Element>(
    src: &LabeledArray<T>,
    geobox: &GeoBox,
    resampling: ResamplingMethod,
    chunks: Option<(usize, usize)>,
    dst_nodata: Option<f64>,
) -> Result<LabeledArray<T>, GraphError> {
    let axis = src.spatial_axis()?;
    let dst_nodata = dst_nodata.or(src.nodata);

    let options = ReprojectOptions {
        resampling,
        chunks,
        src_nodata: src.nodata,
        dst_nodata,
        axis,
        ..ReprojectOptions::default()
    };
    let data = super::tiled::reproject(&src.data, &src.geobox, geobox, &options)?;

    let (row_dim, col_dim) = geobox.dims();
    let mut dims = src.dims.clone();
    dims[axis] = row_dim.to_string();
    dims[axis + 1] = col_dim.to_string();

    let mut coords: BTreeMap<String, Vec<f64>> = src
        .coords
        .iter()
        .filter(|(dim, _)| **dim != src.dims[axis] && **dim != src.dims[axis + 1])
        .map(|(dim, values)| (dim.clone(), values.clone()))
        .collect();
    insert_spatial_coords(&mut coords, row_dim, col_dim, geobox)?;

    Ok(LabeledArray {
        name: src.name.clone(),
        data,
        dims,
        geobox: geobox.clone(),
        nodata: dst_nodata,
        coords,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affine::Affine;
    use crate::crs::Crs;
    use ndarray::{ArrayD, IxDyn};

    fn utm(shape: (usize, usize), res: f64) -> GeoBox {
        GeoBox::new(
            shape,
            Affine::north_up(res, res, 500000.0, 6600000.0),
            Crs::new("EPSG:32633"),
        )
    }

    fn cube(shape: &[usize], chunks: &[usize]) -> LazyArray<f32> {
        LazyArray::from_array(ArrayD::from_elem(IxDyn(shape), 1.0), chunks).unwrap()
    }

    #[test]
    fn test_new_fills_spatial_coords() {
        let arr = LabeledArray::new(cube(&[2, 3], &[2, 3]), &["y", "x"], utm((2, 3), 10.0), None)
            .unwrap();
        assert_eq!(arr.spatial_axis().unwrap(), 0);
        assert_eq!(arr.coords["x"], vec![500005.0, 500015.0, 500025.0]);
        assert_eq!(arr.coords["y"], vec![6599995.0, 6599985.0]);
    }

    #[test]
    fn test_spatial_axis_detection() {
        let dims = |d: &[&str]| d.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(spatial_axis(&dims(&["time", "y", "x"])).unwrap(), 1);
        assert_eq!(spatial_axis(&dims(&["latitude", "longitude"])).unwrap(), 0);
        assert!(spatial_axis(&dims(&["x", "y"])).is_err());
        assert!(spatial_axis(&dims(&["time", "band"])).is_err());
    }

    #[test]
    fn test_new_validates() {
        let gbox = utm((2, 3), 10.0);
        assert!(LabeledArray::new(cube(&[2, 3], &[1, 1]), &["y"], gbox.clone(), None).is_err());
        assert!(LabeledArray::new(cube(&[3, 2], &[1, 1]), &["y", "x"], gbox, None).is_err());
    }

    #[test]
    fn test_reproject_to_geographic_renames_dims() {
        let src = LabeledArray::new(
            cube(&[2, 64, 64], &[1, 32, 32]),
            &["time", "y", "x"],
            utm((64, 64), 100.0),
            Some(-1.0),
        )
        .unwrap()
        .with_name("red")
        .with_coord("time", vec![0.0, 86400.0])
        .unwrap();

        let dst = GeoBox::new(
            (16, 16),
            Affine::north_up(0.004, 0.002, 15.0, 59.53),
            Crs::new("EPSG:4326"),
        );
        let out = reproject_labeled(&src, &dst, ResamplingMethod::Nearest, Some((8, 8)), None)
            .unwrap();

        assert_eq!(out.name.as_deref(), Some("red"));
        assert_eq!(out.dims, vec!["time", "latitude", "longitude"]);
        assert_eq!(out.nodata, Some(-1.0));
        assert_eq!(out.coords["time"], vec![0.0, 86400.0]);
        assert_eq!(out.coords["longitude"].len(), 16);
        assert!(!out.coords.contains_key("x"));
        assert_eq!(out.data.shape(), vec![2, 16, 16]);
        assert_eq!(out.data.chunks().axis(0), &[1, 1]);

        let values = out.data.compute().unwrap();
        assert!(values.iter().all(|&v| v == 1.0 || v == -1.0));
    }

    #[test]
    fn test_dst_nodata_override() {
        let src = LabeledArray::new(cube(&[4, 4], &[2, 2]), &["y", "x"], utm((4, 4), 10.0), None)
            .unwrap();
        let out =
            reproject_labeled(&src, &utm((4, 4), 10.0), ResamplingMethod::Nearest, None, Some(0.0))
                .unwrap();
        assert_eq!(out.nodata, Some(0.0));
        assert_eq!(out.dims, vec!["y", "x"]);
        assert_eq!(out.data.compute().unwrap(), ArrayD::from_elem(IxDyn(&[4, 4]), 1.0));
    }
}

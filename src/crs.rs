//! Coordinate reference systems and point transforms between them.

use std::fmt;

use proj4rs::Proj;

use crate::error::ProjError;

/// A coordinate reference system identified by a user string.
///
/// Accepts EPSG codes ("EPSG:4326") or PROJ strings ("+proj=utm +zone=33 ...").
/// EPSG prefixes are normalized so that `epsg:4326` and `EPSG:4326` compare equal.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Crs(String);

impl Crs {
    pub fn new(crs: &str) -> Self {
        let crs = crs.trim();
        match crs.get(..5) {
            Some(prefix) if prefix.eq_ignore_ascii_case("epsg:") => {
                Self(format!("EPSG:{}", crs[5..].trim()))
            }
            _ => Self(crs.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// EPSG code, if this CRS was given as one.
    pub fn epsg(&self) -> Option<u32> {
        self.0.strip_prefix("EPSG:")?.parse().ok()
    }

    /// Whether coordinates are longitude/latitude in degrees.
    pub fn is_geographic(&self) -> bool {
        if self.epsg() == Some(4326) {
            return true;
        }
        Proj::from_user_string(&self.0)
            .map(|p| p.is_latlong())
            .unwrap_or(false)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Crs {
    fn from(s: &str) -> Self {
        Crs::new(s)
    }
}

/// proj4rs endpoints plus the degree handling for geographic systems.
pub struct Proj4rsTransform {
    from: Proj,
    to: Proj,
    from_is_geo: bool,
    to_is_geo: bool,
}

/// Point transform from one CRS to another.
///
/// Coordinates are in CRS native units on both sides (degrees for geographic,
/// metres for projected). proj4rs works in radians for geographic systems; the
/// conversion is handled here.
pub enum CrsTransform {
    /// Source and destination CRS are the same.
    Identity,
    Proj4rs(Box<Proj4rsTransform>),
}

impl CrsTransform {
    pub fn new(from: &Crs, to: &Crs) -> Result<Self, ProjError> {
        if from == to {
            return Ok(CrsTransform::Identity);
        }
        let from_proj = Proj::from_user_string(from.as_str())
            .map_err(|e| ProjError::UnknownCrs(format!("{from}: {e}")))?;
        let to_proj = Proj::from_user_string(to.as_str())
            .map_err(|e| ProjError::UnknownCrs(format!("{to}: {e}")))?;
        let from_is_geo = from_proj.is_latlong();
        let to_is_geo = to_proj.is_latlong();
        Ok(CrsTransform::Proj4rs(Box::new(Proj4rsTransform {
            from: from_proj,
            to: to_proj,
            from_is_geo,
            to_is_geo,
        })))
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, CrsTransform::Identity)
    }

    /// Transform a single point.
    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), ProjError> {
        let ct = match self {
            CrsTransform::Identity => return Ok((x, y)),
            CrsTransform::Proj4rs(ct) => ct,
        };

        let mut point = if ct.from_is_geo {
            (x.to_radians(), y.to_radians())
        } else {
            (x, y)
        };

        proj4rs::transform::transform(&ct.from, &ct.to, &mut point)
            .map_err(|e| ProjError::TransformFailed(e.to_string()))?;

        if ct.to_is_geo {
            Ok((point.0.to_degrees(), point.1.to_degrees()))
        } else {
            Ok(point)
        }
    }

    /// Transform coordinates in place.
    pub fn transform_batch(&self, coords: &mut [(f64, f64)]) -> Result<(), ProjError> {
        let ct = match self {
            CrsTransform::Identity => return Ok(()),
            CrsTransform::Proj4rs(ct) => ct,
        };

        if ct.from_is_geo {
            for c in coords.iter_mut() {
                *c = (c.0.to_radians(), c.1.to_radians());
            }
        }

        proj4rs::transform::transform(&ct.from, &ct.to, coords)
            .map_err(|e| ProjError::TransformFailed(e.to_string()))?;

        if ct.to_is_geo {
            for c in coords.iter_mut() {
                *c = (c.0.to_degrees(), c.1.to_degrees());
            }
        }
        Ok(())
    }
}

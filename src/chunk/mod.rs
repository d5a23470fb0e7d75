pub mod planner;
pub mod roi;
pub mod tiles;

pub use planner::{plan_tiles, TilePlan};
pub use roi::{compute_reproject_roi, ReprojectRoi};
pub use tiles::GeoboxTiles;

//! Reprojection: the per-pixel engine, the eager per-block primitive and the
//! lazy tiled graph builder on top of them.

pub mod block;
pub mod engine;
pub mod labeled;
pub mod tiled;

pub use block::reproject_block;
pub use engine::warp;
pub use labeled::{reproject_labeled, LabeledArray};
pub use tiled::reproject;

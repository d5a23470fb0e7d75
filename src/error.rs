use thiserror::Error;

#[derive(Error, Debug)]
pub enum WarpError {
    #[error("Projection error: {0}")]
    Projection(#[from] ProjError),

    #[error("Resampling error: {0}")]
    Resampling(String),

    #[error("Invalid affine transform: {0}")]
    Affine(String),

    #[error("Invalid shape: {0}")]
    Shape(String),
}

#[derive(Error, Debug)]
pub enum ProjError {
    #[error("Unknown CRS: {0}")]
    UnknownCrs(String),

    #[error("Transform failed: {0}")]
    TransformFailed(String),
}

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Planning error: {0}")]
    General(String),

    #[error("Tile {0:?} is outside the tile grid")]
    TileOutOfRange((usize, usize)),

    #[error("Projection error during planning: {0}")]
    Projection(#[from] ProjError),
}

/// Precondition violations detected while building a task graph.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Invalid shape: {0}")]
    Shape(String),

    #[error("Invalid chunks: {0}")]
    Chunks(String),

    #[error("Block {index:?} of '{name}' already has a task")]
    DuplicateBlock { name: String, index: Vec<usize> },

    #[error("Block {index:?} of '{name}' has no task")]
    MissingBlock { name: String, index: Vec<usize> },

    #[error("Layer '{0}' is not part of the graph")]
    MissingLayer(String),

    #[error("Nodata value {0} cannot be represented by the array element type")]
    Nodata(f64),

    #[error("Missing dimension: {0}")]
    Dimension(String),

    #[error("Planning error: {0}")]
    Plan(#[from] PlanError),
}

/// Failures raised while evaluating a task graph.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("No task produces block {0}")]
    MissingKey(String),

    #[error("Dependency cycle between layers: {0}")]
    Cycle(String),

    #[error("Invalid block shape: {0}")]
    Shape(String),

    #[error(transparent)]
    Warp(#[from] WarpError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

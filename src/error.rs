use thiserror::Error;

/// Top-level error type for shape descriptor computation.
#[derive(Debug, Error)]
pub enum ShapeIndexError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the boundary model.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error(transparent)]
    PointIndex(#[from] PointIndexError),
}

/// Errors raised while triangulating a single face.
///
/// These never escape face granularity: the face is rejected and contributes
/// zero triangles.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TessellationError {
    #[error("face has no outer ring")]
    MissingOuterRing,

    #[error("ring needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("projected outer ring is not simple")]
    NonSimpleOuterRing,

    #[error("constraint edge {from} -> {to} crosses an existing constraint")]
    CrossingConstraint { from: u32, to: u32 },

    #[error("CDT insert failed: {0}")]
    Insertion(String),

    #[error(transparent)]
    PointIndex(#[from] PointIndexError),
}

/// A ring references a point that does not exist.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("point index {index} out of range ({len} points)")]
pub struct PointIndexError {
    pub index: u32,
    pub len: usize,
}

/// Errors related to solid assembly and repair.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("triangle soup is empty")]
    EmptySoup,

    #[error("wrapping grid of {cells} cells exceeds limit of {limit}")]
    GridTooLarge { cells: usize, limit: usize },
}

/// Convenience type alias for results using [`ShapeIndexError`].
pub type Result<T> = std::result::Result<T, ShapeIndexError>;

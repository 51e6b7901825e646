use thiserror::Error;

/// Top-level error type for the Morph topology engine.
#[derive(Debug, Error)]
pub enum MorphError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Triangulation(#[from] TriangulationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to topological operations.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    #[error("perimeter walk did not close after {0} steps")]
    PerimeterStepLimit(usize),
}

/// Errors related to mesh-level operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised by the polygon triangulator.
#[derive(Debug, Error)]
pub enum TriangulationError {
    #[error("triangulation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`MorphError`].
pub type Result<T> = std::result::Result<T, MorphError>;

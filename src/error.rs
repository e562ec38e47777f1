use thiserror::Error;

/// Top-level error type for shield mesh generation.
#[derive(Debug, Error)]
pub enum ShieldError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Precondition violations on the shield point grid.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("invalid element counts: {0}")]
    InvalidCounts(String),

    #[error("grid index (n3={n3}, n2={n2}, n1={n1}) is out of range")]
    IndexOutOfRange { n3: usize, n2: usize, n1: usize },

    #[error("element index (e2={e2}, e1={e1}) is out of range")]
    ElementIndexOutOfRange { e2: usize, e1: usize },

    #[error("rim index {index} is out of range [0, {max}]")]
    RimIndexOutOfRange { index: usize, max: usize },

    #[error("grid point (n3={n3}, n2={n2}, n1={n1}) is unset")]
    UnsetPoint { n3: usize, n2: usize, n1: usize },

    #[error("no surface proportion stored for (n2={n2}, n1={n1})")]
    MissingProportion { n2: usize, n1: usize },

    #[error("no track surface configured")]
    NoTrackSurface,

    #[error("grid is frozen: nodes have already been generated")]
    Frozen,

    #[error("{0} already generated")]
    AlreadyGenerated(&'static str),

    #[error("nodes must be generated before elements")]
    NodesNotGenerated,
}

/// Errors raised by a mesh sink.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("node {0} already exists")]
    DuplicateNode(u32),

    #[error("element {0} already exists")]
    DuplicateElement(u32),

    #[error("node {0} not found")]
    NodeNotFound(u32),

    #[error("element {0} not found")]
    ElementNotFound(u32),

    #[error("element {element} references unknown node {node}")]
    UnknownNode { element: u32, node: u32 },

    #[error("invalid basis remap: {0}")]
    InvalidRemap(String),
}

/// Errors related to generic operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`ShieldError`].
pub type Result<T> = std::result::Result<T, ShieldError>;

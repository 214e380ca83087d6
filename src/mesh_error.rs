//! MeshGeomError: Unified error type for mesh-geom public APIs
//!
//! Every fallible operation in the crate returns this error so callers can
//! match on the precise condition (bad index, malformed input, failed lookup)
//! without string inspection.

use crate::topology::elem_type::ElemType;
use thiserror::Error;

/// Unified error type for mesh-geom operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshGeomError {
    /// Command-line usage error.
    #[error("usage: {0}")]
    Usage(String),
    /// Underlying I/O failure (message of the `std::io::Error`).
    #[error("I/O error: {0}")]
    Io(String),
    /// Malformed mesh or field file.
    #[error("mesh I/O parse error: {0}")]
    MeshIoParse(String),
    /// Coarse and fine fields do not carry the same variables.
    #[error("variable names differ: coarse {coarse:?}, fine {fine:?}")]
    VariableMismatch {
        coarse: Vec<String>,
        fine: Vec<String>,
    },
    /// Field storage does not match `n_nodes * n_variables`.
    #[error("field size mismatch: expected {expected} values, found {found}")]
    FieldSizeMismatch { expected: usize, found: usize },
    /// Requested variable is not part of the field.
    #[error("variable index {index} out of range (field has {n_variables} variables)")]
    InvalidVariableIndex { index: usize, n_variables: usize },
    /// Local node index outside `0..n_nodes` for an element type.
    #[error("local node {index} out of range for {elem_type:?} ({n_nodes} nodes)")]
    InvalidNodeIndex {
        elem_type: ElemType,
        index: usize,
        n_nodes: usize,
    },
    /// Element references a node that is not in the mesh.
    #[error("element {elem} references node {node}, but the mesh has {n_nodes} nodes")]
    InvalidConnectivity {
        elem: usize,
        node: usize,
        n_nodes: usize,
    },
    /// Wrong number of node indices supplied for an element type.
    #[error("{elem_type:?} expects {expected} nodes, got {found}")]
    NodeCountMismatch {
        elem_type: ElemType,
        expected: usize,
        found: usize,
    },
    /// Side index outside `0..n_sides`.
    #[error("invalid side {index} for {elem_type:?} ({n_sides} sides)")]
    InvalidSideIndex {
        elem_type: ElemType,
        index: usize,
        n_sides: usize,
    },
    /// Edge index outside `0..n_edges`.
    #[error("invalid edge {index} for {elem_type:?} ({n_edges} edges)")]
    InvalidEdgeIndex {
        elem_type: ElemType,
        index: usize,
        n_edges: usize,
    },
    /// Child index outside `0..n_children`, or the type does not refine.
    #[error("invalid child {index} for {elem_type:?} ({n_children} children)")]
    InvalidChildIndex {
        elem_type: ElemType,
        index: usize,
        n_children: usize,
    },
    /// Sub-cell index outside `0..n_sub_elem`.
    #[error("invalid sub-cell {index} for {elem_type:?} ({n_sub_elem} sub-cells)")]
    InvalidSubCell {
        elem_type: ElemType,
        index: usize,
        n_sub_elem: usize,
    },
    /// I/O package is unknown or cannot express this element type.
    #[error("unsupported I/O package {package} for {elem_type:?}")]
    UnsupportedIoPackage {
        package: String,
        elem_type: Option<ElemType>,
    },
    /// Shape-function order not available on this element type.
    #[error("order {order} shape functions are not available on {elem_type:?}")]
    UnsupportedOrder { elem_type: ElemType, order: u8 },
    /// Newton iteration of the inverse map failed.
    #[error("inverse map diverged on {elem_type:?} for point {point:?}: {reason}")]
    InverseMapDiverged {
        elem_type: ElemType,
        point: [f64; 3],
        reason: String,
    },
    /// No element of the indexed mesh contains the point.
    #[error("no element contains point {point:?} ({context})")]
    PointNotLocated { point: [f64; 3], context: String },
    /// Degenerate or otherwise unusable geometry.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),
    /// Operation requires at least one element.
    #[error("mesh has no elements")]
    EmptyMesh,
}

impl From<std::io::Error> for MeshGeomError {
    fn from(err: std::io::Error) -> Self {
        MeshGeomError::Io(err.to_string())
    }
}

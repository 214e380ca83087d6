#![cfg_attr(docsrs, feature(doc_cfg))]
//! # mesh-geom
//!
//! mesh-geom is the geometric kernel of an unstructured finite-element mesh
//! library: a closed family of element types (finite and infinite, first and
//! second order) with their side/edge/child tables, isoparametric reference
//! mappings, refinement embeddings, an octree for point location and a
//! grid-to-grid comparison driver that measures the difference between a
//! coarse and a fine nodal solution.
//!
//! ## Features
//! - `ElemType` tables for `NodeElem`, `Edge2/3`, `Quad4/9`, `Hex8/27` and the
//!   infinite `InfEdge2`, `InfQuad4`, `InfHex8`
//! - Lagrange and radial shape functions, Newton inverse maps, Gauss rules
//! - Containment with a fast geometric rejection for infinite elements
//! - Octree point location with a one-element lookup cache
//! - Uniform refinement and prolongation through embedding matrices
//! - Gmsh reader/writer, Tecplot and legacy VTK writers
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! mesh-geom = "0.1"
//! # Optional features:
//! # features = ["rayon", "check-invariants"]
//! ```
//!
//! ## Determinism
//!
//! Octree candidates are scanned in insertion order and the L2 sum follows
//! fine element order, so results do not depend on the `rayon` feature.

pub mod algs;
pub mod app;
pub mod context;
pub mod data;
pub mod debug_invariants;
pub mod fe;
pub mod geometry;
pub mod io;
pub mod mesh;
pub mod mesh_error;
pub mod mesh_generation;
pub mod octree;
pub mod topology;

pub use debug_invariants::DebugInvariants;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::field_transfer::{
        grid_to_grid, grid_to_grid_with_mapping, TransferOptions, TransferReport,
    };
    pub use crate::context::Context;
    pub use crate::data::field::Field;
    pub use crate::debug_invariants::DebugInvariants;
    pub use crate::fe::{FeValues, LagrangeMap, QuadratureRule, ReferenceMapping};
    pub use crate::geometry::{BoundingBox, Point};
    pub use crate::io::{FieldReader, FieldWriter, MeshReader};
    pub use crate::mesh::{Mesh, Node};
    pub use crate::mesh_error::MeshGeomError;
    pub use crate::octree::{Octree, OctreeOptions};
    pub use crate::topology::connectivity::IoPackage;
    pub use crate::topology::elem::{Elem, ElemView, SideMode, SubElem};
    pub use crate::topology::elem_type::{ElemType, NodeRole, Order};
    pub use crate::topology::refine::{uniform_refine, EmbeddingMatrix, RefinedMesh};
}

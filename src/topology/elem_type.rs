//! Element type metadata.
//!
//! [`ElemType`] is a closed set of finite and infinite Lagrange elements. All
//! topology (node/side/edge counts, side and edge node maps, node roles and
//! reference positions) is `const` data keyed on the variant; nothing here is
//! stored per element instance.
//!
//! Node numbering follows the usual libMesh conventions. Infinite elements
//! number their finite base first and then one "outer" node per base vertex,
//! so node `i + n_vertices()` sits radially above base node `i`.

use crate::geometry::point::Point;
use crate::mesh_error::MeshGeomError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Concrete element shapes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElemType {
    /// 0D point element.
    NodeElem,
    /// Linear segment.
    Edge2,
    /// Quadratic segment with a mid node.
    Edge3,
    /// Segment from a base node out to infinity.
    InfEdge2,
    /// Bilinear quadrilateral.
    Quad4,
    /// Biquadratic quadrilateral.
    Quad9,
    /// Quadrilateral with one direction extending to infinity.
    InfQuad4,
    /// Trilinear hexahedron.
    Hex8,
    /// Triquadratic hexahedron.
    Hex27,
    /// Hexahedron with one direction extending to infinity.
    InfHex8,
}

/// Approximation order of the Lagrange basis.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Order {
    First,
    Second,
}

impl Order {
    pub fn as_u8(self) -> u8 {
        match self {
            Order::First => 1,
            Order::Second => 2,
        }
    }
}

/// Topological role of a local node.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum NodeRole {
    Vertex,
    Edge,
    Face,
    Interior,
}

/// 1D basis family along one reference axis.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum AxisKind {
    Linear,
    Quadratic,
    /// Infinite direction; index 0 is the base, index 1 the outer node.
    Radial,
}

// --- side / edge node maps --------------------------------------------------

const NODE_SIDES: [&[usize]; 0] = [];

const EDGE2_SIDES: [&[usize]; 2] = [&[0], &[1]];
const INF_EDGE2_SIDES: [&[usize]; 1] = [&[0]];

const QUAD4_SIDES: [&[usize]; 4] = [&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const QUAD9_SIDES: [&[usize]; 4] = [&[0, 1, 4], &[1, 2, 5], &[2, 3, 6], &[3, 0, 7]];
const INF_QUAD4_SIDES: [&[usize]; 3] = [&[0, 1], &[1, 3], &[0, 2]];

const HEX8_SIDES: [&[usize]; 6] = [
    &[0, 3, 2, 1],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
    &[4, 5, 6, 7],
];
const HEX8_EDGES: [&[usize]; 12] = [
    &[0, 1],
    &[1, 2],
    &[2, 3],
    &[0, 3],
    &[0, 4],
    &[1, 5],
    &[2, 6],
    &[3, 7],
    &[4, 5],
    &[5, 6],
    &[6, 7],
    &[4, 7],
];

const HEX27_SIDES: [&[usize]; 6] = [
    &[0, 3, 2, 1, 11, 10, 9, 8, 20],
    &[0, 1, 5, 4, 8, 13, 16, 12, 21],
    &[1, 2, 6, 5, 9, 14, 17, 13, 22],
    &[2, 3, 7, 6, 10, 15, 18, 14, 23],
    &[3, 0, 4, 7, 11, 12, 19, 15, 24],
    &[4, 5, 6, 7, 16, 17, 18, 19, 25],
];
const HEX27_EDGES: [&[usize]; 12] = [
    &[0, 1, 8],
    &[1, 2, 9],
    &[2, 3, 10],
    &[0, 3, 11],
    &[0, 4, 12],
    &[1, 5, 13],
    &[2, 6, 14],
    &[3, 7, 15],
    &[4, 5, 16],
    &[5, 6, 17],
    &[6, 7, 18],
    &[4, 7, 19],
];

const INF_HEX8_SIDES: [&[usize]; 5] = [
    &[0, 1, 2, 3],
    &[0, 1, 4, 5],
    &[1, 2, 5, 6],
    &[2, 3, 6, 7],
    &[3, 0, 7, 4],
];
const INF_HEX8_EDGES: [&[usize]; 8] = [
    &[0, 1],
    &[1, 2],
    &[2, 3],
    &[0, 3],
    &[0, 4],
    &[1, 5],
    &[2, 6],
    &[3, 7],
];

// --- tensor-product indices -------------------------------------------------
//
// Per node, the 1D basis index along each reference axis. Finite axes use
// 0 -> -1, 1 -> +1, 2 -> 0; radial axes use 0 -> base (v = -1) and
// 1 -> outer node (v = 0).

const NODE_TENSOR: [[u8; 3]; 1] = [[0, 0, 0]];
const EDGE2_TENSOR: [[u8; 3]; 2] = [[0, 0, 0], [1, 0, 0]];
const EDGE3_TENSOR: [[u8; 3]; 3] = [[0, 0, 0], [1, 0, 0], [2, 0, 0]];

const QUAD4_TENSOR: [[u8; 3]; 4] = [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]];
const QUAD9_TENSOR: [[u8; 3]; 9] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [2, 0, 0],
    [1, 2, 0],
    [2, 1, 0],
    [0, 2, 0],
    [2, 2, 0],
];
const INF_QUAD4_TENSOR: [[u8; 3]; 4] = [[0, 0, 0], [1, 0, 0], [0, 1, 0], [1, 1, 0]];

const HEX8_TENSOR: [[u8; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
];
const HEX27_TENSOR: [[u8; 3]; 27] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 1, 0],
    [0, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [1, 1, 1],
    [0, 1, 1],
    [2, 0, 0],
    [1, 2, 0],
    [2, 1, 0],
    [0, 2, 0],
    [0, 0, 2],
    [1, 0, 2],
    [1, 1, 2],
    [0, 1, 2],
    [2, 0, 1],
    [1, 2, 1],
    [2, 1, 1],
    [0, 2, 1],
    [2, 2, 0],
    [2, 0, 2],
    [1, 2, 2],
    [2, 1, 2],
    [0, 2, 2],
    [2, 2, 1],
    [2, 2, 2],
];

impl ElemType {
    /// Every element type, in declaration order.
    pub const ALL: [ElemType; 10] = [
        ElemType::NodeElem,
        ElemType::Edge2,
        ElemType::Edge3,
        ElemType::InfEdge2,
        ElemType::Quad4,
        ElemType::Quad9,
        ElemType::InfQuad4,
        ElemType::Hex8,
        ElemType::Hex27,
        ElemType::InfHex8,
    ];

    /// Topological dimension.
    pub const fn dim(self) -> usize {
        match self {
            ElemType::NodeElem => 0,
            ElemType::Edge2 | ElemType::Edge3 | ElemType::InfEdge2 => 1,
            ElemType::Quad4 | ElemType::Quad9 | ElemType::InfQuad4 => 2,
            ElemType::Hex8 | ElemType::Hex27 | ElemType::InfHex8 => 3,
        }
    }

    pub const fn n_nodes(self) -> usize {
        match self {
            ElemType::NodeElem => 1,
            ElemType::Edge2 | ElemType::InfEdge2 => 2,
            ElemType::Edge3 => 3,
            ElemType::Quad4 | ElemType::InfQuad4 => 4,
            ElemType::Quad9 => 9,
            ElemType::Hex8 | ElemType::InfHex8 => 8,
            ElemType::Hex27 => 27,
        }
    }

    /// Number of vertices; for infinite types only the finite base counts.
    pub const fn n_vertices(self) -> usize {
        match self {
            ElemType::NodeElem | ElemType::InfEdge2 => 1,
            ElemType::Edge2 | ElemType::Edge3 | ElemType::InfQuad4 => 2,
            ElemType::Quad4 | ElemType::Quad9 | ElemType::InfHex8 => 4,
            ElemType::Hex8 | ElemType::Hex27 => 8,
        }
    }

    pub const fn n_sides(self) -> usize {
        self.side_nodes_map().len()
    }

    pub const fn n_edges(self) -> usize {
        match self {
            ElemType::NodeElem | ElemType::Edge2 | ElemType::Edge3 | ElemType::InfEdge2 => 0,
            _ => self.edge_nodes_map().len(),
        }
    }

    pub const fn n_faces(self) -> usize {
        match self {
            ElemType::NodeElem | ElemType::Edge2 | ElemType::Edge3 | ElemType::InfEdge2 => 0,
            ElemType::Quad4 | ElemType::Quad9 | ElemType::InfQuad4 => 1,
            ElemType::Hex8 | ElemType::Hex27 | ElemType::InfHex8 => self.n_sides(),
        }
    }

    /// Children produced by one level of isotropic refinement.
    pub const fn n_children(self) -> usize {
        match self {
            ElemType::NodeElem | ElemType::InfEdge2 => 0,
            ElemType::Edge2 | ElemType::Edge3 | ElemType::InfQuad4 => 2,
            ElemType::Quad4 | ElemType::Quad9 | ElemType::InfHex8 => 4,
            ElemType::Hex8 | ElemType::Hex27 => 8,
        }
    }

    /// Number of linear sub-cells used when writing to visualization formats.
    pub const fn n_sub_elem(self) -> usize {
        match self {
            ElemType::Edge3 => 2,
            ElemType::Quad9 => 4,
            ElemType::Hex27 => 8,
            _ => 1,
        }
    }

    pub const fn is_infinite(self) -> bool {
        matches!(
            self,
            ElemType::InfEdge2 | ElemType::InfQuad4 | ElemType::InfHex8
        )
    }

    /// Order of the geometric (and natural interpolation) basis.
    pub const fn default_order(self) -> Order {
        match self {
            ElemType::Edge3 | ElemType::Quad9 | ElemType::Hex27 => Order::Second,
            _ => Order::First,
        }
    }

    /// The first-order type sharing this type's vertices.
    pub const fn first_order_type(self) -> ElemType {
        match self {
            ElemType::Edge3 => ElemType::Edge2,
            ElemType::Quad9 => ElemType::Quad4,
            ElemType::Hex27 => ElemType::Hex8,
            other => other,
        }
    }

    /// Number of shape functions of the given order on this type.
    pub fn n_shape_functions(self, order: Order) -> Result<usize, MeshGeomError> {
        match order {
            Order::First => Ok(self.first_order_type().n_nodes()),
            Order::Second if self.default_order() == Order::Second => Ok(self.n_nodes()),
            Order::Second => Err(MeshGeomError::UnsupportedOrder {
                elem_type: self,
                order: order.as_u8(),
            }),
        }
    }

    /// Ordered local node indices of each side.
    pub const fn side_nodes_map(self) -> &'static [&'static [usize]] {
        match self {
            ElemType::NodeElem => &NODE_SIDES,
            ElemType::Edge2 | ElemType::Edge3 => &EDGE2_SIDES,
            ElemType::InfEdge2 => &INF_EDGE2_SIDES,
            ElemType::Quad4 => &QUAD4_SIDES,
            ElemType::Quad9 => &QUAD9_SIDES,
            ElemType::InfQuad4 => &INF_QUAD4_SIDES,
            ElemType::Hex8 => &HEX8_SIDES,
            ElemType::Hex27 => &HEX27_SIDES,
            ElemType::InfHex8 => &INF_HEX8_SIDES,
        }
    }

    /// Ordered local node indices of each edge. For 2D types the edges are the
    /// sides; 0D and 1D types have none.
    pub const fn edge_nodes_map(self) -> &'static [&'static [usize]] {
        match self {
            ElemType::NodeElem | ElemType::Edge2 | ElemType::Edge3 | ElemType::InfEdge2 => {
                &NODE_SIDES
            }
            ElemType::Quad4 => &QUAD4_SIDES,
            ElemType::Quad9 => &QUAD9_SIDES,
            ElemType::InfQuad4 => &INF_QUAD4_SIDES,
            ElemType::Hex8 => &HEX8_EDGES,
            ElemType::Hex27 => &HEX27_EDGES,
            ElemType::InfHex8 => &INF_HEX8_EDGES,
        }
    }

    /// Local nodes of side `s`.
    pub fn side_nodes(self, s: usize) -> Result<&'static [usize], MeshGeomError> {
        self.side_nodes_map()
            .get(s)
            .copied()
            .ok_or(MeshGeomError::InvalidSideIndex {
                elem_type: self,
                index: s,
                n_sides: self.n_sides(),
            })
    }

    /// Local nodes of edge `e`.
    pub fn edge_nodes(self, e: usize) -> Result<&'static [usize], MeshGeomError> {
        self.edge_nodes_map()
            .get(e)
            .copied()
            .ok_or(MeshGeomError::InvalidEdgeIndex {
                elem_type: self,
                index: e,
                n_edges: self.n_edges(),
            })
    }

    /// Element type of side `s`.
    ///
    /// The finite base of an infinite element is a finite face; every lateral
    /// side is the infinite type of one lower dimension.
    pub fn side_type(self, s: usize) -> Result<ElemType, MeshGeomError> {
        self.side_nodes(s)?;
        Ok(match self {
            ElemType::Edge2 | ElemType::Edge3 | ElemType::InfEdge2 => ElemType::NodeElem,
            ElemType::Quad4 => ElemType::Edge2,
            ElemType::Quad9 => ElemType::Edge3,
            ElemType::Hex8 => ElemType::Quad4,
            ElemType::Hex27 => ElemType::Quad9,
            ElemType::InfQuad4 if s == 0 => ElemType::Edge2,
            ElemType::InfQuad4 => ElemType::InfEdge2,
            ElemType::InfHex8 if s == 0 => ElemType::Quad4,
            ElemType::InfHex8 => ElemType::InfQuad4,
            // NodeElem has no sides, so `side_nodes` already failed.
            ElemType::NodeElem => unreachable!("NodeElem has no sides"),
        })
    }

    /// Element type of edge `e`: base edges are finite, edges that run out to
    /// infinity are `InfEdge2`.
    pub fn edge_type(self, e: usize) -> Result<ElemType, MeshGeomError> {
        self.edge_nodes(e)?;
        Ok(match self {
            ElemType::Quad9 | ElemType::Hex27 => ElemType::Edge3,
            ElemType::InfQuad4 if e == 0 => ElemType::Edge2,
            ElemType::InfHex8 if e < 4 => ElemType::Edge2,
            ElemType::InfQuad4 | ElemType::InfHex8 => ElemType::InfEdge2,
            _ => ElemType::Edge2,
        })
    }

    fn check_node(self, i: usize) -> Result<(), MeshGeomError> {
        if i < self.n_nodes() {
            Ok(())
        } else {
            Err(MeshGeomError::InvalidNodeIndex {
                elem_type: self,
                index: i,
                n_nodes: self.n_nodes(),
            })
        }
    }

    /// Classify local node `i`.
    ///
    /// For infinite types every node past the finite base is reported as an
    /// edge node, matching the side and edge tables that pair each outer node
    /// with its base vertex.
    pub fn node_role(self, i: usize) -> Result<NodeRole, MeshGeomError> {
        self.check_node(i)?;
        if i < self.n_vertices() {
            return Ok(NodeRole::Vertex);
        }
        Ok(match self {
            ElemType::Edge3 => NodeRole::Edge,
            ElemType::Quad9 => {
                if i < 8 {
                    NodeRole::Edge
                } else {
                    NodeRole::Face
                }
            }
            ElemType::Hex27 => match i {
                8..=19 => NodeRole::Edge,
                20..=25 => NodeRole::Face,
                _ => NodeRole::Interior,
            },
            _ => NodeRole::Edge,
        })
    }

    pub fn is_vertex(self, i: usize) -> Result<bool, MeshGeomError> {
        Ok(self.node_role(i)? == NodeRole::Vertex)
    }

    pub fn is_edge(self, i: usize) -> Result<bool, MeshGeomError> {
        Ok(self.node_role(i)? == NodeRole::Edge)
    }

    pub fn is_face(self, i: usize) -> Result<bool, MeshGeomError> {
        Ok(self.node_role(i)? == NodeRole::Face)
    }

    pub fn is_interior(self, i: usize) -> Result<bool, MeshGeomError> {
        Ok(self.node_role(i)? == NodeRole::Interior)
    }

    /// Whether local node `n` lies on side `s`.
    pub fn is_node_on_side(self, n: usize, s: usize) -> Result<bool, MeshGeomError> {
        Ok(self.side_nodes(s)?.contains(&n))
    }

    /// Whether local node `n` lies on edge `e`.
    pub fn is_node_on_edge(self, n: usize, e: usize) -> Result<bool, MeshGeomError> {
        Ok(self.edge_nodes(e)?.contains(&n))
    }

    /// Basis family along each reference axis (`dim()` entries are meaningful).
    pub(crate) const fn axis_kinds(self) -> [AxisKind; 3] {
        use AxisKind::*;
        match self {
            ElemType::Edge3 | ElemType::Quad9 | ElemType::Hex27 => [Quadratic; 3],
            ElemType::InfEdge2 => [Radial, Linear, Linear],
            ElemType::InfQuad4 => [Linear, Radial, Linear],
            ElemType::InfHex8 => [Linear, Linear, Radial],
            _ => [Linear; 3],
        }
    }

    /// Per-node 1D basis indices along each reference axis.
    pub(crate) const fn tensor_indices(self) -> &'static [[u8; 3]] {
        match self {
            ElemType::NodeElem => &NODE_TENSOR,
            ElemType::Edge2 | ElemType::InfEdge2 => &EDGE2_TENSOR,
            ElemType::Edge3 => &EDGE3_TENSOR,
            ElemType::Quad4 => &QUAD4_TENSOR,
            ElemType::Quad9 => &QUAD9_TENSOR,
            ElemType::InfQuad4 => &INF_QUAD4_TENSOR,
            // the base of InfHex8 is numbered like Quad4, outer layer on top
            ElemType::Hex8 | ElemType::InfHex8 => &HEX8_TENSOR,
            ElemType::Hex27 => &HEX27_TENSOR,
        }
    }

    /// Reference coordinates of local node `i`.
    pub fn reference_node(self, i: usize) -> Result<Point, MeshGeomError> {
        self.check_node(i)?;
        let idx = self.tensor_indices()[i];
        let kinds = self.axis_kinds();
        let mut xi = Point::zero();
        for axis in 0..self.dim() {
            xi[axis] = match (kinds[axis], idx[axis]) {
                (AxisKind::Radial, 0) => -1.0,
                (AxisKind::Radial, _) => 0.0,
                (_, 0) => -1.0,
                (_, 1) => 1.0,
                _ => 0.0,
            };
        }
        Ok(xi)
    }

    /// Index of the first node past the finite base of an infinite type.
    pub const fn first_outer_node(self) -> Option<usize> {
        if self.is_infinite() {
            Some(self.n_vertices())
        } else {
            None
        }
    }

    /// Upper-case name used in logs and file headers.
    pub const fn name(self) -> &'static str {
        match self {
            ElemType::NodeElem => "NODEELEM",
            ElemType::Edge2 => "EDGE2",
            ElemType::Edge3 => "EDGE3",
            ElemType::InfEdge2 => "INFEDGE2",
            ElemType::Quad4 => "QUAD4",
            ElemType::Quad9 => "QUAD9",
            ElemType::InfQuad4 => "INFQUAD4",
            ElemType::Hex8 => "HEX8",
            ElemType::Hex27 => "HEX27",
            ElemType::InfHex8 => "INFHEX8",
        }
    }
}

impl fmt::Display for ElemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ElemType {
    type Err = MeshGeomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        ElemType::ALL
            .into_iter()
            .find(|t| t.name() == upper)
            .ok_or_else(|| MeshGeomError::MeshIoParse(format!("unknown element type '{s}'")))
    }
}

//! In-memory unstructured mesh: a node arena and an element arena.
//!
//! Elements refer to nodes by arena index; a node's `id` keeps the tag it had
//! in the file it was read from.

use crate::debug_invariants::DebugInvariants;
use crate::geometry::bounding_box::BoundingBox;
use crate::geometry::point::Point;
use crate::mesh_error::MeshGeomError;
use crate::topology::elem::Elem;
use crate::topology::elem_type::ElemType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A mesh vertex.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// External identifier (file tag).
    pub id: usize,
    pub point: Point,
}

/// Nodes plus elements over them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    nodes: Vec<Node>,
    elems: Vec<Elem>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n_nodes: usize, n_elems: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(n_nodes),
            elems: Vec::with_capacity(n_elems),
        }
    }

    /// Append a node whose id equals its index; returns the index.
    pub fn add_node(&mut self, point: Point) -> usize {
        let id = self.nodes.len();
        self.add_node_with_id(id, point)
    }

    /// Append a node carrying an external id; returns its index.
    pub fn add_node_with_id(&mut self, id: usize, point: Point) -> usize {
        self.nodes.push(Node { id, point });
        self.nodes.len() - 1
    }

    /// Append an element in subdomain 0; returns its index.
    pub fn add_elem(&mut self, elem_type: ElemType, nodes: Vec<usize>) -> Result<usize, MeshGeomError> {
        self.push_elem(Elem::new(elem_type, nodes)?)
    }

    /// Append a prepared element, validating its node indices. The element's
    /// `id` is overwritten with its arena index.
    pub fn push_elem(&mut self, mut elem: Elem) -> Result<usize, MeshGeomError> {
        let id = self.elems.len();
        if elem.nodes.len() != elem.elem_type.n_nodes() {
            return Err(MeshGeomError::NodeCountMismatch {
                elem_type: elem.elem_type,
                expected: elem.elem_type.n_nodes(),
                found: elem.nodes.len(),
            });
        }
        if let Some(&bad) = elem.nodes.iter().find(|&&n| n >= self.nodes.len()) {
            return Err(MeshGeomError::InvalidConnectivity {
                elem: id,
                node: bad,
                n_nodes: self.nodes.len(),
            });
        }
        elem.id = id;
        self.elems.push(elem);
        Ok(id)
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_elem(&self) -> usize {
        self.elems.len()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn elems(&self) -> &[Elem] {
        &self.elems
    }

    /// Node `i`. Panics if out of range.
    pub fn node(&self, i: usize) -> &Node {
        &self.nodes[i]
    }

    /// Position of node `i`. Panics if out of range.
    pub fn point(&self, i: usize) -> Point {
        self.nodes[i].point
    }

    /// Element `i`. Panics if out of range.
    pub fn elem(&self, i: usize) -> &Elem {
        &self.elems[i]
    }

    pub fn elem_mut(&mut self, i: usize) -> &mut Elem {
        &mut self.elems[i]
    }

    pub fn get_elem(&self, i: usize) -> Option<&Elem> {
        self.elems.get(i)
    }

    /// Node positions of `elem` in local order.
    pub fn elem_points(&self, elem: &Elem) -> Vec<Point> {
        elem.points(self)
    }

    /// Largest element dimension (0 for an empty mesh).
    pub fn mesh_dimension(&self) -> usize {
        self.elems.iter().map(Elem::dim).max().unwrap_or(0)
    }

    /// Bounding box of all nodes.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.nodes.iter().map(|n| &n.point))
    }

    /// Element counts per type.
    pub fn elem_type_counts(&self) -> BTreeMap<ElemType, usize> {
        let mut counts = BTreeMap::new();
        for e in &self.elems {
            *counts.entry(e.elem_type).or_insert(0) += 1;
        }
        counts
    }

    /// Index of the node with external id `id`, by linear search.
    pub fn node_index_of(&self, id: usize) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }
}

impl fmt::Display for Mesh {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, " Mesh Information:")?;
        writeln!(f, "  mesh_dimension()={}", self.mesh_dimension())?;
        writeln!(f, "  n_nodes()={}", self.n_nodes())?;
        writeln!(f, "  n_elem()={}", self.n_elem())?;
        for (t, n) in self.elem_type_counts() {
            writeln!(f, "   {t}: {n}")?;
        }
        if let Some(bbox) = self.bounding_box() {
            writeln!(f, "  bounding box {bbox}")?;
        }
        Ok(())
    }
}

impl DebugInvariants for Mesh {
    fn debug_assert_invariants(&self) {
        crate::debug_invariants!(self.validate_invariants(), "Mesh");
    }

    fn validate_invariants(&self) -> Result<(), MeshGeomError> {
        for (i, e) in self.elems.iter().enumerate() {
            if e.id != i {
                return Err(MeshGeomError::InvalidGeometry(format!(
                    "element at index {i} carries id {}",
                    e.id
                )));
            }
            if e.nodes.len() != e.elem_type.n_nodes() {
                return Err(MeshGeomError::NodeCountMismatch {
                    elem_type: e.elem_type,
                    expected: e.elem_type.n_nodes(),
                    found: e.nodes.len(),
                });
            }
            if let Some(&bad) = e.nodes.iter().find(|&&n| n >= self.nodes.len()) {
                return Err(MeshGeomError::InvalidConnectivity {
                    elem: i,
                    node: bad,
                    n_nodes: self.nodes.len(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_dangling_and_short_connectivity() {
        let mut mesh = Mesh::new();
        mesh.add_node(Point::zero());
        mesh.add_node(Point::new(1.0, 0.0, 0.0));
        assert_eq!(
            mesh.add_elem(ElemType::Edge2, vec![0, 2]),
            Err(MeshGeomError::InvalidConnectivity {
                elem: 0,
                node: 2,
                n_nodes: 2
            })
        );
        assert!(matches!(
            mesh.add_elem(ElemType::Edge3, vec![0, 1]),
            Err(MeshGeomError::NodeCountMismatch { expected: 3, .. })
        ));
        let e = mesh.add_elem(ElemType::Edge2, vec![0, 1]).unwrap();
        assert_eq!(mesh.elem(e).id, 0);
        assert_eq!(mesh.mesh_dimension(), 1);
        assert!(mesh.validate_invariants().is_ok());
    }

    #[test]
    fn summary_lists_types() {
        let mut mesh = Mesh::new();
        mesh.add_node_with_id(42, Point::zero());
        mesh.add_elem(ElemType::NodeElem, vec![0]).unwrap();
        let text = mesh.to_string();
        assert!(text.contains("n_nodes()=1"));
        assert!(text.contains("NODEELEM: 1"));
        assert_eq!(mesh.node_index_of(42), Some(0));
    }
}

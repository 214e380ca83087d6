//! Mesh elements and their sub-element views.
//!
//! An [`Elem`] stores node *indices* into its mesh; coordinates are looked up
//! through the owning [`Mesh`] whenever geometry is needed. Sides and edges are
//! produced either as borrowed [`ElemView`]s that reuse the parent's node
//! indices through the static side/edge tables, or as detached, owned
//! [`Elem`]s.

use crate::fe::{LagrangeMap, ReferenceMapping};
use crate::geometry::bounding_box::BoundingBox;
use crate::geometry::point::Point;
use crate::mesh::Mesh;
use crate::mesh_error::MeshGeomError;
use crate::topology::connectivity::{local_connectivity, IoPackage};
use crate::topology::elem_type::ElemType;
use crate::topology::refine::{embedding_matrix, EmbeddingMatrix};
use serde::{Deserialize, Serialize};

/// Squared-distance margin of the infinite-element fast rejection.
pub const FAST_REJECT_MARGIN: f64 = 1.01;

/// A cell of a mesh.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Elem {
    /// Index of the element in its mesh.
    pub id: usize,
    pub elem_type: ElemType,
    /// Global node indices in local node order.
    pub nodes: Vec<usize>,
    pub subdomain_id: u16,
}

/// How [`Elem::build_side`] hands out the side.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SideMode {
    /// Borrow the parent's node indices.
    Proxy,
    /// Copy them into a new element.
    Detached,
}

/// Borrowed side or edge of an element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElemView<'a> {
    parent: &'a Elem,
    elem_type: ElemType,
    local_nodes: &'static [usize],
}

/// A side or edge: either a view into the parent or an owned element.
#[derive(Clone, Debug, PartialEq)]
pub enum SubElem<'a> {
    Borrowed(ElemView<'a>),
    Owned(Elem),
}

impl<'a> ElemView<'a> {
    pub fn elem_type(&self) -> ElemType {
        self.elem_type
    }

    pub fn parent(&self) -> &'a Elem {
        self.parent
    }

    /// Parent-local node numbers making up this view.
    pub fn local_nodes(&self) -> &'static [usize] {
        self.local_nodes
    }

    pub fn n_nodes(&self) -> usize {
        self.local_nodes.len()
    }

    /// Global index of node `i` of the view.
    pub fn node(&self, i: usize) -> Option<usize> {
        self.local_nodes.get(i).map(|&l| self.parent.nodes[l])
    }

    pub fn nodes(&self) -> impl Iterator<Item = usize> + 'a {
        let parent = self.parent;
        self.local_nodes.iter().map(move |&l| parent.nodes[l])
    }

    /// Copy into an independent element tagged with the parent's subdomain.
    pub fn to_elem(&self) -> Elem {
        Elem {
            id: self.parent.id,
            elem_type: self.elem_type,
            nodes: self.nodes().collect(),
            subdomain_id: self.parent.subdomain_id,
        }
    }
}

impl SubElem<'_> {
    pub fn elem_type(&self) -> ElemType {
        match self {
            SubElem::Borrowed(v) => v.elem_type(),
            SubElem::Owned(e) => e.elem_type,
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, SubElem::Owned(_))
    }

    pub fn n_nodes(&self) -> usize {
        match self {
            SubElem::Borrowed(v) => v.n_nodes(),
            SubElem::Owned(e) => e.nodes.len(),
        }
    }

    pub fn node(&self, i: usize) -> Option<usize> {
        match self {
            SubElem::Borrowed(v) => v.node(i),
            SubElem::Owned(e) => e.nodes.get(i).copied(),
        }
    }

    pub fn node_ids(&self) -> Vec<usize> {
        match self {
            SubElem::Borrowed(v) => v.nodes().collect(),
            SubElem::Owned(e) => e.nodes.clone(),
        }
    }

    /// Take ownership, copying a borrowed view if needed.
    pub fn into_elem(self) -> Elem {
        match self {
            SubElem::Borrowed(v) => v.to_elem(),
            SubElem::Owned(e) => e,
        }
    }
}

impl Elem {
    /// New element with `id` 0 and subdomain 0; the mesh assigns the id.
    pub fn new(elem_type: ElemType, nodes: Vec<usize>) -> Result<Self, MeshGeomError> {
        if nodes.len() != elem_type.n_nodes() {
            return Err(MeshGeomError::NodeCountMismatch {
                elem_type,
                expected: elem_type.n_nodes(),
                found: nodes.len(),
            });
        }
        Ok(Self {
            id: 0,
            elem_type,
            nodes,
            subdomain_id: 0,
        })
    }

    pub fn with_subdomain(mut self, subdomain_id: u16) -> Self {
        self.subdomain_id = subdomain_id;
        self
    }

    pub fn dim(&self) -> usize {
        self.elem_type.dim()
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_sides(&self) -> usize {
        self.elem_type.n_sides()
    }

    pub fn n_edges(&self) -> usize {
        self.elem_type.n_edges()
    }

    pub fn is_infinite(&self) -> bool {
        self.elem_type.is_infinite()
    }

    /// Global index of local node `i`.
    pub fn node(&self, i: usize) -> Result<usize, MeshGeomError> {
        self.nodes
            .get(i)
            .copied()
            .ok_or(MeshGeomError::InvalidNodeIndex {
                elem_type: self.elem_type,
                index: i,
                n_nodes: self.nodes.len(),
            })
    }

    pub fn is_node_on_side(&self, n: usize, s: usize) -> Result<bool, MeshGeomError> {
        self.elem_type.is_node_on_side(n, s)
    }

    pub fn is_node_on_edge(&self, n: usize, e: usize) -> Result<bool, MeshGeomError> {
        self.elem_type.is_node_on_edge(n, e)
    }

    /// Side `i` as a lower-dimensional element.
    pub fn build_side(&self, i: usize, mode: SideMode) -> Result<SubElem<'_>, MeshGeomError> {
        let view = ElemView {
            parent: self,
            elem_type: self.elem_type.side_type(i)?,
            local_nodes: self.elem_type.side_nodes(i)?,
        };
        Ok(match mode {
            SideMode::Proxy => SubElem::Borrowed(view),
            SideMode::Detached => SubElem::Owned(view.to_elem()),
        })
    }

    /// Edge `i` as a borrowed view.
    pub fn build_edge(&self, i: usize) -> Result<ElemView<'_>, MeshGeomError> {
        Ok(ElemView {
            parent: self,
            elem_type: self.elem_type.edge_type(i)?,
            local_nodes: self.elem_type.edge_nodes(i)?,
        })
    }

    /// Node coordinates in local order.
    pub fn points(&self, mesh: &Mesh) -> Vec<Point> {
        self.nodes.iter().map(|&n| mesh.point(n)).collect()
    }

    /// Average of the node positions (or of the base nodes for infinite types).
    pub fn centroid(&self, mesh: &Mesh) -> Point {
        let n = self.elem_type.n_vertices().min(self.nodes.len());
        let pts: Vec<Point> = self.nodes[..n].iter().map(|&i| mesh.point(i)).collect();
        Point::average(&pts).unwrap_or_default()
    }

    pub fn bounding_box(&self, mesh: &Mesh) -> BoundingBox {
        BoundingBox::from_points(&self.points(mesh)).unwrap_or_else(BoundingBox::empty)
    }

    /// Point the infinite direction radiates from; `None` for finite types.
    pub fn origin(&self, mesh: &Mesh) -> Option<Point> {
        infinite_origin(self.elem_type, &self.points(mesh))
    }

    /// Whether `p` lies in this element, with reference-space tolerance `tol`.
    pub fn contains_point(&self, mesh: &Mesh, p: &Point, tol: f64) -> bool {
        self.locate_reference(mesh, &LagrangeMap::default(), p, tol)
            .is_some()
    }

    /// Reference coordinates of `p` if the element contains it.
    pub fn locate_reference<M: ReferenceMapping>(
        &self,
        mesh: &Mesh,
        mapping: &M,
        p: &Point,
        tol: f64,
    ) -> Option<Point> {
        locate_in(mapping, self.elem_type, &self.points(mesh), p, tol)
    }

    /// Global node ids of `sub_cell` in the ordering of `package`.
    ///
    /// Tecplot ids are 1-based, VTK ids 0-based.
    pub fn connectivity(
        &self,
        sub_cell: usize,
        package: IoPackage,
    ) -> Result<Vec<usize>, MeshGeomError> {
        let shift = match package {
            IoPackage::Tecplot => 1,
            IoPackage::Vtk => 0,
        };
        Ok(local_connectivity(self.elem_type, sub_cell, package)?
            .into_iter()
            .map(|l| self.nodes[l] + shift)
            .collect())
    }

    /// Coefficients of child `child`'s nodes in terms of this element's nodes.
    pub fn embedding_matrix(&self, child: usize) -> Result<&'static EmbeddingMatrix, MeshGeomError> {
        embedding_matrix(self.elem_type, child)
    }
}

/// `2 * x_0 - x_outer`, the point behind the base that outer nodes radiate from.
pub fn infinite_origin(elem_type: ElemType, points: &[Point]) -> Option<Point> {
    let outer = elem_type.first_outer_node()?;
    let (base, far) = (points.first()?, points.get(outer)?);
    Some(*base * 2.0 - *far)
}

/// One-sided rejection test for infinite elements.
///
/// Returns `true` when `p` is closer to the element origin than every base
/// node (with a 1% margin on squared distances), in which case `p` cannot be
/// inside. `false` says nothing about containment. Always `false` for finite
/// types.
pub fn fast_reject(elem_type: ElemType, points: &[Point], p: &Point) -> bool {
    let Some(origin) = infinite_origin(elem_type, points) else {
        return false;
    };
    let min_base_sq = points[..elem_type.n_vertices()]
        .iter()
        .map(|b| b.distance_sq(&origin))
        .fold(f64::INFINITY, f64::min);
    FAST_REJECT_MARGIN * p.distance_sq(&origin) < min_base_sq
}

/// Containment test on raw geometry; returns the reference point on success.
///
/// Inverse-map failures count as "not contained". Elements of dimension below
/// three must also map back to within `tol` (scaled by element size) of `p`,
/// since the inverse map there is a projection.
pub fn locate_in<M: ReferenceMapping>(
    mapping: &M,
    elem_type: ElemType,
    points: &[Point],
    p: &Point,
    tol: f64,
) -> Option<Point> {
    if fast_reject(elem_type, points, p) {
        return None;
    }
    let xi = match mapping.inverse_map(elem_type, points, p, tol) {
        Ok(xi) => xi,
        Err(err) => {
            log::trace!("treating point {p} as outside: {err}");
            return None;
        }
    };
    if !mapping.on_reference_domain(&xi, elem_type, tol) {
        return None;
    }
    if elem_type.dim() < 3 {
        let back = mapping.map(elem_type, points, &xi).ok()?;
        let size = BoundingBox::from_points(points)
            .map(|b| b.diagonal())
            .unwrap_or(0.0)
            .max(1.0e-300);
        let allowed = if elem_type.is_infinite() {
            tol * size.max(p.norm())
        } else {
            tol * size
        };
        if back.distance_sq(p) > allowed * allowed {
            return None;
        }
    }
    Some(xi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_hex_mesh() -> (Mesh, usize) {
        let mut mesh = Mesh::new();
        for i in 0..8 {
            let r = ElemType::Hex8.reference_node(i).unwrap();
            mesh.add_node((r + Point::new(1.0, 1.0, 1.0)) * 0.5);
        }
        let e = mesh.add_elem(ElemType::Hex8, (0..8).collect()).unwrap();
        (mesh, e)
    }

    #[test]
    fn proxy_and_detached_sides_agree() {
        let (mut mesh, e) = unit_hex_mesh();
        mesh.elem_mut(e).subdomain_id = 7;
        let elem = mesh.elem(e);
        let proxy = elem.build_side(2, SideMode::Proxy).unwrap();
        let owned = elem.build_side(2, SideMode::Detached).unwrap();
        assert!(!proxy.is_owned());
        assert!(owned.is_owned());
        assert_eq!(proxy.node_ids(), vec![1, 2, 6, 5]);
        assert_eq!(proxy.node_ids(), owned.node_ids());
        assert_eq!(owned.elem_type(), ElemType::Quad4);
        assert_eq!(owned.into_elem().subdomain_id, 7);
        assert!(matches!(
            elem.build_side(6, SideMode::Proxy),
            Err(MeshGeomError::InvalidSideIndex { index: 6, .. })
        ));
    }

    #[test]
    fn hex_contains_its_nodes_and_rejects_outside() {
        let (mesh, e) = unit_hex_mesh();
        let elem = mesh.elem(e);
        for n in 0..8 {
            assert!(elem.contains_point(&mesh, &mesh.point(n), 1e-8));
        }
        assert!(elem.contains_point(&mesh, &Point::new(0.5, 0.5, 0.5), 1e-8));
        assert!(!elem.contains_point(&mesh, &Point::new(1.2, 0.5, 0.5), 1e-8));
        assert_eq!(elem.connectivity(0, IoPackage::Tecplot).unwrap(), (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn quad_in_3d_needs_to_touch_the_point() {
        let mut mesh = Mesh::new();
        for p in [
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(1.0, 1.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
        ] {
            mesh.add_node(p);
        }
        let e = mesh.add_elem(ElemType::Quad4, vec![0, 1, 2, 3]).unwrap();
        let elem = mesh.elem(e);
        assert!(elem.contains_point(&mesh, &Point::new(0.3, 0.6, 0.0), 1e-8));
        assert!(!elem.contains_point(&mesh, &Point::new(0.3, 0.6, 0.1), 1e-8));
    }

    #[test]
    fn infinite_hex_fast_reject_and_containment() {
        let mut mesh = Mesh::new();
        let base = [
            Point::new(-0.5, -0.5, 1.0),
            Point::new(0.5, -0.5, 1.0),
            Point::new(0.5, 0.5, 1.0),
            Point::new(-0.5, 0.5, 1.0),
        ];
        for b in base {
            mesh.add_node(b);
        }
        for b in base {
            mesh.add_node(b * 2.0);
        }
        let e = mesh.add_elem(ElemType::InfHex8, (0..8).collect()).unwrap();
        let elem = mesh.elem(e);
        assert_eq!(elem.origin(&mesh), Some(Point::zero()));

        let pts = elem.points(&mesh);
        assert!(fast_reject(ElemType::InfHex8, &pts, &Point::new(0.0, 0.0, 0.5)));
        assert!(!elem.contains_point(&mesh, &Point::new(0.0, 0.0, 0.5), 1e-8));
        // far out along the infinite direction
        assert!(elem.contains_point(&mesh, &Point::new(0.1, -0.2, 40.0), 1e-8));
        assert!(!elem.contains_point(&mesh, &Point::new(30.0, 0.0, 40.0), 1e-8));
    }

    #[test]
    fn infinite_edges_and_sides() {
        let elem = Elem::new(ElemType::InfHex8, (10..18).collect()).unwrap();
        let e5 = elem.build_edge(5).unwrap();
        assert_eq!(e5.elem_type(), ElemType::InfEdge2);
        assert_eq!(e5.nodes().collect::<Vec<_>>(), vec![11, 15]);
        let s0 = elem.build_side(0, SideMode::Proxy).unwrap();
        assert_eq!(s0.elem_type(), ElemType::Quad4);
        assert!(elem.build_edge(8).is_err());
    }
}

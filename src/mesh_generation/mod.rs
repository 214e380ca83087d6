//! Structured box mesh generators.
//!
//! Nodes are laid out on a lattice with `order * n + 1` points per direction
//! (x fastest), and every element picks its nodes from that lattice through
//! its type's tensor-index table, so first- and second-order meshes share one
//! code path.

use crate::geometry::bounding_box::BoundingBox;
use crate::geometry::point::Point;
use crate::mesh::Mesh;
use crate::mesh_error::MeshGeomError;
use crate::topology::elem_type::{ElemType, Order};
use serde::{Deserialize, Serialize};

/// Optional configuration for mesh generation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshGenerationOptions {
    /// Subdomain id given to every generated element.
    pub subdomain_id: u16,
}

fn invalid_geometry(message: impl Into<String>) -> MeshGeomError {
    MeshGeomError::InvalidGeometry(message.into())
}

fn lattice_offset(idx: u8, order: usize) -> usize {
    match idx {
        0 => 0,
        1 => order,
        _ => 1,
    }
}

fn build_lattice_mesh(
    counts: [usize; 3],
    bounds: BoundingBox,
    elem_type: ElemType,
    options: MeshGenerationOptions,
) -> Result<Mesh, MeshGeomError> {
    let dim = elem_type.dim();
    if elem_type.is_infinite() || dim == 0 {
        return Err(invalid_geometry(format!(
            "{elem_type} cannot be generated on a box lattice"
        )));
    }
    if counts[..dim].iter().any(|&n| n == 0) {
        return Err(invalid_geometry("element counts must be non-zero"));
    }
    if bounds.is_empty() {
        return Err(invalid_geometry(format!("empty bounds {bounds}")));
    }
    let order = match elem_type.default_order() {
        Order::First => 1,
        Order::Second => 2,
    };
    let mut n_pts = [1usize; 3];
    for a in 0..dim {
        n_pts[a] = order * counts[a] + 1;
    }

    let extent = bounds.extent();
    let mut mesh = Mesh::with_capacity(
        n_pts.iter().product(),
        counts[..dim].iter().product(),
    );
    for k in 0..n_pts[2] {
        for j in 0..n_pts[1] {
            for i in 0..n_pts[0] {
                let lattice = [i, j, k];
                let mut p = bounds.min;
                for a in 0..dim {
                    p[a] += extent[a] * lattice[a] as f64 / (n_pts[a] - 1) as f64;
                }
                mesh.add_node(p);
            }
        }
    }

    let node_at = |l: [usize; 3]| l[0] + n_pts[0] * (l[1] + n_pts[1] * l[2]);
    let mut cells = [1usize; 3];
    cells[..dim].copy_from_slice(&counts[..dim]);
    for ez in 0..cells[2] {
        for ey in 0..cells[1] {
            for ex in 0..cells[0] {
                let e = [ex, ey, ez];
                let nodes = elem_type
                    .tensor_indices()
                    .iter()
                    .map(|idx| {
                        let mut l = [0usize; 3];
                        for a in 0..dim {
                            l[a] = order * e[a] + lattice_offset(idx[a], order);
                        }
                        node_at(l)
                    })
                    .collect();
                let id = mesh.add_elem(elem_type, nodes)?;
                mesh.elem_mut(id).subdomain_id = options.subdomain_id;
            }
        }
    }
    Ok(mesh)
}

/// `nx * ny * nz` hexahedra (`Hex8` or `Hex27`) filling `bounds`.
pub fn structured_hex_mesh(
    nx: usize,
    ny: usize,
    nz: usize,
    bounds: BoundingBox,
    elem_type: ElemType,
) -> Result<Mesh, MeshGeomError> {
    if !matches!(elem_type, ElemType::Hex8 | ElemType::Hex27) {
        return Err(invalid_geometry(format!("{elem_type} is not a hexahedron")));
    }
    build_lattice_mesh([nx, ny, nz], bounds, elem_type, MeshGenerationOptions::default())
}

/// `nx * ny` quadrilaterals (`Quad4` or `Quad9`) in the plane `z = bounds.min.z`.
pub fn structured_quad_mesh(
    nx: usize,
    ny: usize,
    bounds: BoundingBox,
    elem_type: ElemType,
) -> Result<Mesh, MeshGeomError> {
    if !matches!(elem_type, ElemType::Quad4 | ElemType::Quad9) {
        return Err(invalid_geometry(format!("{elem_type} is not a quadrilateral")));
    }
    build_lattice_mesh([nx, ny, 1], bounds, elem_type, MeshGenerationOptions::default())
}

/// `nx` segments (`Edge2` or `Edge3`) from `x0` to `x1`.
pub fn structured_edge_mesh(
    nx: usize,
    x0: f64,
    x1: f64,
    elem_type: ElemType,
) -> Result<Mesh, MeshGeomError> {
    if !matches!(elem_type, ElemType::Edge2 | ElemType::Edge3) {
        return Err(invalid_geometry(format!("{elem_type} is not an edge")));
    }
    let bounds = BoundingBox::new(Point::new(x0, 0.0, 0.0), Point::new(x1, 0.0, 0.0));
    build_lattice_mesh([nx, 1, 1], bounds, elem_type, MeshGenerationOptions::default())
}

/// Any supported box mesh with explicit options.
pub fn structured_mesh_with_options(
    counts: [usize; 3],
    bounds: BoundingBox,
    elem_type: ElemType,
    options: MeshGenerationOptions,
) -> Result<Mesh, MeshGeomError> {
    build_lattice_mesh(counts, bounds, elem_type, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> BoundingBox {
        BoundingBox::new(Point::zero(), Point::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn hex_counts() {
        let m8 = structured_hex_mesh(2, 3, 4, unit(), ElemType::Hex8).unwrap();
        assert_eq!(m8.n_elem(), 24);
        assert_eq!(m8.n_nodes(), 3 * 4 * 5);
        let m27 = structured_hex_mesh(2, 2, 2, unit(), ElemType::Hex27).unwrap();
        assert_eq!(m27.n_nodes(), 5 * 5 * 5);
        // interior node of the first element sits at its centre
        let centre = m27.point(m27.elem(0).nodes[26]);
        assert!(centre.abs_fuzzy_eq(&Point::new(0.25, 0.25, 0.25), 1e-14));
    }

    #[test]
    fn quad_mesh_is_planar() {
        let bounds = BoundingBox::new(Point::new(0.0, 0.0, 2.0), Point::new(1.0, 2.0, 2.0));
        let mesh = structured_quad_mesh(2, 2, bounds, ElemType::Quad9).unwrap();
        assert_eq!(mesh.n_nodes(), 25);
        assert!(mesh.nodes().iter().all(|n| n.point.z == 2.0));
        assert_eq!(mesh.mesh_dimension(), 2);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(structured_hex_mesh(1, 1, 1, unit(), ElemType::Quad4).is_err());
        assert!(structured_mesh_with_options(
            [1, 1, 1],
            unit(),
            ElemType::InfHex8,
            MeshGenerationOptions::default()
        )
        .is_err());
    }
}

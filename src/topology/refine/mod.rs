//! Refinement embedding rules and uniform mesh refinement.
//!
//! Child `c` of an element occupies the half (quarter, eighth) of the parent's
//! reference domain selected by the bits of `c`: bit 0 picks the upper half in
//! the first reference direction, bit 1 the second, bit 2 the third. Infinite
//! elements only split their finite base, so the radial direction never
//! carries a bit.
//!
//! # Expected invariants
//! - Every row of every embedding matrix sums to 1.
//! - A child node shared by neighbouring children (or neighbouring parents)
//!   has the same parent-node coefficients from every side, so
//!   [`uniform_refine`] can deduplicate nodes by those coefficients.

use crate::data::field::Field;
use crate::fe::shape;
use crate::geometry::point::Point;
use crate::mesh::Mesh;
use crate::mesh_error::MeshGeomError;
use crate::topology::elem::Elem;
use crate::topology::elem_type::{AxisKind, ElemType};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Coefficients `C[k][j]` giving child node `k` as `sum_j C[k][j] * parent node j`.
#[derive(Clone, Debug, PartialEq)]
pub struct EmbeddingMatrix {
    n_child_nodes: usize,
    n_parent_nodes: usize,
    coeffs: Vec<f64>,
}

impl EmbeddingMatrix {
    fn from_rows<const N: usize>(rows: &[[f64; N]]) -> Self {
        Self {
            n_child_nodes: rows.len(),
            n_parent_nodes: N,
            coeffs: rows.iter().flatten().copied().collect(),
        }
    }

    pub fn n_child_nodes(&self) -> usize {
        self.n_child_nodes
    }

    pub fn n_parent_nodes(&self) -> usize {
        self.n_parent_nodes
    }

    /// Coefficients of child node `k`.
    pub fn row(&self, k: usize) -> &[f64] {
        &self.coeffs[k * self.n_parent_nodes..(k + 1) * self.n_parent_nodes]
    }

    pub fn get(&self, k: usize, j: usize) -> f64 {
        self.row(k)[j]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        self.coeffs.chunks_exact(self.n_parent_nodes)
    }
}

const INF_QUAD4_EMBEDDING: [[[f64; 4]; 4]; 2] = [
    [
        [1.0, 0.0, 0.0, 0.0],
        [0.5, 0.5, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.5, 0.5],
    ],
    [
        [0.5, 0.5, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 0.5, 0.5],
        [0.0, 0.0, 0.0, 1.0],
    ],
];

const INF_HEX8_EMBEDDING: [[[f64; 8]; 8]; 4] = [
    [
        [1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.25, 0.25, 0.25, 0.25, 0.0, 0.0, 0.0, 0.0],
        [0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.25, 0.25, 0.25, 0.25],
        [0.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.5],
    ],
    [
        [0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.25, 0.25, 0.25, 0.25, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.25, 0.25, 0.25, 0.25],
    ],
    [
        [0.5, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.25, 0.25, 0.25, 0.25, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.5],
        [0.0, 0.0, 0.0, 0.0, 0.25, 0.25, 0.25, 0.25],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0],
    ],
    [
        [0.25, 0.25, 0.25, 0.25, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.5, 0.5, 0.0, 0.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.25, 0.25, 0.25, 0.25],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5, 0.5],
    ],
];

/// Reference position, in the parent, of child `child`'s node at child
/// reference point `xi`.
pub fn child_to_parent(elem_type: ElemType, child: usize, xi: &Point) -> Point {
    let kinds = elem_type.axis_kinds();
    let mut out = *xi;
    let mut bit = 0;
    for a in 0..elem_type.dim() {
        if kinds[a] == AxisKind::Radial {
            continue;
        }
        let upper = ((child >> bit) & 1) as f64;
        out[a] = 0.5 * (xi[a] - 1.0) + upper;
        bit += 1;
    }
    out
}

/// Embedding matrix of a finite Lagrange type: parent shape functions
/// evaluated at the child's node positions.
fn computed_embedding(elem_type: ElemType, child: usize) -> Result<EmbeddingMatrix, MeshGeomError> {
    let n = elem_type.n_nodes();
    let mut coeffs = Vec::with_capacity(n * n);
    for k in 0..n {
        let xi = child_to_parent(elem_type, child, &elem_type.reference_node(k)?);
        let phi = shape::shape_values(elem_type, elem_type.default_order(), &xi)?;
        // exact zeros keep node keys stable
        coeffs.extend(phi.into_iter().map(|c| if c.abs() < 1e-13 { 0.0 } else { c }));
    }
    Ok(EmbeddingMatrix {
        n_child_nodes: n,
        n_parent_nodes: n,
        coeffs,
    })
}

static EMBEDDINGS: Lazy<HashMap<ElemType, Vec<EmbeddingMatrix>>> = Lazy::new(|| {
    let mut table = HashMap::new();
    for t in ElemType::ALL {
        let children: Vec<EmbeddingMatrix> = match t {
            ElemType::InfQuad4 => INF_QUAD4_EMBEDDING
                .iter()
                .map(|m| EmbeddingMatrix::from_rows(m.as_slice()))
                .collect(),
            ElemType::InfHex8 => INF_HEX8_EMBEDDING
                .iter()
                .map(|m| EmbeddingMatrix::from_rows(m.as_slice()))
                .collect(),
            _ => (0..t.n_children())
                .filter_map(|c| computed_embedding(t, c).ok())
                .collect(),
        };
        table.insert(t, children);
    }
    log::debug!("embedding tables initialised for {} element types", table.len());
    table
});

/// Force construction of the embedding tables.
pub fn init_embedding_tables() {
    Lazy::force(&EMBEDDINGS);
}

/// Embedding matrix of child `child` of `elem_type`.
pub fn embedding_matrix(
    elem_type: ElemType,
    child: usize,
) -> Result<&'static EmbeddingMatrix, MeshGeomError> {
    EMBEDDINGS
        .get(&elem_type)
        .and_then(|children| children.get(child))
        .ok_or(MeshGeomError::InvalidChildIndex {
            elem_type,
            index: child,
            n_children: elem_type.n_children(),
        })
}

/// Result of [`uniform_refine`].
#[derive(Clone, Debug)]
pub struct RefinedMesh {
    pub mesh: Mesh,
    /// Child element ids of each coarse element (the element itself is copied
    /// once for types that do not refine).
    pub children: Vec<Vec<usize>>,
    /// Coarse nodes and weights defining each refined node.
    pub node_parents: Vec<Vec<(usize, f64)>>,
}

type NodeKey = Vec<(usize, i64)>;

fn node_key(parents: &[(usize, f64)]) -> NodeKey {
    let mut key: NodeKey = parents
        .iter()
        .map(|&(n, c)| (n, (c * f64::from(1u32 << 24)).round() as i64))
        .collect();
    key.sort_unstable();
    key
}

/// Refine every element of `mesh` once.
///
/// Child nodes are created from the embedding coefficients and shared between
/// all children (of any parent) that produce the same parent-node
/// combination, so the refined mesh is conforming wherever the input is.
pub fn uniform_refine(mesh: &Mesh) -> Result<RefinedMesh, MeshGeomError> {
    let mut fine = Mesh::with_capacity(mesh.n_nodes() * 8, mesh.n_elem() * 8);
    let mut node_parents: Vec<Vec<(usize, f64)>> = Vec::new();
    let mut lookup: HashMap<NodeKey, usize> = HashMap::new();
    let mut children = Vec::with_capacity(mesh.n_elem());

    let mut intern = |parents: Vec<(usize, f64)>, fine: &mut Mesh| -> usize {
        let key = node_key(&parents);
        *lookup.entry(key).or_insert_with(|| {
            let point = parents
                .iter()
                .fold(Point::zero(), |acc, &(n, c)| acc + mesh.point(n) * c);
            node_parents.push(parents);
            fine.add_node(point)
        })
    };

    for elem in mesh.elems() {
        let t = elem.elem_type;
        let mut ids = Vec::with_capacity(t.n_children().max(1));
        if t.n_children() == 0 {
            let nodes = elem
                .nodes
                .iter()
                .map(|&n| intern(vec![(n, 1.0)], &mut fine))
                .collect();
            let copy = Elem::new(t, nodes)?.with_subdomain(elem.subdomain_id);
            ids.push(fine.push_elem(copy)?);
        } else {
            for c in 0..t.n_children() {
                let matrix = embedding_matrix(t, c)?;
                let nodes = matrix
                    .rows()
                    .map(|row| {
                        let parents = row
                            .iter()
                            .enumerate()
                            .filter(|(_, c)| **c != 0.0)
                            .map(|(j, &c)| (elem.nodes[j], c))
                            .collect();
                        intern(parents, &mut fine)
                    })
                    .collect();
                let child = Elem::new(t, nodes)?.with_subdomain(elem.subdomain_id);
                ids.push(fine.push_elem(child)?);
            }
        }
        children.push(ids);
    }
    drop(intern);

    log::debug!(
        "uniform refinement: {} -> {} elements, {} -> {} nodes",
        mesh.n_elem(),
        fine.n_elem(),
        mesh.n_nodes(),
        fine.n_nodes()
    );
    Ok(RefinedMesh {
        mesh: fine,
        children,
        node_parents,
    })
}

/// Carry a coarse nodal field onto the refined mesh through the embedding
/// coefficients. Exact for fields in the span of the coarse shape functions.
pub fn prolongate(field: &Field, coarse: &Mesh, refined: &RefinedMesh) -> Result<Field, MeshGeomError> {
    field.check_mesh(coarse)?;
    let mut out = Field::new(refined.mesh.n_nodes(), field.variable_names().to_vec());
    for (node, parents) in refined.node_parents.iter().enumerate() {
        for var in 0..field.n_variables() {
            let v = parents.iter().map(|&(p, c)| c * field.value(p, var)).sum();
            out.set(node, var, v);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_sum_to_one() {
        for t in ElemType::ALL {
            for c in 0..t.n_children() {
                let m = embedding_matrix(t, c).unwrap();
                for row in m.rows() {
                    let sum: f64 = row.iter().sum();
                    assert!((sum - 1.0).abs() < 1e-12, "{t} child {c}");
                }
            }
        }
    }

    #[test]
    fn infinite_tables_match_shape_functions() {
        for t in [ElemType::InfQuad4, ElemType::InfHex8] {
            for c in 0..t.n_children() {
                let table = embedding_matrix(t, c).unwrap();
                let computed = computed_embedding(t, c).unwrap();
                for (a, b) in table.rows().zip(computed.rows()) {
                    for (x, y) in a.iter().zip(b) {
                        assert!((x - y).abs() < 1e-12, "{t} child {c}");
                    }
                }
            }
        }
    }

    #[test]
    fn hex8_child_zero() {
        let m = embedding_matrix(ElemType::Hex8, 0).unwrap();
        assert_eq!(m.row(0)[0], 1.0);
        assert_eq!(m.row(1)[..2], [0.5, 0.5]);
        assert!(m.row(6).iter().all(|&c| c == 0.125));
    }

    #[test]
    fn bad_children_are_rejected() {
        assert_eq!(
            embedding_matrix(ElemType::Quad4, 4),
            Err(MeshGeomError::InvalidChildIndex {
                elem_type: ElemType::Quad4,
                index: 4,
                n_children: 4
            })
        );
        assert!(embedding_matrix(ElemType::NodeElem, 0).is_err());
    }
}

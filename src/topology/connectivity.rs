//! Node orderings expected by external visualization formats.
//!
//! Connectivity is produced per *sub-cell*: second-order Lagrange elements are
//! written to Tecplot as a lattice of linear cells (8 bricks for `Hex27`,
//! 4 quads for `Quad9`, 2 segments for `Edge3`). VTK has native quadratic
//! cells, so every element is a single cell there, reordered to VTK's node
//! numbering.

use crate::mesh_error::MeshGeomError;
use crate::topology::elem_type::ElemType;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target format of [`local_connectivity`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum IoPackage {
    /// 1-indexed, linear sub-cells.
    Tecplot,
    /// 0-indexed, VTK native node order.
    Vtk,
}

impl fmt::Display for IoPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoPackage::Tecplot => f.write_str("tecplot"),
            IoPackage::Vtk => f.write_str("vtk"),
        }
    }
}

impl FromStr for IoPackage {
    type Err = MeshGeomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tecplot" => Ok(IoPackage::Tecplot),
            "vtk" => Ok(IoPackage::Vtk),
            _ => Err(MeshGeomError::UnsupportedIoPackage {
                package: s.to_string(),
                elem_type: None,
            }),
        }
    }
}

/// libMesh -> VTK node order for the triquadratic hexahedron: `vtk[k] = lm[HEX27_TO_VTK[k]]`.
const HEX27_TO_VTK: [usize; 27] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 16, 17, 18, 19, 12, 13, 14, 15, 24, 22, 21, 23, 20, 25,
    26,
];

/// VTK cell type code.
pub fn vtk_cell_type(elem_type: ElemType) -> Result<u8, MeshGeomError> {
    match elem_type {
        ElemType::NodeElem => Ok(1),
        ElemType::Edge2 => Ok(3),
        ElemType::Edge3 => Ok(21),
        ElemType::Quad4 => Ok(9),
        ElemType::Quad9 => Ok(28),
        ElemType::Hex8 => Ok(12),
        ElemType::Hex27 => Ok(29),
        ElemType::InfEdge2 | ElemType::InfQuad4 | ElemType::InfHex8 => {
            Err(MeshGeomError::UnsupportedIoPackage {
                package: IoPackage::Vtk.to_string(),
                elem_type: Some(elem_type),
            })
        }
    }
}

/// Position of a tensor index on the 3-point lattice `{-1, 0, +1}`.
fn lattice_coord(idx: u8) -> usize {
    match idx {
        0 => 0,
        2 => 1,
        _ => 2,
    }
}

/// Local node at lattice position `pos` of a second-order element.
fn lattice_node(elem_type: ElemType, pos: [usize; 3]) -> Option<usize> {
    let dim = elem_type.dim();
    elem_type
        .tensor_indices()
        .iter()
        .position(|idx| (0..dim).all(|a| lattice_coord(idx[a]) == pos[a]))
}

/// Linear sub-cell `sub_cell` of a second-order element, in the node order of
/// its first-order counterpart.
fn lattice_sub_cell(elem_type: ElemType, sub_cell: usize) -> Vec<usize> {
    let corner_type = elem_type.first_order_type();
    let dim = elem_type.dim();
    let offset = [sub_cell & 1, (sub_cell >> 1) & 1, (sub_cell >> 2) & 1];
    corner_type
        .tensor_indices()
        .iter()
        .filter_map(|idx| {
            let mut pos = [0usize; 3];
            for a in 0..dim {
                pos[a] = offset[a] + idx[a] as usize;
            }
            lattice_node(elem_type, pos)
        })
        .collect()
}

/// Local node indices of sub-cell `sub_cell` in the ordering of `package`.
pub fn local_connectivity(
    elem_type: ElemType,
    sub_cell: usize,
    package: IoPackage,
) -> Result<Vec<usize>, MeshGeomError> {
    let n_sub_elem = match package {
        IoPackage::Tecplot => elem_type.n_sub_elem(),
        IoPackage::Vtk => 1,
    };
    if sub_cell >= n_sub_elem {
        return Err(MeshGeomError::InvalidSubCell {
            elem_type,
            index: sub_cell,
            n_sub_elem,
        });
    }
    match package {
        IoPackage::Tecplot => Ok(match elem_type {
            ElemType::Edge3 | ElemType::Quad9 | ElemType::Hex27 => {
                lattice_sub_cell(elem_type, sub_cell)
            }
            // written as an ordinary quadrilateral
            ElemType::InfQuad4 => vec![0, 1, 3, 2],
            _ => (0..elem_type.n_nodes()).collect(),
        }),
        IoPackage::Vtk => {
            vtk_cell_type(elem_type)?;
            Ok(match elem_type {
                ElemType::Hex27 => HEX27_TO_VTK.to_vec(),
                _ => (0..elem_type.n_nodes()).collect(),
            })
        }
    }
}

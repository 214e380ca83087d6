//! Legacy ASCII VTK (`.vtk`) writer for unstructured grids.
//!
//! Quadratic elements map to VTK's native quadratic cells; infinite elements
//! have no VTK cell type and are rejected.

use crate::data::field::Field;
use crate::io::FieldWriter;
use crate::mesh::Mesh;
use crate::mesh_error::MeshGeomError;
use crate::topology::connectivity::{vtk_cell_type, IoPackage};
use std::io::Write;

#[derive(Debug, Default, Clone, Copy)]
pub struct VtkWriter;

/// VTK array names may not contain whitespace.
fn array_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

impl FieldWriter for VtkWriter {
    fn write_nodal_field<W: Write>(
        &self,
        mut writer: W,
        mesh: &Mesh,
        field: &Field,
    ) -> Result<(), MeshGeomError> {
        field.check_mesh(mesh)?;
        let cells = mesh
            .elems()
            .iter()
            .map(|e| -> Result<(u8, Vec<usize>), MeshGeomError> {
                Ok((vtk_cell_type(e.elem_type)?, e.connectivity(0, IoPackage::Vtk)?))
            })
            .collect::<Result<Vec<_>, _>>()?;

        writeln!(writer, "# vtk DataFile Version 3.0")?;
        writeln!(writer, "mesh-geom nodal field")?;
        writeln!(writer, "ASCII")?;
        writeln!(writer, "DATASET UNSTRUCTURED_GRID")?;
        writeln!(writer, "POINTS {} double", mesh.n_nodes())?;
        for node in mesh.nodes() {
            let p = node.point;
            writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
        }

        let size: usize = cells.iter().map(|(_, c)| c.len() + 1).sum();
        writeln!(writer, "CELLS {} {size}", cells.len())?;
        for (_, conn) in &cells {
            write!(writer, "{}", conn.len())?;
            for n in conn {
                write!(writer, " {n}")?;
            }
            writeln!(writer)?;
        }
        writeln!(writer, "CELL_TYPES {}", cells.len())?;
        for (code, _) in &cells {
            writeln!(writer, "{code}")?;
        }

        writeln!(writer, "POINT_DATA {}", mesh.n_nodes())?;
        for (var, name) in field.variable_names().iter().enumerate() {
            writeln!(writer, "SCALARS {} double 1", array_name(name))?;
            writeln!(writer, "LOOKUP_TABLE default")?;
            for node in 0..mesh.n_nodes() {
                writeln!(writer, "{}", field.value(node, var))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::bounding_box::BoundingBox;
    use crate::geometry::point::Point;
    use crate::mesh_generation::structured_hex_mesh;
    use crate::topology::elem_type::ElemType;

    #[test]
    fn hex27_cells_and_scalars() {
        let bounds = BoundingBox::new(Point::zero(), Point::new(1.0, 1.0, 1.0));
        let mesh = structured_hex_mesh(1, 1, 1, bounds, ElemType::Hex27).unwrap();
        let field = Field::from_fn(&mesh, vec!["u".into(), "v w".into()], |p, v| p.z + v as f64);
        let mut out = Vec::new();
        VtkWriter.write_nodal_field(&mut out, &mesh, &field).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("CELLS 1 28"));
        assert!(text.contains("CELL_TYPES 1\n29\n"));
        assert!(text.contains("SCALARS u double 1"));
        assert!(text.contains("SCALARS v_w double 1"));
    }

    #[test]
    fn infinite_elements_are_rejected() {
        let mut mesh = Mesh::new();
        for x in [0.0, 1.0, 2.0, 3.0] {
            mesh.add_node(Point::new(x, 0.0, 0.0));
        }
        mesh.add_elem(ElemType::InfEdge2, vec![1, 2]).unwrap();
        let field = Field::new(mesh.n_nodes(), vec!["u".into()]);
        let err = VtkWriter
            .write_nodal_field(Vec::new(), &mesh, &field)
            .unwrap_err();
        assert!(matches!(err, MeshGeomError::UnsupportedIoPackage { .. }));
    }
}

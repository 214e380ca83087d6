//! Tecplot ASCII writer.
//!
//! One finite-element zone in point packing. Second-order elements are split
//! into their linear sub-cells, so the zone type only depends on the mesh
//! dimension: `FELINESEG`, `FEQUADRILATERAL` or `FEBRICK`.

use crate::data::field::Field;
use crate::io::FieldWriter;
use crate::mesh::Mesh;
use crate::mesh_error::MeshGeomError;
use crate::topology::connectivity::IoPackage;
use std::io::Write;

/// Writes a mesh and its nodal field as a Tecplot `.plt`/`.dat` file.
#[derive(Clone, Debug)]
pub struct TecplotWriter {
    pub title: String,
}

impl Default for TecplotWriter {
    fn default() -> Self {
        Self {
            title: "mesh-geom".to_string(),
        }
    }
}

fn zone_type(dim: usize) -> Option<&'static str> {
    match dim {
        1 => Some("FELINESEG"),
        2 => Some("FEQUADRILATERAL"),
        3 => Some("FEBRICK"),
        _ => None,
    }
}

impl FieldWriter for TecplotWriter {
    fn write_nodal_field<W: Write>(
        &self,
        mut writer: W,
        mesh: &Mesh,
        field: &Field,
    ) -> Result<(), MeshGeomError> {
        field.check_mesh(mesh)?;
        let dim = mesh.mesh_dimension();
        let zone = zone_type(dim).ok_or_else(|| MeshGeomError::UnsupportedIoPackage {
            package: IoPackage::Tecplot.to_string(),
            elem_type: mesh.elems().first().map(|e| e.elem_type),
        })?;

        // lower-dimensional elements (e.g. boundary nodes) do not fit the zone
        let mut cells = Vec::new();
        for elem in mesh.elems().iter().filter(|e| e.dim() == dim) {
            for sub in 0..elem.elem_type.n_sub_elem() {
                cells.push(elem.connectivity(sub, IoPackage::Tecplot)?);
            }
        }

        writeln!(writer, "TITLE = \"{}\"", self.title)?;
        write!(writer, "VARIABLES = \"x\", \"y\", \"z\"")?;
        for name in field.variable_names() {
            write!(writer, ", \"{name}\"")?;
        }
        writeln!(writer)?;
        writeln!(
            writer,
            "ZONE N={}, E={}, DATAPACKING=POINT, ZONETYPE={zone}",
            mesh.n_nodes(),
            cells.len()
        )?;
        for (i, node) in mesh.nodes().iter().enumerate() {
            let p = node.point;
            write!(writer, "{:e} {:e} {:e}", p.x, p.y, p.z)?;
            for &v in field.node_values(i) {
                write!(writer, " {v:e}")?;
            }
            writeln!(writer)?;
        }
        for cell in &cells {
            let line: Vec<String> = cell.iter().map(usize::to_string).collect();
            writeln!(writer, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

//! Mesh and nodal field I/O.
//!
//! Readers and writers are small unit structs implementing the traits below
//! over any `Read`/`Write`; the path helpers pick one by file extension:
//!
//! | extension        | read mesh | read field | write field |
//! |------------------|-----------|------------|-------------|
//! | `.msh`           | yes       | yes        | yes         |
//! | `.plt`, `.dat`   |           |            | yes         |
//! | `.vtk`           |           |            | yes         |

pub mod gmsh;
pub mod tecplot;
pub mod vtk;

pub use gmsh::{GmshReader, GmshWriter};
pub use tecplot::TecplotWriter;
pub use vtk::VtkWriter;

use crate::data::field::Field;
use crate::mesh::Mesh;
use crate::mesh_error::MeshGeomError;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Parses a [`Mesh`] from a byte stream.
pub trait MeshReader {
    fn read<R: Read>(&self, reader: R) -> Result<Mesh, MeshGeomError>;
}

/// Parses a nodal [`Field`] defined on an already loaded mesh.
pub trait FieldReader {
    fn read_field<R: Read>(&self, mesh: &Mesh, reader: R) -> Result<Field, MeshGeomError>;
}

/// Serialises a mesh together with a nodal field.
pub trait FieldWriter {
    fn write_nodal_field<W: Write>(
        &self,
        writer: W,
        mesh: &Mesh,
        field: &Field,
    ) -> Result<(), MeshGeomError>;
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

fn unsupported(path: &Path, what: &str) -> MeshGeomError {
    MeshGeomError::UnsupportedIoPackage {
        package: format!("{what} for {}", path.display()),
        elem_type: None,
    }
}

fn open(path: &Path) -> Result<BufReader<File>, MeshGeomError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| MeshGeomError::Io(format!("{}: {e}", path.display())))
}

/// Read a mesh file.
pub fn read_mesh(path: impl AsRef<Path>) -> Result<Mesh, MeshGeomError> {
    let path = path.as_ref();
    let mesh = match extension(path).as_str() {
        "msh" => GmshReader.read(open(path)?)?,
        _ => return Err(unsupported(path, "mesh reader")),
    };
    log::debug!("read {} nodes, {} elements from {}", mesh.n_nodes(), mesh.n_elem(), path.display());
    Ok(mesh)
}

/// Read a nodal solution file for `mesh`.
pub fn read_field(path: impl AsRef<Path>, mesh: &Mesh) -> Result<Field, MeshGeomError> {
    let path = path.as_ref();
    match extension(path).as_str() {
        "msh" => GmshReader.read_field(mesh, open(path)?),
        _ => Err(unsupported(path, "field reader")),
    }
}

/// Write `field` on `mesh` in the format implied by the extension of `path`.
pub fn write_nodal_field(
    path: impl AsRef<Path>,
    mesh: &Mesh,
    field: &Field,
) -> Result<(), MeshGeomError> {
    let path = path.as_ref();
    let ext = extension(path);
    if !matches!(ext.as_str(), "msh" | "plt" | "dat" | "vtk") {
        return Err(unsupported(path, "field writer"));
    }
    let file = File::create(path)
        .map_err(|e| MeshGeomError::Io(format!("{}: {e}", path.display())))?;
    let mut out = BufWriter::new(file);
    match ext.as_str() {
        "msh" => GmshWriter.write_nodal_field(&mut out, mesh, field)?,
        "vtk" => VtkWriter.write_nodal_field(&mut out, mesh, field)?,
        _ => TecplotWriter::default().write_nodal_field(&mut out, mesh, field)?,
    }
    out.flush()?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

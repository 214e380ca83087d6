//! Gmsh `.msh` reader and writer.
//!
//! # Supported format
//! - ASCII `.msh` version **2.2**.
//! - Element types: 15 (point), 1 (line), 8 (3-node line), 3 (quad),
//!   10 (9-node quad), 5 (hex), 12 (27-node hex).
//! - `$NodeData` blocks with one component; the first string tag is the
//!   variable name.
//!
//! # Limitations
//! - Binary files and `.msh` v4.x are not supported.
//! - Only the first element tag is kept (as the subdomain id).
//! - Infinite elements have no Gmsh counterpart and cannot be written.

use crate::data::field::Field;
use crate::geometry::point::Point;
use crate::io::{FieldReader, FieldWriter, MeshReader};
use crate::mesh::Mesh;
use crate::mesh_error::MeshGeomError;
use crate::topology::elem::Elem;
use crate::topology::elem_type::ElemType;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::str::FromStr;

/// Gmsh position of each internal Hex27 node: `internal[i] = gmsh[HEX27_FROM_GMSH[i]]`.
const HEX27_FROM_GMSH: [usize; 27] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 11, 13, 9, 10, 12, 14, 15, 16, 18, 19, 17, 20, 21, 23, 24, 22, 25,
    26,
];

fn gmsh_type_code(elem_type: ElemType) -> Option<u32> {
    match elem_type {
        ElemType::NodeElem => Some(15),
        ElemType::Edge2 => Some(1),
        ElemType::Edge3 => Some(8),
        ElemType::Quad4 => Some(3),
        ElemType::Quad9 => Some(10),
        ElemType::Hex8 => Some(5),
        ElemType::Hex27 => Some(12),
        ElemType::InfEdge2 | ElemType::InfQuad4 | ElemType::InfHex8 => None,
    }
}

fn elem_type_of(code: u32) -> Option<ElemType> {
    ElemType::ALL
        .into_iter()
        .find(|&t| gmsh_type_code(t) == Some(code))
}

fn parse_error(message: impl Into<String>) -> MeshGeomError {
    MeshGeomError::MeshIoParse(message.into())
}

fn next_line<'a, I>(lines: &mut I, what: &str) -> Result<&'a str, MeshGeomError>
where
    I: Iterator<Item = &'a str>,
{
    lines
        .next()
        .map(str::trim)
        .ok_or_else(|| parse_error(format!("unexpected end of file: missing {what}")))
}

fn parse_token<T: FromStr>(raw: Option<&str>, what: &str) -> Result<T, MeshGeomError> {
    let raw = raw.ok_or_else(|| parse_error(format!("missing {what}")))?;
    raw.parse::<T>()
        .map_err(|_| parse_error(format!("invalid {what}: {raw}")))
}

fn expect_end<'a, I>(lines: &mut I, marker: &str) -> Result<(), MeshGeomError>
where
    I: Iterator<Item = &'a str>,
{
    let line = next_line(lines, marker)?;
    if line == marker {
        Ok(())
    } else {
        Err(parse_error(format!("expected {marker}, found {line:?}")))
    }
}

/// Gmsh `.msh` reader for ASCII v2.2 meshes and nodal data.
#[derive(Debug, Default, Clone, Copy)]
pub struct GmshReader;

impl GmshReader {
    fn check_format(line: &str) -> Result<(), MeshGeomError> {
        let mut parts = line.split_whitespace();
        let version: String = parse_token(parts.next(), "mesh format version")?;
        let file_type: u8 = parse_token(parts.next(), "mesh format type")?;
        if file_type != 0 {
            return Err(parse_error("binary .msh files are not supported"));
        }
        if !version.starts_with('2') {
            return Err(parse_error(format!("unsupported .msh version {version}")));
        }
        Ok(())
    }

    fn reorder(elem_type: ElemType, gmsh_nodes: Vec<usize>) -> Vec<usize> {
        match elem_type {
            ElemType::Hex27 => HEX27_FROM_GMSH.iter().map(|&g| gmsh_nodes[g]).collect(),
            _ => gmsh_nodes,
        }
    }
}

impl MeshReader for GmshReader {
    fn read<R: Read>(&self, mut reader: R) -> Result<Mesh, MeshGeomError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        let mut lines = contents.lines();

        let mut mesh = Mesh::new();
        let mut index_of: HashMap<usize, usize> = HashMap::new();
        let mut seen_format = false;

        while let Some(line) = lines.next() {
            match line.trim() {
                "$MeshFormat" => {
                    Self::check_format(next_line(&mut lines, "mesh format")?)?;
                    expect_end(&mut lines, "$EndMeshFormat")?;
                    seen_format = true;
                }
                "$Nodes" => {
                    let count: usize = parse_token(Some(next_line(&mut lines, "node count")?), "node count")?;
                    for _ in 0..count {
                        let mut parts = next_line(&mut lines, "node")?.split_whitespace();
                        let id: usize = parse_token(parts.next(), "node id")?;
                        let x = parse_token(parts.next(), "x coordinate")?;
                        let y = parse_token(parts.next(), "y coordinate")?;
                        let z = parse_token(parts.next(), "z coordinate")?;
                        let idx = mesh.add_node_with_id(id, Point::new(x, y, z));
                        if index_of.insert(id, idx).is_some() {
                            return Err(parse_error(format!("duplicate node id {id}")));
                        }
                    }
                    expect_end(&mut lines, "$EndNodes")?;
                }
                "$Elements" => {
                    let count: usize =
                        parse_token(Some(next_line(&mut lines, "element count")?), "element count")?;
                    for _ in 0..count {
                        let mut parts = next_line(&mut lines, "element")?.split_whitespace();
                        let elem_id: usize = parse_token(parts.next(), "element id")?;
                        let code: u32 = parse_token(parts.next(), "element type")?;
                        let elem_type = elem_type_of(code)
                            .ok_or_else(|| parse_error(format!("unsupported element type: {code}")))?;
                        let n_tags: usize = parse_token(parts.next(), "element tag count")?;
                        let mut subdomain_id = 0u16;
                        for t in 0..n_tags {
                            let tag: i64 = parse_token(parts.next(), "element tag")?;
                            if t == 0 {
                                subdomain_id = u16::try_from(tag).map_err(|_| {
                                    parse_error(format!("element {elem_id}: tag {tag} is not a subdomain id"))
                                })?;
                            }
                        }
                        let nodes = (0..elem_type.n_nodes())
                            .map(|_| {
                                let id: usize = parse_token(parts.next(), "element node id")?;
                                index_of.get(&id).copied().ok_or_else(|| {
                                    parse_error(format!("element {elem_id} references unknown node {id}"))
                                })
                            })
                            .collect::<Result<Vec<_>, _>>()?;
                        let elem = Elem::new(elem_type, Self::reorder(elem_type, nodes))?
                            .with_subdomain(subdomain_id);
                        mesh.push_elem(elem)?;
                    }
                    expect_end(&mut lines, "$EndElements")?;
                }
                _ => {}
            }
        }
        if !seen_format {
            return Err(parse_error("missing $MeshFormat"));
        }
        Ok(mesh)
    }
}

impl FieldReader for GmshReader {
    /// Later blocks with an already seen name replace the earlier values.
    fn read_field<R: Read>(&self, mesh: &Mesh, mut reader: R) -> Result<Field, MeshGeomError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents)?;
        let mut lines = contents.lines();

        let index_of: HashMap<usize, usize> = mesh
            .nodes()
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect();
        let mut variables: Vec<(String, Vec<Option<f64>>)> = Vec::new();

        while let Some(line) = lines.next() {
            if line.trim() != "$NodeData" {
                continue;
            }
            let n_strings: usize =
                parse_token(Some(next_line(&mut lines, "string tag count")?), "string tag count")?;
            let mut name = None;
            for _ in 0..n_strings {
                let tag = next_line(&mut lines, "string tag")?.trim_matches('"');
                name.get_or_insert_with(|| tag.to_string());
            }
            let name = name.ok_or_else(|| parse_error("$NodeData block without a name"))?;
            let n_reals: usize =
                parse_token(Some(next_line(&mut lines, "real tag count")?), "real tag count")?;
            for _ in 0..n_reals {
                next_line(&mut lines, "real tag")?;
            }
            let n_ints: usize =
                parse_token(Some(next_line(&mut lines, "integer tag count")?), "integer tag count")?;
            let ints = (0..n_ints)
                .map(|_| parse_token::<usize>(Some(next_line(&mut lines, "integer tag")?), "integer tag"))
                .collect::<Result<Vec<_>, _>>()?;
            let (components, count) = match ints.as_slice() {
                [_, c, n, ..] => (*c, *n),
                _ => return Err(parse_error(format!("{name}: need time step, component and count tags"))),
            };
            if components != 1 {
                return Err(parse_error(format!("{name}: {components} components, expected 1")));
            }

            let mut values = vec![None; mesh.n_nodes()];
            for _ in 0..count {
                let mut parts = next_line(&mut lines, "node value")?.split_whitespace();
                let id: usize = parse_token(parts.next(), "node id")?;
                let v: f64 = parse_token(parts.next(), "node value")?;
                let idx = index_of
                    .get(&id)
                    .ok_or_else(|| parse_error(format!("{name}: value for unknown node {id}")))?;
                values[*idx] = Some(v);
            }
            expect_end(&mut lines, "$EndNodeData")?;

            match variables.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = values,
                None => variables.push((name, values)),
            }
        }

        if variables.is_empty() {
            return Err(parse_error("no $NodeData blocks"));
        }
        let names = variables.iter().map(|(n, _)| n.clone()).collect();
        let mut field = Field::new(mesh.n_nodes(), names);
        for (var, (name, values)) in variables.iter().enumerate() {
            for (node, v) in values.iter().enumerate() {
                let v = v.ok_or_else(|| {
                    parse_error(format!("{name}: no value for node {}", mesh.node(node).id))
                })?;
                field.set(node, var, v);
            }
        }
        Ok(field)
    }
}

/// Gmsh `.msh` v2.2 ASCII writer. Node and element tags are written 1-based
/// in arena order.
#[derive(Debug, Default, Clone, Copy)]
pub struct GmshWriter;

impl GmshWriter {
    pub fn write_mesh<W: Write>(&self, mut writer: W, mesh: &Mesh) -> Result<(), MeshGeomError> {
        writeln!(writer, "$MeshFormat\n2.2 0 8\n$EndMeshFormat")?;
        writeln!(writer, "$Nodes\n{}", mesh.n_nodes())?;
        for (i, node) in mesh.nodes().iter().enumerate() {
            let p = node.point;
            writeln!(writer, "{} {} {} {}", i + 1, p.x, p.y, p.z)?;
        }
        writeln!(writer, "$EndNodes")?;

        writeln!(writer, "$Elements\n{}", mesh.n_elem())?;
        for (i, elem) in mesh.elems().iter().enumerate() {
            let code = gmsh_type_code(elem.elem_type).ok_or_else(|| {
                MeshGeomError::UnsupportedIoPackage {
                    package: "gmsh".into(),
                    elem_type: Some(elem.elem_type),
                }
            })?;
            let mut gmsh_nodes = elem.nodes.clone();
            if elem.elem_type == ElemType::Hex27 {
                for (local, &g) in HEX27_FROM_GMSH.iter().enumerate() {
                    gmsh_nodes[g] = elem.nodes[local];
                }
            }
            write!(writer, "{} {code} 2 {} {}", i + 1, elem.subdomain_id, elem.subdomain_id)?;
            for n in gmsh_nodes {
                write!(writer, " {}", n + 1)?;
            }
            writeln!(writer)?;
        }
        writeln!(writer, "$EndElements")?;
        Ok(())
    }
}

impl FieldWriter for GmshWriter {
    fn write_nodal_field<W: Write>(
        &self,
        mut writer: W,
        mesh: &Mesh,
        field: &Field,
    ) -> Result<(), MeshGeomError> {
        field.check_mesh(mesh)?;
        self.write_mesh(&mut writer, mesh)?;
        for (var, name) in field.variable_names().iter().enumerate() {
            writeln!(writer, "$NodeData\n1\n\"{name}\"\n1\n0.0\n3\n0\n1\n{}", mesh.n_nodes())?;
            for node in 0..mesh.n_nodes() {
                writeln!(writer, "{} {}", node + 1, field.value(node, var))?;
            }
            writeln!(writer, "$EndNodeData")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_QUADS: &str = "\
$MeshFormat
2.2 0 8
$EndMeshFormat
$Nodes
6
10 0 0 0
11 1 0 0
12 2 0 0
13 0 1 0
14 1 1 0
15 2 1 0
$EndNodes
$Elements
2
1 3 2 7 7 10 11 14 13
2 3 2 8 8 11 12 15 14
$EndElements
$NodeData
1
\"u\"
1
0.0
3
0
1
6
10 0.0
11 1.0
12 2.0
13 0.0
14 1.0
15 2.0
$EndNodeData
";

    #[test]
    fn reads_quads_with_tags() {
        let mesh = GmshReader.read(TWO_QUADS.as_bytes()).unwrap();
        assert_eq!(mesh.n_nodes(), 6);
        assert_eq!(mesh.n_elem(), 2);
        assert_eq!(mesh.node(0).id, 10);
        assert_eq!(mesh.elem(1).nodes, vec![1, 2, 5, 4]);
        assert_eq!(mesh.elem(0).subdomain_id, 7);
        assert_eq!(mesh.elem(1).elem_type, ElemType::Quad4);
    }

    #[test]
    fn reads_node_data() {
        let mesh = GmshReader.read(TWO_QUADS.as_bytes()).unwrap();
        let field = GmshReader.read_field(&mesh, TWO_QUADS.as_bytes()).unwrap();
        assert_eq!(field.variable_names(), &["u".to_string()]);
        assert_eq!(field.value(5, 0), 2.0);
    }

    #[test]
    fn rejects_unknown_node_and_type() {
        let bad_node = TWO_QUADS.replace("2 3 2 8 8 11 12 15 14", "2 3 2 8 8 11 12 15 99");
        assert!(matches!(
            GmshReader.read(bad_node.as_bytes()),
            Err(MeshGeomError::MeshIoParse(_))
        ));
        let bad_type = TWO_QUADS.replace("1 3 2 7 7", "1 4 2 7 7");
        assert!(GmshReader.read(bad_type.as_bytes()).is_err());
    }

    #[test]
    fn missing_node_value_is_an_error() {
        let mesh = GmshReader.read(TWO_QUADS.as_bytes()).unwrap();
        let partial = TWO_QUADS.replace("6\n10 0.0\n", "5\n");
        assert!(GmshReader.read_field(&mesh, partial.as_bytes()).is_err());
    }

    #[test]
    fn hex27_ordering_is_a_permutation() {
        let mut seen = [false; 27];
        for &g in &HEX27_FROM_GMSH {
            seen[g] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }
}

use mesh_geom::debug_invariants::DebugInvariants;
use mesh_geom::fe::LagrangeMap;
use mesh_geom::geometry::bounding_box::BoundingBox;
use mesh_geom::geometry::point::Point;
use mesh_geom::mesh::Mesh;
use mesh_geom::mesh_error::MeshGeomError;
use mesh_geom::mesh_generation::{structured_hex_mesh, structured_quad_mesh};
use mesh_geom::octree::{Octree, OctreeOptions};
use mesh_geom::topology::elem_type::ElemType;

fn unit_cube() -> BoundingBox {
    BoundingBox::new(Point::zero(), Point::new(1.0, 1.0, 1.0))
}

#[test]
fn every_centroid_is_found_in_its_own_element() {
    let mesh = structured_hex_mesh(4, 4, 4, unit_cube(), ElemType::Hex27).unwrap();
    let tree = Octree::build(&mesh, 4).unwrap();
    assert!(tree.n_active_bins() > 1);
    tree.validate_invariants().unwrap();
    for elem in mesh.elems() {
        let c = elem.centroid(&mesh);
        assert_eq!(tree.find_element(&c), Some(elem.id), "centroid {c}");
    }
}

#[test]
fn every_node_is_found_in_an_element_containing_it() {
    let mesh = structured_hex_mesh(3, 2, 5, unit_cube(), ElemType::Hex8).unwrap();
    let tree = Octree::build(&mesh, 2).unwrap();
    for node in mesh.nodes() {
        let e = tree
            .find_element(&node.point)
            .unwrap_or_else(|| panic!("node {} not found", node.id));
        assert!(mesh.elem(e).contains_point(&mesh, &node.point, 1e-6));
    }
}

#[test]
fn points_outside_the_mesh_are_not_found() {
    let mesh = structured_hex_mesh(2, 2, 2, unit_cube(), ElemType::Hex8).unwrap();
    let tree = Octree::build(&mesh, 1).unwrap();
    assert_eq!(tree.find_element(&Point::new(1.5, 0.5, 0.5)), None);
    assert_eq!(tree.find_element(&Point::new(0.5, 0.5, -0.01)), None);
    assert!(tree.locate(&Point::new(0.25, 0.75, 0.5), 1e-6).is_some());
}

#[test]
fn planar_quad_mesh_is_searchable() {
    let bounds = BoundingBox::new(Point::new(0.0, 0.0, 3.0), Point::new(2.0, 1.0, 3.0));
    let mesh = structured_quad_mesh(8, 4, bounds, ElemType::Quad9).unwrap();
    let tree = Octree::build(&mesh, 3).unwrap();
    let (e, xi) = tree.locate(&Point::new(1.1, 0.4, 3.0), 1e-6).unwrap();
    let elem_box = mesh.elem(e).bounding_box(&mesh);
    assert!(elem_box.contains_point(&Point::new(1.1, 0.4, 3.0), 1e-12));
    assert!(xi.x.abs() <= 1.0 && xi.y.abs() <= 1.0);
    assert_eq!(tree.find_element(&Point::new(1.1, 0.4, 3.2)), None);
}

#[test]
fn infinite_elements_are_reachable_far_from_the_mesh() {
    let mut mesh = Mesh::new();
    let base = [
        Point::new(-0.1, -0.1, 1.0),
        Point::new(0.1, -0.1, 1.0),
        Point::new(0.1, 0.1, 1.0),
        Point::new(-0.1, 0.1, 1.0),
    ];
    for b in base {
        mesh.add_node(b);
    }
    for b in base {
        mesh.add_node(b * 2.0);
    }
    mesh.add_elem(ElemType::InfHex8, (0..8).collect()).unwrap();
    let tree = Octree::build(&mesh, 1).unwrap();
    // twenty times further out than the base, well outside the node box
    let far = Point::new(0.0, 0.0, 20.0);
    assert_eq!(tree.find_element(&far), Some(0));
    assert_eq!(tree.find_element(&Point::new(0.0, 0.0, 0.5)), None);
}

#[test]
fn invalid_construction_is_reported() {
    let empty = Mesh::new();
    assert_eq!(Octree::build(&empty, 4).unwrap_err(), MeshGeomError::EmptyMesh);
    let mesh = structured_hex_mesh(1, 1, 1, unit_cube(), ElemType::Hex8).unwrap();
    let options = OctreeOptions {
        bin_size: 0,
        ..OctreeOptions::default()
    };
    assert!(Octree::with_options(&mesh, options, LagrangeMap::default()).is_err());
}

#[test]
fn bin_count_stays_proportional_to_element_count() {
    for (n, bin_size) in [(4, 4), (6, 2), (8, 8)] {
        let mesh = structured_hex_mesh(n, n, n, unit_cube(), ElemType::Hex8).unwrap();
        let tree = Octree::build(&mesh, bin_size).unwrap();
        assert!(
            tree.n_bins() <= 10 * mesh.n_elem(),
            "{} elements -> {} bins (depth {})",
            mesh.n_elem(),
            tree.n_bins(),
            tree.depth()
        );
        tree.validate_invariants().unwrap();
        for elem in mesh.elems() {
            assert_eq!(tree.find_element(&elem.centroid(&mesh)), Some(elem.id));
        }
    }
}

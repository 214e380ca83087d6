use mesh_geom::algs::field_transfer::{grid_to_grid, grid_to_grid_with_mapping, TransferOptions};
use mesh_geom::context::Context;
use mesh_geom::data::field::Field;
use mesh_geom::fe::LagrangeMap;
use mesh_geom::geometry::bounding_box::BoundingBox;
use mesh_geom::geometry::point::Point;
use mesh_geom::mesh::Mesh;
use mesh_geom::mesh_error::MeshGeomError;
use mesh_geom::mesh_generation::{structured_edge_mesh, structured_hex_mesh, structured_quad_mesh};
use mesh_geom::topology::elem::SideMode;
use mesh_geom::topology::elem_type::ElemType;
use mesh_geom::topology::refine::uniform_refine;

fn unit_cube() -> BoundingBox {
    BoundingBox::new(Point::zero(), Point::new(1.0, 1.0, 1.0))
}

fn two_vars() -> Vec<String> {
    vec!["u".into(), "T".into()]
}

fn affine(p: &Point, var: usize) -> f64 {
    match var {
        0 => 1.0 + 2.0 * p.x - p.y + 0.5 * p.z,
        _ => 300.0 - 10.0 * p.z,
    }
}

fn sample(mesh: &Mesh, f: fn(&Point, usize) -> f64) -> Field {
    Field::from_fn(mesh, two_vars(), |p, v| f(p, v))
}

#[test]
fn identical_meshes_give_zero_error() {
    let mesh = structured_hex_mesh(3, 3, 3, unit_cube(), ElemType::Hex27).unwrap();
    let field = Field::from_fn(&mesh, two_vars(), |p, v| (p.x * p.y).sin() + v as f64);
    let report = grid_to_grid(&mesh, &field, &mesh, &field, &TransferOptions::default()).unwrap();
    assert!(report.l2_error < 1e-12, "error {}", report.l2_error);
    assert!(report.difference.max_abs(0) < 1e-12);
    assert!(report.difference.max_abs(1) < 1e-12);
    assert!(report.n_active_bins >= 1);
    assert!(report.cache_hits > 0);
}

#[test]
fn refined_mesh_with_affine_field_gives_zero_error() {
    let coarse = structured_hex_mesh(2, 2, 2, unit_cube(), ElemType::Hex8).unwrap();
    let fine = uniform_refine(&coarse).unwrap().mesh;
    let report = grid_to_grid(
        &coarse,
        &sample(&coarse, affine),
        &fine,
        &sample(&fine, affine),
        &TransferOptions {
            variable_index: 1,
            bin_size: 4,
            ..TransferOptions::default()
        },
    )
    .unwrap();
    assert!(report.l2_error < 1e-10, "error {}", report.l2_error);
    for node in 0..fine.n_nodes() {
        assert!(report.difference.value(node, 0).abs() < 1e-10);
        assert!(report.difference.value(node, 1).abs() < 1e-10);
    }
}

#[test]
fn quadratic_field_is_exact_on_hex27() {
    let quad = |p: &Point, _: usize| p.x * p.x + p.y * p.z - 3.0 * p.z * p.z;
    let coarse = structured_hex_mesh(1, 2, 1, unit_cube(), ElemType::Hex27).unwrap();
    let fine = structured_hex_mesh(3, 3, 2, unit_cube(), ElemType::Hex27).unwrap();
    let report = grid_to_grid(
        &coarse,
        &sample(&coarse, quad),
        &fine,
        &sample(&fine, quad),
        &TransferOptions::default(),
    )
    .unwrap();
    assert!(report.l2_error < 1e-9, "error {}", report.l2_error);
}

#[test]
fn linear_coarse_vs_quadratic_fine_has_known_error() {
    // u = x^2 on [0,1]; coarse linear interpolant on one element is u_c = x,
    // so ||x - x^2||_2 over the unit cube is sqrt(1/30)
    let coarse = structured_hex_mesh(1, 1, 1, unit_cube(), ElemType::Hex8).unwrap();
    let fine = structured_hex_mesh(2, 2, 2, unit_cube(), ElemType::Hex27).unwrap();
    let f = |p: &Point, _: usize| p.x * p.x;
    let report = grid_to_grid(
        &coarse,
        &sample(&coarse, f),
        &fine,
        &sample(&fine, f),
        &TransferOptions::default(),
    )
    .unwrap();
    assert!((report.l2_error - (1.0f64 / 30.0).sqrt()).abs() < 1e-10);
    // at x = 0.5 the coarse value is 0.5 and the fine value 0.25
    let mid = fine
        .nodes()
        .iter()
        .position(|n| n.point.abs_fuzzy_eq(&Point::new(0.5, 0.0, 0.0), 1e-12))
        .unwrap();
    assert!((report.difference.value(mid, 0) - 0.25).abs() < 1e-12);
}

#[test]
fn surface_and_curve_meshes_are_compared() {
    let bounds = BoundingBox::new(Point::zero(), Point::new(2.0, 1.0, 0.0));
    let coarse = structured_quad_mesh(2, 1, bounds, ElemType::Quad4).unwrap();
    let fine = structured_quad_mesh(6, 3, bounds, ElemType::Quad9).unwrap();
    let report = grid_to_grid(
        &coarse,
        &sample(&coarse, affine),
        &fine,
        &sample(&fine, affine),
        &TransferOptions::default(),
    )
    .unwrap();
    assert!(report.l2_error < 1e-10);

    let coarse = structured_edge_mesh(2, 0.0, 1.0, ElemType::Edge3).unwrap();
    let fine = structured_edge_mesh(7, 0.0, 1.0, ElemType::Edge2).unwrap();
    let f = |p: &Point, _: usize| p.x;
    let report = grid_to_grid(
        &coarse,
        &sample(&coarse, f),
        &fine,
        &sample(&fine, f),
        &TransferOptions::default(),
    )
    .unwrap();
    assert!(report.l2_error < 1e-10);
}

#[test]
fn variable_name_mismatch_is_reported() {
    let mesh = structured_hex_mesh(1, 1, 1, unit_cube(), ElemType::Hex8).unwrap();
    let a = Field::new(mesh.n_nodes(), vec!["u".into(), "T".into()]);
    let b = Field::new(mesh.n_nodes(), vec!["u".into(), "p".into()]);
    assert_eq!(
        grid_to_grid(&mesh, &a, &mesh, &b, &TransferOptions::default()).unwrap_err(),
        MeshGeomError::VariableMismatch {
            coarse: vec!["u".into(), "T".into()],
            fine: vec!["u".into(), "p".into()],
        }
    );
}

#[test]
fn fine_mesh_outside_coarse_fails_with_point_not_located() {
    let coarse = structured_hex_mesh(1, 1, 1, unit_cube(), ElemType::Hex8).unwrap();
    let shifted = BoundingBox::new(Point::new(0.5, 0.0, 0.0), Point::new(1.5, 1.0, 1.0));
    let fine = structured_hex_mesh(1, 1, 1, shifted, ElemType::Hex8).unwrap();
    let err = grid_to_grid(
        &coarse,
        &Field::new(coarse.n_nodes(), vec!["u".into()]),
        &fine,
        &Field::new(fine.n_nodes(), vec!["u".into()]),
        &TransferOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, MeshGeomError::PointNotLocated { .. }));
}

#[test]
fn boundary_faces_and_point_elements_do_not_enter_the_volume_error() {
    let coarse = structured_hex_mesh(1, 1, 1, unit_cube(), ElemType::Hex8).unwrap();
    let mut fine = coarse.clone();
    // what a Gmsh file with physical groups carries next to the volume cells
    let side = fine
        .elem(0)
        .build_side(0, SideMode::Detached)
        .unwrap()
        .into_elem();
    fine.push_elem(side).unwrap();
    fine.add_elem(ElemType::NodeElem, vec![0]).unwrap();
    assert_eq!(fine.n_elem(), 3);
    assert_eq!(fine.mesh_dimension(), 3);

    let vars = || vec!["u".to_string()];
    let coarse_field = Field::from_fn(&coarse, vars(), |p, _| p.x + 0.5);
    let fine_field = Field::from_fn(&fine, vars(), |p, _| p.x);
    let report = grid_to_grid(
        &coarse,
        &coarse_field,
        &fine,
        &fine_field,
        &TransferOptions::default(),
    )
    .unwrap();
    assert!((report.l2_error - 0.5).abs() < 1e-10, "error {}", report.l2_error);
    for node in 0..fine.n_nodes() {
        assert!((report.difference.value(node, 0) - 0.5).abs() < 1e-10);
    }
}

#[test]
fn configured_mapping_reaches_the_point_location() {
    let coarse = structured_hex_mesh(2, 2, 2, unit_cube(), ElemType::Hex8).unwrap();
    let fine = structured_hex_mesh(3, 3, 3, unit_cube(), ElemType::Hex8).unwrap();
    let coarse_field = sample(&coarse, affine);
    let fine_field = sample(&fine, affine);

    let ctx = Context::init();
    let report = grid_to_grid_with_mapping(
        &coarse,
        &coarse_field,
        &fine,
        &fine_field,
        &ctx.transfer_options(0),
        *ctx.mapping(),
    )
    .unwrap();
    assert!(report.l2_error < 1e-10);

    // no Newton iterations: no coarse element can be inverted
    let ctx = ctx.with_mapping(LagrangeMap::new(0));
    let err = grid_to_grid_with_mapping(
        &coarse,
        &coarse_field,
        &fine,
        &fine_field,
        &ctx.transfer_options(0),
        *ctx.mapping(),
    )
    .unwrap_err();
    assert!(matches!(err, MeshGeomError::PointNotLocated { .. }), "{err}");
}

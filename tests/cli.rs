use mesh_geom::data::field::Field;
use mesh_geom::geometry::bounding_box::BoundingBox;
use mesh_geom::geometry::point::Point;
use mesh_geom::io;
use mesh_geom::mesh_generation::structured_hex_mesh;
use mesh_geom::topology::elem_type::ElemType;
use std::process::Command;

fn grid2grid() -> Command {
    Command::new(env!("CARGO_BIN_EXE_grid2grid"))
}

#[test]
fn too_few_arguments_prints_usage_and_fails() {
    let out = grid2grid()
        .args(["0", "coarse.msh", "fine.msh", "coarse_soln.msh"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("grid2grid ivar coarse.msh fine.msh coarse_soln.msh fine_soln.msh"));
    assert!(out.stdout.is_empty());
}

#[test]
fn full_run_reports_error_and_writes_difference() {
    let dir = std::env::temp_dir().join(format!("mesh_geom_cli_{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let cube = BoundingBox::new(Point::zero(), Point::new(1.0, 1.0, 1.0));
    let coarse = structured_hex_mesh(1, 1, 1, cube, ElemType::Hex8).unwrap();
    let fine = structured_hex_mesh(2, 2, 2, cube, ElemType::Hex27).unwrap();
    let f = |p: &Point, _: usize| p.x * p.x;
    io::write_nodal_field(dir.join("coarse.msh"), &coarse, &Field::from_fn(&coarse, vec!["u".into()], f))
        .unwrap();
    io::write_nodal_field(dir.join("fine.msh"), &fine, &Field::from_fn(&fine, vec!["u".into()], f))
        .unwrap();

    let out = grid2grid()
        .current_dir(&dir)
        .args(["0", "coarse.msh", "fine.msh", "coarse.msh", "fine.msh"])
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Mesh Information:"));
    assert!(stdout.contains("n_active_bins() = "));
    let error: f64 = stdout
        .lines()
        .find_map(|l| l.strip_prefix("Computed error="))
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert!((error - (1.0f64 / 30.0).sqrt()).abs() < 1e-10);
    assert!(dir.join("diff.plt").exists());
    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_input_file_fails() {
    let out = grid2grid()
        .args(["0", "/nonexistent/c.msh", "f.msh", "cs.msh", "fs.msh"])
        .output()
        .unwrap();
    assert!(!out.status.success());
}

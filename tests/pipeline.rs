//! 端到端测试：文件读写与无窗口管线

use mesh_pipeline::core::config::Config;
use mesh_pipeline::core::math::Color;
use mesh_pipeline::geometry::loaders::{load_mesh, save_mesh};
use mesh_pipeline::geometry::primitives::create_sphere;
use mesh_pipeline::pipeline::{self, stages};
use mesh_pipeline::renderer::Viewer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

const CUBE_OBJ: &str = "\
# unit cube
o cube
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
f 1 4 3 2
f 5 6 7 8
f 1 2 6 5
f 2 3 7 6
f 3 4 8 7
f 4 1 5 8
";

fn headless_config(mesh_path: &str) -> Config {
    let mut config = Config::default();
    config.viewer.enabled = false;
    config.input.mesh_path = mesh_path.to_string();
    config.sampling.number_of_points = 3000;
    config.reconstruction.depth = 6;
    config.reconstruction.min_depth = 4;
    config
}

#[test]
fn test_fixture_counts() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cube.obj");
    std::fs::write(&path, CUBE_OBJ).unwrap();

    let (_, report) = stages::load(&path).unwrap();
    assert_eq!(report.vertices, 8);
    // 四边形三角化
    assert_eq!(report.triangles, 12);
    assert!(!report.has_colors);
    assert!(!report.has_normals);
}

#[test]
fn test_obj_to_ply_round_trip() {
    let dir = tempdir().unwrap();
    let obj = dir.path().join("round_trip.obj");
    let ply = dir.path().join("round_trip.ply");
    std::fs::write(&obj, CUBE_OBJ).unwrap();

    let mesh = load_mesh(&obj).unwrap();
    save_mesh(&ply, &mesh).unwrap();
    let reloaded = load_mesh(&ply).unwrap();

    assert_eq!(reloaded.vertex_count(), mesh.vertex_count());
    assert_eq!(reloaded.triangle_count(), mesh.triangle_count());
    assert_eq!(reloaded.triangles, mesh.triangles);
    for (a, b) in reloaded.vertices.iter().zip(&mesh.vertices) {
        assert!((a - b).norm() < 1e-6);
    }
}

#[test]
fn test_unsupported_extension_is_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("model.stl");
    std::fs::write(&path, "solid empty\nendsolid empty\n").unwrap();
    assert!(load_mesh(&path).is_err());
}

#[test]
fn test_cropped_reconstruction_stays_in_bounds() {
    let mut mesh = create_sphere(1.0, 20);
    mesh.compute_vertex_normals();

    let mut rng = StdRng::seed_from_u64(11);
    let (pcd, _) = stages::sample(&mesh, 3000, &mut rng).unwrap();
    let config = headless_config("unused").reconstruction;
    let (cropped, report) = stages::reconstruct(&pcd, &config).unwrap();

    assert!(report.vertices > 0);
    assert_eq!(report.vertices, cropped.vertex_count());
    let bbox = pcd.axis_aligned_bounding_box().unwrap();
    assert!(cropped.vertices.iter().all(|v| bbox.contains(v)));
    assert!(cropped.validate().is_ok());
    assert!(!report.has_colors);
}

#[test]
fn test_painted_mesh_keeps_colors_through_reconstruction() {
    let mut mesh = create_sphere(1.0, 20);
    mesh.compute_vertex_normals();
    mesh.paint_uniform_color(Color::new(0.9, 0.6, 0.1));

    let mut rng = StdRng::seed_from_u64(17);
    let (pcd, sample_report) = stages::sample(&mesh, 3000, &mut rng).unwrap();
    assert!(sample_report.has_colors);

    let config = headless_config("unused").reconstruction;
    let (cropped, report) = stages::reconstruct(&pcd, &config).unwrap();
    assert!(report.has_colors);
    assert_eq!(cropped.vertex_colors.len(), cropped.vertex_count());
    for c in &cropped.vertex_colors {
        assert!((c.r - 0.9).abs() < 1e-4);
        assert!((c.g - 0.6).abs() < 1e-4);
        assert!((c.b - 0.1).abs() < 1e-4);
    }
}

#[test]
fn test_clip_and_extrema_agree_with_direct_scan() {
    let mut mesh = create_sphere(1.0, 20);
    mesh.compute_vertex_normals();
    let mut rng = StdRng::seed_from_u64(3);
    let (pcd, report) = stages::sample(&mesh, 5000, &mut rng).unwrap();
    assert_eq!(report.points, 5000);

    let config = Config::default();
    let (clipped, clip_report) = stages::clip(&pcd, &config.clip);
    let expected = pcd.points.iter().filter(|p| p.y > -0.2).count();
    assert_eq!(clip_report.remaining, expected);

    let expected_min = clipped
        .points
        .iter()
        .map(|p| p.z)
        .fold(f64::INFINITY, f64::min);
    let expected_max = clipped
        .points
        .iter()
        .map(|p| p.z)
        .fold(f64::NEG_INFINITY, f64::max);

    let (scene, extrema) = stages::color_and_mark(clipped, &config.gradient).unwrap();
    assert_eq!(extrema.min_point.z, expected_min);
    assert_eq!(extrema.max_point.z, expected_max);
    assert_eq!(scene.cloud.colors.len(), scene.cloud.len());
}

#[test]
fn test_headless_pipeline_runs_to_completion() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sphere.ply");
    save_mesh(&path, &create_sphere(1.0, 16)).unwrap();

    let config = headless_config(path.to_str().unwrap());
    config.validate().unwrap();
    let mut viewer = Viewer::new(&config).unwrap();
    pipeline::run(&config, &mut viewer).unwrap();
}

#[test]
fn test_missing_input_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("does_not_exist.ply");
    let config = headless_config(path.to_str().unwrap());
    let mut viewer = Viewer::new(&config).unwrap();
    assert!(pipeline::run(&config, &mut viewer).is_err());
}

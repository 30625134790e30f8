//! 参数化图元：长方体和经纬球
//!
//! 用于地面平面和极值标记，生成后平移、着色，不会写出到文件。

use std::f64::consts::PI;

use super::mesh::TriangleMesh;
use crate::core::math::Point;

/// 创建长方体
///
/// 最小角在原点，x 方向为 `width`，y 方向为 `height`，z 方向为 `depth`。
/// 8 个顶点，12 个朝外的三角形。
pub fn create_box(width: f64, height: f64, depth: f64) -> TriangleMesh {
    let vertices = vec![
        Point::new(0.0, 0.0, 0.0),
        Point::new(width, 0.0, 0.0),
        Point::new(0.0, 0.0, depth),
        Point::new(width, 0.0, depth),
        Point::new(0.0, height, 0.0),
        Point::new(width, height, 0.0),
        Point::new(0.0, height, depth),
        Point::new(width, height, depth),
    ];

    let triangles = vec![
        [4, 7, 5],
        [4, 6, 7],
        [0, 2, 4],
        [2, 6, 4],
        [0, 1, 2],
        [1, 3, 2],
        [1, 5, 7],
        [1, 7, 3],
        [2, 3, 7],
        [2, 7, 6],
        [0, 4, 1],
        [1, 4, 5],
    ];

    let mut mesh = TriangleMesh::from_parts(vertices, triangles);
    mesh.name = Some("Box".to_string());
    mesh
}

/// 创建经纬球
///
/// 球心在原点，两极在 ±z。`resolution` 条纬线分段、`2 * resolution` 条经线分段：
/// - 顶点数 `2 + (resolution - 1) * 2 * resolution`
/// - 三角形数 `4 * resolution + (resolution - 2) * 4 * resolution`
///
/// `resolution` 小于 2 时按 2 处理。
pub fn create_sphere(radius: f64, resolution: u32) -> TriangleMesh {
    let rings = resolution.max(2);
    let segments = 2 * rings;

    let mut vertices = Vec::with_capacity((2 + (rings - 1) * segments) as usize);
    vertices.push(Point::new(0.0, 0.0, radius));
    vertices.push(Point::new(0.0, 0.0, -radius));

    for i in 1..rings {
        let alpha = PI * i as f64 / rings as f64;
        let (sin_a, cos_a) = alpha.sin_cos();
        for j in 0..segments {
            let theta = 2.0 * PI * j as f64 / segments as f64;
            let (sin_t, cos_t) = theta.sin_cos();
            vertices.push(Point::new(
                radius * sin_a * cos_t,
                radius * sin_a * sin_t,
                radius * cos_a,
            ));
        }
    }

    // 第 i 圈（从 1 开始）第 j 个顶点的下标
    let ring_vertex = |i: u32, j: u32| 2 + (i - 1) * segments + (j % segments);

    let mut triangles = Vec::new();

    // 北极扇形
    for j in 0..segments {
        triangles.push([0, ring_vertex(1, j), ring_vertex(1, j + 1)]);
    }

    // 中间各条带
    for i in 1..rings - 1 {
        for j in 0..segments {
            let a = ring_vertex(i, j);
            let b = ring_vertex(i + 1, j);
            let c = ring_vertex(i + 1, j + 1);
            let d = ring_vertex(i, j + 1);
            triangles.push([a, b, c]);
            triangles.push([a, c, d]);
        }
    }

    // 南极扇形
    for j in 0..segments {
        triangles.push([1, ring_vertex(rings - 1, j + 1), ring_vertex(rings - 1, j)]);
    }

    let mut mesh = TriangleMesh::from_parts(vertices, triangles);
    mesh.name = Some("Sphere".to_string());
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 朝外三角形：法线与 (三角形中心 - 形体中心) 同向
    fn all_outward(mesh: &TriangleMesh, center: Point) -> bool {
        mesh.triangles.iter().zip(mesh.triangle_normals()).all(|(tri, n)| {
            let c = (mesh.vertices[tri[0] as usize].coords
                + mesh.vertices[tri[1] as usize].coords
                + mesh.vertices[tri[2] as usize].coords)
                / 3.0;
            n.dot(&(c - center.coords)) > 0.0
        })
    }

    #[test]
    fn test_box_counts_and_bounds() {
        let mesh = create_box(30.0, 1.0, 45.0);
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);

        let bbox = mesh.axis_aligned_bounding_box().unwrap();
        assert_eq!(bbox.min, Point::origin());
        assert_eq!(bbox.max, Point::new(30.0, 1.0, 45.0));
        assert!((mesh.surface_area() - 2.0 * (30.0 + 45.0 * 30.0 + 45.0)).abs() < 1e-9);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_box_faces_outward() {
        let mesh = create_box(2.0, 1.0, 3.0);
        assert!(all_outward(&mesh, Point::new(1.0, 0.5, 1.5)));
    }

    #[test]
    fn test_sphere_counts() {
        let mesh = create_sphere(1.0, 20);
        assert_eq!(mesh.vertex_count(), 762);
        assert_eq!(mesh.triangle_count(), 1520);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_sphere_radius_and_orientation() {
        let mesh = create_sphere(0.03, 8);
        for v in &mesh.vertices {
            assert!((v.coords.norm() - 0.03).abs() < 1e-12);
        }
        assert!(all_outward(&mesh, Point::origin()));
    }
}

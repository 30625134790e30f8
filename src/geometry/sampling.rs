//! 网格表面均匀采样
//!
//! 按面积比例选三角形，再在三角形内均匀取重心坐标，
//! 得到精确数量的表面点。网格带法线/颜色时，点的法线/颜色按重心坐标插值。

use rand::Rng;

use super::mesh::TriangleMesh;
use super::normals::normalize_or_zero;
use super::point_cloud::PointCloud;
use crate::core::error::GeometryError;
use crate::core::math::Color;

/// 在网格表面均匀采样 `number_of_points` 个点
///
/// # 错误
///
/// - 网格没有三角形或总面积为零时返回 `GeometryError::EmptyGeometry`
///
/// # 示例
///
/// ```rust
/// use mesh_pipeline::geometry::{primitives, sampling};
/// use rand::SeedableRng;
///
/// let mesh = primitives::create_box(1.0, 1.0, 1.0);
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let pcd = sampling::sample_points_uniformly(&mesh, 100, &mut rng).unwrap();
/// assert_eq!(pcd.len(), 100);
/// ```
pub fn sample_points_uniformly<R: Rng + ?Sized>(
    mesh: &TriangleMesh,
    number_of_points: usize,
    rng: &mut R,
) -> Result<PointCloud, GeometryError> {
    // 面积累积分布表
    let mut cumulative = Vec::with_capacity(mesh.triangle_count());
    let mut total_area = 0.0;
    for tri in &mesh.triangles {
        total_area += mesh.triangle_area(tri);
        cumulative.push(total_area);
    }

    if mesh.triangles.is_empty() || total_area <= 0.0 {
        return Err(GeometryError::EmptyGeometry(
            "mesh has no surface area to sample".to_string(),
        ));
    }

    let has_normals = mesh.has_vertex_normals();
    let has_colors = mesh.has_vertex_colors();

    let mut pcd = PointCloud {
        points: Vec::with_capacity(number_of_points),
        normals: Vec::with_capacity(if has_normals { number_of_points } else { 0 }),
        colors: Vec::with_capacity(if has_colors { number_of_points } else { 0 }),
    };

    for _ in 0..number_of_points {
        let target = rng.gen::<f64>() * total_area;
        let tri_index = cumulative
            .partition_point(|&c| c <= target)
            .min(cumulative.len() - 1);
        let [i0, i1, i2] = mesh.triangles[tri_index].map(|i| i as usize);

        let r1 = rng.gen::<f64>().sqrt();
        let r2 = rng.gen::<f64>();
        let a = 1.0 - r1;
        let b = r1 * (1.0 - r2);
        let c = r1 * r2;

        let p = mesh.vertices[i0].coords * a
            + mesh.vertices[i1].coords * b
            + mesh.vertices[i2].coords * c;
        pcd.points.push(p.into());

        if has_normals {
            let n = mesh.vertex_normals[i0] * a
                + mesh.vertex_normals[i1] * b
                + mesh.vertex_normals[i2] * c;
            pcd.normals.push(normalize_or_zero(n));
        }

        if has_colors {
            let (c0, c1, c2) = (mesh.vertex_colors[i0], mesh.vertex_colors[i1], mesh.vertex_colors[i2]);
            let (a, b, c) = (a as f32, b as f32, c as f32);
            pcd.colors.push(Color::new(
                c0.r * a + c1.r * b + c2.r * c,
                c0.g * a + c1.g * b + c2.g * c,
                c0.b * a + c1.b * b + c2.b * c,
            ));
        }
    }

    Ok(pcd)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives::create_box;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_exact_point_count() {
        let mesh = create_box(1.0, 2.0, 3.0);
        let mut rng = StdRng::seed_from_u64(1);
        for n in [1, 17, 20000] {
            let pcd = sample_points_uniformly(&mesh, n, &mut rng).unwrap();
            assert_eq!(pcd.len(), n);
        }
    }

    #[test]
    fn test_points_lie_on_surface() {
        let mesh = create_box(1.0, 2.0, 3.0);
        let mut rng = StdRng::seed_from_u64(2);
        let pcd = sample_points_uniformly(&mesh, 500, &mut rng).unwrap();
        let bbox = mesh.axis_aligned_bounding_box().unwrap();

        for p in &pcd.points {
            assert!(bbox.scale(1.0 + 1e-9).contains(p));
            // 盒子表面上的点至少有一个坐标落在面上
            let on_face = (0..3).any(|i| {
                (p[i] - bbox.min[i]).abs() < 1e-9 || (p[i] - bbox.max[i]).abs() < 1e-9
            });
            assert!(on_face, "point {:?} is not on the box surface", p);
        }
    }

    #[test]
    fn test_attributes_follow_mesh() {
        let mut mesh = create_box(1.0, 1.0, 1.0);
        let mut rng = StdRng::seed_from_u64(3);

        let pcd = sample_points_uniformly(&mesh, 10, &mut rng).unwrap();
        assert!(!pcd.has_normals());
        assert!(!pcd.has_colors());

        mesh.compute_vertex_normals();
        mesh.paint_uniform_color(Color::new(0.2, 0.4, 0.6));
        let pcd = sample_points_uniformly(&mesh, 10, &mut rng).unwrap();
        assert!(pcd.has_normals());
        assert!(pcd.has_colors());
        for c in &pcd.colors {
            assert!((c.g - 0.4).abs() < 1e-5);
        }
    }

    #[test]
    fn test_same_seed_same_points() {
        let mesh = create_box(1.0, 1.0, 1.0);
        let a = sample_points_uniformly(&mesh, 50, &mut StdRng::seed_from_u64(9)).unwrap();
        let b = sample_points_uniformly(&mesh, 50, &mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn test_empty_mesh_is_error() {
        let mesh = TriangleMesh::new();
        let mut rng = StdRng::seed_from_u64(4);
        assert!(sample_points_uniformly(&mesh, 10, &mut rng).is_err());
    }
}

//! 法线计算模块
//!
//! 提供网格处理相关的法线函数：
//! - 三角形法线（单位长度）
//! - 顶点法线（由面法线累加得到）
//!
//! 这些函数用于后处理加载的网格数据和重建结果。

use crate::core::math::{Point, Vector};

/// 从三角形面计算顶点法线
///
/// # 算法
///
/// 1. 对于每个三角形 (v0, v1, v2):
///    - 计算面法线: face_normal = cross(v1 - v0, v2 - v0)（不归一化，长度与面积成正比）
///    - 累加面法线到三个顶点
///
/// 2. 归一化所有顶点法线；长度为零的法线保持为零向量
///
/// # 示例
///
/// ```rust
/// use mesh_pipeline::geometry::normals::compute_vertex_normals;
/// use mesh_pipeline::core::Point;
///
/// let vertices = vec![
///     Point::new(0.0, 0.0, 0.0),
///     Point::new(1.0, 0.0, 0.0),
///     Point::new(0.0, 1.0, 0.0),
/// ];
/// let normals = compute_vertex_normals(&vertices, &[[0, 1, 2]]);
/// assert!((normals[0].z - 1.0).abs() < 1e-12);
/// ```
pub fn compute_vertex_normals(vertices: &[Point], triangles: &[[u32; 3]]) -> Vec<Vector> {
    let mut normals = vec![Vector::zeros(); vertices.len()];

    for tri in triangles {
        let face_normal = face_normal(vertices, tri);
        for &i in tri {
            normals[i as usize] += face_normal;
        }
    }

    for n in normals.iter_mut() {
        *n = normalize_or_zero(*n);
    }

    normals
}

/// 计算每个三角形的单位法线
pub fn compute_triangle_normals(vertices: &[Point], triangles: &[[u32; 3]]) -> Vec<Vector> {
    triangles
        .iter()
        .map(|tri| normalize_or_zero(face_normal(vertices, tri)))
        .collect()
}

/// 未归一化的面法线
#[inline]
fn face_normal(vertices: &[Point], tri: &[u32; 3]) -> Vector {
    let p0 = vertices[tri[0] as usize];
    let p1 = vertices[tri[1] as usize];
    let p2 = vertices[tri[2] as usize];
    (p1 - p0).cross(&(p2 - p0))
}

/// 归一化向量，长度接近零时返回零向量
#[inline]
pub fn normalize_or_zero(v: Vector) -> Vector {
    let length = v.norm();
    if length < 1e-12 {
        Vector::zeros()
    } else {
        v / length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_zero() {
        assert_eq!(normalize_or_zero(Vector::zeros()), Vector::zeros());
        let n = normalize_or_zero(Vector::new(3.0, 4.0, 0.0));
        assert!((n.x - 0.6).abs() < 1e-12);
        assert!((n.y - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_vertex_normals_simple_triangle() {
        // XZ 平面上的三角形，绕序 (0, 2, 1) 朝 +Y
        let vertices = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 0.0, 1.0),
        ];
        let normals = compute_vertex_normals(&vertices, &[[0, 2, 1]]);

        for n in &normals {
            assert!((n.y - 1.0).abs() < 1e-12, "normal should point to +Y: {:?}", n);
        }
    }

    #[test]
    fn test_vertex_normals_are_area_weighted() {
        // 共享顶点 0 的两个三角形：一个大（朝 +Z），一个小（朝 +X）
        let vertices = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(10.0, 0.0, 0.0),
            Point::new(0.0, 10.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(0.0, 0.0, 1.0),
        ];
        let normals = compute_vertex_normals(&vertices, &[[0, 1, 2], [0, 3, 4]]);

        let n0 = normals[0];
        assert!(n0.z > n0.x, "larger face should dominate: {:?}", n0);
        assert!((n0.norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_isolated_vertex_keeps_zero_normal() {
        let vertices = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(5.0, 5.0, 5.0),
        ];
        let normals = compute_vertex_normals(&vertices, &[[0, 1, 2]]);
        assert_eq!(normals[3], Vector::zeros());
    }

    #[test]
    fn test_triangle_normals() {
        let vertices = vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(0.0, 2.0, 0.0),
        ];
        let normals = compute_triangle_normals(&vertices, &[[0, 1, 2], [0, 2, 1]]);
        assert_eq!(normals[0], Vector::new(0.0, 0.0, 1.0));
        assert_eq!(normals[1], Vector::new(0.0, 0.0, -1.0));
    }
}

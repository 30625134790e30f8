//! Surface Nets 等值面提取
//!
//! 每个跨越等值面的单元放一个顶点（单元各棱上插值交点的平均）；
//! 每条跨越等值面的网格边，用共享它的 4 个单元的顶点组成一个四边形，
//! 按符号决定朝向，使法线指向隐函数增大的一侧（外侧）。

use std::collections::HashMap;

use super::grid::{NodeKey, SparseGrid, CELL_EDGES, CORNER_OFFSETS};
use crate::core::math::Point;
use crate::geometry::TriangleMesh;

/// 提取 `values == iso` 的等值面
///
/// `values` 是每个节点上的隐函数值，小于 `iso` 视为内部。
pub fn extract(grid: &SparseGrid, values: &[f64], iso: f64) -> TriangleMesh {
    let frame = &grid.frame;
    let inside = |node: usize| values[node] < iso;

    // 第一遍：为每个跨越等值面的单元生成顶点
    let mut cell_vertices: HashMap<NodeKey, u32> = HashMap::new();
    let mut vertices: Vec<Point> = Vec::new();

    for &cell in grid.keys() {
        let Some(corners) = grid.cell_corners(cell) else {
            continue;
        };

        let inside_count = corners.iter().filter(|&&n| inside(n)).count();
        if inside_count == 0 || inside_count == 8 {
            continue;
        }

        let mut sum = Point::origin().coords;
        let mut crossings = 0usize;
        for &(a, b) in &CELL_EDGES {
            let (na, nb) = (corners[a], corners[b]);
            if inside(na) == inside(nb) {
                continue;
            }
            let (va, vb) = (values[na], values[nb]);
            let t = ((iso - va) / (vb - va)).clamp(0.0, 1.0);
            let pa = frame.node_position(offset_key(cell, CORNER_OFFSETS[a]));
            let pb = frame.node_position(offset_key(cell, CORNER_OFFSETS[b]));
            sum += pa.coords + (pb - pa) * t;
            crossings += 1;
        }

        cell_vertices.insert(cell, vertices.len() as u32);
        vertices.push(Point::from(sum / crossings as f64));
    }

    // 第二遍：每条跨越等值面的边生成一个四边形
    let mut triangles: Vec<[u32; 3]> = Vec::new();

    for (node, &key) in grid.keys().iter().enumerate() {
        for axis in 0..3 {
            let mut step = [0; 3];
            step[axis] = 1;
            let Some(next) = grid.neighbor(node, step) else {
                continue;
            };
            if inside(node) == inside(next) {
                continue;
            }

            let u = (axis + 1) % 3;
            let v = (axis + 2) % 3;
            let mut du = [0; 3];
            du[u] = -1;
            let mut dv = [0; 3];
            dv[v] = -1;
            let mut duv = [0; 3];
            duv[u] = -1;
            duv[v] = -1;

            // (u, v) 平面内逆时针，法线沿 +axis
            let cells = [key, offset_key(key, du), offset_key(key, duv), offset_key(key, dv)];
            let mut quad = [0u32; 4];
            let mut complete = true;
            for (slot, cell) in quad.iter_mut().zip(cells) {
                match cell_vertices.get(&cell) {
                    Some(&index) => *slot = index,
                    None => {
                        complete = false;
                        break;
                    }
                }
            }
            if !complete {
                continue;
            }

            // 从内到外沿 +axis 时保持顺序，否则翻转
            if !inside(node) {
                quad.reverse();
            }
            triangles.push([quad[0], quad[1], quad[2]]);
            triangles.push([quad[0], quad[2], quad[3]]);
        }
    }

    TriangleMesh::from_parts(vertices, triangles)
}

fn offset_key(key: NodeKey, offset: [i32; 3]) -> NodeKey {
    [key[0] + offset[0], key[1] + offset[1], key[2] + offset[2]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::Vector;
    use crate::geometry::AxisAlignedBoundingBox;
    use crate::reconstruction::grid::GridFrame;

    /// 在全部节点上取有符号距离
    fn sphere_grid(radius: f64, depth: u32) -> (SparseGrid, Vec<f64>) {
        let bbox = AxisAlignedBoundingBox::new(Point::new(-1.0, -1.0, -1.0), Point::new(1.0, 1.0, 1.0));
        let frame = GridFrame::new(&bbox, 1.2, depth);
        let n = frame.resolution;
        // 用每个单元中心作为"采样点"，窄带覆盖全部节点
        let mut points = Vec::new();
        for z in 0..n {
            for y in 0..n {
                for x in 0..n {
                    points.push(frame.node_position([x, y, z]) + Vector::repeat(frame.cell_size * 0.5));
                }
            }
        }
        let grid = SparseGrid::build(frame, &points, 0);
        let values = grid
            .keys()
            .iter()
            .map(|&k| frame.node_position(k).coords.norm() - radius)
            .collect();
        (grid, values)
    }

    #[test]
    fn test_sphere_vertices_near_surface() {
        let (grid, values) = sphere_grid(0.7, 4);
        let mesh = extract(&grid, &values, 0.0);

        assert!(!mesh.is_empty());
        assert!(mesh.validate().is_ok());
        let h = grid.frame.cell_size;
        for v in &mesh.vertices {
            assert!((v.coords.norm() - 0.7).abs() < h);
        }
    }

    #[test]
    fn test_sphere_faces_point_outward() {
        let (grid, values) = sphere_grid(0.7, 4);
        let mesh = extract(&grid, &values, 0.0);

        for (tri, n) in mesh.triangles.iter().zip(mesh.triangle_normals()) {
            let centroid = (mesh.vertices[tri[0] as usize].coords
                + mesh.vertices[tri[1] as usize].coords
                + mesh.vertices[tri[2] as usize].coords)
                / 3.0;
            assert!(n.dot(&centroid) > 0.0);
        }
    }

    #[test]
    fn test_closed_sphere_is_watertight() {
        let (grid, values) = sphere_grid(0.7, 4);
        let mesh = extract(&grid, &values, 0.0);

        // 每条无向边恰好被两个三角形共享
        let mut edge_use: HashMap<(u32, u32), usize> = HashMap::new();
        for tri in &mesh.triangles {
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                *edge_use.entry((a.min(b), a.max(b))).or_default() += 1;
            }
        }
        assert!(edge_use.values().all(|&count| count == 2));
    }

    #[test]
    fn test_uniform_field_has_no_surface() {
        let (grid, _) = sphere_grid(0.7, 3);
        let values = vec![1.0; grid.len()];
        assert!(extract(&grid, &values, 0.0).is_empty());
    }
}

//! 顶点数据定义
//!
//! 把 CPU 侧几何体（网格、点云、体素网格）转换成可以直接上传到 GPU 的顶点批次。
//!
//! # 设计说明
//!
//! - 使用 `#[repr(C)]` 确保内存布局与着色器一致
//! - 实现 `Pod` 和 `Zeroable` trait 以支持零拷贝传输到 GPU
//! - 法线为零向量的顶点在着色器中不参与光照（点云没有法线时）

use bytemuck::{Pod, Zeroable};

use super::Geometry;
use crate::core::math::{Color, Point, Vector};
use crate::geometry::normals::compute_vertex_normals;
use crate::geometry::{PointCloud, TriangleMesh, VoxelGrid};

/// 顶点结构体
///
/// # 内存布局
///
/// - `position`：0..12 字节
/// - `normal`：12..24 字节
/// - `color`：24..36 字节
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
}

impl SceneVertex {
    pub fn new(position: &Point, normal: &Vector, color: Color) -> Self {
        Self {
            position: [position.x as f32, position.y as f32, position.z as f32],
            normal: [normal.x as f32, normal.y as f32, normal.z as f32],
            color: color.to_array(),
        }
    }
}

/// 图元类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Triangles,
    Points,
}

/// 一次绘制调用所需的数据
#[derive(Debug, Clone)]
pub struct DrawBatch {
    pub topology: Topology,
    pub vertices: Vec<SceneVertex>,
    /// 三角形索引；点批次为空
    pub indices: Vec<u32>,
}

impl DrawBatch {
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    fn from_mesh(mesh: &TriangleMesh) -> Self {
        // 没有法线的网格现算一份，只用于显示
        let computed;
        let normals = if mesh.has_vertex_normals() {
            &mesh.vertex_normals
        } else {
            computed = compute_vertex_normals(&mesh.vertices, &mesh.triangles);
            &computed
        };

        let vertices = mesh
            .vertices
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let color = mesh.vertex_colors.get(i).copied().unwrap_or(Color::DEFAULT_GRAY);
                SceneVertex::new(p, &normals[i], color)
            })
            .collect();

        Self {
            topology: Topology::Triangles,
            vertices,
            indices: mesh.triangles.iter().flatten().copied().collect(),
        }
    }

    fn from_point_cloud(pcd: &PointCloud) -> Self {
        let vertices = pcd
            .points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let normal = pcd.normals.get(i).copied().unwrap_or_else(Vector::zeros);
                let color = pcd.colors.get(i).copied().unwrap_or(Color::DEFAULT_GRAY);
                SceneVertex::new(p, &normal, color)
            })
            .collect();

        Self {
            topology: Topology::Points,
            vertices,
            indices: Vec::new(),
        }
    }

    /// 每个体素画成一个立方体，6 个面各自带面法线
    fn from_voxel_grid(grid: &VoxelGrid) -> Self {
        let voxels = grid.voxels();
        let mut vertices = Vec::with_capacity(voxels.len() * 24);
        let mut indices = Vec::with_capacity(voxels.len() * 36);

        for voxel in &voxels {
            let bounds = grid.voxel_bounds(voxel.grid_index);
            let color = voxel.color.unwrap_or(Color::DEFAULT_GRAY);
            let (lo, hi) = (bounds.min, bounds.max);

            for (axis, sign) in [(0, -1.0), (0, 1.0), (1, -1.0), (1, 1.0), (2, -1.0), (2, 1.0)] {
                let mut normal = Vector::zeros();
                normal[axis] = sign;

                let u = (axis + 1) % 3;
                let v = (axis + 2) % 3;
                let fixed = if sign > 0.0 { hi[axis] } else { lo[axis] };
                let corner = |a: f64, b: f64| {
                    let mut p = Point::origin();
                    p[axis] = fixed;
                    p[u] = a;
                    p[v] = b;
                    p
                };

                let base = vertices.len() as u32;
                for p in [
                    corner(lo[u], lo[v]),
                    corner(hi[u], lo[v]),
                    corner(hi[u], hi[v]),
                    corner(lo[u], hi[v]),
                ] {
                    vertices.push(SceneVertex::new(&p, &normal, color));
                }

                // (u, v) 逆时针时法线沿 +axis，负方向的面翻转
                if sign > 0.0 {
                    indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
                } else {
                    indices.extend_from_slice(&[base, base + 2, base + 1, base, base + 3, base + 2]);
                }
            }
        }

        Self {
            topology: Topology::Triangles,
            vertices,
            indices,
        }
    }
}

impl From<&Geometry> for DrawBatch {
    fn from(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Mesh(mesh) => Self::from_mesh(mesh),
            Geometry::PointCloud(pcd) => Self::from_point_cloud(pcd),
            Geometry::VoxelGrid(grid) => Self::from_voxel_grid(grid),
        }
    }
}

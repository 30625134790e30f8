//! 体素网格
//!
//! 将点云划分为固定边长的立方体单元，只记录被占据的体素。
//! 体素颜色为落入其中的点颜色的平均值。

use std::collections::HashMap;

use super::bounding_box::AxisAlignedBoundingBox;
use super::point_cloud::PointCloud;
use crate::core::error::GeometryError;
use crate::core::math::{Color, Point, Vector};

/// 单个体素
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Voxel {
    /// 网格整数坐标
    pub grid_index: [i32; 3],
    /// 平均颜色（点云没有颜色时为 `None`）
    pub color: Option<Color>,
}

/// 体素网格
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    /// 网格原点（索引 [0, 0, 0] 体素的最小角）
    pub origin: Point,
    pub voxel_size: f64,
    voxels: HashMap<[i32; 3], Voxel>,
}

/// 颜色累加器
#[derive(Default)]
struct ColorSum {
    r: f64,
    g: f64,
    b: f64,
    count: usize,
}

impl VoxelGrid {
    /// 由点云构建体素网格
    ///
    /// 原点取点云最小边界减去半个体素，索引为 `floor((p - origin) / voxel_size)`。
    pub fn create_from_point_cloud(pcd: &PointCloud, voxel_size: f64) -> Result<Self, GeometryError> {
        if !(voxel_size > 0.0) {
            return Err(GeometryError::InvalidParameter {
                name: "voxel_size".to_string(),
                reason: format!("must be positive, got {}", voxel_size),
            });
        }

        let bbox = pcd
            .axis_aligned_bounding_box()
            .ok_or_else(|| GeometryError::EmptyGeometry("point cloud has no points".to_string()))?;

        let half = Vector::repeat(voxel_size * 0.5);
        let origin = bbox.min - half;

        let has_colors = pcd.has_colors();
        let mut accumulators: HashMap<[i32; 3], ColorSum> = HashMap::new();

        for (i, p) in pcd.points.iter().enumerate() {
            let offset = (p - origin) / voxel_size;
            let key = [
                offset.x.floor() as i32,
                offset.y.floor() as i32,
                offset.z.floor() as i32,
            ];
            let acc = accumulators.entry(key).or_default();
            acc.count += 1;
            if has_colors {
                let c = pcd.colors[i];
                acc.r += c.r as f64;
                acc.g += c.g as f64;
                acc.b += c.b as f64;
            }
        }

        let voxels = accumulators
            .into_iter()
            .map(|(key, acc)| {
                let color = has_colors.then(|| {
                    let n = acc.count as f64;
                    Color::new((acc.r / n) as f32, (acc.g / n) as f32, (acc.b / n) as f32)
                });
                (key, Voxel { grid_index: key, color })
            })
            .collect();

        Ok(Self {
            origin,
            voxel_size,
            voxels,
        })
    }

    /// 被占据的体素数
    pub fn voxel_count(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub fn has_colors(&self) -> bool {
        self.voxels.values().next().is_some_and(|v| v.color.is_some())
    }

    /// 按网格索引排序的体素列表
    pub fn voxels(&self) -> Vec<Voxel> {
        let mut voxels: Vec<Voxel> = self.voxels.values().copied().collect();
        voxels.sort_by_key(|v| v.grid_index);
        voxels
    }

    pub fn get(&self, grid_index: [i32; 3]) -> Option<&Voxel> {
        self.voxels.get(&grid_index)
    }

    /// 给定点所在的体素索引
    pub fn voxel_index_of(&self, p: &Point) -> [i32; 3] {
        let offset = (p - self.origin) / self.voxel_size;
        [
            offset.x.floor() as i32,
            offset.y.floor() as i32,
            offset.z.floor() as i32,
        ]
    }

    /// 体素中心坐标
    pub fn voxel_center(&self, grid_index: [i32; 3]) -> Point {
        let idx = Vector::new(grid_index[0] as f64, grid_index[1] as f64, grid_index[2] as f64);
        self.origin + (idx + Vector::repeat(0.5)) * self.voxel_size
    }

    /// 体素的包围盒
    pub fn voxel_bounds(&self, grid_index: [i32; 3]) -> AxisAlignedBoundingBox {
        let center = self.voxel_center(grid_index);
        let half = Vector::repeat(self.voxel_size * 0.5);
        AxisAlignedBoundingBox::new(center - half, center + half)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_in_same_voxel_merge() {
        let pcd = PointCloud::from_points(vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(0.01, 0.01, 0.01),
            Point::new(1.0, 0.0, 0.0),
        ]);
        let grid = VoxelGrid::create_from_point_cloud(&pcd, 0.05).unwrap();

        assert_eq!(grid.voxel_count(), 2);
        assert!(!grid.has_colors());
        assert_eq!(grid.origin, Point::new(-0.025, -0.025, -0.025));
    }

    #[test]
    fn test_every_point_is_inside_its_voxel() {
        let pcd = PointCloud::from_points(
            (0..200)
                .map(|i| {
                    let t = i as f64 * 0.0137;
                    Point::new(t.sin(), t.cos() * 0.5, t * 0.1)
                })
                .collect(),
        );
        let grid = VoxelGrid::create_from_point_cloud(&pcd, 0.05).unwrap();

        for p in &pcd.points {
            let idx = grid.voxel_index_of(p);
            assert!(grid.get(idx).is_some());
            assert!(grid.voxel_bounds(idx).scale(1.0 + 1e-9).contains(p));
        }
        assert!(grid.voxel_count() <= pcd.len());
    }

    #[test]
    fn test_average_color() {
        let mut pcd = PointCloud::from_points(vec![Point::new(0.0, 0.0, 0.0), Point::new(0.001, 0.0, 0.0)]);
        pcd.colors = vec![Color::new(1.0, 0.0, 0.0), Color::new(0.0, 0.0, 1.0)];

        let grid = VoxelGrid::create_from_point_cloud(&pcd, 0.1).unwrap();
        let voxels = grid.voxels();
        assert_eq!(voxels.len(), 1);
        assert_eq!(voxels[0].color, Some(Color::new(0.5, 0.0, 0.5)));
    }

    #[test]
    fn test_invalid_parameters() {
        let pcd = PointCloud::from_points(vec![Point::origin()]);
        assert!(VoxelGrid::create_from_point_cloud(&pcd, 0.0).is_err());
        assert!(VoxelGrid::create_from_point_cloud(&PointCloud::new(), 0.05).is_err());
    }
}

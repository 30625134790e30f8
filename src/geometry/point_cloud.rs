//! 点云数据结构

use super::bounding_box::AxisAlignedBoundingBox;
use crate::core::error::GeometryError;
use crate::core::math::{Color, Point, Vector};

/// 点云
///
/// `normals` 和 `colors` 为空或与 `points` 等长。
#[derive(Debug, Clone, Default)]
pub struct PointCloud {
    pub points: Vec<Point>,
    pub normals: Vec<Vector>,
    pub colors: Vec<Color>,
}

/// 某一坐标轴上的极值点
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisExtrema {
    /// 最小值点的下标（多个相同最小值时取第一个）
    pub min_index: usize,
    /// 最大值点的下标（多个相同最大值时取第一个）
    pub max_index: usize,
    pub min_value: f64,
    pub max_value: f64,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// 仅由坐标构造
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.points.is_empty() && self.normals.len() == self.points.len()
    }

    pub fn has_colors(&self) -> bool {
        !self.points.is_empty() && self.colors.len() == self.points.len()
    }

    pub fn paint_uniform_color(&mut self, color: Color) -> &mut Self {
        self.colors = vec![color; self.points.len()];
        self
    }

    pub fn axis_aligned_bounding_box(&self) -> Option<AxisAlignedBoundingBox> {
        AxisAlignedBoundingBox::from_points(&self.points)
    }

    /// 按下标选出子点云，保留法线和颜色
    pub fn select_by_index(&self, indices: &[usize]) -> PointCloud {
        let has_normals = self.has_normals();
        let has_colors = self.has_colors();

        PointCloud {
            points: indices.iter().map(|&i| self.points[i]).collect(),
            normals: if has_normals {
                indices.iter().map(|&i| self.normals[i]).collect()
            } else {
                Vec::new()
            },
            colors: if has_colors {
                indices.iter().map(|&i| self.colors[i]).collect()
            } else {
                Vec::new()
            },
        }
    }

    /// 按坐标阈值裁剪
    ///
    /// 保留 `axis` 坐标严格大于 `threshold` 的点，顺序不变。
    /// 结果只包含坐标，不带法线和颜色。
    pub fn filter_by_axis(&self, axis: usize, threshold: f64) -> PointCloud {
        PointCloud::from_points(
            self.points
                .iter()
                .filter(|p| p[axis] > threshold)
                .copied()
                .collect(),
        )
    }

    /// 某坐标轴上的最小/最大值及其下标
    pub fn axis_extrema(&self, axis: usize) -> Result<AxisExtrema, GeometryError> {
        let first = self
            .points
            .first()
            .ok_or_else(|| GeometryError::EmptyGeometry("point cloud has no points".to_string()))?;

        let mut extrema = AxisExtrema {
            min_index: 0,
            max_index: 0,
            min_value: first[axis],
            max_value: first[axis],
        };

        for (i, p) in self.points.iter().enumerate().skip(1) {
            let value = p[axis];
            if value < extrema.min_value {
                extrema.min_value = value;
                extrema.min_index = i;
            }
            if value > extrema.max_value {
                extrema.max_value = value;
                extrema.max_index = i;
            }
        }

        Ok(extrema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cloud() -> PointCloud {
        PointCloud::from_points(vec![
            Point::new(0.0, -0.5, 0.3),
            Point::new(1.0, 0.1, -0.2),
            Point::new(2.0, -0.2, 0.9),
            Point::new(3.0, 0.7, 0.9),
            Point::new(4.0, -0.19, -0.2),
        ])
    }

    #[test]
    fn test_filter_by_axis_is_strict() {
        let clipped = cloud().filter_by_axis(1, -0.2);

        // -0.2 本身不保留
        assert_eq!(clipped.len(), 3);
        assert_eq!(clipped.points[0].x, 1.0);
        assert_eq!(clipped.points[1].x, 3.0);
        assert_eq!(clipped.points[2].x, 4.0);
        assert!(!clipped.has_colors());
        assert!(!clipped.has_normals());
    }

    #[test]
    fn test_axis_extrema_first_occurrence() {
        let extrema = cloud().axis_extrema(2).unwrap();
        assert_eq!(extrema.min_index, 1);
        assert_eq!(extrema.max_index, 2);
        assert_eq!(extrema.min_value, -0.2);
        assert_eq!(extrema.max_value, 0.9);
    }

    #[test]
    fn test_axis_extrema_empty() {
        let empty = PointCloud::new();
        assert!(matches!(empty.axis_extrema(2), Err(GeometryError::EmptyGeometry(_))));
    }

    #[test]
    fn test_paint_uniform_color() {
        let mut pcd = cloud();
        assert!(!pcd.has_colors());
        pcd.paint_uniform_color(Color::new(1.0, 0.6, 0.0));
        assert!(pcd.has_colors());
        assert!(pcd.colors.iter().all(|c| *c == Color::new(1.0, 0.6, 0.0)));
    }

    #[test]
    fn test_select_by_index_keeps_attributes() {
        let mut pcd = cloud();
        pcd.paint_uniform_color(Color::RED);
        let sub = pcd.select_by_index(&[4, 0]);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.points[0].x, 4.0);
        assert!(sub.has_colors());
        assert!(!sub.has_normals());
    }

    #[test]
    fn test_empty_cloud_flags() {
        let pcd = PointCloud::new();
        assert!(pcd.is_empty());
        assert!(!pcd.has_colors());
        assert!(pcd.axis_aligned_bounding_box().is_none());
    }
}

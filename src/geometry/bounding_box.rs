//! 轴对齐包围盒

use crate::core::math::{Point, Vector};

/// 轴对齐包围盒（AABB）
///
/// 边界是闭区间：`contains` 对落在边界上的点返回 true。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignedBoundingBox {
    pub min: Point,
    pub max: Point,
}

impl AxisAlignedBoundingBox {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// 计算点集的最小包围盒，点集为空时返回 `None`
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bbox = Self::new(first, first);
        for p in iter {
            bbox.expand(p);
        }
        Some(bbox)
    }

    /// 扩展包围盒以包含给定点
    pub fn expand(&mut self, p: &Point) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    /// 合并两个包围盒
    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    pub fn contains(&self, p: &Point) -> bool {
        (0..3).all(|i| p[i] >= self.min[i] && p[i] <= self.max[i])
    }

    pub fn extent(&self) -> Vector {
        self.max - self.min
    }

    pub fn center(&self) -> Point {
        nalgebra::center(&self.min, &self.max)
    }

    /// 最长边长度
    pub fn max_extent(&self) -> f64 {
        self.extent().max()
    }

    /// 以中心为基准缩放
    pub fn scale(&self, factor: f64) -> Self {
        let c = self.center();
        let half = self.extent() * (0.5 * factor);
        Self::new(c - half, c + half)
    }
}

//! 法线场
//!
//! 把采样点法线三线性地累加到网格节点上，做一次 6 邻域盒式平滑，
//! 再整体缩放使被占据节点的平均模长为 1。
//! 点云带颜色时，颜色按同样的三线性权重累加，供输出顶点插值。

use super::grid::SparseGrid;
use crate::core::math::{Color, Point, Vector};

const AXES: [[i32; 3]; 3] = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];

/// 节点上的向量场及采样权重
#[derive(Debug, Clone)]
pub struct NormalField {
    pub vectors: Vec<Vector>,
    /// 每个节点累积的三线性权重，用作密度估计
    pub weights: Vec<f64>,
    /// 按权重累加的 RGB（没有颜色时为空）
    pub color_sums: Vec<Vector>,
}

impl NormalField {
    /// `colors` 为空或与 `points` 等长
    pub fn splat(grid: &SparseGrid, points: &[Point], normals: &[Vector], colors: &[Color]) -> Self {
        let with_colors = !colors.is_empty() && colors.len() == points.len();
        let mut vectors = vec![Vector::zeros(); grid.len()];
        let mut weights = vec![0.0; grid.len()];
        let mut color_sums = vec![Vector::zeros(); if with_colors { grid.len() } else { 0 }];

        for (i, (p, n)) in points.iter().zip(normals).enumerate() {
            if let Some((corners, w)) = grid.stencil(p) {
                for (&node, wk) in corners.iter().zip(w) {
                    vectors[node] += n * wk;
                    weights[node] += wk;
                    if with_colors {
                        let c = colors[i];
                        color_sums[node] += Vector::new(c.r as f64, c.g as f64, c.b as f64) * wk;
                    }
                }
            }
        }

        let mut field = Self {
            vectors,
            weights,
            color_sums,
        };
        field.smooth(grid);
        field.normalize();
        field
    }

    fn smooth(&mut self, grid: &SparseGrid) {
        let neighbors = [
            [1, 0, 0],
            [-1, 0, 0],
            [0, 1, 0],
            [0, -1, 0],
            [0, 0, 1],
            [0, 0, -1],
        ];

        self.vectors = (0..grid.len())
            .map(|node| {
                let mut sum = self.vectors[node];
                let mut count = 1.0;
                for offset in neighbors {
                    if let Some(j) = grid.neighbor(node, offset) {
                        sum += self.vectors[j];
                        count += 1.0;
                    }
                }
                sum / count
            })
            .collect();
    }

    fn normalize(&mut self) {
        let (total, count) = self
            .vectors
            .iter()
            .zip(&self.weights)
            .filter(|(_, w)| **w > 0.0)
            .fold((0.0, 0usize), |(t, c), (v, _)| (t + v.norm(), c + 1));

        if count == 0 || total <= 0.0 {
            return;
        }
        let scale = count as f64 / total;
        for v in &mut self.vectors {
            *v *= scale;
        }
    }

    pub fn has_colors(&self) -> bool {
        !self.color_sums.is_empty()
    }

    /// 点 `p` 处的加权平均颜色
    ///
    /// 没有颜色、`p` 不在网格内或周围节点都没有采样时返回 `None`。
    pub fn color_at(&self, grid: &SparseGrid, p: &Point) -> Option<Color> {
        if !self.has_colors() {
            return None;
        }
        let (corners, w) = grid.stencil(p)?;

        let mut sum = Vector::zeros();
        let mut total = 0.0;
        for (&node, wk) in corners.iter().zip(w) {
            sum += self.color_sums[node] * wk;
            total += self.weights[node] * wk;
        }

        (total > 0.0).then(|| {
            let c = sum / total;
            Color::new(c.x as f32, c.y as f32, c.z as f32)
        })
    }

    /// 网格的所有正向边以及每条边上的目标差值
    ///
    /// 目标差值为两端向量平均值在边方向上的分量，单位是"每单元"。
    pub fn edge_targets(&self, grid: &SparseGrid) -> (Vec<(usize, usize)>, Vec<f64>) {
        let mut edges = Vec::with_capacity(grid.len() * 3);
        let mut targets = Vec::with_capacity(grid.len() * 3);

        for node in 0..grid.len() {
            for (axis, offset) in AXES.iter().enumerate() {
                if let Some(j) = grid.neighbor(node, *offset) {
                    edges.push((node, j));
                    targets.push(0.5 * (self.vectors[node][axis] + self.vectors[j][axis]));
                }
            }
        }

        (edges, targets)
    }
}

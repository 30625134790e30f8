//! 按坐标的颜色渐变

use super::point_cloud::PointCloud;
use crate::core::error::GeometryError;
use crate::core::math::Color;

/// 渐变终点（最高处）
const GRADIENT_HIGH: Color = Color::new(1.0, 0.3, 0.0);

/// 归一化值 t ∈ [0, 1] 映射到颜色 (t, 0.3t, 1 - t)：低处蓝，高处红
#[inline]
pub fn gradient_color(t: f32) -> Color {
    Color::lerp(Color::BLUE, GRADIENT_HIGH, t)
}

/// 沿某坐标轴计算每个点的渐变颜色
///
/// `t = (c - min) / (max - min)`；所有点坐标相同时 t 全部取 0。
///
/// # 错误
///
/// 点云为空时返回 `GeometryError::EmptyGeometry`。
pub fn axis_gradient_colors(pcd: &PointCloud, axis: usize) -> Result<Vec<Color>, GeometryError> {
    let extrema = pcd.axis_extrema(axis)?;
    let range = extrema.max_value - extrema.min_value;

    Ok(pcd
        .points
        .iter()
        .map(|p| {
            let t = if range > 0.0 {
                (p[axis] - extrema.min_value) / range
            } else {
                0.0
            };
            gradient_color(t as f32)
        })
        .collect())
}

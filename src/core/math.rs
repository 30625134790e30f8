//! 统一的数学库模块
//!
//! 基于 `nalgebra`，为几何处理和渲染提供简洁的类型名称。
//!
//! - **几何侧**（CPU）：`Point`、`Vector` 使用 f64，与点云/网格计算精度一致
//! - **渲染侧**（GPU）：`Vector3`、`Matrix4` 使用 f32，直接上传到 uniform buffer
//! - **颜色**：`Color`，RGB 分量范围 0.0-1.0

pub use nalgebra::{Matrix4 as Mat4, Point3, Vector3 as Vec3};

/// 几何计算使用的点类型（双精度）
pub type Point = Point3<f64>;

/// 几何计算使用的向量类型（双精度）
pub type Vector = Vec3<f64>;

/// 渲染侧三维向量（单精度）
pub type Vector3 = Vec3<f32>;

/// 渲染侧 4x4 矩阵（单精度）
pub type Matrix4 = Mat4<f32>;

/// 颜色类型（RGB，范围 0.0-1.0）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    /// 创建新的颜色
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// 灰度颜色
    pub const fn gray(value: f32) -> Self {
        Self::new(value, value, value)
    }

    /// 从整数值创建颜色（0-255）
    pub fn from_rgb_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// 转换为 0-255 整数分量（超出范围的值会被截断）
    pub fn to_rgb_u8(&self) -> [u8; 3] {
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [quantize(self.r), quantize(self.g), quantize(self.b)]
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    /// 逐分量线性插值
    pub fn lerp(a: Color, b: Color, t: f32) -> Color {
        Color::new(
            lerp(a.r, b.r, t),
            lerp(a.g, b.g, t),
            lerp(a.b, b.b, t),
        )
    }

    // 预定义颜色
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0);

    /// 无颜色几何体的默认显示颜色
    pub const DEFAULT_GRAY: Color = Color::new(0.7, 0.7, 0.7);
}

impl From<[f32; 3]> for Color {
    fn from(rgb: [f32; 3]) -> Self {
        Color::new(rgb[0], rgb[1], rgb[2])
    }
}

/// 线性插值
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// 坐标轴名称（0 -> x, 1 -> y, 2 -> z）
pub fn axis_name(axis: usize) -> &'static str {
    match axis {
        0 => "x",
        1 => "y",
        2 => "z",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_u8_conversion() {
        let c = Color::from_rgb_u8(255, 0, 128);
        assert_eq!(c.to_rgb_u8(), [255, 0, 128]);
    }

    #[test]
    fn test_color_u8_clamps_out_of_range() {
        let c = Color::new(1.5, -0.2, 0.5);
        assert_eq!(c.to_rgb_u8(), [255, 0, 128]);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
        assert_eq!(Color::lerp(Color::BLACK, Color::WHITE, 1.0), Color::WHITE);
    }

    #[test]
    fn test_axis_name() {
        assert_eq!(axis_name(1), "y");
        assert_eq!(axis_name(7), "?");
    }
}

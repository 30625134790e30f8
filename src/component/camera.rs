//! Camera 组件
//!
//! 围绕目标点旋转的轨道相机，查看器用它观察整个场景。
//! 左键拖动改变方位角/俯仰角，滚轮改变距离。

use crate::core::math::{Matrix4, Vector3};
use nalgebra::Point3;
use std::f32::consts::PI;

/// nalgebra 的透视矩阵把深度映射到 [-1, 1]，wgpu 需要 [0, 1]
#[rustfmt::skip]
fn opengl_to_wgpu() -> Matrix4 {
    Matrix4::new(
        1.0, 0.0, 0.0, 0.0,
        0.0, 1.0, 0.0, 0.0,
        0.0, 0.0, 0.5, 0.5,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// 轨道相机
#[derive(Debug, Clone)]
pub struct Camera {
    /// 注视点
    target: Vector3,

    /// 到注视点的距离
    distance: f32,

    /// 绕世界 Y 轴的方位角（弧度）
    yaw: f32,

    /// 俯仰角（弧度），限制在 (-π/2, π/2) 内
    pitch: f32,

    /// 垂直视场角（弧度）
    fov_y: f32,

    /// 宽高比
    aspect: f32,

    /// 近裁剪面距离
    near_z: f32,

    /// 远裁剪面距离
    far_z: f32,
}

impl Camera {
    const PITCH_LIMIT: f32 = 0.49 * PI;

    /// 创建注视给定包围球的相机
    ///
    /// 距离按视场角选取，使整个包围球落在视野内。
    pub fn framing(center: Vector3, radius: f32, aspect: f32) -> Self {
        let radius = radius.max(1e-3);
        let fov_y = 0.25 * PI;
        let distance = radius / (0.5 * fov_y).sin() * 1.1;

        Self {
            target: center,
            distance,
            yaw: 0.0,
            pitch: 0.0,
            fov_y,
            aspect,
            near_z: radius * 0.01,
            far_z: distance + radius * 10.0,
        }
    }

    // ========== 位置相关 ==========

    /// 相机位置
    pub fn position(&self) -> Vector3 {
        let offset = Vector3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target + offset * self.distance
    }

    pub fn target(&self) -> Vector3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// 设置宽高比
    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.aspect = aspect;
        }
    }

    // ========== 交互 ==========

    /// 旋转（弧度）
    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw = (self.yaw + delta_yaw) % (2.0 * PI);
        self.pitch = (self.pitch + delta_pitch).clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// 缩放距离，`factor < 1` 拉近
    pub fn zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            let min_distance = self.near_z * 2.0;
            self.distance = (self.distance * factor).clamp(min_distance, self.far_z * 0.5);
        }
    }

    // ========== 获取矩阵 ==========

    /// 视图矩阵（右手系）
    pub fn view_matrix(&self) -> Matrix4 {
        Matrix4::look_at_rh(
            &Point3::from(self.position()),
            &Point3::from(self.target),
            &Vector3::y(),
        )
    }

    /// 投影矩阵（深度范围 [0, 1]）
    pub fn proj_matrix(&self) -> Matrix4 {
        opengl_to_wgpu() * Matrix4::new_perspective(self.aspect, self.fov_y, self.near_z, self.far_z)
    }

    pub fn view_proj_matrix(&self) -> Matrix4 {
        self.proj_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector4;

    fn camera() -> Camera {
        Camera::framing(Vector3::new(1.0, 2.0, 3.0), 2.0, 1.5)
    }

    #[test]
    fn test_position_keeps_distance() {
        let mut cam = camera();
        cam.rotate(0.7, 0.3);
        let d = (cam.position() - cam.target()).norm();
        assert!((d - cam.distance()).abs() < 1e-4);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut cam = camera();
        cam.rotate(0.0, 10.0);
        assert!(cam.pitch() < 0.5 * PI);
        cam.rotate(0.0, -20.0);
        assert!(cam.pitch() > -0.5 * PI);
    }

    #[test]
    fn test_target_projects_to_screen_center() {
        let cam = camera();
        let t = cam.target();
        let clip = cam.view_proj_matrix() * Vector4::new(t.x, t.y, t.z, 1.0);
        let ndc = clip / clip.w;
        assert!(ndc.x.abs() < 1e-4);
        assert!(ndc.y.abs() < 1e-4);
        assert!(ndc.z > 0.0 && ndc.z < 1.0);
    }

    #[test]
    fn test_zoom_changes_distance() {
        let mut cam = camera();
        let before = cam.distance();
        cam.zoom(0.5);
        assert!(cam.distance() < before);
        cam.zoom(-1.0);
        assert!(cam.distance() < before);
    }
}

//! 场景组件模块
//!
//! 目前只有查看器使用的轨道相机。

mod camera;

pub use camera::Camera;

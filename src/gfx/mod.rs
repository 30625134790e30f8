//! 图形后端模块
//!
//! 封装底层图形 API。查看器使用 wgpu（支持 Vulkan、Metal、DX12、OpenGL）。

pub mod wgpu;

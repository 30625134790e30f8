//! mesh_pipeline - 网格处理演示管线
//!
//! 读入一个三角网格，依次完成采样、表面重建、体素化、加地面、高度裁剪和
//! 渐变着色，每一步都用一个交互窗口显示结果。
//!
//! # 模块结构
//!
//! - `core`: 基础模块（数学类型、日志、配置、错误处理）
//! - `geometry`: 几何数据结构与算法（网格、点云、体素、图元、OBJ/PLY 读写）
//! - `reconstruction`: 基于稀疏网格的屏蔽 Poisson 表面重建
//! - `pipeline`: 七个处理阶段及其报告
//! - `renderer`: 查看器（`Viewer::draw_geometries`）
//! - `gfx`: wgpu 设备与绘制
//! - `component`: 查看器相机
//!
//! # 使用示例
//!
//! ```no_run
//! use mesh_pipeline::geometry::loaders::load_mesh;
//! use mesh_pipeline::geometry::sampling::sample_points_uniformly;
//! use rand::SeedableRng;
//!
//! let mesh = load_mesh("cat_fixed.ply".as_ref())?;
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let pcd = sample_points_uniformly(&mesh, 20000, &mut rng)?;
//! println!("Number of points: {}", pcd.len());
//! # Ok::<(), mesh_pipeline::core::PipelineError>(())
//! ```

pub mod component;
pub mod core;
pub mod geometry;
pub mod gfx;
pub mod pipeline;
pub mod reconstruction;
pub mod renderer;

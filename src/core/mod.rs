//! 核心功能模块
//!
//! 本模块提供管线的基础功能，包括数学类型、日志系统、配置管理和错误处理。
//! 这些模块与几何算法和图形 API 无关。
//!
//! # 模块组织
//!
//! - `math`：数学类型（点、向量、矩阵、颜色）
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `config`：配置管理，支持从配置文件加载管线参数
//! - `error`：错误处理，定义统一的错误类型

pub mod math;
pub mod log;
pub mod config;
pub mod error;

// 重新导出常用类型，方便使用
pub use math::{Color, Matrix4, Point, Vector, Vector3};
pub use error::{Result, PipelineError};
pub use config::Config;

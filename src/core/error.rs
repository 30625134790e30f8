//! 错误处理模块
//!
//! 定义了管线中使用的统一错误类型。
//!
//! # 设计原则
//!
//! - 按来源划分子错误类型（配置、图形、网格加载、几何处理）
//! - 为每种错误类型提供清晰的上下文信息
//! - 支持错误链（error source）
//! - 任何错误都会终止管线，不做重试

use std::fmt;
use std::path::PathBuf;

/// 管线统一的 Result 类型
pub type Result<T> = std::result::Result<T, PipelineError>;

/// 管线的错误类型
#[derive(Debug)]
pub enum PipelineError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API / 窗口错误
    Graphics(GraphicsError),

    /// 网格读写错误
    MeshLoading(MeshLoadError),

    /// 几何处理错误
    Geometry(GeometryError),

    /// IO 错误
    Io(std::io::Error),

    /// 日志系统错误
    Log(String),

    /// 初始化错误
    Initialization(String),

    /// 运行时错误
    Runtime(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug)]
pub enum GraphicsError {
    /// 窗口或事件循环创建失败
    WindowCreation(String),

    /// 设备创建失败
    DeviceCreation(String),

    /// 交换链错误
    SwapchainError(String),
}

/// 网格读写相关的错误
#[derive(Debug)]
pub enum MeshLoadError {
    /// 文件不存在
    FileNotFound(PathBuf),

    /// 不支持的文件格式
    UnsupportedFormat(String),

    /// 解析失败
    ParseError(String),

    /// 数据验证失败
    ValidationError(String),

    /// 几何数据无效
    InvalidGeometry(String),

    /// 写出失败
    WriteError(String),
}

/// 几何处理相关的错误
#[derive(Debug, PartialEq)]
pub enum GeometryError {
    /// 输入几何体为空（无点、无面积等）
    EmptyGeometry(String),

    /// 需要法线但输入没有
    MissingNormals,

    /// 参数无效
    InvalidParameter { name: String, reason: String },

    /// 线性求解未收敛到有限值
    SolverDiverged(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(e) => write!(f, "Configuration error: {}", e),
            PipelineError::Graphics(e) => write!(f, "Graphics error: {}", e),
            PipelineError::MeshLoading(e) => write!(f, "Mesh I/O error: {}", e),
            PipelineError::Geometry(e) => write!(f, "Geometry error: {}", e),
            PipelineError::Io(e) => write!(f, "IO error: {}", e),
            PipelineError::Log(msg) => write!(f, "Log error: {}", msg),
            PipelineError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
            PipelineError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::WindowCreation(msg) => write!(f, "Window creation failed: {}", msg),
            GraphicsError::DeviceCreation(msg) => write!(f, "Device creation failed: {}", msg),
            GraphicsError::SwapchainError(msg) => write!(f, "Swapchain error: {}", msg),
        }
    }
}

impl fmt::Display for MeshLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshLoadError::FileNotFound(path) => write!(f, "Mesh file not found: {}", path.display()),
            MeshLoadError::UnsupportedFormat(msg) => write!(f, "Unsupported mesh format: {}", msg),
            MeshLoadError::ParseError(msg) => write!(f, "Failed to parse mesh: {}", msg),
            MeshLoadError::ValidationError(msg) => write!(f, "Mesh validation failed: {}", msg),
            MeshLoadError::InvalidGeometry(msg) => write!(f, "Invalid geometry data: {}", msg),
            MeshLoadError::WriteError(msg) => write!(f, "Failed to write mesh: {}", msg),
        }
    }
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::EmptyGeometry(what) => write!(f, "Empty geometry: {}", what),
            GeometryError::MissingNormals => write!(f, "Point cloud has no normals"),
            GeometryError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{}': {}", name, reason)
            }
            GeometryError::SolverDiverged(msg) => write!(f, "Solver diverged: {}", msg),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Io(e) => Some(e),
            PipelineError::Config(e) => Some(e),
            PipelineError::Graphics(e) => Some(e),
            PipelineError::MeshLoading(e) => Some(e),
            PipelineError::Geometry(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}
impl std::error::Error for MeshLoadError {}
impl std::error::Error for GeometryError {}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err)
    }
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Config(err)
    }
}

impl From<GraphicsError> for PipelineError {
    fn from(err: GraphicsError) -> Self {
        PipelineError::Graphics(err)
    }
}

impl From<MeshLoadError> for PipelineError {
    fn from(err: MeshLoadError) -> Self {
        PipelineError::MeshLoading(err)
    }
}

impl From<GeometryError> for PipelineError {
    fn from(err: GeometryError) -> Self {
        PipelineError::Geometry(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err: PipelineError = MeshLoadError::FileNotFound(PathBuf::from("cat.ply")).into();
        assert_eq!(err.to_string(), "Mesh I/O error: Mesh file not found: cat.ply");

        let err: PipelineError = GeometryError::InvalidParameter {
            name: "voxel_size".to_string(),
            reason: "must be positive".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Geometry error: Invalid parameter 'voxel_size': must be positive"
        );
    }

    #[test]
    fn test_source_chain() {
        use std::error::Error;

        let err: PipelineError = GeometryError::MissingNormals.into();
        assert!(err.source().is_some());

        let err = PipelineError::Runtime("boom".to_string());
        assert!(err.source().is_none());
    }
}

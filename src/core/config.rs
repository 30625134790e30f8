//! 配置管理模块
//!
//! 提供管线参数的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//! 所有字段都有默认值，不提供配置文件时管线使用内置常量运行。
//!
//! # 配置文件格式 (pipeline.toml)
//!
//! ```toml
//! [input]
//! mesh_path = "cat_fixed.ply"
//!
//! [sampling]
//! number_of_points = 20000
//! seed = 42
//!
//! [reconstruction]
//! depth = 9
//!
//! [voxel]
//! size = 0.05
//!
//! [clip]
//! axis = 1
//! threshold = -0.2
//!
//! [viewer]
//! enabled = true
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};

/// 取 `flag` 后面的参数值，flag 存在但没有值时报错
fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a String>> {
    match args.iter().position(|a| a == flag) {
        None => Ok(None),
        Some(idx) => match args.get(idx + 1) {
            Some(value) => Ok(Some(value)),
            None => Err(ConfigError::InvalidValue {
                field: flag.to_string(),
                reason: "missing value".to_string(),
            }
            .into()),
        },
    }
}

/// 管线配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub sampling: SamplingConfig,

    #[serde(default)]
    pub reconstruction: ReconstructionConfig,

    #[serde(default)]
    pub voxel: VoxelConfig,

    #[serde(default)]
    pub plane: PlaneConfig,

    #[serde(default)]
    pub clip: ClipConfig,

    #[serde(default)]
    pub gradient: GradientConfig,

    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub viewer: ViewerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 输入文件配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// 待处理的网格文件
    #[serde(default = "default_mesh_path")]
    pub mesh_path: String,
}

/// 表面采样配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// 目标点数（精确）
    #[serde(default = "default_number_of_points")]
    pub number_of_points: usize,

    /// 随机种子，保证多次运行结果一致
    #[serde(default = "default_seed")]
    pub seed: u64,
}

/// 表面重建配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconstructionConfig {
    /// 最大网格深度（分辨率 2^depth）
    #[serde(default = "default_depth")]
    pub depth: u32,

    /// 最小网格深度
    #[serde(default = "default_min_depth")]
    pub min_depth: u32,

    /// 细化一个单元所需的平均采样数
    #[serde(default = "default_samples_per_node")]
    pub samples_per_node: f64,

    /// 包围立方体相对点云包围盒的放大系数
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// 采样点周围保留的网格带宽（单元数）
    #[serde(default = "default_band")]
    pub band: u32,

    /// 采样点处隐函数取零的约束权重
    #[serde(default = "default_screening")]
    pub screening: f64,

    /// 共轭梯度最大迭代次数
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// 共轭梯度相对残差阈值
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// 按密度分位数裁剪低密度顶点（0 表示不裁剪）
    #[serde(default)]
    pub density_quantile: f64,
}

/// 体素化配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoxelConfig {
    /// 体素边长
    #[serde(default = "default_voxel_size")]
    pub size: f64,
}

/// 地面平面配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaneConfig {
    #[serde(default = "default_plane_width")]
    pub width: f64,

    #[serde(default = "default_plane_height")]
    pub height: f64,

    #[serde(default = "default_plane_depth")]
    pub depth: f64,

    /// 平移量
    #[serde(default = "default_plane_translation")]
    pub translation: [f64; 3],

    #[serde(default = "default_plane_color")]
    pub color: [f32; 3],
}

/// 高度裁剪配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipConfig {
    /// 裁剪轴（0 = x, 1 = y, 2 = z）
    #[serde(default = "default_clip_axis")]
    pub axis: usize,

    /// 保留坐标严格大于该值的点
    #[serde(default = "default_clip_threshold")]
    pub threshold: f64,

    #[serde(default = "default_clip_color")]
    pub color: [f32; 3],
}

/// 渐变着色与极值标记配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientConfig {
    /// 渐变轴（0 = x, 1 = y, 2 = z）
    #[serde(default = "default_gradient_axis")]
    pub axis: usize,

    /// 极值标记球半径
    #[serde(default = "default_marker_radius")]
    pub marker_radius: f64,

    /// 标记球经纬分辨率
    #[serde(default = "default_marker_resolution")]
    pub marker_resolution: u32,

    #[serde(default = "default_min_marker_color")]
    pub min_marker_color: [f32; 3],

    #[serde(default = "default_max_marker_color")]
    pub max_marker_color: [f32; 3],
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,
}

/// 查看器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// 关闭后每个阶段只打印结果，不打开窗口
    #[serde(default = "default_viewer_enabled")]
    pub enabled: bool,

    /// 背景颜色
    #[serde(default = "default_background")]
    pub background: [f32; 3],

    /// 垂直同步
    #[serde(default = "default_vsync")]
    pub vsync: bool,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_mesh_path() -> String { "cat_fixed.ply".to_string() }
fn default_number_of_points() -> usize { 20000 }
fn default_seed() -> u64 { 42 }
fn default_depth() -> u32 { 9 }
fn default_min_depth() -> u32 { 5 }
fn default_samples_per_node() -> f64 { 1.5 }
fn default_scale() -> f64 { 1.1 }
fn default_band() -> u32 { 2 }
fn default_screening() -> f64 { 4.0 }
fn default_max_iterations() -> usize { 400 }
fn default_tolerance() -> f64 { 1e-6 }
fn default_voxel_size() -> f64 { 0.05 }
fn default_plane_width() -> f64 { 30.0 }
fn default_plane_height() -> f64 { 1.0 }
fn default_plane_depth() -> f64 { 45.0 }
fn default_plane_translation() -> [f64; 3] { [-3.0, -0.5, -3.0] }
fn default_plane_color() -> [f32; 3] { [0.7, 0.7, 0.7] }
fn default_clip_axis() -> usize { 1 }
fn default_clip_threshold() -> f64 { -0.2 }
fn default_clip_color() -> [f32; 3] { [1.0, 0.6, 0.0] }
fn default_gradient_axis() -> usize { 2 }
fn default_marker_radius() -> f64 { 0.03 }
fn default_marker_resolution() -> u32 { 20 }
fn default_min_marker_color() -> [f32; 3] { [0.0, 1.0, 0.0] }
fn default_max_marker_color() -> [f32; 3] { [1.0, 0.0, 0.0] }
fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 800 }
fn default_viewer_enabled() -> bool { true }
fn default_background() -> [f32; 3] { [1.0, 1.0, 1.0] }
fn default_vsync() -> bool { true }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "mesh_pipeline.log".to_string() }

impl Default for InputConfig {
    fn default() -> Self {
        Self { mesh_path: default_mesh_path() }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            number_of_points: default_number_of_points(),
            seed: default_seed(),
        }
    }
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            min_depth: default_min_depth(),
            samples_per_node: default_samples_per_node(),
            scale: default_scale(),
            band: default_band(),
            screening: default_screening(),
            max_iterations: default_max_iterations(),
            tolerance: default_tolerance(),
            density_quantile: 0.0,
        }
    }
}

impl Default for VoxelConfig {
    fn default() -> Self {
        Self { size: default_voxel_size() }
    }
}

impl Default for PlaneConfig {
    fn default() -> Self {
        Self {
            width: default_plane_width(),
            height: default_plane_height(),
            depth: default_plane_depth(),
            translation: default_plane_translation(),
            color: default_plane_color(),
        }
    }
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            axis: default_clip_axis(),
            threshold: default_clip_threshold(),
            color: default_clip_color(),
        }
    }
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            axis: default_gradient_axis(),
            marker_radius: default_marker_radius(),
            marker_resolution: default_marker_resolution(),
            min_marker_color: default_min_marker_color(),
            max_marker_color: default_max_marker_color(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            enabled: default_viewer_enabled(),
            background: default_background(),
            vsync: default_vsync(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use mesh_pipeline::core::Config;
    ///
    /// let config = Config::from_file("pipeline.toml")?;
    /// # Ok::<(), mesh_pipeline::core::PipelineError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 按命令行参数加载配置并应用覆盖
    ///
    /// - 显式给出 `--config <path>` 时文件必须存在
    /// - 否则读取 `pipeline.toml`，文件不存在时使用默认配置
    /// - 文件存在但无法解析时总是报错
    pub fn load_from_args<I>(args: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        let explicit = args.iter().any(|a| a == "--config");
        let path = Self::config_path_from_args(&args);

        let mut config = if explicit || Path::new(&path).exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_args(&args)?;
        Ok(config)
    }

    /// 查找 `--config <path>` 参数，没有则返回默认路径
    pub fn config_path_from_args<I>(args: I) -> String
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();
        args.iter()
            .position(|a| a == "--config")
            .and_then(|idx| args.get(idx + 1).cloned())
            .unwrap_or_else(|| "pipeline.toml".to_string())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--headless`: 不打开查看器窗口
    /// - `--mesh <path>`: 输入网格文件
    /// - `--points <n>`: 采样点数
    /// - `--verbose`: 日志级别设为 debug
    ///
    /// `--mesh`/`--points` 缺少参数值或 `--points` 不是正整数时返回错误。
    pub fn apply_args<I>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if args.iter().any(|a| a == "--headless") {
            self.viewer.enabled = false;
        }

        if args.iter().any(|a| a == "--verbose") {
            self.logging.level = LogLevel::Debug;
        }

        if let Some(path) = flag_value(&args, "--mesh")? {
            self.input.mesh_path = path.clone();
        }

        if let Some(count) = flag_value(&args, "--points")? {
            self.sampling.number_of_points = count.parse().map_err(|_| ConfigError::InvalidValue {
                field: "--points".to_string(),
                reason: format!("expected a positive integer, got '{}'", count),
            })?;
        }

        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        fn invalid(field: &str, reason: &str) -> ConfigError {
            ConfigError::InvalidValue {
                field: field.to_string(),
                reason: reason.to_string(),
            }
        }

        if self.sampling.number_of_points == 0 {
            return Err(invalid("sampling.number_of_points", "must be greater than 0").into());
        }

        let r = &self.reconstruction;
        if !(1..=12).contains(&r.depth) {
            return Err(invalid("reconstruction.depth", "must be in 1..=12").into());
        }
        if r.min_depth == 0 || r.min_depth > r.depth {
            return Err(invalid("reconstruction.min_depth", "must be in 1..=depth").into());
        }
        if r.scale < 1.0 {
            return Err(invalid("reconstruction.scale", "must be at least 1.0").into());
        }
        if !(0.0..1.0).contains(&r.density_quantile) {
            return Err(invalid("reconstruction.density_quantile", "must be in [0, 1)").into());
        }

        if self.voxel.size <= 0.0 {
            return Err(invalid("voxel.size", "must be positive").into());
        }

        if self.clip.axis > 2 {
            return Err(invalid("clip.axis", "must be 0, 1 or 2").into());
        }
        if self.gradient.axis > 2 {
            return Err(invalid("gradient.axis", "must be 0, 1 or 2").into());
        }
        if self.gradient.marker_radius <= 0.0 {
            return Err(invalid("gradient.marker_radius", "must be positive").into());
        }
        if self.gradient.marker_resolution < 2 {
            return Err(invalid("gradient.marker_resolution", "must be at least 2").into());
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(invalid("window.width/height", "Window dimensions must be greater than 0").into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.input.mesh_path, "cat_fixed.ply");
        assert_eq!(config.sampling.number_of_points, 20000);
        assert_eq!(config.reconstruction.depth, 9);
        assert_eq!(config.voxel.size, 0.05);
        assert_eq!(config.clip.axis, 1);
        assert_eq!(config.clip.threshold, -0.2);
        assert_eq!(config.gradient.axis, 2);
        assert!(config.viewer.enabled);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.voxel.size = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.clip.axis = 3;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.reconstruction.depth = 13;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [sampling]
            number_of_points = 500

            [viewer]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.sampling.number_of_points, 500);
        assert_eq!(config.sampling.seed, 42);
        assert!(!config.viewer.enabled);
        assert_eq!(config.plane.translation, [-3.0, -0.5, -3.0]);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Config::from_toml_str("[sampling\nnumber_of_points = 1").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config
            .apply_args(["mesh_pipeline", "--headless", "--mesh", "bunny.obj", "--points", "123"])
            .unwrap();

        assert!(!config.viewer.enabled);
        assert_eq!(config.input.mesh_path, "bunny.obj");
        assert_eq!(config.sampling.number_of_points, 123);
    }

    #[test]
    fn test_bad_point_count_is_rejected() {
        let mut config = Config::default();
        let err = config.apply_args(["mesh_pipeline", "--points", "abc"]).unwrap_err();
        assert!(err.to_string().contains("--points"));
        assert_eq!(config.sampling.number_of_points, 20000);

        assert!(config.apply_args(["mesh_pipeline", "--points", "-5"]).is_err());
        assert!(config.apply_args(["mesh_pipeline", "--points"]).is_err());
    }

    #[test]
    fn test_explicit_missing_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        let args = ["mesh_pipeline", "--config", path.to_str().unwrap()];

        let err = Config::load_from_args(args).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_config_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[sampling\nnumber_of_points = 1").unwrap();
        let args = ["mesh_pipeline", "--config", path.to_str().unwrap()];

        assert!(Config::load_from_args(args).is_err());
    }

    #[test]
    fn test_config_file_then_args() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.toml");
        std::fs::write(&path, "[sampling]\nnumber_of_points = 500\n").unwrap();
        let args = ["mesh_pipeline", "--config", path.to_str().unwrap(), "--headless"];

        let config = Config::load_from_args(args).unwrap();
        assert_eq!(config.sampling.number_of_points, 500);
        assert!(!config.viewer.enabled);
    }

    #[test]
    fn test_config_path_from_args() {
        assert_eq!(Config::config_path_from_args(["bin"]), "pipeline.toml");
        assert_eq!(Config::config_path_from_args(["bin", "--config", "a.toml"]), "a.toml");
    }
}

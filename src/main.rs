//! mesh_pipeline - 网格处理演示
//!
//! # 使用方法
//!
//! ```bash
//! # 默认读取 cat_fixed.ply，每个阶段打开一个窗口
//! cargo run
//!
//! # 不打开窗口，只打印报告
//! cargo run -- --headless
//!
//! # 指定配置文件和输入网格
//! cargo run -- --config pipeline.toml --mesh model.obj
//! ```
//!
//! 每个窗口关闭后才会进入下一个阶段。

use mesh_pipeline::core::{log, Config, Result};
use mesh_pipeline::pipeline;
use mesh_pipeline::renderer::Viewer;
use tracing::{error, info};

/// 应用程序入口点
///
/// # 初始化流程
///
/// 1. 加载配置文件（默认 pipeline.toml，不存在时使用默认值；显式指定的文件必须存在）
/// 2. 应用命令行参数覆盖
/// 3. 验证配置，初始化日志系统
/// 4. 创建查看器并运行管线
///
/// # 命令行参数
///
/// - `--config <path>`: 配置文件路径
/// - `--mesh <path>`: 输入网格
/// - `--points <n>`: 采样点数
/// - `--headless`: 不打开窗口
/// - `--verbose`: 输出 debug 日志
fn main() {
    // 1. 加载配置并应用命令行参数（在初始化日志之前）
    let args: Vec<String> = std::env::args().collect();
    let config_path = Config::config_path_from_args(&args);
    let config = match Config::load_from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // 2. 验证配置
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    // 3. 初始化日志系统
    let log_file = if config.logging.file_output {
        Some(config.logging.log_file.as_str())
    } else {
        None
    };
    log::init_logger(config.logging.level, config.logging.file_output, log_file);
    info!(version = env!("CARGO_PKG_VERSION"), config = %config_path, "mesh_pipeline starting");

    // 4. 运行管线
    if let Err(e) = run(&config) {
        error!("Pipeline failed: {}", e);
        eprintln!("Pipeline failed: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &Config) -> Result<()> {
    let mut viewer = Viewer::new(config)?;
    pipeline::run(config, &mut viewer)
}

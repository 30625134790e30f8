//! 网格格式转换
//!
//! ```bash
//! # 默认把 12221_Cat_v1_l3.obj 转成 cat_fixed.ply
//! cargo run --bin convert_mesh
//!
//! cargo run --bin convert_mesh -- model.obj model.ply
//! ```
//!
//! OBJ 中的所有对象合并成一个网格后写出。

use std::path::{Path, PathBuf};

use anyhow::Context;
use mesh_pipeline::core::{config::LogLevel, log};
use mesh_pipeline::geometry::loaders::{load_mesh, save_mesh};
use tracing::{error, info};

const DEFAULT_INPUT: &str = "12221_Cat_v1_l3.obj";
const DEFAULT_OUTPUT: &str = "cat_fixed.ply";

fn main() {
    log::init_logger(LogLevel::Info, false, None);

    let mut args = std::env::args().skip(1);
    let input = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_INPUT.to_string()));
    let output = PathBuf::from(args.next().unwrap_or_else(|| DEFAULT_OUTPUT.to_string()));

    if let Err(e) = convert(&input, &output) {
        error!("Conversion failed: {:#}", e);
        eprintln!("Conversion failed: {:#}", e);
        std::process::exit(1);
    }
}

fn convert(input: &Path, output: &Path) -> anyhow::Result<()> {
    info!(input = %input.display(), output = %output.display(), "Converting mesh");

    let mesh = load_mesh(input).with_context(|| format!("failed to load {}", input.display()))?;

    println!("Vertices: {}", mesh.vertex_count());
    println!("Faces: {}", mesh.triangle_count());

    save_mesh(output, &mesh).with_context(|| format!("failed to write {}", output.display()))?;
    println!("File saved successfully: {}", output.display());

    Ok(())
}

//! 处理管线
//!
//! 按顺序执行七个阶段，每个阶段打印报告并打开一个查看窗口：
//!
//! ```text
//! 加载 -> 采样 -> 重建 -> 体素化 -> 地面 -> 裁剪 -> 渐变与极值
//! ```
//!
//! 阶段函数本身在 [`stages`] 中，不依赖窗口，可以单独测试。
//! 任何阶段失败都会中止整个管线。

pub mod stages;

use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::core::config::Config;
use crate::core::error::Result;
use crate::renderer::{Geometry, Viewer};
use crate::stage_span;

/// 依次执行全部阶段
pub fn run(config: &Config, viewer: &mut Viewer) -> Result<()> {
    info!(
        mesh = %config.input.mesh_path,
        points = config.sampling.number_of_points,
        depth = config.reconstruction.depth,
        viewer = viewer.is_enabled(),
        "Starting pipeline"
    );

    // 1. 加载
    let mesh = {
        let _span = stage_span!("load").entered();
        println!("=== 1. Loading and visualizing the model ===");

        let (mut mesh, report) = stages::load(Path::new(&config.input.mesh_path))?;
        viewer.draw_geometries(&[mesh.clone().into()], "Raw model")?;
        println!("{}", report);

        mesh.compute_vertex_normals();
        viewer.draw_geometries(&[mesh.clone().into()], "1. Source model")?;
        mesh
    };

    // 2. 采样
    let pcd = {
        let _span = stage_span!("sample").entered();
        println!("\n=== 2. Converting to a point cloud ===");

        let mut rng = StdRng::seed_from_u64(config.sampling.seed);
        let (pcd, report) = stages::sample(&mesh, config.sampling.number_of_points, &mut rng)?;
        println!("{}", report);

        viewer.draw_geometries(&[pcd.clone().into()], "2. Point cloud")?;
        pcd
    };

    // 3. 重建
    let mesh_crop = {
        let _span = stage_span!("reconstruct").entered();
        println!("\n=== 3. Surface reconstruction ===");

        let (mesh_crop, report) = stages::reconstruct(&pcd, &config.reconstruction)?;
        info!(depth = report.depth, "Reconstruction depth used");
        println!("{}", report);

        viewer.draw_geometries(&[mesh_crop.clone().into()], "3. Surface reconstruction")?;
        mesh_crop
    };

    // 4. 体素化
    {
        let _span = stage_span!("voxelize").entered();
        println!("\n=== 4. Voxelization ===");

        let (grid, report) = stages::voxelize(&pcd, config.voxel.size)?;
        println!("{}", report);

        viewer.draw_geometries(&[grid.into()], "4. Voxelization")?;
    }

    // 5. 地面
    {
        let _span = stage_span!("plane").entered();
        println!("\n=== 5. Adding a plane ===");

        let plane = stages::build_plane(&config.plane);
        let scene: [Geometry; 2] = [mesh_crop.into(), plane.into()];
        viewer.draw_geometries(&scene, "5. Object with plane")?;
    }

    // 6. 裁剪
    let clipped = {
        let _span = stage_span!("clip").entered();
        println!("\n=== 6. Clipping by the plane ===");

        let (clipped, report) = stages::clip(&pcd, &config.clip);
        println!("{}", report);

        viewer.draw_geometries(&[clipped.clone().into()], "6. After clipping")?;
        clipped
    };

    // 7. 渐变与极值
    {
        let _span = stage_span!("gradient").entered();
        println!("\n=== 7. Working with color and extrema ===");

        let (scene, report) = stages::color_and_mark(clipped, &config.gradient)?;
        println!("{}", report);

        let geometries: [Geometry; 3] = [
            scene.cloud.into(),
            scene.min_marker.into(),
            scene.max_marker.into(),
        ];
        viewer.draw_geometries(&geometries, "7. Color and extrema")?;
    }

    info!("Pipeline finished");
    Ok(())
}

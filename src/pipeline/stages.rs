//! 管线各阶段
//!
//! 每个阶段是一个普通函数：输入上一阶段的结果和配置，返回新几何体与一份报告。
//! 报告实现 `Display`，输出即控制台上打印的内容。

use std::fmt;
use std::path::Path;

use rand::Rng;

use crate::core::config::{ClipConfig, GradientConfig, PlaneConfig, ReconstructionConfig};
use crate::core::error::Result;
use crate::core::math::{axis_name, Color, Point, Vector};
use crate::geometry::color_map::axis_gradient_colors;
use crate::geometry::loaders::load_mesh;
use crate::geometry::primitives::{create_box, create_sphere};
use crate::geometry::sampling::sample_points_uniformly;
use crate::geometry::{PointCloud, TriangleMesh, VoxelGrid};
use crate::reconstruction::{create_from_point_cloud_poisson, PoissonParams};

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "True"
    } else {
        "False"
    }
}

fn fmt_point(p: &Point) -> String {
    format!("[{:.6} {:.6} {:.6}]", p.x, p.y, p.z)
}

// ========== 1. 加载 ==========

/// 网格加载报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub vertices: usize,
    pub triangles: usize,
    pub has_colors: bool,
    pub has_normals: bool,
}

impl LoadReport {
    pub fn of(mesh: &TriangleMesh) -> Self {
        Self {
            vertices: mesh.vertex_count(),
            triangles: mesh.triangle_count(),
            has_colors: mesh.has_vertex_colors(),
            has_normals: mesh.has_vertex_normals(),
        }
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vertices: {}", self.vertices)?;
        writeln!(f, "Triangles: {}", self.triangles)?;
        writeln!(f, "Has colors: {}", yes_no(self.has_colors))?;
        write!(f, "Has normals: {}", yes_no(self.has_normals))
    }
}

/// 读入网格，报告的是计算法线之前的状态
pub fn load(path: &Path) -> Result<(TriangleMesh, LoadReport)> {
    let mesh = load_mesh(path)?;
    let report = LoadReport::of(&mesh);
    Ok((mesh, report))
}

// ========== 2. 采样 ==========

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleReport {
    pub points: usize,
    pub has_colors: bool,
}

impl fmt::Display for SampleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of points: {}", self.points)?;
        write!(f, "Has colors: {}", yes_no(self.has_colors))
    }
}

pub fn sample<R: Rng + ?Sized>(
    mesh: &TriangleMesh,
    number_of_points: usize,
    rng: &mut R,
) -> Result<(PointCloud, SampleReport)> {
    let pcd = sample_points_uniformly(mesh, number_of_points, rng)?;
    let report = SampleReport {
        points: pcd.len(),
        has_colors: pcd.has_colors(),
    };
    Ok((pcd, report))
}

// ========== 3. 重建 ==========

#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructReport {
    pub vertices: usize,
    pub triangles: usize,
    pub has_colors: bool,
    /// 实际使用的网格深度
    pub depth: u32,
}

impl fmt::Display for ReconstructReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vertices: {}", self.vertices)?;
        writeln!(f, "Triangles: {}", self.triangles)?;
        write!(f, "Has colors: {}", yes_no(self.has_colors))
    }
}

/// Poisson 重建后裁剪到点云包围盒
pub fn reconstruct(pcd: &PointCloud, config: &ReconstructionConfig) -> Result<(TriangleMesh, ReconstructReport)> {
    let params = PoissonParams::from(config);
    let output = create_from_point_cloud_poisson(pcd, &params)?;
    tracing::debug!(
        vertices = output.mesh.vertex_count(),
        densities = output.densities.len(),
        "Reconstruction finished before cropping"
    );

    let bbox = pcd
        .axis_aligned_bounding_box()
        .ok_or_else(|| crate::core::error::GeometryError::EmptyGeometry("point cloud has no points".to_string()))?;
    let cropped = output.mesh.crop(&bbox);

    let report = ReconstructReport {
        vertices: cropped.vertex_count(),
        triangles: cropped.triangle_count(),
        has_colors: cropped.has_vertex_colors(),
        depth: output.depth,
    };
    Ok((cropped, report))
}

// ========== 4. 体素化 ==========

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoxelReport {
    pub voxels: usize,
}

impl fmt::Display for VoxelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Number of voxels: {}", self.voxels)
    }
}

pub fn voxelize(pcd: &PointCloud, voxel_size: f64) -> Result<(VoxelGrid, VoxelReport)> {
    let grid = VoxelGrid::create_from_point_cloud(pcd, voxel_size)?;
    let report = VoxelReport {
        voxels: grid.voxel_count(),
    };
    Ok((grid, report))
}

// ========== 5. 地面 ==========

/// 模型下方的地面长方体
pub fn build_plane(config: &PlaneConfig) -> TriangleMesh {
    let mut plane = create_box(config.width, config.height, config.depth);
    let [x, y, z] = config.translation;
    plane
        .translate(Vector::new(x, y, z))
        .paint_uniform_color(Color::from(config.color));
    plane
}

// ========== 6. 裁剪 ==========

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipReport {
    pub remaining: usize,
}

impl fmt::Display for ClipReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Remaining points: {}", self.remaining)
    }
}

/// 保留坐标大于阈值的点（只保留位置）并统一着色
///
/// 没有点留下时返回空点云，下一阶段会报错。
pub fn clip(pcd: &PointCloud, config: &ClipConfig) -> (PointCloud, ClipReport) {
    let mut clipped = pcd.filter_by_axis(config.axis, config.threshold);
    clipped.paint_uniform_color(Color::from(config.color));
    tracing::debug!(
        axis = axis_name(config.axis),
        threshold = config.threshold,
        kept = clipped.len(),
        dropped = pcd.len() - clipped.len(),
        "Clipped point cloud"
    );
    let report = ClipReport {
        remaining: clipped.len(),
    };
    (clipped, report)
}

// ========== 7. 渐变与极值 ==========

#[derive(Debug, Clone, PartialEq)]
pub struct ExtremaReport {
    pub axis: usize,
    pub min_point: Point,
    pub max_point: Point,
}

impl fmt::Display for ExtremaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = axis_name(self.axis).to_uppercase();
        writeln!(f, "Minimum along {}: {}", axis, fmt_point(&self.min_point))?;
        write!(f, "Maximum along {}: {}", axis, fmt_point(&self.max_point))
    }
}

/// 渐变着色的点云和两个极值标记球
pub struct GradientScene {
    pub cloud: PointCloud,
    pub min_marker: TriangleMesh,
    pub max_marker: TriangleMesh,
}

/// 按坐标渐变着色，并在最小/最大点放置标记球
pub fn color_and_mark(pcd: PointCloud, config: &GradientConfig) -> Result<(GradientScene, ExtremaReport)> {
    let extrema = pcd.axis_extrema(config.axis)?;
    let colors = axis_gradient_colors(&pcd, config.axis)?;

    let mut cloud = pcd;
    cloud.colors = colors;

    let min_point = cloud.points[extrema.min_index];
    let max_point = cloud.points[extrema.max_index];

    let marker = |at: &Point, color: [f32; 3]| {
        let mut sphere = create_sphere(config.marker_radius, config.marker_resolution);
        sphere
            .translate(at.coords)
            .paint_uniform_color(Color::from(color))
            .compute_vertex_normals();
        sphere
    };

    let scene = GradientScene {
        min_marker: marker(&min_point, config.min_marker_color),
        max_marker: marker(&max_point, config.max_marker_color),
        cloud,
    };
    let report = ExtremaReport {
        axis: config.axis,
        min_point,
        max_point,
    };
    Ok((scene, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::core::error::{GeometryError, PipelineError};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn cloud(points: &[[f64; 3]]) -> PointCloud {
        PointCloud::from_points(points.iter().map(|p| Point::new(p[0], p[1], p[2])).collect())
    }

    #[test]
    fn test_load_report_format() {
        let report = LoadReport {
            vertices: 8,
            triangles: 12,
            has_colors: false,
            has_normals: true,
        };
        assert_eq!(
            report.to_string(),
            "Vertices: 8\nTriangles: 12\nHas colors: False\nHas normals: True"
        );
    }

    #[test]
    fn test_sample_reports_exact_count() {
        let mesh = create_box(1.0, 1.0, 1.0);
        let mut rng = StdRng::seed_from_u64(5);
        let (pcd, report) = sample(&mesh, 321, &mut rng).unwrap();
        assert_eq!(report.points, 321);
        assert_eq!(pcd.len(), 321);
        assert!(!report.has_colors);
    }

    #[test]
    fn test_plane_placement_and_color() {
        let plane = build_plane(&Config::default().plane);
        let bbox = plane.axis_aligned_bounding_box().unwrap();

        assert_eq!(bbox.min, Point::new(-3.0, -0.5, -3.0));
        assert_eq!(bbox.max, Point::new(27.0, 0.5, 42.0));
        assert!(plane.vertex_colors.iter().all(|c| *c == Color::gray(0.7)));
    }

    #[test]
    fn test_clip_counts_points_above_threshold() {
        let mut pcd = cloud(&[[0.0, -1.0, 0.0], [0.0, -0.2, 1.0], [0.0, 0.5, 2.0], [1.0, 0.0, 3.0]]);
        pcd.paint_uniform_color(Color::WHITE);
        let (clipped, report) = clip(&pcd, &Config::default().clip);

        let expected = pcd.points.iter().filter(|p| p.y > -0.2).count();
        assert_eq!(report.remaining, expected);
        assert_eq!(report.remaining, 2);
        assert!(clipped.colors.iter().all(|c| *c == Color::new(1.0, 0.6, 0.0)));
        assert_eq!(report.to_string(), "Remaining points: 2");
    }

    #[test]
    fn test_extrema_and_markers() {
        let pcd = cloud(&[[0.0, 0.0, 0.5], [1.0, 0.0, -2.0], [2.0, 0.0, 3.0], [3.0, 0.0, 3.0]]);
        let config = Config::default().gradient;
        let (scene, report) = color_and_mark(pcd, &config).unwrap();

        assert_eq!(report.min_point, Point::new(1.0, 0.0, -2.0));
        // 相同最大值取第一次出现
        assert_eq!(report.max_point, Point::new(2.0, 0.0, 3.0));

        let center = scene.min_marker.axis_aligned_bounding_box().unwrap().center();
        assert!((center - report.min_point).norm() < 1e-9);
        assert!(scene.min_marker.vertex_colors.iter().all(|c| *c == Color::GREEN));
        assert!(scene.max_marker.vertex_colors.iter().all(|c| *c == Color::RED));

        assert_eq!(scene.cloud.colors[1], Color::new(0.0, 0.0, 1.0));
        assert_eq!(scene.cloud.colors[2], Color::new(1.0, 0.3, 0.0));
    }

    #[test]
    fn test_gradient_on_empty_cloud_is_error() {
        let err = color_and_mark(PointCloud::new(), &Config::default().gradient)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            PipelineError::Geometry(GeometryError::EmptyGeometry(_))
        ));
    }

    #[test]
    fn test_voxel_report() {
        let pcd = cloud(&[[0.0, 0.0, 0.0], [0.01, 0.0, 0.0], [1.0, 1.0, 1.0]]);
        let (_, report) = voxelize(&pcd, 0.05).unwrap();
        assert_eq!(report.to_string(), "Number of voxels: 2");
    }
}

//! 带屏蔽项的 Poisson 表面重建
//!
//! 输入带法线的点云，输出三角网格及每个顶点的采样密度。
//! 点云带颜色时，输出顶点颜色由周围采样的颜色加权插值得到。
//!
//! # 流程
//!
//! ```text
//! 点云 ──选择深度──→ GridFrame ──窄带──→ SparseGrid
//!     ──法线场──→ NormalField ──共轭梯度──→ χ ──Surface Nets──→ TriangleMesh
//! ```
//!
//! 网格深度按采样密度自适应：从 `depth` 开始逐级降低，直到平均每个被占据单元
//! 至少有 `samples_per_node` 个采样点（不低于 `min_depth`）。

pub mod field;
pub mod grid;
pub mod solver;
pub mod surface_nets;

use crate::core::config::ReconstructionConfig;
use crate::core::error::GeometryError;
use crate::core::math::Color;
use crate::geometry::{PointCloud, TriangleMesh};
use field::NormalField;
use grid::{GridFrame, SparseGrid};
use solver::{conjugate_gradient, ScreenedPoissonOperator};

/// 重建参数
#[derive(Debug, Clone, PartialEq)]
pub struct PoissonParams {
    pub depth: u32,
    pub min_depth: u32,
    pub samples_per_node: f64,
    pub scale: f64,
    pub band: u32,
    pub screening: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// 删除密度低于该分位数的顶点，0 表示不删除
    pub density_quantile: f64,
}

impl Default for PoissonParams {
    fn default() -> Self {
        Self::from(&ReconstructionConfig::default())
    }
}

impl From<&ReconstructionConfig> for PoissonParams {
    fn from(config: &ReconstructionConfig) -> Self {
        Self {
            depth: config.depth,
            min_depth: config.min_depth,
            samples_per_node: config.samples_per_node,
            scale: config.scale,
            band: config.band,
            screening: config.screening,
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            density_quantile: config.density_quantile,
        }
    }
}

impl PoissonParams {
    fn validate(&self) -> Result<(), GeometryError> {
        let invalid = |name: &str, reason: String| GeometryError::InvalidParameter {
            name: name.to_string(),
            reason,
        };

        if self.depth == 0 || self.depth > 12 {
            return Err(invalid("depth", format!("must be in 1..=12, got {}", self.depth)));
        }
        if !(self.scale >= 1.0) {
            return Err(invalid("scale", format!("must be at least 1.0, got {}", self.scale)));
        }
        if !(self.screening >= 0.0) {
            return Err(invalid("screening", format!("must be non-negative, got {}", self.screening)));
        }
        if !(0.0..1.0).contains(&self.density_quantile) {
            return Err(invalid(
                "density_quantile",
                format!("must be in [0, 1), got {}", self.density_quantile),
            ));
        }
        Ok(())
    }
}

/// 重建结果
#[derive(Debug, Clone)]
pub struct PoissonOutput {
    pub mesh: TriangleMesh,
    /// 每个顶点附近的采样密度，与 `mesh.vertices` 一一对应
    pub densities: Vec<f64>,
    /// 实际使用的网格深度
    pub depth: u32,
}

/// 选择实际使用的网格深度
pub fn effective_depth(pcd: &PointCloud, params: &PoissonParams) -> u32 {
    let Some(bbox) = pcd.axis_aligned_bounding_box() else {
        return params.min_depth.min(params.depth);
    };

    let floor = params.min_depth.min(params.depth);
    let mut depth = params.depth;
    while depth > floor {
        let frame = GridFrame::new(&bbox, params.scale, depth);
        let occupied = frame.occupied_cell_count(&pcd.points);
        if pcd.len() as f64 / occupied as f64 >= params.samples_per_node {
            break;
        }
        depth -= 1;
    }
    depth
}

/// 由带法线的点云重建三角网格
///
/// # 错误
///
/// - 点云为空：`EmptyGeometry`
/// - 点云没有法线：`MissingNormals`
/// - 参数越界：`InvalidParameter`
/// - 求解结果出现非有限值：`SolverDiverged`
pub fn create_from_point_cloud_poisson(
    pcd: &PointCloud,
    params: &PoissonParams,
) -> Result<PoissonOutput, GeometryError> {
    params.validate()?;

    let bbox = pcd
        .axis_aligned_bounding_box()
        .ok_or_else(|| GeometryError::EmptyGeometry("point cloud has no points".to_string()))?;
    if !pcd.has_normals() {
        return Err(GeometryError::MissingNormals);
    }

    let depth = effective_depth(pcd, params);
    if depth < params.depth {
        tracing::info!(
            requested = params.depth,
            used = depth,
            "Reduced reconstruction depth to match sampling density"
        );
    }

    let frame = GridFrame::new(&bbox, params.scale, depth);
    let grid = SparseGrid::build(frame, &pcd.points, params.band.max(1));
    tracing::debug!(nodes = grid.len(), cell_size = frame.cell_size, "Built sparse grid");

    let colors: &[Color] = if pcd.has_colors() { &pcd.colors } else { &[] };
    let field = NormalField::splat(&grid, &pcd.points, &pcd.normals, colors);
    let (edges, targets) = field.edge_targets(&grid);

    let samples: Vec<_> = pcd.points.iter().filter_map(|p| grid.stencil(p)).collect();
    // 屏蔽权重按节点数/采样数缩放，使其与分辨率无关
    let screening = params.screening * grid.len() as f64 / samples.len().max(1) as f64;
    let operator = ScreenedPoissonOperator::new(grid.len(), edges, samples, screening, 1e-8);
    let rhs = operator.right_hand_side(&targets);

    let mut chi = vec![0.0; grid.len()];
    let stats = conjugate_gradient(&operator, &rhs, &mut chi, params.max_iterations, params.tolerance);
    if stats.converged {
        tracing::debug!(
            iterations = stats.iterations,
            residual = stats.relative_residual,
            "Conjugate gradient converged"
        );
    } else {
        tracing::warn!(
            iterations = stats.iterations,
            residual = stats.relative_residual,
            "Conjugate gradient stopped before reaching tolerance"
        );
    }

    if chi.iter().any(|v| !v.is_finite()) {
        return Err(GeometryError::SolverDiverged(format!(
            "non-finite implicit function after {} iterations",
            stats.iterations
        )));
    }

    let iso = operator.mean_sample_value(&chi);
    let mut mesh = surface_nets::extract(&grid, &chi, iso);

    let mut densities: Vec<f64> = mesh
        .vertices
        .iter()
        .map(|v| grid.interpolate(&field.weights, v).unwrap_or(0.0))
        .collect();

    if field.has_colors() {
        let fallback = mean_color(&pcd.colors);
        mesh.vertex_colors = mesh
            .vertices
            .iter()
            .map(|v| field.color_at(&grid, v).unwrap_or(fallback))
            .collect();
    }

    if params.density_quantile > 0.0 && !densities.is_empty() {
        let threshold = quantile(&densities, params.density_quantile);
        let mask: Vec<bool> = densities.iter().map(|&d| d < threshold).collect();
        mesh.remove_vertices_by_mask(&mask);
        densities.retain(|&d| d >= threshold);
        tracing::debug!(threshold, remaining = mesh.vertex_count(), "Trimmed low-density vertices");
    }

    mesh.compute_vertex_normals();

    Ok(PoissonOutput {
        mesh,
        densities,
        depth,
    })
}

fn mean_color(colors: &[Color]) -> Color {
    let n = colors.len().max(1) as f32;
    let (r, g, b) = colors
        .iter()
        .fold((0.0, 0.0, 0.0), |(r, g, b), c| (r + c.r, g + c.g, b + c.b));
    Color::new(r / n, g / n, b / n)
}

/// 线性插值分位数
fn quantile(values: &[f64], q: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

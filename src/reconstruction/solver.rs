//! 隐函数求解
//!
//! 最小化
//!
//! ```text
//! Σ_edges (χj - χi - g_ij)² + α Σ_samples χ(p)² + ε Σ_nodes χ²
//! ```
//!
//! 其法方程是对称正定的稀疏线性系统，用 Jacobi 预条件共轭梯度求解，
//! 矩阵不显式存储。

/// 对称正定线性算子
pub trait LinearOperator {
    fn dim(&self) -> usize;

    /// y = A x
    fn apply(&self, x: &[f64], y: &mut [f64]);

    /// 对角元，用作 Jacobi 预条件
    fn diagonal(&self) -> Vec<f64>;
}

/// 带屏蔽项的网格 Poisson 算子
#[derive(Debug, Clone)]
pub struct ScreenedPoissonOperator {
    node_count: usize,
    /// (i, j)，j 是 i 在某坐标轴正方向上的邻居
    edges: Vec<(usize, usize)>,
    /// 每个采样点的三线性模板
    samples: Vec<([usize; 8], [f64; 8])>,
    screening: f64,
    regularization: f64,
}

impl ScreenedPoissonOperator {
    pub fn new(
        node_count: usize,
        edges: Vec<(usize, usize)>,
        samples: Vec<([usize; 8], [f64; 8])>,
        screening: f64,
        regularization: f64,
    ) -> Self {
        Self {
            node_count,
            edges,
            samples,
            screening,
            regularization,
        }
    }

    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// 右端项：每条边的目标差值 g 贡献到两端
    pub fn right_hand_side(&self, edge_targets: &[f64]) -> Vec<f64> {
        let mut b = vec![0.0; self.node_count];
        for (&(i, j), &g) in self.edges.iter().zip(edge_targets) {
            b[j] += g;
            b[i] -= g;
        }
        b
    }

    /// 采样点处隐函数值的平均，作为等值面的取值
    pub fn mean_sample_value(&self, x: &[f64]) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .samples
            .iter()
            .map(|(nodes, weights)| nodes.iter().zip(weights).map(|(&n, w)| x[n] * w).sum::<f64>())
            .sum();
        sum / self.samples.len() as f64
    }
}

impl LinearOperator for ScreenedPoissonOperator {
    fn dim(&self) -> usize {
        self.node_count
    }

    fn apply(&self, x: &[f64], y: &mut [f64]) {
        for (yi, xi) in y.iter_mut().zip(x) {
            *yi = self.regularization * xi;
        }

        for &(i, j) in &self.edges {
            let d = x[i] - x[j];
            y[i] += d;
            y[j] -= d;
        }

        for (nodes, weights) in &self.samples {
            let value: f64 = nodes.iter().zip(weights).map(|(&n, w)| x[n] * w).sum();
            let scaled = self.screening * value;
            for (&n, w) in nodes.iter().zip(weights) {
                y[n] += scaled * w;
            }
        }
    }

    fn diagonal(&self) -> Vec<f64> {
        let mut diag = vec![self.regularization; self.node_count];
        for &(i, j) in &self.edges {
            diag[i] += 1.0;
            diag[j] += 1.0;
        }
        for (nodes, weights) in &self.samples {
            for (&n, w) in nodes.iter().zip(weights) {
                diag[n] += self.screening * w * w;
            }
        }
        diag
    }
}

/// 共轭梯度结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveStats {
    pub iterations: usize,
    /// 最终相对残差 ‖r‖ / ‖b‖
    pub relative_residual: f64,
    pub converged: bool,
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Jacobi 预条件共轭梯度
///
/// `x` 是初值，求解结果原地写回。
pub fn conjugate_gradient<A: LinearOperator>(
    op: &A,
    b: &[f64],
    x: &mut [f64],
    max_iterations: usize,
    tolerance: f64,
) -> SolveStats {
    let n = op.dim();
    let b_norm = dot(b, b).sqrt();
    if b_norm == 0.0 {
        x.iter_mut().for_each(|v| *v = 0.0);
        return SolveStats {
            iterations: 0,
            relative_residual: 0.0,
            converged: true,
        };
    }

    let inv_diag: Vec<f64> = op
        .diagonal()
        .into_iter()
        .map(|d| if d > 0.0 { 1.0 / d } else { 1.0 })
        .collect();

    let mut r = vec![0.0; n];
    op.apply(x, &mut r);
    for (ri, bi) in r.iter_mut().zip(b) {
        *ri = bi - *ri;
    }

    let mut z: Vec<f64> = r.iter().zip(&inv_diag).map(|(ri, di)| ri * di).collect();
    let mut p = z.clone();
    let mut ap = vec![0.0; n];
    let mut rz = dot(&r, &z);
    let mut relative_residual = dot(&r, &r).sqrt() / b_norm;

    let mut iterations = 0;
    while iterations < max_iterations && relative_residual > tolerance {
        op.apply(&p, &mut ap);
        let pap = dot(&p, &ap);
        if pap <= 0.0 || !pap.is_finite() {
            break;
        }
        let alpha = rz / pap;

        for i in 0..n {
            x[i] += alpha * p[i];
            r[i] -= alpha * ap[i];
        }

        for i in 0..n {
            z[i] = r[i] * inv_diag[i];
        }
        let rz_next = dot(&r, &z);
        let beta = rz_next / rz;
        rz = rz_next;

        for i in 0..n {
            p[i] = z[i] + beta * p[i];
        }

        iterations += 1;
        relative_residual = dot(&r, &r).sqrt() / b_norm;
    }

    SolveStats {
        iterations,
        relative_residual,
        converged: relative_residual <= tolerance,
    }
}

//! 稀疏规则网格
//!
//! 包围立方体按 2^depth 划分，只保留采样点所在单元周围 `band` 个单元内的节点。
//! 节点按整数坐标排序存储，保证结果与插入顺序无关。

use std::collections::{HashMap, HashSet};

use crate::core::math::{Point, Vector};
use crate::geometry::AxisAlignedBoundingBox;

/// 节点整数坐标
pub type NodeKey = [i32; 3];

/// 单元 8 个角点相对最小角的偏移，顺序为 x 最快
pub const CORNER_OFFSETS: [[i32; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [0, 1, 0],
    [1, 1, 0],
    [0, 0, 1],
    [1, 0, 1],
    [0, 1, 1],
    [1, 1, 1],
];

/// 立方体的 12 条棱（角点编号对）
pub const CELL_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// 包围立方体及其在给定深度下的剖分
#[derive(Debug, Clone, Copy)]
pub struct GridFrame {
    pub origin: Point,
    pub cell_size: f64,
    /// 每个轴上的单元数
    pub resolution: i32,
}

impl GridFrame {
    /// 把点云包围盒扩成立方体并放大 `scale` 倍
    pub fn new(bbox: &AxisAlignedBoundingBox, scale: f64, depth: u32) -> Self {
        let resolution = 1i32 << depth;
        // 点云退化成一个点时仍需要非零尺寸
        let side = (bbox.max_extent() * scale).max(1e-9);
        let origin = bbox.center() - Vector::repeat(side * 0.5);
        Self {
            origin,
            cell_size: side / resolution as f64,
            resolution,
        }
    }

    /// 点所在单元（落在立方体外的点夹到边界单元）
    pub fn cell_of(&self, p: &Point) -> NodeKey {
        let local = (p - self.origin) / self.cell_size;
        let clamp = |v: f64| (v.floor() as i32).clamp(0, self.resolution - 1);
        [clamp(local.x), clamp(local.y), clamp(local.z)]
    }

    /// 点在所在单元内的局部坐标（0..=1）
    pub fn local_coords(&self, p: &Point, cell: NodeKey) -> Vector {
        let local = (p - self.origin) / self.cell_size;
        Vector::new(
            (local.x - cell[0] as f64).clamp(0.0, 1.0),
            (local.y - cell[1] as f64).clamp(0.0, 1.0),
            (local.z - cell[2] as f64).clamp(0.0, 1.0),
        )
    }

    pub fn node_position(&self, key: NodeKey) -> Point {
        self.origin + Vector::new(key[0] as f64, key[1] as f64, key[2] as f64) * self.cell_size
    }

    /// 被采样点占据的单元数
    pub fn occupied_cell_count(&self, points: &[Point]) -> usize {
        points.iter().map(|p| self.cell_of(p)).collect::<HashSet<_>>().len()
    }
}

/// 三线性插值权重，顺序与 `CORNER_OFFSETS` 一致
pub fn trilinear_weights(t: &Vector) -> [f64; 8] {
    let mut weights = [0.0; 8];
    for (k, offset) in CORNER_OFFSETS.iter().enumerate() {
        let wx = if offset[0] == 1 { t.x } else { 1.0 - t.x };
        let wy = if offset[1] == 1 { t.y } else { 1.0 - t.y };
        let wz = if offset[2] == 1 { t.z } else { 1.0 - t.z };
        weights[k] = wx * wy * wz;
    }
    weights
}

fn add(key: NodeKey, offset: [i32; 3]) -> NodeKey {
    [key[0] + offset[0], key[1] + offset[1], key[2] + offset[2]]
}

/// 采样点周围窄带内的节点集合
#[derive(Debug, Clone)]
pub struct SparseGrid {
    pub frame: GridFrame,
    keys: Vec<NodeKey>,
    index: HashMap<NodeKey, usize>,
}

impl SparseGrid {
    pub fn build(frame: GridFrame, points: &[Point], band: u32) -> Self {
        let band = band as i32;
        let occupied: HashSet<NodeKey> = points.iter().map(|p| frame.cell_of(p)).collect();

        let mut keys: HashSet<NodeKey> = HashSet::new();
        for cell in &occupied {
            for dz in -band..=band + 1 {
                for dy in -band..=band + 1 {
                    for dx in -band..=band + 1 {
                        let key = add(*cell, [dx, dy, dz]);
                        if key.iter().all(|&c| (0..=frame.resolution).contains(&c)) {
                            keys.insert(key);
                        }
                    }
                }
            }
        }

        let mut keys: Vec<NodeKey> = keys.into_iter().collect();
        // z 最慢、x 最快
        keys.sort_by_key(|k| [k[2], k[1], k[0]]);
        let index = keys.iter().enumerate().map(|(i, k)| (*k, i)).collect();

        Self { frame, keys, index }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[NodeKey] {
        &self.keys
    }

    pub fn index_of(&self, key: NodeKey) -> Option<usize> {
        self.index.get(&key).copied()
    }

    pub fn neighbor(&self, node: usize, offset: [i32; 3]) -> Option<usize> {
        self.index_of(add(self.keys[node], offset))
    }

    /// 单元 8 个角点的节点编号；任一角点不在窄带内时返回 `None`
    pub fn cell_corners(&self, cell: NodeKey) -> Option<[usize; 8]> {
        let mut corners = [0usize; 8];
        for (k, offset) in CORNER_OFFSETS.iter().enumerate() {
            corners[k] = self.index_of(add(cell, *offset))?;
        }
        Some(corners)
    }

    /// 点所在单元的角点编号及三线性权重
    pub fn stencil(&self, p: &Point) -> Option<([usize; 8], [f64; 8])> {
        let cell = self.frame.cell_of(p);
        let corners = self.cell_corners(cell)?;
        let weights = trilinear_weights(&self.frame.local_coords(p, cell));
        Some((corners, weights))
    }

    /// 在节点值上三线性插值
    pub fn interpolate(&self, values: &[f64], p: &Point) -> Option<f64> {
        let (corners, weights) = self.stencil(p)?;
        Some(corners.iter().zip(weights).map(|(&n, w)| values[n] * w).sum())
    }
}

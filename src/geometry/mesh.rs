/// 三角网格数据结构模块
///
/// 定义CPU侧的三角网格容器：顶点位置、三角形索引，以及可选的逐顶点法线和颜色。
/// 网格由文件加载、表面重建或图元生成创建，之后原地修改（计算法线、裁剪、着色）。

use super::bounding_box::AxisAlignedBoundingBox;
use super::normals::{compute_triangle_normals, compute_vertex_normals};
use crate::core::math::{Color, Point, Vector};

/// 三角网格
///
/// # 不变量
///
/// - 所有三角形索引都小于顶点数
/// - `vertex_normals` 为空或与 `vertices` 等长
/// - `vertex_colors` 为空或与 `vertices` 等长
///
/// # 示例
///
/// ```rust
/// use mesh_pipeline::geometry::TriangleMesh;
/// use mesh_pipeline::core::Point;
///
/// let mesh = TriangleMesh::from_parts(
///     vec![
///         Point::new(0.0, 0.0, 0.0),
///         Point::new(1.0, 0.0, 0.0),
///         Point::new(0.0, 0.0, 1.0),
///     ],
///     vec![[0, 2, 1]],
/// );
/// assert_eq!(mesh.triangle_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// 顶点位置
    pub vertices: Vec<Point>,

    /// 三角形顶点索引
    ///
    /// 使用32位索引以支持超过65535个顶点的模型。
    pub triangles: Vec<[u32; 3]>,

    /// 逐顶点法线（可为空）
    pub vertex_normals: Vec<Vector>,

    /// 逐顶点颜色（可为空）
    pub vertex_colors: Vec<Color>,

    /// 网格名称（可选）
    pub name: Option<String>,
}

impl TriangleMesh {
    /// 创建一个空网格
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建一个指定名称的空网格
    pub fn with_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// 由顶点和三角形直接构造（无法线、无颜色）
    pub fn from_parts(vertices: Vec<Point>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            vertices,
            triangles,
            ..Self::default()
        }
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn has_vertex_normals(&self) -> bool {
        !self.vertices.is_empty() && self.vertex_normals.len() == self.vertices.len()
    }

    pub fn has_vertex_colors(&self) -> bool {
        !self.vertices.is_empty() && self.vertex_colors.len() == self.vertices.len()
    }

    /// 计算逐顶点法线（面积加权）
    pub fn compute_vertex_normals(&mut self) -> &mut Self {
        self.vertex_normals = compute_vertex_normals(&self.vertices, &self.triangles);
        self
    }

    /// 逐三角形单位法线
    pub fn triangle_normals(&self) -> Vec<Vector> {
        compute_triangle_normals(&self.vertices, &self.triangles)
    }

    /// 所有顶点涂成同一颜色
    pub fn paint_uniform_color(&mut self, color: Color) -> &mut Self {
        self.vertex_colors = vec![color; self.vertices.len()];
        self
    }

    /// 平移所有顶点
    pub fn translate(&mut self, offset: Vector) -> &mut Self {
        for v in &mut self.vertices {
            *v += offset;
        }
        self
    }

    /// 顶点包围盒，空网格返回 `None`
    pub fn axis_aligned_bounding_box(&self) -> Option<AxisAlignedBoundingBox> {
        AxisAlignedBoundingBox::from_points(&self.vertices)
    }

    /// 三角形面积
    pub fn triangle_area(&self, triangle: &[u32; 3]) -> f64 {
        let a = self.vertices[triangle[0] as usize];
        let b = self.vertices[triangle[1] as usize];
        let c = self.vertices[triangle[2] as usize];
        0.5 * (b - a).cross(&(c - a)).norm()
    }

    /// 总表面积
    pub fn surface_area(&self) -> f64 {
        self.triangles.iter().map(|t| self.triangle_area(t)).sum()
    }

    /// 裁剪到包围盒
    ///
    /// 保留落在包围盒内（含边界）的顶点，以及三个顶点都被保留的三角形，
    /// 然后重新编号并删除不再被引用的顶点。
    pub fn crop(&self, bbox: &AxisAlignedBoundingBox) -> TriangleMesh {
        let keep: Vec<bool> = self.vertices.iter().map(|v| bbox.contains(v)).collect();
        let mut cropped = self.select_vertices(&keep);
        cropped.remove_unreferenced_vertices();
        cropped
    }

    /// 按掩码删除顶点（`mask[i] == true` 表示删除），同时删除引用它们的三角形
    pub fn remove_vertices_by_mask(&mut self, mask: &[bool]) {
        let keep: Vec<bool> = mask.iter().map(|&remove| !remove).collect();
        *self = self.select_vertices(&keep);
    }

    /// 删除没有被任何三角形引用的顶点
    pub fn remove_unreferenced_vertices(&mut self) {
        let mut referenced = vec![false; self.vertices.len()];
        for tri in &self.triangles {
            for &i in tri {
                referenced[i as usize] = true;
            }
        }
        if referenced.iter().all(|&r| r) {
            return;
        }
        *self = self.select_vertices(&referenced);
    }

    /// 保留 `keep[i] == true` 的顶点以及完全由它们组成的三角形
    fn select_vertices(&self, keep: &[bool]) -> TriangleMesh {
        let mut remap = vec![u32::MAX; self.vertices.len()];
        let mut result = TriangleMesh {
            name: self.name.clone(),
            ..TriangleMesh::default()
        };

        let has_normals = self.has_vertex_normals();
        let has_colors = self.has_vertex_colors();

        for (i, v) in self.vertices.iter().enumerate() {
            if !keep[i] {
                continue;
            }
            remap[i] = result.vertices.len() as u32;
            result.vertices.push(*v);
            if has_normals {
                result.vertex_normals.push(self.vertex_normals[i]);
            }
            if has_colors {
                result.vertex_colors.push(self.vertex_colors[i]);
            }
        }

        result.triangles = self
            .triangles
            .iter()
            .filter_map(|tri| {
                let mapped = [
                    remap[tri[0] as usize],
                    remap[tri[1] as usize],
                    remap[tri[2] as usize],
                ];
                mapped.iter().all(|&i| i != u32::MAX).then_some(mapped)
            })
            .collect();

        result
    }

    /// 合并另一个网格（索引偏移）
    ///
    /// 只有两个网格都带法线（或颜色）时结果才保留该属性。
    pub fn merge(&mut self, other: &TriangleMesh) {
        let keep_normals = (self.is_empty() || self.has_vertex_normals()) && other.has_vertex_normals();
        let keep_colors = (self.is_empty() || self.has_vertex_colors()) && other.has_vertex_colors();

        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.triangles.extend(
            other.triangles.iter().map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
        );

        if keep_normals {
            self.vertex_normals.extend_from_slice(&other.vertex_normals);
        } else {
            self.vertex_normals.clear();
        }
        if keep_colors {
            self.vertex_colors.extend_from_slice(&other.vertex_colors);
        } else {
            self.vertex_colors.clear();
        }
    }

    /// 验证网格数据的有效性
    ///
    /// 检查：
    /// - 所有索引都在有效范围内
    /// - 法线/颜色数组为空或与顶点等长
    /// - 顶点坐标都是有限值
    pub fn validate(&self) -> Result<(), String> {
        let vertex_count = self.vertices.len() as u32;
        for (i, tri) in self.triangles.iter().enumerate() {
            if let Some(&bad) = tri.iter().find(|&&idx| idx >= vertex_count) {
                return Err(format!(
                    "Triangle {} references vertex {} but the mesh has {} vertices",
                    i, bad, vertex_count
                ));
            }
        }

        if !self.vertex_normals.is_empty() && self.vertex_normals.len() != self.vertices.len() {
            return Err(format!(
                "Normal count {} does not match vertex count {}",
                self.vertex_normals.len(),
                self.vertices.len()
            ));
        }

        if !self.vertex_colors.is_empty() && self.vertex_colors.len() != self.vertices.len() {
            return Err(format!(
                "Color count {} does not match vertex count {}",
                self.vertex_colors.len(),
                self.vertices.len()
            ));
        }

        if let Some(i) = self.vertices.iter().position(|v| !v.coords.iter().all(|c| c.is_finite())) {
            return Err(format!("Vertex {} has a non-finite coordinate", i));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        // 两个三角形组成 XZ 平面上的单位正方形
        TriangleMesh::from_parts(
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 1.0),
                Point::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 2, 1], [0, 3, 2]],
        )
    }

    #[test]
    fn test_mesh_creation() {
        let mesh = TriangleMesh::new();

        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert!(!mesh.has_vertex_normals());
        assert!(!mesh.has_vertex_colors());
        assert!(mesh.name.is_none());
    }

    #[test]
    fn test_mesh_with_name() {
        let mesh = TriangleMesh::with_name("Cat");
        assert_eq!(mesh.name, Some("Cat".to_string()));
    }

    #[test]
    fn test_counts_and_area() {
        let mesh = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!((mesh.surface_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_compute_vertex_normals_sets_flag() {
        let mut mesh = quad();
        mesh.compute_vertex_normals();
        assert!(mesh.has_vertex_normals());
        for n in &mesh.vertex_normals {
            assert!((n.norm() - 1.0).abs() < 1e-9);
            assert!(n.y.abs() > 0.99);
        }
    }

    #[test]
    fn test_paint_and_translate() {
        let mut mesh = quad();
        mesh.paint_uniform_color(Color::new(0.7, 0.7, 0.7))
            .translate(Vector::new(-3.0, -0.5, -3.0));

        assert!(mesh.has_vertex_colors());
        assert_eq!(mesh.vertices[0], Point::new(-3.0, -0.5, -3.0));
        assert_eq!(mesh.vertices[2], Point::new(-2.0, -0.5, -2.0));
    }

    #[test]
    fn test_crop_keeps_vertices_inside() {
        let mut mesh = quad();
        mesh.compute_vertex_normals();
        let bbox = AxisAlignedBoundingBox::new(Point::new(-0.5, -1.0, -0.5), Point::new(1.5, 1.0, 0.9));

        let cropped = mesh.crop(&bbox);

        // z=1 的顶点 2、3 在盒外，两个三角形都引用了其中之一
        assert_eq!(cropped.triangle_count(), 0);
        assert_eq!(cropped.vertex_count(), 0);

        let bbox = AxisAlignedBoundingBox::new(Point::new(-0.5, -1.0, -0.5), Point::new(1.5, 1.0, 1.5));
        let cropped = mesh.crop(&bbox);
        assert_eq!(cropped.triangle_count(), 2);
        assert!(cropped.has_vertex_normals());
        assert!(cropped.vertices.iter().all(|v| bbox.contains(v)));
        assert!(cropped.validate().is_ok());
    }

    #[test]
    fn test_crop_partial() {
        let mesh = TriangleMesh::from_parts(
            vec![
                Point::new(0.0, 0.0, 0.0),
                Point::new(1.0, 0.0, 0.0),
                Point::new(0.0, 1.0, 0.0),
                Point::new(5.0, 5.0, 0.0),
            ],
            vec![[0, 1, 2], [1, 3, 2]],
        );
        let bbox = AxisAlignedBoundingBox::new(Point::new(0.0, 0.0, 0.0), Point::new(1.0, 1.0, 0.0));

        let cropped = mesh.crop(&bbox);
        assert_eq!(cropped.vertex_count(), 3);
        assert_eq!(cropped.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_remove_vertices_by_mask() {
        let mut mesh = quad();
        mesh.remove_vertices_by_mask(&[false, false, false, true]);

        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangles, vec![[0, 2, 1]]);
    }

    #[test]
    fn test_remove_unreferenced_vertices() {
        let mut mesh = quad();
        mesh.vertices.push(Point::new(9.0, 9.0, 9.0));
        mesh.remove_unreferenced_vertices();
        assert_eq!(mesh.vertex_count(), 4);
        assert!(mesh.vertices.iter().all(|v| v.x <= 1.0));
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut a = quad();
        let b = quad();
        a.merge(&b);

        assert_eq!(a.vertex_count(), 8);
        assert_eq!(a.triangle_count(), 4);
        assert_eq!(a.triangles[2], [4, 6, 5]);
        assert!(a.validate().is_ok());
    }

    #[test]
    fn test_validation_invalid_index_range() {
        let mut mesh = quad();
        mesh.triangles.push([0, 1, 7]);

        let result = mesh.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("references vertex 7"));
    }

    #[test]
    fn test_validation_attribute_length() {
        let mut mesh = quad();
        mesh.vertex_colors.push(Color::WHITE);
        assert!(mesh.validate().is_err());
    }
}

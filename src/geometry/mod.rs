/// 几何数据与几何处理模块
///
/// 包含 CPU 侧的几何数据结构（三角网格、点云、体素网格、包围盒）
/// 以及作用于它们的算法（法线、表面采样、基本体生成、颜色渐变、文件读写）。
///
/// # 模块结构
///
/// - `mesh`: 三角网格及其编辑操作（平移、裁剪、合并）
/// - `point_cloud`: 点云、按坐标过滤、极值查询
/// - `voxel_grid`: 由点云构建的稀疏体素网格
/// - `bounding_box`: 轴对齐包围盒
/// - `normals`: 面积加权的顶点法线计算
/// - `sampling`: 网格表面均匀采样
/// - `primitives`: 长方体和球体
/// - `color_map`: 按坐标的颜色渐变
/// - `loaders`: OBJ/PLY 读写
///
/// # 数据流
///
/// ```text
/// 文件 (OBJ/PLY)
///     ↓
/// Loader (ObjLoader/PlyLoader)
///     ↓
/// TriangleMesh ──采样──→ PointCloud ──体素化──→ VoxelGrid
///     ↓
/// Viewer (上传到GPU)
/// ```
///
/// # 使用示例
///
/// ```rust,no_run
/// use mesh_pipeline::geometry::loaders::{MeshLoader, ObjLoader};
/// use std::path::Path;
///
/// let mut mesh = ObjLoader::load_from_file(Path::new("model.obj"))?;
/// mesh.compute_vertex_normals();
///
/// println!("顶点数: {}", mesh.vertex_count());
/// println!("三角形数: {}", mesh.triangle_count());
///
/// # Ok::<(), mesh_pipeline::core::PipelineError>(())
/// ```

pub mod bounding_box;
pub mod color_map;
pub mod loaders;
pub mod mesh;
pub mod normals;
pub mod point_cloud;
pub mod primitives;
pub mod sampling;
pub mod voxel_grid;

// 重新导出常用类型
pub use bounding_box::AxisAlignedBoundingBox;
pub use mesh::TriangleMesh;
pub use point_cloud::{AxisExtrema, PointCloud};
pub use voxel_grid::{Voxel, VoxelGrid};

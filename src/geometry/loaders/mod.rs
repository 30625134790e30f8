/// 网格读写模块
///
/// 提供统一的加载/导出接口和各种格式的具体实现。
///
/// # 支持的格式
///
/// - **OBJ**: Wavefront OBJ 格式（读取使用 tobj crate）
/// - **PLY**: Stanford PLY 格式（使用 ply-rs-bw crate，读取 ascii/二进制）
///
/// # 使用示例
///
/// ```rust,no_run
/// use mesh_pipeline::geometry::loaders::{load_mesh, save_mesh};
/// use std::path::Path;
///
/// let mesh = load_mesh(Path::new("model.obj"))?;
/// save_mesh(Path::new("model.ply"), &mesh)?;
/// # Ok::<(), mesh_pipeline::core::PipelineError>(())
/// ```
use crate::core::error::{MeshLoadError, PipelineError, Result};
use crate::geometry::mesh::TriangleMesh;
use std::io::Write;
use std::path::Path;

pub mod obj_loader;
pub mod ply_loader;

// 重新导出加载器
pub use obj_loader::ObjLoader;
pub use ply_loader::PlyLoader;

/// 网格加载器 trait
///
/// 所有格式的加载器都实现此 trait。
///
/// # 实现要求
///
/// - 加载器是无状态的（使用关联函数）
/// - 返回 CPU 侧的 `TriangleMesh`，不涉及 GPU 资源
/// - 返回前调用 `TriangleMesh::validate`，索引越界报 `InvalidGeometry`
pub trait MeshLoader {
    /// 从文件路径加载网格
    ///
    /// # 错误
    ///
    /// - 文件不存在或无法读取
    /// - 文件格式错误或损坏
    /// - 数据验证失败
    fn load_from_file(path: &Path) -> Result<TriangleMesh>;

    /// 从内存数据加载网格
    fn load_from_memory(data: &[u8]) -> Result<TriangleMesh>;

    /// 获取支持的文件扩展名列表（小写，不含点号）
    fn supported_extensions() -> &'static [&'static str];
}

/// 网格导出器 trait
pub trait MeshExporter {
    /// 写出到任意输出流
    fn write_to<W: Write>(mesh: &TriangleMesh, writer: &mut W) -> Result<()>;

    /// 写出到文件
    fn save_to_file(path: &Path, mesh: &TriangleMesh) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = std::io::BufWriter::new(file);
        Self::write_to(mesh, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// 小写文件扩展名
fn extension_of(path: &Path) -> Result<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .ok_or_else(|| {
            MeshLoadError::UnsupportedFormat(format!(
                "cannot determine file extension of {}",
                path.display()
            ))
            .into()
        })
}

/// 根据文件扩展名选择合适的加载器
pub fn load_mesh(path: &Path) -> Result<TriangleMesh> {
    let extension = extension_of(path)?;

    match extension.as_str() {
        "obj" => ObjLoader::load_from_file(path),
        "ply" => PlyLoader::load_from_file(path),
        _ => Err(PipelineError::MeshLoading(MeshLoadError::UnsupportedFormat(
            format!(".{}", extension),
        ))),
    }
}

/// 根据文件扩展名选择合适的导出器
pub fn save_mesh(path: &Path, mesh: &TriangleMesh) -> Result<()> {
    let extension = extension_of(path)?;

    match extension.as_str() {
        "obj" => ObjLoader::save_to_file(path, mesh),
        "ply" => PlyLoader::save_to_file(path, mesh),
        _ => Err(PipelineError::MeshLoading(MeshLoadError::UnsupportedFormat(
            format!(".{}", extension),
        ))),
    }
}

/// 加载后的统一校验
pub(crate) fn validated(mesh: TriangleMesh) -> Result<TriangleMesh> {
    mesh.validate().map_err(MeshLoadError::InvalidGeometry)?;
    Ok(mesh)
}

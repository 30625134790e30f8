/// OBJ 文件读写
///
/// 读取使用 tobj crate：自动三角化，位置按文件中的顺序编号，
/// 多个对象合并为一个网格。写出为纯文本 `v`/`vn`/`f` 行。
use super::{validated, MeshExporter, MeshLoader};
use crate::core::error::{MeshLoadError, Result};
use crate::core::math::{Color, Point, Vector};
use crate::geometry::mesh::TriangleMesh;
use std::io::{BufReader, Write};
use std::path::Path;

/// OBJ 格式读写器
///
/// # 特性
///
/// - 使用 tobj 解析，多边形面自动三角化
/// - 顶点数等于文件中 `v` 行的数量（不按 UV/法线拆分顶点）
/// - 文件为每个位置提供法线时保留法线
/// - 支持 `v x y z r g b` 形式的顶点颜色
///
/// # 使用示例
///
/// ```rust,no_run
/// use mesh_pipeline::geometry::loaders::{MeshLoader, ObjLoader};
/// use std::path::Path;
///
/// let mesh = ObjLoader::load_from_file(Path::new("model.obj"))?;
/// println!("loaded {} vertices", mesh.vertex_count());
/// # Ok::<(), mesh_pipeline::core::PipelineError>(())
/// ```
pub struct ObjLoader;

impl ObjLoader {
    fn load_options() -> tobj::LoadOptions {
        tobj::LoadOptions {
            triangulate: true,
            single_index: false,
            ignore_points: true,
            ignore_lines: true,
        }
    }

    /// 单个 tobj 模型转换成网格，索引相对于该模型自身的位置
    fn model_to_mesh(model: &tobj::Model) -> Result<TriangleMesh> {
        let src = &model.mesh;

        if src.positions.len() % 3 != 0 {
            return Err(MeshLoadError::InvalidGeometry(format!(
                "incomplete position data: {} floats",
                src.positions.len()
            ))
            .into());
        }
        if src.indices.len() % 3 != 0 {
            return Err(MeshLoadError::InvalidGeometry(format!(
                "index count {} is not a multiple of 3 after triangulation",
                src.indices.len()
            ))
            .into());
        }

        let vertex_count = src.positions.len() / 3;
        let mut part = TriangleMesh::with_name(model.name.clone());

        part.vertices = src
            .positions
            .chunks_exact(3)
            .map(|p| Point::new(p[0] as f64, p[1] as f64, p[2] as f64))
            .collect();

        // 法线只有在与位置一一对应时才能作为顶点法线
        let normals_per_position = src.normals.len() == src.positions.len()
            && (src.normal_indices.is_empty() || src.normal_indices == src.indices);
        if normals_per_position {
            part.vertex_normals = src
                .normals
                .chunks_exact(3)
                .map(|n| Vector::new(n[0] as f64, n[1] as f64, n[2] as f64))
                .collect();
        }

        if src.vertex_color.len() == src.positions.len() {
            part.vertex_colors = src
                .vertex_color
                .chunks_exact(3)
                .map(|c| Color::new(c[0], c[1], c[2]))
                .collect();
        }

        for tri in src.indices.chunks_exact(3) {
            if tri.iter().any(|&i| i as usize >= vertex_count) {
                return Err(MeshLoadError::InvalidGeometry(format!(
                    "face {:?} references a missing vertex in object '{}'",
                    tri, model.name
                ))
                .into());
            }
            part.triangles.push([tri[0], tri[1], tri[2]]);
        }

        Ok(part)
    }

    /// 把 tobj 的模型列表合并成一个网格
    ///
    /// 法线和颜色只有在每个模型都提供时才保留。
    fn merge_models(models: &[tobj::Model], name: &str) -> Result<TriangleMesh> {
        if models.is_empty() {
            return Err(MeshLoadError::ValidationError("OBJ file contains no geometry".to_string()).into());
        }

        let mut mesh = TriangleMesh::with_name(name);
        for model in models {
            mesh.merge(&Self::model_to_mesh(model)?);
        }

        tracing::debug!(
            objects = models.len(),
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "Merged OBJ objects"
        );

        validated(mesh)
    }
}

impl MeshLoader for ObjLoader {
    fn load_from_file(path: &Path) -> Result<TriangleMesh> {
        if !path.exists() {
            return Err(MeshLoadError::FileNotFound(path.to_path_buf()).into());
        }

        // 材质文件缺失不影响几何数据
        let (models, _materials) = tobj::load_obj(path, &Self::load_options())
            .map_err(|e| MeshLoadError::ParseError(format!("tobj: {}", e)))?;

        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Unnamed");
        let mesh = Self::merge_models(&models, name)?;

        tracing::info!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "Loaded OBJ file"
        );

        Ok(mesh)
    }

    fn load_from_memory(data: &[u8]) -> Result<TriangleMesh> {
        let mut reader = BufReader::new(data);
        let (models, _materials) = tobj::load_obj_buf(&mut reader, &Self::load_options(), |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })
        .map_err(|e| MeshLoadError::ParseError(format!("tobj: {}", e)))?;

        Self::merge_models(&models, "Unnamed")
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["obj"]
    }
}

impl MeshExporter for ObjLoader {
    fn write_to<W: Write>(mesh: &TriangleMesh, writer: &mut W) -> Result<()> {
        let has_normals = mesh.has_vertex_normals();
        let has_colors = mesh.has_vertex_colors();

        writeln!(writer, "# mesh_pipeline OBJ export")?;
        writeln!(
            writer,
            "# {} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.triangle_count()
        )?;
        if let Some(name) = &mesh.name {
            writeln!(writer, "o {}", name)?;
        }

        for (i, v) in mesh.vertices.iter().enumerate() {
            if has_colors {
                let c = mesh.vertex_colors[i];
                writeln!(writer, "v {} {} {} {} {} {}", v.x, v.y, v.z, c.r, c.g, c.b)?;
            } else {
                writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
            }
        }

        if has_normals {
            for n in &mesh.vertex_normals {
                writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
            }
        }

        for tri in &mesh.triangles {
            let [a, b, c] = tri.map(|i| i + 1);
            if has_normals {
                writeln!(writer, "f {a}//{a} {b}//{b} {c}//{c}")?;
            } else {
                writeln!(writer, "f {a} {b} {c}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_OBJ: &str = "\
# unit square split by the loader
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";

    #[test]
    fn test_supported_extensions() {
        assert_eq!(ObjLoader::supported_extensions(), &["obj"]);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ObjLoader::load_from_file(Path::new("nonexistent.obj"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_memory_triangulates() {
        let mesh = ObjLoader::load_from_memory(QUAD_OBJ.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(!mesh.has_vertex_normals());
        assert!(!mesh.has_vertex_colors());
    }

    #[test]
    fn test_multiple_objects_are_merged() {
        let src = "\
o first
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
o second
v 0 0 1
v 1 0 1
v 0 1 1
f 4 5 6
";
        let mesh = ObjLoader::load_from_memory(src.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 6);
        assert_eq!(mesh.triangle_count(), 2);
        assert!(mesh.validate().is_ok());
        assert_eq!(mesh.vertices[mesh.triangles[1][0] as usize].z, 1.0);
    }

    #[test]
    fn test_vertex_colors() {
        let src = "\
v 0 0 0 1 0 0
v 1 0 0 0 1 0
v 0 1 0 0 0 1
f 1 2 3
";
        let mesh = ObjLoader::load_from_memory(src.as_bytes()).unwrap();
        assert!(mesh.has_vertex_colors());
        assert_eq!(mesh.vertex_colors[1], Color::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_write_then_read() {
        let mut mesh = ObjLoader::load_from_memory(QUAD_OBJ.as_bytes()).unwrap();
        mesh.compute_vertex_normals();

        let mut buffer = Vec::new();
        ObjLoader::write_to(&mesh, &mut buffer).unwrap();
        let text = String::from_utf8(buffer.clone()).unwrap();
        assert!(text.contains("f 1//1"));

        let reloaded = ObjLoader::load_from_memory(&buffer).unwrap();
        assert_eq!(reloaded.vertex_count(), mesh.vertex_count());
        assert_eq!(reloaded.triangle_count(), mesh.triangle_count());
        assert!(reloaded.has_vertex_normals());
    }
}

/// PLY 文件读写
///
/// 使用 ply-rs-bw crate 解析 ascii 和二进制 PLY。读取 `vertex` 元素的
/// 位置、法线、颜色以及 `face` 元素的索引列表（多边形按扇形三角化）；
/// 写出为二进制小端格式。
use super::{validated, MeshExporter, MeshLoader};
use crate::core::error::{MeshLoadError, Result};
use crate::core::math::{Color, Point, Vector};
use crate::geometry::mesh::TriangleMesh;
use ply_rs_bw::parser::Parser;
use ply_rs_bw::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs_bw::writer::Writer;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// PLY 格式读写器
pub struct PlyLoader;

/// 数值属性统一转成 f64
fn scalar(prop: &Property) -> Option<f64> {
    match *prop {
        Property::Char(v) => Some(v as f64),
        Property::UChar(v) => Some(v as f64),
        Property::Short(v) => Some(v as f64),
        Property::UShort(v) => Some(v as f64),
        Property::Int(v) => Some(v as f64),
        Property::UInt(v) => Some(v as f64),
        Property::Float(v) => Some(v as f64),
        Property::Double(v) => Some(v),
        _ => None,
    }
}

/// 颜色分量：整数按 0..=255 归一化，浮点数原样使用
fn color_channel(prop: &Property) -> Option<f32> {
    match *prop {
        Property::UChar(v) => Some(v as f32 / 255.0),
        Property::UShort(v) => Some(v as f32 / 65535.0),
        Property::Float(v) => Some(v),
        Property::Double(v) => Some(v as f32),
        _ => None,
    }
}

/// 索引列表统一转成 i64，负数留给调用者报错
fn index_list(prop: &Property) -> Option<Vec<i64>> {
    match prop {
        Property::ListChar(v) => Some(v.iter().map(|&i| i as i64).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&i| i as i64).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&i| i as i64).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&i| i as i64).collect()),
        Property::ListInt(v) => Some(v.iter().map(|&i| i as i64).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&i| i as i64).collect()),
        _ => None,
    }
}

fn vec3(element: &DefaultElement, keys: [&str; 3]) -> Option<[f64; 3]> {
    let x = scalar(element.get(keys[0])?)?;
    let y = scalar(element.get(keys[1])?)?;
    let z = scalar(element.get(keys[2])?)?;
    Some([x, y, z])
}

fn rgb(element: &DefaultElement) -> Option<Color> {
    let channels = (element.get("red")?, element.get("green")?, element.get("blue")?);
    if let (Property::UChar(r), Property::UChar(g), Property::UChar(b)) = channels {
        return Some(Color::from_rgb_u8(*r, *g, *b));
    }

    let r = color_channel(element.get("red")?)?;
    let g = color_channel(element.get("green")?)?;
    let b = color_channel(element.get("blue")?)?;
    Some(Color::new(r, g, b))
}

impl PlyLoader {
    fn parse<R: Read>(reader: &mut R, name: &str) -> Result<TriangleMesh> {
        let parser = Parser::<DefaultElement>::new();
        let ply = parser
            .read_ply(reader)
            .map_err(|e| MeshLoadError::ParseError(format!("ply: {}", e)))?;

        let vertices = ply
            .payload
            .get("vertex")
            .ok_or_else(|| MeshLoadError::ValidationError("PLY file has no vertex element".to_string()))?;

        let mut mesh = TriangleMesh::with_name(name);
        mesh.vertices.reserve(vertices.len());

        for (i, v) in vertices.iter().enumerate() {
            let [x, y, z] = vec3(v, ["x", "y", "z"]).ok_or_else(|| {
                MeshLoadError::InvalidGeometry(format!("vertex {} is missing x/y/z", i))
            })?;
            mesh.vertices.push(Point::new(x, y, z));
        }

        // 法线和颜色要求每个顶点都有，否则整体丢弃
        let normals: Option<Vec<Vector>> = vertices
            .iter()
            .map(|v| vec3(v, ["nx", "ny", "nz"]).map(|[x, y, z]| Vector::new(x, y, z)))
            .collect();
        if let Some(normals) = normals {
            mesh.vertex_normals = normals;
        }

        let colors: Option<Vec<Color>> = vertices.iter().map(rgb).collect();
        if let Some(colors) = colors {
            mesh.vertex_colors = colors;
        }

        if let Some(faces) = ply.payload.get("face") {
            for (i, face) in faces.iter().enumerate() {
                let indices = face
                    .get("vertex_indices")
                    .or_else(|| face.get("vertex_index"))
                    .and_then(index_list)
                    .ok_or_else(|| {
                        MeshLoadError::InvalidGeometry(format!("face {} has no vertex index list", i))
                    })?;

                if indices.len() < 3 {
                    continue;
                }
                if indices.iter().any(|&idx| idx < 0 || idx > u32::MAX as i64) {
                    return Err(MeshLoadError::InvalidGeometry(format!(
                        "face {} has an invalid vertex index",
                        i
                    ))
                    .into());
                }

                for k in 1..indices.len() - 1 {
                    mesh.triangles.push([
                        indices[0] as u32,
                        indices[k] as u32,
                        indices[k + 1] as u32,
                    ]);
                }
            }
        }

        validated(mesh)
    }

    /// 构造待写出的 PLY 结构
    fn build_ply(mesh: &TriangleMesh) -> Ply<DefaultElement> {
        let has_normals = mesh.has_vertex_normals();
        let has_colors = mesh.has_vertex_colors();

        let mut ply = Ply::<DefaultElement>::new();
        ply.header.encoding = Encoding::BinaryLittleEndian;
        ply.header.comments.push("written by mesh_pipeline".to_string());

        let float = || PropertyType::Scalar(ScalarType::Float);
        let uchar = || PropertyType::Scalar(ScalarType::UChar);

        let mut vertex_def = ElementDef::new("vertex".to_string());
        for key in ["x", "y", "z"] {
            vertex_def.properties.add(PropertyDef::new(key.to_string(), float()));
        }
        if has_normals {
            for key in ["nx", "ny", "nz"] {
                vertex_def.properties.add(PropertyDef::new(key.to_string(), float()));
            }
        }
        if has_colors {
            for key in ["red", "green", "blue"] {
                vertex_def.properties.add(PropertyDef::new(key.to_string(), uchar()));
            }
        }
        ply.header.elements.add(vertex_def);

        let mut face_def = ElementDef::new("face".to_string());
        face_def.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));
        ply.header.elements.add(face_def);

        let vertices: Vec<DefaultElement> = mesh
            .vertices
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut element = DefaultElement::new();
                element.insert("x".to_string(), Property::Float(p.x as f32));
                element.insert("y".to_string(), Property::Float(p.y as f32));
                element.insert("z".to_string(), Property::Float(p.z as f32));
                if has_normals {
                    let n = mesh.vertex_normals[i];
                    element.insert("nx".to_string(), Property::Float(n.x as f32));
                    element.insert("ny".to_string(), Property::Float(n.y as f32));
                    element.insert("nz".to_string(), Property::Float(n.z as f32));
                }
                if has_colors {
                    let [r, g, b] = mesh.vertex_colors[i].to_rgb_u8();
                    element.insert("red".to_string(), Property::UChar(r));
                    element.insert("green".to_string(), Property::UChar(g));
                    element.insert("blue".to_string(), Property::UChar(b));
                }
                element
            })
            .collect();

        let faces: Vec<DefaultElement> = mesh
            .triangles
            .iter()
            .map(|tri| {
                let mut element = DefaultElement::new();
                element.insert(
                    "vertex_indices".to_string(),
                    Property::ListInt(tri.iter().map(|&i| i as i32).collect()),
                );
                element
            })
            .collect();

        ply.payload.insert("vertex".to_string(), vertices);
        ply.payload.insert("face".to_string(), faces);
        ply
    }
}

impl MeshLoader for PlyLoader {
    fn load_from_file(path: &Path) -> Result<TriangleMesh> {
        if !path.exists() {
            return Err(MeshLoadError::FileNotFound(path.to_path_buf()).into());
        }

        let file = std::fs::File::open(path)?;
        let mut reader = BufReader::new(file);
        let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("Unnamed");
        let mesh = Self::parse(&mut reader, name)?;

        tracing::info!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "Loaded PLY file"
        );

        Ok(mesh)
    }

    fn load_from_memory(data: &[u8]) -> Result<TriangleMesh> {
        let mut reader = data;
        Self::parse(&mut reader, "Unnamed")
    }

    fn supported_extensions() -> &'static [&'static str] {
        &["ply"]
    }
}

impl MeshExporter for PlyLoader {
    fn write_to<W: Write>(mesh: &TriangleMesh, writer: &mut W) -> Result<()> {
        let mut ply = Self::build_ply(mesh);
        ply.make_consistent()
            .map_err(|e| MeshLoadError::WriteError(format!("inconsistent PLY structure: {:?}", e)))?;

        let bytes = Writer::<DefaultElement>::new()
            .write_ply(writer, &mut ply)
            .map_err(|e| MeshLoadError::WriteError(format!("ply: {}", e)))?;

        tracing::debug!(
            bytes,
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "Wrote PLY data"
        );
        Ok(())
    }
}

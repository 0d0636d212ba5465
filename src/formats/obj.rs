//! Provides the Wavefront OBJ decoder.
//!
//! Polygons are fan-triangulated. When loaded from a path, companion `.mtl`
//! libraries are resolved for diffuse colors and textures.

use std::collections::HashMap;
use std::io::{BufReader, Cursor};
use std::path::Path;
use std::sync::Arc;

use glam::{Vec2, Vec3};
use obj::raw::material::{parse_mtl, MtlColor};
use obj::raw::object::{Polygon, RawObj};
use obj::raw::parse_obj;

use super::texture::load_texture_from_file;
use super::{FormatLoader, LoadError, LoadResult, Model, TextureData, Triangle, DEFAULT_COLOR};

/// The Wavefront OBJ format loader.
pub struct ObjLoader;

impl FormatLoader for ObjLoader {
    fn name(&self) -> &'static str {
        "Wavefront OBJ"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["obj"]
    }

    fn can_load(&self, data: &[u8], extension: Option<&str>) -> bool {
        if extension.is_some_and(|ext| ext.eq_ignore_ascii_case("obj")) {
            return true;
        }

        let text = String::from_utf8_lossy(&data[..data.len().min(4000)]);
        let mut has_vertex = false;
        let mut has_face = false;
        for line in text.lines().map(str::trim) {
            has_vertex |= line.starts_with("v ");
            has_face |= line.starts_with("f ");
            if has_vertex && has_face {
                return true;
            }
        }

        false
    }

    fn load_from_bytes(&self, data: &[u8]) -> LoadResult {
        let raw = parse(data)?;
        convert_raw_obj(&raw, &HashMap::new())
    }

    fn load_from_path(&self, path: &Path) -> LoadResult {
        let data = std::fs::read(path)?;
        let raw = parse(&data)?;

        let obj_dir = path.parent().unwrap_or(Path::new("."));
        let materials = load_mtl_materials(&raw.material_libraries, obj_dir);

        convert_raw_obj(&raw, &materials)
    }
}

fn parse(data: &[u8]) -> Result<RawObj, LoadError> {
    parse_obj(BufReader::new(Cursor::new(data)))
        .map_err(|e| LoadError::InvalidData(format!("Failed to parse OBJ: {}", e)))
}

struct ObjMaterial {
    color: [f32; 3],
    texture: Option<Arc<TextureData>>,
}

/// Loads every material from the `.mtl` libraries an OBJ references.
///
/// Missing or malformed libraries are skipped; the affected faces fall back
/// to the default color.
fn load_mtl_materials(mtl_libs: &[String], obj_dir: &Path) -> HashMap<String, ObjMaterial> {
    let mut materials = HashMap::new();

    for mtl_name in mtl_libs {
        let mtl_path = obj_dir.join(mtl_name);
        let raw_mtl = match std::fs::read(&mtl_path)
            .map_err(|e| e.to_string())
            .and_then(|d| parse_mtl(BufReader::new(Cursor::new(d))).map_err(|e| e.to_string()))
        {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(path = %mtl_path.display(), error = %e, "skipping material library");
                continue;
            }
        };

        let mtl_dir = mtl_path.parent().unwrap_or(obj_dir);

        for (name, mat) in &raw_mtl.materials {
            let color = mat
                .diffuse
                .as_ref()
                .map(mtl_color_to_rgb)
                .unwrap_or(DEFAULT_COLOR);

            let texture = mat
                .diffuse_map
                .as_ref()
                .and_then(|map| load_texture_from_file(&mtl_dir.join(&map.file)));

            materials.insert(name.clone(), ObjMaterial { color, texture });
        }
    }

    materials
}

fn mtl_color_to_rgb(color: &MtlColor) -> [f32; 3] {
    match color {
        MtlColor::Rgb(r, g, b) | MtlColor::Xyz(r, g, b) => [*r, *g, *b],
        MtlColor::Spectral(_, _) => DEFAULT_COLOR,
    }
}

/// Position and texture-coordinate indices of a polygon's corners.
fn polygon_corners(polygon: &Polygon) -> Vec<(usize, Option<usize>)> {
    match polygon {
        Polygon::P(v) => v.iter().map(|&p| (p, None)).collect(),
        Polygon::PT(v) => v.iter().map(|&(p, t)| (p, Some(t))).collect(),
        Polygon::PN(v) => v.iter().map(|&(p, _)| (p, None)).collect(),
        Polygon::PTN(v) => v.iter().map(|&(p, t, _)| (p, Some(t))).collect(),
    }
}

fn convert_raw_obj(raw: &RawObj, materials: &HashMap<String, ObjMaterial>) -> LoadResult {
    // Polygon index -> material name
    let mut polygon_material: Vec<Option<&str>> = vec![None; raw.polygons.len()];
    for (mat_name, group) in &raw.meshes {
        for range in &group.polygons {
            for slot in polygon_material
                .iter_mut()
                .take(range.end)
                .skip(range.start)
            {
                *slot = Some(mat_name.as_str());
            }
        }
    }

    let corner = |(p, t): (usize, Option<usize>)| -> Option<(Vec3, Vec2)> {
        let (x, y, z, _) = *raw.positions.get(p)?;
        let uv = t
            .and_then(|t| raw.tex_coords.get(t))
            .map(|&(u, v, _)| Vec2::new(u, v))
            .unwrap_or(Vec2::ZERO);
        Some((Vec3::new(x, y, z), uv))
    };

    let mut triangles = Vec::new();

    for (poly_idx, polygon) in raw.polygons.iter().enumerate() {
        let corners = polygon_corners(polygon);
        if corners.len() < 3 {
            continue;
        }

        let mat = polygon_material[poly_idx].and_then(|n| materials.get(n));
        let color = mat.map_or(DEFAULT_COLOR, |m| m.color);
        let texture = mat.and_then(|m| m.texture.clone());

        let Some((v0, uv0)) = corner(corners[0]) else {
            continue;
        };

        for pair in corners[1..].windows(2) {
            let (Some((v1, uv1)), Some((v2, uv2))) = (corner(pair[0]), corner(pair[1])) else {
                continue;
            };

            triangles.push(Triangle {
                verts: [v0, v1, v2],
                uvs: [uv0, uv1, uv2],
                color,
                texture: texture.clone(),
            });
        }
    }

    if triangles.is_empty() {
        return Err(LoadError::NoGeometry);
    }

    Ok(Model::new(triangles))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_is_fan_triangulated() {
        let data = b"v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let model = ObjLoader.load_from_bytes(data).unwrap();
        assert_eq!(model.triangles.len(), 2);
        assert_eq!(model.triangles[1].verts[2], Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_vertices_only_has_no_geometry() {
        let data = b"v 0 0 0\nv 1 0 0\n";
        assert!(matches!(
            ObjLoader.load_from_bytes(data),
            Err(LoadError::NoGeometry)
        ));
    }

    #[test]
    fn test_mtl_color_applied_from_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("tri.mtl"),
            "newmtl red\nKd 1.0 0.0 0.0\n",
        )
        .unwrap();
        let obj_path = dir.path().join("tri.obj");
        std::fs::write(
            &obj_path,
            "mtllib tri.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nusemtl red\nf 1 2 3\n",
        )
        .unwrap();

        let model = ObjLoader.load_from_path(&obj_path).unwrap();
        assert_eq!(model.triangles[0].color, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_detects_by_content() {
        assert!(ObjLoader.can_load(b"# cube\nv 0 0 0\nf 1 1 1\n", None));
        assert!(!ObjLoader.can_load(b"glTF\x02\x00", None));
    }
}

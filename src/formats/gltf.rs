//! Provides the glTF/GLB decoder.
//!
//! Handles binary GLB and JSON glTF, with embedded (`data:`) or external
//! buffers and images. Node transforms are flattened into triangle positions.
//!
//! # Examples
//! ```
//! use scenery::formats::{self, FormatLoader};
//!
//! let loader = formats::gltf::GltfLoader;
//! assert!(loader.extensions().contains(&"glb"));
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};

use super::texture::{decode_data_uri, decode_texture};
use super::{FormatLoader, LoadError, LoadResult, Model, TextureData, Triangle};

/// The glTF format loader.
pub struct GltfLoader;

impl FormatLoader for GltfLoader {
    fn name(&self) -> &'static str {
        "glTF"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["gltf", "glb"]
    }

    fn can_load(&self, data: &[u8], extension: Option<&str>) -> bool {
        if let Some(ext) = extension {
            let ext_lower = ext.to_lowercase();
            if ext_lower == "gltf" || ext_lower == "glb" {
                return true;
            }
        }

        // GLB magic
        if data.starts_with(b"glTF") {
            return true;
        }

        if data.len() > 10 {
            let start = String::from_utf8_lossy(&data[..data.len().min(1000)]);
            if start.contains("\"asset\"")
                && (start.contains("\"scene\"") || start.contains("\"scenes\""))
            {
                return true;
            }
        }

        false
    }

    fn load_from_bytes(&self, data: &[u8]) -> LoadResult {
        let (document, buffers, images) = gltf::import_slice(data)?;
        load_from_gltf(&document, &buffers, &images)
    }

    fn load_from_path(&self, path: &Path) -> LoadResult {
        let (document, buffers, images) = gltf::import(path)?;
        load_from_gltf(&document, &buffers, &images)
    }

    fn external_resources(&self, data: &[u8]) -> LoadResult<Vec<String>> {
        let gltf = gltf::Gltf::from_slice(data)?;

        let buffer_uris = gltf.buffers().filter_map(|buffer| match buffer.source() {
            gltf::buffer::Source::Uri(uri) => Some(uri),
            gltf::buffer::Source::Bin => None,
        });
        let image_uris = gltf.images().filter_map(|image| match image.source() {
            gltf::image::Source::Uri { uri, .. } => Some(uri),
            gltf::image::Source::View { .. } => None,
        });

        let mut uris: Vec<String> = buffer_uris
            .chain(image_uris)
            .filter(|uri| !uri.starts_with("data:"))
            .map(str::to_string)
            .collect();
        uris.sort();
        uris.dedup();
        Ok(uris)
    }

    fn load_with_resources(&self, data: &[u8], resources: &HashMap<String, Vec<u8>>) -> LoadResult {
        let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(data)?;

        let mut buffers = Vec::new();
        for buffer in document.buffers() {
            let mut bytes = match buffer.source() {
                gltf::buffer::Source::Bin => blob.clone().ok_or(gltf::Error::MissingBlob)?,
                gltf::buffer::Source::Uri(uri) => resolve_uri(uri, resources)?,
            };
            if bytes.len() < buffer.length() {
                return Err(LoadError::InvalidData(format!(
                    "buffer {} holds {} bytes, expected {}",
                    buffer.index(),
                    bytes.len(),
                    buffer.length()
                )));
            }
            // Accessor reads assume 4-byte alignment
            while bytes.len() % 4 != 0 {
                bytes.push(0);
            }
            buffers.push(gltf::buffer::Data(bytes));
        }

        let mut textures = Vec::new();
        for image in document.images() {
            let bytes = match image.source() {
                gltf::image::Source::View { view, .. } => {
                    let start = view.offset();
                    buffers
                        .get(view.buffer().index())
                        .and_then(|buffer| buffer.0.get(start..start + view.length()))
                        .map(<[u8]>::to_vec)
                        .ok_or_else(|| {
                            LoadError::InvalidData(format!("image {} view out of range", image.index()))
                        })?
                }
                gltf::image::Source::Uri { uri, .. } => resolve_uri(uri, resources)?,
            };
            let texture = decode_texture(&bytes);
            if texture.is_none() {
                tracing::warn!(image = image.index(), "skipping undecodable glTF image");
            }
            textures.push(texture);
        }

        build_model(&document, &buffers, &textures)
    }
}

/// Bytes for a buffer or image URI, either inline or from `resources`.
fn resolve_uri(uri: &str, resources: &HashMap<String, Vec<u8>>) -> Result<Vec<u8>, LoadError> {
    if uri.starts_with("data:") {
        return decode_data_uri(uri)
            .ok_or_else(|| LoadError::InvalidData(format!("malformed data URI in {}", uri)));
    }
    resources
        .get(uri)
        .cloned()
        .ok_or_else(|| LoadError::InvalidData(format!("unresolved external resource: {}", uri)))
}

/// Converts imported images to textures, then builds the model.
fn load_from_gltf(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[gltf::image::Data],
) -> LoadResult {
    let textures: Vec<Option<Arc<TextureData>>> = images
        .iter()
        .map(|img| {
            Some(Arc::new(TextureData {
                width: img.width,
                height: img.height,
                data: convert_to_rgba(&img.pixels, img.format),
            }))
        })
        .collect();

    build_model(document, buffers, &textures)
}

/// Walks the default scene and collects triangles. `images` is indexed by glTF image index.
fn build_model(
    document: &gltf::Document,
    buffers: &[gltf::buffer::Data],
    images: &[Option<Arc<TextureData>>],
) -> LoadResult {
    let textures: Vec<Option<Arc<TextureData>>> = document
        .textures()
        .map(|tex| images.get(tex.source().index()).cloned().flatten())
        .collect();

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or(LoadError::NoGeometry)?;

    let mut triangles = Vec::new();
    for node in scene.nodes() {
        extract_node_triangles(&node, buffers, &textures, &mut triangles, Mat4::IDENTITY);
    }

    if triangles.is_empty() {
        return Err(LoadError::NoGeometry);
    }

    Ok(Model::new(triangles))
}

/// Recursively walks a node subtree, emitting triangles with accumulated transforms.
fn extract_node_triangles(
    node: &gltf::Node,
    buffers: &[gltf::buffer::Data],
    textures: &[Option<Arc<TextureData>>],
    triangles: &mut Vec<Triangle>,
    parent: Mat4,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                continue;
            }

            let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|d| &*d.0));

            let positions: Vec<Vec3> = match reader.read_positions() {
                Some(iter) => iter.map(Vec3::from).collect(),
                None => continue,
            };

            let uvs: Vec<Vec2> = reader
                .read_tex_coords(0)
                .map(|iter| iter.into_f32().map(Vec2::from).collect())
                .unwrap_or_default();

            let pbr = primitive.material().pbr_metallic_roughness();
            let [r, g, b, _] = pbr.base_color_factor();
            let material_color = Vec3::new(r, g, b);

            let texture = pbr
                .base_color_texture()
                .and_then(|info| textures.get(info.texture().index()).cloned().flatten());

            let vertex_colors: Option<Vec<Vec3>> = reader
                .read_colors(0)
                .map(|iter| iter.into_rgb_f32().map(Vec3::from).collect());

            let indices: Vec<u32> = match reader.read_indices() {
                Some(iter) => iter.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            for tri in indices.chunks_exact(3) {
                let idx = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
                if idx.iter().any(|&i| i >= positions.len()) {
                    continue;
                }

                let verts = idx.map(|i| world.transform_point3(positions[i]));
                let uvs = idx.map(|i| uvs.get(i).copied().unwrap_or(Vec2::ZERO));

                let color = match vertex_colors.as_ref() {
                    Some(vc) => {
                        let sum: Vec3 = idx
                            .iter()
                            .map(|&i| vc.get(i).copied().unwrap_or(Vec3::ONE))
                            .sum();
                        (sum / 3.0) * material_color
                    }
                    None => material_color,
                };

                triangles.push(Triangle {
                    verts,
                    uvs,
                    color: color.to_array(),
                    texture: texture.clone(),
                });
            }
        }
    }

    for child in node.children() {
        extract_node_triangles(&child, buffers, textures, triangles, world);
    }
}

/// Expands 8-bit pixel formats to RGBA8. Wider formats become opaque white.
fn convert_to_rgba(pixels: &[u8], format: gltf::image::Format) -> Vec<u8> {
    use gltf::image::Format;
    match format {
        Format::R8G8B8A8 => pixels.to_vec(),
        Format::R8G8B8 => pixels
            .chunks_exact(3)
            .flat_map(|c| [c[0], c[1], c[2], 255])
            .collect(),
        Format::R8G8 => pixels
            .chunks_exact(2)
            .flat_map(|c| [c[0], c[1], 0, 255])
            .collect(),
        Format::R8 => pixels.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        Format::R16 => vec![255; pixels.len() / 2 * 4],
        Format::R16G16 => vec![255; pixels.len() / 4 * 4],
        Format::R16G16B16 => vec![255; pixels.len() / 6 * 4],
        Format::R16G16B16A16 => vec![255; pixels.len() / 8 * 4],
        Format::R32G32B32FLOAT => vec![255; pixels.len() / 12 * 4],
        Format::R32G32B32A32FLOAT => vec![255; pixels.len() / 16 * 4],
    }
}

//! Provides the decoder trait and the renderable model type.
//!
//! Each supported format implements [`FormatLoader`] and produces a [`Model`]:
//! a flat list of triangles in model space plus an object transform that
//! places the model in the scene.
//!
//! # Examples
//! ```
//! use scenery::formats;
//!
//! let result = formats::load_model(b"invalid", None);
//! assert!(result.is_err());
//! ```

pub mod gltf;
pub mod obj;
pub mod texture;

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};

pub use crate::error::{LoadError, LoadResult};

/// How much of a file format detection looks at.
const SNIFF_LEN: usize = 4096;

/// Represents decoded texture data for sampling.
///
/// # Examples
/// ```
/// use scenery::formats::TextureData;
///
/// let tex = TextureData {
///     width: 1,
///     height: 1,
///     data: vec![255, 255, 255, 255],
/// };
/// assert_eq!(tex.width, 1);
/// ```
#[derive(Clone, Debug)]
pub struct TextureData {
    /// The texture width in pixels.
    pub width: u32,
    /// The texture height in pixels.
    pub height: u32,
    /// RGBA pixel data stored row-major.
    pub data: Vec<u8>,
}

impl TextureData {
    /// Samples the texture at UV coordinates, wrapping outside `[0, 1)`.
    ///
    /// # Examples
    /// ```
    /// use scenery::formats::TextureData;
    ///
    /// let tex = TextureData {
    ///     width: 1,
    ///     height: 1,
    ///     data: vec![255, 0, 255, 255],
    /// };
    /// assert_eq!(tex.sample(1.5, -0.25), [1.0, 0.0, 1.0, 1.0]);
    /// ```
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        let x = ((u * self.width as f32) as u32).min(self.width.saturating_sub(1));
        let y = ((v * self.height as f32) as u32).min(self.height.saturating_sub(1));
        let idx = ((y * self.width + x) * 4) as usize;

        match self.data.get(idx..idx + 4) {
            Some(px) => [
                f32::from(px[0]) / 255.0,
                f32::from(px[1]) / 255.0,
                f32::from(px[2]) / 255.0,
                f32::from(px[3]) / 255.0,
            ],
            None => [1.0, 1.0, 1.0, 1.0],
        }
    }
}

/// A single triangle with positions, UVs, flat color and optional texture.
///
/// # Examples
/// ```
/// use glam::{Vec2, Vec3};
/// use scenery::formats::Triangle;
///
/// let tri = Triangle::new([Vec3::ZERO, Vec3::X, Vec3::Y]);
/// assert_eq!(tri.uvs, [Vec2::ZERO; 3]);
/// ```
#[derive(Clone, Debug)]
pub struct Triangle {
    /// Vertex positions in model space.
    pub verts: [Vec3; 3],
    /// Per-vertex UV coordinates.
    pub uvs: [Vec2; 3],
    /// Base RGB color.
    pub color: [f32; 3],
    /// Optional base color texture, shared between triangles.
    pub texture: Option<Arc<TextureData>>,
}

impl Triangle {
    /// Creates an untextured light-grey triangle.
    pub fn new(verts: [Vec3; 3]) -> Self {
        Self {
            verts,
            uvs: [Vec2::ZERO; 3],
            color: DEFAULT_COLOR,
            texture: None,
        }
    }
}

pub(crate) const DEFAULT_COLOR: [f32; 3] = [0.85, 0.85, 0.85];

/// A loaded, renderable model.
///
/// Triangles are stored in model space (node hierarchies inside the source
/// file are already flattened). `transform` positions the whole model in the
/// scene and starts as the identity.
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use scenery::formats::{Model, Triangle};
///
/// let mut model = Model::new(vec![Triangle::new([Vec3::ZERO, Vec3::X, Vec3::Y])]);
/// model.set_translation(Vec3::new(0.0, 0.0, 5.0));
/// assert_eq!(model.triangles.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Model {
    /// Triangles in model space.
    pub triangles: Vec<Triangle>,
    /// Model-to-world transform.
    pub transform: Mat4,
}

impl Model {
    /// Wraps triangles in a model with an identity transform.
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self {
            triangles,
            transform: Mat4::IDENTITY,
        }
    }

    /// Replaces the model-to-world transform.
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Moves the model so its origin sits at `translation`, keeping rotation and scale.
    pub fn set_translation(&mut self, translation: Vec3) {
        self.transform.w_axis = translation.extend(1.0);
    }

    /// Iterates every triangle vertex in world space.
    ///
    /// # Examples
    /// ```
    /// use glam::{Mat4, Vec3};
    /// use scenery::formats::{Model, Triangle};
    ///
    /// let model = Model::new(vec![Triangle::new([Vec3::ZERO, Vec3::X, Vec3::Y])])
    ///     .with_transform(Mat4::from_translation(Vec3::Z));
    /// let first = model.world_vertices().next();
    /// assert_eq!(first, Some(Vec3::Z));
    /// ```
    pub fn world_vertices(&self) -> impl Iterator<Item = Vec3> + '_ {
        let m = self.transform;
        self.triangles
            .iter()
            .flat_map(|tri| tri.verts.iter())
            .map(move |&v| m.transform_point3(v))
    }
}

/// A decoder for one model format.
///
/// # Examples
/// ```
/// use scenery::formats::{self, FormatLoader};
///
/// let loader = formats::gltf::GltfLoader;
/// assert_eq!(loader.name(), "glTF");
/// ```
pub trait FormatLoader: Send + Sync {
    /// Returns the human-readable name for this format.
    fn name(&self) -> &'static str;

    /// Returns the file extensions this loader handles (lowercase, without dot).
    ///
    /// # Examples
    /// ```
    /// use scenery::formats::{self, FormatLoader};
    ///
    /// let loader = formats::obj::ObjLoader;
    /// assert!(loader.extensions().contains(&"obj"));
    /// ```
    fn extensions(&self) -> &'static [&'static str];

    /// Checks whether this loader can handle the given data.
    ///
    /// This is a quick sniff (magic bytes, leading structure), not a parse.
    fn can_load(&self, data: &[u8], extension: Option<&str>) -> bool;

    /// Decodes a model from raw bytes.
    ///
    /// # Errors
    /// Returns an error if the data cannot be parsed or contains no geometry.
    fn load_from_bytes(&self, data: &[u8]) -> LoadResult;

    /// Decodes a model from a file path.
    ///
    /// The default reads the file and calls `load_from_bytes`; loaders
    /// override it to resolve sibling resources.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    fn load_from_path(&self, path: &Path) -> LoadResult {
        let data = std::fs::read(path)?;
        self.load_from_bytes(&data)
    }

    /// Lists the relative URIs a document needs besides its own bytes.
    ///
    /// Inline `data:` URIs are not listed. The default has none.
    ///
    /// # Errors
    /// Returns an error if the document cannot be parsed.
    fn external_resources(&self, _data: &[u8]) -> LoadResult<Vec<String>> {
        Ok(Vec::new())
    }

    /// Decodes a model whose external resources were fetched by the caller.
    ///
    /// `resources` maps each URI from [`external_resources`](Self::external_resources)
    /// to its bytes.
    ///
    /// # Errors
    /// Returns an error if a resource is missing or the data cannot be parsed.
    fn load_with_resources(&self, data: &[u8], _resources: &HashMap<String, Vec<u8>>) -> LoadResult {
        self.load_from_bytes(data)
    }
}

/// Returns all registered format loaders.
///
/// # Examples
/// ```
/// use scenery::formats;
///
/// assert_eq!(formats::get_loaders().len(), 2);
/// ```
pub fn get_loaders() -> Vec<Box<dyn FormatLoader>> {
    vec![Box::new(gltf::GltfLoader), Box::new(obj::ObjLoader)]
}

/// Finds a loader for the data, preferring an extension match.
///
/// # Examples
/// ```
/// use scenery::formats;
///
/// let loader = formats::find_loader(b"glTF", Some("glb"));
/// assert!(loader.is_some());
/// ```
pub fn find_loader(data: &[u8], extension: Option<&str>) -> Option<Box<dyn FormatLoader>> {
    let mut loaders = get_loaders();

    if let Some(ext) = extension {
        let ext_lower = ext.to_lowercase();
        if let Some(idx) = loaders.iter().position(|loader| {
            loader.extensions().contains(&ext_lower.as_str())
                && loader.can_load(data, Some(&ext_lower))
        }) {
            return Some(loaders.swap_remove(idx));
        }
    }

    // Content sniffing
    loaders.into_iter().find(|loader| loader.can_load(data, None))
}

/// Decodes a model from bytes, auto-detecting the format.
///
/// # Errors
/// Returns an error if no loader recognizes the data or parsing fails.
///
/// # Examples
/// ```
/// use scenery::formats::{self, LoadError};
///
/// let result = formats::load_model(b"invalid", None);
/// assert!(matches!(result, Err(LoadError::UnrecognizedFormat)));
/// ```
pub fn load_model(data: &[u8], extension: Option<&str>) -> LoadResult {
    let loader = find_loader(data, extension).ok_or(LoadError::UnrecognizedFormat)?;
    tracing::debug!(format = loader.name(), bytes = data.len(), "decoding model");
    loader.load_from_bytes(data)
}

/// Decodes a model from a file path, auto-detecting the format.
///
/// # Errors
/// Returns an error if the file cannot be read or the format is unrecognized.
///
/// # Examples
/// ```
/// use std::path::Path;
///
/// use scenery::formats;
///
/// let result = formats::load_model_from_path(Path::new("does_not_exist.gltf"));
/// assert!(result.is_err());
/// ```
pub fn load_model_from_path(path: &Path) -> LoadResult {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    let head = read_prefix(path)?;
    let loader = find_loader(&head, extension.as_deref()).ok_or(LoadError::UnrecognizedFormat)?;
    tracing::debug!(format = loader.name(), path = %path.display(), "decoding model");

    loader.load_from_path(path)
}

/// Reads at most [`SNIFF_LEN`] bytes from the start of a file.
fn read_prefix(path: &Path) -> std::io::Result<Vec<u8>> {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_out_of_range_data_is_white() {
        let tex = TextureData {
            width: 2,
            height: 2,
            data: vec![0; 4],
        };
        assert_eq!(tex.sample(0.9, 0.9), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(tex.sample(0.1, 0.1), [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_set_translation_keeps_scale() {
        let mut model = Model::new(vec![Triangle::new([Vec3::ZERO, Vec3::X, Vec3::Y])])
            .with_transform(Mat4::from_scale(Vec3::splat(2.0)));
        model.set_translation(Vec3::new(1.0, 0.0, 0.0));

        let verts: Vec<Vec3> = model.world_vertices().collect();
        assert_eq!(verts[0], Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(verts[1], Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(verts[2], Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_find_loader_sniffs_obj_without_extension() {
        let data = b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n";
        let loader = find_loader(data, None).map(|l| l.name());
        assert_eq!(loader, Some("Wavefront OBJ"));
    }

    #[test]
    fn test_path_sniff_reads_bounded_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("padded");
        let mut text = "# padding\n".repeat(SNIFF_LEN / 4);
        text.push_str("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        std::fs::write(&path, &text).unwrap();

        assert_eq!(read_prefix(&path).unwrap().len(), SNIFF_LEN);

        let obj_path = dir.path().join("padded.obj");
        std::fs::write(&obj_path, &text).unwrap();
        let model = load_model_from_path(&obj_path).unwrap();
        assert_eq!(model.triangles.len(), 1);
    }
}

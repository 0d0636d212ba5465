//! Provides texture and data-URI decoding shared by the format loaders.
//!
//! # Examples
//! ```
//! use scenery::formats::texture::load_texture_from_data_url;
//!
//! let data_url = "data:image/png;base64,\
//! iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAAEElEQVR4AQEFAPr/AP////8J+wP9o9FJCgAAAABJRU5ErkJggg==";
//! let texture = load_texture_from_data_url(data_url);
//! assert!(texture.is_some());
//! ```

use std::path::Path;
use std::sync::Arc;

use base64::Engine;
use image::GenericImageView;
use percent_encoding::percent_decode_str;

use super::TextureData;

/// Decodes the payload of a `data:` URI.
///
/// Base64 payloads (`;base64,`) are decoded; anything else is percent-decoded.
/// Returns `None` for non-data URIs or bad base64.
///
/// # Examples
/// ```
/// use scenery::formats::texture::decode_data_uri;
///
/// assert_eq!(decode_data_uri("data:text/plain;base64,aGk="), Some(b"hi".to_vec()));
/// assert_eq!(decode_data_uri("data:,raw"), Some(b"raw".to_vec()));
/// assert_eq!(decode_data_uri("data:,a%20b"), Some(b"a b".to_vec()));
/// assert_eq!(decode_data_uri("file:///tmp/a.glb"), None);
/// ```
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;

    if header.ends_with(";base64") {
        base64::engine::general_purpose::STANDARD
            .decode(payload.trim())
            .ok()
    } else {
        Some(percent_decode_str(payload).collect())
    }
}

/// Decodes encoded image bytes (PNG, JPEG) into RGBA texture data.
pub fn decode_texture(bytes: &[u8]) -> Option<Arc<TextureData>> {
    let img = image::load_from_memory(bytes).ok()?;
    let (width, height) = img.dimensions();

    Some(Arc::new(TextureData {
        width,
        height,
        data: img.to_rgba8().into_raw(),
    }))
}

/// Loads a texture from a base64-encoded data URL.
///
/// Returns `None` if the source is empty, not a data URL, or decoding fails.
pub fn load_texture_from_data_url(source: &str) -> Option<Arc<TextureData>> {
    if source.is_empty() {
        return None;
    }
    decode_texture(&decode_data_uri(source)?)
}

/// Loads a texture from an image file on disk.
pub fn load_texture_from_file(path: &Path) -> Option<Arc<TextureData>> {
    match std::fs::read(path) {
        Ok(bytes) => decode_texture(&bytes),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "skipping unreadable texture");
            None
        }
    }
}

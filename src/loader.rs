//! Provides the asynchronous model loader.
//!
//! [`ModelLoader::load`] turns a URL into a future that resolves exactly once,
//! to either the decoded [`Model`] or the error the underlying fetch or
//! decoder produced. Decoding runs on tokio's blocking pool so the caller's
//! task is never stalled by parsing.
//!
//! Supported URLs:
//! - `data:<mime>[;base64],<payload>`
//! - `http://` and `https://`, with relative resource URIs (glTF buffers and
//!   images) fetched from alongside the model
//! - `file://<path>` or a bare filesystem path
//!
//! # Examples
//! ```no_run
//! use scenery::loader::ModelLoader;
//!
//! # async fn run() -> Result<(), scenery::error::LoadError> {
//! let loader = ModelLoader::default();
//! let model = loader.load("assets/ship.glb").await?;
//! println!("{} triangles", model.triangles.len());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::LoaderConfig;
use crate::error::{LoadError, LoadResult};
use crate::formats::texture::decode_data_uri;
use crate::formats::{self, Model};

/// Loads models from URLs. Cheap to clone; clones share one configuration.
#[derive(Debug, Clone, Default)]
pub struct ModelLoader {
    config: Arc<LoaderConfig>,
}

/// Where the bytes for a URL come from.
#[derive(Debug, PartialEq)]
enum Source {
    Inline {
        bytes: Vec<u8>,
        extension: Option<&'static str>,
    },
    Remote(String),
    File(PathBuf),
}

impl ModelLoader {
    /// Creates a loader with the given configuration.
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Returns the loader configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Loads and decodes the model at `url`.
    ///
    /// Each call is independent: concurrent loads of the same URL are not
    /// merged, nothing is cached, and there is no timeout. Dropping the
    /// future abandons the load.
    ///
    /// # Errors
    /// Returns the fetch or decode error unchanged, wrapped in [`LoadError`].
    pub async fn load(&self, url: &str) -> LoadResult<Model> {
        tracing::debug!(url, "loading model");

        let result = match self.classify(url)? {
            Source::Inline { bytes, extension } => decode_bytes(bytes, extension).await,
            Source::Remote(remote) => load_remote(&remote).await,
            Source::File(path) => {
                tokio::task::spawn_blocking(move || formats::load_model_from_path(&path)).await?
            }
        };

        match &result {
            Ok(model) => tracing::debug!(url, triangles = model.triangles.len(), "model loaded"),
            Err(e) => tracing::debug!(url, error = %e, "model load failed"),
        }
        result
    }

    /// Starts a load as its own tokio task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(&self, url: impl Into<String>) -> JoinHandle<LoadResult<Model>> {
        let loader = self.clone();
        let url = url.into();
        tokio::spawn(async move { loader.load(&url).await })
    }

    fn classify(&self, url: &str) -> Result<Source, LoadError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(LoadError::InvalidUrl("empty URL".to_string()));
        }

        if url.starts_with("data:") {
            let bytes = decode_data_uri(url)
                .ok_or_else(|| LoadError::InvalidUrl("malformed data URI".to_string()))?;
            return Ok(Source::Inline {
                bytes,
                extension: data_uri_extension(url),
            });
        }

        if url.starts_with("http://") || url.starts_with("https://") {
            if !self.config.allow_remote {
                return Err(LoadError::RemoteDisabled(url.to_string()));
            }
            return Ok(Source::Remote(url.to_string()));
        }

        if let Some(path) = url.strip_prefix("file://") {
            return Ok(Source::File(PathBuf::from(path)));
        }

        if let Some((scheme, _)) = url.split_once("://") {
            if scheme.len() > 1 && scheme.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(LoadError::InvalidUrl(format!("unsupported scheme: {}", scheme)));
            }
        }

        Ok(Source::File(self.config.resolve_path(Path::new(url))))
    }
}

async fn decode_bytes(bytes: Vec<u8>, extension: Option<&'static str>) -> LoadResult<Model> {
    tokio::task::spawn_blocking(move || formats::load_model(&bytes, extension)).await?
}

/// Fetches a remote model, then every sibling resource it references,
/// resolved against the model URL.
async fn load_remote(url: &str) -> LoadResult<Model> {
    let bytes = fetch(url).await?;
    let extension = url_extension(url);

    let (loader, bytes, uris) = tokio::task::spawn_blocking(move || {
        let loader = formats::find_loader(&bytes, extension).ok_or(LoadError::UnrecognizedFormat)?;
        let uris = loader.external_resources(&bytes)?;
        Ok::<_, LoadError>((loader, bytes, uris))
    })
    .await??;

    let mut resources = HashMap::new();
    if !uris.is_empty() {
        let base = reqwest::Url::parse(url).map_err(|e| LoadError::InvalidUrl(e.to_string()))?;
        for uri in uris {
            let resolved = base
                .join(&uri)
                .map_err(|e| LoadError::InvalidUrl(format!("{}: {}", uri, e)))?;
            tracing::debug!(url = %resolved, "fetching model resource");
            let data = fetch(resolved.as_str()).await?;
            resources.insert(uri, data);
        }
    }

    tokio::task::spawn_blocking(move || {
        tracing::debug!(format = loader.name(), bytes = bytes.len(), "decoding model");
        loader.load_with_resources(&bytes, &resources)
    })
    .await?
}

async fn fetch(url: &str) -> Result<Vec<u8>, LoadError> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Maps a data URI media type to a decoder extension hint.
fn data_uri_extension(uri: &str) -> Option<&'static str> {
    let mime = uri
        .strip_prefix("data:")?
        .split([';', ','])
        .next()?
        .to_ascii_lowercase();
    match mime.as_str() {
        "model/gltf-binary" => Some("glb"),
        "model/gltf+json" => Some("gltf"),
        "model/obj" | "text/x-obj" => Some("obj"),
        _ => None,
    }
}

/// Extension of the last path segment of a URL, ignoring query and fragment.
fn url_extension(url: &str) -> Option<&'static str> {
    let path = url.split(['?', '#']).next()?;
    let (_, ext) = path.rsplit('/').next()?.rsplit_once('.')?;
    formats::get_loaders()
        .iter()
        .flat_map(|loader| loader.extensions().iter())
        .find(|known| known.eq_ignore_ascii_case(ext))
        .copied()
}

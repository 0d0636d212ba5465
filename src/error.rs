//! Provides the error types shared by the loader, decoders and configuration.
//!
//! # Examples
//! ```
//! use scenery::error::LoadError;
//!
//! let err = LoadError::NoGeometry;
//! assert_eq!(format!("{}", err), "No geometry found");
//! ```

use thiserror::Error;

/// Errors that can occur while fetching or decoding a model.
///
/// Underlying I/O, HTTP and task failures are carried as-is so callers see
/// exactly what the wrapped library reported.
///
/// # Examples
/// ```
/// use scenery::error::LoadError;
///
/// let err = LoadError::UnrecognizedFormat;
/// assert_eq!(err.to_string(), "Unrecognized format");
/// ```
#[derive(Debug, Error)]
pub enum LoadError {
    /// Represents invalid or corrupted model data.
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// Indicates no decoder recognized the data.
    #[error("Unrecognized format")]
    UnrecognizedFormat,
    /// Represents an IO error reading the asset.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Indicates the decoded model contained no triangles.
    #[error("No geometry found")]
    NoGeometry,
    /// The glTF crate rejected the document or one of its resources.
    #[error(transparent)]
    Gltf(#[from] gltf::Error),
    /// The URL could not be interpreted (bad data URI, empty string).
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// A remote URL was requested while remote loading is disabled.
    #[error("Remote loading disabled: {0}")]
    RemoteDisabled(String),
    /// The HTTP request failed or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The background decode task panicked or was aborted.
    #[error("Load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// The result type for model loading.
pub type LoadResult<T = crate::formats::Model> = Result<T, LoadError>;

/// Errors raised while reading a [`LoaderConfig`](crate::config::LoaderConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// The config file is not valid TOML for this schema.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

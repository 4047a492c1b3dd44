//! # Renderer Error Types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by renderer adapters and the registry.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The file extension is unknown, or the backend cannot write it.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// No renderer is registered under that name.
    #[error("unknown renderer: {0}")]
    UnknownRenderer(String),

    /// The backend failed.
    #[error("renderer backend error: {0}")]
    Backend(String),

    /// Writing output failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File being written.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    /// Wraps an I/O error with the path it happened on.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

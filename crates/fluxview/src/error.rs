//! # FLUXVIEW Error Types
//!
//! Window, manager and configuration errors. Object and renderer errors are
//! wrapped unchanged so callers can still match on them.

use fluxview_objects::ObjectError;
use fluxview_render::RenderError;
use fluxview_shared::WindowId;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by graphics windows and the windows manager.
#[derive(Error, Debug)]
pub enum WindowError {
    /// Grid dimensions must both be at least 1.
    #[error("invalid grid {rows}x{cols}: rows and cols must be >= 1")]
    InvalidGrid {
        /// Requested rows.
        rows: usize,
        /// Requested columns.
        cols: usize,
    },

    /// Cell position outside the grid.
    #[error("position ({row}, {col}) outside {rows}x{cols} grid")]
    PositionOutOfRange {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Grid rows.
        rows: usize,
        /// Grid columns.
        cols: usize,
    },

    /// Another window is registered under this id.
    #[error("duplicate window id: {0}")]
    DuplicateWindowId(WindowId),

    /// A graphics object failed.
    #[error(transparent)]
    Object(#[from] ObjectError),

    /// A renderer failed.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result type for window operations.
pub type WindowResult<T> = Result<T, WindowError>;

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The TOML text is malformed or has unknown keys.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The file could not be read.
    #[error("cannot read configuration {path}: {source}")]
    Io {
        /// Config file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A renderer name is not registered.
    #[error("unknown renderer {name} for {setting}")]
    UnknownRenderer {
        /// Setting that names it.
        setting: &'static str,
        /// The unknown name.
        name: String,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

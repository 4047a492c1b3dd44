//! # FLUXVIEW Render
//!
//! Renderer adapters for graphics window cells.
//!
//! - [`RendererAdapter`]: the per-cell backend seam
//! - [`RendererRegistry`]: named backend factories
//! - [`backend::headless`]: the built-in recording backend
//!
//! Real plotting libraries plug in through [`RendererRegistry::register_renderer`].

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod adapter;
pub mod backend;
pub mod error;
pub mod format;
pub mod registry;

pub use adapter::{CellStyle, RenderRequest, RendererAdapter, RendererOptions, View};
pub use backend::{HeadlessLog, HeadlessRenderer, RecordedCall, SceneManifest, HEADLESS};
pub use error::{RenderError, RenderResult};
pub use format::ImageFormat;
pub use registry::{RendererFactory, RendererRegistry};

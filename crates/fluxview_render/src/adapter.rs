//! # Renderer Adapter
//!
//! The seam between a graphics window cell and a drawing backend.
//!
//! ```text
//! GraphicsWindow cell ──render(payload)──▶ RendererAdapter ──▶ backend
//!                     ──show/save──────▶
//!                     ──begin/end_animation──▶ frames on disk
//! ```
//!
//! Adapters are owned by exactly one cell. They are `Send` so a window can
//! be refreshed from the event delivery thread, but never shared.

use crate::error::RenderResult;
use crate::format::ImageFormat;
use fluxview_objects::{Dimension, Payload};
use fluxview_shared::WindowId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-cell presentation settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CellStyle {
    /// Opacity in `[0, 1]`.
    pub opacity: f64,
    /// Cell title; the object kind is used when unset.
    pub title: Option<String>,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            title: None,
        }
    }
}

impl CellStyle {
    /// Style with a title.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Opacity clamped to `[0, 1]`.
    #[must_use]
    pub fn clamped_opacity(&self) -> f64 {
        self.opacity.clamp(0.0, 1.0)
    }
}

/// Camera direction of 3D scenes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Looking down z, x to the right.
    Xy,
    /// Looking down y, x to the right.
    Xz,
    /// Looking down z, y to the right.
    Yx,
    /// Looking down x, y to the right.
    Yz,
    /// Looking down y, z to the right.
    Zx,
    /// Looking down x, z to the right.
    Zy,
    /// Isometric.
    #[default]
    Isometric,
}

/// Options an adapter is created with.
#[derive(Clone, Debug, PartialEq)]
pub struct RendererOptions {
    /// Renderer family of the cell's object.
    pub dimension: Dimension,
    /// Grid position `(row, col)` of the owning cell.
    pub position: (usize, usize),
    /// Initial camera view (ignored by 2D backends).
    pub view: View,
    /// Directory for animation output.
    pub output_dir: PathBuf,
    /// Open on-screen windows when shown.
    pub interactive: bool,
}

/// One render call.
#[derive(Clone, Copy, Debug)]
pub struct RenderRequest<'a> {
    /// Owning window, when it has an id yet.
    pub window_id: Option<&'a WindowId>,
    /// Payload to draw.
    pub payload: &'a Payload,
    /// Cell style.
    pub style: &'a CellStyle,
}

/// A drawing backend bound to one window cell.
pub trait RendererAdapter: Send {
    /// Backend name, as registered.
    fn name(&self) -> &str;

    /// Replaces the drawn scene with `request.payload`. While animating,
    /// also captures a frame.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn render(&mut self, request: &RenderRequest<'_>) -> RenderResult<()>;

    /// Presents the scene.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn show(&mut self) -> RenderResult<()>;

    /// Whether `save` can write `format`.
    fn supports(&self, format: ImageFormat) -> bool;

    /// Writes the current scene to `path`.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` when [`Self::supports`] is false, I/O failures.
    fn save(&mut self, path: &Path, format: ImageFormat) -> RenderResult<()>;

    /// Starts capturing frames. A second call while capturing is a no-op.
    ///
    /// # Errors
    ///
    /// Backend failures.
    fn begin_animation(&mut self, window_id: &WindowId) -> RenderResult<()>;

    /// Whether frames are being captured.
    fn is_animating(&self) -> bool;

    /// Stops capturing and writes the animation. `None` if not animating.
    ///
    /// # Errors
    ///
    /// I/O failures.
    fn end_animation(&mut self) -> RenderResult<Option<PathBuf>>;

    /// Releases backend resources. Frames not flushed by
    /// [`Self::end_animation`] are lost.
    fn close(&mut self);
}

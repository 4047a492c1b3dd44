//! # Headless Renderer
//!
//! Draws nothing. Every call is recorded in a [`HeadlessLog`] and scenes
//! are written as TOML manifests, which makes window behaviour observable
//! in tests and on machines without a display.
//!
//! Format support follows the usual split: 3D scenes export vector formats
//! only, 2D plots export vector and raster formats except `tex`.

use crate::adapter::{RenderRequest, RendererAdapter, RendererOptions, View};
use crate::error::{RenderError, RenderResult};
use crate::format::ImageFormat;
use fluxview_objects::Dimension;
use fluxview_shared::WindowId;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Registered name of the headless backend.
pub const HEADLESS: &str = "headless";

static NEXT_ADAPTER_ID: AtomicU64 = AtomicU64::new(1);

/// What one render produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneManifest {
    /// Owning window id, empty before the window is shown.
    pub window_id: String,
    /// Grid row.
    pub row: usize,
    /// Grid column.
    pub col: usize,
    /// Object kind.
    pub kind: String,
    /// Cell title.
    pub title: String,
    /// Cell opacity.
    pub opacity: f64,
    /// Camera view, 3D scenes only.
    pub view: Option<View>,
    /// Surfaces or curve labels drawn.
    pub surfaces: Vec<String>,
    /// Primitive count.
    pub primitives: usize,
    /// Colour range, when the kind has one.
    pub color_range: Option<[f64; 2]>,
}

/// Animation file written on `end_animation`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationManifest {
    /// Owning window id.
    pub window_id: String,
    /// Captured frames, oldest first.
    pub frames: Vec<SceneManifest>,
}

/// A recorded adapter call.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedCall {
    /// `render`.
    Render {
        /// Object kind.
        kind: String,
        /// Cell position.
        position: (usize, usize),
    },
    /// `show`.
    Show,
    /// `save`.
    Save {
        /// Output path.
        path: PathBuf,
        /// Output format.
        format: ImageFormat,
    },
    /// `begin_animation`.
    BeginAnimation {
        /// Window id.
        window_id: WindowId,
    },
    /// `end_animation`.
    EndAnimation {
        /// Written file, `None` if nothing was capturing.
        output: Option<PathBuf>,
        /// Frames written.
        frames: usize,
    },
    /// `close`.
    Close,
}

/// One log entry.
#[derive(Clone, Debug, PartialEq)]
pub struct CallRecord {
    /// Adapter instance that made the call.
    pub adapter: u64,
    /// The call.
    pub call: RecordedCall,
}

/// Shared recording of headless adapter calls.
#[derive(Clone, Debug, Default)]
pub struct HeadlessLog(Arc<Mutex<Vec<CallRecord>>>);

impl HeadlessLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, adapter: u64, call: RecordedCall) {
        self.0.lock().push(CallRecord { adapter, call });
    }

    /// Snapshot of every record.
    #[must_use]
    pub fn records(&self) -> Vec<CallRecord> {
        self.0.lock().clone()
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    /// Whether nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }

    /// Number of calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&RecordedCall) -> bool) -> usize {
        self.0.lock().iter().filter(|record| predicate(&record.call)).count()
    }

    /// Number of `render` calls.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.count(|call| matches!(call, RecordedCall::Render { .. }))
    }

    /// Kinds rendered at `position`, oldest first.
    #[must_use]
    pub fn rendered_at(&self, position: (usize, usize)) -> Vec<String> {
        self.0
            .lock()
            .iter()
            .filter_map(|record| match &record.call {
                RecordedCall::Render { kind, position: at } if *at == position => Some(kind.clone()),
                _ => None,
            })
            .collect()
    }

    /// Clears the log.
    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

struct Animation {
    window_id: WindowId,
    frames: Vec<SceneManifest>,
}

/// The headless adapter.
pub struct HeadlessRenderer {
    id: u64,
    options: RendererOptions,
    log: HeadlessLog,
    scene: Option<SceneManifest>,
    animation: Option<Animation>,
    closed: bool,
}

impl HeadlessRenderer {
    /// Creates an adapter that records into `log`.
    #[must_use]
    pub fn new(options: RendererOptions, log: HeadlessLog) -> Self {
        Self {
            id: NEXT_ADAPTER_ID.fetch_add(1, Ordering::Relaxed),
            options,
            log,
            scene: None,
            animation: None,
            closed: false,
        }
    }

    /// Current scene, if anything was rendered.
    #[must_use]
    pub fn scene(&self) -> Option<&SceneManifest> {
        self.scene.as_ref()
    }

    fn write_toml<T: Serialize>(path: &Path, value: &T) -> RenderResult<()> {
        let text = toml::to_string_pretty(value).map_err(|err| RenderError::Backend(err.to_string()))?;
        std::fs::write(path, text).map_err(|err| RenderError::io(path, err))
    }
}

impl RendererAdapter for HeadlessRenderer {
    fn name(&self) -> &str {
        HEADLESS
    }

    fn render(&mut self, request: &RenderRequest<'_>) -> RenderResult<()> {
        let payload = request.payload;
        let (row, col) = self.options.position;
        let scene = SceneManifest {
            window_id: request.window_id.map(ToString::to_string).unwrap_or_default(),
            row,
            col,
            kind: payload.kind().to_string(),
            title: request
                .style
                .title
                .clone()
                .unwrap_or_else(|| payload.kind().to_string()),
            opacity: request.style.clamped_opacity(),
            view: (self.options.dimension == Dimension::ThreeD).then_some(self.options.view),
            surfaces: payload.surface_names(),
            primitives: payload.primitive_count(),
            color_range: payload.color_range().map(|(lo, hi)| [lo, hi]),
        };
        self.log.push(
            self.id,
            RecordedCall::Render {
                kind: scene.kind.clone(),
                position: self.options.position,
            },
        );
        if let Some(animation) = &mut self.animation {
            animation.frames.push(scene.clone());
        }
        self.scene = Some(scene);
        Ok(())
    }

    fn show(&mut self) -> RenderResult<()> {
        if self.options.interactive {
            tracing::debug!(adapter = self.id, "headless renderer has no display, show is recorded only");
        }
        self.log.push(self.id, RecordedCall::Show);
        Ok(())
    }

    fn supports(&self, format: ImageFormat) -> bool {
        match self.options.dimension {
            Dimension::ThreeD => format.is_vector(),
            Dimension::TwoD => format != ImageFormat::Tex,
        }
    }

    fn save(&mut self, path: &Path, format: ImageFormat) -> RenderResult<()> {
        if !self.supports(format) {
            return Err(RenderError::UnsupportedFormat(format!(
                "{HEADLESS} {:?} renderer cannot write {format}",
                self.options.dimension
            )));
        }
        let scene = self
            .scene
            .as_ref()
            .ok_or_else(|| RenderError::Backend("nothing rendered yet".to_string()))?;
        Self::write_toml(path, scene)?;
        self.log.push(
            self.id,
            RecordedCall::Save {
                path: path.to_path_buf(),
                format,
            },
        );
        Ok(())
    }

    fn begin_animation(&mut self, window_id: &WindowId) -> RenderResult<()> {
        if self.animation.is_some() {
            return Ok(());
        }
        // The scene on screen is the first frame.
        let frames = self.scene.iter().cloned().collect();
        self.animation = Some(Animation {
            window_id: window_id.clone(),
            frames,
        });
        self.log.push(
            self.id,
            RecordedCall::BeginAnimation {
                window_id: window_id.clone(),
            },
        );
        Ok(())
    }

    fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    fn end_animation(&mut self) -> RenderResult<Option<PathBuf>> {
        let Some(animation) = self.animation.take() else {
            return Ok(None);
        };
        let (row, col) = self.options.position;
        std::fs::create_dir_all(&self.options.output_dir)
            .map_err(|err| RenderError::io(&self.options.output_dir, err))?;
        let path = self
            .options
            .output_dir
            .join(format!("{}-{row}-{col}.animation.toml", animation.window_id));
        let frames = animation.frames.len();
        Self::write_toml(
            &path,
            &AnimationManifest {
                window_id: animation.window_id.to_string(),
                frames: animation.frames,
            },
        )?;
        self.log.push(
            self.id,
            RecordedCall::EndAnimation {
                output: Some(path.clone()),
                frames,
            },
        );
        Ok(Some(path))
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(animation) = self.animation.take() {
            tracing::warn!(
                window_id = %animation.window_id,
                frames = animation.frames.len(),
                "headless renderer closed while animating, frames discarded"
            );
        }
        self.log.push(self.id, RecordedCall::Close);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::CellStyle;
    use fluxview_objects::{GraphicsObject, MeshProps, MonitorProps};
    use fluxview_shared::SimulatedSession;

    fn options(dimension: Dimension, dir: &Path) -> RendererOptions {
        RendererOptions {
            dimension,
            position: (0, 1),
            view: View::Isometric,
            output_dir: dir.to_path_buf(),
            interactive: false,
        }
    }

    #[test]
    fn test_render_and_save_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let log = HeadlessLog::new();
        let mut renderer = HeadlessRenderer::new(options(Dimension::ThreeD, dir.path()), log.clone());

        let session = SimulatedSession::duct("s1");
        let payload = GraphicsObject::new(session, MeshProps::of(["wall"]))
            .unwrap()
            .fetch_payload()
            .unwrap();
        let id = WindowId::new("w1");
        renderer
            .render(&RenderRequest {
                window_id: Some(&id),
                payload: &payload,
                style: &CellStyle::titled("wall mesh"),
            })
            .unwrap();

        let path = dir.path().join("scene.svg");
        renderer.save(&path, ImageFormat::Svg).unwrap();
        let written: SceneManifest = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.title, "wall mesh");
        assert_eq!(written.primitives, 8);
        assert_eq!((written.row, written.col), (0, 1));
        assert_eq!(written.view, Some(View::Isometric));
        assert_eq!(log.rendered_at((0, 1)), vec!["mesh".to_string()]);
    }

    #[test]
    fn test_format_support_by_dimension() {
        let dir = tempfile::tempdir().unwrap();
        let scene = HeadlessRenderer::new(options(Dimension::ThreeD, dir.path()), HeadlessLog::new());
        let plot = HeadlessRenderer::new(options(Dimension::TwoD, dir.path()), HeadlessLog::new());
        assert!(scene.supports(ImageFormat::Tex));
        assert!(!scene.supports(ImageFormat::Png));
        assert!(plot.supports(ImageFormat::Png));
        assert!(!plot.supports(ImageFormat::Tex));
    }

    #[test]
    fn test_save_before_render_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut renderer = HeadlessRenderer::new(options(Dimension::TwoD, dir.path()), HeadlessLog::new());
        assert!(matches!(
            renderer.save(&dir.path().join("a.png"), ImageFormat::Png),
            Err(RenderError::Backend(_))
        ));
    }

    #[test]
    fn test_animation_frames_written_on_end() {
        let dir = tempfile::tempdir().unwrap();
        let log = HeadlessLog::new();
        let mut renderer = HeadlessRenderer::new(options(Dimension::TwoD, dir.path()), log.clone());
        let session = SimulatedSession::duct("s1");
        let monitor = GraphicsObject::new(session.clone(), MonitorProps::of("residual")).unwrap();
        let style = CellStyle::default();
        let id = WindowId::new("w2");

        renderer.begin_animation(&id).unwrap();
        for _ in 0..3 {
            session.advance(1.0);
            let payload = monitor.fetch_payload().unwrap();
            renderer
                .render(&RenderRequest {
                    window_id: Some(&id),
                    payload: &payload,
                    style: &style,
                })
                .unwrap();
        }

        let path = renderer.end_animation().unwrap().unwrap();
        assert_eq!(path, dir.path().join("w2-0-1.animation.toml"));
        let written: AnimationManifest = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.frames.len(), 3);
        assert_eq!(renderer.end_animation().unwrap(), None);
    }

    #[test]
    fn test_close_discards_frames() {
        let dir = tempfile::tempdir().unwrap();
        let log = HeadlessLog::new();
        let mut renderer = HeadlessRenderer::new(options(Dimension::ThreeD, dir.path()), log.clone());
        renderer.begin_animation(&WindowId::new("w3")).unwrap();
        renderer.close();
        renderer.close();
        assert!(!renderer.is_animating());
        assert_eq!(log.count(|call| *call == RecordedCall::Close), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}

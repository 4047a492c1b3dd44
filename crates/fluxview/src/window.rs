//! # Graphics Window
//!
//! A grid of cells, each holding at most one graphics object and, once
//! drawn, its own renderer adapter.
//!
//! ```text
//! ┌──────────────┬──────────────┐
//! │ (0,0) mesh   │ (0,1) contour│   each cell: object + style + adapter
//! ├──────────────┼──────────────┤
//! │ (1,0) xy-plot│ (1,1) empty  │
//! └──────────────┴──────────────┘
//! ```
//!
//! [`GraphicsWindow`] is a handle. The window state lives behind its own
//! mutex and is shared with the [`WindowsManager`] once shown, so event
//! driven refreshes reach it without the caller's handle.
//!
//! ## Lock order
//!
//! Window state, then the manager registry. The manager never locks a
//! window while holding the registry.

use crate::config::VizConfig;
use crate::error::{WindowError, WindowResult};
use crate::events::{CallbackId, EventBridge};
use crate::manager::WindowsManager;
use fluxview_objects::SharedGraphics;
use fluxview_render::{
    CellStyle, ImageFormat, RenderError, RenderRequest, RendererAdapter, RendererOptions,
    RendererRegistry,
};
use fluxview_shared::{SessionId, SolverEvent, WindowId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Label prefix used in file names and logs before a window has an id.
const UNSHOWN_LABEL: &str = "unshown";

static NEXT_WINDOW_ORDINAL: AtomicU64 = AtomicU64::new(1);

/// Shared window state.
pub(crate) type CoreHandle = Arc<Mutex<WindowCore>>;

/// What a render needs from the manager.
pub(crate) struct RenderContext {
    pub(crate) registry: Arc<RendererRegistry>,
    pub(crate) config: VizConfig,
}

/// A per-cell problem that did not fail the whole operation.
#[derive(Clone, Debug, PartialEq)]
pub struct CellWarning {
    /// Window id, if the window had one.
    pub window_id: Option<WindowId>,
    /// Cell position.
    pub position: (usize, usize),
    /// What went wrong.
    pub message: String,
}

/// Outcome of one window refresh.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Window id, if the window had one.
    pub window_id: Option<WindowId>,
    /// Cells re-rendered.
    pub rendered: usize,
    /// Cells skipped because their session disconnected.
    pub warnings: Vec<CellWarning>,
    /// Cells whose fetch or render failed. The other cells were still
    /// refreshed.
    pub failed: Vec<((usize, usize), WindowError)>,
}

impl RefreshReport {
    /// Whether no cell failed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    /// The first cell failure as an error, otherwise the report.
    ///
    /// # Errors
    ///
    /// The error of the first failed cell.
    pub fn into_result(mut self) -> WindowResult<Self> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(self.failed.remove(0).1)
        }
    }
}

struct Cell {
    object: SharedGraphics,
    style: CellStyle,
    adapter: Option<Box<dyn RendererAdapter>>,
}

impl Cell {
    fn adapter(
        &mut self,
        position: (usize, usize),
        renderer: Option<&str>,
        ctx: &RenderContext,
    ) -> WindowResult<&mut Box<dyn RendererAdapter>> {
        let adapter = match self.adapter.take() {
            Some(adapter) => adapter,
            None => {
                let dimension = self.object.dimension();
                let name = renderer.unwrap_or_else(|| ctx.config.renderer_for(dimension));
                let options = RendererOptions {
                    dimension,
                    position,
                    view: ctx.config.view,
                    output_dir: ctx.config.output_dir.clone(),
                    interactive: ctx.config.interactive,
                };
                tracing::debug!(renderer = name, ?position, "creating renderer adapter");
                ctx.registry.create(name, &options)?
            }
        };
        Ok(self.adapter.insert(adapter))
    }

    fn release(&mut self) {
        if let Some(mut adapter) = self.adapter.take() {
            adapter.close();
        }
    }
}

/// Window state guarded by the window mutex.
pub(crate) struct WindowCore {
    pub(crate) id: Option<WindowId>,
    pub(crate) registered: bool,
    ordinal: u64,
    rows: usize,
    cols: usize,
    renderer: Option<String>,
    cells: BTreeMap<(usize, usize), Cell>,
}

impl WindowCore {
    fn new(id: Option<WindowId>, rows: usize, cols: usize, renderer: Option<String>) -> Self {
        Self {
            id,
            registered: false,
            ordinal: NEXT_WINDOW_ORDINAL.fetch_add(1, Ordering::Relaxed),
            rows,
            cols,
            renderer,
            cells: BTreeMap::new(),
        }
    }

    /// The id, or a process-unique placeholder before the window has one.
    fn label(&self) -> WindowId {
        self.id
            .clone()
            .unwrap_or_else(|| WindowId::new(format!("{UNSHOWN_LABEL}-{}", self.ordinal)))
    }

    pub(crate) fn is_bound_to(&self, session: &SessionId) -> bool {
        self.cells.values().any(|cell| cell.object.session_id() == *session)
    }

    fn sessions(&self) -> BTreeSet<SessionId> {
        self.cells.values().map(|cell| cell.object.session_id()).collect()
    }

    fn draw(
        cell: &mut Cell,
        position: (usize, usize),
        window_id: Option<&WindowId>,
        renderer: Option<&str>,
        ctx: &RenderContext,
    ) -> WindowResult<()> {
        let payload = cell.object.fetch_payload()?;
        let style = cell.style.clone();
        cell.adapter(position, renderer, ctx)?.render(&RenderRequest {
            window_id,
            payload: &payload,
            style: &style,
        })?;
        Ok(())
    }

    fn show_cells(&mut self, ctx: &RenderContext) -> WindowResult<usize> {
        let Self { id, renderer, cells, .. } = self;
        for (&position, cell) in cells.iter_mut() {
            Self::draw(cell, position, id.as_ref(), renderer.as_deref(), ctx)?;
            cell.adapter(position, renderer.as_deref(), ctx)?.show()?;
        }
        Ok(cells.len())
    }

    /// Never stops at a failing cell; failures are collected in the report.
    pub(crate) fn refresh(&mut self, session: &SessionId, ctx: &RenderContext) -> RefreshReport {
        let Self { id, renderer, cells, .. } = self;
        let mut report = RefreshReport {
            window_id: id.clone(),
            ..RefreshReport::default()
        };
        for (&position, cell) in cells.iter_mut() {
            if cell.object.session_id() != *session {
                continue;
            }
            match Self::draw(cell, position, id.as_ref(), renderer.as_deref(), ctx) {
                Ok(()) => report.rendered += 1,
                Err(WindowError::Object(err)) if err.is_disconnect() => {
                    tracing::warn!(
                        window_id = ?id,
                        session_id = %session,
                        ?position,
                        "session disconnected, cell skipped"
                    );
                    report.warnings.push(CellWarning {
                        window_id: id.clone(),
                        position,
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    tracing::warn!(
                        window_id = ?id,
                        session_id = %session,
                        ?position,
                        error = %err,
                        "cell refresh failed"
                    );
                    report.failed.push((position, err));
                }
            }
        }
        report
    }

    pub(crate) fn animate(&mut self, session: &SessionId, ctx: &RenderContext) -> WindowResult<usize> {
        let label = self.label();
        let Self { renderer, cells, .. } = self;
        let mut started = 0;
        for (&position, cell) in cells.iter_mut() {
            if cell.object.session_id() != *session {
                continue;
            }
            cell.adapter(position, renderer.as_deref(), ctx)?.begin_animation(&label)?;
            started += 1;
        }
        tracing::debug!(window_id = %label, session_id = %session, cells = started, "animation started");
        Ok(started)
    }

    fn save(&mut self, path: &Path, ctx: &RenderContext) -> WindowResult<Vec<PathBuf>> {
        let format = ImageFormat::from_path(path)?;
        if self.cells.is_empty() {
            return Err(RenderError::Backend("window has no graphics to save".to_string()).into());
        }

        let Self { id, renderer, cells, .. } = self;
        for (&position, cell) in cells.iter_mut() {
            if cell.adapter.is_none() {
                Self::draw(cell, position, id.as_ref(), renderer.as_deref(), ctx)?;
            }
        }
        let unsupported = cells
            .values()
            .filter_map(|cell| cell.adapter.as_ref())
            .find(|adapter| !adapter.supports(format));
        if let Some(adapter) = unsupported {
            return Err(RenderError::UnsupportedFormat(format!(
                "{} renderer cannot write {format}",
                adapter.name()
            ))
            .into());
        }

        let single = cells.len() == 1;
        let mut written = Vec::with_capacity(cells.len());
        for (&(row, col), cell) in cells.iter_mut() {
            let target = if single { path.to_path_buf() } else { cell_path(path, row, col, format) };
            cell.adapter((row, col), renderer.as_deref(), ctx)?.save(&target, format)?;
            written.push(target);
        }
        Ok(written)
    }

    /// Flushes animations and releases every adapter. The first flush
    /// error is returned after all cells are released.
    pub(crate) fn close_cells(&mut self) -> (Vec<PathBuf>, Option<WindowError>) {
        let mut outputs = Vec::new();
        let mut first_error = None;
        for (position, cell) in &mut self.cells {
            if let Some(adapter) = cell.adapter.as_mut() {
                match adapter.end_animation() {
                    Ok(Some(path)) => outputs.push(path),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(window_id = ?self.id, ?position, error = %err, "animation flush failed");
                        if first_error.is_none() {
                            first_error = Some(WindowError::Render(err));
                        }
                    }
                }
            }
            cell.release();
        }
        (outputs, first_error)
    }
}

impl Drop for WindowCore {
    fn drop(&mut self) {
        let lost = self
            .cells
            .values()
            .filter(|cell| cell.adapter.as_ref().is_some_and(|a| a.is_animating()))
            .count();
        if lost > 0 {
            tracing::warn!(
                window_id = %self.label(),
                cells = lost,
                "window dropped without close(), animation frames lost"
            );
        }
        for cell in self.cells.values_mut() {
            cell.release();
        }
    }
}

fn cell_path(path: &Path, row: usize, col: usize, format: ImageFormat) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("graphics");
    path.with_file_name(format!("{stem}_{row}_{col}.{}", format.extension()))
}

/// Closes a window core and reports what to unregister.
pub(crate) fn close_core(core: &CoreHandle) -> (Vec<PathBuf>, Option<WindowError>, Option<WindowId>) {
    let mut core = core.lock();
    let (outputs, error) = core.close_cells();
    let unregister = if core.registered { core.id.clone() } else { None };
    core.registered = false;
    (outputs, error, unregister)
}

/// Builder for [`GraphicsWindow`].
pub struct GraphicsWindowBuilder {
    manager: Arc<WindowsManager>,
    rows: usize,
    cols: usize,
    id: Option<WindowId>,
    renderer: Option<String>,
}

impl GraphicsWindowBuilder {
    /// Grid dimensions. Both must be at least 1.
    #[must_use]
    pub fn grid(mut self, rows: usize, cols: usize) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    /// Registers under this id on `show` instead of a generated one.
    #[must_use]
    pub fn id(mut self, id: impl Into<WindowId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Uses this renderer for every cell, whatever the object dimension.
    #[must_use]
    pub fn renderer(mut self, name: impl Into<String>) -> Self {
        self.renderer = Some(name.into());
        self
    }

    /// Builds the window.
    ///
    /// # Errors
    ///
    /// [`WindowError::InvalidGrid`] when rows or cols is 0.
    pub fn build(self) -> WindowResult<GraphicsWindow> {
        if self.rows == 0 || self.cols == 0 {
            return Err(WindowError::InvalidGrid {
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(GraphicsWindow {
            core: Arc::new(Mutex::new(WindowCore::new(self.id, self.rows, self.cols, self.renderer))),
            manager: self.manager,
        })
    }
}

/// A grid of graphics objects shown through renderer adapters.
pub struct GraphicsWindow {
    core: CoreHandle,
    manager: Arc<WindowsManager>,
}

impl std::fmt::Debug for GraphicsWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.core.lock();
        f.debug_struct("GraphicsWindow")
            .field("id", &core.id)
            .field("grid", &(core.rows, core.cols))
            .field("cells", &core.cells.len())
            .finish()
    }
}

impl GraphicsWindow {
    /// Starts a window builder.
    #[must_use]
    pub fn builder(manager: &Arc<WindowsManager>) -> GraphicsWindowBuilder {
        GraphicsWindowBuilder {
            manager: Arc::clone(manager),
            rows: 1,
            cols: 1,
            id: None,
            renderer: None,
        }
    }

    /// A 1x1 window.
    #[must_use]
    pub fn new(manager: &Arc<WindowsManager>) -> Self {
        Self::from_core(Arc::new(Mutex::new(WindowCore::new(None, 1, 1, None))), Arc::clone(manager))
    }

    /// A `rows` x `cols` window.
    ///
    /// # Errors
    ///
    /// [`WindowError::InvalidGrid`] when rows or cols is 0.
    pub fn with_grid(manager: &Arc<WindowsManager>, rows: usize, cols: usize) -> WindowResult<Self> {
        Self::builder(manager).grid(rows, cols).build()
    }

    pub(crate) fn from_core(core: CoreHandle, manager: Arc<WindowsManager>) -> Self {
        Self { core, manager }
    }

    pub(crate) fn core(&self) -> &CoreHandle {
        &self.core
    }

    /// Window id: the builder id, or the generated one after `show`.
    #[must_use]
    pub fn id(&self) -> Option<WindowId> {
        self.core.lock().id.clone()
    }

    /// Grid dimensions `(rows, cols)`.
    #[must_use]
    pub fn grid(&self) -> (usize, usize) {
        let core = self.core.lock();
        (core.rows, core.cols)
    }

    /// Whether the window is registered with the manager.
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.core.lock().registered
    }

    /// Object at `position`.
    #[must_use]
    pub fn graphics_at(&self, position: (usize, usize)) -> Option<SharedGraphics> {
        self.core.lock().cells.get(&position).map(|cell| cell.object.clone())
    }

    /// Sessions bound to the window's cells, sorted.
    #[must_use]
    pub fn sessions(&self) -> Vec<SessionId> {
        self.core.lock().sessions().into_iter().collect()
    }

    /// Places `object` at `position` with the default style.
    ///
    /// # Errors
    ///
    /// [`WindowError::PositionOutOfRange`] outside the grid.
    pub fn add_graphics(&self, object: impl Into<SharedGraphics>, position: (usize, usize)) -> WindowResult<()> {
        self.add_graphics_with(object, position, CellStyle::default())
    }

    /// Places `object` at `position`. An occupied cell is overwritten and
    /// its adapter released.
    ///
    /// # Errors
    ///
    /// [`WindowError::PositionOutOfRange`] outside the grid.
    pub fn add_graphics_with(
        &self,
        object: impl Into<SharedGraphics>,
        position: (usize, usize),
        style: CellStyle,
    ) -> WindowResult<()> {
        let mut core = self.core.lock();
        let (row, col) = position;
        if row >= core.rows || col >= core.cols {
            return Err(WindowError::PositionOutOfRange {
                row,
                col,
                rows: core.rows,
                cols: core.cols,
            });
        }
        let cell = Cell {
            object: object.into(),
            style,
            adapter: None,
        };
        if let Some(mut previous) = core.cells.insert(position, cell) {
            tracing::debug!(window_id = ?core.id, ?position, "cell overwritten");
            previous.release();
        }
        Ok(())
    }

    /// Renders and shows every populated cell, then registers the window.
    ///
    /// Returns the id the window is registered under.
    ///
    /// # Errors
    ///
    /// [`WindowError::DuplicateWindowId`] when the builder id is taken,
    /// otherwise the first cell's object or renderer error.
    pub fn show(&self) -> WindowResult<WindowId> {
        let ctx = self.manager.context();
        let id = {
            let mut core = self.core.lock();
            let id = match (core.registered, core.id.clone()) {
                (true, Some(id)) => id,
                (_, Some(id)) => {
                    self.manager.register_core(id.clone(), Arc::clone(&self.core))?;
                    id
                }
                (_, None) => self.manager.register_generated(Arc::clone(&self.core)),
            };
            core.id = Some(id.clone());
            core.registered = true;
            let cells = core.show_cells(&ctx)?;
            tracing::info!(window_id = %id, cells, "window shown");
            id
        };
        if ctx.config.single_window {
            self.manager.close_others(&id);
        }
        Ok(id)
    }

    /// Alias of [`Self::show`].
    ///
    /// # Errors
    ///
    /// As [`Self::show`].
    pub fn display(&self) -> WindowResult<WindowId> {
        self.show()
    }

    /// Re-fetches and re-renders the cells bound to `session`. Other cells
    /// are untouched. Cells whose session disconnected are skipped with a
    /// warning in the report; a cell that fails is recorded in
    /// [`RefreshReport::failed`] and the remaining cells are still drawn.
    #[must_use = "cell failures are only reported, never raised"]
    pub fn refresh(&self, session: &SessionId) -> RefreshReport {
        let ctx = self.manager.context();
        self.core.lock().refresh(session, &ctx)
    }

    /// Starts frame capture on cells bound to `session`. Frames are written
    /// by [`Self::close`] only.
    ///
    /// Returns the number of cells capturing.
    ///
    /// # Errors
    ///
    /// Renderer errors.
    pub fn animate(&self, session: &SessionId) -> WindowResult<usize> {
        let ctx = self.manager.context();
        self.core.lock().animate(session, &ctx)
    }

    /// Saves the window to `path`, format from the extension. Unshown cells
    /// are rendered first. With more than one cell each is written to
    /// `<stem>_<row>_<col>.<ext>` next to `path`.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` for unknown extensions or formats a cell's
    /// backend cannot write.
    pub fn save_graphics(&self, path: impl AsRef<Path>) -> WindowResult<Vec<PathBuf>> {
        let ctx = self.manager.context();
        self.core.lock().save(path.as_ref(), &ctx)
    }

    /// Flushes animations, releases adapters and unregisters the window.
    /// Returns the animation files written. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// The first animation flush error; every adapter is released anyway.
    pub fn close(&self) -> WindowResult<Vec<PathBuf>> {
        let (outputs, error, unregister) = close_core(&self.core);
        if let Some(id) = unregister {
            self.manager.unregister(&id);
            tracing::info!(window_id = %id, animations = outputs.len(), "window closed");
        }
        match error {
            Some(err) => Err(err),
            None => Ok(outputs),
        }
    }

    /// Registers a refresh of this window on `bridge` for every bound
    /// session and each of `events`.
    ///
    /// The callbacks hold the window weakly; once it is gone they do
    /// nothing.
    pub fn real_time_update(&self, bridge: &EventBridge, events: &[SolverEvent]) -> Vec<CallbackId> {
        let sessions = self.core.lock().sessions();
        let mut ids = Vec::with_capacity(sessions.len() * events.len());
        for session in sessions {
            for &event in events {
                let core: Weak<Mutex<WindowCore>> = Arc::downgrade(&self.core);
                let manager = Arc::clone(&self.manager);
                ids.push(bridge.register_callback(session.clone(), event, move |notification| {
                    if let Some(core) = core.upgrade() {
                        let ctx = manager.context();
                        core.lock().refresh(&notification.session, &ctx).into_result()?;
                    }
                    Ok(())
                }));
            }
        }
        ids
    }
}

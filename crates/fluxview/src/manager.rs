//! # Graphics Windows Manager
//!
//! Registry of shown windows, and the fan-out point for event driven
//! refreshes and animation.
//!
//! ```text
//!             refresh_windows(session)
//!                      │
//!        ┌─────────────┴─────────────┐
//!        │ lock registry, snapshot,  │
//!        │ unlock                    │
//!        └─────────────┬─────────────┘
//!        ┌─────────────┼─────────────┐
//!        ▼             ▼             ▼
//!    window-1      window-2      window-3     each under its own lock;
//!                                             one failing never stops
//!                                             the others
//! ```

use crate::config::VizConfig;
use crate::error::{ConfigResult, WindowError, WindowResult};
use crate::window::{close_core, CellWarning, CoreHandle, GraphicsWindow, RenderContext};
use fluxview_render::RendererRegistry;
use fluxview_shared::{SessionId, WindowId};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Outcome of a manager fan-out over several windows.
#[derive(Debug, Default)]
pub struct FanOutReport {
    /// Windows that completed.
    pub succeeded: Vec<WindowId>,
    /// Failures, one entry per failed window or cell.
    pub failed: Vec<(WindowId, WindowError)>,
    /// Cells skipped inside otherwise successful windows.
    pub warnings: Vec<CellWarning>,
    /// Animation files written (close only).
    pub outputs: Vec<PathBuf>,
}

impl FanOutReport {
    /// Whether every window completed.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Registry of shown graphics windows.
pub struct WindowsManager {
    windows: Mutex<HashMap<WindowId, CoreHandle>>,
    registry: Arc<RendererRegistry>,
    config: RwLock<VizConfig>,
}

impl std::fmt::Debug for WindowsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowsManager")
            .field("windows", &self.window_ids())
            .field("config", &*self.config.read())
            .finish_non_exhaustive()
    }
}

impl WindowsManager {
    /// Creates a manager.
    ///
    /// # Errors
    ///
    /// [`crate::ConfigError::UnknownRenderer`] when the config names a
    /// renderer `registry` does not have.
    pub fn new(registry: Arc<RendererRegistry>, config: VizConfig) -> ConfigResult<Arc<Self>> {
        config.validate(&registry)?;
        Ok(Arc::new(Self {
            windows: Mutex::new(HashMap::new()),
            registry,
            config: RwLock::new(config),
        }))
    }

    /// Manager with the headless backend and default settings, with the
    /// blocking environment override applied.
    #[must_use]
    pub fn with_defaults() -> Arc<Self> {
        let config = VizConfig::default()
            .with_blocking_flag(std::env::var(crate::config::BLOCKING_ENV).ok().as_deref());
        Arc::new(Self {
            windows: Mutex::new(HashMap::new()),
            registry: Arc::new(RendererRegistry::new()),
            config: RwLock::new(config),
        })
    }

    /// The renderer registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<RendererRegistry> {
        &self.registry
    }

    /// Current settings.
    #[must_use]
    pub fn config(&self) -> VizConfig {
        self.config.read().clone()
    }

    /// Replaces the settings. Adapters already created keep theirs.
    ///
    /// # Errors
    ///
    /// As [`VizConfig::validate`].
    pub fn set_config(&self, config: VizConfig) -> ConfigResult<()> {
        config.validate(&self.registry)?;
        *self.config.write() = config;
        Ok(())
    }

    pub(crate) fn context(&self) -> RenderContext {
        RenderContext {
            registry: Arc::clone(&self.registry),
            config: self.config(),
        }
    }

    /// Registers `window` under `id`. A window already registered under
    /// another id moves to the new one.
    ///
    /// # Errors
    ///
    /// [`WindowError::DuplicateWindowId`] when another window holds `id`.
    pub fn register(&self, id: impl Into<WindowId>, window: &GraphicsWindow) -> WindowResult<()> {
        let id = id.into();
        let mut core = window.core().lock();
        if core.registered && core.id.as_ref() == Some(&id) {
            return Ok(());
        }
        self.register_core(id.clone(), Arc::clone(window.core()))?;
        if core.registered {
            // The window lock is held here, so drop the old entry directly.
            if let Some(old) = core.id.take() {
                self.windows.lock().remove(&old);
            }
        }
        core.id = Some(id);
        core.registered = true;
        Ok(())
    }

    pub(crate) fn register_core(&self, id: WindowId, core: CoreHandle) -> WindowResult<()> {
        let mut windows = self.windows.lock();
        if windows.contains_key(&id) {
            return Err(WindowError::DuplicateWindowId(id));
        }
        tracing::debug!(window_id = %id, "window registered");
        windows.insert(id, core);
        Ok(())
    }

    /// Registers under the lowest free `window-N`.
    pub(crate) fn register_generated(&self, core: CoreHandle) -> WindowId {
        let mut windows = self.windows.lock();
        let id = Self::lowest_free_id(&windows);
        tracing::debug!(window_id = %id, "window registered");
        windows.insert(id.clone(), core);
        id
    }

    fn lowest_free_id(windows: &HashMap<WindowId, CoreHandle>) -> WindowId {
        (1..)
            .map(WindowId::generated)
            .find(|id| !windows.contains_key(id))
            .unwrap_or_else(|| WindowId::generated(windows.len() + 1))
    }

    /// Removes `id`. Returns whether it was registered; absent ids are a
    /// no-op.
    pub fn unregister(&self, id: &WindowId) -> bool {
        let removed = self.windows.lock().remove(id);
        match removed {
            Some(core) => {
                // The registry lock is released before touching the window.
                let mut core = core.lock();
                if core.id.as_ref() == Some(id) {
                    core.registered = false;
                }
                true
            }
            None => false,
        }
    }

    /// A handle to a registered window.
    #[must_use]
    pub fn get_window(self: &Arc<Self>, id: &WindowId) -> Option<GraphicsWindow> {
        let core = self.windows.lock().get(id).cloned()?;
        Some(GraphicsWindow::from_core(core, Arc::clone(self)))
    }

    /// Registered ids, sorted.
    #[must_use]
    pub fn window_ids(&self) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self.windows.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// The id the next unnamed window would get.
    #[must_use]
    pub fn unique_window_id(&self) -> WindowId {
        Self::lowest_free_id(&self.windows.lock())
    }

    /// Number of registered windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.lock().len()
    }

    /// Whether no window is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.lock().is_empty()
    }

    fn snapshot(&self, window_ids: Option<&[WindowId]>) -> Vec<(WindowId, CoreHandle)> {
        let windows = self.windows.lock();
        let mut snapshot: Vec<(WindowId, CoreHandle)> = match window_ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| windows.get(id).map(|core| (id.clone(), Arc::clone(core))))
                .collect(),
            None => windows
                .iter()
                .map(|(id, core)| (id.clone(), Arc::clone(core)))
                .collect(),
        };
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));
        snapshot
    }

    /// Refreshes the cells bound to `session` in the given windows, or in
    /// every registered window. A window with a failing cell is reported
    /// once per failed cell; its other cells are still refreshed.
    pub fn refresh_windows(&self, session: &SessionId, window_ids: Option<&[WindowId]>) -> FanOutReport {
        let ctx = self.context();
        let mut report = FanOutReport::default();
        for (id, core) in self.snapshot(window_ids) {
            let refresh = core.lock().refresh(session, &ctx);
            report.warnings.extend(refresh.warnings);
            if refresh.failed.is_empty() {
                report.succeeded.push(id);
                continue;
            }
            tracing::warn!(
                window_id = %id,
                session_id = %session,
                cells = refresh.failed.len(),
                "window refresh failed"
            );
            report
                .failed
                .extend(refresh.failed.into_iter().map(|(_, err)| (id.clone(), err)));
        }
        report
    }

    /// Starts animation on the cells bound to `session` in the given
    /// windows, or in every registered window.
    pub fn animate_windows(&self, session: &SessionId, window_ids: Option<&[WindowId]>) -> FanOutReport {
        let ctx = self.context();
        let mut report = FanOutReport::default();
        for (id, core) in self.snapshot(window_ids) {
            let result = core.lock().animate(session, &ctx);
            match result {
                Ok(_) => report.succeeded.push(id),
                Err(err) => {
                    tracing::warn!(window_id = %id, session_id = %session, error = %err, "window animation failed");
                    report.failed.push((id, err));
                }
            }
        }
        report
    }

    /// Closes the given windows, or every window, that show data from
    /// `session`.
    pub fn close_windows(&self, session: &SessionId, window_ids: Option<&[WindowId]>) -> FanOutReport {
        let mut report = FanOutReport::default();
        for (id, core) in self.snapshot(window_ids) {
            if !core.lock().is_bound_to(session) {
                continue;
            }
            self.close_one(id, &core, &mut report);
        }
        report
    }

    /// Closes every window except `keep`.
    pub(crate) fn close_others(&self, keep: &WindowId) {
        let mut report = FanOutReport::default();
        for (id, core) in self.snapshot(None) {
            if id != *keep {
                self.close_one(id, &core, &mut report);
            }
        }
    }

    fn close_one(&self, id: WindowId, core: &CoreHandle, report: &mut FanOutReport) {
        let (outputs, error, unregister) = close_core(core);
        if let Some(registered) = unregister {
            self.unregister(&registered);
        }
        report.outputs.extend(outputs);
        match error {
            Some(err) => {
                tracing::warn!(window_id = %id, error = %err, "window close failed");
                report.failed.push((id, err));
            }
            None => report.succeeded.push(id),
        }
    }
}

//! # Renderer Registry
//!
//! Named adapter factories. Windows ask the registry for a fresh adapter
//! per cell, by the name configured for the object's dimension.
//!
//! The `headless` backend is always registered. Its recording log is shared
//! by every adapter the registry creates, see [`RendererRegistry::headless_log`].

use crate::adapter::{RendererAdapter, RendererOptions};
use crate::backend::{HeadlessLog, HeadlessRenderer, HEADLESS};
use crate::error::{RenderError, RenderResult};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Creates adapters for one backend.
pub type RendererFactory =
    Arc<dyn Fn(&RendererOptions) -> RenderResult<Box<dyn RendererAdapter>> + Send + Sync>;

/// Registry of renderer backends.
pub struct RendererRegistry {
    factories: RwLock<BTreeMap<String, RendererFactory>>,
    headless_log: HeadlessLog,
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field("renderers", &self.names())
            .finish_non_exhaustive()
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererRegistry {
    /// Registry with the headless backend.
    #[must_use]
    pub fn new() -> Self {
        let headless_log = HeadlessLog::new();
        let log = headless_log.clone();
        let registry = Self {
            factories: RwLock::new(BTreeMap::new()),
            headless_log,
        };
        registry.register_renderer(HEADLESS, move |options: &RendererOptions| {
            Ok(Box::new(HeadlessRenderer::new(options.clone(), log.clone())) as Box<dyn RendererAdapter>)
        });
        registry
    }

    /// Registers (or replaces) a backend.
    pub fn register_renderer<F>(&self, name: impl Into<String>, factory: F)
    where
        F: Fn(&RendererOptions) -> RenderResult<Box<dyn RendererAdapter>> + Send + Sync + 'static,
    {
        let name = name.into();
        tracing::debug!(renderer = %name, "registering renderer");
        self.factories.write().insert(name, Arc::new(factory));
    }

    /// Whether a backend is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.factories.read().contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.factories.read().keys().cloned().collect()
    }

    /// Creates an adapter.
    ///
    /// # Errors
    ///
    /// [`RenderError::UnknownRenderer`], or the factory's own error.
    pub fn create(&self, name: &str, options: &RendererOptions) -> RenderResult<Box<dyn RendererAdapter>> {
        // Clone the factory out so it runs without the registry lock.
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::UnknownRenderer(name.to_string()))?;
        factory(options)
    }

    /// Log shared by every headless adapter this registry creates.
    #[must_use]
    pub fn headless_log(&self) -> &HeadlessLog {
        &self.headless_log
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxview_objects::Dimension;
    use std::path::PathBuf;

    fn options() -> RendererOptions {
        RendererOptions {
            dimension: Dimension::ThreeD,
            position: (0, 0),
            view: crate::adapter::View::default(),
            output_dir: PathBuf::from("."),
            interactive: false,
        }
    }

    #[test]
    fn test_headless_is_registered() {
        let registry = RendererRegistry::new();
        assert!(registry.contains(HEADLESS));
        let adapter = registry.create(HEADLESS, &options()).unwrap();
        assert_eq!(adapter.name(), HEADLESS);
    }

    #[test]
    fn test_unknown_renderer() {
        let registry = RendererRegistry::new();
        assert!(matches!(
            registry.create("vtk", &options()),
            Err(RenderError::UnknownRenderer(name)) if name == "vtk"
        ));
    }

    #[test]
    fn test_custom_renderer() {
        let registry = RendererRegistry::new();
        let log = registry.headless_log().clone();
        registry.register_renderer("plotter", move |options: &RendererOptions| {
            Ok(Box::new(HeadlessRenderer::new(options.clone(), log.clone())) as Box<dyn RendererAdapter>)
        });
        assert_eq!(registry.names(), vec![HEADLESS.to_string(), "plotter".to_string()]);
        assert!(registry.create("plotter", &options()).is_ok());
    }
}

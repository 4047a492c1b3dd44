//! # FLUXVIEW
//!
//! Post-processing windows for a remote CFD solver session.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐  fetch_payload   ┌──────────────────┐
//! │ GraphicsObject │ ───────────────▶ │ SolverSession    │
//! └───────┬────────┘                  └──────────────────┘
//!         │ add_graphics                       │ solver events
//! ┌───────▼────────┐  register  ┌──────────────▼───┐
//! │ GraphicsWindow │ ─────────▶ │ WindowsManager   │ ◀── EventBridge
//! └───────┬────────┘            └──────────────────┘     (callbacks)
//!         │ render / show / save / animate
//! ┌───────▼──────────┐
//! │ RendererAdapter  │  (per cell, from the RendererRegistry)
//! └──────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use fluxview::{EventBridge, GraphicsWindow, WindowsManager};
//! use fluxview_objects::{ContourProps, GraphicsObject, MeshProps};
//! use fluxview_shared::{SimulatedSession, SolverEvent};
//!
//! let session = SimulatedSession::duct("solver-1");
//! let manager = WindowsManager::with_defaults();
//!
//! let window = GraphicsWindow::with_grid(&manager, 1, 2).unwrap();
//! window.add_graphics(GraphicsObject::new(session.clone(), MeshProps::of(["wall"])).unwrap(), (0, 0)).unwrap();
//! window
//!     .add_graphics(GraphicsObject::new(session.clone(), ContourProps::of("pressure", ["wall"])).unwrap(), (0, 1))
//!     .unwrap();
//! let id = window.show().unwrap();
//!
//! let bridge = EventBridge::new();
//! window.real_time_update(&bridge, &[SolverEvent::TimestepEnded]);
//! bridge.dispatch(&"solver-1".into(), SolverEvent::TimestepEnded, Default::default());
//!
//! window.close().unwrap();
//! assert!(manager.get_window(&id).is_none());
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod window;

pub use config::{VizConfig, BLOCKING_ENV};
pub use error::{ConfigError, ConfigResult, WindowError, WindowResult};
pub use events::{
    bind_windows, CallbackError, CallbackId, CallbackResult, DispatchReport, EventBridge, EventSender,
    WindowAction,
};
pub use fluxview_render::CellStyle;
pub use manager::{FanOutReport, WindowsManager};
pub use window::{CellWarning, GraphicsWindow, GraphicsWindowBuilder, RefreshReport};

//! # FLUXVIEW Shared
//!
//! Common types used by graphics objects, renderers and windows.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on a rendering backend. It only describes:
//! - who we talk to (`SolverSession`, `FieldDataAccessor`)
//! - what they send back (geometry and sample payloads)
//! - what they tell us about (`SolverEvent`)
//!
//! If you need renderer types, put them in `fluxview_render`.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod accessor;
pub mod events;
pub mod geometry;
pub mod ids;
pub mod simulated;
pub mod surface;

pub use accessor::{
    AccessError, AccessResult, DataLocation, FieldDataAccessor, MonitorSet, PathlineSet,
    ScalarFieldRequest, SolverSession, SurfaceScalars, SurfaceVectors,
};
pub use events::{EventInfo, SolverEvent, SolverNotification};
pub use geometry::{Point3, SurfaceMesh, Topology};
pub use ids::{SessionId, WindowId};
pub use simulated::{SimulatedSession, SimulatedSessionBuilder};
pub use surface::{IsoRendering, PlaneMethod, SurfaceDefinition};

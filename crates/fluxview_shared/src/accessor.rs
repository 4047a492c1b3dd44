//! # Field Data Access
//!
//! The narrow capability boundary to the remote solver.
//!
//! ```text
//! ┌──────────────┐   list / get    ┌──────────────────┐
//! │ Graphics     │ ──────────────▶ │ FieldDataAccessor│ ──▶ remote solver
//! │ Object       │ ◀────────────── │ (SolverSession)  │
//! └──────────────┘   payloads      └──────────────────┘
//! ```
//!
//! Nothing here is cached. Every call is a fresh query against whatever
//! state the solver is in right now.

use crate::geometry::{Point3, SurfaceMesh};
use crate::ids::SessionId;
use crate::surface::SurfaceDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors raised by a field data accessor.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccessError {
    /// The session is no longer connected.
    #[error("session {0} is disconnected")]
    Disconnected(SessionId),

    /// The solver has no surface of that name.
    #[error("unknown surface: {0}")]
    UnknownSurface(String),

    /// The solver has no field of that name.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The solver has no monitor set of that name.
    #[error("unknown monitor set: {0}")]
    UnknownMonitorSet(String),

    /// The request reached the solver but failed there.
    #[error("field data request failed: {0}")]
    Request(String),
}

/// Result type for accessor calls.
pub type AccessResult<T> = Result<T, AccessError>;

/// Where scalar samples are located.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataLocation {
    /// One value per vertex.
    #[default]
    Nodes,
    /// One value per cell.
    Elements,
}

/// A scalar field request.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarFieldRequest<'a> {
    /// Field name.
    pub field: &'a str,
    /// Surfaces to sample.
    pub surfaces: &'a [String],
    /// Sample location.
    pub location: DataLocation,
    /// Use boundary values on boundary zones.
    pub boundary_values: bool,
}

/// Scalar samples on one surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceScalars {
    /// Surface id.
    pub surface_id: u32,
    /// One value per vertex or per cell, see [`DataLocation`].
    pub values: Vec<f64>,
}

/// Cell-located vectors on one surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfaceVectors {
    /// Surface id.
    pub surface_id: u32,
    /// One vector per cell.
    pub vectors: Vec<Point3>,
    /// Solver-suggested glyph scale for this surface.
    pub vector_scale: f64,
}

/// Pathlines seeded from one surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathlineSet {
    /// Seed surface id.
    pub surface_id: u32,
    /// Polyline vertices.
    pub vertices: Vec<Point3>,
    /// Polylines as vertex index lists.
    pub polylines: Vec<Vec<u32>>,
    /// One scalar per vertex.
    pub values: Vec<f64>,
}

/// Samples of one monitor set (residuals, report plots).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorSet {
    /// Monitor set name.
    pub name: String,
    /// X axis label.
    pub x_label: String,
    /// Y axis label.
    pub y_label: String,
    /// Shared x values (iteration or time step indices).
    pub indices: Vec<f64>,
    /// Named columns, each aligned with `indices`.
    pub columns: Vec<(String, Vec<f64>)>,
}

/// Field data retrieval on a solver session.
///
/// Implementations talk to the remote solver; this workspace only consumes
/// the trait.
pub trait FieldDataAccessor: Send + Sync {
    /// Names of all surfaces currently known to the solver.
    fn list_surfaces(&self) -> AccessResult<BTreeSet<String>>;

    /// Surfaces on boundary zones, the ones an outline mesh draws. Interior
    /// and derived surfaces are excluded. Defaults to every surface.
    fn list_outline_surfaces(&self) -> AccessResult<BTreeSet<String>> {
        self.list_surfaces()
    }

    /// Names of all scalar fields.
    fn list_scalar_fields(&self) -> AccessResult<BTreeSet<String>>;

    /// Names of all vector fields.
    fn list_vector_fields(&self) -> AccessResult<BTreeSet<String>>;

    /// Global `(min, max)` of a scalar field over the whole domain.
    fn scalar_field_range(&self, field: &str, location: DataLocation) -> AccessResult<(f64, f64)>;

    /// Mesh topology of the given surfaces, one entry per surface.
    fn get_mesh_topology(&self, surfaces: &[String]) -> AccessResult<Vec<SurfaceMesh>>;

    /// Scalar samples, one entry per surface.
    fn get_field(&self, request: &ScalarFieldRequest<'_>) -> AccessResult<Vec<SurfaceScalars>>;

    /// Vector samples, one entry per surface.
    fn get_vector_field(&self, field: &str, surfaces: &[String]) -> AccessResult<Vec<SurfaceVectors>>;

    /// Pathlines seeded from the given surfaces, coloured by `field`.
    fn get_pathlines(&self, field: &str, surfaces: &[String]) -> AccessResult<Vec<PathlineSet>>;

    /// Creates a derived surface on the solver under `name`.
    fn create_surface(&self, name: &str, definition: &SurfaceDefinition) -> AccessResult<()>;

    /// Deletes a derived surface created with [`Self::create_surface`].
    fn delete_surface(&self, name: &str) -> AccessResult<()>;

    /// Names of the monitor sets.
    fn list_monitor_sets(&self) -> AccessResult<BTreeSet<String>>;

    /// Samples of one monitor set.
    fn get_monitor_set(&self, name: &str) -> AccessResult<MonitorSet>;
}

/// A live (or formerly live) solver session.
pub trait SolverSession: FieldDataAccessor {
    /// Session id.
    fn id(&self) -> &SessionId;

    /// Whether the connection is still up.
    fn is_connected(&self) -> bool;
}

//! # Simulated Solver Session
//!
//! An in-process stand-in for a remote solver, used by tests and benchmarks
//! to drive graphics objects without a network connection.
//!
//! Fields are closures of position and solution time, so advancing the
//! simulated solution changes every value a graphics object fetches. The
//! session counts accessor requests, which lets tests prove that nothing
//! is cached between fetches.

use crate::accessor::{
    AccessError, AccessResult, DataLocation, FieldDataAccessor, MonitorSet, PathlineSet,
    ScalarFieldRequest, SolverSession, SurfaceScalars, SurfaceVectors,
};
use crate::geometry::{norm, Point3, SurfaceMesh};
use crate::ids::SessionId;
use crate::surface::SurfaceDefinition;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

type ScalarFn = Arc<dyn Fn(Point3, f64) -> f64 + Send + Sync>;
type VectorFn = Arc<dyn Fn(Point3, f64) -> Point3 + Send + Sync>;

/// Seeds per pathline surface.
const MAX_PATHLINE_SEEDS: usize = 16;
/// Integration steps per pathline.
const PATHLINE_STEPS: usize = 10;

struct SimState {
    surfaces: BTreeMap<String, SurfaceMesh>,
    derived: BTreeMap<String, (u32, SurfaceDefinition)>,
    scalar_fields: BTreeMap<String, ScalarFn>,
    vector_fields: BTreeMap<String, VectorFn>,
    monitors: BTreeMap<String, MonitorSet>,
    time: f64,
    next_surface_id: u32,
}

/// In-memory solver session.
pub struct SimulatedSession {
    id: SessionId,
    connected: AtomicBool,
    requests: AtomicUsize,
    state: RwLock<SimState>,
}

impl SimulatedSession {
    /// Starts building a session.
    #[must_use]
    pub fn builder(id: impl Into<SessionId>) -> SimulatedSessionBuilder {
        SimulatedSessionBuilder::new(id.into())
    }

    /// A small duct case: `inlet`, `outlet` and `wall` surfaces, the
    /// `pressure`, `temperature` and `velocity-magnitude` scalars, the
    /// `velocity` vector field and a `residual` monitor set.
    #[must_use]
    pub fn duct(id: impl Into<SessionId>) -> Arc<Self> {
        Self::builder(id)
            .surface(SurfaceMesh::quad_patch(1, "inlet", [0.0; 3], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], 2, 2))
            .surface(SurfaceMesh::quad_patch(2, "outlet", [4.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0], 2, 2))
            .surface(SurfaceMesh::quad_patch(3, "wall", [0.0; 3], [4.0, 0.0, 0.0], [0.0, 1.0, 0.0], 4, 2))
            .scalar_field("pressure", |p, t| 100.0 - 10.0 * p[0] * (1.0 + t))
            .scalar_field("temperature", |p, t| 300.0 + 5.0 * p[2] + t)
            .scalar_field("velocity-magnitude", |p, _| 1.0 + 0.25 * p[0])
            .vector_field("velocity", |p, _| [1.0 + 0.25 * p[0], 0.0, 0.1 * p[2]])
            .monitor_set(MonitorSet {
                name: "residual".to_string(),
                x_label: "iteration".to_string(),
                y_label: "residual".to_string(),
                indices: vec![1.0, 2.0, 3.0],
                columns: vec![
                    ("continuity".to_string(), vec![1.0, 0.3, 0.08]),
                    ("x-velocity".to_string(), vec![0.5, 0.1, 0.02]),
                    ("energy".to_string(), vec![0.2, 0.05, 0.01]),
                ],
            })
            .monitor_set(MonitorSet {
                name: "mass-flow".to_string(),
                x_label: "iteration".to_string(),
                y_label: "kg/s".to_string(),
                indices: vec![1.0, 2.0, 3.0],
                columns: vec![("outlet".to_string(), vec![0.9, 0.97, 0.99])],
            })
            .build()
    }

    /// Drops the connection. Every later request fails with
    /// [`AccessError::Disconnected`].
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Restores the connection.
    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }

    /// Number of accessor requests served so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Current solution time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.state.read().time
    }

    /// Advances the solution by `dt` and appends one row to every monitor
    /// set (residuals decay by half).
    pub fn advance(&self, dt: f64) {
        let mut state = self.state.write();
        state.time += dt;
        for monitor in state.monitors.values_mut() {
            let next = monitor.indices.last().map_or(1.0, |last| last + 1.0);
            monitor.indices.push(next);
            for (_, column) in &mut monitor.columns {
                let value = column.last().map_or(1.0, |last| last * 0.5);
                column.push(value);
            }
        }
    }

    /// Removes a base surface, as a remesh on the solver would.
    pub fn remove_surface(&self, name: &str) -> bool {
        self.state.write().surfaces.remove(name).is_some()
    }

    /// Names of derived surfaces that currently exist on the solver.
    #[must_use]
    pub fn derived_surfaces(&self) -> Vec<String> {
        self.state.read().derived.keys().cloned().collect()
    }

    fn begin_request(&self) -> AccessResult<()> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AccessError::Disconnected(self.id.clone()))
        }
    }

    fn resolve_mesh(state: &SimState, name: &str) -> AccessResult<SurfaceMesh> {
        if let Some(mesh) = state.surfaces.get(name) {
            return Ok(mesh.clone());
        }
        let (surface_id, definition) = state
            .derived
            .get(name)
            .ok_or_else(|| AccessError::UnknownSurface(name.to_string()))?;
        Ok(Self::derived_mesh(state, *surface_id, name, definition))
    }

    /// Meshes a derived surface as a 4x4 patch spanning the domain.
    ///
    /// Iso-surfaces are approximated by a mid-domain plane normal to z.
    fn derived_mesh(state: &SimState, surface_id: u32, name: &str, definition: &SurfaceDefinition) -> SurfaceMesh {
        let (lo, hi) = Self::domain_bounds(state);
        let center = [(lo[0] + hi[0]) * 0.5, (lo[1] + hi[1]) * 0.5, (lo[2] + hi[2]) * 0.5];
        let extent = norm([hi[0] - lo[0], hi[1] - lo[1], hi[2] - lo[2]]).max(1.0);

        let (point, normal) = match definition {
            SurfaceDefinition::PlaneSurface { creation_method } => creation_method.point_and_normal(),
            SurfaceDefinition::IsoSurface { .. } => (center, [0.0, 0.0, 1.0]),
        };

        // Project the domain centre onto the plane.
        let offset = crate::geometry::dot(
            [center[0] - point[0], center[1] - point[1], center[2] - point[2]],
            normal,
        );
        let origin_center = [
            center[0] - offset * normal[0],
            center[1] - offset * normal[1],
            center[2] - offset * normal[2],
        ];

        let helper = if normal[0].abs() < 0.9 { [1.0, 0.0, 0.0] } else { [0.0, 1.0, 0.0] };
        let u = cross(normal, helper);
        let u_len = norm(u);
        let u = [u[0] / u_len * extent, u[1] / u_len * extent, u[2] / u_len * extent];
        let v = cross(normal, u);

        let origin = [
            origin_center[0] - 0.5 * (u[0] + v[0]),
            origin_center[1] - 0.5 * (u[1] + v[1]),
            origin_center[2] - 0.5 * (u[2] + v[2]),
        ];
        SurfaceMesh::quad_patch(surface_id, name, origin, u, v, 4, 4)
    }

    fn domain_bounds(state: &SimState) -> (Point3, Point3) {
        let mut lo = [f64::INFINITY; 3];
        let mut hi = [f64::NEG_INFINITY; 3];
        for p in state.surfaces.values().flat_map(|mesh| mesh.vertices.iter()) {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(p[axis]);
                hi[axis] = hi[axis].max(p[axis]);
            }
        }
        if lo[0].is_finite() {
            (lo, hi)
        } else {
            ([0.0; 3], [1.0; 3])
        }
    }

    fn sample_points(mesh: &SurfaceMesh, location: DataLocation) -> Vec<Point3> {
        match location {
            DataLocation::Nodes => mesh.vertices.clone(),
            DataLocation::Elements => mesh.centroids(),
        }
    }

    fn scalar(state: &SimState, field: &str) -> AccessResult<ScalarFn> {
        state
            .scalar_fields
            .get(field)
            .cloned()
            .ok_or_else(|| AccessError::UnknownField(field.to_string()))
    }
}

fn cross(a: Point3, b: Point3) -> Point3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

impl FieldDataAccessor for SimulatedSession {
    fn list_surfaces(&self) -> AccessResult<BTreeSet<String>> {
        self.begin_request()?;
        let state = self.state.read();
        Ok(state.surfaces.keys().chain(state.derived.keys()).cloned().collect())
    }

    fn list_outline_surfaces(&self) -> AccessResult<BTreeSet<String>> {
        self.begin_request()?;
        Ok(self.state.read().surfaces.keys().cloned().collect())
    }

    fn list_scalar_fields(&self) -> AccessResult<BTreeSet<String>> {
        self.begin_request()?;
        Ok(self.state.read().scalar_fields.keys().cloned().collect())
    }

    fn list_vector_fields(&self) -> AccessResult<BTreeSet<String>> {
        self.begin_request()?;
        Ok(self.state.read().vector_fields.keys().cloned().collect())
    }

    fn scalar_field_range(&self, field: &str, location: DataLocation) -> AccessResult<(f64, f64)> {
        self.begin_request()?;
        let state = self.state.read();
        let f = Self::scalar(&state, field)?;
        let mut range: Option<(f64, f64)> = None;
        for mesh in state.surfaces.values() {
            for p in Self::sample_points(mesh, location) {
                let value = f(p, state.time);
                range = Some(range.map_or((value, value), |(lo, hi)| (lo.min(value), hi.max(value))));
            }
        }
        Ok(range.unwrap_or((0.0, 0.0)))
    }

    fn get_mesh_topology(&self, surfaces: &[String]) -> AccessResult<Vec<SurfaceMesh>> {
        self.begin_request()?;
        let state = self.state.read();
        surfaces.iter().map(|name| Self::resolve_mesh(&state, name)).collect()
    }

    fn get_field(&self, request: &ScalarFieldRequest<'_>) -> AccessResult<Vec<SurfaceScalars>> {
        self.begin_request()?;
        let state = self.state.read();
        let f = Self::scalar(&state, request.field)?;
        request
            .surfaces
            .iter()
            .map(|name| {
                let mesh = Self::resolve_mesh(&state, name)?;
                let values = Self::sample_points(&mesh, request.location)
                    .into_iter()
                    .map(|p| f(p, state.time))
                    .collect();
                Ok(SurfaceScalars {
                    surface_id: mesh.surface_id,
                    values,
                })
            })
            .collect()
    }

    fn get_vector_field(&self, field: &str, surfaces: &[String]) -> AccessResult<Vec<SurfaceVectors>> {
        self.begin_request()?;
        let state = self.state.read();
        let f = state
            .vector_fields
            .get(field)
            .cloned()
            .ok_or_else(|| AccessError::UnknownField(field.to_string()))?;
        surfaces
            .iter()
            .map(|name| {
                let mesh = Self::resolve_mesh(&state, name)?;
                let vectors = mesh.centroids().into_iter().map(|p| f(p, state.time)).collect();
                Ok(SurfaceVectors {
                    surface_id: mesh.surface_id,
                    vectors,
                    vector_scale: 1.0,
                })
            })
            .collect()
    }

    fn get_pathlines(&self, field: &str, surfaces: &[String]) -> AccessResult<Vec<PathlineSet>> {
        self.begin_request()?;
        let state = self.state.read();
        let color = Self::scalar(&state, field)?;
        let velocity = state
            .vector_fields
            .get("velocity")
            .or_else(|| state.vector_fields.values().next())
            .cloned()
            .ok_or_else(|| AccessError::Request("no vector field to trace pathlines".to_string()))?;

        surfaces
            .iter()
            .map(|name| {
                let mesh = Self::resolve_mesh(&state, name)?;
                let mut vertices = Vec::new();
                let mut polylines = Vec::new();
                for seed in mesh.vertices.iter().take(MAX_PATHLINE_SEEDS) {
                    let mut line = Vec::with_capacity(PATHLINE_STEPS + 1);
                    let mut p = *seed;
                    for _ in 0..=PATHLINE_STEPS {
                        line.push(u32::try_from(vertices.len()).unwrap_or(u32::MAX));
                        vertices.push(p);
                        let v = velocity(p, state.time);
                        let speed = norm(v);
                        if speed <= f64::EPSILON {
                            break;
                        }
                        p = [p[0] + 0.1 * v[0] / speed, p[1] + 0.1 * v[1] / speed, p[2] + 0.1 * v[2] / speed];
                    }
                    polylines.push(line);
                }
                let values = vertices.iter().map(|p| color(*p, state.time)).collect();
                Ok(PathlineSet {
                    surface_id: mesh.surface_id,
                    vertices,
                    polylines,
                    values,
                })
            })
            .collect()
    }

    fn create_surface(&self, name: &str, definition: &SurfaceDefinition) -> AccessResult<()> {
        self.begin_request()?;
        let mut state = self.state.write();
        if let SurfaceDefinition::IsoSurface { field: Some(field), .. } = definition {
            if !state.scalar_fields.contains_key(field) {
                return Err(AccessError::UnknownField(field.clone()));
            }
        }
        if state.surfaces.contains_key(name) {
            return Err(AccessError::Request(format!("surface {name} already exists")));
        }
        let surface_id = state.next_surface_id;
        state.next_surface_id += 1;
        state.derived.insert(name.to_string(), (surface_id, definition.clone()));
        Ok(())
    }

    fn delete_surface(&self, name: &str) -> AccessResult<()> {
        self.begin_request()?;
        self.state
            .write()
            .derived
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| AccessError::UnknownSurface(name.to_string()))
    }

    fn list_monitor_sets(&self) -> AccessResult<BTreeSet<String>> {
        self.begin_request()?;
        Ok(self.state.read().monitors.keys().cloned().collect())
    }

    fn get_monitor_set(&self, name: &str) -> AccessResult<MonitorSet> {
        self.begin_request()?;
        self.state
            .read()
            .monitors
            .get(name)
            .cloned()
            .ok_or_else(|| AccessError::UnknownMonitorSet(name.to_string()))
    }
}

impl SolverSession for SimulatedSession {
    fn id(&self) -> &SessionId {
        &self.id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

/// Builder for [`SimulatedSession`].
pub struct SimulatedSessionBuilder {
    id: SessionId,
    connected: bool,
    surfaces: BTreeMap<String, SurfaceMesh>,
    scalar_fields: BTreeMap<String, ScalarFn>,
    vector_fields: BTreeMap<String, VectorFn>,
    monitors: BTreeMap<String, MonitorSet>,
}

impl SimulatedSessionBuilder {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            connected: true,
            surfaces: BTreeMap::new(),
            scalar_fields: BTreeMap::new(),
            vector_fields: BTreeMap::new(),
            monitors: BTreeMap::new(),
        }
    }

    /// Adds a base surface.
    #[must_use]
    pub fn surface(mut self, mesh: SurfaceMesh) -> Self {
        self.surfaces.insert(mesh.name.clone(), mesh);
        self
    }

    /// Adds a scalar field `f(position, time)`.
    #[must_use]
    pub fn scalar_field(mut self, name: &str, f: impl Fn(Point3, f64) -> f64 + Send + Sync + 'static) -> Self {
        self.scalar_fields.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Adds a vector field `f(position, time)`.
    #[must_use]
    pub fn vector_field(mut self, name: &str, f: impl Fn(Point3, f64) -> Point3 + Send + Sync + 'static) -> Self {
        self.vector_fields.insert(name.to_string(), Arc::new(f));
        self
    }

    /// Adds a monitor set.
    #[must_use]
    pub fn monitor_set(mut self, set: MonitorSet) -> Self {
        self.monitors.insert(set.name.clone(), set);
        self
    }

    /// Starts the session disconnected.
    #[must_use]
    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    /// Builds the session.
    #[must_use]
    pub fn build(self) -> Arc<SimulatedSession> {
        let next_surface_id = self.surfaces.values().map(|m| m.surface_id).max().unwrap_or(0) + 1;
        Arc::new(SimulatedSession {
            id: self.id,
            connected: AtomicBool::new(self.connected),
            requests: AtomicUsize::new(0),
            state: RwLock::new(SimState {
                surfaces: self.surfaces,
                derived: BTreeMap::new(),
                scalar_fields: self.scalar_fields,
                vector_fields: self.vector_fields,
                monitors: self.monitors,
                time: 0.0,
                next_surface_id,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::PlaneMethod;

    #[test]
    fn test_duct_lists_surfaces_and_fields() {
        let session = SimulatedSession::duct("s1");
        let surfaces = session.list_surfaces().unwrap();
        assert!(surfaces.contains("inlet"));
        assert!(surfaces.contains("wall"));
        assert!(session.list_scalar_fields().unwrap().contains("pressure"));
        assert_eq!(session.request_count(), 2);
    }

    #[test]
    fn test_disconnect_fails_requests() {
        let session = SimulatedSession::duct("s1");
        session.disconnect();
        assert!(!session.is_connected());
        assert_eq!(
            session.list_surfaces(),
            Err(AccessError::Disconnected(SessionId::new("s1")))
        );
        session.reconnect();
        assert!(session.list_surfaces().is_ok());
    }

    #[test]
    fn test_fields_follow_solution_time() {
        let session = SimulatedSession::duct("s1");
        let surfaces = vec!["outlet".to_string()];
        let request = ScalarFieldRequest {
            field: "pressure",
            surfaces: &surfaces,
            location: DataLocation::Nodes,
            boundary_values: false,
        };
        let before = session.get_field(&request).unwrap()[0].values[0];
        session.advance(1.0);
        let after = session.get_field(&request).unwrap()[0].values[0];
        assert!((before - 60.0).abs() < 1e-9);
        assert!((after - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_derived_surface_lifecycle() {
        let session = SimulatedSession::duct("s1");
        let definition = SurfaceDefinition::plane(PlaneMethod::XyPlane { z: 0.5 });
        session.create_surface("cut", &definition).unwrap();
        assert_eq!(session.derived_surfaces(), vec!["cut".to_string()]);
        assert!(session.list_surfaces().unwrap().contains("cut"));
        assert!(!session.list_outline_surfaces().unwrap().contains("cut"));

        let meshes = session.get_mesh_topology(&["cut".to_string()]).unwrap();
        assert_eq!(meshes[0].cell_count(), 16);
        assert!(meshes[0].vertices.iter().all(|p| (p[2] - 0.5).abs() < 1e-9));

        session.delete_surface("cut").unwrap();
        assert!(session.derived_surfaces().is_empty());
    }

    #[test]
    fn test_monitor_advance_appends_rows() {
        let session = SimulatedSession::duct("s1");
        session.advance(0.1);
        let residual = session.get_monitor_set("residual").unwrap();
        assert_eq!(residual.indices.len(), 4);
        assert!((residual.columns[0].1[3] - 0.04).abs() < 1e-12);
    }
}

//! Per-kind payload fetching.
//!
//! Validation order is fixed: completeness, surfaces, fields, then data.

use crate::error::{ObjectError, ObjectResult};
use crate::payload::{
    AxisScale, ContourPayload, Curve, MeshPayload, Payload, PathlinePayload, PlotPayload,
    SurfacePayload, VectorPayload,
};
use crate::properties::{
    ColorRange, ContourProps, MeshProps, MonitorProps, PathlineProps, SurfaceProps, VectorProps,
    XyPlotProps,
};
use fluxview_shared::geometry::{dot, norm};
use fluxview_shared::{
    DataLocation, IsoRendering, ScalarFieldRequest, SolverSession, SurfaceDefinition,
    SurfaceScalars,
};
use std::sync::atomic::{AtomicU64, Ordering};

/// Monitor set plotted on a log axis.
const RESIDUAL_SET: &str = "residual";

static TRANSIENT_SURFACE_COUNTER: AtomicU64 = AtomicU64::new(0);

fn require<'a>(value: Option<&'a str>, kind: &'static str, missing: &'static str) -> ObjectResult<&'a str> {
    value.ok_or(ObjectError::IncompleteDefinition { kind, missing })
}

fn require_surfaces(surfaces: &[String], kind: &'static str) -> ObjectResult<()> {
    if surfaces.is_empty() {
        return Err(ObjectError::IncompleteDefinition {
            kind,
            missing: "surfaces",
        });
    }
    Ok(())
}

fn check_surfaces(session: &dyn SolverSession, surfaces: &[String]) -> ObjectResult<()> {
    let known = session.list_surfaces()?;
    match surfaces.iter().find(|name| !known.contains(*name)) {
        Some(missing) => Err(ObjectError::SurfaceNotFound(missing.clone())),
        None => Ok(()),
    }
}

fn check_scalar_field(session: &dyn SolverSession, field: &str) -> ObjectResult<()> {
    if session.list_scalar_fields()?.contains(field) {
        Ok(())
    } else {
        Err(ObjectError::FieldNotFound(field.to_string()))
    }
}

fn data_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> (f64, f64) {
    values
        .into_iter()
        .fold(None, |range: Option<(f64, f64)>, v| {
            Some(range.map_or((*v, *v), |(lo, hi)| (lo.min(*v), hi.max(*v))))
        })
        .unwrap_or((0.0, 0.0))
}

fn resolve_range(
    session: &dyn SolverSession,
    range: &ColorRange,
    field: &str,
    location: DataLocation,
    scalars: &[SurfaceScalars],
) -> ObjectResult<(f64, f64)> {
    match *range {
        ColorRange::AutoRangeOff { minimum, maximum, .. } => Ok((minimum.min(maximum), minimum.max(maximum))),
        ColorRange::AutoRangeOn { global_range: true } => Ok(session.scalar_field_range(field, location)?),
        ColorRange::AutoRangeOn { global_range: false } => {
            Ok(data_range(scalars.iter().flat_map(|s| s.values.iter())))
        }
    }
}

pub(crate) fn mesh(session: &dyn SolverSession, props: &MeshProps) -> ObjectResult<Payload> {
    require_surfaces(&props.surfaces, "mesh")?;
    check_surfaces(session, &props.surfaces)?;
    Ok(Payload::Mesh(MeshPayload {
        meshes: session.get_mesh_topology(&props.surfaces)?,
        show_edges: props.show_edges,
        show_nodes: props.show_nodes,
        show_faces: props.show_faces,
    }))
}

pub(crate) fn contour(session: &dyn SolverSession, props: &ContourProps) -> ObjectResult<Payload> {
    let field = require(props.field.as_deref(), "contour", "field")?;
    require_surfaces(&props.surfaces, "contour")?;
    check_surfaces(session, &props.surfaces)?;
    check_scalar_field(session, field)?;

    let location = if props.uses_node_values() {
        DataLocation::Nodes
    } else {
        DataLocation::Elements
    };
    let meshes = session.get_mesh_topology(&props.surfaces)?;
    let scalars = session.get_field(&ScalarFieldRequest {
        field,
        surfaces: &props.surfaces,
        location,
        boundary_values: props.boundary_values,
    })?;
    let range = resolve_range(session, &props.range, field, location, &scalars)?;

    Ok(Payload::Contour(ContourPayload {
        field: field.to_string(),
        meshes,
        scalars,
        location,
        range,
        filled: props.filled,
        contour_lines: props.contour_lines,
        show_edges: props.show_edges,
    }))
}

pub(crate) fn vector(session: &dyn SolverSession, props: &VectorProps) -> ObjectResult<Payload> {
    require_surfaces(&props.surfaces, "vector")?;
    check_surfaces(session, &props.surfaces)?;
    if !session.list_vector_fields()?.contains(&props.vectors_of) {
        return Err(ObjectError::FieldNotFound(props.vectors_of.clone()));
    }
    if let Some(field) = props.field.as_deref() {
        check_scalar_field(session, field)?;
    }

    let meshes = session.get_mesh_topology(&props.surfaces)?;
    let vectors = session.get_vector_field(&props.vectors_of, &props.surfaces)?;

    // Every (skip + 1)-th glyph is drawn; the rest get zero magnitude.
    let stride = props.skip as usize + 1;
    let magnitudes: Vec<Vec<f64>> = vectors
        .iter()
        .map(|set| {
            set.vectors
                .iter()
                .enumerate()
                .map(|(i, v)| if i % stride == 0 { norm(*v) } else { 0.0 })
                .collect()
        })
        .collect();

    let (scalars, range) = match props.field.as_deref() {
        Some(field) => {
            let scalars = session.get_field(&ScalarFieldRequest {
                field,
                surfaces: &props.surfaces,
                location: DataLocation::Elements,
                boundary_values: false,
            })?;
            let range = resolve_range(session, &props.range, field, DataLocation::Elements, &scalars)?;
            (Some(scalars), range)
        }
        None => {
            let range = match props.range {
                ColorRange::AutoRangeOff { minimum, maximum, .. } => (minimum.min(maximum), minimum.max(maximum)),
                ColorRange::AutoRangeOn { .. } => data_range(magnitudes.iter().flatten()),
            };
            (None, range)
        }
    };

    Ok(Payload::Vector(VectorPayload {
        vectors_of: props.vectors_of.clone(),
        meshes,
        vectors,
        magnitudes,
        scalars,
        range,
        scale: props.scale,
        show_edges: props.show_edges,
    }))
}

pub(crate) fn pathline(session: &dyn SolverSession, props: &PathlineProps) -> ObjectResult<Payload> {
    let field = require(props.field.as_deref(), "pathline", "field")?;
    require_surfaces(&props.surfaces, "pathline")?;
    check_surfaces(session, &props.surfaces)?;
    check_scalar_field(session, field)?;

    let pathlines = session.get_pathlines(field, &props.surfaces)?;
    let range = data_range(pathlines.iter().flat_map(|set| set.values.iter()));
    Ok(Payload::Pathline(PathlinePayload {
        field: field.to_string(),
        pathlines,
        range,
    }))
}

/// A solver-side surface that lives for one fetch.
struct TransientSurface<'a> {
    session: &'a dyn SolverSession,
    name: String,
}

impl<'a> TransientSurface<'a> {
    fn create(session: &'a dyn SolverSession, definition: &SurfaceDefinition) -> ObjectResult<Self> {
        let ordinal = TRANSIENT_SURFACE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = format!("fluxview-transient-{ordinal}");
        session.create_surface(&name, definition)?;
        Ok(Self { session, name })
    }
}

impl Drop for TransientSurface<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.session.delete_surface(&self.name) {
            tracing::warn!(
                session_id = %self.session.id(),
                surface = %self.name,
                error = %err,
                "failed to delete transient surface"
            );
        }
    }
}

pub(crate) fn surface(session: &dyn SolverSession, props: &SurfaceProps) -> ObjectResult<Payload> {
    // Iso-surfaces need a field and, when unset, the mid-range iso-value.
    let (definition, contour_field) = match &props.definition {
        SurfaceDefinition::IsoSurface {
            field,
            rendering,
            iso_value,
        } => {
            let field = require(field.as_deref(), "surface", "field")?;
            check_scalar_field(session, field)?;
            let iso_value = match iso_value {
                Some(value) => *value,
                None => {
                    let (lo, hi) = session.scalar_field_range(field, DataLocation::Nodes)?;
                    0.5 * (lo + hi)
                }
            };
            let contour_field = (*rendering == IsoRendering::Contour).then(|| field.to_string());
            (
                SurfaceDefinition::iso(field, Some(iso_value), *rendering),
                contour_field,
            )
        }
        plane @ SurfaceDefinition::PlaneSurface { .. } => (plane.clone(), None),
    };

    let transient = TransientSurface::create(session, &definition)?;
    let surfaces = [transient.name.clone()];
    let meshes = session.get_mesh_topology(&surfaces)?;
    let (scalars, range) = match contour_field.as_deref() {
        Some(field) => {
            let scalars = session.get_field(&ScalarFieldRequest {
                field,
                surfaces: &surfaces,
                location: DataLocation::Nodes,
                boundary_values: false,
            })?;
            let range = data_range(scalars.iter().flat_map(|s| s.values.iter()));
            (Some(scalars), Some(range))
        }
        None => (None, None),
    };

    Ok(Payload::Surface(SurfacePayload {
        definition_kind: definition.kind(),
        meshes,
        scalars,
        range,
        show_edges: props.show_edges,
    }))
}

pub(crate) fn xy_plot(session: &dyn SolverSession, props: &XyPlotProps) -> ObjectResult<Payload> {
    let field = require(props.y_axis_function.as_deref(), "xy-plot", "y_axis_function")?;
    require_surfaces(&props.surfaces, "xy-plot")?;
    let length = norm(props.direction_vector);
    if length <= 0.0 {
        return Err(ObjectError::IncompleteDefinition {
            kind: "xy-plot",
            missing: "direction_vector",
        });
    }
    check_surfaces(session, &props.surfaces)?;
    check_scalar_field(session, field)?;

    let direction = props.direction_vector.map(|c| c / length);
    let location = if props.node_values {
        DataLocation::Nodes
    } else {
        DataLocation::Elements
    };
    let meshes = session.get_mesh_topology(&props.surfaces)?;
    let scalars = session.get_field(&ScalarFieldRequest {
        field,
        surfaces: &props.surfaces,
        location,
        boundary_values: props.boundary_values,
    })?;

    let curves = meshes
        .iter()
        .zip(&scalars)
        .map(|(mesh, samples)| {
            let positions = match location {
                DataLocation::Nodes => mesh.vertices.clone(),
                DataLocation::Elements => mesh.centroids(),
            };
            let mut points: Vec<(f64, f64)> = positions
                .iter()
                .zip(&samples.values)
                .map(|(p, y)| (dot(*p, direction), *y))
                .collect();
            points.sort_by(|a, b| a.0.total_cmp(&b.0));
            let (x, y) = points.into_iter().unzip();
            Curve {
                label: mesh.name.clone(),
                x,
                y,
            }
        })
        .collect();

    Ok(Payload::XyPlot(PlotPayload {
        title: field.to_string(),
        x_label: "position".to_string(),
        y_label: field.to_string(),
        y_scale: AxisScale::Linear,
        curves,
    }))
}

pub(crate) fn monitor(session: &dyn SolverSession, props: &MonitorProps) -> ObjectResult<Payload> {
    let name = require(props.monitor_set_name.as_deref(), "monitor", "monitor_set_name")?;
    if !session.list_monitor_sets()?.contains(name) {
        return Err(ObjectError::MonitorSetNotFound(name.to_string()));
    }

    let set = session.get_monitor_set(name)?;
    let curves = set
        .columns
        .iter()
        .map(|(label, values)| {
            let len = values.len().min(set.indices.len());
            Curve {
                label: label.clone(),
                x: set.indices[..len].to_vec(),
                y: values[..len].to_vec(),
            }
        })
        .collect();

    Ok(Payload::Monitor(PlotPayload {
        title: set.name.clone(),
        x_label: set.x_label,
        y_label: set.y_label,
        y_scale: if name == RESIDUAL_SET {
            AxisScale::Log
        } else {
            AxisScale::Linear
        },
        curves,
    }))
}

//! Render payloads produced by [`crate::GraphicsObject::fetch_payload`].
//!
//! A payload is a snapshot of solver data for exactly one render. It is
//! never kept by the object that produced it.

use fluxview_shared::{DataLocation, PathlineSet, SurfaceMesh, SurfaceScalars, SurfaceVectors};
use serde::Serialize;

/// Mesh payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MeshPayload {
    /// One mesh per surface.
    pub meshes: Vec<SurfaceMesh>,
    /// Draw cell edges.
    pub show_edges: bool,
    /// Draw vertices.
    pub show_nodes: bool,
    /// Draw faces.
    pub show_faces: bool,
}

/// Contour payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContourPayload {
    /// Field name.
    pub field: String,
    /// One mesh per surface.
    pub meshes: Vec<SurfaceMesh>,
    /// Scalars, aligned with `meshes`.
    pub scalars: Vec<SurfaceScalars>,
    /// Where the scalars live.
    pub location: DataLocation,
    /// Resolved colour range.
    pub range: (f64, f64),
    /// Filled bands.
    pub filled: bool,
    /// Overlay contour lines.
    pub contour_lines: bool,
    /// Draw cell edges.
    pub show_edges: bool,
}

/// Vector glyph payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VectorPayload {
    /// Vector field name.
    pub vectors_of: String,
    /// One mesh per surface.
    pub meshes: Vec<SurfaceMesh>,
    /// Vectors, aligned with `meshes`.
    pub vectors: Vec<SurfaceVectors>,
    /// Glyph magnitudes per surface. Entries skipped by the stride are zero.
    pub magnitudes: Vec<Vec<f64>>,
    /// Colour scalars when a colour field is set.
    pub scalars: Option<Vec<SurfaceScalars>>,
    /// Resolved colour range.
    pub range: (f64, f64),
    /// Glyph scale.
    pub scale: f64,
    /// Draw cell edges.
    pub show_edges: bool,
}

/// Pathline payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PathlinePayload {
    /// Colour field.
    pub field: String,
    /// Pathlines per seed surface.
    pub pathlines: Vec<PathlineSet>,
    /// Colour range over all lines.
    pub range: (f64, f64),
}

/// Derived surface payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SurfacePayload {
    /// `plane-surface` or `iso-surface`.
    pub definition_kind: &'static str,
    /// Mesh of the transient surface.
    pub meshes: Vec<SurfaceMesh>,
    /// Colour scalars for contoured iso-surfaces.
    pub scalars: Option<Vec<SurfaceScalars>>,
    /// Colour range when `scalars` is set.
    pub range: Option<(f64, f64)>,
    /// Draw cell edges.
    pub show_edges: bool,
}

/// Y axis scaling of a plot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AxisScale {
    /// Linear axis.
    #[default]
    Linear,
    /// Logarithmic axis.
    Log,
}

/// One curve of a 2D plot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Curve {
    /// Legend label.
    pub label: String,
    /// X values, ascending for XY plots.
    pub x: Vec<f64>,
    /// Y values.
    pub y: Vec<f64>,
}

/// 2D plot payload (XY plots and monitors).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlotPayload {
    /// Plot title.
    pub title: String,
    /// X axis label.
    pub x_label: String,
    /// Y axis label.
    pub y_label: String,
    /// Y axis scale.
    pub y_scale: AxisScale,
    /// Curves.
    pub curves: Vec<Curve>,
}

/// Kind-specific render payload.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Payload {
    /// Mesh.
    Mesh(MeshPayload),
    /// Contour.
    Contour(ContourPayload),
    /// Vectors.
    Vector(VectorPayload),
    /// Pathlines.
    Pathline(PathlinePayload),
    /// Derived surface.
    Surface(SurfacePayload),
    /// XY plot.
    XyPlot(PlotPayload),
    /// Monitor plot.
    Monitor(PlotPayload),
}

impl Payload {
    /// Kind name, matching [`crate::GraphicsKind::name`].
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mesh(_) => "mesh",
            Self::Contour(_) => "contour",
            Self::Vector(_) => "vector",
            Self::Pathline(_) => "pathline",
            Self::Surface(_) => "surface",
            Self::XyPlot(_) => "xy-plot",
            Self::Monitor(_) => "monitor",
        }
    }

    /// Number of drawable primitives: cells, glyphs, polylines or curves.
    #[must_use]
    pub fn primitive_count(&self) -> usize {
        fn cells(meshes: &[SurfaceMesh]) -> usize {
            meshes.iter().map(SurfaceMesh::cell_count).sum()
        }
        match self {
            Self::Mesh(p) => cells(&p.meshes),
            Self::Contour(p) => cells(&p.meshes),
            Self::Vector(p) => p
                .magnitudes
                .iter()
                .flatten()
                .filter(|m| **m > 0.0)
                .count(),
            Self::Pathline(p) => p.pathlines.iter().map(|set| set.polylines.len()).sum(),
            Self::Surface(p) => cells(&p.meshes),
            Self::XyPlot(p) | Self::Monitor(p) => p.curves.len(),
        }
    }

    /// Names of the surfaces the payload was drawn from.
    #[must_use]
    pub fn surface_names(&self) -> Vec<String> {
        let names = |meshes: &[SurfaceMesh]| meshes.iter().map(|m| m.name.clone()).collect();
        match self {
            Self::Mesh(p) => names(&p.meshes),
            Self::Contour(p) => names(&p.meshes),
            Self::Vector(p) => names(&p.meshes),
            Self::Surface(p) => names(&p.meshes),
            Self::XyPlot(p) => p.curves.iter().map(|c| c.label.clone()).collect(),
            Self::Pathline(_) | Self::Monitor(_) => Vec::new(),
        }
    }

    /// Colour range, for kinds that have one.
    #[must_use]
    pub fn color_range(&self) -> Option<(f64, f64)> {
        match self {
            Self::Contour(p) => Some(p.range),
            Self::Vector(p) => Some(p.range),
            Self::Pathline(p) => Some(p.range),
            Self::Surface(p) => p.range,
            Self::Mesh(_) | Self::XyPlot(_) | Self::Monitor(_) => None,
        }
    }
}

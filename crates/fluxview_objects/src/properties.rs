//! # Graphics Object Properties
//!
//! Per-kind property sets. Mutation is unconstrained; nothing is checked
//! until the object fetches its payload.

use fluxview_shared::{Point3, SurfaceDefinition};
use serde::{Deserialize, Serialize};

/// Colour map range of a contour or vector object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "option", rename_all = "kebab-case")]
pub enum ColorRange {
    /// Range follows the data.
    AutoRangeOn {
        /// Use the field range over the whole domain instead of the
        /// displayed surfaces.
        global_range: bool,
    },
    /// Fixed range.
    AutoRangeOff {
        /// Hide values outside the range instead of saturating them.
        clip_to_range: bool,
        /// Lower bound.
        minimum: f64,
        /// Upper bound.
        maximum: f64,
    },
}

impl Default for ColorRange {
    fn default() -> Self {
        Self::AutoRangeOn { global_range: false }
    }
}

impl ColorRange {
    /// Fixed range, unclipped.
    #[must_use]
    pub fn fixed(minimum: f64, maximum: f64) -> Self {
        Self::AutoRangeOff {
            clip_to_range: false,
            minimum,
            maximum,
        }
    }

    /// Whether out-of-range values are clipped.
    #[must_use]
    pub fn clips(&self) -> bool {
        matches!(self, Self::AutoRangeOff { clip_to_range: true, .. })
    }
}

/// Mesh display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshProps {
    /// Surfaces to draw.
    pub surfaces: Vec<String>,
    /// Draw cell edges.
    pub show_edges: bool,
    /// Draw vertices.
    pub show_nodes: bool,
    /// Draw cell faces.
    pub show_faces: bool,
}

impl Default for MeshProps {
    fn default() -> Self {
        Self {
            surfaces: Vec::new(),
            show_edges: false,
            show_nodes: false,
            show_faces: true,
        }
    }
}

impl MeshProps {
    /// Mesh of the given surfaces.
    #[must_use]
    pub fn of<S: Into<String>>(surfaces: impl IntoIterator<Item = S>) -> Self {
        Self {
            surfaces: surfaces.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Scalar contour display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContourProps {
    /// Scalar field.
    pub field: Option<String>,
    /// Surfaces to colour.
    pub surfaces: Vec<String>,
    /// Filled bands instead of iso-lines.
    pub filled: bool,
    /// Node-located values instead of cell values.
    pub node_values: bool,
    /// Boundary values on boundary zones.
    pub boundary_values: bool,
    /// Overlay contour lines on filled bands.
    pub contour_lines: bool,
    /// Draw cell edges.
    pub show_edges: bool,
    /// Colour range.
    pub range: ColorRange,
}

impl Default for ContourProps {
    fn default() -> Self {
        Self {
            field: None,
            surfaces: Vec::new(),
            filled: true,
            node_values: true,
            boundary_values: false,
            contour_lines: false,
            show_edges: false,
            range: ColorRange::default(),
        }
    }
}

impl ContourProps {
    /// Contour of `field` on `surfaces`.
    #[must_use]
    pub fn of<S: Into<String>>(field: impl Into<String>, surfaces: impl IntoIterator<Item = S>) -> Self {
        Self {
            field: Some(field.into()),
            surfaces: surfaces.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Node values are forced when the contour is unfilled or clipped.
    #[must_use]
    pub fn uses_node_values(&self) -> bool {
        self.node_values || !self.filled || self.range.clips()
    }
}

/// Vector glyph display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorProps {
    /// Vector field the glyphs show.
    pub vectors_of: String,
    /// Scalar the glyphs are coloured by. `None` colours by magnitude.
    pub field: Option<String>,
    /// Surfaces to sample.
    pub surfaces: Vec<String>,
    /// Glyph scale factor.
    pub scale: f64,
    /// Draw every `skip + 1`-th glyph.
    pub skip: u32,
    /// Draw cell edges.
    pub show_edges: bool,
    /// Colour range.
    pub range: ColorRange,
}

impl Default for VectorProps {
    fn default() -> Self {
        Self {
            vectors_of: "velocity".to_string(),
            field: None,
            surfaces: Vec::new(),
            scale: 1.0,
            skip: 0,
            show_edges: false,
            range: ColorRange::default(),
        }
    }
}

impl VectorProps {
    /// Velocity glyphs on `surfaces`.
    #[must_use]
    pub fn on<S: Into<String>>(surfaces: impl IntoIterator<Item = S>) -> Self {
        Self {
            surfaces: surfaces.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Pathline display.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathlineProps {
    /// Scalar the lines are coloured by.
    pub field: Option<String>,
    /// Seed surfaces.
    pub surfaces: Vec<String>,
}

impl PathlineProps {
    /// Pathlines from `surfaces` coloured by `field`.
    #[must_use]
    pub fn of<S: Into<String>>(field: impl Into<String>, surfaces: impl IntoIterator<Item = S>) -> Self {
        Self {
            field: Some(field.into()),
            surfaces: surfaces.into_iter().map(Into::into).collect(),
        }
    }
}

/// Derived surface display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceProps {
    /// Draw cell edges.
    pub show_edges: bool,
    /// How the surface is constructed.
    pub definition: SurfaceDefinition,
}

impl Default for SurfaceProps {
    fn default() -> Self {
        Self {
            show_edges: true,
            definition: SurfaceDefinition::default(),
        }
    }
}

impl SurfaceProps {
    /// Surface with the given definition.
    #[must_use]
    pub fn new(definition: SurfaceDefinition) -> Self {
        Self {
            definition,
            ..Self::default()
        }
    }
}

/// XY plot of a field along a direction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XyPlotProps {
    /// Surfaces to sample.
    pub surfaces: Vec<String>,
    /// Field on the y axis.
    pub y_axis_function: Option<String>,
    /// Positions are projected onto this direction for the x axis.
    pub direction_vector: Point3,
    /// Node-located values instead of cell values.
    pub node_values: bool,
    /// Boundary values on boundary zones.
    pub boundary_values: bool,
}

impl Default for XyPlotProps {
    fn default() -> Self {
        Self {
            surfaces: Vec::new(),
            y_axis_function: None,
            direction_vector: [1.0, 0.0, 0.0],
            node_values: true,
            boundary_values: true,
        }
    }
}

impl XyPlotProps {
    /// Plot of `field` over `surfaces`.
    #[must_use]
    pub fn of<S: Into<String>>(field: impl Into<String>, surfaces: impl IntoIterator<Item = S>) -> Self {
        Self {
            surfaces: surfaces.into_iter().map(Into::into).collect(),
            y_axis_function: Some(field.into()),
            ..Self::default()
        }
    }
}

/// Monitor set plot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorProps {
    /// Monitor set to plot.
    pub monitor_set_name: Option<String>,
}

impl MonitorProps {
    /// Plot of the named monitor set.
    #[must_use]
    pub fn of(monitor_set_name: impl Into<String>) -> Self {
        Self {
            monitor_set_name: Some(monitor_set_name.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let mesh = MeshProps::default();
        assert!(mesh.show_faces && !mesh.show_edges && !mesh.show_nodes);

        let vector = VectorProps::default();
        assert_eq!(vector.vectors_of, "velocity");
        assert_eq!(vector.skip, 0);

        assert!(SurfaceProps::default().show_edges);
        assert_eq!(XyPlotProps::default().direction_vector, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_node_values_forced() {
        let mut contour = ContourProps::of("pressure", ["wall"]);
        contour.node_values = false;
        assert!(!contour.uses_node_values());

        contour.filled = false;
        assert!(contour.uses_node_values());

        contour.filled = true;
        contour.range = ColorRange::AutoRangeOff {
            clip_to_range: true,
            minimum: 0.0,
            maximum: 1.0,
        };
        assert!(contour.uses_node_values());
    }

    #[test]
    fn test_contour_from_toml() {
        let contour: ContourProps = toml::from_str(
            r#"
            field = "temperature"
            surfaces = ["inlet", "outlet"]
            filled = false

            [range]
            option = "auto-range-off"
            clip_to_range = false
            minimum = 290.0
            maximum = 320.0
            "#,
        )
        .unwrap();
        assert_eq!(contour.field.as_deref(), Some("temperature"));
        assert_eq!(contour.range, ColorRange::fixed(290.0, 320.0));
        assert!(contour.node_values);
    }
}

//! Derived surface definitions (planes and iso-surfaces).
//!
//! A derived surface does not exist on the solver until someone asks for
//! it. Graphics objects describe it with a [`SurfaceDefinition`], the
//! session materializes it on demand.

use crate::geometry::Point3;
use serde::{Deserialize, Serialize};

/// How a plane surface is constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum PlaneMethod {
    /// Plane of constant z.
    XyPlane {
        /// Z position.
        z: f64,
    },
    /// Plane of constant x.
    YzPlane {
        /// X position.
        x: f64,
    },
    /// Plane of constant y.
    ZxPlane {
        /// Y position.
        y: f64,
    },
    /// Plane through a point with the given normal.
    PointAndNormal {
        /// Point on the plane.
        point: Point3,
        /// Plane normal, need not be unit length.
        normal: Point3,
    },
}

impl Default for PlaneMethod {
    fn default() -> Self {
        Self::XyPlane { z: 0.0 }
    }
}

impl PlaneMethod {
    /// Returns the plane as `(point, unit normal)`.
    ///
    /// A zero normal falls back to +z.
    #[must_use]
    pub fn point_and_normal(&self) -> (Point3, Point3) {
        match *self {
            Self::XyPlane { z } => ([0.0, 0.0, z], [0.0, 0.0, 1.0]),
            Self::YzPlane { x } => ([x, 0.0, 0.0], [1.0, 0.0, 0.0]),
            Self::ZxPlane { y } => ([0.0, y, 0.0], [0.0, 1.0, 0.0]),
            Self::PointAndNormal { point, normal } => {
                let len = crate::geometry::norm(normal);
                if len > 0.0 {
                    (point, [normal[0] / len, normal[1] / len, normal[2] / len])
                } else {
                    (point, [0.0, 0.0, 1.0])
                }
            }
        }
    }
}

/// How an iso-surface is drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IsoRendering {
    /// Draw the iso-surface mesh.
    #[default]
    Mesh,
    /// Colour the iso-surface by its own field.
    Contour,
}

/// Definition of a derived surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SurfaceDefinition {
    /// A cutting plane.
    PlaneSurface {
        /// Plane construction.
        creation_method: PlaneMethod,
    },
    /// Surface of constant field value.
    IsoSurface {
        /// Field the iso-value refers to. `None` until the caller picks one.
        field: Option<String>,
        /// Drawing mode.
        rendering: IsoRendering,
        /// Iso-value. `None` means the midpoint of the field's range.
        iso_value: Option<f64>,
    },
}

impl Default for SurfaceDefinition {
    fn default() -> Self {
        Self::IsoSurface {
            field: None,
            rendering: IsoRendering::Mesh,
            iso_value: None,
        }
    }
}

impl SurfaceDefinition {
    /// Plane surface with the given construction.
    #[must_use]
    pub fn plane(creation_method: PlaneMethod) -> Self {
        Self::PlaneSurface { creation_method }
    }

    /// Iso-surface of `field` at `iso_value`.
    #[must_use]
    pub fn iso(field: impl Into<String>, iso_value: Option<f64>, rendering: IsoRendering) -> Self {
        Self::IsoSurface {
            field: Some(field.into()),
            rendering,
            iso_value,
        }
    }

    /// Returns the definition kind as written in config files.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlaneSurface { .. } => "plane-surface",
            Self::IsoSurface { .. } => "iso-surface",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_and_normal_is_normalized() {
        let method = PlaneMethod::PointAndNormal {
            point: [1.0, 2.0, 3.0],
            normal: [0.0, 3.0, 4.0],
        };
        let (point, normal) = method.point_and_normal();
        assert_eq!(point, [1.0, 2.0, 3.0]);
        assert!((normal[1] - 0.6).abs() < 1e-12);
        assert!((normal[2] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_zero_normal_falls_back() {
        let method = PlaneMethod::PointAndNormal {
            point: [0.0; 3],
            normal: [0.0; 3],
        };
        assert_eq!(method.point_and_normal().1, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_default_definition_is_iso() {
        assert_eq!(SurfaceDefinition::default().kind(), "iso-surface");
    }
}

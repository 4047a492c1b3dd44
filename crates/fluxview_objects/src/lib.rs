//! # FLUXVIEW Objects
//!
//! Graphics objects: what to draw, never the data itself.
//!
//! ## Kinds
//!
//! | Kind     | Payload                                   | Renderer |
//! |----------|-------------------------------------------|----------|
//! | Mesh     | surface meshes                            | 3D       |
//! | Contour  | meshes + scalars + colour range           | 3D       |
//! | Vector   | meshes + glyphs + strided magnitudes      | 3D       |
//! | Pathline | polylines + scalars                       | 3D       |
//! | Surface  | transient plane / iso-surface mesh        | 3D       |
//! | XyPlot   | field vs. projected position, sorted by x | 2D       |
//! | Monitor  | monitor set curves                        | 2D       |
//!
//! Objects can stand alone or live in a [`GraphicsCollection`], which names
//! them per kind within one session.
//!
//! ## Usage
//!
//! ```rust
//! use fluxview_objects::{ContourProps, GraphicsObject, Payload};
//! use fluxview_shared::SimulatedSession;
//!
//! let session = SimulatedSession::duct("solver-1");
//! let contour = GraphicsObject::new(session, ContourProps::of("pressure", ["wall"])).unwrap();
//! let payload = contour.fetch_payload().unwrap();
//! assert!(matches!(payload, Payload::Contour(_)));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod collection;
pub mod error;
mod fetch;
pub mod object;
pub mod payload;
pub mod properties;

pub use collection::{GraphicsCollection, OUTLINE_MESH};
pub use error::{ObjectError, ObjectResult};
pub use object::{Dimension, GraphicsKind, GraphicsObject, ObjectKind, SharedGraphics};
pub use payload::{
    AxisScale, ContourPayload, Curve, MeshPayload, PathlinePayload, Payload, PlotPayload,
    SurfacePayload, VectorPayload,
};
pub use properties::{
    ColorRange, ContourProps, MeshProps, MonitorProps, PathlineProps, SurfaceProps, VectorProps,
    XyPlotProps,
};

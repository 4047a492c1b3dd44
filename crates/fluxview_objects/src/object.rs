//! # Graphics Objects
//!
//! A graphics object is a session reference plus a property set. It holds
//! no field data; [`GraphicsObject::fetch_payload`] asks the session every
//! time.
//!
//! Windows share objects through [`SharedGraphics`], so the same contour can
//! sit in two windows and a property change shows up in both on the next
//! refresh.

use crate::error::{ObjectError, ObjectResult};
use crate::fetch;
use crate::payload::Payload;
use crate::properties::{
    ContourProps, MeshProps, MonitorProps, PathlineProps, SurfaceProps, VectorProps, XyPlotProps,
};
use fluxview_shared::{SessionId, SolverSession};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;

/// Which renderer family draws an object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// 3D scene graphics.
    ThreeD,
    /// 2D plots.
    TwoD,
}

/// Kind discriminator without properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    /// Mesh display.
    Mesh,
    /// Scalar contour.
    Contour,
    /// Vector glyphs.
    Vector,
    /// Pathlines.
    Pathline,
    /// Derived surface.
    Surface,
    /// XY plot.
    XyPlot,
    /// Monitor plot.
    Monitor,
}

impl ObjectKind {
    /// Every kind, graphics first, then plots.
    pub const ALL: [Self; 7] = [
        Self::Mesh,
        Self::Contour,
        Self::Vector,
        Self::Pathline,
        Self::Surface,
        Self::XyPlot,
        Self::Monitor,
    ];

    /// Kind name used in logs, scene manifests and generated object names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::Contour => "contour",
            Self::Vector => "vector",
            Self::Pathline => "pathline",
            Self::Surface => "surface",
            Self::XyPlot => "xy-plot",
            Self::Monitor => "monitor",
        }
    }

    /// Renderer family.
    #[must_use]
    pub const fn dimension(self) -> Dimension {
        match self {
            Self::XyPlot | Self::Monitor => Dimension::TwoD,
            _ => Dimension::ThreeD,
        }
    }
}

/// Kind-specific properties.
#[derive(Clone, Debug, PartialEq)]
pub enum GraphicsKind {
    /// Mesh display.
    Mesh(MeshProps),
    /// Scalar contour.
    Contour(ContourProps),
    /// Vector glyphs.
    Vector(VectorProps),
    /// Pathlines.
    Pathline(PathlineProps),
    /// Derived surface.
    Surface(SurfaceProps),
    /// XY plot.
    XyPlot(XyPlotProps),
    /// Monitor plot.
    Monitor(MonitorProps),
}

impl GraphicsKind {
    /// The discriminator.
    #[must_use]
    pub fn object_kind(&self) -> ObjectKind {
        match self {
            Self::Mesh(_) => ObjectKind::Mesh,
            Self::Contour(_) => ObjectKind::Contour,
            Self::Vector(_) => ObjectKind::Vector,
            Self::Pathline(_) => ObjectKind::Pathline,
            Self::Surface(_) => ObjectKind::Surface,
            Self::XyPlot(_) => ObjectKind::XyPlot,
            Self::Monitor(_) => ObjectKind::Monitor,
        }
    }

    /// Kind name used in logs and scene manifests.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.object_kind().name()
    }

    /// Renderer family.
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.object_kind().dimension()
    }
}

macro_rules! impl_kind_from {
    ($($props:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$props> for GraphicsKind {
                fn from(props: $props) -> Self {
                    Self::$variant(props)
                }
            }
        )*
    };
}

impl_kind_from! {
    MeshProps => Mesh,
    ContourProps => Contour,
    VectorProps => Vector,
    PathlineProps => Pathline,
    SurfaceProps => Surface,
    XyPlotProps => XyPlot,
    MonitorProps => Monitor,
}

/// A graphics object bound to one solver session.
#[derive(Clone)]
pub struct GraphicsObject {
    session: Arc<dyn SolverSession>,
    kind: GraphicsKind,
}

impl fmt::Debug for GraphicsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsObject")
            .field("session", self.session.id())
            .field("kind", &self.kind)
            .finish()
    }
}

impl GraphicsObject {
    /// Creates an object.
    ///
    /// # Errors
    ///
    /// [`ObjectError::InvalidSession`] if the session is not connected.
    pub fn new(session: Arc<dyn SolverSession>, kind: impl Into<GraphicsKind>) -> ObjectResult<Self> {
        if !session.is_connected() {
            return Err(ObjectError::InvalidSession(session.id().clone()));
        }
        Ok(Self {
            session,
            kind: kind.into(),
        })
    }

    /// Id of the owning session.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        self.session.id()
    }

    /// The owning session.
    #[must_use]
    pub fn session(&self) -> &Arc<dyn SolverSession> {
        &self.session
    }

    /// Kind-specific properties.
    #[must_use]
    pub fn kind(&self) -> &GraphicsKind {
        &self.kind
    }

    /// Mutable properties. Nothing is validated until the next fetch.
    pub fn kind_mut(&mut self) -> &mut GraphicsKind {
        &mut self.kind
    }

    /// Renderer family.
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.kind.dimension()
    }

    /// Fetches a fresh render payload from the session.
    ///
    /// Checks, in order: connection, definition completeness, surface
    /// names, field names. Then queries the accessor.
    ///
    /// # Errors
    ///
    /// Any [`ObjectError`] except `InvalidSession`.
    pub fn fetch_payload(&self) -> ObjectResult<Payload> {
        if !self.session.is_connected() {
            return Err(ObjectError::SessionDisconnected(self.session.id().clone()));
        }
        tracing::debug!(
            session_id = %self.session.id(),
            kind = self.kind.name(),
            "fetching payload"
        );
        let accessor = self.session.as_ref();
        match &self.kind {
            GraphicsKind::Mesh(props) => fetch::mesh(accessor, props),
            GraphicsKind::Contour(props) => fetch::contour(accessor, props),
            GraphicsKind::Vector(props) => fetch::vector(accessor, props),
            GraphicsKind::Pathline(props) => fetch::pathline(accessor, props),
            GraphicsKind::Surface(props) => fetch::surface(accessor, props),
            GraphicsKind::XyPlot(props) => fetch::xy_plot(accessor, props),
            GraphicsKind::Monitor(props) => fetch::monitor(accessor, props),
        }
    }

    /// Wraps the object in a shareable handle.
    #[must_use]
    pub fn into_shared(self) -> SharedGraphics {
        SharedGraphics::new(self)
    }
}

/// Shared, lock-guarded graphics object handle.
///
/// Cloning the handle shares the object.
#[derive(Clone, Debug)]
pub struct SharedGraphics(Arc<RwLock<GraphicsObject>>);

impl SharedGraphics {
    /// Wraps an object.
    #[must_use]
    pub fn new(object: GraphicsObject) -> Self {
        Self(Arc::new(RwLock::new(object)))
    }

    /// Read access.
    pub fn read(&self) -> RwLockReadGuard<'_, GraphicsObject> {
        self.0.read()
    }

    /// Write access, for property changes.
    pub fn write(&self) -> RwLockWriteGuard<'_, GraphicsObject> {
        self.0.write()
    }

    /// Id of the owning session.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        self.0.read().session_id().clone()
    }

    /// Renderer family.
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.0.read().dimension()
    }

    /// Fetches a payload under a read lock.
    ///
    /// # Errors
    ///
    /// See [`GraphicsObject::fetch_payload`].
    pub fn fetch_payload(&self) -> ObjectResult<Payload> {
        self.0.read().fetch_payload()
    }

    /// Whether both handles share one object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<GraphicsObject> for SharedGraphics {
    fn from(object: GraphicsObject) -> Self {
        Self::new(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluxview_shared::SimulatedSession;

    #[test]
    fn test_construct_requires_connection() {
        let session = SimulatedSession::builder("s9").disconnected().build();
        let err = GraphicsObject::new(session, MeshProps::of(["wall"])).unwrap_err();
        assert_eq!(err, ObjectError::InvalidSession(SessionId::new("s9")));
    }

    #[test]
    fn test_disconnect_after_construction() {
        let session = SimulatedSession::duct("s1");
        let object = GraphicsObject::new(session.clone(), MeshProps::of(["wall"])).unwrap();
        session.disconnect();
        assert_eq!(
            object.fetch_payload().unwrap_err(),
            ObjectError::SessionDisconnected(SessionId::new("s1"))
        );
    }

    #[test]
    fn test_dimension_by_kind() {
        let session = SimulatedSession::duct("s1");
        let mesh = GraphicsObject::new(session.clone(), MeshProps::default()).unwrap();
        let monitor = GraphicsObject::new(session, MonitorProps::of("residual")).unwrap();
        assert_eq!(mesh.dimension(), Dimension::ThreeD);
        assert_eq!(monitor.dimension(), Dimension::TwoD);
    }

    #[test]
    fn test_shared_handle_sees_property_changes() {
        let session = SimulatedSession::duct("s1");
        let shared = GraphicsObject::new(session, ContourProps::of("pressure", ["wall"]))
            .unwrap()
            .into_shared();
        let other = shared.clone();

        if let GraphicsKind::Contour(props) = shared.write().kind_mut() {
            props.field = Some("temperature".to_string());
        }

        let payload = other.fetch_payload().unwrap();
        match payload {
            Payload::Contour(contour) => assert_eq!(contour.field, "temperature"),
            other => panic!("unexpected payload {}", other.kind()),
        }
        assert!(shared.ptr_eq(&other));
    }
}

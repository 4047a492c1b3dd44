//! # Named Object Collections
//!
//! Per-session registry of graphics objects, keyed by kind and name.
//!
//! ```text
//! GraphicsCollection (session "s1")
//!   mesh     ─┬─ "mesh-outline"
//!             └─ "mesh-0"
//!   contour  ─── "pressure-on-wall"
//!   xy-plot  ─── "xy-plot-0"
//! ```
//!
//! Names are unique per kind. Handles are [`SharedGraphics`], so an object
//! placed in a window and later updated through the collection shows the
//! change on the window's next refresh.

use crate::error::{ObjectError, ObjectResult};
use crate::object::{GraphicsKind, GraphicsObject, ObjectKind, SharedGraphics};
use crate::properties::MeshProps;
use fluxview_shared::{SessionId, SolverSession};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Name of the mesh created by [`GraphicsCollection::add_outline_mesh`].
pub const OUTLINE_MESH: &str = "mesh-outline";

/// Graphics objects of one session, looked up by kind and name.
pub struct GraphicsCollection {
    session: Arc<dyn SolverSession>,
    objects: RwLock<BTreeMap<ObjectKind, BTreeMap<String, SharedGraphics>>>,
}

impl fmt::Debug for GraphicsCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsCollection")
            .field("session", self.session.id())
            .field("objects", &self.len())
            .finish()
    }
}

impl GraphicsCollection {
    /// Creates an empty collection.
    ///
    /// # Errors
    ///
    /// [`ObjectError::InvalidSession`] if the session is not connected.
    pub fn new(session: Arc<dyn SolverSession>) -> ObjectResult<Self> {
        if !session.is_connected() {
            return Err(ObjectError::InvalidSession(session.id().clone()));
        }
        Ok(Self {
            session,
            objects: RwLock::new(BTreeMap::new()),
        })
    }

    /// Id of the owning session.
    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        self.session.id()
    }

    /// Adds an object under the lowest free `<kind>-N` name.
    ///
    /// # Errors
    ///
    /// [`ObjectError::InvalidSession`] if the session disconnected.
    pub fn create(&self, kind: impl Into<GraphicsKind>) -> ObjectResult<(String, SharedGraphics)> {
        let kind = kind.into();
        let tag = kind.object_kind();
        let object = GraphicsObject::new(Arc::clone(&self.session), kind)?.into_shared();

        let mut objects = self.objects.write();
        let named = objects.entry(tag).or_default();
        let name = (0..)
            .map(|index| format!("{}-{index}", tag.name()))
            .find(|name| !named.contains_key(name))
            .unwrap_or_else(|| format!("{}-{}", tag.name(), named.len()));
        named.insert(name.clone(), object.clone());
        tracing::debug!(session_id = %self.session.id(), kind = tag.name(), %name, "object created");
        Ok((name, object))
    }

    /// Stores `kind` under `name`. An existing object of the same kind and
    /// name is updated in place, so every window holding it sees the new
    /// properties.
    ///
    /// # Errors
    ///
    /// [`ObjectError::InvalidSession`] if a new object is needed and the
    /// session disconnected.
    pub fn insert(&self, name: impl Into<String>, kind: impl Into<GraphicsKind>) -> ObjectResult<SharedGraphics> {
        let name = name.into();
        let kind = kind.into();
        let tag = kind.object_kind();

        let mut objects = self.objects.write();
        let named = objects.entry(tag).or_default();
        if let Some(existing) = named.get(&name) {
            *existing.write().kind_mut() = kind;
            return Ok(existing.clone());
        }
        let object = GraphicsObject::new(Arc::clone(&self.session), kind)?.into_shared();
        named.insert(name, object.clone());
        Ok(object)
    }

    /// Object of `kind` named `name`.
    #[must_use]
    pub fn get(&self, kind: ObjectKind, name: &str) -> Option<SharedGraphics> {
        self.objects.read().get(&kind)?.get(name).cloned()
    }

    /// Removes an object. Windows already holding it keep their handle.
    pub fn remove(&self, kind: ObjectKind, name: &str) -> Option<SharedGraphics> {
        let mut objects = self.objects.write();
        let named = objects.get_mut(&kind)?;
        let removed = named.remove(name);
        if named.is_empty() {
            objects.remove(&kind);
        }
        removed
    }

    /// Names of the objects of `kind`, sorted.
    #[must_use]
    pub fn names(&self, kind: ObjectKind) -> Vec<String> {
        self.objects
            .read()
            .get(&kind)
            .map(|named| named.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Total number of objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().values().map(BTreeMap::len).sum()
    }

    /// Whether the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates or updates the [`OUTLINE_MESH`] mesh over the session's
    /// boundary surfaces.
    ///
    /// # Errors
    ///
    /// [`ObjectError::SessionDisconnected`] or other request errors from the
    /// surface listing.
    pub fn add_outline_mesh(&self) -> ObjectResult<SharedGraphics> {
        let surfaces = self.session.list_outline_surfaces()?;
        self.insert(OUTLINE_MESH, MeshProps::of(surfaces))
    }
}

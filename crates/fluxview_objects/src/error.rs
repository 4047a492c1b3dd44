//! # Graphics Object Error Types
//!
//! All errors that can occur while building or fetching a graphics object.

use fluxview_shared::{AccessError, SessionId};
use thiserror::Error;

/// Errors raised by graphics objects.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjectError {
    /// The session was not connected when the object was constructed.
    #[error("invalid session: {0} is not connected")]
    InvalidSession(SessionId),

    /// The session closed after the object was constructed.
    #[error("session {0} disconnected")]
    SessionDisconnected(SessionId),

    /// The named field does not exist on the solver.
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// The named surface does not exist on the solver.
    #[error("surface not found: {0}")]
    SurfaceNotFound(String),

    /// The named monitor set does not exist on the solver.
    #[error("monitor set not found: {0}")]
    MonitorSetNotFound(String),

    /// A property required to fetch data was never set.
    #[error("incomplete {kind} definition: {missing} is not set")]
    IncompleteDefinition {
        /// Object kind.
        kind: &'static str,
        /// Missing property.
        missing: &'static str,
    },

    /// The solver rejected or failed a data request.
    #[error("data request failed: {0}")]
    DataRequest(String),
}

impl From<AccessError> for ObjectError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Disconnected(id) => Self::SessionDisconnected(id),
            AccessError::UnknownSurface(name) => Self::SurfaceNotFound(name),
            AccessError::UnknownField(name) => Self::FieldNotFound(name),
            AccessError::UnknownMonitorSet(name) => Self::MonitorSetNotFound(name),
            AccessError::Request(reason) => Self::DataRequest(reason),
        }
    }
}

impl ObjectError {
    /// Whether the error means the owning session is gone.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::SessionDisconnected(_))
    }
}

/// Result type for graphics object operations.
pub type ObjectResult<T> = Result<T, ObjectError>;

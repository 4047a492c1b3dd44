//! Solver lifecycle events.
//!
//! These are the notifications a remote solver session raises while it
//! works. Windows never raise them; they only react to them.

use crate::ids::SessionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Event kind discriminator.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolverEvent {
    /// The solution field was (re)initialized.
    SolutionInitialized = 0,
    /// A data file was read into the session.
    DataRead = 1,
    /// A transient time step finished.
    TimestepEnded = 2,
    /// A solver iteration finished.
    IterationEnded = 3,
}

impl SolverEvent {
    /// All event kinds, in discriminant order.
    pub const ALL: [Self; 4] = [
        Self::SolutionInitialized,
        Self::DataRead,
        Self::TimestepEnded,
        Self::IterationEnded,
    ];

    /// Returns the kebab-case name used in config files and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SolutionInitialized => "solution-initialized",
            Self::DataRead => "data-read",
            Self::TimestepEnded => "timestep-ended",
            Self::IterationEnded => "iteration-ended",
        }
    }
}

impl fmt::Display for SolverEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SolverEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.name() == s)
            .ok_or_else(|| format!("unknown solver event: {s}"))
    }
}

/// Details attached to an event by the solver.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventInfo {
    /// Iteration or time step index, when the event has one.
    pub index: Option<u64>,
    /// Flow time in seconds for transient runs.
    pub flow_time: Option<f64>,
    /// File involved (data-read events).
    pub file: Option<PathBuf>,
}

impl EventInfo {
    /// Info for an indexed event (iteration or time step).
    #[must_use]
    pub fn at_index(index: u64) -> Self {
        Self {
            index: Some(index),
            ..Self::default()
        }
    }
}

/// One event raised by one session, as queued for dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct SolverNotification {
    /// Session that raised the event.
    pub session: SessionId,
    /// Event kind.
    pub event: SolverEvent,
    /// Solver-supplied details.
    pub info: EventInfo,
}

impl SolverNotification {
    /// Creates a notification.
    #[must_use]
    pub fn new(session: SessionId, event: SolverEvent, info: EventInfo) -> Self {
        Self { session, event, info }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_round_trip() {
        for event in SolverEvent::ALL {
            assert_eq!(event.name().parse::<SolverEvent>(), Ok(event));
        }
        assert!("iteration".parse::<SolverEvent>().is_err());
    }
}

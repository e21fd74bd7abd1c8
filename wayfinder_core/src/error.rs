// Error types for map loading, configuration, and route queries.
//
// Build-time problems with individual map records are `MalformedRecord`
// values: they are collected and logged, never returned as a failure of the
// whole build. Query-time failures are `RouteError` values returned to the
// caller, which decides how to present them.

use crate::types::{RoomId, Vec3};
use std::fmt;
use thiserror::Error;

/// Failure of a route query.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error("route graph is empty")]
    EmptyGraph,

    #[error("live position is not finite: {0}")]
    InvalidPosition(Vec3),

    #[error("destination not found: {0}")]
    DestinationNotFound(String),

    #[error("no path from room {from_room} to {destination}")]
    NoPathFound {
        from_room: RoomId,
        destination: String,
    },

    #[error("route query cancelled")]
    Cancelled,

    #[error("route graph unavailable (a previous query panicked)")]
    GraphUnavailable,
}

/// Failure to read a map document as a whole.
#[derive(Error, Debug)]
pub enum MapError {
    #[error("map I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("map JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to load or validate a `RouteConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Which list of the map a record came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Beacon,
    Waypoint,
    Doorway,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordKind::Beacon => "beacon",
            RecordKind::Waypoint => "waypoint",
            RecordKind::Doorway => "doorway",
        };
        f.write_str(s)
    }
}

/// Why a map record was rejected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedReason {
    #[error("missing id")]
    MissingId,
    #[error("missing position")]
    MissingPosition,
    #[error("position has non-finite coordinates")]
    NonFinitePosition,
    #[error("missing roomId")]
    MissingRoom,
    #[error("missing or incomplete connectsRooms")]
    MissingConnectsRooms,
    #[error("doorway connects a room to itself")]
    SelfLoopDoorway,
    #[error("duplicate node id")]
    DuplicateId,
    #[error("field has the wrong type")]
    InvalidField,
}

/// A map record skipped during graph construction.
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRecord {
    pub kind: RecordKind,
    /// Position of the record within its list in the map file.
    pub index: usize,
    pub id: Option<String>,
    pub reason: MalformedReason,
}

impl fmt::Display for MalformedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "skipped {} #{} ({}): {}",
            self.kind,
            self.index,
            self.id.as_deref().unwrap_or("<no id>"),
            self.reason
        )
    }
}

impl std::error::Error for MalformedRecord {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_record_message_names_the_record() {
        let rec = MalformedRecord {
            kind: RecordKind::Doorway,
            index: 2,
            id: Some("d7".into()),
            reason: MalformedReason::SelfLoopDoorway,
        };
        assert_eq!(
            rec.to_string(),
            "skipped doorway #2 (d7): doorway connects a room to itself"
        );

        let anonymous = MalformedRecord {
            kind: RecordKind::Beacon,
            index: 0,
            id: None,
            reason: MalformedReason::MissingId,
        };
        assert_eq!(anonymous.to_string(), "skipped beacon #0 (<no id>): missing id");
    }

    #[test]
    fn no_path_message_names_room_and_destination() {
        let err = RouteError::NoPathFound {
            from_room: RoomId::from("kitchen"),
            destination: "bed".into(),
        };
        assert_eq!(err.to_string(), "no path from room kitchen to bed");
    }
}

// Core types shared across the route graph.
//
// Defines the spatial type (`Vec3`), compact node identifiers, room
// identifiers, the `NodeType` sum type, and the node/edge records stored in
// `RouteGraph`. All types derive `Serialize` and `Deserialize` so graphs and
// routes can be dumped for debugging and handed to the presentation layer.
//
// See also: `graph.rs` which stores `Node`s and `Edge`s, `map.rs` for the raw
// records these are built from.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Spatial types
// ---------------------------------------------------------------------------

/// A position in map space, in meters.
///
/// The coordinate system is y-up: x and z span the floor plane, y is height.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance between two positions.
    pub fn distance(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Compass-style bearing from `self` to `other` on the floor plane, in
    /// degrees clockwise from +Z, normalized to `[0, 360)`.
    pub fn horizontal_bearing_to(self, other: Self) -> f32 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        dx.atan2(dz).to_degrees().rem_euclid(360.0)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Compact identifier for a route graph node: its index in the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Logical room identifier, taken verbatim from the map file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Sentinel room reported when a lookup has nothing to match against
    /// (e.g. nearest room on an empty graph).
    pub const UNKNOWN: &'static str = "unknown";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == Self::UNKNOWN
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Nodes and edges
// ---------------------------------------------------------------------------

/// What a node represents on the map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// A categorized named point of interest ("destination", "furniture", ...).
    Beacon { category: String },
    /// An authored walkable point, or the ephemeral virtual start node.
    Waypoint,
    /// A passage linking exactly two rooms.
    Doorway { room_a: RoomId, room_b: RoomId },
}

impl NodeType {
    /// External type tag: `beacon_<category>`, `waypoint`, or `doorway`.
    pub fn type_tag(&self) -> String {
        match self {
            NodeType::Beacon { category } => format!("beacon_{category}"),
            NodeType::Waypoint => "waypoint".to_string(),
            NodeType::Doorway { .. } => "doorway".to_string(),
        }
    }

    pub fn is_doorway(&self) -> bool {
        matches!(self, NodeType::Doorway { .. })
    }

    /// The two rooms a doorway connects, or `None` for other node types.
    pub fn connects_rooms(&self) -> Option<(&RoomId, &RoomId)> {
        match self {
            NodeType::Doorway { room_a, room_b } => Some((room_a, room_b)),
            _ => None,
        }
    }
}

/// A vertex of the route graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Opaque unique id from the map file.
    pub key: String,
    /// Display name.
    pub name: String,
    pub position: Vec3,
    pub node_type: NodeType,
    /// Owning room. For doorways this is the "primary" room bucket; the
    /// doorway's `connects_rooms` decides its wiring.
    pub room: RoomId,
}

/// Why an edge exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeClass {
    /// Two nodes in the same room bucket.
    WithinRoom,
    /// A doorway to a node in one of the rooms it connects.
    ThroughDoorway,
    /// The virtual start node to one of its chosen anchors.
    ToVirtual,
}

/// A directed edge, stored in the adjacency list of its source node.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub to: NodeId,
    /// Traversal cost in meters (possibly penalized). Always >= 0.
    pub weight: f32,
    pub class: EdgeClass,
}

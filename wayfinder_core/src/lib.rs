// wayfinder_core: indoor route graph and route search library.
//
// This crate turns a human-authored indoor map (rooms, points of interest,
// doorways) into a typed route graph and answers "how do I walk from where
// I am to that destination" queries against it. The only I/O is reading a
// map file in `MapData::from_path`; pose tracking and rendering belong to
// the caller.
//
// Module overview:
// - `types.rs`:         Vec3, NodeId, RoomId, NodeType, Node, Edge.
// - `map.rs`:           Raw map records (serde) + per-record validation.
// - `builder.rs`:       build_route_graph(): map records -> RouteGraph with room-partitioned edges.
// - `graph.rs`:         RouteGraph storage, neighbor and nearest-node/room queries.
// - `virtual_start.rs`: Ephemeral "current position" node insert/remove + RAII guard.
// - `pathfinding.rs`:   A* search and the `find_path` query bracket.
// - `route.rs`:         RouteResult / RouteStep, the externally consumed route.
// - `turn.rs`:          Hysteresis turn-instruction classifier over a RouteResult.
// - `planner.rs`:       RoutePlanner: serialized and background queries on a shared graph.
// - `config.rs`:        RouteConfig: every tunable constant, loadable from JSON.
// - `error.rs`:         RouteError, MapError, ConfigError, MalformedRecord.
//
// Data flow: `MapData` -> `build_route_graph()` -> `RouteGraph` (built once
// per loaded map) -> `find_path(graph, live_position, destination)` ->
// `RouteResult` -> presentation layer.
//
// **Critical constraint: the graph is read-only between queries.** The only
// mutation after build is the virtual start node bracket inside a query,
// and removing it must restore the graph exactly. Node IDs are sequential
// arena indices assigned in input order, so builds are deterministic.

pub mod builder;
pub mod config;
pub mod error;
pub mod graph;
pub mod map;
pub mod pathfinding;
pub mod planner;
pub mod route;
pub mod turn;
pub mod types;
pub mod virtual_start;

pub use builder::{BuildReport, build_route_graph};
pub use config::RouteConfig;
pub use error::{ConfigError, MalformedRecord, MapError, RouteError};
pub use graph::RouteGraph;
pub use map::MapData;
pub use pathfinding::{find_path, find_path_cancellable};
pub use planner::{RoutePlanner, RouteQuery};
pub use route::{RouteResult, RouteStep};
pub use turn::{TurnClassifier, TurnInstruction, TurnKind, instructions_for_route};
pub use types::{NodeId, NodeType, RoomId, Vec3};

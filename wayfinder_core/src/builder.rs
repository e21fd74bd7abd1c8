// Route graph construction from map records.
//
// `build_route_graph()` validates every raw record, inserts the accepted ones
// as typed nodes, then generates edges in two passes:
//
// 1. **Within-room**: for every room bucket, connect each pair of members
//    with an edge weighted by Euclidean distance. A doorway whose primary
//    room is not the bucket being wired is skipped.
// 2. **Through-doorway**: connect every doorway to every node bucketed under
//    either of its two `connects_rooms`, weighted by distance times
//    `RouteConfig::doorway_penalty`.
//
// Nodes are inserted in a fixed order (beacons, then waypoints, then
// doorways, each in file order), so the same map always produces the same
// `NodeId`s and adjacency order. Rejected records are logged and returned
// in `BuildReport::skipped`; they never abort the build.
//
// See also: `map.rs` for record validation, `graph.rs` for the storage, and
// `virtual_start.rs` for the only edges added after build.
//
// **Critical constraint: no wall crossings.** Within-room edges never join
// nodes of different room buckets. The only way between rooms is a doorway.

use crate::config::RouteConfig;
use crate::error::{MalformedReason, MalformedRecord, RecordKind};
use crate::graph::RouteGraph;
use crate::map::{MapData, validate_doorway, validate_poi};
use crate::types::{EdgeClass, NodeId, NodeType};
use tracing::{info, warn};

/// Output of a graph build.
#[derive(Clone, Debug)]
pub struct BuildReport {
    pub graph: RouteGraph,
    /// Records that were rejected, in the order they were encountered.
    pub skipped: Vec<MalformedRecord>,
}

/// Build a route graph from a map document.
pub fn build_route_graph(map: &MapData, config: &RouteConfig) -> BuildReport {
    let mut graph = RouteGraph::new();
    let mut skipped = map.parse_rejects.clone();

    let mut reject = |kind: RecordKind, index: usize, id: Option<String>, reason| {
        let record = MalformedRecord {
            kind,
            index,
            id,
            reason,
        };
        warn!("{record}");
        skipped.push(record);
    };
    for rejected in &map.parse_rejects {
        warn!("{rejected}");
    }

    // --- Nodes ---
    for (kind, list) in [
        (RecordKind::Beacon, &map.beacons),
        (RecordKind::Waypoint, &map.waypoints),
    ] {
        let is_beacon = kind == RecordKind::Beacon;
        for (index, raw) in list.iter().enumerate() {
            let poi = match validate_poi(raw, is_beacon) {
                Ok(poi) => poi,
                Err(reason) => {
                    reject(kind, index, raw.id.clone(), reason);
                    continue;
                }
            };
            let node_type = match poi.category {
                Some(category) => NodeType::Beacon { category },
                None => NodeType::Waypoint,
            };
            if graph
                .add_node(poi.key, poi.name, poi.position, node_type, poi.room)
                .is_none()
            {
                reject(kind, index, raw.id.clone(), MalformedReason::DuplicateId);
            }
        }
    }

    for (index, raw) in map.doorways.iter().enumerate() {
        let door = match validate_doorway(raw) {
            Ok(door) => door,
            Err(reason) => {
                reject(RecordKind::Doorway, index, raw.id.clone(), reason);
                continue;
            }
        };
        let node_type = NodeType::Doorway {
            room_a: door.room_a,
            room_b: door.room_b,
        };
        if graph
            .add_node(door.key, door.name, door.position, node_type, door.room)
            .is_none()
        {
            reject(
                RecordKind::Doorway,
                index,
                raw.id.clone(),
                MalformedReason::DuplicateId,
            );
        }
    }

    // --- Edges ---
    connect_within_rooms(&mut graph);
    connect_through_doorways(&mut graph, config.doorway_penalty.max(1.0));

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        rooms = graph.rooms().count(),
        skipped = skipped.len(),
        "route graph built"
    );

    BuildReport { graph, skipped }
}

/// Pairwise-connect the members of every room bucket.
fn connect_within_rooms(graph: &mut RouteGraph) {
    let buckets: Vec<Vec<NodeId>> = graph
        .rooms
        .iter()
        .map(|(room, members)| {
            members
                .iter()
                .copied()
                .filter(|&id| {
                    let node = &graph.nodes[id.index()];
                    !node.node_type.is_doorway() || &node.room == room
                })
                .collect()
        })
        .collect();

    for members in buckets {
        for (i, &a) in members.iter().enumerate() {
            for &b in &members[i + 1..] {
                let d = graph.nodes[a.index()]
                    .position
                    .distance(graph.nodes[b.index()].position);
                graph.add_edge(a, b, d, EdgeClass::WithinRoom);
            }
        }
    }
}

/// Connect every doorway to all nodes of both rooms it joins.
fn connect_through_doorways(graph: &mut RouteGraph, penalty: f32) {
    let doorways: Vec<NodeId> = graph
        .nodes
        .iter()
        .filter(|n| n.node_type.is_doorway())
        .map(|n| n.id)
        .collect();

    for door in doorways {
        let Some((room_a, room_b)) = graph.nodes[door.index()].node_type.connects_rooms() else {
            continue;
        };
        let targets: Vec<NodeId> = graph
            .room_members(room_a)
            .iter()
            .chain(graph.room_members(room_b))
            .copied()
            .filter(|&id| id != door)
            .collect();
        let door_pos = graph.nodes[door.index()].position;
        for target in targets {
            let d = door_pos.distance(graph.nodes[target.index()].position);
            graph.add_edge(door, target, d * penalty, EdgeClass::ThroughDoorway);
        }
    }
}

// Virtual start node: the ephemeral "you are here" node of a route query.
//
// A query starts from a raw live position, not from a map node. Before the
// search, `add_virtual_start_node()` appends a `Waypoint` node at that
// position, owned by the room of the nearest map node, and links it to the
// best few nearby anchors:
//
// - Candidates lie within `search_radius` of the live position.
// - A doorway is a candidate only if the start room is one of its two sides.
// - Any other node is a candidate only if it belongs to the start room.
//   This exclusion is what stops a route from leaving the start room except
//   through a doorway.
// - Candidates are scored (`score_candidate`), sorted by score, and the top
//   `max_links` are linked with `ToVirtual` edges weighted by distance.
// - If nothing is in range, the virtual node is linked to the single nearest
//   node, whatever its room or type, so the query always has somewhere to go.
//
// `remove_virtual_start_node()` undoes all of this. Because the virtual node
// is always the last arena slot and its edges are always the last entries of
// their neighbor lists, removal restores the graph exactly as it was.
// `VirtualStartGuard` ties removal to scope so no exit path can skip it.
//
// See also: `pathfinding.rs` which brackets every search with a guard,
// `config.rs` for `VirtualStartConfig`.

use crate::config::VirtualStartConfig;
use crate::graph::RouteGraph;
use crate::types::{EdgeClass, Node, NodeId, NodeType, RoomId, Vec3};
use smallvec::SmallVec;
use std::ops::Deref;
use tracing::debug;

/// Map key reported for the virtual start node in routes.
pub const VIRTUAL_START_KEY: &str = "__virtual_start__";

/// Display name of the virtual start node.
pub const VIRTUAL_START_NAME: &str = "Current Location";

/// A scored anchor for the virtual start node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub id: NodeId,
    pub distance: f32,
    pub score: f32,
}

/// Score `node` as an anchor for a virtual start node in `start_room`,
/// `distance` away. Returns `None` if the node must not be linked at all.
pub fn score_candidate(
    node: &Node,
    distance: f32,
    start_room: &RoomId,
    config: &VirtualStartConfig,
) -> Option<f32> {
    let proximity = (config.proximity_base - config.proximity_falloff * distance).max(0.0);
    match &node.node_type {
        NodeType::Doorway { room_a, room_b } => {
            if room_a != start_room && room_b != start_room {
                return None;
            }
            let primary = if room_a == start_room {
                config.doorway_primary_bonus
            } else {
                0.0
            };
            Some(proximity + config.doorway_bonus + primary)
        }
        _ if &node.room != start_room => None,
        NodeType::Waypoint => Some(proximity + config.waypoint_bonus),
        NodeType::Beacon { category } => {
            let bonus = if *category == config.destination_category {
                config.destination_bonus
            } else if config.obstacle_categories.iter().any(|c| c == category) {
                if distance > config.obstacle_near_distance {
                    config.obstacle_penalty
                } else {
                    config.obstacle_near_bonus
                }
            } else {
                config.beacon_bonus
            };
            Some(proximity + bonus)
        }
    }
}

impl RouteGraph {
    /// Insert the virtual start node at `pos` and link it to the graph.
    /// Any previously attached virtual node is removed first.
    pub fn add_virtual_start_node(&mut self, pos: Vec3, config: &VirtualStartConfig) -> NodeId {
        self.remove_virtual_start_node();

        let start_room = self.find_nearest_room(pos);
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            id,
            key: VIRTUAL_START_KEY.to_string(),
            name: VIRTUAL_START_NAME.to_string(),
            position: pos,
            node_type: NodeType::Waypoint,
            room: start_room.clone(),
        });
        self.adjacency.push(Vec::new());
        self.rooms.entry(start_room.clone()).or_default().push(id);
        self.virtual_node = Some(id);

        let candidates = self.virtual_start_candidates(pos, &start_room, config);
        let mut linked: SmallVec<[NodeId; 4]> = SmallVec::new();
        for c in candidates.iter().take(config.max_links) {
            self.add_edge(id, c.id, c.distance, EdgeClass::ToVirtual);
            linked.push(c.id);
        }

        if linked.is_empty() {
            if let Some(nearest) = self.find_nearest_node(pos) {
                let d = pos.distance(self.nodes[nearest.index()].position);
                self.add_edge(id, nearest, d, EdgeClass::ToVirtual);
                linked.push(nearest);
                debug!(%start_room, ?nearest, "virtual start: no candidate in range, linked nearest node");
            }
        } else {
            debug!(%start_room, candidates = candidates.len(), ?linked, "virtual start linked");
        }

        id
    }

    /// Scored anchors for a virtual node at `pos` in `start_room`, best
    /// first. Equal scores keep node order. The virtual node itself is never
    /// a candidate.
    pub fn virtual_start_candidates(
        &self,
        pos: Vec3,
        start_room: &RoomId,
        config: &VirtualStartConfig,
    ) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .nodes
            .iter()
            .filter(|n| Some(n.id) != self.virtual_node)
            .filter_map(|n| {
                let distance = pos.distance(n.position);
                if distance > config.search_radius {
                    return None;
                }
                let score = score_candidate(n, distance, start_room, config)?;
                Some(Candidate {
                    id: n.id,
                    distance,
                    score,
                })
            })
            .collect();
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
        candidates
    }

    /// Remove the virtual start node and every edge touching it. No-op if
    /// none is attached.
    pub fn remove_virtual_start_node(&mut self) {
        let Some(id) = self.virtual_node.take() else {
            return;
        };
        debug_assert_eq!(id.index() + 1, self.nodes.len(), "virtual node must be last");

        for list in &mut self.adjacency {
            list.retain(|e| e.to != id);
        }
        self.adjacency.truncate(id.index());
        if let Some(node) = self.nodes.get(id.index()) {
            let room = node.room.clone();
            if let Some(members) = self.rooms.get_mut(&room) {
                members.retain(|&m| m != id);
                if members.is_empty() {
                    self.rooms.remove(&room);
                }
            }
        }
        self.nodes.truncate(id.index());
    }

    pub fn is_virtual_node(&self, id: NodeId) -> bool {
        self.virtual_node == Some(id)
    }

    /// The attached virtual start node, if any.
    pub fn virtual_node(&self) -> Option<NodeId> {
        self.virtual_node
    }
}

/// Scoped virtual start node. Derefs to the graph for searching; removes
/// the virtual node when dropped.
pub struct VirtualStartGuard<'a> {
    graph: &'a mut RouteGraph,
    start: NodeId,
}

impl<'a> VirtualStartGuard<'a> {
    pub fn attach(graph: &'a mut RouteGraph, pos: Vec3, config: &VirtualStartConfig) -> Self {
        let start = graph.add_virtual_start_node(pos, config);
        Self { graph, start }
    }

    /// The virtual start node's id.
    pub fn start(&self) -> NodeId {
        self.start
    }
}

impl Deref for VirtualStartGuard<'_> {
    type Target = RouteGraph;

    fn deref(&self) -> &RouteGraph {
        self.graph
    }
}

impl Drop for VirtualStartGuard<'_> {
    fn drop(&mut self) {
        self.graph.remove_virtual_start_node();
    }
}

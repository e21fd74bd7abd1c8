// Route graph storage and read-only queries.
//
// The route graph is a node arena (`Vec<Node>` indexed by `NodeId`) with a
// parallel adjacency arena (`Vec<Vec<Edge>>`), a lookup from the map's
// opaque string ids to `NodeId`s, and a room index mapping each `RoomId` to
// the nodes bucketed under it. There are no references between nodes, only
// indices.
//
// The graph is populated by `builder.rs` and is read-only afterwards except
// for the virtual start node bracket in `virtual_start.rs`, which relies on
// the virtual node always occupying the last arena slot.
//
// See also: `pathfinding.rs` for A* over this graph, `types.rs` for `Node`
// and `Edge`.
//
// **Critical constraint: determinism.** Node ids are assigned sequentially,
// the room index is a `BTreeMap`, and adjacency lists keep insertion order.
// The key lookup is a hash map but is never iterated.

use crate::types::{Edge, EdgeClass, Node, NodeId, NodeType, RoomId, Vec3};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// The route graph container.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RouteGraph {
    pub(crate) nodes: Vec<Node>,
    /// `adjacency[i]` holds the outgoing edges of `NodeId(i)`.
    pub(crate) adjacency: Vec<Vec<Edge>>,
    pub(crate) keys: FxHashMap<String, NodeId>,
    pub(crate) rooms: BTreeMap<RoomId, Vec<NodeId>>,
    /// The ephemeral start node, if one is attached.
    pub(crate) virtual_node: Option<NodeId>,
}

impl RouteGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and index it under `room`. Returns `None` (and changes
    /// nothing) if `key` is already taken. Detaches the virtual start node
    /// first if one is attached.
    pub fn add_node(
        &mut self,
        key: impl Into<String>,
        name: impl Into<String>,
        position: Vec3,
        node_type: NodeType,
        room: RoomId,
    ) -> Option<NodeId> {
        let key = key.into();
        if self.keys.contains_key(&key) {
            return None;
        }
        self.remove_virtual_start_node();
        let id = NodeId(self.nodes.len() as u32);
        self.keys.insert(key.clone(), id);
        self.rooms.entry(room.clone()).or_default().push(id);
        self.nodes.push(Node {
            id,
            key,
            name: name.into(),
            position,
            node_type,
            room,
        });
        self.adjacency.push(Vec::new());
        Some(id)
    }

    /// Connect two nodes in both directions. If they are already connected,
    /// the cheaper weight (and its class) wins; no parallel edges are kept.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: f32, class: EdgeClass) {
        if a == b || a.index() >= self.nodes.len() || b.index() >= self.nodes.len() {
            return;
        }
        self.upsert_directed(a, b, weight, class);
        self.upsert_directed(b, a, weight, class);
    }

    fn upsert_directed(&mut self, from: NodeId, to: NodeId, weight: f32, class: EdgeClass) {
        let list = &mut self.adjacency[from.index()];
        match list.iter_mut().find(|e| e.to == to) {
            Some(existing) => {
                if weight < existing.weight {
                    existing.weight = weight;
                    existing.class = class;
                }
            }
            None => list.push(Edge { to, weight, class }),
        }
    }

    /// Get a node by ID.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Get a node by its map id.
    pub fn node_by_key(&self, key: &str) -> Option<&Node> {
        self.keys.get(key).and_then(|&id| self.node(id))
    }

    pub fn id_of(&self, key: &str) -> Option<NodeId> {
        self.keys.get(key).copied()
    }

    /// Outgoing edges of a node; empty for unknown ids.
    pub fn edges(&self, id: NodeId) -> &[Edge] {
        self.adjacency.get(id.index()).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Neighbor nodes with the weight of the edge reaching them; empty for
    /// unknown ids.
    pub fn neighbors(&self, id: NodeId) -> Vec<(&Node, f32)> {
        self.edges(id)
            .iter()
            .filter_map(|e| self.node(e.to).map(|n| (n, e.weight)))
            .collect()
    }

    /// Number of nodes, including the virtual start node if attached.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of directed edges (each logical connection counts twice).
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// All room ids, in sorted order.
    pub fn rooms(&self) -> impl Iterator<Item = &RoomId> {
        self.rooms.keys()
    }

    /// Nodes bucketed under `room`, in insertion order.
    pub fn room_members(&self, room: &RoomId) -> &[NodeId] {
        self.rooms.get(room).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Find the node closest to `pos` (Euclidean). The virtual start node
    /// is never returned. Returns `None` if there are no other nodes.
    pub fn find_nearest_node(&self, pos: Vec3) -> Option<NodeId> {
        self.nodes
            .iter()
            .filter(|n| Some(n.id) != self.virtual_node)
            .min_by(|a, b| a.position.distance(pos).total_cmp(&b.position.distance(pos)))
            .map(|n| n.id)
    }

    /// Room of the node closest to `pos`, or `RoomId::unknown()` on an
    /// empty graph.
    pub fn find_nearest_room(&self, pos: Vec3) -> RoomId {
        self.find_nearest_node(pos)
            .and_then(|id| self.node(id))
            .map_or_else(RoomId::unknown, |n| n.room.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn waypoint(graph: &mut RouteGraph, key: &str, room: &str, x: f32) -> NodeId {
        graph
            .add_node(key, key, Vec3::new(x, 0.0, 0.0), NodeType::Waypoint, room.into())
            .unwrap()
    }

    #[test]
    fn add_node_assigns_sequential_ids() {
        let mut graph = RouteGraph::new();
        let a = waypoint(&mut graph, "a", "r", 0.0);
        let b = waypoint(&mut graph, "b", "r", 1.0);
        let c = waypoint(&mut graph, "c", "s", 2.0);
        assert_eq!(a, NodeId(0));
        assert_eq!(b, NodeId(1));
        assert_eq!(c, NodeId(2));
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.room_members(&"r".into()), &[a, b]);
        assert_eq!(graph.room_members(&"s".into()), &[c]);
    }

    #[test]
    fn duplicate_key_is_refused() {
        let mut graph = RouteGraph::new();
        waypoint(&mut graph, "a", "r", 0.0);
        let dup = graph.add_node("a", "again", Vec3::default(), NodeType::Waypoint, "s".into());
        assert_eq!(dup, None);
        assert_eq!(graph.node_count(), 1);
        assert!(graph.room_members(&"s".into()).is_empty());
    }

    #[test]
    fn add_edge_creates_bidirectional() {
        let mut graph = RouteGraph::new();
        let a = waypoint(&mut graph, "a", "r", 0.0);
        let b = waypoint(&mut graph, "b", "r", 5.0);
        graph.add_edge(a, b, 5.0, EdgeClass::WithinRoom);

        let a_to: Vec<_> = graph.neighbors(a).iter().map(|(n, _)| n.id).collect();
        assert_eq!(a_to, vec![b]);
        let b_to: Vec<_> = graph.neighbors(b).iter().map(|(n, w)| (n.id, *w)).collect();
        assert_eq!(b_to, vec![(a, 5.0)]);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn repeated_edge_keeps_cheaper_weight() {
        let mut graph = RouteGraph::new();
        let a = waypoint(&mut graph, "a", "r", 0.0);
        let b = waypoint(&mut graph, "b", "r", 5.0);
        graph.add_edge(a, b, 6.0, EdgeClass::ThroughDoorway);
        graph.add_edge(a, b, 5.0, EdgeClass::WithinRoom);
        graph.add_edge(b, a, 7.0, EdgeClass::ThroughDoorway);

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(
            graph.edges(a),
            &[Edge {
                to: b,
                weight: 5.0,
                class: EdgeClass::WithinRoom
            }]
        );
        assert_eq!(graph.edges(b)[0].weight, 5.0);
    }

    #[test]
    fn self_and_dangling_edges_are_ignored() {
        let mut graph = RouteGraph::new();
        let a = waypoint(&mut graph, "a", "r", 0.0);
        graph.add_edge(a, a, 1.0, EdgeClass::WithinRoom);
        graph.add_edge(a, NodeId(9), 1.0, EdgeClass::WithinRoom);
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn unknown_ids_yield_nothing() {
        let graph = RouteGraph::new();
        assert!(graph.node(NodeId(3)).is_none());
        assert!(graph.neighbors(NodeId(3)).is_empty());
        assert!(graph.edges(NodeId(3)).is_empty());
        assert!(graph.node_by_key("nope").is_none());
    }

    #[test]
    fn find_nearest_node_and_room() {
        let mut graph = RouteGraph::new();
        waypoint(&mut graph, "a", "kitchen", 0.0);
        let b = waypoint(&mut graph, "b", "hall", 10.0);
        waypoint(&mut graph, "c", "hall", 20.0);

        assert_eq!(graph.find_nearest_node(Vec3::new(8.0, 1.0, 0.0)), Some(b));
        assert_eq!(
            graph.find_nearest_room(Vec3::new(1.0, 0.0, 0.0)),
            RoomId::from("kitchen")
        );
        assert_eq!(
            graph.find_nearest_room(Vec3::new(14.0, 0.0, 0.0)),
            RoomId::from("hall")
        );
    }

    #[test]
    fn nearest_queries_on_empty_graph() {
        let graph = RouteGraph::new();
        assert_eq!(graph.find_nearest_node(Vec3::default()), None);
        assert!(graph.find_nearest_room(Vec3::default()).is_unknown());
    }
}

// Route result packaging.
//
// `RouteResult` is what the presentation layer consumes: an ordered list of
// steps (first = the virtual start, last = the destination), each with its
// map id, name, type tag, room, position, and distance to the next step,
// plus totals. Serialized field names are camelCase.
//
// `total_distance` is the geometric length of the realized path, the sum
// of straight-line distances between consecutive step positions. It is
// not the search cost, which includes doorway penalties and is
// reported separately as `search_cost`.
//
// See also: `pathfinding.rs` which builds these, `turn.rs` which derives
// turn instructions from them.

use crate::graph::RouteGraph;
use crate::pathfinding::SearchPath;
use crate::types::{RoomId, Vec3};
use serde::{Deserialize, Serialize};

/// One node along a route.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    /// 1-based position in the route.
    pub index: usize,
    /// Map id of the node (the virtual start reports `__virtual_start__`).
    pub node_id: String,
    pub name: String,
    /// `beacon_<category>`, `waypoint`, or `doorway`.
    pub node_type: String,
    pub room_id: RoomId,
    pub position: Vec3,
    /// Straight-line distance to the next step; absent on the last step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_to_next: Option<f32>,
}

/// A complete route from the live position to a destination.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    pub steps: Vec<RouteStep>,
    /// Sum of distances between consecutive step positions, in meters.
    pub total_distance: f32,
    pub total_steps: usize,
    pub start_name: String,
    pub end_name: String,
    /// Internal A* cost of the path (doorway edges penalized).
    pub search_cost: f32,
}

impl RouteResult {
    /// Package a search path. `path.nodes` must be non-empty and refer to
    /// nodes of `graph`.
    pub fn from_search(graph: &RouteGraph, path: &SearchPath) -> Self {
        let nodes: Vec<_> = path.nodes.iter().filter_map(|&id| graph.node(id)).collect();

        let steps: Vec<RouteStep> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| RouteStep {
                index: i + 1,
                node_id: node.key.clone(),
                name: node.name.clone(),
                node_type: node.node_type.type_tag(),
                room_id: node.room.clone(),
                position: node.position,
                distance_to_next: nodes.get(i + 1).map(|next| node.position.distance(next.position)),
            })
            .collect();

        let total_distance: f32 = steps.iter().filter_map(|s| s.distance_to_next).sum();

        Self {
            total_steps: steps.len(),
            start_name: nodes.first().map(|n| n.name.clone()).unwrap_or_default(),
            end_name: nodes.last().map(|n| n.name.clone()).unwrap_or_default(),
            steps,
            total_distance,
            search_cost: path.cost,
        }
    }

    /// Step positions in route order.
    pub fn positions(&self) -> Vec<Vec3> {
        self.steps.iter().map(|s| s.position).collect()
    }

    /// Map ids of the steps in route order.
    pub fn node_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.node_id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeClass, NodeId, NodeType};

    fn three_node_graph() -> RouteGraph {
        let mut graph = RouteGraph::new();
        graph
            .add_node("a", "Start", Vec3::new(0.0, 0.0, 0.0), NodeType::Waypoint, "r".into())
            .unwrap();
        graph
            .add_node(
                "d",
                "Door",
                Vec3::new(3.0, 0.0, 4.0),
                NodeType::Doorway {
                    room_a: "r".into(),
                    room_b: "s".into(),
                },
                "r".into(),
            )
            .unwrap();
        graph
            .add_node(
                "b",
                "Bed",
                Vec3::new(3.0, 0.0, 10.0),
                NodeType::Beacon {
                    category: "destination".into(),
                },
                "s".into(),
            )
            .unwrap();
        graph.add_edge(NodeId(0), NodeId(1), 5.0, EdgeClass::WithinRoom);
        graph.add_edge(NodeId(1), NodeId(2), 7.2, EdgeClass::ThroughDoorway);
        graph
    }

    #[test]
    fn steps_are_annotated() {
        let graph = three_node_graph();
        let path = SearchPath {
            nodes: vec![NodeId(0), NodeId(1), NodeId(2)],
            cost: 12.2,
        };
        let route = RouteResult::from_search(&graph, &path);

        assert_eq!(route.total_steps, 3);
        assert_eq!(route.node_ids(), vec!["a", "d", "b"]);
        assert_eq!(route.start_name, "Start");
        assert_eq!(route.end_name, "Bed");

        let indices: Vec<_> = route.steps.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        let tags: Vec<_> = route.steps.iter().map(|s| s.node_type.as_str()).collect();
        assert_eq!(tags, vec!["waypoint", "doorway", "beacon_destination"]);

        assert_eq!(route.steps[0].distance_to_next, Some(5.0));
        assert_eq!(route.steps[1].distance_to_next, Some(6.0));
        assert_eq!(route.steps[2].distance_to_next, None);
    }

    #[test]
    fn total_distance_is_geometric_not_search_cost() {
        let graph = three_node_graph();
        let path = SearchPath {
            nodes: vec![NodeId(0), NodeId(1), NodeId(2)],
            cost: 12.2,
        };
        let route = RouteResult::from_search(&graph, &path);
        assert_eq!(route.total_distance, 11.0);
        assert_eq!(route.search_cost, 12.2);
    }

    #[test]
    fn json_shape() {
        let graph = three_node_graph();
        let path = SearchPath {
            nodes: vec![NodeId(1), NodeId(2)],
            cost: 7.2,
        };
        let route = RouteResult::from_search(&graph, &path);
        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["totalSteps"], 2);
        assert_eq!(json["startName"], "Door");
        assert_eq!(json["steps"][0]["nodeId"], "d");
        assert_eq!(json["steps"][0]["roomId"], "r");
        assert_eq!(json["steps"][0]["distanceToNext"], 6.0);
        assert!(json["steps"][1].get("distanceToNext").is_none());
    }
}

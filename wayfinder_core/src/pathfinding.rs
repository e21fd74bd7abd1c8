// A* route search over the route graph.
//
// `astar()` is a standard A* over `RouteGraph` with a `BinaryHeap` frontier
// (min-heap via reversed ordering). Scores and predecessor links live in
// `Vec`s indexed by `NodeId`. The heuristic is straight-line distance to the
// goal, which is admissible and consistent because every edge weight is at
// least the distance it spans (doorway edges are scaled by >= 1.0).
//
// `find_path()` is the query entry point: it rejects a non-finite live
// position, resolves the destination, attaches a virtual start node at the
// live position through a `VirtualStartGuard`, searches, and packages the
// result as a `RouteResult`.
// The guard detaches the virtual node on every exit path, including a panic
// unwinding through the search.
//
// See also: `virtual_start.rs` for how the start node is linked, `route.rs`
// for the result packaging, `planner.rs` for serialized and background
// queries.
//
// Ties between equal-priority frontier entries break by insertion order.
// Callers must not rely on which of several equal-cost paths is returned.

use crate::config::RouteConfig;
use crate::error::RouteError;
use crate::graph::RouteGraph;
use crate::route::RouteResult;
use crate::types::{NodeId, Vec3};
use crate::virtual_start::VirtualStartGuard;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{self, AtomicBool};
use tracing::debug;

/// The raw result of a successful A* search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchPath {
    /// Node ids from start to goal (inclusive).
    pub nodes: Vec<NodeId>,
    /// Total search cost (sum of edge weights, including doorway penalties).
    pub cost: f32,
}

/// Entry in the A* open set (min-heap via reversed ordering).
struct OpenEntry {
    node: NodeId,
    f_score: f32,
    /// Push order, for FIFO tiebreaking among equal `f_score`s.
    sequence: u64,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap: smallest f_score (then earliest push) is "greatest".
        other
            .f_score
            .total_cmp(&self.f_score)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Find the cheapest path from `start` to `goal` using A*.
///
/// Returns `Ok(None)` if the goal is unreachable or either id is unknown,
/// and `Err(RouteError::Cancelled)` if `cancel` is raised mid-search.
pub fn astar(
    graph: &RouteGraph,
    start: NodeId,
    goal: NodeId,
    cancel: Option<&AtomicBool>,
) -> Result<Option<SearchPath>, RouteError> {
    let n = graph.node_count();
    let (Some(_), Some(goal_node)) = (graph.node(start), graph.node(goal)) else {
        return Ok(None);
    };
    let goal_pos = goal_node.position;
    if start == goal {
        return Ok(Some(SearchPath {
            nodes: vec![start],
            cost: 0.0,
        }));
    }

    let heuristic = |id: NodeId| graph.nodes[id.index()].position.distance(goal_pos);

    // g_score[node] = cost of cheapest known path from start to node.
    let mut g_score = vec![f32::INFINITY; n];
    let mut came_from: Vec<Option<NodeId>> = vec![None; n];
    let mut closed = vec![false; n];
    let mut sequence = 0u64;
    let mut expanded = 0usize;

    g_score[start.index()] = 0.0;

    let mut open = BinaryHeap::new();
    open.push(OpenEntry {
        node: start,
        f_score: heuristic(start),
        sequence,
    });

    while let Some(current) = open.pop() {
        if cancel.is_some_and(|c| c.load(atomic::Ordering::Relaxed)) {
            debug!(expanded, "route search cancelled");
            return Err(RouteError::Cancelled);
        }

        let current_id = current.node;
        let ci = current_id.index();

        if current_id == goal {
            debug!(expanded, cost = g_score[ci], "route search reached goal");
            return Ok(Some(reconstruct_path(&came_from, start, goal, g_score[ci])));
        }

        if closed[ci] {
            continue;
        }
        closed[ci] = true;
        expanded += 1;

        let current_g = g_score[ci];

        for edge in graph.edges(current_id) {
            let ni = edge.to.index();
            if closed[ni] {
                continue;
            }

            let tentative_g = current_g + edge.weight;
            if tentative_g < g_score[ni] {
                g_score[ni] = tentative_g;
                came_from[ni] = Some(current_id);
                sequence += 1;
                open.push(OpenEntry {
                    node: edge.to,
                    f_score: tentative_g + heuristic(edge.to),
                    sequence,
                });
            }
        }
    }

    debug!(expanded, "route search exhausted frontier");
    Ok(None)
}

/// Reconstruct the path from came_from data.
fn reconstruct_path(
    came_from: &[Option<NodeId>],
    start: NodeId,
    goal: NodeId,
    cost: f32,
) -> SearchPath {
    let mut nodes = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from[current.index()] {
            Some(prev) => {
                nodes.push(prev);
                current = prev;
            }
            None => break,
        }
    }
    nodes.reverse();
    SearchPath { nodes, cost }
}

/// Route from a live position to the node whose map id is `destination`.
pub fn find_path(
    graph: &mut RouteGraph,
    live_position: Vec3,
    destination: &str,
    config: &RouteConfig,
) -> Result<RouteResult, RouteError> {
    run_query(graph, live_position, destination, config, None)
}

/// Like `find_path`, but abandons the search with `RouteError::Cancelled`
/// once `cancel` is set. The virtual start node is removed either way.
pub fn find_path_cancellable(
    graph: &mut RouteGraph,
    live_position: Vec3,
    destination: &str,
    config: &RouteConfig,
    cancel: &AtomicBool,
) -> Result<RouteResult, RouteError> {
    run_query(graph, live_position, destination, config, Some(cancel))
}

fn run_query(
    graph: &mut RouteGraph,
    live_position: Vec3,
    destination: &str,
    config: &RouteConfig,
    cancel: Option<&AtomicBool>,
) -> Result<RouteResult, RouteError> {
    if graph.is_empty() {
        return Err(RouteError::EmptyGraph);
    }
    if !live_position.is_finite() {
        return Err(RouteError::InvalidPosition(live_position));
    }
    let goal = graph
        .id_of(destination)
        .ok_or_else(|| RouteError::DestinationNotFound(destination.to_string()))?;

    let guard = VirtualStartGuard::attach(graph, live_position, &config.virtual_start);
    let start = guard.start();

    match astar(&guard, start, goal, cancel)? {
        Some(path) => Ok(RouteResult::from_search(&guard, &path)),
        None => Err(RouteError::NoPathFound {
            from_room: guard.nodes[start.index()].room.clone(),
            destination: destination.to_string(),
        }),
    }
}

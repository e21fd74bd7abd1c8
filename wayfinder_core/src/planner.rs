// Shared-graph route planner.
//
// `RoutePlanner` wraps a built `RouteGraph` in `Arc<Mutex<_>>` so that
// several callers (a UI thread, a background re-router) can query the same
// map. Each query holds the lock for its whole virtual-start bracket
// (attach, search, detach), so queries are serialized and no caller ever
// observes a graph with a foreign virtual node in it.
//
// `spawn_query()` runs one query on a background thread and hands back a
// `RouteQuery`: `wait()` blocks for the result, `cancel()` raises the
// search's cancel flag. A cancelled query still detaches its virtual node
// before the lock is released.
//
// A poisoned mutex (a thread panicked while holding it) surfaces as
// `RouteError::GraphUnavailable`. The graph itself is still consistent in
// that case because `VirtualStartGuard` detaches on unwind, but the planner
// refuses to keep serving until `replace_graph()` installs a fresh one.

use crate::config::RouteConfig;
use crate::error::RouteError;
use crate::graph::RouteGraph;
use crate::pathfinding::find_path_cancellable;
use crate::route::RouteResult;
use crate::types::Vec3;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct RoutePlanner {
    graph: Arc<Mutex<RouteGraph>>,
    config: Arc<RouteConfig>,
}

impl RoutePlanner {
    pub fn new(graph: RouteGraph, config: RouteConfig) -> Self {
        Self {
            graph: Arc::new(Mutex::new(graph)),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RouteConfig {
        &self.config
    }

    /// Route from `live_position` to the node with map id `destination`,
    /// blocking until any in-flight query has finished.
    pub fn find_path(&self, live_position: Vec3, destination: &str) -> Result<RouteResult, RouteError> {
        let never = AtomicBool::new(false);
        run_locked(&self.graph, &self.config, live_position, destination, &never)
    }

    /// Run a query on a background thread.
    pub fn spawn_query(&self, live_position: Vec3, destination: &str) -> RouteQuery {
        let graph = Arc::clone(&self.graph);
        let config = Arc::clone(&self.config);
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let destination = destination.to_string();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = run_locked(&graph, &config, live_position, &destination, &flag);
            // The receiver may have been dropped; nobody wants the answer then.
            let _ = tx.send(result);
        });

        RouteQuery { cancel, rx }
    }

    /// Install a freshly built graph (e.g. after a new map loads). Clears
    /// a poisoned lock.
    pub fn replace_graph(&self, graph: RouteGraph) {
        let mut slot = match self.graph.lock() {
            Ok(slot) => slot,
            Err(poisoned) => {
                self.graph.clear_poison();
                poisoned.into_inner()
            }
        };
        *slot = graph;
        debug!(nodes = slot.node_count(), "route graph replaced");
    }

    /// Run `f` against the current graph under the query lock.
    pub fn with_graph<T>(&self, f: impl FnOnce(&RouteGraph) -> T) -> Result<T, RouteError> {
        let graph = self.graph.lock().map_err(|_| RouteError::GraphUnavailable)?;
        Ok(f(&graph))
    }
}

fn run_locked(
    graph: &Mutex<RouteGraph>,
    config: &RouteConfig,
    live_position: Vec3,
    destination: &str,
    cancel: &AtomicBool,
) -> Result<RouteResult, RouteError> {
    let mut graph = graph.lock().map_err(|_| {
        warn!("route graph lock poisoned");
        RouteError::GraphUnavailable
    })?;
    if cancel.load(Ordering::Relaxed) {
        return Err(RouteError::Cancelled);
    }
    find_path_cancellable(&mut graph, live_position, destination, config, cancel)
}

/// Handle to a query running on a background thread.
#[derive(Debug)]
pub struct RouteQuery {
    cancel: Arc<AtomicBool>,
    rx: mpsc::Receiver<Result<RouteResult, RouteError>>,
}

impl RouteQuery {
    /// Ask the search to stop. It returns `RouteError::Cancelled` unless it
    /// had already finished.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    /// Block until the query finishes.
    pub fn wait(self) -> Result<RouteResult, RouteError> {
        // A closed channel means the worker panicked before sending.
        self.rx.recv().unwrap_or(Err(RouteError::GraphUnavailable))
    }

    /// Non-blocking poll; `None` while the query is still running.
    pub fn try_result(&self) -> Option<Result<RouteResult, RouteError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(mpsc::TryRecvError::Empty) => None,
            Err(mpsc::TryRecvError::Disconnected) => Some(Err(RouteError::GraphUnavailable)),
        }
    }
}

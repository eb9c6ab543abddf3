//! Mutate → refresh → persist protocol.
//!
//! [`SyncController`] is the single writer of the diagram. It owns the graph,
//! the runtime state and the history and exposes the three phases of every
//! change as separate operations:
//!
//! 1. **Mutate** changes the graph in place. Nothing is re-rendered.
//! 2. **Refresh** bumps the runtime version; readers only see the graph
//!    through [`SyncController::view`], which is unavailable while a
//!    mutation is pending refresh.
//! 3. **Persist** records the graph as a new history entry.
//!
//! A drag gesture mutates and refreshes on every pointer move and persists
//! once on release; a field commit runs all three as one [`commit`].
//!
//! [`commit`]: SyncController::commit

use std::rc::Rc;

use log::{debug, error, info, trace};

use crate::{
    error::RailmapError,
    graph::{GraphSnapshot, GraphStore},
    history::HistoryStore,
    registry::TypeRegistry,
    runtime::RuntimeState,
};

/// A read-only view of the graph at a refreshed version.
#[derive(Debug, Clone, Copy)]
pub struct GraphView<'a> {
    version: u64,
    graph: &'a GraphStore,
}

impl<'a> GraphView<'a> {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn graph(&self) -> &'a GraphStore {
        self.graph
    }
}

/// Owner of graph, runtime state and history.
#[derive(Debug)]
pub struct SyncController {
    graph: GraphStore,
    runtime: RuntimeState,
    history: HistoryStore,
    pending: bool,
}

impl SyncController {
    /// Creates a controller around an empty graph.
    pub fn new(registry: Rc<TypeRegistry>, history_limit: usize) -> Self {
        let graph = GraphStore::new(registry);
        let history = HistoryStore::new(graph.export(), history_limit);
        Self {
            graph,
            runtime: RuntimeState::new(),
            history,
            pending: false,
        }
    }

    /// Direct read access for queries outside the render path.
    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn runtime(&self) -> &RuntimeState {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut RuntimeState {
        &mut self.runtime
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Whether a mutation happened since the last refresh.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// The graph as of the last refresh, or `None` while a mutation is
    /// pending refresh.
    pub fn view(&self) -> Option<GraphView<'_>> {
        if self.pending {
            return None;
        }
        Some(GraphView {
            version: self.runtime.version(),
            graph: &self.graph,
        })
    }

    /// Phase 1: applies `f` to the graph.
    ///
    /// The mutation is pending until the next [`refresh`](Self::refresh),
    /// even if `f` fails part way.
    pub fn mutate<T>(
        &mut self,
        f: impl FnOnce(&mut GraphStore) -> Result<T, RailmapError>,
    ) -> Result<T, RailmapError> {
        self.pending = true;
        f(&mut self.graph)
    }

    /// Phase 2: publishes all pending mutations.
    pub fn refresh(&mut self) -> u64 {
        self.pending = false;
        let version = self.runtime.bump_version();
        trace!(version; "Refreshed");
        version
    }

    /// Phase 3: records the graph as a new history entry.
    pub fn persist(&mut self) {
        self.history.push(self.graph.export());
    }

    /// Runs mutate, refresh and persist as one unit.
    ///
    /// If `f` fails, the graph is restored to its state before the call and
    /// neither refresh nor persist happens.
    pub fn commit<T>(
        &mut self,
        f: impl FnOnce(&mut GraphStore) -> Result<T, RailmapError>,
    ) -> Result<T, RailmapError> {
        let backup = self.graph.export();
        match f(&mut self.graph) {
            Ok(value) => {
                self.refresh();
                self.persist();
                Ok(value)
            }
            Err(err) => {
                if let Err(restore_err) = self.graph.import(&backup) {
                    error!(err:% = restore_err; "Failed to restore graph after rejected commit");
                }
                debug!(err:%; "Commit rejected");
                Err(err)
            }
        }
    }

    /// Restores the previous history entry.
    ///
    /// Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> Result<bool, RailmapError> {
        let Some(snapshot) = self.history.undo().cloned() else {
            return Ok(false);
        };
        self.restore(&snapshot)?;
        info!(cursor = self.history.cursor(); "Undo");
        Ok(true)
    }

    /// Restores the next history entry.
    ///
    /// Returns `false` when there is nothing to redo.
    pub fn redo(&mut self) -> Result<bool, RailmapError> {
        let Some(snapshot) = self.history.redo().cloned() else {
            return Ok(false);
        };
        self.restore(&snapshot)?;
        info!(cursor = self.history.cursor(); "Redo");
        Ok(true)
    }

    /// Re-imports the last persisted entry, discarding unpersisted changes.
    pub fn revert_to_saved(&mut self) -> Result<(), RailmapError> {
        let snapshot = self.history.current().clone();
        self.restore(&snapshot)
    }

    /// Replaces the graph with `snapshot` and starts a fresh history.
    ///
    /// On failure the current graph, runtime state and history are kept.
    pub fn load(&mut self, snapshot: &GraphSnapshot) -> Result<(), RailmapError> {
        self.graph.import(snapshot)?;
        self.runtime.reset();
        self.history.reset(self.graph.export());
        self.refresh();
        info!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count();
            "Graph loaded"
        );
        Ok(())
    }

    /// The last persisted snapshot, for external saving.
    pub fn save(&self) -> &GraphSnapshot {
        self.history.current()
    }

    fn restore(&mut self, snapshot: &GraphSnapshot) -> Result<(), RailmapError> {
        self.graph.import(snapshot)?;
        let graph = &self.graph;
        self.runtime.retain_selection(|id| graph.contains(id));
        self.refresh();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use railmap_core::{geometry::Point, identifier::NodeId, path::PathShape};

    use super::*;
    use crate::variants::{self, SHMETRO_BASIC, SINGLE_COLOR};

    fn controller() -> SyncController {
        SyncController::new(Rc::new(variants::builtin_registry().unwrap()), 50)
    }

    fn add_station(sync: &mut SyncController, name: &str, x: f32) -> NodeId {
        let id = NodeId::new(name);
        sync.commit(|graph| graph.add_node(id, Point::new(x, 0.0), SHMETRO_BASIC, None))
            .unwrap();
        id
    }

    #[test]
    fn test_view_hidden_while_pending() {
        let mut sync = controller();
        let id = add_station(&mut sync, "stn_v", 0.0);
        let version = sync.view().unwrap().version();

        sync.mutate(|graph| graph.set_node_position(id, Point::new(5.0, 5.0)))
            .unwrap();
        assert!(sync.view().is_none());

        sync.refresh();
        let view = sync.view().unwrap();
        assert!(view.version() > version);
        assert_eq!(view.graph().node(id).unwrap().position(), Point::new(5.0, 5.0));
    }

    #[test]
    fn test_commit_persists_once() {
        let mut sync = controller();
        add_station(&mut sync, "stn_c1", 0.0);
        add_station(&mut sync, "stn_c2", 10.0);

        assert_eq!(sync.history().len(), 3);
        assert_eq!(sync.save().nodes.len(), 2);
    }

    #[test]
    fn test_failed_commit_rolls_back() {
        let mut sync = controller();
        let a = add_station(&mut sync, "stn_r1", 0.0);
        let version = sync.runtime().version();
        let history_len = sync.history().len();

        let result = sync.commit(|graph| {
            graph.set_node_position(a, Point::new(99.0, 99.0))?;
            graph.add_edge(a, NodeId::new("stn_missing"), PathShape::Simple, SINGLE_COLOR)
        });

        assert!(matches!(result, Err(RailmapError::NotFound(_))));
        assert_eq!(sync.graph().node(a).unwrap().position(), Point::new(0.0, 0.0));
        assert_eq!(sync.runtime().version(), version);
        assert_eq!(sync.history().len(), history_len);
        assert!(sync.view().is_some());
    }

    #[test]
    fn test_undo_restores_prior_snapshot_exactly() {
        let mut sync = controller();
        add_station(&mut sync, "stn_u1", 0.0);
        let before = sync.graph().export();

        add_station(&mut sync, "stn_u2", 10.0);
        assert!(sync.undo().unwrap());
        assert_eq!(sync.graph().export(), before);

        assert!(sync.redo().unwrap());
        assert_eq!(sync.graph().node_count(), 2);
        assert!(!sync.redo().unwrap());
    }

    #[test]
    fn test_undo_prunes_selection() {
        let mut sync = controller();
        let a = add_station(&mut sync, "stn_p1", 0.0);
        sync.runtime_mut().select_only(a.into());

        sync.undo().unwrap();
        assert_eq!(sync.runtime().selection_len(), 0);
    }

    #[test]
    fn test_revert_to_saved_discards_unpersisted() {
        let mut sync = controller();
        let a = add_station(&mut sync, "stn_s1", 0.0);

        sync.mutate(|graph| graph.set_node_position(a, Point::new(40.0, 40.0)))
            .unwrap();
        sync.refresh();
        sync.revert_to_saved().unwrap();

        assert_eq!(sync.graph().node(a).unwrap().position(), Point::new(0.0, 0.0));
    }

    #[test]
    fn test_load_rebaselines_history() {
        let mut sync = controller();
        let a = add_station(&mut sync, "stn_l1", 0.0);
        sync.runtime_mut().select_only(a.into());
        let snapshot = sync.graph().export();

        let mut other = controller();
        other.load(&snapshot).unwrap();
        assert_eq!(other.history().len(), 1);
        assert!(!other.history().can_undo());
        assert_eq!(other.graph().export(), snapshot);

        let mut broken = snapshot.clone();
        broken.nodes.push(broken.nodes[0].clone());
        assert!(sync.load(&broken).is_err());
        assert_eq!(sync.runtime().selection_len(), 1);
        assert_eq!(sync.history().len(), 2);
    }
}

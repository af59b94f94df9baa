//! Selection and session context shared by every panel.
//!
//! [`Session`] publishes a [`SessionState`] snapshot through a `watch`
//! channel. The active map and its read-only flag only ever change together
//! with the selection, in a single transition, so no observer sees a node
//! from the previous map alongside the new map id.

use std::sync::Arc;

use tokio::sync::watch;

use linked_core::{MapId, NodeId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub map_id: Option<MapId>,
    pub read_only: bool,
    /// Drives the detail panels; only set for a single-node selection.
    pub selected_node: Option<NodeId>,
    /// Bumped on every signature change event.
    pub signature_refresh: u64,
    /// Bumped on every note change event.
    pub note_refresh: u64,
}

#[derive(Clone)]
pub struct Session {
    tx: Arc<watch::Sender<SessionState>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Session { tx: Arc::new(tx) }
    }

    pub fn state(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    /// Updates the detail selection from the full set of selected nodes.
    /// Anything but exactly one node clears it.
    pub fn select(&self, nodes: &[NodeId]) {
        let selected = match nodes {
            [only] => Some(*only),
            _ => None,
        };
        self.tx.send_if_modified(|state| {
            if state.selected_node == selected {
                return false;
            }
            state.selected_node = selected;
            true
        });
    }

    /// Switches the active map, resetting selection and the read-only flag in
    /// the same transition.
    pub fn switch_map(&self, map_id: Option<MapId>, read_only: bool) {
        self.tx.send_modify(|state| {
            state.map_id = map_id;
            state.read_only = read_only;
            state.selected_node = None;
        });
    }

    /// Re-enters `map_id` after a full load. On the map already open the
    /// selection survives while `still_present` reports its node, and both
    /// refresh counters move so the detail panels catch up on anything
    /// missed. Any other map is a plain switch.
    pub fn reload_map(
        &self,
        map_id: MapId,
        read_only: bool,
        still_present: impl FnOnce(NodeId) -> bool,
    ) {
        self.tx.send_modify(|state| {
            state.read_only = read_only;
            if state.map_id != Some(map_id) {
                state.map_id = Some(map_id);
                state.selected_node = None;
                return;
            }
            state.selected_node = state.selected_node.filter(|node| still_present(*node));
            state.signature_refresh = state.signature_refresh.wrapping_add(1);
            state.note_refresh = state.note_refresh.wrapping_add(1);
        });
    }

    pub(crate) fn bump_signatures(&self) {
        self.tx
            .send_modify(|state| state.signature_refresh = state.signature_refresh.wrapping_add(1));
    }

    pub(crate) fn bump_notes(&self) {
        self.tx
            .send_modify(|state| state.note_refresh = state.note_refresh.wrapping_add(1));
    }

    /// Clears the selection if it points at `node`.
    pub(crate) fn clear_selection_if(&self, node: NodeId) {
        self.tx.send_if_modified(|state| {
            if state.selected_node != Some(node) {
                return false;
            }
            state.selected_node = None;
            true
        });
    }
}

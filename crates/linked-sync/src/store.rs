//! Local graph store for the open map.
//!
//! [`GraphStore`] holds the canonical node and link collections plus map
//! metadata, published through a `tokio::sync::watch` channel so renderers
//! and panels can read a snapshot ([`GraphStore::state`]) or await changes
//! ([`GraphStore::subscribe`]).
//!
//! Incremental writes are `pub(crate)` and only the reconciler calls them.
//! Outside the crate the store can only be replaced wholesale by a full
//! reload ([`GraphStore::load`]) or emptied ([`GraphStore::clear`]).
//!
//! Entries are `Arc`s in insertion-ordered maps. A write replaces only the
//! touched entry, so every other entry keeps pointer identity across
//! snapshots and render diffing can compare by reference.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::watch;

use linked_core::{
    DisplaySettings, LinkId, MapDetail, MapEdge, MapId, MapInfo, MapNode, NodeCharacter, NodeId,
    PresenceChange,
};

/// One immutable snapshot of the open map.
#[derive(Debug, Clone, Default)]
pub struct GraphState {
    map: Option<Arc<MapInfo>>,
    display: DisplaySettings,
    nodes: IndexMap<NodeId, Arc<MapNode>>,
    links: IndexMap<LinkId, Arc<MapEdge>>,
    revision: u64,
}

impl GraphState {
    pub fn map(&self) -> Option<&Arc<MapInfo>> {
        self.map.as_ref()
    }

    pub fn map_id(&self) -> Option<MapId> {
        self.map.as_ref().map(|m| m.id)
    }

    /// Display parameters derived from the current metadata.
    pub fn display(&self) -> DisplaySettings {
        self.display
    }

    pub fn node(&self, id: NodeId) -> Option<&Arc<MapNode>> {
        self.nodes.get(&id)
    }

    pub fn link(&self, id: LinkId) -> Option<&Arc<MapEdge>> {
        self.links.get(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<MapNode>> + '_ {
        self.nodes.values()
    }

    /// Links in insertion order.
    pub fn links(&self) -> impl Iterator<Item = &Arc<MapEdge>> + '_ {
        self.links.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Slot of a node in the ordered collection.
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes.get_index_of(&id)
    }

    pub fn link_index(&self, id: LinkId) -> Option<usize> {
        self.links.get_index_of(&id)
    }

    /// Incremented on every change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // -----------------------------------------------------------------------
    // Reconciler-only writes. Each returns `true` if the state changed.
    // -----------------------------------------------------------------------

    pub(crate) fn insert_node(&mut self, node: MapNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        self.nodes.insert(node.id, Arc::new(node));
        true
    }

    /// Replaces a node in its slot, or appends it if unknown.
    pub(crate) fn replace_node(&mut self, node: MapNode) -> bool {
        match self.nodes.get_mut(&node.id) {
            Some(slot) if **slot == node => false,
            Some(slot) => {
                *slot = Arc::new(node);
                true
            }
            None => self.insert_node(node),
        }
    }

    /// Removes a node and any link still attached to it.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> bool {
        if self.nodes.shift_remove(&id).is_none() {
            return false;
        }
        self.links.retain(|_, link| !link.touches(id));
        true
    }

    /// Records a character arriving in, leaving or updating within a node's
    /// system, keyed by character name. Unknown nodes are ignored.
    pub(crate) fn set_presence(
        &mut self,
        node_id: NodeId,
        change: PresenceChange,
        character: NodeCharacter,
    ) -> bool {
        let Some(slot) = self.nodes.get_mut(&node_id) else {
            return false;
        };
        let existing = slot
            .characters
            .iter()
            .position(|c| c.character_name == character.character_name);

        let mut node = MapNode::clone(slot);
        match (change, existing) {
            (PresenceChange::Left, None) => return false,
            (PresenceChange::Left, Some(at)) => {
                node.characters.remove(at);
            }
            (_, Some(at)) if node.characters[at] == character => return false,
            (_, Some(at)) => node.characters[at] = character,
            (_, None) => node.characters.push(character),
        }
        *slot = Arc::new(node);
        true
    }

    pub(crate) fn insert_link(&mut self, link: MapEdge) -> bool {
        if self.links.contains_key(&link.id) {
            return false;
        }
        self.links.insert(link.id, Arc::new(link));
        true
    }

    /// Replaces a link in its slot, endpoints included, or appends it if
    /// unknown.
    pub(crate) fn replace_link(&mut self, link: MapEdge) -> bool {
        match self.links.get_mut(&link.id) {
            Some(slot) if **slot == link => false,
            Some(slot) => {
                *slot = Arc::new(link);
                true
            }
            None => self.insert_link(link),
        }
    }

    pub(crate) fn remove_link(&mut self, id: LinkId) -> bool {
        self.links.shift_remove(&id).is_some()
    }

    /// Replaces map metadata and re-derives display settings.
    pub(crate) fn set_map(&mut self, map: MapInfo) -> bool {
        if self.map.as_deref() == Some(&map) {
            return false;
        }
        self.display = DisplaySettings::from(&map);
        self.map = Some(Arc::new(map));
        true
    }
}

/// Shared handle to the store. Clones observe the same state.
#[derive(Clone)]
pub struct GraphStore {
    tx: Arc<watch::Sender<Arc<GraphState>>>,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(GraphState::default()));
        GraphStore { tx: Arc::new(tx) }
    }

    /// Current snapshot.
    pub fn state(&self) -> Arc<GraphState> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<GraphState>> {
        self.tx.subscribe()
    }

    /// Replaces everything with a full map load.
    pub fn load(&self, detail: MapDetail) {
        let MapDetail { map, nodes, links } = detail;
        self.tx.send_modify(|state| {
            let revision = state.revision + 1;
            *state = Arc::new(GraphState {
                display: DisplaySettings::from(&map),
                map: Some(Arc::new(map)),
                nodes: nodes.into_iter().map(|n| (n.id, Arc::new(n))).collect(),
                links: links.into_iter().map(|l| (l.id, Arc::new(l))).collect(),
                revision,
            });
        });
    }

    /// Empties the store, as when leaving a map.
    pub fn clear(&self) {
        self.tx.send_modify(|state| {
            let revision = state.revision + 1;
            *state = Arc::new(GraphState {
                revision,
                ..GraphState::default()
            });
        });
    }

    /// Applies one change to a copy of the current snapshot and publishes
    /// it only if `f` reports a modification. A no-op leaves the published
    /// snapshot, and every `Arc` in it, untouched.
    pub(crate) fn modify(&self, f: impl FnOnce(&mut GraphState) -> bool) -> bool {
        self.tx.send_if_modified(|current| {
            let mut next = GraphState::clone(current);
            if !f(&mut next) {
                return false;
            }
            next.revision += 1;
            *current = Arc::new(next);
            true
        })
    }
}

//! Event reconciler: the single writer into the [`GraphStore`].
//!
//! [`Reconciler::apply`] turns one [`MapEvent`] into the smallest store patch
//! that reflects it:
//!
//! - `*_created` appends, or does nothing if the id is already present.
//! - `*_updated` replaces the entry in its slot wholesale, endpoints
//!   included, and appends it if it was unknown.
//! - `*_deleted` removes by id; an absent id is a no-op.
//! - `map_updated` replaces the metadata and re-derives display settings.
//! - `character_*` adds, replaces or removes one occupant of a node, by name.
//! - `signature_*` / `note_*` only bump the session's refresh counters.
//!
//! Every rule is idempotent, so a replay after a resumed reconnect converges
//! on the same state. Events that end the view, or that invalidate it, are
//! not applied here; they come back as a [`ReconcileOutcome`] for the caller
//! to act on.

use tracing::debug;

use linked_core::{MapEvent, MapInfo};

use crate::session::Session;
use crate::store::GraphStore;

/// Message shown when the server reports a sync error without one.
pub const SYNC_ERROR_FALLBACK: &str = "Map synchronization failed. Reloading map...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    MapDeleted,
    AccessRevoked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Applied (or ignored); keep streaming.
    Continue,
    /// Local state can no longer be trusted: reload the whole map. With a
    /// message, the user is told why.
    Reload { message: Option<String> },
    /// The view must be left.
    Leave(LeaveReason),
}

#[derive(Clone)]
pub struct Reconciler {
    store: GraphStore,
    session: Session,
}

impl Reconciler {
    pub fn new(store: GraphStore, session: Session) -> Self {
        Reconciler { store, session }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn apply(&self, event: MapEvent) -> ReconcileOutcome {
        let kind = event.kind();
        let changed = match event {
            MapEvent::NodeCreated(node) => self.store.modify(|s| s.insert_node(node)),
            MapEvent::NodeUpdated(node) => self.store.modify(|s| s.replace_node(node)),
            MapEvent::NodeDeleted(id) => {
                self.session.clear_selection_if(id);
                self.store.modify(|s| s.remove_node(id))
            }
            MapEvent::LinkCreated(link) => self.store.modify(|s| s.insert_link(link)),
            MapEvent::LinkUpdated(link) => self.store.modify(|s| s.replace_link(link)),
            MapEvent::LinkDeleted(id) => self.store.modify(|s| s.remove_link(id)),
            MapEvent::MapUpdated(map) => {
                let map = self.keep_viewer_access(map);
                self.store.modify(|s| s.set_map(map))
            }
            MapEvent::CharacterPresence {
                node_id,
                change,
                character,
            } => self
                .store
                .modify(|s| s.set_presence(node_id, change, character)),
            MapEvent::SignaturesChanged(_) => {
                self.session.bump_signatures();
                true
            }
            MapEvent::NotesChanged(_) => {
                self.session.bump_notes();
                true
            }
            MapEvent::AccessGranted(_) => return ReconcileOutcome::Reload { message: None },
            MapEvent::MapDeleted => return ReconcileOutcome::Leave(LeaveReason::MapDeleted),
            MapEvent::AccessRevoked(_) => {
                return ReconcileOutcome::Leave(LeaveReason::AccessRevoked)
            }
            MapEvent::SyncError { message } => {
                return ReconcileOutcome::Reload {
                    message: Some(message.unwrap_or_else(|| SYNC_ERROR_FALLBACK.to_string())),
                }
            }
        };

        debug!(event = kind, changed, "applied map event");
        ReconcileOutcome::Continue
    }

    /// `edit_access` is computed per viewer, so a broadcast copy of the
    /// metadata cannot be trusted for it.
    fn keep_viewer_access(&self, mut map: MapInfo) -> MapInfo {
        if let Some(current) = self.store.state().map() {
            map.edit_access = current.edit_access;
        }
        map
    }
}

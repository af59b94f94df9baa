//! Side-channel detail feeds.
//!
//! Signatures and notes are never kept in the graph store. A [`DetailFeed`]
//! watches the session instead and re-fetches the whole list whenever the
//! single selected node, the active map or the matching refresh counter
//! changes. Changes to anything else in the session (the read-only flag, the
//! other counter) are skipped.

use tokio::sync::watch;
use tracing::debug;

use linked_core::{MapId, NodeId, Note, Signature};

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::session::{Session, SessionState};
use crate::store::GraphStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailKind {
    Signatures,
    Notes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailPanel {
    Signatures {
        node_id: NodeId,
        signatures: Vec<Signature>,
    },
    Notes {
        node_id: NodeId,
        system_id: i64,
        notes: Vec<Note>,
    },
    /// No single node is selected, or it is no longer on the map.
    Cleared,
}

type FeedKey = Option<(MapId, NodeId, u64)>;

pub struct DetailFeed {
    kind: DetailKind,
    client: ApiClient,
    store: GraphStore,
    rx: watch::Receiver<SessionState>,
    /// `None` until the first panel is produced.
    last: Option<FeedKey>,
}

impl DetailFeed {
    pub fn new(kind: DetailKind, client: ApiClient, session: &Session, store: GraphStore) -> Self {
        DetailFeed {
            kind,
            client,
            store,
            rx: session.subscribe(),
            last: None,
        }
    }

    pub fn kind(&self) -> DetailKind {
        self.kind
    }

    fn key(&self, state: &SessionState) -> FeedKey {
        let counter = match self.kind {
            DetailKind::Signatures => state.signature_refresh,
            DetailKind::Notes => state.note_refresh,
        };
        match (state.map_id, state.selected_node) {
            (Some(map_id), Some(node_id)) => Some((map_id, node_id, counter)),
            _ => None,
        }
    }

    /// Produces the panel for the current selection on the first call, then
    /// waits for the next relevant change. `None` once the session is gone.
    pub async fn next(&mut self) -> Option<Result<DetailPanel, ApiError>> {
        loop {
            if self.last.is_some() && self.rx.changed().await.is_err() {
                return None;
            }

            let state = self.rx.borrow_and_update().clone();
            let key = self.key(&state);
            if self.last == Some(key) {
                continue;
            }
            self.last = Some(key);

            let Some((map_id, node_id, _)) = key else {
                return Some(Ok(DetailPanel::Cleared));
            };
            debug!(kind = ?self.kind, %node_id, "refreshing detail panel");
            return Some(self.fetch(map_id, node_id).await);
        }
    }

    async fn fetch(&self, map_id: MapId, node_id: NodeId) -> Result<DetailPanel, ApiError> {
        match self.kind {
            DetailKind::Signatures => {
                let signatures = self.client.fetch_signatures(map_id, node_id).await?;
                Ok(DetailPanel::Signatures {
                    node_id,
                    signatures,
                })
            }
            DetailKind::Notes => {
                let system_id = match self.store.state().node(node_id) {
                    Some(node) => node.system_id,
                    None => return Ok(DetailPanel::Cleared),
                };
                let notes = self.client.fetch_notes(map_id, system_id).await?;
                Ok(DetailPanel::Notes {
                    node_id,
                    system_id,
                    notes,
                })
            }
        }
    }
}

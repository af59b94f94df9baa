//! Map view driver.
//!
//! [`MapView`] wires the pieces together for one open map: it records the
//! map as the viewer's default, loads it in full, opens the event stream and
//! feeds every event through the [`Reconciler`]. The stream is the only
//! path into the store after the initial load.
//!
//! A `sync_error` or an access grant reloads the map from scratch and
//! reopens the stream; a deleted map or revoked access ends the view.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use linked_core::MapId;

use crate::actions::MapActions;
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::ActionError;
use crate::notify::{Notifier, Toast};
use crate::panels::{DetailFeed, DetailKind};
use crate::reconciler::{LeaveReason, ReconcileOutcome, Reconciler};
use crate::session::Session;
use crate::store::GraphStore;
use crate::stream::{MapEventStream, StreamMessage};
use crate::viewport::ViewportPersister;

/// How a [`MapView::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewExit {
    /// The map is gone or no longer visible to this viewer.
    Left(LeaveReason),
    /// The server closed the stream for good.
    StreamClosed,
}

pub struct MapView {
    client: ApiClient,
    actions: MapActions,
    reconciler: Reconciler,
    notifier: Arc<dyn Notifier>,
    viewport_debounce: Duration,
}

impl MapView {
    pub fn new(config: &ClientConfig, notifier: Arc<dyn Notifier>) -> Self {
        let client = ApiClient::new(config);
        MapView {
            actions: MapActions::new(client.clone(), Arc::clone(&notifier)),
            reconciler: Reconciler::new(GraphStore::new(), Session::new()),
            client,
            notifier,
            viewport_debounce: config.viewport_debounce,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn actions(&self) -> &MapActions {
        &self.actions
    }

    pub fn store(&self) -> &GraphStore {
        self.reconciler.store()
    }

    pub fn session(&self) -> &Session {
        self.reconciler.session()
    }

    pub fn detail_feed(&self, kind: DetailKind) -> DetailFeed {
        DetailFeed::new(kind, self.client.clone(), self.session(), self.store().clone())
    }

    pub fn viewport_persister(&self, map_id: MapId) -> ViewportPersister<ApiClient> {
        ViewportPersister::new(Arc::new(self.client.clone()), map_id, self.viewport_debounce)
    }

    /// Loads the map in full, replacing the store, and points the session at
    /// it with its read-only flag. Reloading the open map keeps the selection
    /// if the node survived.
    pub async fn reload(&self, map_id: MapId) -> Result<(), ActionError> {
        let detail = self
            .client
            .load_map(map_id)
            .await
            .map_err(|err| ActionError::from_api(err, "Failed to load map"))
            .inspect_err(|err| {
                self.notifier
                    .notify(Toast::error("Error", err.message.clone()))
            })?;

        let read_only = !detail.map.edit_access;
        info!(
            %map_id,
            nodes = detail.nodes.len(),
            links = detail.links.len(),
            read_only,
            "map loaded"
        );
        self.store().load(detail);
        let state = self.store().state();
        self.session()
            .reload_map(map_id, read_only, |node| state.node(node).is_some());
        Ok(())
    }

    /// Empties the store and session, as when navigating away.
    pub fn leave(&self) {
        self.store().clear();
        self.session().switch_map(None, false);
    }

    /// Opens `map_id` and keeps it synchronized until the view ends.
    ///
    /// Returns an error only if a full load fails; the view is left in that
    /// case too.
    pub async fn run(&self, map_id: MapId) -> Result<ViewExit, ActionError> {
        // A failed preference write is reported but does not stop the view.
        let _ = self.actions.set_selected_map(map_id).await;

        let result = self.drive(map_id).await;
        self.leave();
        result
    }

    async fn drive(&self, map_id: MapId) -> Result<ViewExit, ActionError> {
        self.reload(map_id).await?;

        let mut stream = MapEventStream::open(self.client.clone(), map_id, None);
        let mut announced = false;
        let mut outage = false;

        while let Some(message) = stream.next().await {
            match message {
                StreamMessage::Connected => {
                    if !announced {
                        announced = true;
                        self.notifier.notify(Toast::success("Connected to live updates"));
                    }
                    outage = false;
                }
                StreamMessage::TransportError(err) => {
                    if !outage {
                        outage = true;
                        self.notifier
                            .notify(Toast::warning("Connection lost", "Reconnecting..."));
                    }
                    warn!(%map_id, error = %err, "event stream interrupted");
                }
                StreamMessage::Closed => return Ok(ViewExit::StreamClosed),
                StreamMessage::Event { event, .. } => match self.reconciler.apply(event) {
                    ReconcileOutcome::Continue => {}
                    ReconcileOutcome::Reload { message } => {
                        stream.close();
                        if let Some(message) = message {
                            self.notifier.notify(Toast::error("Sync error", message));
                        }
                        info!(%map_id, "reloading map");
                        self.reload(map_id).await?;
                        stream = MapEventStream::open(self.client.clone(), map_id, None);
                    }
                    ReconcileOutcome::Leave(reason) => {
                        stream.close();
                        info!(%map_id, ?reason, "leaving map");
                        return Ok(ViewExit::Left(reason));
                    }
                },
            }
        }

        Ok(ViewExit::StreamClosed)
    }
}

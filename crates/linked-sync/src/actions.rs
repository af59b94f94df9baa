//! Mutation actions.
//!
//! Each action turns one user intent into one backend request (or a short
//! fixed sequence for the compound ones) and reports the outcome. Actions
//! never write to the [`crate::GraphStore`]: the change becomes visible when
//! the matching event comes back over the stream, for this viewer as for
//! everyone else. A failed request therefore leaves nothing to roll back.
//!
//! On failure an action emits exactly one error toast and returns an
//! [`ActionError`] whose message is the backend's `detail` when present,
//! otherwise the action's fixed fallback. Nothing is retried.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, warn};

use linked_core::{
    LifetimeStatus, LinkId, MapEdge, MapId, MapNode, MassStatus, NodeId, Position,
};

use crate::client::ApiClient;
use crate::error::{ActionError, ApiError, ConnectError};
use crate::notify::{Notifier, Toast};

const ERROR_TITLE: &str = "Error";

/// Nodes and links to delete for one "delete selection" gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionPlan {
    pub nodes: Vec<NodeId>,
    pub links: Vec<LinkId>,
    /// Selected nodes left alone because they are locked.
    pub skipped_locked: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// Every planned deletion succeeded.
    Completed(DeletionPlan),
    /// Every selected node was locked, so nothing was deleted at all.
    Cancelled { locked: Vec<NodeId> },
}

/// Splits a selection into what a "delete selection" gesture may remove.
///
/// Locked nodes are excluded. Returns `None` when nodes were selected but
/// all of them are locked: the gesture is then cancelled as a whole. Links
/// attached to a node being deleted are left out, since the backend removes
/// them with the node.
pub fn plan_deletion(nodes: &[&MapNode], links: &[&MapEdge]) -> Option<DeletionPlan> {
    let (locked, unlocked): (Vec<&MapNode>, Vec<&MapNode>) =
        nodes.iter().copied().partition(|n| n.locked);

    if unlocked.is_empty() && !locked.is_empty() {
        return None;
    }

    let doomed: HashSet<NodeId> = unlocked.iter().map(|n| n.id).collect();
    Some(DeletionPlan {
        nodes: unlocked.iter().map(|n| n.id).collect(),
        links: links
            .iter()
            .filter(|l| !doomed.contains(&l.source_node_id) && !doomed.contains(&l.target_node_id))
            .map(|l| l.id)
            .collect(),
        skipped_locked: locked.iter().map(|n| n.id).collect(),
    })
}

#[derive(Clone)]
pub struct MapActions {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
}

impl MapActions {
    pub fn new(client: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        MapActions { client, notifier }
    }

    fn finish<T>(&self, result: Result<T, ApiError>, fallback: &str) -> Result<T, ActionError> {
        result.map_err(|err| {
            warn!(error = %err, "{}", fallback);
            let err = ActionError::from_api(err, fallback);
            self.notifier
                .notify(Toast::error(ERROR_TITLE, err.message.clone()));
            err
        })
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    pub async fn create_node(
        &self,
        map_id: MapId,
        system_id: i64,
        position: Position,
    ) -> Result<MapNode, ActionError> {
        let result = self
            .client
            .post_json(
                &format!("/maps/{}/nodes", map_id),
                &json!({ "system_id": system_id, "pos_x": position.x, "pos_y": position.y }),
            )
            .await;
        self.finish(result, "Failed to create node")
    }

    pub async fn remove_node(&self, map_id: MapId, node_id: NodeId) -> Result<(), ActionError> {
        let result = self
            .client
            .delete(&format!("/maps/{}/nodes/{}", map_id, node_id))
            .await;
        self.finish(result, "Failed to delete node")
    }

    /// Flips the node's lock from its current state.
    pub async fn toggle_node_lock(&self, map_id: MapId, node: &MapNode) -> Result<(), ActionError> {
        let result = self
            .client
            .patch(
                &format!("/maps/{}/nodes/{}/locked", map_id, node.id),
                &json!({ "locked": !node.locked }),
            )
            .await;
        self.finish(result, "Failed to update node lock")
    }

    pub async fn update_node_position(
        &self,
        map_id: MapId,
        node_id: NodeId,
        position: Position,
    ) -> Result<(), ActionError> {
        let result = self
            .client
            .patch(
                &format!("/maps/{}/nodes/{}/position", map_id, node_id),
                &json!({ "pos_x": position.x, "pos_y": position.y }),
            )
            .await;
        self.finish(result, "Failed to update node position")
    }

    pub async fn update_node_system(
        &self,
        map_id: MapId,
        node_id: NodeId,
        system_id: i64,
    ) -> Result<(), ActionError> {
        let result = self
            .client
            .patch(
                &format!("/maps/{}/nodes/{}/system", map_id, node_id),
                &json!({ "system_id": system_id }),
            )
            .await;
        self.finish(result, "Failed to update node system")
    }

    // -----------------------------------------------------------------------
    // Links
    // -----------------------------------------------------------------------

    pub async fn create_edge(
        &self,
        map_id: MapId,
        source: NodeId,
        target: NodeId,
        wormhole_id: Option<i64>,
    ) -> Result<MapEdge, ActionError> {
        let mut body = json!({ "source_node_id": source, "target_node_id": target });
        if let Some(wormhole_id) = wormhole_id {
            body["wormhole_id"] = Value::from(wormhole_id);
        }
        let result = self
            .client
            .post_json(&format!("/maps/{}/links", map_id), &body)
            .await;
        self.finish(result, "Failed to create connection")
    }

    pub async fn remove_edge(&self, map_id: MapId, link_id: LinkId) -> Result<(), ActionError> {
        let result = self
            .client
            .delete(&format!("/maps/{}/links/{}", map_id, link_id))
            .await;
        self.finish(result, "Failed to delete connection")
    }

    pub async fn update_edge_mass_status(
        &self,
        map_id: MapId,
        link_id: LinkId,
        status: MassStatus,
    ) -> Result<(), ActionError> {
        let result = self
            .client
            .patch(
                &format!("/maps/{}/links/{}", map_id, link_id),
                &json!({ "mass_usage": status }),
            )
            .await;
        self.finish(result, "Failed to update mass status")
    }

    pub async fn update_edge_lifetime_status(
        &self,
        map_id: MapId,
        link_id: LinkId,
        status: LifetimeStatus,
    ) -> Result<(), ActionError> {
        let result = self
            .client
            .patch(
                &format!("/maps/{}/links/{}", map_id, link_id),
                &json!({ "lifetime_status": status }),
            )
            .await;
        self.finish(result, "Failed to update lifetime status")
    }

    /// Swaps source and target. The backend reports it as a `link_updated`.
    pub async fn reverse_edge(&self, map_id: MapId, link_id: LinkId) -> Result<(), ActionError> {
        let result = self
            .client
            .patch(
                &format!("/maps/{}/links/{}", map_id, link_id),
                &json!({ "reverse": true }),
            )
            .await;
        self.finish(result, "Failed to reverse connection")
    }

    /// Identifies the wormhole type as seen from `from_node`; the backend
    /// orients the link so that node becomes its source.
    pub async fn set_edge_wormhole_type(
        &self,
        map_id: MapId,
        link_id: LinkId,
        wormhole_id: i64,
        from_node: NodeId,
    ) -> Result<(), ActionError> {
        let result = self
            .client
            .patch(
                &format!("/maps/{}/links/{}/set-type", map_id, link_id),
                &json!({ "wormhole_id": wormhole_id, "from_node_id": from_node }),
            )
            .await;
        self.finish(result, "Failed to set wormhole type")
    }

    // -----------------------------------------------------------------------
    // Compound and batch
    // -----------------------------------------------------------------------

    /// Creates a node and connects `source` to it.
    ///
    /// If the node cannot be created no connection is attempted. If the
    /// connection fails the new node stays on the map and is returned in
    /// [`ConnectError::EdgeFailed`].
    pub async fn create_node_with_connection(
        &self,
        map_id: MapId,
        source: NodeId,
        system_id: i64,
        position: Position,
        wormhole_id: Option<i64>,
    ) -> Result<(MapNode, MapEdge), ConnectError> {
        let node = self
            .create_node(map_id, system_id, position)
            .await
            .map_err(ConnectError::NodeFailed)?;

        match self.create_edge(map_id, source, node.id, wormhole_id).await {
            Ok(edge) => Ok((node, edge)),
            Err(err) => {
                warn!(node_id = %node.id, "node created without its connection");
                Err(ConnectError::EdgeFailed {
                    node: Box::new(node),
                    source: err,
                })
            }
        }
    }

    /// Deletes the selection one request at a time, nodes first.
    ///
    /// Locked nodes are never deleted; if every selected node is locked
    /// nothing is deleted. Stops at the first failed deletion.
    pub async fn delete_selection(
        &self,
        map_id: MapId,
        nodes: &[&MapNode],
        links: &[&MapEdge],
    ) -> Result<DeletionOutcome, ActionError> {
        let Some(plan) = plan_deletion(nodes, links) else {
            let locked: Vec<NodeId> = nodes.iter().map(|n| n.id).collect();
            debug!(count = locked.len(), "deletion cancelled: selection is locked");
            self.notifier.notify(Toast::warning(
                "Nothing deleted",
                "Locked systems cannot be deleted",
            ));
            return Ok(DeletionOutcome::Cancelled { locked });
        };

        for node_id in &plan.nodes {
            self.remove_node(map_id, *node_id).await?;
        }
        for link_id in &plan.links {
            self.remove_edge(map_id, *link_id).await?;
        }

        Ok(DeletionOutcome::Completed(plan))
    }

    /// Sends one position update per dragged node, in order, skipping locked
    /// nodes. Returns how many nodes were moved.
    pub async fn move_selection(
        &self,
        map_id: MapId,
        moves: &[(&MapNode, Position)],
    ) -> Result<usize, ActionError> {
        let mut moved = 0;
        for (node, position) in moves {
            if node.locked {
                continue;
            }
            self.update_node_position(map_id, node.id, *position).await?;
            moved += 1;
        }
        Ok(moved)
    }

    // -----------------------------------------------------------------------
    // Preferences
    // -----------------------------------------------------------------------

    /// Records `map_id` as the viewer's default map.
    pub async fn set_selected_map(&self, map_id: MapId) -> Result<(), ActionError> {
        let result = self.client.save_selected_map(map_id).await;
        self.finish(result, "Failed to save selected map")
    }
}

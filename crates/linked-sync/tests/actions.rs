//! Mutation actions against a mock backend: request shapes, error
//! surfacing and the batch rules for locked nodes.

mod common;

use std::sync::Arc;

use axum::http::Method;
use serde_json::json;

use common::{link_json, node_json, MockBackend};
use linked_core::{
    LifetimeStatus, LinkId, MapEdge, MapId, MapNode, MassStatus, NodeId, Position,
};
use linked_sync::{
    ActionErrorKind, ApiClient, ConnectError, DeletionOutcome, MapActions, ToastLevel, ToastLog,
};

async fn setup() -> (MockBackend, MapActions, ToastLog) {
    let mock = MockBackend::new();
    let config = mock.start().await;
    let toasts = ToastLog::new();
    let actions = MapActions::new(ApiClient::new(&config), Arc::new(toasts.clone()));
    (mock, actions, toasts)
}

fn node(system_id: i64, locked: bool) -> MapNode {
    let mut node = MapNode::bare(NodeId::new_v4(), system_id, Position::default());
    node.locked = locked;
    node
}

fn node_path(map_id: MapId, node_id: NodeId) -> String {
    format!("/maps/{}/nodes/{}", map_id, node_id)
}

// ---------------------------------------------------------------------------
// Error surfacing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn backend_detail_becomes_the_error_message() {
    let (mock, actions, toasts) = setup().await;
    let map_id = MapId::new_v4();
    let node_id = NodeId::new_v4();
    mock.respond(
        Method::PATCH,
        &format!("/maps/{}/nodes/{}/position", map_id, node_id),
        403,
        json!({ "status_code": 403, "detail": "You do not have edit access" }),
    );

    let err = actions
        .update_node_position(map_id, node_id, Position { x: 10.0, y: 20.0 })
        .await
        .unwrap_err();

    assert_eq!(err.message, "You do not have edit access");
    assert_eq!(err.kind, ActionErrorKind::Rejected { status: 403 });

    let shown = toasts.take();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].level, ToastLevel::Error);
    assert_eq!(shown[0].title, "Error");
    assert_eq!(
        shown[0].description.as_deref(),
        Some("You do not have edit access")
    );
}

#[tokio::test]
async fn missing_detail_falls_back_to_action_message() {
    let (mock, actions, toasts) = setup().await;
    let map_id = MapId::new_v4();
    let link_id = LinkId::new_v4();
    mock.respond(
        Method::PATCH,
        &format!("/maps/{}/links/{}", map_id, link_id),
        500,
        json!({ "error": "boom" }),
    );

    let err = actions.reverse_edge(map_id, link_id).await.unwrap_err();

    assert_eq!(err.message, "Failed to reverse connection");
    assert_eq!(toasts.snapshot().len(), 1);
}

#[tokio::test]
async fn successful_mutation_sends_expected_body_and_no_toast() {
    let (mock, actions, toasts) = setup().await;
    let map_id = MapId::new_v4();
    let locked = node(31000005, true);

    actions.toggle_node_lock(map_id, &locked).await.unwrap();

    let path = format!("/maps/{}/nodes/{}/locked", map_id, locked.id);
    let sent = mock.requests_to(Method::PATCH, &path);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].body, json!({ "locked": false }));
    assert!(toasts.snapshot().is_empty());
}

// ---------------------------------------------------------------------------
// Request shapes
// ---------------------------------------------------------------------------

/// The one request sent to `method path`.
fn sent_once(mock: &MockBackend, method: Method, path: &str) -> serde_json::Value {
    let sent = mock.requests_to(method, path);
    assert_eq!(sent.len(), 1, "expected one request to {}", path);
    sent[0].body.clone()
}

#[tokio::test]
async fn change_system_patches_system_endpoint() {
    let (mock, actions, toasts) = setup().await;
    let map_id = MapId::new_v4();
    let node_id = NodeId::new_v4();

    actions
        .update_node_system(map_id, node_id, 31002238)
        .await
        .unwrap();

    let path = format!("{}/system", node_path(map_id, node_id));
    assert_eq!(
        sent_once(&mock, Method::PATCH, &path),
        json!({ "system_id": 31002238 })
    );
    assert!(toasts.snapshot().is_empty());
}

#[tokio::test]
async fn link_status_updates_send_one_field_each() {
    let (mock, actions, _toasts) = setup().await;
    let map_id = MapId::new_v4();
    let link_id = LinkId::new_v4();
    let path = format!("/maps/{}/links/{}", map_id, link_id);

    actions
        .update_edge_mass_status(map_id, link_id, MassStatus::Critical)
        .await
        .unwrap();
    actions
        .update_edge_lifetime_status(map_id, link_id, LifetimeStatus::Eol)
        .await
        .unwrap();
    actions.reverse_edge(map_id, link_id).await.unwrap();

    let bodies: Vec<_> = mock
        .requests_to(Method::PATCH, &path)
        .into_iter()
        .map(|r| r.body)
        .collect();
    assert_eq!(
        bodies,
        vec![
            json!({ "mass_usage": "critical" }),
            json!({ "lifetime_status": "eol" }),
            json!({ "reverse": true }),
        ]
    );
}

#[tokio::test]
async fn wormhole_type_is_set_from_a_node() {
    let (mock, actions, _toasts) = setup().await;
    let map_id = MapId::new_v4();
    let link_id = LinkId::new_v4();
    let from = NodeId::new_v4();

    actions
        .set_edge_wormhole_type(map_id, link_id, 36, from)
        .await
        .unwrap();

    let path = format!("/maps/{}/links/{}/set-type", map_id, link_id);
    assert_eq!(
        sent_once(&mock, Method::PATCH, &path),
        json!({ "wormhole_id": 36, "from_node_id": from })
    );
}

#[tokio::test]
async fn create_edge_returns_the_new_link() {
    let (mock, actions, toasts) = setup().await;
    let map_id = MapId::new_v4();
    let (source, target, link_id) = (NodeId::new_v4(), NodeId::new_v4(), LinkId::new_v4());
    let path = format!("/maps/{}/links", map_id);
    mock.respond(
        Method::POST,
        &path,
        201,
        link_json(link_id.0, source.0, target.0),
    );

    let link = actions
        .create_edge(map_id, source, target, None)
        .await
        .unwrap();

    assert_eq!(link.id, link_id);
    assert_eq!(link.source_node_id, source);
    assert_eq!(link.target_node_id, target);
    // No wormhole type given, so none is sent.
    assert_eq!(
        sent_once(&mock, Method::POST, &path),
        json!({ "source_node_id": source, "target_node_id": target })
    );
    assert!(toasts.snapshot().is_empty());
}

// ---------------------------------------------------------------------------
// Batch deletion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn locked_nodes_survive_batch_delete() {
    let (mock, actions, _toasts) = setup().await;
    let map_id = MapId::new_v4();
    let (a, pinned, c) = (node(1, false), node(2, true), node(3, false));

    let outcome = actions
        .delete_selection(map_id, &[&a, &pinned, &c], &[])
        .await
        .unwrap();

    let DeletionOutcome::Completed(plan) = outcome else {
        panic!("expected the deletion to run");
    };
    assert_eq!(plan.nodes, vec![a.id, c.id]);
    assert_eq!(plan.skipped_locked, vec![pinned.id]);

    let deleted: Vec<String> = mock
        .requests()
        .into_iter()
        .filter(|r| r.method == Method::DELETE)
        .map(|r| r.path)
        .collect();
    assert_eq!(deleted, vec![node_path(map_id, a.id), node_path(map_id, c.id)]);
}

#[tokio::test]
async fn all_locked_selection_sends_nothing() {
    let (mock, actions, toasts) = setup().await;
    let map_id = MapId::new_v4();
    let (p, q) = (node(1, true), node(2, true));
    let edge = MapEdge::between(LinkId::new_v4(), p.id, q.id);

    let outcome = actions
        .delete_selection(map_id, &[&p, &q], &[&edge])
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DeletionOutcome::Cancelled {
            locked: vec![p.id, q.id]
        }
    );
    assert!(mock.requests().is_empty());
    let shown = toasts.take();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].level, ToastLevel::Warning);
}

#[tokio::test]
async fn batch_delete_stops_at_first_failure() {
    let (mock, actions, toasts) = setup().await;
    let map_id = MapId::new_v4();
    let (a, b) = (node(1, false), node(2, false));
    mock.respond(
        Method::DELETE,
        &node_path(map_id, a.id),
        404,
        json!({ "detail": "Node not found" }),
    );

    let err = actions
        .delete_selection(map_id, &[&a, &b], &[])
        .await
        .unwrap_err();

    assert_eq!(err.message, "Node not found");
    assert!(mock
        .requests_to(Method::DELETE, &node_path(map_id, b.id))
        .is_empty());
    assert_eq!(toasts.snapshot().len(), 1);
}

#[tokio::test]
async fn links_touching_deleted_nodes_are_not_deleted_separately() {
    let (mock, actions, _toasts) = setup().await;
    let map_id = MapId::new_v4();
    let (a, b, c) = (node(1, false), node(2, false), node(3, false));
    let ab = MapEdge::between(LinkId::new_v4(), a.id, b.id);
    let bc = MapEdge::between(LinkId::new_v4(), b.id, c.id);

    actions
        .delete_selection(map_id, &[&a], &[&ab, &bc])
        .await
        .unwrap();

    let deleted: Vec<String> = mock
        .requests()
        .into_iter()
        .filter(|r| r.method == Method::DELETE)
        .map(|r| r.path)
        .collect();
    assert_eq!(
        deleted,
        vec![
            node_path(map_id, a.id),
            format!("/maps/{}/links/{}", map_id, bc.id),
        ]
    );
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

#[tokio::test]
async fn move_selection_skips_locked_nodes() {
    let (mock, actions, _toasts) = setup().await;
    let map_id = MapId::new_v4();
    let (free, pinned) = (node(1, false), node(2, true));
    let to = Position { x: 120.0, y: -40.0 };

    let moved = actions
        .move_selection(map_id, &[(&free, to), (&pinned, to)])
        .await
        .unwrap();

    assert_eq!(moved, 1);
    let patches = mock.requests();
    assert_eq!(patches.len(), 1);
    assert_eq!(
        patches[0].path,
        format!("/maps/{}/nodes/{}/position", map_id, free.id)
    );
    assert_eq!(patches[0].body, json!({ "pos_x": 120.0, "pos_y": -40.0 }));
}

// ---------------------------------------------------------------------------
// Compound create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connection_failure_keeps_the_new_node() {
    let (mock, actions, toasts) = setup().await;
    let map_id = MapId::new_v4();
    let source = NodeId::new_v4();
    let created = NodeId::new_v4();
    mock.respond(
        Method::POST,
        &format!("/maps/{}/nodes", map_id),
        201,
        node_json(created.0, 31000005, false),
    );
    mock.respond(
        Method::POST,
        &format!("/maps/{}/links", map_id),
        409,
        json!({ "detail": "Link already exists" }),
    );

    let err = actions
        .create_node_with_connection(map_id, source, 31000005, Position::default(), Some(42))
        .await
        .unwrap_err();

    match err {
        ConnectError::EdgeFailed { node, source: err } => {
            assert_eq!(node.id, created);
            assert_eq!(err.message, "Link already exists");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let links = mock.requests_to(Method::POST, &format!("/maps/{}/links", map_id));
    assert_eq!(links.len(), 1);
    assert_eq!(
        links[0].body,
        json!({ "source_node_id": source, "target_node_id": created, "wormhole_id": 42 })
    );
    // The orphan node is not rolled back.
    assert!(mock
        .requests()
        .iter()
        .all(|r| r.method != Method::DELETE));
    assert_eq!(toasts.snapshot().len(), 1);
}

#[tokio::test]
async fn node_failure_skips_the_connection() {
    let (mock, actions, _toasts) = setup().await;
    let map_id = MapId::new_v4();
    mock.respond(
        Method::POST,
        &format!("/maps/{}/nodes", map_id),
        403,
        json!({ "detail": "You do not have edit access" }),
    );

    let err = actions
        .create_node_with_connection(map_id, NodeId::new_v4(), 30000142, Position::default(), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectError::NodeFailed(_)));
    assert!(mock
        .requests_to(Method::POST, &format!("/maps/{}/links", map_id))
        .is_empty());
}

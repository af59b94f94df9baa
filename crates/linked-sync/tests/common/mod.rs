//! Mock map backend for integration tests.
//!
//! A real axum server on an ephemeral port. Every request is recorded.
//! REST responses are scripted per `(method, path)`; unscripted PATCH,
//! PUT and DELETE answer 204 and anything else answers 404 with a `detail`.
//! Each connection to `/maps/{map_id}/events` consumes the next scripted SSE
//! body and then ends; once the scripts run out the endpoint answers 204,
//! which closes the stream for good.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use uuid::Uuid;

use linked_sync::ClientConfig;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    requests: Vec<Recorded>,
    responses: HashMap<(Method, String), (StatusCode, Value)>,
    streams: VecDeque<(StatusCode, String)>,
    stream_cursors: Vec<Option<String>>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockState>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the response for `method path`.
    pub fn respond(&self, method: Method, path: &str, status: u16, body: Value) {
        let status = StatusCode::from_u16(status).unwrap();
        self.inner
            .lock()
            .unwrap()
            .responses
            .insert((method, path.to_string()), (status, body));
    }

    /// Queues the body served to the next event stream connection.
    pub fn push_stream(&self, body: String) {
        self.inner
            .lock()
            .unwrap()
            .streams
            .push_back((StatusCode::OK, body));
    }

    /// Queues a refusal for the next event stream connection.
    pub fn push_stream_status(&self, status: u16) {
        self.inner
            .lock()
            .unwrap()
            .streams
            .push_back((StatusCode::from_u16(status).unwrap(), String::new()));
    }

    /// Every REST request so far, event streams excluded.
    pub fn requests(&self) -> Vec<Recorded> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, method: Method, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// The `last_event_id` sent by each event stream connection, in order.
    pub fn stream_cursors(&self) -> Vec<Option<String>> {
        self.inner.lock().unwrap().stream_cursors.clone()
    }

    /// Starts serving and returns a client configuration pointing at it.
    pub async fn start(&self) -> ClientConfig {
        let app = Router::new()
            .route("/maps/{map_id}/events", get(events))
            .fallback(rest)
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut config = ClientConfig::new(format!("http://{}", addr).parse().unwrap())
            .with_session("test-session");
        config.reconnect_delay = Duration::from_millis(20);
        config.viewport_debounce = Duration::from_millis(50);
        config
    }
}

async fn events(
    State(mock): State<MockBackend>,
    Path(_map_id): Path<Uuid>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let next = {
        let mut state = mock.inner.lock().unwrap();
        state
            .stream_cursors
            .push(params.get("last_event_id").cloned());
        state.streams.pop_front()
    };

    match next {
        None => StatusCode::NO_CONTENT.into_response(),
        Some((status, body)) if status.is_success() => {
            ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }
        Some((status, _)) => (status, Json(json!({ "detail": "not allowed" }))).into_response(),
    }
}

async fn rest(State(mock): State<MockBackend>, method: Method, uri: Uri, body: Bytes) -> Response {
    let path = uri.path().to_string();
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };

    let mut state = mock.inner.lock().unwrap();
    state.requests.push(Recorded {
        method: method.clone(),
        path: path.clone(),
        body,
    });

    match state.responses.get(&(method.clone(), path)) {
        Some((status, body)) if body.is_null() => (*status).into_response(),
        Some((status, body)) => (*status, Json(body.clone())).into_response(),
        None if method == Method::PATCH || method == Method::PUT || method == Method::DELETE => {
            StatusCode::NO_CONTENT.into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "status_code": 404, "detail": "Not found" })),
        )
            .into_response(),
    }
}

// ---------------------------------------------------------------------------
// Payload builders
// ---------------------------------------------------------------------------

pub fn node_json(id: Uuid, system_id: i64, locked: bool) -> Value {
    json!({
        "id": id,
        "system_id": system_id,
        "pos_x": 0.0,
        "pos_y": 0.0,
        "locked": locked,
        "system_name": format!("J{}", system_id),
    })
}

pub fn link_json(id: Uuid, source: Uuid, target: Uuid) -> Value {
    json!({
        "id": id,
        "source_node_id": source,
        "target_node_id": target,
        "wormhole_code": null,
        "lifetime_status": "stable",
        "mass_usage": "stable",
    })
}

pub fn map_json(map_id: Uuid, edit_access: bool) -> Value {
    json!({
        "id": map_id,
        "owner_id": Uuid::new_v4(),
        "name": "Home chain",
        "edge_type": "default",
        "rankdir": "TB",
        "edit_access": edit_access,
    })
}

pub fn detail_json(map_id: Uuid, edit_access: bool, nodes: Vec<Value>, links: Vec<Value>) -> Value {
    json!({ "map": map_json(map_id, edit_access), "nodes": nodes, "links": links })
}

/// One SSE frame carrying the backend's event envelope.
pub fn frame(id: u64, event_type: &str, map_id: Uuid, data: Value) -> String {
    let envelope = json!({
        "event_id": id.to_string(),
        "event_type": event_type,
        "map_id": map_id,
        "timestamp": "2026-01-27T12:00:00Z",
        "data": data,
        "user_id": null,
    });
    format!("id: {}\nevent: {}\ndata: {}\n\n", id, event_type, envelope)
}

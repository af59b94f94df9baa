//! HTTP client for the map backend.
//!
//! [`ApiClient`] is cheap to clone and shared by the event stream, the
//! mutation actions, the viewport persister and the detail panels. Every
//! request carries the viewer's `session` cookie when one is configured.
//! Non-success responses become [`ApiError::Rejected`] with the body's
//! `detail` string extracted when present.

use std::time::Duration;

use reqwest::header::{ACCEPT, COOKIE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use linked_core::{EventId, MapDetail, MapId, NodeId, Note, Signature, Viewport};

use crate::config::ClientConfig;
use crate::error::ApiError;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Option<String>,
    reconnect_delay: Duration,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
            session: config.session.clone(),
            reconnect_delay: config.reconnect_delay,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Initial reconnect delay for event streams opened through this client.
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.http.request(method, format!("{}{}", self.base_url, path));
        if let Some(session) = &self.session {
            req = req.header(COOKIE, format!("session={}", session));
        }
        req
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response, ApiError> {
        let response = req.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Rejected {
            status: status.as_u16(),
            detail: error_detail(&body),
        })
    }

    // -----------------------------------------------------------------------
    // Generic verbs
    // -----------------------------------------------------------------------

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send(self.request(Method::GET, path)).await?;
        decode_body(response).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        decode_body(response).await
    }

    /// Sends a PATCH and discards whatever the backend returns.
    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), ApiError> {
        self.send(self.request(Method::PATCH, path).json(body)).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(self.request(Method::DELETE, path)).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Map reads
    // -----------------------------------------------------------------------

    /// Full map load: metadata plus every node and link.
    pub async fn load_map(&self, map_id: MapId) -> Result<MapDetail, ApiError> {
        self.get_json(&format!("/maps/{}", map_id)).await
    }

    pub async fn fetch_signatures(
        &self,
        map_id: MapId,
        node_id: NodeId,
    ) -> Result<Vec<Signature>, ApiError> {
        let list: SignatureList = self
            .get_json(&format!("/maps/{}/nodes/{}/signatures", map_id, node_id))
            .await?;
        Ok(list.signatures)
    }

    pub async fn fetch_notes(&self, map_id: MapId, system_id: i64) -> Result<Vec<Note>, ApiError> {
        let list: SystemNotes = self
            .get_json(&format!("/maps/{}/systems/{}/notes", map_id, system_id))
            .await?;
        Ok(list.notes)
    }

    // -----------------------------------------------------------------------
    // Viewer preferences
    // -----------------------------------------------------------------------

    pub async fn save_viewport(&self, map_id: MapId, viewport: Viewport) -> Result<(), ApiError> {
        self.patch(
            &format!("/users/preferences/maps/{}/viewport", map_id),
            &json!({ "viewport": viewport }),
        )
        .await
    }

    pub async fn save_selected_map(&self, map_id: MapId) -> Result<(), ApiError> {
        self.patch("/users/preferences", &json!({ "selected_map_id": map_id }))
            .await
    }

    // -----------------------------------------------------------------------
    // Event stream
    // -----------------------------------------------------------------------

    /// Builds the long-lived SSE request for `map_id`, resuming after
    /// `last_event_id` when given. An empty cursor is not sent.
    pub(crate) fn events_request(
        &self,
        map_id: MapId,
        last_event_id: Option<&EventId>,
    ) -> RequestBuilder {
        let mut req = self
            .request(Method::GET, &format!("/maps/{}/events", map_id))
            .header(ACCEPT, "text/event-stream");
        if let Some(cursor) = last_event_id.filter(|id| !id.as_str().is_empty()) {
            req = req.query(&[("last_event_id", cursor.as_str())]);
        }
        req
    }
}

async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ApiError::Decode)
}

/// `GET .../signatures` wraps the list.
#[derive(Deserialize)]
struct SignatureList {
    #[serde(default)]
    signatures: Vec<Signature>,
}

/// `GET .../systems/{id}/notes` wraps the list with the system it belongs to.
#[derive(Deserialize)]
struct SystemNotes {
    #[serde(default)]
    notes: Vec<Note>,
}

/// Extracts the `detail` string from a structured error body.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(|d| d.as_str())
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

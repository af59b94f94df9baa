//! Error types for the synchronization layer.
//!
//! [`ApiError`] is what the HTTP client returns. Mutation actions convert it
//! into an [`ActionError`], a tagged result carrying the message shown to the
//! user, so callers never probe an error body for a `detail` field themselves.

use linked_core::MapNode;
use thiserror::Error;

/// Failure of a single backend request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, TLS, body read).
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend rejected request ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, detail: Option<String> },

    /// The response body did not match the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Why a mutation action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionErrorKind {
    /// The backend refused the request.
    Rejected { status: u16 },
    /// No usable response was received.
    Network,
    /// The backend accepted the request but its response could not be read.
    Decode,
}

/// A failed mutation action, with the message already chosen for display.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ActionError {
    pub kind: ActionErrorKind,
    pub message: String,
}

impl ActionError {
    /// Converts a request failure, preferring the backend's `detail` over
    /// the action's fixed `fallback` message.
    pub fn from_api(err: ApiError, fallback: &str) -> Self {
        match err {
            ApiError::Rejected { status, detail } => ActionError {
                kind: ActionErrorKind::Rejected { status },
                message: detail
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| fallback.to_string()),
            },
            ApiError::Network(_) => ActionError {
                kind: ActionErrorKind::Network,
                message: fallback.to_string(),
            },
            ApiError::Decode(_) => ActionError {
                kind: ActionErrorKind::Decode,
                message: fallback.to_string(),
            },
        }
    }
}

/// Failure of the compound "create node, then connect it" action.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The node could not be created; no connection was attempted.
    #[error("{0}")]
    NodeFailed(ActionError),

    /// The node exists but the connection to it failed. The node is not
    /// removed again.
    #[error("{source}")]
    EdgeFailed {
        node: Box<MapNode>,
        #[source]
        source: ActionError,
    },
}

/// Transport-level failure of the event stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("event stream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("event stream refused with status {status}")]
    Status { status: u16 },

    #[error("event stream ended")]
    Ended,
}

/// Invalid client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: '{value}'")]
    InvalidUrl { var: &'static str, value: String },

    #[error("{var} must be a whole number of milliseconds, got '{value}'")]
    InvalidMillis { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_wins_over_fallback() {
        let err = ApiError::Rejected {
            status: 409,
            detail: Some("Node is locked".to_string()),
        };
        let action = ActionError::from_api(err, "Failed to delete node");
        assert_eq!(action.kind, ActionErrorKind::Rejected { status: 409 });
        assert_eq!(action.message, "Node is locked");
    }

    #[test]
    fn missing_or_blank_detail_uses_fallback() {
        let none = ActionError::from_api(
            ApiError::Rejected { status: 500, detail: None },
            "Failed to move node",
        );
        assert_eq!(none.message, "Failed to move node");

        let blank = ActionError::from_api(
            ApiError::Rejected { status: 400, detail: Some("  ".to_string()) },
            "Failed to move node",
        );
        assert_eq!(blank.message, "Failed to move node");
    }

    #[test]
    fn decode_failure_uses_fallback() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let action = ActionError::from_api(ApiError::Decode(source), "Failed to create link");
        assert_eq!(action.kind, ActionErrorKind::Decode);
        assert_eq!(action.to_string(), "Failed to create link");
    }
}

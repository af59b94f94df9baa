//! Core error types for linked-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of decoding streamed map events.

use thiserror::Error;

/// Errors produced while turning a raw stream frame into a [`crate::MapEvent`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// The frame named an event this client does not know.
    #[error("unknown event: '{name}'")]
    UnknownEvent { name: String },

    /// The frame's JSON could not be parsed into the event's payload shape.
    #[error("malformed '{name}' payload: {source}")]
    MalformedPayload {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

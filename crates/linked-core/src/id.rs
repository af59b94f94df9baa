//! Stable ID newtypes for map entities.
//!
//! Map, node and link IDs are distinct newtype wrappers over `Uuid`, so a
//! `NodeId` cannot be passed where a `LinkId` is expected. [`EventId`] is the
//! opaque resume cursor attached to every streamed event.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(pub Uuid);

/// Identity of a node, unique within its map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

/// Identity of a link (edge), unique within its map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(pub Uuid);

/// Opaque identifier of the last event a client has processed.
///
/// The backend emits a per-map counter, but clients never interpret it; it is
/// only echoed back as `last_event_id` when reconnecting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl MapId {
    pub fn new_v4() -> Self {
        MapId(Uuid::new_v4())
    }
}

impl NodeId {
    pub fn new_v4() -> Self {
        NodeId(Uuid::new_v4())
    }
}

impl LinkId {
    pub fn new_v4() -> Self {
        LinkId(Uuid::new_v4())
    }
}

impl EventId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        EventId(value.to_string())
    }
}

// Display implementations -- just print the inner value.

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

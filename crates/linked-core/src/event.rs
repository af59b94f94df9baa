//! Typed map events and their decoder.
//!
//! The backend pushes named frames whose data is a JSON envelope
//! `{event_id, event_type, map_id, timestamp, data, user_id}`. [`MapEvent::decode`]
//! turns one `(name, data)` pair into a tagged [`MapEvent`]; a bare payload
//! without the envelope is accepted as well.
//!
//! `sync_error` never fails to decode: it must always reach the consumer so
//! the view can be reloaded, whatever its payload looks like.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::CoreError;
use crate::id::{LinkId, NodeId};
use crate::model::{MapEdge, MapInfo, MapNode, NodeCharacter};

/// What happened to a side-channel record (signature or note).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
    /// Several records changed at once (signature paste/sync).
    Bulk,
}

/// How a character's presence in a node's system changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceChange {
    Arrived,
    Left,
    Updated,
}

/// Whose access grant changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSubject {
    Character,
    Corporation,
    Alliance,
}

/// One inbound domain event for the open map.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    NodeCreated(MapNode),
    NodeUpdated(MapNode),
    NodeDeleted(NodeId),
    LinkCreated(MapEdge),
    LinkUpdated(MapEdge),
    LinkDeleted(LinkId),
    MapUpdated(MapInfo),
    MapDeleted,
    /// Signatures changed; the payload is deliberately not carried.
    SignaturesChanged(ChangeKind),
    /// Notes changed; the payload is deliberately not carried.
    NotesChanged(ChangeKind),
    /// A character entered, left or changed ship/status in a node's system.
    CharacterPresence {
        node_id: NodeId,
        change: PresenceChange,
        character: NodeCharacter,
    },
    AccessGranted(AccessSubject),
    AccessRevoked(AccessSubject),
    /// The server can no longer vouch for this client's view.
    SyncError { message: Option<String> },
}

/// Event name used by frames that carry no explicit `event:` field.
pub const DEFAULT_EVENT_NAME: &str = "message";

#[derive(Deserialize)]
struct NodeRef {
    #[serde(alias = "node_id")]
    id: NodeId,
}

#[derive(Deserialize)]
struct LinkRef {
    #[serde(alias = "link_id")]
    id: LinkId,
}

/// Character location payload: the node plus the character, either nested
/// or inline next to `node_id`.
#[derive(Deserialize)]
struct Presence {
    node_id: NodeId,
    #[serde(default, alias = "character_data")]
    character: Option<NodeCharacter>,
    #[serde(flatten)]
    inline: serde_json::Map<String, Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MapChanges {
    Wrapped { changes: MapInfo },
    Bare(MapInfo),
}

impl MapEvent {
    /// Decodes one named frame.
    ///
    /// `name` is the SSE event name; when it is empty or the default
    /// `"message"`, the envelope's `event_type` is used instead.
    pub fn decode(name: &str, data: &str) -> Result<MapEvent, CoreError> {
        let parsed: Result<Value, serde_json::Error> = serde_json::from_str(data);

        let resolved = if name.is_empty() || name == DEFAULT_EVENT_NAME {
            parsed
                .as_ref()
                .ok()
                .and_then(|v| v.get("event_type"))
                .and_then(Value::as_str)
                .unwrap_or(name)
                .to_string()
        } else {
            name.to_string()
        };

        if resolved == "sync_error" {
            let message = parsed.as_ref().ok().and_then(sync_error_message);
            return Ok(MapEvent::SyncError { message });
        }

        let value = parsed.map_err(|source| CoreError::MalformedPayload {
            name: resolved.clone(),
            source,
        })?;
        let payload = unwrap_envelope(value);
        let name = resolved.as_str();

        let event = match name {
            "node_created" => MapEvent::NodeCreated(payload_as(name, payload)?),
            "node_updated" => MapEvent::NodeUpdated(payload_as(name, payload)?),
            "node_deleted" => MapEvent::NodeDeleted(payload_as::<NodeRef>(name, payload)?.id),
            "link_created" => MapEvent::LinkCreated(payload_as(name, payload)?),
            "link_updated" => MapEvent::LinkUpdated(payload_as(name, payload)?),
            "link_deleted" => MapEvent::LinkDeleted(payload_as::<LinkRef>(name, payload)?.id),
            "map_updated" => match payload_as::<MapChanges>(name, payload)? {
                MapChanges::Wrapped { changes } => MapEvent::MapUpdated(changes),
                MapChanges::Bare(map) => MapEvent::MapUpdated(map),
            },
            "map_deleted" => MapEvent::MapDeleted,
            "signature_created" => MapEvent::SignaturesChanged(ChangeKind::Created),
            "signature_updated" => MapEvent::SignaturesChanged(ChangeKind::Updated),
            "signature_deleted" => MapEvent::SignaturesChanged(ChangeKind::Deleted),
            "signatures_bulk_updated" => MapEvent::SignaturesChanged(ChangeKind::Bulk),
            "note_created" => MapEvent::NotesChanged(ChangeKind::Created),
            "note_updated" => MapEvent::NotesChanged(ChangeKind::Updated),
            "note_deleted" => MapEvent::NotesChanged(ChangeKind::Deleted),
            "character_arrived" => presence(name, payload, PresenceChange::Arrived)?,
            "character_left" => presence(name, payload, PresenceChange::Left)?,
            "character_updated" => presence(name, payload, PresenceChange::Updated)?,
            "access_character_granted" => MapEvent::AccessGranted(AccessSubject::Character),
            "access_corporation_granted" => MapEvent::AccessGranted(AccessSubject::Corporation),
            "access_alliance_granted" => MapEvent::AccessGranted(AccessSubject::Alliance),
            "access_character_revoked" => MapEvent::AccessRevoked(AccessSubject::Character),
            "access_corporation_revoked" => MapEvent::AccessRevoked(AccessSubject::Corporation),
            "access_alliance_revoked" => MapEvent::AccessRevoked(AccessSubject::Alliance),
            other => {
                return Err(CoreError::UnknownEvent {
                    name: other.to_string(),
                })
            }
        };

        Ok(event)
    }

    /// The wire name family of this event, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            MapEvent::NodeCreated(_) => "node_created",
            MapEvent::NodeUpdated(_) => "node_updated",
            MapEvent::NodeDeleted(_) => "node_deleted",
            MapEvent::LinkCreated(_) => "link_created",
            MapEvent::LinkUpdated(_) => "link_updated",
            MapEvent::LinkDeleted(_) => "link_deleted",
            MapEvent::MapUpdated(_) => "map_updated",
            MapEvent::MapDeleted => "map_deleted",
            MapEvent::SignaturesChanged(_) => "signature_*",
            MapEvent::NotesChanged(_) => "note_*",
            MapEvent::CharacterPresence { .. } => "character_*",
            MapEvent::AccessGranted(_) => "access_*_granted",
            MapEvent::AccessRevoked(_) => "access_*_revoked",
            MapEvent::SyncError { .. } => "sync_error",
        }
    }

    /// Returns `true` for events after which the stream must not continue.
    pub fn ends_stream(&self) -> bool {
        matches!(self, MapEvent::SyncError { .. })
    }
}

/// Strips the `{event_type, data, ...}` envelope if present.
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut obj) if obj.contains_key("event_type") && obj.contains_key("data") => {
            obj.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn payload_as<T: DeserializeOwned>(name: &str, payload: Value) -> Result<T, CoreError> {
    serde_json::from_value(payload).map_err(|source| CoreError::MalformedPayload {
        name: name.to_string(),
        source,
    })
}

fn presence(name: &str, payload: Value, change: PresenceChange) -> Result<MapEvent, CoreError> {
    let Presence {
        node_id,
        character,
        inline,
    } = payload_as(name, payload)?;
    let character = match character {
        Some(character) => character,
        None => payload_as(name, Value::Object(inline))?,
    };
    Ok(MapEvent::CharacterPresence {
        node_id,
        change,
        character,
    })
}

fn sync_error_message(value: &Value) -> Option<String> {
    let inner = value.get("data").unwrap_or(value);
    ["message", "detail"]
        .iter()
        .find_map(|key| inner.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|msg| !msg.is_empty())
        .map(str::to_string)
}

//! View-models for the entities of an open map.
//!
//! These mirror the backend's REST representations. Nodes and links are
//! replaced wholesale on update, so every field here is plain data with no
//! identity beyond its `id`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::id::{LinkId, MapId, NodeId};
use crate::types::{EdgeType, LifetimeStatus, MassStatus, RankDir};

/// Signature code shown on the target side of every link.
pub const RETURN_SIGNATURE_CODE: &str = "K162";

/// Placeholder shown on the source side until the wormhole type is identified.
pub const UNKNOWN_WORMHOLE_CODE: &str = "?";

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point in map space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Pan/zoom state of a map view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// A map marker bound to one solar system.
///
/// `system_id` never changes after creation except through an explicit
/// "change system" action; everything after `locked` is denormalized display
/// data supplied by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapNode {
    pub id: NodeId,
    pub system_id: i64,
    pub pos_x: f64,
    pub pos_y: f64,
    #[serde(default)]
    pub locked: bool,

    #[serde(default)]
    pub system_name: Option<String>,
    #[serde(default)]
    pub constellation_id: Option<i64>,
    #[serde(default)]
    pub constellation_name: Option<String>,
    #[serde(default)]
    pub region_id: Option<i64>,
    #[serde(default)]
    pub region_name: Option<String>,
    #[serde(default)]
    pub security_status: Option<f64>,
    #[serde(default)]
    pub security_class: Option<String>,
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default)]
    pub wh_effect_name: Option<String>,
    #[serde(default)]
    pub wh_effect_buffs: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub wh_effect_debuffs: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    pub static_codes: Vec<String>,
    #[serde(default)]
    pub static_target_classes: Vec<String>,
    /// Characters currently in this node's system.
    #[serde(default)]
    pub characters: Vec<NodeCharacter>,
}

/// A character seen in a node's system. Names identify characters here;
/// the backend does not send character ids with locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCharacter {
    pub character_name: String,
    #[serde(default)]
    pub corporation_name: Option<String>,
    #[serde(default)]
    pub alliance_name: Option<String>,
    #[serde(default)]
    pub ship_type_name: Option<String>,
    #[serde(default)]
    pub online: Option<bool>,
    #[serde(default)]
    pub docked: Option<bool>,
}

impl MapNode {
    /// A node carrying no enrichment data, as a freshly created marker would.
    pub fn bare(id: NodeId, system_id: i64, position: Position) -> Self {
        MapNode {
            id,
            system_id,
            pos_x: position.x,
            pos_y: position.y,
            locked: false,
            system_name: None,
            constellation_id: None,
            constellation_name: None,
            region_id: None,
            region_name: None,
            security_status: None,
            security_class: None,
            class_name: None,
            wh_effect_name: None,
            wh_effect_buffs: None,
            wh_effect_debuffs: None,
            static_codes: Vec::new(),
            static_target_classes: Vec::new(),
            characters: Vec::new(),
        }
    }

    pub fn position(&self) -> Position {
        Position {
            x: self.pos_x,
            y: self.pos_y,
        }
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

/// A directed connection between two nodes.
///
/// Direction matters: the source side carries the identified wormhole type,
/// the target side is always the return signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapEdge {
    pub id: LinkId,
    pub source_node_id: NodeId,
    pub target_node_id: NodeId,
    #[serde(default)]
    pub wormhole_code: Option<String>,
    #[serde(default)]
    pub wormhole_mass_total: Option<i64>,
    #[serde(default)]
    pub wormhole_mass_jump_max: Option<i64>,
    #[serde(default)]
    pub wormhole_mass_regen: Option<i64>,
    #[serde(default)]
    pub wormhole_lifetime: Option<f64>,
    #[serde(default)]
    pub lifetime_status: LifetimeStatus,
    #[serde(default)]
    pub date_lifetime_updated: Option<String>,
    #[serde(default)]
    pub mass_usage: MassStatus,
    #[serde(default)]
    pub date_mass_updated: Option<String>,
}

impl MapEdge {
    /// A fresh, unidentified connection.
    pub fn between(id: LinkId, source: NodeId, target: NodeId) -> Self {
        MapEdge {
            id,
            source_node_id: source,
            target_node_id: target,
            wormhole_code: None,
            wormhole_mass_total: None,
            wormhole_mass_jump_max: None,
            wormhole_mass_regen: None,
            wormhole_lifetime: None,
            lifetime_status: LifetimeStatus::default(),
            date_lifetime_updated: None,
            mass_usage: MassStatus::default(),
            date_mass_updated: None,
        }
    }

    /// Label for the source end: the wormhole code, or a placeholder.
    pub fn source_label(&self) -> &str {
        self.wormhole_code
            .as_deref()
            .filter(|code| !code.is_empty())
            .unwrap_or(UNKNOWN_WORMHOLE_CODE)
    }

    /// Label for the target end, which is always the return signature.
    pub fn target_label(&self) -> &str {
        RETURN_SIGNATURE_CODE
    }

    /// Returns `true` if either endpoint is `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source_node_id == node || self.target_node_id == node
    }
}

// ---------------------------------------------------------------------------
// Map metadata
// ---------------------------------------------------------------------------

/// Map metadata as seen by one viewer.
///
/// `edit_access` is computed per viewer by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapInfo {
    pub id: MapId,
    pub owner_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub public_read_only: bool,
    #[serde(default)]
    pub edge_type: EdgeType,
    #[serde(default)]
    pub rankdir: RankDir,
    #[serde(default)]
    pub auto_layout: bool,
    #[serde(default)]
    pub node_sep: Option<f64>,
    #[serde(default)]
    pub rank_sep: Option<f64>,
    #[serde(default)]
    pub edit_access: bool,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_updated: Option<String>,
}

/// Default horizontal gap between nodes in the layout pass.
pub const DEFAULT_NODE_SEP: f64 = 50.0;

/// Default gap between ranks in the layout pass.
pub const DEFAULT_RANK_SEP: f64 = 100.0;

/// Display parameters derived from map metadata.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplaySettings {
    pub edge_type: EdgeType,
    pub rankdir: RankDir,
    pub node_sep: f64,
    pub rank_sep: f64,
    pub auto_layout: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        DisplaySettings {
            edge_type: EdgeType::default(),
            rankdir: RankDir::default(),
            node_sep: DEFAULT_NODE_SEP,
            rank_sep: DEFAULT_RANK_SEP,
            auto_layout: false,
        }
    }
}

impl From<&MapInfo> for DisplaySettings {
    fn from(map: &MapInfo) -> Self {
        DisplaySettings {
            edge_type: map.edge_type,
            rankdir: map.rankdir,
            node_sep: map.node_sep.unwrap_or(DEFAULT_NODE_SEP),
            rank_sep: map.rank_sep.unwrap_or(DEFAULT_RANK_SEP),
            auto_layout: map.auto_layout,
        }
    }
}

/// A full map load: metadata plus every node and link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDetail {
    pub map: MapInfo,
    #[serde(default)]
    pub nodes: Vec<MapNode>,
    #[serde(default)]
    pub links: Vec<MapEdge>,
}

// ---------------------------------------------------------------------------
// Side-channel records
// ---------------------------------------------------------------------------

/// A cosmic signature or anomaly scanned on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub id: Uuid,
    pub node_id: NodeId,
    pub code: String,
    pub group_type: String,
    #[serde(default)]
    pub subgroup: Option<String>,
    #[serde(default, rename = "type")]
    pub site_type: Option<String>,
    #[serde(default)]
    pub link_id: Option<LinkId>,
    #[serde(default)]
    pub wormhole_id: Option<i64>,
}

/// A free-text note attached to a solar system within a map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub solar_system_id: i64,
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub date_expires: Option<String>,
}

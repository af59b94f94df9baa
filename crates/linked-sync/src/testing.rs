//! Fixtures shared by the unit tests.

use linked_core::{LinkId, MapEdge, MapId, MapInfo, MapNode, NodeId, Position, RankDir};
use uuid::Uuid;

pub(crate) fn map_info(id: MapId) -> MapInfo {
    MapInfo {
        id,
        owner_id: Uuid::new_v4(),
        name: "chain".to_string(),
        description: None,
        is_public: false,
        public_read_only: false,
        edge_type: Default::default(),
        rankdir: RankDir::TB,
        auto_layout: false,
        node_sep: None,
        rank_sep: None,
        edit_access: true,
        date_created: None,
        date_updated: None,
    }
}

pub(crate) fn node(system_id: i64) -> MapNode {
    MapNode::bare(NodeId::new_v4(), system_id, Position { x: 0.0, y: 0.0 })
}

pub(crate) fn link(source: &MapNode, target: &MapNode) -> MapEdge {
    MapEdge::between(LinkId::new_v4(), source.id, target.id)
}

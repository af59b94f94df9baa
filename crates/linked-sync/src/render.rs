//! Adapter from a store snapshot to the layout library's input arrays.
//!
//! Nodes become `{id, position, data, draggable}` and links become
//! `{id, source, target, data, labels}`. The entity `Arc`s are shared with
//! the snapshot, so an unchanged entity keeps its identity from one render
//! to the next. Links whose endpoints are missing are dropped.

use std::sync::Arc;

use linked_core::{EdgeType, LinkId, MapEdge, MapNode, NodeId, Position};

use crate::store::GraphState;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderNode {
    pub id: NodeId,
    pub position: Position,
    pub data: Arc<MapNode>,
    pub draggable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderEdge {
    pub id: LinkId,
    pub source: NodeId,
    pub target: NodeId,
    pub data: Arc<MapEdge>,
    pub edge_type: EdgeType,
    pub source_label: String,
    pub target_label: String,
}

/// Nodes in store order. Locked nodes, and every node of a read-only map,
/// cannot be dragged.
pub fn render_nodes(state: &GraphState, read_only: bool) -> Vec<RenderNode> {
    state
        .nodes()
        .map(|node| RenderNode {
            id: node.id,
            position: node.position(),
            data: Arc::clone(node),
            draggable: !read_only && !node.locked,
        })
        .collect()
}

pub fn render_edges(state: &GraphState) -> Vec<RenderEdge> {
    let edge_type = state.display().edge_type;
    state
        .links()
        .filter(|link| {
            state.node(link.source_node_id).is_some() && state.node(link.target_node_id).is_some()
        })
        .map(|link| RenderEdge {
            id: link.id,
            source: link.source_node_id,
            target: link.target_node_id,
            data: Arc::clone(link),
            edge_type,
            source_label: link.source_label().to_string(),
            target_label: link.target_label().to_string(),
        })
        .collect()
}

//! Derived graph model handed to the rendering surface.
//!
//! Never persisted: recomputed on every projection pass. Node and edge ids
//! are strings because the rendering layer treats them as opaque handles;
//! specificity node ids carry a structural prefix so a connect gesture can
//! tell the two node kinds apart.

use serde::Serialize;
use uuid::Uuid;

use bestiary_model::Position;

/// Prefix distinguishing specificity nodes from entity nodes.
pub const SPEC_NODE_PREFIX: &str = "spec-";

/// Builds the canvas node id for a specificity.
pub fn spec_node_id(specificity_id: Uuid) -> String {
    format!("{SPEC_NODE_PREFIX}{specificity_id}")
}

/// Strips the structural prefix; `None` if the id is not a specificity node.
pub fn parse_spec_node_id(node_id: &str) -> Option<Uuid> {
    node_id
        .strip_prefix(SPEC_NODE_PREFIX)
        .and_then(|raw| Uuid::parse_str(raw).ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Entity,
    Specificity,
}

/// One resolved attribute chip on an entity node. Each badge is individually
/// clickable to open the specificity editor for that (entity, attribute) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeBadge {
    pub attribute_id: Uuid,
    pub name: String,
    pub color: String,
}

/// Kind-specific payload of a canvas node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", untagged)]
pub enum NodeData {
    Entity {
        entity_id: Uuid,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        attributes: Vec<AttributeBadge>,
    },
    Specificity {
        specificity_id: Uuid,
        text: String,
        /// Distinct attribute names across all connections, joined for display.
        label: String,
        /// Color of the first resolved attribute's class.
        color: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    pub data: NodeData,
}

/// An edge from an entity's attribute handle to a specificity node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEdge {
    pub id: String,
    /// Entity node id.
    pub source: String,
    /// Attribute id on the entity side.
    pub source_handle: String,
    /// Specificity node id (prefixed).
    pub target: String,
}

/// The full derived graph for one render pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CanvasGraph {
    pub nodes: Vec<CanvasNode>,
    pub edges: Vec<CanvasEdge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_node_id_round_trips() {
        let id = Uuid::new_v4();
        assert_eq!(parse_spec_node_id(&spec_node_id(id)), Some(id));
    }

    #[test]
    fn entity_node_ids_are_not_spec_nodes() {
        assert_eq!(parse_spec_node_id(&Uuid::new_v4().to_string()), None);
        assert_eq!(parse_spec_node_id("spec-not-a-uuid"), None);
    }
}

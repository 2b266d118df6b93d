use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─────────────────────────────────────────────
// Position
// ─────────────────────────────────────────────

/// A point on the infinite design canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Same point shifted by `(dx, dy)`.
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

// ─────────────────────────────────────────────
// Attribute / GameClass
// ─────────────────────────────────────────────

/// A named trait owned by exactly one [`GameClass`], attachable to entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A taxonomy node: a colored grouping of attributes, optionally parented to
/// another class.
///
/// The `color` drives all downstream visual grouping and must always be a
/// `#RRGGBB` hex string. Deleting a class never cascades to its children —
/// their `parent_id` is cleared instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameClass {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hex RGB string, e.g. `"#8b5cf6"`.
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// Attributes nested under this class.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Direct children (shallow: their own `children` lists are empty).
    #[serde(default)]
    pub children: Vec<GameClass>,
}

// ─────────────────────────────────────────────
// Entity
// ─────────────────────────────────────────────

/// A designed object carrying a set of attribute ids drawn from any class.
///
/// `attribute_ids` is a set — order is irrelevant and duplicates never occur
/// (enforced by the join-table UNIQUE constraint). A missing `position` means
/// "place me by the deterministic default grid rule".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub attribute_ids: Vec<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

// ─────────────────────────────────────────────
// Specificity
// ─────────────────────────────────────────────

/// A join row linking a [`Specificity`] to one (entity, attribute) pair.
///
/// The id is server-assigned; the triple (specificity, entity, attribute) is
/// unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeConnection {
    pub id: Uuid,
    pub specificity_id: Uuid,
    pub entity_id: Uuid,
    pub attribute_id: Uuid,
}

/// Free text annotating one or more (entity, attribute) pairings.
///
/// Always created with at least one connection; connections can be added and
/// removed independently afterwards, possibly down to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specificity {
    pub id: Uuid,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default)]
    pub attribute_connections: Vec<AttributeConnection>,
}

impl Specificity {
    /// True if any connection targets exactly this (entity, attribute) pair.
    pub fn connects(&self, entity_id: Uuid, attribute_id: Uuid) -> bool {
        self.attribute_connections
            .iter()
            .any(|c| c.entity_id == entity_id && c.attribute_id == attribute_id)
    }
}

//! Attribute metadata resolution.
//!
//! Given an attribute id, find its display name and its owning class's color
//! by linear scan across the taxonomy. First match wins. Call volume is
//! bounded by node count (designer-scale data), so no index is built.

use uuid::Uuid;

use bestiary_model::GameClass;

/// Display name used when no class contains the attribute id.
pub const PLACEHOLDER_NAME: &str = "Attr";

/// Styling color used when no class contains the attribute id.
pub const PLACEHOLDER_COLOR: &str = "#94a3b8";

/// Resolved display metadata for one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeMeta {
    pub name: String,
    pub color: String,
}

impl AttributeMeta {
    fn placeholder() -> Self {
        Self {
            name: PLACEHOLDER_NAME.to_string(),
            color: PLACEHOLDER_COLOR.to_string(),
        }
    }
}

/// Finds the name and owning-class color for `attribute_id`.
///
/// Degrades to a fixed placeholder on a dangling id — the projection must
/// never fail on referential mismatches.
pub fn resolve(attribute_id: Uuid, classes: &[GameClass]) -> AttributeMeta {
    for class in classes {
        for attribute in &class.attributes {
            if attribute.id == attribute_id {
                return AttributeMeta {
                    name: attribute.name.clone(),
                    color: class.color.clone(),
                };
            }
        }
    }
    AttributeMeta::placeholder()
}

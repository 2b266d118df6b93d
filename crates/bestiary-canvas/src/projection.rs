//! Graph projection engine.
//!
//! `project` derives the renderable node/edge graph from the three
//! relational collections. Pure and synchronous: identical inputs produce an
//! identical graph, positions included (default positions derive from
//! insertion order). Dangling ids degrade to placeholders; this function
//! never fails.

use std::collections::HashMap;

use uuid::Uuid;

use bestiary_model::{Entity, GameClass, Position, Specificity};

use crate::model::{
    spec_node_id, AttributeBadge, CanvasEdge, CanvasGraph, CanvasNode, NodeData, NodeKind,
};
use crate::resolve::{resolve, PLACEHOLDER_COLOR};

// Default-layout constants. Entities fall on a marching grid, specificities
// hang off their first connected entity or stack in a fixed column.
const ENTITY_GRID_X0: f64 = 100.0;
const ENTITY_GRID_DX: f64 = 250.0;
const ENTITY_GRID_Y0: f64 = 100.0;
const ENTITY_GRID_DY: f64 = 200.0;
const ENTITY_GRID_ROWS: usize = 3;
const SPEC_ENTITY_OFFSET_X: f64 = 350.0;
const SPEC_STACK_X: f64 = 600.0;
const SPEC_STACK_Y0: f64 = 100.0;
const SPEC_STACK_DY: f64 = 120.0;

/// Grid slot for the entity at `index` when it has no stored position.
fn entity_default_position(index: usize) -> Position {
    Position {
        x: ENTITY_GRID_X0 + ENTITY_GRID_DX * index as f64,
        y: ENTITY_GRID_Y0 + ENTITY_GRID_DY * (index % ENTITY_GRID_ROWS) as f64,
    }
}

/// Stacked fallback slot for the specificity at `index` when neither a stored
/// position nor a connected entity position is available.
fn spec_fallback_position(index: usize) -> Position {
    Position {
        x: SPEC_STACK_X,
        y: SPEC_STACK_Y0 + SPEC_STACK_DY * index as f64,
    }
}

/// Derives nodes and edges from the three collections.
///
/// One entity node per entity, one specificity node per specificity, one edge
/// per attribute connection (source handle = attribute id).
pub fn project(
    entities: &[Entity],
    classes: &[GameClass],
    specificities: &[Specificity],
) -> CanvasGraph {
    let mut graph = CanvasGraph::default();

    // Entity nodes first; their resolved positions seed specificity placement.
    let mut entity_positions: HashMap<Uuid, Position> = HashMap::new();
    for (index, entity) in entities.iter().enumerate() {
        let position = entity
            .position
            .unwrap_or_else(|| entity_default_position(index));
        entity_positions.insert(entity.id, position);

        let attributes = entity
            .attribute_ids
            .iter()
            .map(|&attribute_id| {
                let meta = resolve(attribute_id, classes);
                AttributeBadge { attribute_id, name: meta.name, color: meta.color }
            })
            .collect();

        graph.nodes.push(CanvasNode {
            id: entity.id.to_string(),
            kind: NodeKind::Entity,
            position,
            data: NodeData::Entity {
                entity_id: entity.id,
                name: entity.name.clone(),
                description: entity.description.clone(),
                attributes,
            },
        });
    }

    for (index, spec) in specificities.iter().enumerate() {
        let node_id = spec_node_id(spec.id);

        // Stored position wins; otherwise hang off the first connection whose
        // entity is known; otherwise stack in the fallback column.
        let position = spec.position.unwrap_or_else(|| {
            spec.attribute_connections
                .iter()
                .find_map(|c| entity_positions.get(&c.entity_id))
                .map(|p| p.offset(SPEC_ENTITY_OFFSET_X, 0.0))
                .unwrap_or_else(|| spec_fallback_position(index))
        });

        // Label: distinct attribute names across all connections.
        let mut names: Vec<String> = Vec::new();
        for connection in &spec.attribute_connections {
            let name = resolve(connection.attribute_id, classes).name;
            if !names.contains(&name) {
                names.push(name);
            }
        }
        let label = names.join(" / ");

        let color = spec
            .attribute_connections
            .first()
            .map(|c| resolve(c.attribute_id, classes).color)
            .unwrap_or_else(|| PLACEHOLDER_COLOR.to_string());

        for connection in &spec.attribute_connections {
            graph.edges.push(CanvasEdge {
                id: format!("edge-{}", connection.id),
                source: connection.entity_id.to_string(),
                source_handle: connection.attribute_id.to_string(),
                target: node_id.clone(),
            });
        }

        graph.nodes.push(CanvasNode {
            id: node_id,
            kind: NodeKind::Specificity,
            position,
            data: NodeData::Specificity {
                specificity_id: spec.id,
                text: spec.text.clone(),
                label,
                color,
            },
        });
    }

    graph
}

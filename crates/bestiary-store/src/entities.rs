//! Entity CRUD.
//!
//! The attribute set lives in the `entity_attributes` join table. Creation
//! writes the entity row and its link rows in one transaction; updating the
//! set uses replace-all semantics (delete everything, reinsert), also
//! transactionally, which makes repeated updates with the same set idempotent.

use rusqlite::{params, OptionalExtension};
use tracing::{debug, instrument};
use uuid::Uuid;

use bestiary_model::{Entity, Position};

use crate::error::StoreError;
use crate::store::{self, position_from, uuid_col, DesignStore};

/// Creation payload for an entity.
#[derive(Debug, Clone, Default)]
pub struct NewEntity {
    pub name: String,
    pub description: Option<String>,
    pub position: Option<Position>,
    pub attribute_ids: Vec<Uuid>,
}

/// Partial update for an entity. `None` fields are left untouched; in
/// particular a position-only patch never disturbs the attribute set, and a
/// text-only patch never disturbs the position.
#[derive(Debug, Clone, Default)]
pub struct EntityPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub position: Option<Position>,
    pub attribute_ids: Option<Vec<Uuid>>,
}

impl DesignStore {
    /// Lists all entities in insertion order, attribute ids aggregated from
    /// the join table.
    pub fn list_entities(&self) -> Result<Vec<Entity>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, pos_x, pos_y FROM entities ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                uuid_col(row, 0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, Option<f64>>(4)?,
            ))
        })?;

        let mut entities = Vec::new();
        for row in rows {
            let (id, name, description, x, y) = row?;
            entities.push(Entity {
                id,
                name,
                description,
                attribute_ids: self.entity_attribute_ids(id)?,
                position: position_from(x, y),
            });
        }
        Ok(entities)
    }

    /// Fetches one entity by id.
    pub fn get_entity(&self, id: Uuid) -> Result<Entity, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT name, description, pos_x, pos_y FROM entities WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<f64>>(3)?,
                    ))
                },
            )
            .optional()?;
        let (name, description, x, y) =
            row.ok_or_else(|| StoreError::not_found("entity", id))?;
        Ok(Entity {
            id,
            name,
            description,
            attribute_ids: self.entity_attribute_ids(id)?,
            position: position_from(x, y),
        })
    }

    /// Creates an entity and its attribute links in one transaction.
    #[instrument(skip_all, fields(name = %new.name))]
    pub fn create_entity(&mut self, new: NewEntity) -> Result<Entity, StoreError> {
        for attribute_id in &new.attribute_ids {
            store::require(&self.conn, "attribute", "attributes", *attribute_id)?;
        }

        let id = Uuid::new_v4();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO entities (id, name, description, pos_x, pos_y)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                new.name,
                new.description,
                new.position.map(|p| p.x),
                new.position.map(|p| p.y),
            ],
        )?;
        for attribute_id in &new.attribute_ids {
            tx.execute(
                "INSERT OR IGNORE INTO entity_attributes (entity_id, attribute_id)
                 VALUES (?1, ?2)",
                params![id.to_string(), attribute_id.to_string()],
            )?;
        }
        tx.commit()?;
        debug!(%id, links = new.attribute_ids.len(), "entity created");
        self.get_entity(id)
    }

    /// Partially updates an entity. When `attribute_ids` is present the whole
    /// link set is replaced transactionally.
    #[instrument(skip_all, fields(id = %id))]
    pub fn update_entity(&mut self, id: Uuid, patch: EntityPatch) -> Result<Entity, StoreError> {
        let current = self.get_entity(id)?;
        if let Some(ids) = &patch.attribute_ids {
            for attribute_id in ids {
                store::require(&self.conn, "attribute", "attributes", *attribute_id)?;
            }
        }

        let name = patch.name.unwrap_or(current.name);
        let description = patch.description.or(current.description);
        let position = patch.position.or(current.position);

        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE entities SET name = ?1, description = ?2, pos_x = ?3, pos_y = ?4
             WHERE id = ?5",
            params![
                name,
                description,
                position.map(|p| p.x),
                position.map(|p| p.y),
                id.to_string(),
            ],
        )?;
        if let Some(ids) = &patch.attribute_ids {
            tx.execute(
                "DELETE FROM entity_attributes WHERE entity_id = ?1",
                params![id.to_string()],
            )?;
            for attribute_id in ids {
                tx.execute(
                    "INSERT OR IGNORE INTO entity_attributes (entity_id, attribute_id)
                     VALUES (?1, ?2)",
                    params![id.to_string(), attribute_id.to_string()],
                )?;
            }
        }
        tx.commit()?;
        self.get_entity(id)
    }

    /// Deletes an entity, its attribute links, and every specificity
    /// connection that references it.
    #[instrument(skip_all, fields(id = %id))]
    pub fn delete_entity(&mut self, id: Uuid) -> Result<(), StoreError> {
        store::require(&self.conn, "entity", "entities", id)?;
        let tx = self.conn.transaction()?;
        let id_str = id.to_string();
        tx.execute(
            "DELETE FROM entity_attributes WHERE entity_id = ?1",
            params![id_str],
        )?;
        tx.execute(
            "DELETE FROM attribute_connections WHERE entity_id = ?1",
            params![id_str],
        )?;
        tx.execute("DELETE FROM entities WHERE id = ?1", params![id_str])?;
        tx.commit()?;
        debug!(%id, "entity deleted");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn entity_attribute_ids(&self, entity_id: Uuid) -> Result<Vec<Uuid>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT attribute_id FROM entity_attributes WHERE entity_id = ?1 ORDER BY rowid",
        )?;
        let ids = stmt
            .query_map(params![entity_id.to_string()], |row| uuid_col(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

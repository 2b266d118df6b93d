//! Specificity CRUD and attribute-connection management.
//!
//! The canonical multi-connection model: a specificity owns free text, an
//! optional canvas position, and a list of server-assigned connection rows,
//! each pinning it to one (entity, attribute) pair. At least one connection
//! is required at creation; afterwards connections are added and removed
//! independently, possibly down to zero.

use rusqlite::{params, OptionalExtension};
use tracing::{debug, instrument};
use uuid::Uuid;

use bestiary_model::{AttributeConnection, Position, Specificity};

use crate::error::StoreError;
use crate::store::{self, position_from, uuid_col, DesignStore};

/// Creation payload for a specificity. `connections` must be non-empty.
#[derive(Debug, Clone, Default)]
pub struct NewSpecificity {
    pub text: String,
    pub position: Option<Position>,
    /// Initial (entity, attribute) pairs.
    pub connections: Vec<(Uuid, Uuid)>,
}

/// Partial update: text and/or position, never touching connections.
#[derive(Debug, Clone, Default)]
pub struct SpecificityPatch {
    pub text: Option<String>,
    pub position: Option<Position>,
}

/// Optional list filter; both fields match through the connections join.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecificityFilter {
    pub entity_id: Option<Uuid>,
    pub attribute_id: Option<Uuid>,
}

impl DesignStore {
    /// Lists specificities in insertion order, optionally restricted to those
    /// connected to a given entity and/or attribute.
    pub fn list_specificities(
        &self,
        filter: SpecificityFilter,
    ) -> Result<Vec<Specificity>, StoreError> {
        let mut ids: Vec<Uuid> = Vec::new();
        match (filter.entity_id, filter.attribute_id) {
            (None, None) => {
                let mut stmt = self
                    .conn
                    .prepare("SELECT id FROM specificities ORDER BY rowid")?;
                let rows = stmt.query_map([], |row| uuid_col(row, 0))?;
                for row in rows {
                    ids.push(row?);
                }
            }
            (entity, attribute) => {
                let mut stmt = self.conn.prepare(
                    "SELECT DISTINCT s.id FROM specificities s
                     JOIN attribute_connections c ON c.specificity_id = s.id
                     WHERE (?1 IS NULL OR c.entity_id = ?1)
                       AND (?2 IS NULL OR c.attribute_id = ?2)
                     ORDER BY s.rowid",
                )?;
                let rows = stmt.query_map(
                    params![
                        entity.map(|u| u.to_string()),
                        attribute.map(|u| u.to_string()),
                    ],
                    |row| uuid_col(row, 0),
                )?;
                for row in rows {
                    ids.push(row?);
                }
            }
        }

        let mut specs = Vec::with_capacity(ids.len());
        for id in ids {
            specs.push(self.get_specificity(id)?);
        }
        Ok(specs)
    }

    /// Fetches one specificity with its connections.
    pub fn get_specificity(&self, id: Uuid) -> Result<Specificity, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT text, pos_x, pos_y FROM specificities WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<f64>>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                    ))
                },
            )
            .optional()?;
        let (text, x, y) = row.ok_or_else(|| StoreError::not_found("specificity", id))?;
        Ok(Specificity {
            id,
            text,
            position: position_from(x, y),
            attribute_connections: self.connections_of(id)?,
        })
    }

    /// Creates a specificity and its initial connections in one transaction.
    ///
    /// Every referenced entity and attribute must exist; an empty connection
    /// list is rejected before touching storage.
    #[instrument(skip_all, fields(connections = new.connections.len()))]
    pub fn create_specificity(
        &mut self,
        new: NewSpecificity,
    ) -> Result<Specificity, StoreError> {
        if new.connections.is_empty() {
            return Err(StoreError::Constraint(
                "a specificity requires at least one attribute connection".into(),
            ));
        }
        for (entity_id, attribute_id) in &new.connections {
            store::require(&self.conn, "entity", "entities", *entity_id)?;
            store::require(&self.conn, "attribute", "attributes", *attribute_id)?;
        }

        let id = Uuid::new_v4();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO specificities (id, text, pos_x, pos_y) VALUES (?1, ?2, ?3, ?4)",
            params![
                id.to_string(),
                new.text,
                new.position.map(|p| p.x),
                new.position.map(|p| p.y),
            ],
        )?;
        for (entity_id, attribute_id) in &new.connections {
            tx.execute(
                "INSERT OR IGNORE INTO attribute_connections
                 (id, specificity_id, entity_id, attribute_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    Uuid::new_v4().to_string(),
                    id.to_string(),
                    entity_id.to_string(),
                    attribute_id.to_string(),
                ],
            )?;
        }
        tx.commit()?;
        debug!(%id, "specificity created");
        self.get_specificity(id)
    }

    /// Updates text and/or position. Connections are never touched here, and
    /// a text-only patch leaves the stored position exactly as it was.
    #[instrument(skip_all, fields(id = %id))]
    pub fn update_specificity(
        &mut self,
        id: Uuid,
        patch: SpecificityPatch,
    ) -> Result<Specificity, StoreError> {
        let current = self.get_specificity(id)?;
        let text = patch.text.unwrap_or(current.text);
        let position = patch.position.or(current.position);
        self.conn.execute(
            "UPDATE specificities SET text = ?1, pos_x = ?2, pos_y = ?3 WHERE id = ?4",
            params![
                text,
                position.map(|p| p.x),
                position.map(|p| p.y),
                id.to_string(),
            ],
        )?;
        self.get_specificity(id)
    }

    /// Deletes a specificity and its connections.
    #[instrument(skip_all, fields(id = %id))]
    pub fn delete_specificity(&mut self, id: Uuid) -> Result<(), StoreError> {
        store::require(&self.conn, "specificity", "specificities", id)?;
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM attribute_connections WHERE specificity_id = ?1",
            params![id.to_string()],
        )?;
        tx.execute(
            "DELETE FROM specificities WHERE id = ?1",
            params![id.to_string()],
        )?;
        tx.commit()?;
        debug!(%id, "specificity deleted");
        Ok(())
    }

    /// Adds one connection. The exact (specificity, entity, attribute) triple
    /// may exist at most once; a duplicate fails with
    /// [`StoreError::LinkExists`] (surfaced as 409).
    #[instrument(skip_all, fields(specificity = %specificity_id, entity = %entity_id, attribute = %attribute_id))]
    pub fn add_connection(
        &mut self,
        specificity_id: Uuid,
        entity_id: Uuid,
        attribute_id: Uuid,
    ) -> Result<AttributeConnection, StoreError> {
        store::require(&self.conn, "specificity", "specificities", specificity_id)?;
        store::require(&self.conn, "entity", "entities", entity_id)?;
        store::require(&self.conn, "attribute", "attributes", attribute_id)?;

        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM attribute_connections
             WHERE specificity_id = ?1 AND entity_id = ?2 AND attribute_id = ?3",
            params![
                specificity_id.to_string(),
                entity_id.to_string(),
                attribute_id.to_string(),
            ],
            |row| row.get(0),
        )?;
        if n > 0 {
            return Err(StoreError::LinkExists(format!(
                "specificity {specificity_id} ↔ ({entity_id}, {attribute_id})"
            )));
        }

        let connection = AttributeConnection {
            id: Uuid::new_v4(),
            specificity_id,
            entity_id,
            attribute_id,
        };
        self.conn.execute(
            "INSERT INTO attribute_connections (id, specificity_id, entity_id, attribute_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                connection.id.to_string(),
                specificity_id.to_string(),
                entity_id.to_string(),
                attribute_id.to_string(),
            ],
        )?;
        Ok(connection)
    }

    /// Removes one connection by its server-assigned id. Removing the last
    /// connection is allowed; the specificity itself stays.
    #[instrument(skip_all, fields(specificity = %specificity_id, connection = %connection_id))]
    pub fn remove_connection(
        &mut self,
        specificity_id: Uuid,
        connection_id: Uuid,
    ) -> Result<(), StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM attribute_connections WHERE id = ?1 AND specificity_id = ?2",
            params![connection_id.to_string(), specificity_id.to_string()],
        )?;
        if removed == 0 {
            return Err(StoreError::not_found("attribute connection", connection_id));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn connections_of(
        &self,
        specificity_id: Uuid,
    ) -> Result<Vec<AttributeConnection>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, specificity_id, entity_id, attribute_id
             FROM attribute_connections WHERE specificity_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(params![specificity_id.to_string()], |row| {
            Ok(AttributeConnection {
                id: uuid_col(row, 0)?,
                specificity_id: uuid_col(row, 1)?,
                entity_id: uuid_col(row, 2)?,
                attribute_id: uuid_col(row, 3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

//! Attribute CRUD and class↔attribute link management.
//!
//! Attribute names are globally unique; creation is an upsert-by-name so a
//! designer typing an existing name reuses the row instead of hitting the
//! UNIQUE constraint.

use rusqlite::{params, OptionalExtension};
use tracing::{debug, instrument};
use uuid::Uuid;

use bestiary_model::Attribute;

use crate::error::StoreError;
use crate::store::{self, uuid_col, DesignStore};

/// Partial update for an attribute. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct AttributePatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl DesignStore {
    /// Lists all attributes in insertion order.
    pub fn list_attributes(&self) -> Result<Vec<Attribute>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM attributes ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| {
            Ok(Attribute {
                id: uuid_col(row, 0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Fetches a single attribute by id.
    pub fn get_attribute(&self, id: Uuid) -> Result<Attribute, StoreError> {
        self.conn
            .query_row(
                "SELECT id, name, description FROM attributes WHERE id = ?1",
                params![id.to_string()],
                |row| {
                    Ok(Attribute {
                        id: uuid_col(row, 0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| StoreError::not_found("attribute", id))
    }

    /// Creates an attribute, or updates the description of the existing one
    /// with the same name. The boolean is `true` when a new row was inserted.
    #[instrument(skip_all, fields(name = %name))]
    pub fn upsert_attribute(
        &mut self,
        name: &str,
        description: Option<&str>,
    ) -> Result<(Attribute, bool), StoreError> {
        let existing: Option<Uuid> = self
            .conn
            .query_row(
                "SELECT id FROM attributes WHERE name = ?1",
                params![name],
                |row| uuid_col(row, 0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                if let Some(desc) = description {
                    self.conn.execute(
                        "UPDATE attributes SET description = ?1 WHERE id = ?2",
                        params![desc, id.to_string()],
                    )?;
                }
                debug!(%id, "attribute upsert matched existing name");
                Ok((self.get_attribute(id)?, false))
            }
            None => {
                let id = Uuid::new_v4();
                self.conn.execute(
                    "INSERT INTO attributes (id, name, description) VALUES (?1, ?2, ?3)",
                    params![id.to_string(), name, description],
                )?;
                debug!(%id, "attribute created");
                Ok((self.get_attribute(id)?, true))
            }
        }
    }

    /// Partially updates an attribute.
    #[instrument(skip_all, fields(id = %id))]
    pub fn update_attribute(
        &mut self,
        id: Uuid,
        patch: AttributePatch,
    ) -> Result<Attribute, StoreError> {
        let mut attr = self.get_attribute(id)?;
        if let Some(name) = patch.name {
            attr.name = name;
        }
        if let Some(description) = patch.description {
            attr.description = Some(description);
        }
        self.conn.execute(
            "UPDATE attributes SET name = ?1, description = ?2 WHERE id = ?3",
            params![attr.name, attr.description, id.to_string()],
        )?;
        Ok(attr)
    }

    /// Deletes an attribute together with every link and connection that
    /// references it.
    #[instrument(skip_all, fields(id = %id))]
    pub fn delete_attribute(&mut self, id: Uuid) -> Result<(), StoreError> {
        store::require(&self.conn, "attribute", "attributes", id)?;
        let tx = self.conn.transaction()?;
        let id_str = id.to_string();
        tx.execute(
            "DELETE FROM class_attributes WHERE attribute_id = ?1",
            params![id_str],
        )?;
        tx.execute(
            "DELETE FROM entity_attributes WHERE attribute_id = ?1",
            params![id_str],
        )?;
        tx.execute(
            "DELETE FROM attribute_connections WHERE attribute_id = ?1",
            params![id_str],
        )?;
        tx.execute("DELETE FROM attributes WHERE id = ?1", params![id_str])?;
        tx.commit()?;
        debug!(%id, "attribute deleted");
        Ok(())
    }

    /// Links an attribute to a class. Fails with [`StoreError::LinkExists`]
    /// when the pair is already linked (callers surface this as 409).
    #[instrument(skip_all, fields(class = %class_id, attribute = %attribute_id))]
    pub fn link_attribute(
        &mut self,
        class_id: Uuid,
        attribute_id: Uuid,
    ) -> Result<(), StoreError> {
        store::require(&self.conn, "game class", "game_classes", class_id)?;
        store::require(&self.conn, "attribute", "attributes", attribute_id)?;

        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM class_attributes WHERE game_class_id = ?1 AND attribute_id = ?2",
            params![class_id.to_string(), attribute_id.to_string()],
            |row| row.get(0),
        )?;
        if n > 0 {
            return Err(StoreError::LinkExists(format!(
                "class {class_id} ↔ attribute {attribute_id}"
            )));
        }

        self.conn.execute(
            "INSERT INTO class_attributes (game_class_id, attribute_id) VALUES (?1, ?2)",
            params![class_id.to_string(), attribute_id.to_string()],
        )?;
        Ok(())
    }

    /// Removes a class↔attribute link.
    #[instrument(skip_all, fields(class = %class_id, attribute = %attribute_id))]
    pub fn unlink_attribute(
        &mut self,
        class_id: Uuid,
        attribute_id: Uuid,
    ) -> Result<(), StoreError> {
        let removed = self.conn.execute(
            "DELETE FROM class_attributes WHERE game_class_id = ?1 AND attribute_id = ?2",
            params![class_id.to_string(), attribute_id.to_string()],
        )?;
        if removed == 0 {
            return Err(StoreError::not_found("class attribute link", attribute_id));
        }
        Ok(())
    }
}

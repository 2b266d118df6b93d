//! Game-class CRUD.
//!
//! Classes form a tree through `parent_id`. The one non-obvious rule lives in
//! [`DesignStore::delete_class`]: children are unlinked, never deleted.

use rusqlite::{params, OptionalExtension};
use tracing::{debug, instrument};
use uuid::Uuid;

use bestiary_model::{Attribute, GameClass};

use crate::error::StoreError;
use crate::store::{self, uuid_col, DesignStore};

/// Creation payload for a game class.
#[derive(Debug, Clone, Default)]
pub struct NewClass {
    pub name: String,
    pub description: Option<String>,
    pub color: String,
    pub parent_id: Option<Uuid>,
    /// Attributes to link immediately; duplicates in the list are skipped.
    pub attribute_ids: Vec<Uuid>,
}

/// Partial update for a game class. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ClassPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub parent_id: Option<Uuid>,
}

/// Scalar columns of a class row, before attributes/children are attached.
struct ClassRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    color: String,
    parent_id: Option<Uuid>,
}

impl DesignStore {
    /// Lists all classes in insertion order, each with its nested attributes,
    /// `parent_id`, and shallow children (a child's own `children` is empty).
    pub fn list_classes(&self) -> Result<Vec<GameClass>, StoreError> {
        let rows = self.class_rows()?;
        let mut classes = Vec::with_capacity(rows.len());
        for row in &rows {
            classes.push(GameClass {
                id: row.id,
                name: row.name.clone(),
                description: row.description.clone(),
                color: row.color.clone(),
                parent_id: row.parent_id,
                attributes: self.class_attributes(row.id)?,
                children: Vec::new(),
            });
        }
        // Attach shallow child copies after every class is assembled.
        let by_id = classes.clone();
        for class in &mut classes {
            class.children = by_id
                .iter()
                .filter(|c| c.parent_id == Some(class.id))
                .cloned()
                .collect();
        }
        Ok(classes)
    }

    /// Fetches one class (with attributes and shallow children) by id.
    pub fn get_class(&self, id: Uuid) -> Result<GameClass, StoreError> {
        let row = self
            .class_row(id)?
            .ok_or_else(|| StoreError::not_found("game class", id))?;
        let mut class = GameClass {
            id: row.id,
            name: row.name,
            description: row.description,
            color: row.color,
            parent_id: row.parent_id,
            attributes: self.class_attributes(id)?,
            children: Vec::new(),
        };
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM game_classes WHERE parent_id = ?1 ORDER BY rowid")?;
        let child_ids = stmt
            .query_map(params![id.to_string()], |row| uuid_col(row, 0))?
            .collect::<Result<Vec<_>, _>>()?;
        for child_id in child_ids {
            if let Some(child) = self.class_row(child_id)? {
                class.children.push(GameClass {
                    id: child.id,
                    name: child.name,
                    description: child.description,
                    color: child.color,
                    parent_id: child.parent_id,
                    attributes: self.class_attributes(child_id)?,
                    children: Vec::new(),
                });
            }
        }
        Ok(class)
    }

    /// Creates a class, linking any given attribute ids in the same
    /// transaction.
    #[instrument(skip_all, fields(name = %new.name))]
    pub fn create_class(&mut self, new: NewClass) -> Result<GameClass, StoreError> {
        if let Some(parent_id) = new.parent_id {
            store::require(&self.conn, "game class", "game_classes", parent_id)?;
        }
        for attribute_id in &new.attribute_ids {
            store::require(&self.conn, "attribute", "attributes", *attribute_id)?;
        }

        let id = Uuid::new_v4();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO game_classes (id, name, description, color, parent_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                id.to_string(),
                new.name,
                new.description,
                new.color,
                new.parent_id.map(|p| p.to_string()),
            ],
        )?;
        for attribute_id in &new.attribute_ids {
            tx.execute(
                "INSERT OR IGNORE INTO class_attributes (game_class_id, attribute_id)
                 VALUES (?1, ?2)",
                params![id.to_string(), attribute_id.to_string()],
            )?;
        }
        tx.commit()?;
        debug!(%id, "game class created");
        self.get_class(id)
    }

    /// Partially updates a class's scalar fields. Attribute links are managed
    /// through [`DesignStore::link_attribute`] / `unlink_attribute`.
    #[instrument(skip_all, fields(id = %id))]
    pub fn update_class(&mut self, id: Uuid, patch: ClassPatch) -> Result<GameClass, StoreError> {
        let row = self
            .class_row(id)?
            .ok_or_else(|| StoreError::not_found("game class", id))?;
        if let Some(parent_id) = patch.parent_id {
            store::require(&self.conn, "game class", "game_classes", parent_id)?;
        }

        let name = patch.name.unwrap_or(row.name);
        let description = patch.description.or(row.description);
        let color = patch.color.unwrap_or(row.color);
        let parent_id = patch.parent_id.or(row.parent_id);

        self.conn.execute(
            "UPDATE game_classes SET name = ?1, description = ?2, color = ?3, parent_id = ?4
             WHERE id = ?5",
            params![
                name,
                description,
                color,
                parent_id.map(|p| p.to_string()),
                id.to_string(),
            ],
        )?;
        self.get_class(id)
    }

    /// Deletes a class. Children are *unlinked* (their `parent_id` cleared),
    /// never cascade-deleted; attribute links are removed with the class.
    #[instrument(skip_all, fields(id = %id))]
    pub fn delete_class(&mut self, id: Uuid) -> Result<(), StoreError> {
        store::require(&self.conn, "game class", "game_classes", id)?;
        let tx = self.conn.transaction()?;
        let id_str = id.to_string();
        tx.execute(
            "UPDATE game_classes SET parent_id = NULL WHERE parent_id = ?1",
            params![id_str],
        )?;
        tx.execute(
            "DELETE FROM class_attributes WHERE game_class_id = ?1",
            params![id_str],
        )?;
        tx.execute("DELETE FROM game_classes WHERE id = ?1", params![id_str])?;
        tx.commit()?;
        debug!(%id, "game class deleted, children unlinked");
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn class_rows(&self) -> Result<Vec<ClassRow>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, color, parent_id FROM game_classes ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], Self::map_class_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn class_row(&self, id: Uuid) -> Result<Option<ClassRow>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, description, color, parent_id FROM game_classes WHERE id = ?1",
                params![id.to_string()],
                Self::map_class_row,
            )
            .optional()?)
    }

    fn map_class_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ClassRow> {
        let parent: Option<String> = row.get(4)?;
        let parent_id = match parent {
            Some(s) => Some(Uuid::parse_str(&s).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    4,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?),
            None => None,
        };
        Ok(ClassRow {
            id: uuid_col(row, 0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            color: row.get(3)?,
            parent_id,
        })
    }

    /// Attributes linked to a class, in link insertion order.
    fn class_attributes(&self, class_id: Uuid) -> Result<Vec<Attribute>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT a.id, a.name, a.description
             FROM attributes a
             JOIN class_attributes ca ON ca.attribute_id = a.id
             WHERE ca.game_class_id = ?1
             ORDER BY ca.rowid",
        )?;
        let rows = stmt.query_map(params![class_id.to_string()], |row| {
            Ok(Attribute {
                id: uuid_col(row, 0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

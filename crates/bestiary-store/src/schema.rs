//! SQLite schema bootstrap.
//!
//! All ids are UUIDv4 strings. Join tables carry UNIQUE constraints so a
//! pair (or triple, for attribute connections) can exist at most once; the
//! store pre-checks and reports [`crate::StoreError::LinkExists`] instead of
//! letting the constraint fire.

use rusqlite::Connection;

use crate::error::StoreError;

/// DDL executed on every open. `IF NOT EXISTS` makes reopening a no-op.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS attributes (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    description TEXT
);

CREATE TABLE IF NOT EXISTS game_classes (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    color       TEXT NOT NULL,
    parent_id   TEXT REFERENCES game_classes(id)
);

CREATE TABLE IF NOT EXISTS class_attributes (
    game_class_id TEXT NOT NULL REFERENCES game_classes(id),
    attribute_id  TEXT NOT NULL REFERENCES attributes(id),
    UNIQUE(game_class_id, attribute_id)
);

CREATE TABLE IF NOT EXISTS entities (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    pos_x       REAL,
    pos_y       REAL
);

CREATE TABLE IF NOT EXISTS entity_attributes (
    entity_id    TEXT NOT NULL REFERENCES entities(id),
    attribute_id TEXT NOT NULL REFERENCES attributes(id),
    UNIQUE(entity_id, attribute_id)
);

CREATE TABLE IF NOT EXISTS specificities (
    id    TEXT PRIMARY KEY,
    text  TEXT NOT NULL,
    pos_x REAL,
    pos_y REAL
);

CREATE TABLE IF NOT EXISTS attribute_connections (
    id             TEXT PRIMARY KEY,
    specificity_id TEXT NOT NULL REFERENCES specificities(id),
    entity_id      TEXT NOT NULL REFERENCES entities(id),
    attribute_id   TEXT NOT NULL REFERENCES attributes(id),
    UNIQUE(specificity_id, entity_id, attribute_id)
);
";

/// Creates all tables if they do not exist yet.
pub fn init(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

use rusqlite::{params, Connection, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use bestiary_model::Position;

use crate::error::StoreError;
use crate::schema;

/// The relational store behind every bestiary resource.
///
/// One SQLite connection; list/create/update/delete methods per resource live
/// in the sibling modules (`classes`, `attributes`, `entities`,
/// `specificities`) as `impl DesignStore` blocks. Multi-statement writes run
/// inside `rusqlite` transactions, so a partial failure never leaves half an
/// entity or a connectionless link row behind.
pub struct DesignStore {
    pub(crate) conn: Connection,
}

/// Row counts per resource, served by the stats endpoint.
#[derive(Debug, Clone, Copy)]
pub struct StoreCounts {
    pub classes: usize,
    pub attributes: usize,
    pub entities: usize,
    pub specificities: usize,
    pub connections: usize,
}

impl DesignStore {
    /// Opens (or creates) the SQLite database at the given file path.
    #[instrument(skip_all, fields(path = %path))]
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        schema::init(&conn)?;
        debug!("Opened DesignStore at {}", path);
        Ok(Self { conn })
    }

    /// Opens an in-memory SQLite database (useful for testing).
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        schema::init(&conn)?;
        debug!("Opened in-memory DesignStore");
        Ok(Self { conn })
    }

    /// Row counts across all resources.
    pub fn counts(&self) -> Result<StoreCounts, StoreError> {
        let count = |table: &str| -> Result<usize, StoreError> {
            let n: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {table}"),
                [],
                |row| row.get(0),
            )?;
            Ok(n as usize)
        };
        Ok(StoreCounts {
            classes: count("game_classes")?,
            attributes: count("attributes")?,
            entities: count("entities")?,
            specificities: count("specificities")?,
            connections: count("attribute_connections")?,
        })
    }
}

// -----------------------------------------------------------------------
// Shared row helpers (free functions so they work on transactions too)
// -----------------------------------------------------------------------

/// Reads a TEXT column as a UUID.
pub(crate) fn uuid_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Assembles a [`Position`] from nullable x/y columns. Both must be present.
pub(crate) fn position_from(x: Option<f64>, y: Option<f64>) -> Option<Position> {
    match (x, y) {
        (Some(x), Some(y)) => Some(Position { x, y }),
        _ => None,
    }
}

/// True if a row with this id exists in `table`.
pub(crate) fn exists(conn: &Connection, table: &str, id: Uuid) -> Result<bool, StoreError> {
    let n: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table} WHERE id = ?1"),
        params![id.to_string()],
        |row| row.get(0),
    )?;
    Ok(n > 0)
}

/// Fails with [`StoreError::NotFound`] unless a row with this id exists.
pub(crate) fn require(
    conn: &Connection,
    resource: &'static str,
    table: &str,
    id: Uuid,
) -> Result<(), StoreError> {
    if exists(conn, table, id)? {
        Ok(())
    } else {
        Err(StoreError::not_found(resource, id))
    }
}

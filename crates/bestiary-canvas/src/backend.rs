//! Persistence seam for the interaction controller.
//!
//! The controller never talks HTTP directly; it drives these traits. The
//! production implementation lives in `bestiary-sdk` (JSON-over-HTTP); tests
//! use an in-memory fake.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use bestiary_model::{AttributeConnection, Entity, Position, Specificity};

/// Errors surfaced by a persistence backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Transport-level failure (connection refused, timeout, bad payload).
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with an error envelope.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
}

/// Specificity persistence operations used by the controller.
#[async_trait]
pub trait SpecificityBackend: Send + Sync {
    /// Fetches the full specificity collection.
    async fn list_specificities(&self) -> Result<Vec<Specificity>, BackendError>;

    /// Creates a specificity with one initial (entity, attribute) connection.
    async fn create_specificity(
        &self,
        text: &str,
        entity_id: Uuid,
        attribute_id: Uuid,
    ) -> Result<Specificity, BackendError>;

    /// Partial update of `text` only; the stored position is untouched.
    async fn update_specificity_text(
        &self,
        id: Uuid,
        text: &str,
    ) -> Result<Specificity, BackendError>;

    /// Position-only patch.
    async fn update_specificity_position(
        &self,
        id: Uuid,
        position: Position,
    ) -> Result<Specificity, BackendError>;

    /// Adds one connection to an existing specificity.
    async fn add_connection(
        &self,
        specificity_id: Uuid,
        entity_id: Uuid,
        attribute_id: Uuid,
    ) -> Result<AttributeConnection, BackendError>;

    /// Removes one connection by its server-assigned id.
    async fn remove_connection(
        &self,
        specificity_id: Uuid,
        connection_id: Uuid,
    ) -> Result<(), BackendError>;
}

/// Entity persistence operations used by the controller (drag-release only;
/// the list CRUD belongs to the plain collection layer outside the canvas).
#[async_trait]
pub trait EntityBackend: Send + Sync {
    async fn update_entity_position(
        &self,
        id: Uuid,
        position: Position,
    ) -> Result<Entity, BackendError>;
}

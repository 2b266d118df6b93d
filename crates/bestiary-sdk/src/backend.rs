//! Canvas backend implementation over the HTTP client.
//!
//! `bestiary-canvas` drives persistence through its backend traits; this
//! module plugs [`DesignClient`] into that seam.

use async_trait::async_trait;
use uuid::Uuid;

use bestiary_canvas::{BackendError, EntityBackend, SpecificityBackend};
use bestiary_model::{AttributeConnection, Entity, Position, Specificity};

use crate::client::{
    ConnectionParams, DesignClient, EntityPatchParams, NewSpecificityParams, SdkError,
    SpecificityFilterParams, SpecificityPatchParams,
};

impl From<SdkError> for BackendError {
    fn from(e: SdkError) -> Self {
        match e {
            SdkError::Api { status, message } => {
                BackendError::Api { status: status.as_u16(), message }
            }
            other => BackendError::Request(other.to_string()),
        }
    }
}

#[async_trait]
impl SpecificityBackend for DesignClient {
    async fn list_specificities(&self) -> Result<Vec<Specificity>, BackendError> {
        Ok(DesignClient::list_specificities(self, SpecificityFilterParams::default()).await?)
    }

    async fn create_specificity(
        &self,
        text: &str,
        entity_id: Uuid,
        attribute_id: Uuid,
    ) -> Result<Specificity, BackendError> {
        let params = NewSpecificityParams {
            text: text.to_string(),
            position: None,
            connections: vec![ConnectionParams { entity_id, attribute_id }],
        };
        Ok(DesignClient::create_specificity(self, params).await?)
    }

    async fn update_specificity_text(
        &self,
        id: Uuid,
        text: &str,
    ) -> Result<Specificity, BackendError> {
        let params = SpecificityPatchParams { text: Some(text.to_string()), position: None };
        Ok(self.update_specificity(id, params).await?)
    }

    async fn update_specificity_position(
        &self,
        id: Uuid,
        position: Position,
    ) -> Result<Specificity, BackendError> {
        let params = SpecificityPatchParams { text: None, position: Some(position) };
        Ok(self.update_specificity(id, params).await?)
    }

    async fn add_connection(
        &self,
        specificity_id: Uuid,
        entity_id: Uuid,
        attribute_id: Uuid,
    ) -> Result<AttributeConnection, BackendError> {
        Ok(DesignClient::add_connection(self, specificity_id, entity_id, attribute_id).await?)
    }

    async fn remove_connection(
        &self,
        specificity_id: Uuid,
        connection_id: Uuid,
    ) -> Result<(), BackendError> {
        Ok(DesignClient::remove_connection(self, specificity_id, connection_id).await?)
    }
}

#[async_trait]
impl EntityBackend for DesignClient {
    async fn update_entity_position(
        &self,
        id: Uuid,
        position: Position,
    ) -> Result<Entity, BackendError> {
        let params = EntityPatchParams { position: Some(position), ..Default::default() };
        Ok(self.update_entity(id, params).await?)
    }
}

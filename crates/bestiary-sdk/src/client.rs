//! Async Rust client for the bestiary design API.
//!
//! Wraps a [`reqwest::Client`] with ergonomic typed methods, one per
//! endpoint. Every response travels in the standard envelope
//! (`{data, success}` on success, `{error, details?, success: false}` on
//! failure); the client unwraps it and surfaces failures as [`SdkError`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use bestiary_sdk::{DesignClient, NewClassParams};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = DesignClient::new("http://127.0.0.1:8080")?;
//!
//!     let class = client
//!         .create_class(NewClassParams {
//!             name: "Physique".into(),
//!             color: "#8b5cf6".into(),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("created class {}", class.id);
//!
//!     let (attribute, _created) = client.upsert_attribute("Ailé", None).await?;
//!     client.link_attribute(class.id, attribute.id).await?;
//!
//!     Ok(())
//! }
//! ```

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use bestiary_model::{
    Attribute, AttributeConnection, Entity, GameClass, Position, Specificity,
};

// ─────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────

/// Errors returned by [`DesignClient`] calls.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Transport-level failure before a response envelope arrived.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a failure envelope.
    #[error("api error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    /// A success envelope arrived without a `data` payload.
    #[error("malformed envelope: success response without data")]
    MissingData,
}

// ─────────────────────────────────────────────
// Wire envelope
// ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    error: Option<String>,
    success: bool,
}

// ─────────────────────────────────────────────
// Request parameter structs
// ─────────────────────────────────────────────

/// Parameters for `create_class`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClassParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Hex RGB string, e.g. `"#8b5cf6"`.
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
    /// Attributes to link at creation.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attribute_ids: Vec<Uuid>,
}

/// Partial update for a class; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPatchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

/// Parameters for `create_entity`.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntityParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attribute_ids: Vec<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// Partial update for an entity. A present `attribute_ids` replaces the full
/// link set.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPatchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_ids: Option<Vec<Uuid>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// One (entity, attribute) pair in a specificity creation request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionParams {
    pub entity_id: Uuid,
    pub attribute_id: Uuid,
}

/// Parameters for `create_specificity`. At least one connection is required.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpecificityParams {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    pub connections: Vec<ConnectionParams>,
}

/// Partial update for a specificity (text and position only; connections have
/// their own sub-resource).
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecificityPatchParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

/// Optional filters for `list_specificities`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecificityFilterParams {
    pub entity_id: Option<Uuid>,
    pub attribute_id: Option<Uuid>,
}

// ─────────────────────────────────────────────
// Response-only payloads
// ─────────────────────────────────────────────

/// Row counts from `GET /api/stats`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Stats {
    pub classes: usize,
    pub attributes: usize,
    pub entities: usize,
    pub specificities: usize,
    pub connections: usize,
}

#[derive(Debug, Deserialize)]
struct UpsertedAttribute {
    #[serde(flatten)]
    attribute: Attribute,
    created: bool,
}

// ─────────────────────────────────────────────
// DesignClient
// ─────────────────────────────────────────────

/// Async HTTP client for the design API.
///
/// Cheap to clone; the inner [`reqwest::Client`] pools connections.
#[derive(Debug, Clone)]
pub struct DesignClient {
    http: reqwest::Client,
    base_url: String,
}

impl DesignClient {
    // ── Construction ──────────────────────────────────

    /// Builds a client for a server root such as `"http://127.0.0.1:8080"`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, SdkError> {
        let http = reqwest::Client::builder().build()?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self { http, base_url })
    }

    async fn request<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, SdkError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "api request");

        let mut builder = self.http.request(method, &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = builder.send().await?;
        let status = response.status();
        let envelope: Envelope<T> = response.json().await?;

        if !envelope.success {
            return Err(SdkError::Api {
                status,
                message: envelope.error.unwrap_or_else(|| "unknown error".into()),
            });
        }
        envelope.data.ok_or(SdkError::MissingData)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SdkError> {
        self.request(Method::GET, path, None::<&()>).await
    }

    async fn delete(&self, path: &str) -> Result<(), SdkError> {
        let _: serde_json::Value = self.request(Method::DELETE, path, None::<&()>).await?;
        Ok(())
    }

    // ── Attributes ────────────────────────────────────

    /// All attributes, ordered by name.
    pub async fn list_attributes(&self) -> Result<Vec<Attribute>, SdkError> {
        self.get("/api/attributes").await
    }

    /// Creates an attribute, or returns the existing one with the same name.
    /// The boolean is `true` when a new row was created.
    pub async fn upsert_attribute(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<(Attribute, bool), SdkError> {
        let body = json!({ "name": name, "description": description });
        let upserted: UpsertedAttribute = self
            .request(Method::POST, "/api/attributes", Some(&body))
            .await?;
        Ok((upserted.attribute, upserted.created))
    }

    /// Partial update of an attribute's name and/or description.
    pub async fn update_attribute(
        &self,
        id: Uuid,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<Attribute, SdkError> {
        let mut body = serde_json::Map::new();
        if let Some(name) = name {
            body.insert("name".into(), json!(name));
        }
        if let Some(description) = description {
            body.insert("description".into(), json!(description));
        }
        self.request(
            Method::PATCH,
            &format!("/api/attributes/{id}"),
            Some(&body),
        )
        .await
    }

    /// Deletes an attribute and every link/connection that references it.
    pub async fn delete_attribute(&self, id: Uuid) -> Result<(), SdkError> {
        self.delete(&format!("/api/attributes/{id}")).await
    }

    // ── Game classes ──────────────────────────────────

    /// The full taxonomy: every class with nested attributes and shallow
    /// children.
    pub async fn list_classes(&self) -> Result<Vec<GameClass>, SdkError> {
        self.get("/api/game-classes").await
    }

    /// One class by id.
    pub async fn get_class(&self, id: Uuid) -> Result<GameClass, SdkError> {
        self.get(&format!("/api/game-classes/{id}")).await
    }

    /// Creates a class, optionally linking existing attributes.
    pub async fn create_class(&self, params: NewClassParams) -> Result<GameClass, SdkError> {
        self.request(Method::POST, "/api/game-classes", Some(&params))
            .await
    }

    /// Partial update of a class.
    pub async fn update_class(
        &self,
        id: Uuid,
        params: ClassPatchParams,
    ) -> Result<GameClass, SdkError> {
        self.request(
            Method::PATCH,
            &format!("/api/game-classes/{id}"),
            Some(&params),
        )
        .await
    }

    /// Deletes a class. Children are re-rooted, never deleted.
    pub async fn delete_class(&self, id: Uuid) -> Result<(), SdkError> {
        self.delete(&format!("/api/game-classes/{id}")).await
    }

    /// Links an existing attribute to a class.
    pub async fn link_attribute(
        &self,
        class_id: Uuid,
        attribute_id: Uuid,
    ) -> Result<GameClass, SdkError> {
        let body = json!({ "attributeId": attribute_id });
        self.request(
            Method::POST,
            &format!("/api/game-classes/{class_id}/attributes"),
            Some(&body),
        )
        .await
    }

    /// Unlinks an attribute from a class. The attribute itself survives.
    pub async fn unlink_attribute(
        &self,
        class_id: Uuid,
        attribute_id: Uuid,
    ) -> Result<(), SdkError> {
        self.delete(&format!(
            "/api/game-classes/{class_id}/attributes/{attribute_id}"
        ))
        .await
    }

    // ── Entities ──────────────────────────────────────

    pub async fn list_entities(&self) -> Result<Vec<Entity>, SdkError> {
        self.get("/api/entities").await
    }

    pub async fn get_entity(&self, id: Uuid) -> Result<Entity, SdkError> {
        self.get(&format!("/api/entities/{id}")).await
    }

    pub async fn create_entity(&self, params: NewEntityParams) -> Result<Entity, SdkError> {
        self.request(Method::POST, "/api/entities", Some(&params)).await
    }

    pub async fn update_entity(
        &self,
        id: Uuid,
        params: EntityPatchParams,
    ) -> Result<Entity, SdkError> {
        self.request(Method::PATCH, &format!("/api/entities/{id}"), Some(&params))
            .await
    }

    pub async fn delete_entity(&self, id: Uuid) -> Result<(), SdkError> {
        self.delete(&format!("/api/entities/{id}")).await
    }

    // ── Specificities ─────────────────────────────────

    /// Lists specificities, optionally filtered to those connected to a given
    /// entity and/or attribute.
    pub async fn list_specificities(
        &self,
        filter: SpecificityFilterParams,
    ) -> Result<Vec<Specificity>, SdkError> {
        let mut query = Vec::new();
        if let Some(entity_id) = filter.entity_id {
            query.push(format!("entityId={entity_id}"));
        }
        if let Some(attribute_id) = filter.attribute_id {
            query.push(format!("attributeId={attribute_id}"));
        }
        let path = if query.is_empty() {
            "/api/specificities".to_string()
        } else {
            format!("/api/specificities?{}", query.join("&"))
        };
        self.get(&path).await
    }

    pub async fn get_specificity(&self, id: Uuid) -> Result<Specificity, SdkError> {
        self.get(&format!("/api/specificities/{id}")).await
    }

    /// Creates a specificity with its initial connections (at least one).
    pub async fn create_specificity(
        &self,
        params: NewSpecificityParams,
    ) -> Result<Specificity, SdkError> {
        self.request(Method::POST, "/api/specificities", Some(&params))
            .await
    }

    /// Partial update of text and/or position. Connections are untouched.
    pub async fn update_specificity(
        &self,
        id: Uuid,
        params: SpecificityPatchParams,
    ) -> Result<Specificity, SdkError> {
        self.request(
            Method::PATCH,
            &format!("/api/specificities/{id}"),
            Some(&params),
        )
        .await
    }

    pub async fn delete_specificity(&self, id: Uuid) -> Result<(), SdkError> {
        self.delete(&format!("/api/specificities/{id}")).await
    }

    /// Adds one (entity, attribute) connection to an existing specificity.
    pub async fn add_connection(
        &self,
        specificity_id: Uuid,
        entity_id: Uuid,
        attribute_id: Uuid,
    ) -> Result<AttributeConnection, SdkError> {
        let body = json!({ "entityId": entity_id, "attributeId": attribute_id });
        self.request(
            Method::POST,
            &format!("/api/specificities/{specificity_id}/connections"),
            Some(&body),
        )
        .await
    }

    /// Removes a connection by its server-assigned id. A specificity may end
    /// up with zero connections.
    pub async fn remove_connection(
        &self,
        specificity_id: Uuid,
        connection_id: Uuid,
    ) -> Result<(), SdkError> {
        self.delete(&format!(
            "/api/specificities/{specificity_id}/connections/{connection_id}"
        ))
        .await
    }

    // ── Admin ─────────────────────────────────────────

    /// Row counts per resource.
    pub async fn stats(&self) -> Result<Stats, SdkError> {
        self.get("/api/stats").await
    }

    /// Server liveness probe.
    pub async fn health(&self) -> Result<(), SdkError> {
        let _: serde_json::Value = self.get("/api/health").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slashes_are_stripped() {
        let client = DesignClient::new("http://localhost:8080///").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn success_envelope_unwraps_data() {
        let raw = r#"{"data":{"classes":1,"attributes":2,"entities":3,"specificities":0,"connections":0},"success":true}"#;
        let envelope: Envelope<Stats> = serde_json::from_str(raw).unwrap();
        assert!(envelope.success);
        assert_eq!(envelope.data.unwrap().attributes, 2);
    }

    #[test]
    fn failure_envelope_carries_message() {
        let raw = r#"{"error":"entity not found","success":false}"#;
        let envelope: Envelope<Entity> = serde_json::from_str(raw).unwrap();
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("entity not found"));
        assert!(envelope.data.is_none());
    }

    #[test]
    fn upserted_attribute_flattens_created_flag() {
        let raw = r#"{"id":"6f2cbb3a-9f05-4f4f-8a4e-2f9d2f6a1b7c","name":"Ailé","created":false}"#;
        let upserted: UpsertedAttribute = serde_json::from_str(raw).unwrap();
        assert_eq!(upserted.attribute.name, "Ailé");
        assert!(!upserted.created);
    }

    #[test]
    fn patch_params_omit_absent_fields() {
        let v = serde_json::to_value(SpecificityPatchParams {
            text: Some("v2".into()),
            position: None,
        })
        .unwrap();
        assert_eq!(v, json!({ "text": "v2" }));
    }

    #[test]
    fn new_class_params_use_camel_case() {
        let v = serde_json::to_value(NewClassParams {
            name: "Physique".into(),
            description: None,
            color: "#8b5cf6".into(),
            parent_id: Some(Uuid::nil()),
            attribute_ids: vec![Uuid::nil()],
        })
        .unwrap();
        assert!(v.get("parentId").is_some());
        assert!(v.get("attributeIds").is_some());
        assert!(v.get("description").is_none());
    }
}

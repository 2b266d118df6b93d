//! REST API over the design store.
//!
//! Every response uses the standard envelope: `{data, success: true}` on
//! success (200, or 201 on creation), `{error, details?, success: false}` on
//! failure. CORS is permissive — the canvas UI is served from a different
//! origin during development.
//!
//! Endpoints:
//!   GET    /api/health                                     → liveness probe
//!   GET    /api/stats                                      → row counts per resource
//!   GET    /api/attributes                                 → all attributes
//!   POST   /api/attributes                                 → upsert by name
//!   PATCH  /api/attributes/:id                             → partial update
//!   DELETE /api/attributes/:id                             → delete + cascade links
//!   GET    /api/game-classes                               → full taxonomy
//!   POST   /api/game-classes                               → create class
//!   GET    /api/game-classes/:id                           → one class
//!   PATCH  /api/game-classes/:id                           → partial update
//!   DELETE /api/game-classes/:id                           → delete, children unlinked
//!   POST   /api/game-classes/:id/attributes                → link attribute
//!   DELETE /api/game-classes/:id/attributes/:attribute_id  → unlink attribute
//!   GET    /api/entities                                   → all entities
//!   POST   /api/entities                                   → create entity
//!   GET    /api/entities/:id                               → one entity
//!   PATCH  /api/entities/:id                               → partial update
//!   DELETE /api/entities/:id                               → delete + connections
//!   GET    /api/specificities[?entityId=&attributeId=]     → list, filterable
//!   POST   /api/specificities                              → create (≥1 connection)
//!   GET    /api/specificities/:id                          → one specificity
//!   PATCH  /api/specificities/:id                          → text/position patch
//!   DELETE /api/specificities/:id                          → delete + connections
//!   POST   /api/specificities/:id/connections              → add connection
//!   DELETE /api/specificities/:id/connections/:conn_id     → remove connection

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use bestiary_model::{Attribute, Position};
use bestiary_store::{
    AttributePatch, ClassPatch, DesignStore, EntityPatch, NewClass, NewEntity, NewSpecificity,
    SpecificityFilter, SpecificityPatch,
};

use crate::error::{created, ok, ApiError};
use crate::validation;

// ── Shared state ──────────────────────────────────────────────────────────────

// rusqlite connections are not Sync, so the store sits behind an async mutex.
pub type SharedStore = Arc<Mutex<DesignStore>>;

// ── Router ────────────────────────────────────────────────────────────────────

pub fn app(store: SharedStore) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/stats", get(stats))
        .route("/api/attributes", get(list_attributes).post(upsert_attribute))
        .route(
            "/api/attributes/:id",
            patch(update_attribute).delete(delete_attribute),
        )
        .route("/api/game-classes", get(list_classes).post(create_class))
        .route(
            "/api/game-classes/:id",
            get(get_class).patch(update_class).delete(delete_class),
        )
        .route("/api/game-classes/:id/attributes", post(link_attribute))
        .route(
            "/api/game-classes/:id/attributes/:attribute_id",
            delete(unlink_attribute),
        )
        .route("/api/entities", get(list_entities).post(create_entity))
        .route(
            "/api/entities/:id",
            get(get_entity).patch(update_entity).delete(delete_entity),
        )
        .route(
            "/api/specificities",
            get(list_specificities).post(create_specificity),
        )
        .route(
            "/api/specificities/:id",
            get(get_specificity)
                .patch(update_specificity)
                .delete(delete_specificity),
        )
        .route("/api/specificities/:id/connections", post(add_connection))
        .route(
            "/api/specificities/:id/connections/:connection_id",
            delete(remove_connection),
        )
        .layer(CorsLayer::permissive())
        .with_state(store)
}

// ── Admin ─────────────────────────────────────────────────────────────────────

async fn health() -> Response {
    ok(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

#[derive(Serialize)]
struct StatsBody {
    classes: usize,
    attributes: usize,
    entities: usize,
    specificities: usize,
    connections: usize,
    version: &'static str,
}

async fn stats(State(store): State<SharedStore>) -> Result<Response, ApiError> {
    let counts = store.lock().await.counts()?;
    Ok(ok(StatsBody {
        classes: counts.classes,
        attributes: counts.attributes,
        entities: counts.entities,
        specificities: counts.specificities,
        connections: counts.connections,
        version: env!("CARGO_PKG_VERSION"),
    }))
}

// ── Attributes ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertAttributeBody {
    name: String,
    description: Option<String>,
}

#[derive(Serialize)]
struct UpsertedAttribute {
    #[serde(flatten)]
    attribute: Attribute,
    created: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AttributePatchBody {
    name: Option<String>,
    description: Option<String>,
}

async fn list_attributes(State(store): State<SharedStore>) -> Result<Response, ApiError> {
    Ok(ok(store.lock().await.list_attributes()?))
}

async fn upsert_attribute(
    State(store): State<SharedStore>,
    Json(body): Json<UpsertAttributeBody>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();
    validation::check_name(&mut errors, "name", &body.name);
    validation::check_description(&mut errors, body.description.as_deref());
    validation::finish(errors)?;

    let (attribute, was_created) = store
        .lock()
        .await
        .upsert_attribute(body.name.trim(), body.description.as_deref())?;
    let payload = UpsertedAttribute { attribute, created: was_created };
    Ok(if was_created { created(payload) } else { ok(payload) })
}

async fn update_attribute(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    Json(body): Json<AttributePatchBody>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();
    if let Some(name) = &body.name {
        validation::check_name(&mut errors, "name", name);
    }
    validation::check_description(&mut errors, body.description.as_deref());
    validation::finish(errors)?;

    let patch = AttributePatch { name: body.name, description: body.description };
    Ok(ok(store.lock().await.update_attribute(id, patch)?))
}

async fn delete_attribute(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    store.lock().await.delete_attribute(id)?;
    Ok(ok(json!({ "deleted": id })))
}

// ── Game classes ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateClassBody {
    name: String,
    description: Option<String>,
    color: String,
    parent_id: Option<Uuid>,
    #[serde(default)]
    attribute_ids: Vec<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassPatchBody {
    name: Option<String>,
    description: Option<String>,
    color: Option<String>,
    parent_id: Option<Uuid>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkAttributeBody {
    attribute_id: Uuid,
}

async fn list_classes(State(store): State<SharedStore>) -> Result<Response, ApiError> {
    Ok(ok(store.lock().await.list_classes()?))
}

async fn get_class(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    Ok(ok(store.lock().await.get_class(id)?))
}

async fn create_class(
    State(store): State<SharedStore>,
    Json(body): Json<CreateClassBody>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();
    validation::check_name(&mut errors, "name", &body.name);
    validation::check_description(&mut errors, body.description.as_deref());
    validation::check_color(&mut errors, &body.color);
    validation::finish(errors)?;

    let new = NewClass {
        name: body.name.trim().to_string(),
        description: body.description,
        color: body.color,
        parent_id: body.parent_id,
        attribute_ids: body.attribute_ids,
    };
    Ok(created(store.lock().await.create_class(new)?))
}

async fn update_class(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    Json(body): Json<ClassPatchBody>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();
    if let Some(name) = &body.name {
        validation::check_name(&mut errors, "name", name);
    }
    validation::check_description(&mut errors, body.description.as_deref());
    if let Some(color) = &body.color {
        validation::check_color(&mut errors, color);
    }
    validation::finish(errors)?;

    let patch = ClassPatch {
        name: body.name,
        description: body.description,
        color: body.color,
        parent_id: body.parent_id,
    };
    Ok(ok(store.lock().await.update_class(id, patch)?))
}

async fn delete_class(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    store.lock().await.delete_class(id)?;
    Ok(ok(json!({ "deleted": id })))
}

async fn link_attribute(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    Json(body): Json<LinkAttributeBody>,
) -> Result<Response, ApiError> {
    let mut store = store.lock().await;
    store.link_attribute(id, body.attribute_id)?;
    Ok(created(store.get_class(id)?))
}

async fn unlink_attribute(
    State(store): State<SharedStore>,
    Path((id, attribute_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    store.lock().await.unlink_attribute(id, attribute_id)?;
    Ok(ok(json!({ "unlinked": attribute_id })))
}

// ── Entities ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEntityBody {
    name: String,
    description: Option<String>,
    #[serde(default)]
    attribute_ids: Vec<Uuid>,
    position: Option<Position>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EntityPatchBody {
    name: Option<String>,
    description: Option<String>,
    attribute_ids: Option<Vec<Uuid>>,
    position: Option<Position>,
}

async fn list_entities(State(store): State<SharedStore>) -> Result<Response, ApiError> {
    Ok(ok(store.lock().await.list_entities()?))
}

async fn get_entity(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    Ok(ok(store.lock().await.get_entity(id)?))
}

async fn create_entity(
    State(store): State<SharedStore>,
    Json(body): Json<CreateEntityBody>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();
    validation::check_name(&mut errors, "name", &body.name);
    validation::check_description(&mut errors, body.description.as_deref());
    validation::finish(errors)?;

    let new = NewEntity {
        name: body.name.trim().to_string(),
        description: body.description,
        position: body.position,
        attribute_ids: body.attribute_ids,
    };
    Ok(created(store.lock().await.create_entity(new)?))
}

async fn update_entity(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    Json(body): Json<EntityPatchBody>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();
    if let Some(name) = &body.name {
        validation::check_name(&mut errors, "name", name);
    }
    validation::check_description(&mut errors, body.description.as_deref());
    validation::finish(errors)?;

    let patch = EntityPatch {
        name: body.name,
        description: body.description,
        position: body.position,
        attribute_ids: body.attribute_ids,
    };
    Ok(ok(store.lock().await.update_entity(id, patch)?))
}

async fn delete_entity(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    store.lock().await.delete_entity(id)?;
    Ok(ok(json!({ "deleted": id })))
}

// ── Specificities ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionBody {
    entity_id: Uuid,
    attribute_id: Uuid,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSpecificityBody {
    text: String,
    position: Option<Position>,
    #[serde(default)]
    connections: Vec<ConnectionBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpecificityPatchBody {
    text: Option<String>,
    position: Option<Position>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpecificityQuery {
    entity_id: Option<Uuid>,
    attribute_id: Option<Uuid>,
}

async fn list_specificities(
    State(store): State<SharedStore>,
    Query(query): Query<SpecificityQuery>,
) -> Result<Response, ApiError> {
    let filter = SpecificityFilter {
        entity_id: query.entity_id,
        attribute_id: query.attribute_id,
    };
    Ok(ok(store.lock().await.list_specificities(filter)?))
}

async fn get_specificity(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    Ok(ok(store.lock().await.get_specificity(id)?))
}

async fn create_specificity(
    State(store): State<SharedStore>,
    Json(body): Json<CreateSpecificityBody>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();
    validation::check_text(&mut errors, &body.text);
    if body.connections.is_empty() {
        errors.push(crate::error::FieldError::new(
            "connections",
            "at least one connection is required",
        ));
    }
    validation::finish(errors)?;

    let new = NewSpecificity {
        text: body.text,
        position: body.position,
        connections: body
            .connections
            .into_iter()
            .map(|c| (c.entity_id, c.attribute_id))
            .collect(),
    };
    Ok(created(store.lock().await.create_specificity(new)?))
}

async fn update_specificity(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    Json(body): Json<SpecificityPatchBody>,
) -> Result<Response, ApiError> {
    let mut errors = Vec::new();
    if let Some(text) = &body.text {
        validation::check_text(&mut errors, text);
    }
    validation::finish(errors)?;

    let patch = SpecificityPatch { text: body.text, position: body.position };
    Ok(ok(store.lock().await.update_specificity(id, patch)?))
}

async fn delete_specificity(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    store.lock().await.delete_specificity(id)?;
    Ok(ok(json!({ "deleted": id })))
}

async fn add_connection(
    State(store): State<SharedStore>,
    Path(id): Path<Uuid>,
    Json(body): Json<ConnectionBody>,
) -> Result<Response, ApiError> {
    let connection = store
        .lock()
        .await
        .add_connection(id, body.entity_id, body.attribute_id)?;
    Ok(created(connection))
}

async fn remove_connection(
    State(store): State<SharedStore>,
    Path((id, connection_id)): Path<(Uuid, Uuid)>,
) -> Result<Response, ApiError> {
    store.lock().await.remove_connection(id, connection_id)?;
    Ok(ok(json!({ "removed": connection_id })))
}

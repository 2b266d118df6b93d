//! End-to-end API tests driving the router in-process against an in-memory
//! store. Every assertion goes through the HTTP surface: status codes,
//! envelope shape, and wire field names.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

use bestiary_server::app;
use bestiary_store::DesignStore;

fn test_app() -> Router {
    let store = DesignStore::open_memory().expect("in-memory store");
    app(Arc::new(Mutex::new(store)))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn id_of(envelope: &Value) -> String {
    envelope["data"]["id"].as_str().expect("data.id").to_string()
}

// 1. Liveness probe wraps its payload in the success envelope.
#[tokio::test]
async fn health_reports_ok() {
    let app = test_app();
    let (status, body) = send(&app, "GET", "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["status"], json!("ok"));
}

// 2. The canonical authoring flow: class → attribute → link → entity.
#[tokio::test]
async fn class_attribute_entity_flow() {
    let app = test_app();

    let (status, class) = send(
        &app,
        "POST",
        "/api/game-classes",
        Some(json!({ "name": "Physique", "color": "#8b5cf6" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(class["success"], json!(true));
    let class_id = id_of(&class);

    let (status, attribute) = send(
        &app,
        "POST",
        "/api/attributes",
        Some(json!({ "name": "Ailé" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(attribute["data"]["created"], json!(true));
    let attribute_id = id_of(&attribute);

    let (status, linked) = send(
        &app,
        "POST",
        &format!("/api/game-classes/{class_id}/attributes"),
        Some(json!({ "attributeId": attribute_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(linked["data"]["attributes"][0]["name"], json!("Ailé"));

    let (status, entity) = send(
        &app,
        "POST",
        "/api/entities",
        Some(json!({
            "name": "Chauve-Terreur",
            "description": "Une créature nocturne dangereuse",
            "attributeIds": [attribute_id],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entity["data"]["attributeIds"][0], json!(attribute_id));

    let (status, listed) = send(&app, "GET", "/api/entities", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
    assert_eq!(listed["data"][0]["name"], json!("Chauve-Terreur"));
}

// 3. Posting an existing attribute name reuses the row (200, created=false).
#[tokio::test]
async fn attribute_upsert_reuses_existing_name() {
    let app = test_app();

    let (status, first) =
        send(&app, "POST", "/api/attributes", Some(json!({ "name": "Cornu" }))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, second) =
        send(&app, "POST", "/api/attributes", Some(json!({ "name": "Cornu" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["data"]["created"], json!(false));
    assert_eq!(id_of(&first), id_of(&second));
}

// 4. Validation failures report every bad field in `details`.
#[tokio::test]
async fn validation_collects_all_field_errors() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/game-classes",
        Some(json!({ "name": "   ", "color": "purple" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 2);
    let fields: Vec<&str> = details.iter().map(|d| d["field"].as_str().unwrap()).collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"color"));
}

// 5. Unknown ids surface as 404 failure envelopes.
#[tokio::test]
async fn missing_entity_is_404() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "GET",
        "/api/entities/3e6f0cbb-77b4-44a8-bd85-0c9926a1e0a1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

// 6. Relinking the same class↔attribute pair conflicts.
#[tokio::test]
async fn duplicate_link_is_409() {
    let app = test_app();
    let (_, class) = send(
        &app,
        "POST",
        "/api/game-classes",
        Some(json!({ "name": "Comportement", "color": "#ef4444" })),
    )
    .await;
    let (_, attribute) =
        send(&app, "POST", "/api/attributes", Some(json!({ "name": "Agressif" }))).await;
    let class_id = id_of(&class);
    let attribute_id = id_of(&attribute);

    let uri = format!("/api/game-classes/{class_id}/attributes");
    let link = json!({ "attributeId": attribute_id });
    let (status, _) = send(&app, "POST", &uri, Some(link.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, "POST", &uri, Some(link)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], json!(false));
}

// 7. A specificity is born connected and its connections evolve independently
//    of text and position.
#[tokio::test]
async fn specificity_lifecycle() {
    let app = test_app();
    let (_, attribute) =
        send(&app, "POST", "/api/attributes", Some(json!({ "name": "Ailé" }))).await;
    let attribute_id = id_of(&attribute);
    let (_, entity) = send(
        &app,
        "POST",
        "/api/entities",
        Some(json!({ "name": "Spectre", "attributeIds": [attribute_id] })),
    )
    .await;
    let entity_id = id_of(&entity);

    // Create with one initial connection.
    let (status, spec) = send(
        &app,
        "POST",
        "/api/specificities",
        Some(json!({
            "text": "chasse uniquement la nuit",
            "connections": [{ "entityId": entity_id, "attributeId": attribute_id }],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let spec_id = id_of(&spec);
    assert_eq!(spec["data"]["attributeConnections"].as_array().unwrap().len(), 1);

    // Position patch, then a text-only patch must keep the position.
    let (status, _) = send(
        &app,
        "PATCH",
        &format!("/api/specificities/{spec_id}"),
        Some(json!({ "position": { "x": 420.0, "y": 77.0 } })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, patched) = send(
        &app,
        "PATCH",
        &format!("/api/specificities/{spec_id}"),
        Some(json!({ "text": "ne chasse qu'à la nouvelle lune" })),
    )
    .await;
    assert_eq!(patched["data"]["position"]["x"], json!(420.0));
    assert_eq!(patched["data"]["text"], json!("ne chasse qu'à la nouvelle lune"));

    // Second entity, second connection.
    let (_, other) = send(
        &app,
        "POST",
        "/api/entities",
        Some(json!({ "name": "Ombre", "attributeIds": [attribute_id] })),
    )
    .await;
    let other_id = id_of(&other);
    let conn_uri = format!("/api/specificities/{spec_id}/connections");
    let (status, connection) = send(
        &app,
        "POST",
        &conn_uri,
        Some(json!({ "entityId": other_id, "attributeId": attribute_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let connection_id = id_of(&connection);

    // The exact triple may exist only once.
    let (status, _) = send(
        &app,
        "POST",
        &conn_uri,
        Some(json!({ "entityId": other_id, "attributeId": attribute_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Filtering by entity matches through the connections join.
    let (_, filtered) = send(
        &app,
        "GET",
        &format!("/api/specificities?entityId={other_id}"),
        None,
    )
    .await;
    assert_eq!(filtered["data"].as_array().unwrap().len(), 1);

    // Removing connections down to zero is allowed; the specificity stays.
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("{conn_uri}/{connection_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, remaining) =
        send(&app, "GET", &format!("/api/specificities/{spec_id}"), None).await;
    let first_conn_id = remaining["data"]["attributeConnections"][0]["id"]
        .as_str()
        .unwrap()
        .to_string();
    let (status, _) = send(&app, "DELETE", &format!("{conn_uri}/{first_conn_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, zero) =
        send(&app, "GET", &format!("/api/specificities/{spec_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(zero["data"]["attributeConnections"].as_array().unwrap().is_empty());
}

// 8. A connectionless creation request never reaches storage.
#[tokio::test]
async fn specificity_requires_initial_connection() {
    let app = test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/specificities",
        Some(json!({ "text": "orpheline", "connections": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], json!("connections"));
}

// 9. Deleting a class re-roots its children instead of cascading.
#[tokio::test]
async fn class_delete_unlinks_children() {
    let app = test_app();
    let (_, parent) = send(
        &app,
        "POST",
        "/api/game-classes",
        Some(json!({ "name": "Créature", "color": "#10b981" })),
    )
    .await;
    let parent_id = id_of(&parent);
    let (_, child) = send(
        &app,
        "POST",
        "/api/game-classes",
        Some(json!({ "name": "Volant", "color": "#0ea5e9", "parentId": parent_id })),
    )
    .await;
    let child_id = id_of(&child);

    let (status, _) =
        send(&app, "DELETE", &format!("/api/game-classes/{parent_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, orphan) =
        send(&app, "GET", &format!("/api/game-classes/{child_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(orphan["data"]["parentId"].is_null());
}

// 10. Stats reflect every resource written during a session.
#[tokio::test]
async fn stats_count_all_resources() {
    let app = test_app();
    let (_, class) = send(
        &app,
        "POST",
        "/api/game-classes",
        Some(json!({ "name": "Physique", "color": "#8b5cf6" })),
    )
    .await;
    let (_, attribute) =
        send(&app, "POST", "/api/attributes", Some(json!({ "name": "Ailé" }))).await;
    let attribute_id = id_of(&attribute);
    send(
        &app,
        "POST",
        &format!("/api/game-classes/{}/attributes", id_of(&class)),
        Some(json!({ "attributeId": attribute_id })),
    )
    .await;
    let (_, entity) = send(
        &app,
        "POST",
        "/api/entities",
        Some(json!({ "name": "Chauve-Terreur", "attributeIds": [attribute_id] })),
    )
    .await;
    send(
        &app,
        "POST",
        "/api/specificities",
        Some(json!({
            "text": "chasse uniquement la nuit",
            "connections": [{ "entityId": id_of(&entity), "attributeId": attribute_id }],
        })),
    )
    .await;

    let (status, stats) = send(&app, "GET", "/api/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data"]["classes"], json!(1));
    assert_eq!(stats["data"]["attributes"], json!(1));
    assert_eq!(stats["data"]["entities"], json!(1));
    assert_eq!(stats["data"]["specificities"], json!(1));
    assert_eq!(stats["data"]["connections"], json!(1));
}

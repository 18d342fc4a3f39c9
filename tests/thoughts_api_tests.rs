use actix_web::{test, web, App};
use serde_json::json;
use std::sync::Arc;

use thoughts_journal::api::{self, AppState};
use thoughts_journal::blob::SqliteBlobStore;
use thoughts_journal::store::Store;

/// Helper to create AppState backed by an in-memory store
fn create_app_state(store: Arc<Store>) -> AppState {
    AppState {
        store: store.clone(),
        blobs: Arc::new(SqliteBlobStore::new(store, "")),
        passphrase: "test-passphrase".to_string(),
    }
}

/// Helper macro to create a thought and return the response body
macro_rules! create_thought {
    ($app:expr, $content:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/thoughts")
            .set_json(json!({ "content": $content }))
            .to_request();

        let resp: serde_json::Value = test::call_and_read_body_json(&$app, req).await;
        resp
    }};
}

macro_rules! list_thoughts {
    ($app:expr) => {{
        let req = test::TestRequest::get().uri("/api/thoughts").to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&$app, req).await;
        resp.as_array().unwrap().clone()
    }};
}

// ==================== Create Thought Tests ====================

#[actix_web::test]
async fn test_create_thought_without_image() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    let resp = create_thought!(app, "My first thought");

    // API returns the plain Thought object
    assert_eq!(resp["content"], "My first thought");
    assert!(resp["imageUrl"].is_null());
    assert!(resp["id"].is_i64());
    assert!(resp["createdAt"].is_string());

    let second = create_thought!(app, "Another thought");
    assert_ne!(second["id"], resp["id"]);
}

#[actix_web::test]
async fn test_create_thought_with_image_url() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    let req = test::TestRequest::post()
        .uri("/api/thoughts")
        .set_json(json!({
            "content": "Look at this",
            "imageUrl": "https://cdn.example.com/look.png"
        }))
        .to_request();

    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["imageUrl"], "https://cdn.example.com/look.png");

    let stored = store.get_thought(resp["id"].as_i64().unwrap()).unwrap();
    assert_eq!(stored.image_url.as_deref(), Some("https://cdn.example.com/look.png"));
}

#[actix_web::test]
async fn test_create_thought_empty_image_url_is_null() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    let req = test::TestRequest::post()
        .uri("/api/thoughts")
        .set_json(json!({ "content": "No picture", "imageUrl": "" }))
        .to_request();

    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert!(resp["imageUrl"].is_null());
}

#[actix_web::test]
async fn test_create_thought_requires_content() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    for body in [json!({}), json!({ "content": "" }), json!({ "content": null })] {
        let req = test::TestRequest::post()
            .uri("/api/thoughts")
            .set_json(body)
            .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Content is required");
    }

    assert_eq!(store.count_thoughts().unwrap(), 0);
}

#[actix_web::test]
async fn test_create_thought_malformed_json() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    let req = test::TestRequest::post()
        .uri("/api/thoughts")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid request body");
    assert_eq!(store.count_thoughts().unwrap(), 0);
}

#[actix_web::test]
async fn test_create_thought_larger_than_json_default() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    // actix's own JSON limit is 2 MiB
    let content = "a".repeat(3 * 1024 * 1024);
    let req = test::TestRequest::post()
        .uri("/api/thoughts")
        .set_json(json!({ "content": content }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let thoughts = store.list_thoughts().unwrap();
    assert_eq!(thoughts.len(), 1);
    assert_eq!(thoughts[0].content.len(), 3 * 1024 * 1024);
}

#[actix_web::test]
async fn test_create_thought_over_payload_limit() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(|cfg| api::configure_routes_with_limit(cfg, 1024))
    ).await;

    let req = test::TestRequest::post()
        .uri("/api/thoughts")
        .set_json(json!({ "content": "a".repeat(2048) }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Invalid request body");
    assert_eq!(store.count_thoughts().unwrap(), 0);
}

// ==================== List Thought Tests ====================

#[actix_web::test]
async fn test_list_thoughts_empty() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    let thoughts = list_thoughts!(app);
    assert!(thoughts.is_empty());
}

#[actix_web::test]
async fn test_list_thoughts_newest_first() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    let mut created_ids = Vec::new();
    for content in ["first", "second", "third"] {
        let resp = create_thought!(app, content);
        created_ids.push(resp["id"].as_i64().unwrap());
    }

    let thoughts = list_thoughts!(app);
    assert_eq!(thoughts.len(), 3);

    let contents: Vec<&str> = thoughts.iter().map(|t| t["content"].as_str().unwrap()).collect();
    assert_eq!(contents, vec!["third", "second", "first"]);

    let ids: Vec<i64> = thoughts.iter().map(|t| t["id"].as_i64().unwrap()).collect();
    created_ids.reverse();
    assert_eq!(ids, created_ids);
}

// ==================== Delete Thought Tests ====================

#[actix_web::test]
async fn test_delete_thought() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    let keep = create_thought!(app, "keep me");
    let remove = create_thought!(app, "remove me");

    let req = test::TestRequest::post()
        .uri("/api/delete-thought")
        .set_json(json!({ "id": remove["id"] }))
        .to_request();

    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp, json!({ "success": true }));

    let thoughts = list_thoughts!(app);
    assert_eq!(thoughts.len(), 1);
    assert_eq!(thoughts[0]["id"], keep["id"]);
}

#[actix_web::test]
async fn test_delete_thought_with_string_id() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    let thought = create_thought!(app, "string id");
    let id = thought["id"].as_i64().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/delete-thought")
        .set_json(json!({ "id": id }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(store.count_thoughts().unwrap(), 0);
}

#[actix_web::test]
async fn test_delete_missing_thought() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    create_thought!(app, "bystander");

    let req = test::TestRequest::post()
        .uri("/api/delete-thought")
        .set_json(json!({ "id": 424242 }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Thought not found");

    // Other records are untouched
    assert_eq!(list_thoughts!(app).len(), 1);
}

#[actix_web::test]
async fn test_delete_invalid_id() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    create_thought!(app, "bystander");

    let req = test::TestRequest::post()
        .uri("/api/delete-thought")
        .set_json(json!({ "id": "not-a-number" }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    assert_eq!(store.count_thoughts().unwrap(), 1);

    let req = test::TestRequest::post()
        .uri("/api/delete-thought")
        .set_json(json!({}))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    assert_eq!(store.count_thoughts().unwrap(), 1);
}

// ==================== Scenarios ====================

#[actix_web::test]
async fn test_create_list_delete_scenario() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    let created = create_thought!(app, "hello world");

    let thoughts = list_thoughts!(app);
    assert_eq!(thoughts.len(), 1);
    assert_eq!(thoughts[0]["content"], "hello world");
    assert_eq!(thoughts[0]["id"], created["id"]);
    assert_eq!(thoughts[0]["createdAt"], created["createdAt"]);

    let req = test::TestRequest::post()
        .uri("/api/delete-thought")
        .set_json(json!({ "id": created["id"] }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    assert!(list_thoughts!(app).is_empty());
}

#[actix_web::test]
async fn test_health() {
    let store = Arc::new(Store::in_memory().unwrap());
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(create_app_state(store.clone())))
            .configure(api::configure_routes)
    ).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["status"], "ok");
}

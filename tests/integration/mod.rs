//! Integration tests for the account service HTTP API.
//!
//! Every scenario runs against both store backends: the in-memory map and
//! an in-memory SQLite database.
//!
//! Run with: cargo test --test integration

use std::sync::Arc;

use account_service::api::{create_router, AppState};
use account_service::store::{AccountStore, MemoryStore, SqliteStore};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

const BASE_URL: &str = "/accounts";

/// In-process client around one router and the store behind it.
struct TestApp {
    router: Router,
    store: Arc<dyn AccountStore>,
}

impl TestApp {
    fn with_store(store: Arc<dyn AccountStore>) -> Self {
        let router = create_router(AppState::new(store.clone()));
        Self { router, store }
    }

    fn memory() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    async fn sqlite() -> Self {
        let store = SqliteStore::connect("sqlite::memory:")
            .await
            .expect("failed to open in-memory sqlite");
        Self::with_store(Arc::new(store))
    }

    async fn send(&self, method: Method, uri: &str, content_type: Option<&str>, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let body = match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        };

        self.dispatch(builder.body(body).unwrap()).await
    }

    async fn dispatch(&self, request: Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    async fn post_json(&self, body: Value) -> Response {
        self.send(Method::POST, BASE_URL, Some("application/json"), Some(body)).await
    }

    async fn put_json(&self, id: i64, body: Value) -> Response {
        self.send(Method::PUT, &format!("{BASE_URL}/{id}"), Some("application/json"), Some(body))
            .await
    }

    async fn get(&self, uri: &str) -> Response {
        self.send(Method::GET, uri, None, None).await
    }

    async fn delete(&self, id: i64) -> Response {
        self.send(Method::DELETE, &format!("{BASE_URL}/{id}"), None, None).await
    }

    /// Create `count` accounts through the API and return their bodies.
    async fn create_accounts(&self, count: usize) -> Vec<Value> {
        let mut accounts = Vec::with_capacity(count);
        for n in 1..=count {
            let response = self
                .post_json(json!({"name": format!("Account {n}"), "email": format!("user{n}@example.com")}))
                .await;
            assert_eq!(response.status(), StatusCode::CREATED);
            accounts.push(body_json(response).await);
        }
        accounts
    }

    async fn stored_count(&self) -> usize {
        self.store.all().await.unwrap().len()
    }
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
}

/// Run a scenario against both backends.
macro_rules! both_backends {
    ($name:ident, $scenario:ident) => {
        mod $name {
            use super::*;

            #[tokio::test]
            async fn memory() {
                $scenario(TestApp::memory()).await;
            }

            #[tokio::test]
            async fn sqlite() {
                $scenario(TestApp::sqlite().await).await;
            }
        }
    };
}

// -------------------- Create --------------------

async fn create_account(app: TestApp) {
    let response = app.post_json(json!({"name": "Account 1"})).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let location = response
        .headers()
        .get(header::LOCATION)
        .expect("Location header missing")
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(location, "http://localhost/accounts/1");
    assert_eq!(body_json(response).await, json!({"id": 1, "name": "Account 1"}));
}
both_backends!(create, create_account);

async fn create_then_read_round_trips(app: TestApp) {
    let created = app.create_accounts(1).await.remove(0);
    let id = created["id"].as_i64().unwrap();
    assert!(id > 0);

    let response = app.get(&format!("{BASE_URL}/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, created);
}
both_backends!(create_then_read, create_then_read_round_trips);

async fn create_with_missing_name_is_bad_request(app: TestApp) {
    let response = app
        .post_json(json!({"email": "test@test.com", "address": "123 Street"}))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["status"], 400);
    assert_eq!(body["error"], "Bad Request");
    assert!(body["message"].as_str().unwrap().contains("Invalid account data"));
    assert_eq!(app.stored_count().await, 0);
}
both_backends!(create_bad_data, create_with_missing_name_is_bad_request);

async fn create_with_wrong_media_type_is_rejected(app: TestApp) {
    let response = app
        .send(Method::POST, BASE_URL, Some("text/html"), Some(json!({"name": "A"})))
        .await;

    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body = body_json(response).await;
    assert_eq!(body["status"], 415);
    assert_eq!(body["error"], "Unsupported Media Type");
    assert_eq!(app.stored_count().await, 0);

    let response = app.send(Method::POST, BASE_URL, None, Some(json!({"name": "A"}))).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(app.stored_count().await, 0);
}
both_backends!(create_unsupported_media_type, create_with_wrong_media_type_is_rejected);

async fn ids_are_never_reissued(app: TestApp) {
    let first = app.create_accounts(2).await;
    for account in &first {
        app.delete(account["id"].as_i64().unwrap()).await;
    }

    let next = app.create_accounts(1).await.remove(0);
    let max_previous = first.iter().map(|a| a["id"].as_i64().unwrap()).max().unwrap();
    assert!(next["id"].as_i64().unwrap() > max_previous);
}
both_backends!(ids_not_reused, ids_are_never_reissued);

async fn create_with_unusable_host_still_persists_once(app: TestApp) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(BASE_URL)
        .header(header::HOST, "bad host")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({"name": "A"}).to_string()))
        .unwrap();
    let response = app.dispatch(request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()[header::LOCATION],
        "http://localhost/accounts/1"
    );
    assert_eq!(app.stored_count().await, 1);
}
both_backends!(create_bad_host, create_with_unusable_host_still_persists_once);

/// Larger than the default 2 MB request body limit.
fn oversized_name() -> String {
    "x".repeat(3 * 1024 * 1024)
}

async fn create_with_oversized_body_is_rejected(app: TestApp) {
    let response = app.post_json(json!({"name": oversized_name()})).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = body_json(response).await;
    assert_eq!(body["status"], 413);
    assert_eq!(body["error"], "Payload Too Large");
    assert_eq!(app.stored_count().await, 0);
}
both_backends!(create_payload_too_large, create_with_oversized_body_is_rejected);

// -------------------- List --------------------

async fn list_returns_every_account(app: TestApp) {
    app.create_accounts(3).await;

    let response = app.get(BASE_URL).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 3);
}
both_backends!(list, list_returns_every_account);

async fn list_on_empty_store_is_empty_array(app: TestApp) {
    let response = app.get(BASE_URL).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));
}
both_backends!(list_empty, list_on_empty_store_is_empty_array);

// -------------------- Read --------------------

async fn read_missing_is_not_found(app: TestApp) {
    let response = app.get(&format!("{BASE_URL}/0")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["status"], 404);
    assert_eq!(body["error"], "Not Found");

    app.create_accounts(2).await;
    let response = app.get(&format!("{BASE_URL}/999")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
both_backends!(read_not_found, read_missing_is_not_found);

// -------------------- Update --------------------

async fn update_changes_supplied_fields(app: TestApp) {
    let created = app.create_accounts(1).await.remove(0);
    let id = created["id"].as_i64().unwrap();

    let response = app.put_json(id, json!({"id": 12345, "name": "Updated Name", "active": false})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["id"], id);
    assert_eq!(updated["name"], "Updated Name");
    assert_eq!(updated["email"], created["email"]);
    assert_eq!(updated["active"], false);

    let stored = body_json(app.get(&format!("{BASE_URL}/{id}")).await).await;
    assert_eq!(stored, updated);
}
both_backends!(update, update_changes_supplied_fields);

async fn update_missing_is_not_found(app: TestApp) {
    let response = app.put_json(0, json!({"name": "Ghost"})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.stored_count().await, 0);

    // Existence is checked before the content type.
    let response = app
        .send(Method::PUT, &format!("{BASE_URL}/0"), Some("text/html"), Some(json!({"name": "Ghost"})))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
both_backends!(update_not_found, update_missing_is_not_found);

async fn update_with_bad_data_is_rejected(app: TestApp) {
    let created = app.create_accounts(1).await.remove(0);
    let id = created["id"].as_i64().unwrap();

    let response = app.put_json(id, json!({"email": "update@test.com"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["message"]
        .as_str()
        .unwrap()
        .contains("Invalid account data"));

    let stored = body_json(app.get(&format!("{BASE_URL}/{id}")).await).await;
    assert_eq!(stored, created);
}
both_backends!(update_bad_data, update_with_bad_data_is_rejected);

async fn update_with_wrong_media_type_is_rejected(app: TestApp) {
    let created = app.create_accounts(1).await.remove(0);
    let id = created["id"].as_i64().unwrap();

    let response = app
        .send(Method::PUT, &format!("{BASE_URL}/{id}"), Some("text/html"), Some(json!({"name": "X"})))
        .await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let stored = body_json(app.get(&format!("{BASE_URL}/{id}")).await).await;
    assert_eq!(stored, created);
}
both_backends!(update_unsupported_media_type, update_with_wrong_media_type_is_rejected);

async fn update_with_oversized_body_is_rejected(app: TestApp) {
    app.create_accounts(1).await;
    let response = app.put_json(1, json!({"name": oversized_name()})).await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body_json(response).await["status"], 413);

    let stored = body_json(app.get(&format!("{BASE_URL}/1")).await).await;
    assert_eq!(stored["name"], "Account 1");
}
both_backends!(update_payload_too_large, update_with_oversized_body_is_rejected);

// -------------------- Delete --------------------

async fn delete_is_idempotent(app: TestApp) {
    let accounts = app.create_accounts(2).await;
    let id = accounts[0]["id"].as_i64().unwrap();

    let response = app.delete(id).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());
    assert_eq!(app.stored_count().await, 1);

    let response = app.delete(id).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert_eq!(app.stored_count().await, 1);

    let response = app.get(&format!("{BASE_URL}/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
both_backends!(delete, delete_is_idempotent);

async fn delete_missing_is_no_content(app: TestApp) {
    let response = app.delete(999).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(response).await.is_empty());
}
both_backends!(delete_not_found, delete_missing_is_no_content);

// -------------------- Service endpoints --------------------

#[tokio::test]
async fn index_and_health() {
    let app = TestApp::memory();

    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Account REST API Service");

    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "OK");
}

#[tokio::test]
async fn error_envelopes_carry_security_headers() {
    let app = TestApp::memory();
    let response = app.get("/accounts/0").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers().get(header::X_FRAME_OPTIONS).unwrap(), "SAMEORIGIN");
    assert_eq!(response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
}

#[tokio::test]
async fn delete_all_isolates_tests() {
    let app = TestApp::sqlite().await;
    app.create_accounts(3).await;

    app.store.delete_all().await.unwrap();
    assert_eq!(body_json(app.get(BASE_URL).await).await, json!([]));
}

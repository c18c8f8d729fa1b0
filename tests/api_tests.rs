// tests/api_tests.rs

use std::sync::Arc;

use foodblog::{
    config::Config,
    routes,
    services::media::LocalObjectStorage,
    state::AppState,
    store::MemoryStore,
};
use serde_json::{Value, json};

const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_PASSWORD: &str = "admin-password";

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app() -> String {
    // 1. Create test configuration and state over the in-memory store
    let config = Config::for_tests("test_secret_for_integration_tests");
    let storage = Arc::new(LocalObjectStorage::new(
        config.upload_dir.clone(),
        config.public_base_url.clone(),
    ));
    let state = AppState::new(config, Arc::new(MemoryStore::new()), storage);

    // 2. Seed an admin account
    state
        .sessions
        .provision_admin("admin", ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
        .expect("Failed to seed admin");

    // 3. Create the router with the app state
    let app = routes::create_router(state);

    // 4. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 5. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn login(client: &reqwest::Client, address: &str, email: &str, password: &str) -> String {
    let body: Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    body["token"].as_str().expect("Token not found").to_string()
}

async fn admin_token(client: &reqwest::Client, address: &str) -> String {
    login(client, address, ADMIN_EMAIL, ADMIN_PASSWORD).await
}

fn complete_content(title: &str) -> Value {
    json!({
        "en": { "title": title, "body": "<p>Mix and bake.</p>" },
        "ar": { "title": "عنوان", "body": "<p>اخلط واخبز.</p>" }
    })
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_then_login_returns_same_user() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "username": "amjad",
            "email": "amjad@gmail.com",
            "password": "admin123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 201);
    let registered: Value = response.json().await.unwrap();
    assert!(registered["token"].as_str().is_some());
    assert_eq!(registered["user"]["username"], "amjad");
    assert_eq!(registered["user"]["isAdmin"], false);
    assert!(registered["user"].get("password").is_none());

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": "amjad@gmail.com", "password": "admin123" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let logged_in: Value = response.json().await.unwrap();
    assert_eq!(logged_in["user"]["id"], registered["user"]["id"]);

    // The token works on an authenticated route
    let token = logged_in["token"].as_str().unwrap();
    let me: Value = client
        .get(format!("{}/api/auth/me", address))
        .bearer_auth(token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(me["email"], "amjad@gmail.com");
}

#[tokio::test]
async fn login_with_wrong_password_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "username": "amjad",
            "email": "amjad@gmail.com",
            "password": "admin123"
        }))
        .send()
        .await
        .unwrap();

    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": "amjad@gmail.com", "password": "wrong-pass" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_CREDENTIALS");

    // Unknown email looks exactly the same
    let response = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": "nobody@gmail.com", "password": "admin123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let unknown: Value = response.json().await.unwrap();
    assert_eq!(unknown, body);
}

#[tokio::test]
async fn register_fails_validation() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Missing email and password
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "username": "amjad" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // Username too short
    let response = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "username": "yo",
            "email": "yo@gmail.com",
            "password": "password123"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let payload = json!({
        "username": "amjad",
        "email": "amjad@gmail.com",
        "password": "admin123"
    });

    let first = client
        .post(format!("{}/api/auth/register", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/auth/register", address))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 400);
}

#[tokio::test]
async fn admin_routes_require_admin_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // No token
    let response = client
        .get(format!("{}/api/admin/posts", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "TOKEN_MISSING");

    // Garbage token
    let response = client
        .get(format!("{}/api/admin/posts", address))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "TOKEN_INVALID");

    // Valid token, not an admin
    let registered: Value = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({
            "username": "reader",
            "email": "reader@gmail.com",
            "password": "reader123"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = registered["token"].as_str().unwrap();

    let response = client
        .post(format!("{}/api/admin/posts", address))
        .bearer_auth(token)
        .json(&json!({ "content": complete_content("Sneaky Post") }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // Admin passes
    let token = admin_token(&client, &address).await;
    let response = client
        .get(format!("{}/api/admin/posts", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn publish_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;

    // 1. Create with English only; a publish request falls back to draft
    let response = client
        .post(format!("{}/api/admin/posts", address))
        .bearer_auth(&token)
        .json(&json!({
            "content": { "en": { "title": "Date Maamoul!", "body": "<p>Shape and bake.</p>" } },
            "categories": ["desserts", "ramadan"],
            "tags": ["eid", "dates"],
            "status": "published"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let post: Value = response.json().await.unwrap();
    assert_eq!(post["slug"], "date-maamoul");
    assert_eq!(post["status"], "draft");
    let id = post["id"].as_i64().unwrap();

    // Drafts are invisible publicly
    let response = client
        .get(format!("{}/api/posts/date-maamoul", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    // 2. Publishing with a missing locale is refused
    let response = client
        .patch(format!("{}/api/admin/posts/{}/status", address, id))
        .bearer_auth(&token)
        .json(&json!({ "status": "published" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "PUBLISH_PRECONDITION");

    // 3. Add the Arabic locale, then publish
    let response = client
        .put(format!("{}/api/admin/posts/{}", address, id))
        .bearer_auth(&token)
        .json(&json!({ "content": { "ar": { "title": "معمول", "body": "<p>شكّل واخبز.</p>" } } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .patch(format!("{}/api/admin/posts/{}/status", address, id))
        .bearer_auth(&token)
        .json(&json!({ "status": "published" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let published: Value = response.json().await.unwrap();
    assert_eq!(published["status"], "published");
    assert!(published["publishDate"].is_string());

    // 4. Public reads and view counting
    let response = client
        .post(format!("{}/api/posts/date-maamoul/views", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let public: Value = client
        .get(format!("{}/api/posts/date-maamoul", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(public["views"], 1);

    let listed: Vec<Value> = client
        .get(format!("{}/api/posts?category=desserts", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    // 5. Delete
    let response = client
        .delete(format!("{}/api/admin/posts/{}", address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .get(format!("{}/api/admin/posts/{}", address, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn duplicate_slug_is_a_conflict() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;

    for expected in [201, 409] {
        let response = client
            .post(format!("{}/api/admin/posts", address))
            .bearer_auth(&token)
            .json(&json!({ "content": complete_content("Lentil Soup") }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), expected);
    }

    let all: Vec<Value> = client
        .get(format!("{}/api/admin/posts", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 1);
}

#[tokio::test]
async fn categories_follow_requested_language() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let english: Vec<Value> = client
        .get(format!("{}/api/categories", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let arabic: Vec<Value> = client
        .get(format!("{}/api/categories?lang=ar", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(english.len(), arabic.len());
    assert_eq!(english[0]["id"], arabic[0]["id"]);
    assert_ne!(english[0]["name"], arabic[0]["name"]);

    let response = client
        .get(format!("{}/api/categories/no-such-category", address))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn uploaded_image_can_be_used_as_cover() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;

    // Not an image
    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(b"hello".to_vec())
            .file_name("notes.txt")
            .mime_str("text/plain")
            .unwrap(),
    );
    let response = client
        .post(format!("{}/api/admin/media", address))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    // A PNG
    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::bytes(vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a])
            .file_name("cover.png")
            .mime_str("image/png")
            .unwrap(),
    );
    let response = client
        .post(format!("{}/api/admin/media", address))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let media: Value = response.json().await.unwrap();
    let url = media["url"].as_str().unwrap().to_string();
    assert!(url.ends_with(".png"));

    // Registered URL is accepted, a foreign one is not
    let response = client
        .post(format!("{}/api/admin/posts", address))
        .bearer_auth(&token)
        .json(&json!({ "content": complete_content("Cover Test"), "coverImage": url }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let response = client
        .post(format!("{}/api/admin/posts", address))
        .bearer_auth(&token)
        .json(&json!({
            "content": complete_content("Foreign Cover"),
            "coverImage": "https://elsewhere.example/cat.png"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn openapi_document_lists_admin_routes() {
    use axum::{
        body::{Body, to_bytes},
        http::Request,
    };
    use tower::ServiceExt;

    let config = Config::for_tests("openapi-secret");
    let storage = Arc::new(LocalObjectStorage::new(
        config.upload_dir.clone(),
        config.public_base_url.clone(),
    ));
    let app = routes::create_router(AppState::new(
        config,
        Arc::new(MemoryStore::new()),
        storage,
    ));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let doc: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(doc["paths"]["/api/admin/posts/{id}/status"]["patch"].is_object());
    assert!(doc["components"]["securitySchemes"]["jwt"].is_object());
}

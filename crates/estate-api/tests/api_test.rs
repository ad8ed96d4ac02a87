use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use estate_api::auth::AppStateInner;
use estate_api::routes::router;
use estate_api::uploads::Uploads;
use estate_chat::completion::Unconfigured;
use estate_chat::{ChatResolver, FALLBACK_REPLY};
use estate_db::Database;

const SECRET: &str = "test-secret";
const BOUNDARY: &str = "estate-test-boundary";

struct TestApp {
    app: Router,
    uploads_dir: std::path::PathBuf,
    _tmp: tempfile::TempDir,
}

async fn test_app() -> TestApp {
    let tmp = tempfile::tempdir().unwrap();
    let uploads_dir = tmp.path().join("uploads");

    let db = Arc::new(Database::open_in_memory().unwrap());
    let chat = ChatResolver::new(db.clone(), Arc::new(Unconfigured), Duration::from_secs(1));
    let state = Arc::new(AppStateInner {
        db,
        jwt_secret: SECRET.into(),
        token_ttl: chrono::Duration::hours(1),
        uploads: Uploads::new(&uploads_dir).await.unwrap(),
        chat,
    });

    TestApp {
        app: router(state),
        uploads_dir,
        _tmp: tmp,
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn register(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/register",
            json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "secret123",
                "role": "agent"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

fn multipart_body(text: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in text {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"profilePicture\"; \
                 filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn profile_put(token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/api/user/profile")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn health_reports_running() {
    let t = test_app().await;
    let (status, body) = send(&t.app, get("/api/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
}

#[tokio::test]
async fn register_then_login() {
    let t = test_app().await;
    let token = register(&t.app, "agent7").await;
    assert!(!token.is_empty());

    let (status, body) = send(
        &t.app,
        json_request(
            "POST",
            "/api/login",
            json!({ "username": "agent7", "password": "secret123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "agent7");
    assert_eq!(body["user"]["role"], "agent");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let t = test_app().await;
    register(&t.app, "agent7").await;

    for creds in [
        json!({ "username": "agent7", "password": "wrong-password" }),
        json!({ "username": "nobody", "password": "secret123" }),
    ] {
        let (status, body) = send(&t.app, json_request("POST", "/api/login", creds)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");
    }
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() {
    let t = test_app().await;
    register(&t.app, "agent7").await;

    let (status, body) = send(
        &t.app,
        json_request(
            "POST",
            "/api/register",
            json!({ "username": "agent7", "email": "other@example.com", "password": "secret123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Username already exists");

    let (status, body) = send(
        &t.app,
        json_request(
            "POST",
            "/api/register",
            json!({ "username": "fresh", "email": "agent7@example.com", "password": "secret123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Email already registered");

    let (status, _) = send(
        &t.app,
        json_request(
            "POST",
            "/api/register",
            json!({ "username": "fresh", "email": "fresh@example.com", "password": "123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_requires_a_valid_token() {
    let t = test_app().await;

    let (status, body) = send(&t.app, get("/api/user/profile")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Token missing");

    let req = Request::builder()
        .uri("/api/user/profile")
        .header(header::AUTHORIZATION, "Bearer not-a-jwt")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "Invalid token");

    let token = register(&t.app, "agent7").await;
    let req = Request::builder()
        .uri("/api/user/profile")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile"]["username"], "agent7");
    assert_eq!(body["profile"]["email"], "agent7@example.com");
}

#[tokio::test]
async fn buyer_create_validate_and_update() {
    let t = test_app().await;

    let (status, body) = send(
        &t.app,
        json_request("POST", "/api/buyers", json!({ "name": "Asha" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "budget is required");

    let (status, body) = send(
        &t.app,
        json_request(
            "POST",
            "/api/buyers",
            json!({ "name": "Asha", "budget": "80L", "location": "Indiranagar" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let id = body["buyer"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &t.app,
        json_request(
            "PUT",
            &format!("/api/buyers/{id}"),
            json!({ "name": "Asha K", "budget": "90L" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["buyer"]["name"], "Asha K");
    // Full replace: omitted fields are cleared
    assert!(body["buyer"]["location"].is_null());

    let (status, body) = send(
        &t.app,
        json_request("PUT", "/api/buyers/999", json!({ "name": "X", "budget": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Buyer not found");

    let (_, body) = send(&t.app, get("/api/buyers")).await;
    assert_eq!(body["buyers"].as_array().unwrap().len(), 1);

    let (_, body) = send(&t.app, get("/api/recent-activity")).await;
    assert_eq!(body["activity"][0]["type"], "buyer");
    assert_eq!(body["activity"][0]["name"], "Asha K");
}

#[tokio::test]
async fn seller_update_missing_is_not_found() {
    let t = test_app().await;

    let (status, body) = send(
        &t.app,
        json_request("POST", "/api/sellers", json!({ "name": "Ravi" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "property_type is required");

    let (status, body) = send(
        &t.app,
        json_request(
            "PUT",
            "/api/sellers/42",
            json!({ "name": "Ravi", "property_type": "Villa" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Seller not found");

    let (status, body) = send(&t.app, get("/api/properties")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["properties"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn chat_turns_share_a_session() {
    let t = test_app().await;

    let (status, body) = send(
        &t.app,
        json_request("POST", "/api/chat", json!({ "message": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Message required");

    let (status, body) = send(
        &t.app,
        json_request("POST", "/api/chat", json!({ "message": "What is the weather today?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reply"], FALLBACK_REPLY);
    assert_eq!(body["intent"], "UNKNOWN");
    assert!(body["automation"].is_null());
    let session_id = body["sessionId"].as_str().unwrap().to_string();
    assert!(session_id.starts_with("session_"));

    let (status, body) = send(
        &t.app,
        json_request(
            "POST",
            "/api/chat",
            json!({ "message": "show me the sellers", "sessionId": session_id }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessionId"], session_id.as_str());
    assert_eq!(body["intent"], "SELLER");
    assert_eq!(body["automation"], "Notified interested buyers");
    assert_eq!(body["reply"], "No sellers are registered yet.");

    let (status, body) = send(
        &t.app,
        get(&format!("/api/chat/history?sessionId={session_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["sender"], "user");
    assert_eq!(messages[1]["sender"], "bot");
    assert_eq!(messages[2]["message"], "show me the sellers");
}

#[tokio::test]
async fn profile_update_stores_picture() {
    let t = test_app().await;
    let token = register(&t.app, "agent7").await;

    let body = multipart_body(
        &[
            ("username", "agent7"),
            ("email", "agent7@realestate.com"),
            ("company", "Estate Co"),
        ],
        Some(("me.png", "image/png", b"\x89PNG fake image")),
    );
    let (status, body) = send(&t.app, profile_put(&token, body)).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["user"]["email"], "agent7@realestate.com");
    assert_eq!(body["user"]["company"], "Estate Co");

    let picture = body["user"]["profile_picture"].as_str().unwrap().to_string();
    assert!(picture.starts_with("profilePicture-"));
    assert!(picture.ends_with(".png"));
    assert!(t.uploads_dir.join(&picture).exists());

    let res = t
        .app
        .clone()
        .oneshot(get(&format!("/uploads/{picture}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"\x89PNG fake image");

    // Text-only update keeps the stored picture
    let body = multipart_body(&[("username", "agent7"), ("email", "agent7@realestate.com")], None);
    let (status, body) = send(&t.app, profile_put(&token, body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["profile_picture"], picture.as_str());
    assert!(body["user"]["company"].is_null());
}

#[tokio::test]
async fn profile_update_rejects_non_images_and_missing_fields() {
    let t = test_app().await;
    let token = register(&t.app, "agent7").await;

    let body = multipart_body(
        &[("username", "agent7"), ("email", "agent7@example.com")],
        Some(("notes.txt", "text/plain", b"hello")),
    );
    let (status, body) = send(&t.app, profile_put(&token, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Only image files are allowed");

    let body = multipart_body(&[("username", "agent7")], None);
    let (status, body) = send(&t.app, profile_put(&token, body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "email is required");

    assert_eq!(std::fs::read_dir(&t.uploads_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn profile_update_conflicts_on_taken_username() {
    let t = test_app().await;
    register(&t.app, "agent7").await;
    let token = register(&t.app, "agent8").await;

    let body = multipart_body(&[("username", "agent7"), ("email", "agent8@example.com")], None);
    let (status, _) = send(&t.app, profile_put(&token, body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

fn raw_request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn malformed_requests_get_json_errors() {
    let t = test_app().await;

    let (status, body) = send(
        &t.app,
        json_request(
            "POST",
            "/api/register",
            json!({ "username": "abcd", "email": "a@b.c" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("password"));

    let (status, body) = send(
        &t.app,
        json_request("POST", "/api/chat", json!({ "message": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(&t.app, raw_request("POST", "/api/buyers", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &t.app,
        json_request("PUT", "/api/buyers/abc", json!({ "name": "X", "budget": "1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &t.app,
        json_request("PUT", "/api/sellers/abc", json!({ "name": "X", "property_type": "1BHK" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn profile_update_without_multipart_is_json_error() {
    let t = test_app().await;
    let token = register(&t.app, "agent7").await;

    let req = Request::builder()
        .method("PUT")
        .uri("/api/user/profile")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"username":"agent7"}"#))
        .unwrap();
    let (status, body) = send(&t.app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn register_refuses_elevated_roles() {
    let t = test_app().await;

    for role in ["admin", "broker", "moderator"] {
        let (status, body) = send(
            &t.app,
            json_request(
                "POST",
                "/api/register",
                json!({
                    "username": format!("new{role}"),
                    "email": format!("{role}@example.com"),
                    "password": "secret123",
                    "role": role
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "role must be user or agent");
    }

    let (status, body) = send(
        &t.app,
        json_request(
            "POST",
            "/api/register",
            json!({ "username": "plain", "email": "plain@example.com", "password": "secret123" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["role"], "user");
}

#[tokio::test]
async fn oversized_pictures_are_rejected() {
    let t = test_app().await;
    let token = register(&t.app, "agent7").await;

    // Just over the picture limit but inside the route body limit, then past both
    for size in [5 * 1024 * 1024 + 1, 7 * 1024 * 1024] {
        let image = vec![0u8; size];
        let body = multipart_body(
            &[("username", "agent7"), ("email", "agent7@example.com")],
            Some(("big.png", "image/png", &image)),
        );
        let (status, body) = send(&t.app, profile_put(&token, body)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "size {size}");
        assert_eq!(body["error"], "Profile picture must be 5MB or smaller");
    }

    assert_eq!(std::fs::read_dir(&t.uploads_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn new_picture_replaces_old_file() {
    let t = test_app().await;
    let token = register(&t.app, "agent7").await;
    let text = [("username", "agent7"), ("email", "agent7@example.com")];

    let body = multipart_body(&text, Some(("one.png", "image/png", b"first")));
    let (status, body) = send(&t.app, profile_put(&token, body)).await;
    assert_eq!(status, StatusCode::OK);
    let first = body["user"]["profile_picture"].as_str().unwrap().to_string();

    // An empty file part means no new picture was chosen
    let body = multipart_body(&text, Some(("", "application/octet-stream", b"")));
    let (status, body) = send(&t.app, profile_put(&token, body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["profile_picture"], first.as_str());
    assert!(t.uploads_dir.join(&first).exists());

    let body = multipart_body(&text, Some(("two.jpg", "image/jpeg", b"second")));
    let (status, body) = send(&t.app, profile_put(&token, body)).await;
    assert_eq!(status, StatusCode::OK);
    let second = body["user"]["profile_picture"].as_str().unwrap().to_string();

    assert_ne!(first, second);
    assert!(!t.uploads_dir.join(&first).exists());
    assert_eq!(std::fs::read(t.uploads_dir.join(&second)).unwrap(), b"second");
}

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use postdeck_api::{AppState, AppStateInner};
use postdeck_db::Database;
use postdeck_media::MediaStorage;
use postdeck_platforms::PlatformRegistry;

pub const SECRET: &str = "test-secret";

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    _dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    pub fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .expect("response has a Location header")
    }
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_dev_login(true).await
    }

    pub async fn with_dev_login(dev_login: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.db")).unwrap();
        let storage = MediaStorage::new(dir.path().join("media")).await.unwrap();

        let state = Arc::new(AppStateInner {
            db,
            storage,
            platforms: PlatformRegistry::new(true),
            jwt_secret: SECRET.to_string(),
            public_url: "http://localhost:3000".to_string(),
            dev_login,
        });

        Self {
            app: postdeck_api::router(state.clone()),
            state,
            _dir: dir,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> TestResponse {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        TestResponse { status, headers, body }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(request(Method::POST, uri, token, Some(body))).await
    }

    pub async fn put_json(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.send(request(Method::PUT, uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(request(Method::DELETE, uri, token, None)).await
    }

    /// Sign in by email and return the session token.
    pub async fn login(&self, email: &str) -> String {
        let resp = self
            .post_json("/api/login", None, serde_json::json!({ "email": email }))
            .await;
        assert_eq!(resp.status, StatusCode::OK, "{}", String::from_utf8_lossy(&resp.body));
        resp.json()["token"].as_str().unwrap().to_string()
    }

    pub async fn user_id(&self, token: &str) -> String {
        let resp = self.get("/api/user", Some(token)).await;
        resp.json()["id"].as_str().unwrap().to_string()
    }

    /// Link an account directly, bypassing OAuth. Connected unless the body says otherwise.
    pub async fn add_account(&self, token: &str, platform: &str, body: Value) -> Value {
        let mut body = body;
        body["platform"] = Value::String(platform.to_string());
        if body.get("is_connected").is_none() {
            body["is_connected"] = Value::Bool(true);
        }
        let resp = self.post_json("/api/connected-accounts", Some(token), body).await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", String::from_utf8_lossy(&resp.body));
        resp.json()
    }

    pub async fn create_post(&self, token: &str, platforms: &[&str], scheduled_for: &str) -> Value {
        let resp = self
            .post_json(
                "/api/posts",
                Some(token),
                serde_json::json!({
                    "content": "Launch day! Our new feature ships today.",
                    "platforms": platforms,
                    "scheduled_for": scheduled_for,
                }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{}", String::from_utf8_lossy(&resp.body));
        resp.json()
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

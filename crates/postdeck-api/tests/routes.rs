mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use serde_json::json;

use common::TestApp;
use postdeck_api::media::MAX_UPLOAD_BYTES;
use postdeck_api::oauth_state::encode_state;
use postdeck_api::tasks;
use postdeck_types::models::Platform;

fn in_hours(hours: i64) -> String {
    (Utc::now() + Duration::hours(hours)).to_rfc3339()
}

// -- Auth --

#[tokio::test]
async fn health_and_plans_are_public() {
    let app = TestApp::new().await;

    let health = app.get("/health", None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, b"ok");

    let plans = app.get("/api/plans", None).await.json();
    let prices: Vec<(String, u64)> = plans
        .as_array()
        .unwrap()
        .iter()
        .map(|p| (p["id"].as_str().unwrap().to_string(), p["monthly_price_cents"].as_u64().unwrap()))
        .collect();
    assert_eq!(
        prices,
        vec![("free".into(), 0), ("pro".into(), 999), ("agency".into(), 2499)]
    );
}

#[tokio::test]
async fn protected_routes_need_a_session() {
    let app = TestApp::new().await;

    assert_eq!(app.get("/api/posts", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/posts", Some("garbage")).await.status, StatusCode::UNAUTHORIZED);

    let resp = app.get("/api/user", None).await;
    assert_eq!(resp.status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp.json()["error"], "Unauthorized");
}

#[tokio::test]
async fn login_upserts_by_email() {
    let app = TestApp::new().await;

    let first = app
        .post_json("/api/login", None, json!({ "email": "Ada@Example.com", "first_name": "Ada" }))
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let first = first.json();
    assert_eq!(first["user"]["email"], "ada@example.com");
    assert_eq!(first["user"]["subscription_tier"], "free");

    let second = app
        .post_json("/api/login", None, json!({ "email": "ada@example.com", "last_name": "L" }))
        .await
        .json();
    assert_eq!(second["user"]["id"], first["user"]["id"]);
    assert_eq!(second["user"]["last_name"], "L");
    assert_eq!(second["user"]["created_at"], first["user"]["created_at"]);
}

#[tokio::test]
async fn login_validation_and_email_conflicts() {
    let app = TestApp::new().await;

    let empty = app.post_json("/api/login", None, json!({})).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let unknown_field = app
        .post_json("/api/login", None, json!({ "email": "a@b.c", "role": "admin" }))
        .await;
    assert_eq!(unknown_field.status, StatusCode::BAD_REQUEST);

    app.login("taken@example.com").await;
    let clash = app
        .post_json("/api/login", None, json!({ "id": "oidc|7", "email": "taken@example.com" }))
        .await;
    assert_eq!(clash.status, StatusCode::CONFLICT);

    let by_id = app.post_json("/api/login", None, json!({ "id": "oidc|7" })).await;
    assert_eq!(by_id.status, StatusCode::OK);
    assert_eq!(by_id.json()["user"]["id"], "oidc|7");
}

#[tokio::test]
async fn session_cookie_is_accepted_and_cleared_on_logout() {
    let app = TestApp::new().await;

    let resp = app.post_json("/api/login", None, json!({ "email": "c@example.com" })).await;
    let set_cookie = resp.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap().to_string();
    assert!(set_cookie.starts_with("postdeck_session="));
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let req = Request::builder()
        .uri("/api/user")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let me = app.send(req).await;
    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.json()["email"], "c@example.com");

    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/logout")
        .header(header::COOKIE, &cookie)
        .body(Body::empty())
        .unwrap();
    let out = app.send(req).await;
    assert_eq!(out.status, StatusCode::OK);
    assert_eq!(out.json()["success"], true);
    let cleared = out.headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with("postdeck_session="));
}

#[tokio::test]
async fn dev_login_is_off_unless_enabled() {
    let app = TestApp::with_dev_login(false).await;

    let resp = app.post_json("/api/login", None, json!({ "email": "who@example.com" })).await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(resp.json()["error"], "Not found");
    assert!(resp.headers.get(header::SET_COOKIE).is_none());
}

// -- Posts --

#[tokio::test]
async fn creating_a_post_with_no_platforms_is_rejected() {
    let app = TestApp::new().await;
    let token = app.login("p@example.com").await;

    let resp = app
        .post_json(
            "/api/posts",
            Some(&token),
            json!({ "content": "hello", "platforms": [], "scheduled_for": in_hours(1) }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
    assert_eq!(resp.json()["error"], "Select at least one platform");

    let missing_field = app
        .post_json("/api/posts", Some(&token), json!({ "content": "hello" }))
        .await;
    assert_eq!(missing_field.status, StatusCode::BAD_REQUEST);

    assert!(app.get("/api/posts", Some(&token)).await.json().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn posts_are_scheduled_listed_and_private() {
    let app = TestApp::new().await;
    let owner = app.login("owner@example.com").await;
    let other = app.login("other@example.com").await;

    let soon = app.create_post(&owner, &["twitter"], &in_hours(1)).await;
    let later = app.create_post(&owner, &["linkedin", "facebook"], &in_hours(48)).await;
    assert_eq!(soon["status"], "scheduled");
    assert!(soon["published_at"].is_null());

    // Duplicate submissions are not deduplicated.
    app.create_post(&owner, &["twitter"], &in_hours(1)).await;

    let listed = app.get("/api/posts", Some(&owner)).await.json();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0]["id"], later["id"]);

    let uri = format!("/api/posts/{}", soon["id"].as_str().unwrap());
    assert_eq!(app.get(&uri, Some(&owner)).await.status, StatusCode::OK);
    assert_eq!(app.get(&uri, Some(&other)).await.status, StatusCode::NOT_FOUND);
    assert!(app.get("/api/posts", Some(&other)).await.json().as_array().unwrap().is_empty());
}

// -- Connected accounts --

#[tokio::test]
async fn disconnecting_an_account_removes_it_from_the_list() {
    let app = TestApp::new().await;
    let token = app.login("acct@example.com").await;
    let intruder = app.login("intruder@example.com").await;

    let account = app
        .add_account(&token, "instagram", json!({ "account_name": "@brand", "access_token": "tok" }))
        .await;
    assert_eq!(account["platform"], "instagram");
    assert_eq!(account["is_connected"], true);
    assert!(account.get("access_token").is_none());

    let uri = format!("/api/connected-accounts/{}", account["id"].as_str().unwrap());
    assert_eq!(app.delete(&uri, Some(&intruder)).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/api/connected-accounts", Some(&token)).await.json().as_array().unwrap().len(), 1);

    let resp = app.delete(&uri, Some(&token)).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.json()["success"], true);
    assert!(app.get("/api/connected-accounts", Some(&token)).await.json().as_array().unwrap().is_empty());
    assert_eq!(app.delete(&uri, Some(&token)).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn accounts_created_without_is_connected_start_disconnected() {
    let app = TestApp::new().await;
    let token = app.login("manual@example.com").await;

    let resp = app
        .post_json(
            "/api/connected-accounts",
            Some(&token),
            json!({ "platform": "twitter", "access_token": "tw" }),
        )
        .await;
    assert_eq!(resp.status, StatusCode::CREATED);
    assert_eq!(resp.json()["is_connected"], false);

    let post = app.create_post(&token, &["twitter"], &in_hours(1)).await;
    let uri = format!("/api/posts/{}/publish", post["id"].as_str().unwrap());
    let published = app.post_json(&uri, Some(&token), json!({})).await.json();
    assert_eq!(published["post"]["status"], "failed");
    assert_eq!(published["results"][0]["error"], "No connected twitter account");
}

#[tokio::test]
async fn non_uuid_ids_are_not_found() {
    let app = TestApp::new().await;
    let token = app.login("ids@example.com").await;

    for resp in [
        app.get("/objects/not-a-uuid", Some(&token)).await,
        app.delete("/api/connected-accounts/abc", Some(&token)).await,
        app.get("/api/posts/abc", Some(&token)).await,
        app.post_json("/api/posts/abc/publish", Some(&token), json!({})).await,
        app.send(upload("/api/objects/upload/abc", &token, "image/png", b"x")).await,
    ] {
        assert_eq!(resp.status, StatusCode::NOT_FOUND);
        assert_eq!(resp.json()["error"], "Not found");
    }
}

#[tokio::test]
async fn unknown_platform_account_is_bad_request() {
    let app = TestApp::new().await;
    let token = app.login("x@example.com").await;
    let resp = app
        .post_json("/api/connected-accounts", Some(&token), json!({ "platform": "myspace" }))
        .await;
    assert_eq!(resp.status, StatusCode::BAD_REQUEST);
}

// -- OAuth --

async fn run_mock_oauth(app: &TestApp, token: &str, platform: &str) -> String {
    let connect = app.get(&format!("/api/social/connect/{}", platform), Some(token)).await;
    assert_eq!(connect.status, StatusCode::OK);
    let connect = connect.json();
    assert_eq!(connect["is_mock"], true);
    let url = connect["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/api/social/mock-callback?"));

    let bounce = app.get(&url, Some(token)).await;
    assert_eq!(bounce.status, StatusCode::SEE_OTHER);
    let callback = bounce.location().to_string();
    assert!(callback.starts_with(&format!("/api/social/callback/{}?", platform)));

    // The provider redirect carries no session.
    let done = app.get(&callback, None).await;
    assert_eq!(done.status, StatusCode::SEE_OTHER);
    done.location().to_string()
}

#[tokio::test]
async fn oauth_round_trip_stores_one_account_per_platform() {
    let app = TestApp::new().await;
    let token = app.login("oauth@example.com").await;

    assert_eq!(run_mock_oauth(&app, &token, "twitter").await, "/dashboard?connected=twitter");
    assert_eq!(run_mock_oauth(&app, &token, "twitter").await, "/dashboard?connected=twitter");

    let accounts = app.get("/api/connected-accounts", Some(&token)).await.json();
    let accounts = accounts.as_array().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0]["platform"], "twitter");
    assert_eq!(accounts[0]["account_name"], "Test X (Twitter) Account");
    assert!(accounts[0]["token_expires_at"].is_string());
}

#[tokio::test]
async fn oauth_failures_redirect_or_reject() {
    let app = TestApp::new().await;
    let token = app.login("fail@example.com").await;
    let uid = app.user_id(&token).await;

    let unknown = app.get("/api/social/connect/myspace", Some(&token)).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(unknown.json()["error"], "No provider found for platform: myspace");

    let missing = app.get("/api/social/callback/twitter?code=abc", None).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let forged = encode_state("not-the-secret", &uid, Platform::Twitter).unwrap();
    let resp = app
        .get(&format!("/api/social/callback/twitter?code=abc&state={}", forged), None)
        .await;
    assert_eq!(resp.location(), "/dashboard?error=oauth_failed");

    let wrong_platform = encode_state(common::SECRET, &uid, Platform::Youtube).unwrap();
    let resp = app
        .get(&format!("/api/social/callback/twitter?code=abc&state={}", wrong_platform), None)
        .await;
    assert_eq!(resp.location(), "/dashboard?error=oauth_failed");

    let bad_mock = app.get("/api/social/mock-callback?code=abc&state=zzz", Some(&token)).await;
    assert_eq!(bad_mock.location(), "/dashboard?error=oauth_failed");

    assert!(app.get("/api/connected-accounts", Some(&token)).await.json().as_array().unwrap().is_empty());
}

fn state_param(url: &str) -> String {
    url.split("state=").nth(1).unwrap().split('&').next().unwrap().to_string()
}

#[tokio::test]
async fn oauth_state_is_not_a_session() {
    let app = TestApp::new().await;
    let token = app.login("victim@example.com").await;

    let connect = app.get("/api/social/connect/twitter", Some(&token)).await.json();
    let state = state_param(connect["url"].as_str().unwrap());

    let me = app.get("/api/user", Some(&state)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/posts", Some(&state)).await.status, StatusCode::UNAUTHORIZED);

    // And a session cannot stand in for a state.
    let resp = app
        .get(&format!("/api/social/callback/twitter?code=abc&state={}", token), None)
        .await;
    assert_eq!(resp.location(), "/dashboard?error=oauth_failed");
}

#[tokio::test]
async fn mock_callback_encodes_the_code() {
    let app = TestApp::new().await;
    let token = app.login("encode@example.com").await;

    let connect = app.get("/api/social/connect/twitter", Some(&token)).await.json();
    let state = state_param(connect["url"].as_str().unwrap());

    let bounce = app
        .get(&format!("/api/social/mock-callback?code=a%0Ab&state={}", state), Some(&token))
        .await;
    assert_eq!(bounce.status, StatusCode::SEE_OTHER);
    assert_eq!(
        bounce.location(),
        format!("/api/social/callback/twitter?code=a%0Ab&state={}", state)
    );

    let injected = app
        .get(
            &format!("/api/social/mock-callback?code=x%26state%3Devil&state={}", state),
            Some(&token),
        )
        .await;
    assert_eq!(
        injected.location(),
        format!("/api/social/callback/twitter?code=x%26state%3Devil&state={}", state)
    );

    let done = app.get(&bounce.location().to_string(), None).await;
    assert_eq!(done.location(), "/dashboard?connected=twitter");
}

// -- Publishing --

#[tokio::test]
async fn publish_marks_failed_when_an_account_is_missing_then_succeeds() {
    let app = TestApp::new().await;
    let token = app.login("pub@example.com").await;
    app.add_account(&token, "twitter", json!({ "access_token": "tw" })).await;

    let post = app.create_post(&token, &["twitter", "youtube"], &in_hours(2)).await;
    let uri = format!("/api/posts/{}/publish", post["id"].as_str().unwrap());

    let first = app.post_json(&uri, Some(&token), json!({})).await;
    assert_eq!(first.status, StatusCode::OK);
    let first = first.json();
    assert_eq!(first["post"]["status"], "failed");
    assert!(first["post"]["published_at"].is_null());
    let results = first["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["platform"], "twitter");
    assert_eq!(results[0]["success"], true);
    assert_eq!(results[1]["platform"], "youtube");
    assert_eq!(results[1]["success"], false);
    assert_eq!(results[1]["error"], "No connected youtube account");

    app.add_account(&token, "youtube", json!({ "access_token": "yt" })).await;
    let second = app.post_json(&uri, Some(&token), json!({})).await.json();
    assert_eq!(second["post"]["status"], "published");
    assert!(second["post"]["published_at"].is_string());
    assert_eq!(second["post"]["publish_results"], second["results"]);
    assert!(second["results"].as_array().unwrap().iter().all(|r| r["success"] == true));

    let again = app.post_json(&uri, Some(&token), json!({})).await;
    assert_eq!(again.status, StatusCode::CONFLICT);

    let other = app.login("nosy@example.com").await;
    assert_eq!(app.post_json(&uri, Some(&other), json!({})).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn publish_refreshes_expiring_tokens() {
    let app = TestApp::new().await;
    let token = app.login("refresh@example.com").await;
    let expired = (Utc::now() - Duration::minutes(1)).to_rfc3339();
    let account = app
        .add_account(
            &token,
            "facebook",
            json!({ "access_token": "old", "refresh_token": "r1", "token_expires_at": expired }),
        )
        .await;

    let post = app.create_post(&token, &["facebook"], &in_hours(1)).await;
    let uri = format!("/api/posts/{}/publish", post["id"].as_str().unwrap());
    let resp = app.post_json(&uri, Some(&token), json!({})).await.json();
    assert_eq!(resp["post"]["status"], "published");

    let row = app
        .state
        .db
        .get_account(account["id"].as_str().unwrap())
        .unwrap()
        .unwrap();
    assert!(row.access_token.as_deref().unwrap().starts_with("mock_access_facebook_"));
    assert_eq!(row.refresh_token.as_deref(), Some("r1"));
    assert!(row.expires_at().unwrap().unwrap() > Utc::now() + Duration::days(59));
}

#[tokio::test]
async fn expired_token_without_refresh_fails_that_platform() {
    let app = TestApp::new().await;
    let token = app.login("stale@example.com").await;
    let expired = (Utc::now() - Duration::hours(1)).to_rfc3339();
    app.add_account(&token, "tiktok", json!({ "access_token": "old", "token_expires_at": expired }))
        .await;

    let post = app.create_post(&token, &["tiktok"], &in_hours(1)).await;
    let uri = format!("/api/posts/{}/publish", post["id"].as_str().unwrap());
    let resp = app.post_json(&uri, Some(&token), json!({})).await.json();
    assert_eq!(resp["post"]["status"], "failed");
    assert!(resp["results"][0]["error"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn auto_publisher_fires_due_posts_only() {
    let app = TestApp::new().await;
    let token = app.login("auto@example.com").await;
    app.add_account(&token, "linkedin", json!({ "access_token": "li" })).await;

    let due = app.create_post(&token, &["linkedin"], &in_hours(-1)).await;
    let future = app.create_post(&token, &["linkedin"], &in_hours(3)).await;

    assert_eq!(tasks::publish_due_posts(&app.state).await.unwrap(), 1);
    assert_eq!(tasks::publish_due_posts(&app.state).await.unwrap(), 0);

    let due = app.get(&format!("/api/posts/{}", due["id"].as_str().unwrap()), Some(&token)).await.json();
    assert_eq!(due["status"], "published");
    let future = app.get(&format!("/api/posts/{}", future["id"].as_str().unwrap()), Some(&token)).await.json();
    assert_eq!(future["status"], "scheduled");
}

// -- Media --

fn upload(uri: &str, token: &str, content_type: &str, bytes: &'static [u8]) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .unwrap()
}

#[tokio::test]
async fn media_acl_is_owner_only_until_published() {
    let app = TestApp::new().await;
    let owner = app.login("media@example.com").await;
    let other = app.login("viewer@example.com").await;

    let ticket = app.post_json("/api/objects/upload", Some(&owner), json!({})).await.json();
    let upload_url = ticket["upload_url"].as_str().unwrap().to_string();
    assert!(upload_url.starts_with("/api/objects/upload/"));

    // Only the ticket owner may upload.
    let stolen = app.send(upload(&upload_url, &other, "image/png", b"nope")).await;
    assert_eq!(stolen.status, StatusCode::NOT_FOUND);
    let empty = app.send(upload(&upload_url, &owner, "image/png", b"")).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let stored = app.send(upload(&upload_url, &owner, "image/png", b"\x89PNG-data")).await;
    assert_eq!(stored.status, StatusCode::CREATED);
    let stored = stored.json();
    assert_eq!(stored["size"], 9);
    let object_path = format!("/objects/{}", stored["object_id"].as_str().unwrap());

    let mine = app.get(&object_path, Some(&owner)).await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.headers.get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(mine.body, b"\x89PNG-data");
    assert_eq!(app.get(&object_path, Some(&other)).await.status, StatusCode::UNAUTHORIZED);

    let hijack = app
        .put_json("/api/post-images", Some(&other), json!({ "image_url": upload_url }))
        .await;
    assert_eq!(hijack.status, StatusCode::NOT_FOUND);
    let missing = app.put_json("/api/post-images", Some(&owner), json!({})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let made_public = app
        .put_json(
            "/api/post-images",
            Some(&owner),
            json!({ "image_url": format!("http://localhost:3000{}", upload_url) }),
        )
        .await;
    assert_eq!(made_public.status, StatusCode::OK);
    assert_eq!(made_public.json()["object_path"], object_path.as_str());

    assert_eq!(app.get(&object_path, Some(&other)).await.status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_objects_are_not_found() {
    let app = TestApp::new().await;
    let token = app.login("none@example.com").await;
    let id = uuid::Uuid::new_v4();

    assert_eq!(app.get(&format!("/objects/{}", id), Some(&token)).await.status, StatusCode::NOT_FOUND);
    let resp = app
        .send(upload(&format!("/api/objects/upload/{}", id), &token, "image/png", b"x"))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    // The ticket is checked before the body.
    let resp = app
        .send(upload(&format!("/api/objects/upload/{}", id), &token, "image/png", b""))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let other = app.login("else@example.com").await;
    let ticket = app.post_json("/api/objects/upload", Some(&other), json!({})).await.json();
    let resp = app
        .send(upload(ticket["upload_url"].as_str().unwrap(), &token, "image/png", b""))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_upload_is_payload_too_large() {
    let app = TestApp::new().await;
    let token = app.login("big@example.com").await;

    let ticket = app.post_json("/api/objects/upload", Some(&token), json!({})).await.json();
    let upload_url = ticket["upload_url"].as_str().unwrap();

    let req = Request::builder()
        .method(Method::PUT)
        .uri(upload_url)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "video/mp4")
        .body(Body::from(vec![0u8; MAX_UPLOAD_BYTES + 1]))
        .unwrap();
    let resp = app.send(req).await;
    assert_eq!(resp.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(resp.json()["error"], "Upload too large");

    // The ticket is still usable.
    let ok = app.send(upload(upload_url, &token, "video/mp4", b"clip")).await;
    assert_eq!(ok.status, StatusCode::CREATED);
}

#[tokio::test]
async fn expired_upload_tickets_are_swept() {
    let app = TestApp::new().await;
    let token = app.login("sweep@example.com").await;
    let uid = app.user_id(&token).await;

    let stale = uuid::Uuid::new_v4().to_string();
    app.state
        .db
        .insert_media_ticket(&stale, &uid, Utc::now() - Duration::minutes(1))
        .unwrap();
    let live = app.post_json("/api/objects/upload", Some(&token), json!({})).await.json();

    let resp = app
        .send(upload(&format!("/api/objects/upload/{}", stale), &token, "image/png", b"late"))
        .await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    assert_eq!(tasks::cleanup_expired_uploads(&app.state).await.unwrap(), 1);
    assert!(app.state.db.get_media(&stale).unwrap().is_none());

    let live_id = live["upload_url"].as_str().unwrap().rsplit('/').next().unwrap().to_string();
    assert!(app.state.db.get_media(&live_id).unwrap().is_some());
}

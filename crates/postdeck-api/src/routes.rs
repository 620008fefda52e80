use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, post, put},
};

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{accounts, auth, media, plans, posts, social};

/// All HTTP routes. Transport layers (CORS, tracing) are added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/login", post(auth::login))
        .route("/api/plans", get(plans::list_plans))
        .route("/api/social/callback/{platform}", get(social::callback));

    let protected_routes = Router::new()
        .route("/api/user", get(auth::current_user))
        .route("/api/logout", post(auth::logout))
        .route("/api/connected-accounts", get(accounts::list_accounts))
        .route("/api/connected-accounts", post(accounts::create_account))
        .route("/api/connected-accounts/{id}", delete(accounts::delete_account))
        .route("/api/social/connect/{platform}", get(social::connect))
        .route("/api/social/mock-callback", get(social::mock_callback))
        .route("/api/posts", get(posts::list_posts))
        .route("/api/posts", post(posts::create_post))
        .route("/api/posts/{id}", get(posts::get_post))
        .route("/api/posts/{id}/publish", post(posts::publish_post))
        .route("/api/objects/upload", post(media::request_upload))
        .route(
            "/api/objects/upload/{id}",
            put(media::upload_object).layer(DefaultBodyLimit::max(media::MAX_UPLOAD_BYTES)),
        )
        .route("/api/post-images", put(media::set_post_image))
        .route("/objects/{id}", get(media::download_object))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

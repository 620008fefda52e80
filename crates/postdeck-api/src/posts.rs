use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use postdeck_db::models::{NewPost, PostRow};
use postdeck_types::api::{Claims, CreatePostRequest, PublishResponse};
use postdeck_types::models::{Platform, Post, PostStatus};

use crate::error::ApiErr;
use crate::publisher;
use crate::state::{AppState, db_task};

/// GET /api/posts — the caller's posts, latest schedule first.
pub async fn list_posts(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Post>>, ApiErr> {
    let uid = claims.sub;
    let posts = db_task(&state, move |db| {
        db.list_posts(&uid)?
            .into_iter()
            .map(Post::try_from)
            .collect::<anyhow::Result<Vec<_>>>()
    })
    .await
    .map_err(ApiErr::from_db("list_posts"))?;

    Ok(Json(posts))
}

/// POST /api/posts — schedule a new post. No idempotency: a resubmitted
/// form creates a second post.
pub async fn create_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Json(req) = payload?;
    let new_post = validate_new_post(claims.sub, req)?;

    let post = db_task(&state, move |db| Post::try_from(db.insert_post(&new_post)?))
        .await
        .map_err(ApiErr::from_db("insert_post"))?;

    info!(
        "User {} scheduled post {} for {} on {} platform(s)",
        post.user_id,
        post.id,
        post.scheduled_for,
        post.platforms.len()
    );
    Ok((StatusCode::CREATED, Json(post)))
}

fn validate_new_post(user_id: String, req: CreatePostRequest) -> Result<NewPost, ApiErr> {
    if req.content.trim().is_empty() {
        return Err(ApiErr::bad_request("Post content is required"));
    }
    if req.platforms.is_empty() {
        return Err(ApiErr::bad_request("Select at least one platform"));
    }

    let mut platforms: Vec<Platform> = Vec::with_capacity(req.platforms.len());
    for name in &req.platforms {
        let platform: Platform = name
            .parse()
            .map_err(|_| ApiErr::bad_request(format!("Unknown platform: {}", name)))?;
        if !platforms.contains(&platform) {
            platforms.push(platform);
        }
    }

    let scheduled_for = DateTime::parse_from_rfc3339(&req.scheduled_for)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| ApiErr::bad_request("scheduled_for must be an RFC 3339 timestamp"))?;

    Ok(NewPost {
        user_id,
        content: req.content,
        image_url: req.image_url.filter(|u| !u.trim().is_empty()),
        platforms,
        scheduled_for,
    })
}

/// GET /api/posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Post>, ApiErr> {
    let Path(post_id) = path?;
    let row = owned_post(&state, &claims, post_id).await?;
    let post = Post::try_from(row).map_err(ApiErr::from_db("post row"))?;
    Ok(Json(post))
}

/// POST /api/posts/{id}/publish — "Publish Now". Fans out to every target
/// platform and reports each platform's outcome.
pub async fn publish_post(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<PublishResponse>, ApiErr> {
    let Path(post_id) = path?;
    let row = owned_post(&state, &claims, post_id).await?;
    if row.status == PostStatus::Published.as_str() {
        return Err(ApiErr::conflict("Post already published"));
    }

    let (post, results) = publisher::publish_post(&state, row)
        .await
        .map_err(ApiErr::from_db("publish_post"))?;

    Ok(Json(PublishResponse { post, results }))
}

async fn owned_post(state: &AppState, claims: &Claims, post_id: Uuid) -> Result<PostRow, ApiErr> {
    let pid = post_id.to_string();
    let row = db_task(state, move |db| db.get_post(&pid))
        .await
        .map_err(ApiErr::from_db("get_post"))?;

    match row {
        Some(row) if row.user_id == claims.sub => Ok(row),
        _ => Err(ApiErr::not_found("Post not found")),
    }
}

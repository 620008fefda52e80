use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{BytesRejection, JsonRejection, PathRejection},
    },
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};
use bytes::Bytes;
use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use postdeck_types::api::{
    Claims, ObjectPathResponse, SetPostImageRequest, UploadResponse, UploadUrlResponse,
};
use postdeck_types::models::Visibility;

use crate::error::ApiErr;
use crate::state::{AppState, db_task};

/// 50 MB upload limit for media
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const UPLOAD_TICKET_MINUTES: i64 = 15;

/// POST /api/objects/upload — reserve an object and hand back where to PUT it.
pub async fn request_upload(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UploadUrlResponse>, ApiErr> {
    let object_id = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::minutes(UPLOAD_TICKET_MINUTES);

    let oid = object_id.clone();
    let uid = claims.sub;
    db_task(&state, move |db| db.insert_media_ticket(&oid, &uid, expires_at))
        .await
        .map_err(ApiErr::from_db("insert_media_ticket"))?;

    Ok(Json(UploadUrlResponse {
        upload_url: format!("/api/objects/upload/{}", object_id),
    }))
}

/// PUT /api/objects/upload/{id} — raw bytes for a reserved object.
///
/// The route caps the body at [`MAX_UPLOAD_BYTES`]; an oversized body
/// arrives here as a rejection and becomes a 413 once the ticket checks out.
pub async fn upload_object(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Path(object_id) = path?;

    let oid = object_id.to_string();
    let ticket = db_task(&state, move |db| db.get_media(&oid))
        .await
        .map_err(ApiErr::from_db("get_media"))?;

    match ticket {
        Some(t) if t.owner_id == claims.sub && !t.is_expired_ticket(Utc::now()) => {}
        _ => return Err(ApiErr::not_found("Upload URL not found")),
    }

    let body = body?;
    if body.is_empty() {
        return Err(ApiErr::bad_request("Empty upload"));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let oid = object_id.to_string();
    let stored = state
        .storage
        .write_object(&oid, &body)
        .await
        .map_err(ApiErr::from_db("write_object"))?;

    let checksum = stored.sha256.clone();
    let size = stored.size;
    db_task(&state, move |db| db.mark_media_uploaded(&oid, &content_type, size, &checksum))
        .await
        .map_err(ApiErr::from_db("mark_media_uploaded"))?;

    info!("User {} uploaded object {} ({} bytes)", claims.sub, object_id, stored.size);

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            object_id: object_id.to_string(),
            size: stored.size,
            sha256: stored.sha256,
        }),
    ))
}

/// PUT /api/post-images — publish an uploaded image so it can be attached
/// to posts. The caller becomes (or stays) its owner.
pub async fn set_post_image(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<SetPostImageRequest>, JsonRejection>,
) -> Result<Json<ObjectPathResponse>, ApiErr> {
    let Json(req) = payload?;
    let image_url = req
        .image_url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiErr::bad_request("image_url is required"))?;

    let object_id = object_id_from_url(&image_url)
        .ok_or_else(|| ApiErr::bad_request("image_url does not name a stored object"))?;

    let oid = object_id.to_string();
    let uid = claims.sub.clone();
    let updated = db_task(&state, move |db| match db.get_media(&oid)? {
        Some(media) if media.owner_id == uid && media.uploaded => {
            db.set_media_acl(&oid, &uid, Visibility::Public)?;
            Ok(true)
        }
        _ => Ok(false),
    })
    .await
    .map_err(ApiErr::from_db("set_media_acl"))?;

    if !updated {
        return Err(ApiErr::not_found("Object not found"));
    }

    info!("User {} made object {} public", claims.sub, object_id);
    Ok(Json(ObjectPathResponse {
        object_path: format!("/objects/{}", object_id),
    }))
}

/// GET /objects/{id} — serve an object if its ACL allows the caller.
pub async fn download_object(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    let Path(object_id) = path?;
    let oid = object_id.to_string();
    let media = db_task(&state, move |db| db.get_media(&oid))
        .await
        .map_err(ApiErr::from_db("get_media"))?
        .filter(|m| m.uploaded)
        .ok_or_else(|| ApiErr::not_found("Object not found"))?;

    let allowed = media.visibility() == Visibility::Public || media.owner_id == claims.sub;
    if !allowed {
        return Err(ApiErr::unauthorized("Unauthorized"));
    }

    let bytes = state
        .storage
        .read_object(&media.id)
        .await
        .map_err(ApiErr::from_db("read_object"))?
        .ok_or_else(|| ApiErr::not_found("Object not found"))?;

    let content_type = media
        .content_type
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}

/// Pull the object id out of anything the client may hold: an upload URL,
/// an `/objects/{id}` path, or an absolute URL to either.
pub fn object_id_from_url(url: &str) -> Option<Uuid> {
    let path = url.split(['?', '#']).next()?;
    path.trim_end_matches('/').rsplit('/').next()?.parse().ok()
}

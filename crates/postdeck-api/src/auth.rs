use axum::{Extension, Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};
use axum_extra::extract::cookie::CookieJar;
use tracing::info;

use postdeck_db::models::UpsertUser;
use postdeck_types::api::{Claims, LoginRequest, LoginResponse, SuccessResponse};
use postdeck_types::models::User;

use crate::error::ApiErr;
use crate::middleware::{create_session_token, expired_session_cookie, session_cookie};
use crate::state::{AppState, db_task};

/// POST /api/login — sign in as the identity in the body, creating the
/// user on first sight. Sets the session cookie and also returns the token
/// for bearer-style clients.
///
/// Takes no credentials, so it only answers when dev login is enabled.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiErr> {
    if !state.dev_login {
        return Err(ApiErr::not_found("Not found"));
    }
    let Json(req) = payload?;

    let id = non_empty(req.id);
    let email = non_empty(req.email).map(|e| e.to_lowercase());
    if id.is_none() && email.is_none() {
        return Err(ApiErr::bad_request("id or email is required"));
    }
    if let Some(email) = &email {
        if !email.contains('@') {
            return Err(ApiErr::bad_request("Invalid email"));
        }
    }

    let upsert = UpsertUser {
        id,
        email,
        first_name: req.first_name,
        last_name: req.last_name,
        profile_image_url: req.profile_image_url,
    };

    let row = db_task(&state, move |db| {
        // An email already bound to a different id cannot be claimed.
        if let (Some(id), Some(email)) = (&upsert.id, &upsert.email) {
            if let Some(owner) = db.get_user_by_email(email)? {
                if &owner.id != id {
                    return Ok(None);
                }
            }
        }
        db.upsert_user(&upsert).map(Some)
    })
    .await
    .map_err(ApiErr::from_db("upsert_user"))?
    .ok_or_else(|| ApiErr::conflict("Email belongs to another user"))?;

    let user = User::try_from(row).map_err(ApiErr::from_db("user row"))?;
    let token = create_session_token(&state.jwt_secret, &user.id, user.email.as_deref())
        .map_err(ApiErr::from_db("create_session_token"))?;

    info!("User {} signed in", user.id);

    Ok((
        jar.add(session_cookie(token.clone())),
        Json(LoginResponse { user, token }),
    ))
}

/// GET /api/user
pub async fn current_user(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<User>, ApiErr> {
    let uid = claims.sub.clone();
    let row = db_task(&state, move |db| db.get_user(&uid))
        .await
        .map_err(ApiErr::from_db("get_user"))?
        // Token outlived its user.
        .ok_or_else(|| ApiErr::unauthorized("Unauthorized"))?;

    let user = User::try_from(row).map_err(ApiErr::from_db("user row"))?;
    Ok(Json(user))
}

/// POST /api/logout
pub async fn logout(jar: CookieJar, Extension(claims): Extension<Claims>) -> impl IntoResponse {
    info!("User {} signed out", claims.sub);
    (jar.remove(expired_session_cookie()), Json(SuccessResponse::ok()))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

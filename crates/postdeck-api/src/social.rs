use anyhow::{anyhow, bail};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{Duration, Utc};
use tracing::{error, info};

use postdeck_db::models::NewAccount;
use postdeck_types::api::{Claims, ConnectResponse, OAuthCallbackQuery};
use postdeck_types::models::Platform;

use crate::error::ApiErr;
use crate::oauth_state::{decode_state, encode_state};
use crate::state::{AppState, db_task};

const OAUTH_FAILED: &str = "/dashboard?error=oauth_failed";

/// GET /api/social/connect/{platform} — start an OAuth flow.
pub async fn connect(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(platform): Path<String>,
) -> Result<Json<ConnectResponse>, ApiErr> {
    let provider = state.platforms.get_by_name(&platform)?;
    let platform = provider.platform();

    let redirect_uri = format!(
        "{}/api/social/callback/{}",
        state.public_url.trim_end_matches('/'),
        platform
    );
    let oauth_state = encode_state(&state.jwt_secret, &claims.sub, platform)
        .map_err(ApiErr::from_db("encode_state"))?;

    info!("User {} starting OAuth for {}", claims.sub, platform);

    Ok(Json(ConnectResponse {
        url: provider.auth_url(&oauth_state, &redirect_uri),
        is_mock: state.platforms.is_mock_mode(),
    }))
}

/// GET /api/social/callback/{platform} — provider redirect target.
///
/// Unauthenticated: the signed `state` identifies the user. Always ends in
/// a redirect to the dashboard except for missing parameters.
pub async fn callback(
    State(state): State<AppState>,
    Path(platform): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Response {
    let (Some(code), Some(oauth_state)) = (query.code, query.state) else {
        return (StatusCode::BAD_REQUEST, "Missing OAuth parameters").into_response();
    };

    match complete_oauth(&state, &platform, &code, &oauth_state).await {
        Ok(platform) => Redirect::to(&format!("/dashboard?connected={}", platform)).into_response(),
        Err(e) => {
            error!("Error handling OAuth callback for {}: {:#}", platform, e);
            Redirect::to(OAUTH_FAILED).into_response()
        }
    }
}

async fn complete_oauth(
    state: &AppState,
    platform: &str,
    code: &str,
    oauth_state: &str,
) -> anyhow::Result<Platform> {
    let provider = state.platforms.get_by_name(platform)?;
    let claims = decode_state(&state.jwt_secret, oauth_state)?;
    if claims.platform != provider.platform() {
        bail!("state was issued for {}, callback is for {}", claims.platform, platform);
    }

    let uid = claims.sub.clone();
    if db_task(state, move |db| db.get_user(&uid)).await?.is_none() {
        bail!("state names unknown user {}", claims.sub);
    }

    let tokens = provider.handle_callback(code, oauth_state).await?;
    let info = provider.account_info(&tokens.access_token).await?;

    let account = NewAccount {
        user_id: claims.sub.clone(),
        platform: claims.platform,
        account_name: Some(info.label().to_string()),
        account_id: Some(info.id.clone()),
        access_token: Some(tokens.access_token),
        refresh_token: tokens.refresh_token,
        token_expires_at: tokens.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        is_connected: true,
    };
    let row = db_task(state, move |db| db.upsert_oauth_account(&account)).await?;

    info!("User {} connected {} account {}", claims.sub, claims.platform, row.id);
    Ok(claims.platform)
}

/// GET /api/social/mock-callback — stands in for the provider's consent
/// screen in mock mode and bounces to the real callback route.
pub async fn mock_callback(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<OAuthCallbackQuery>,
) -> Redirect {
    let target = (|| {
        let code = query.code.as_deref().ok_or_else(|| anyhow!("missing code"))?;
        let raw_state = query.state.as_deref().ok_or_else(|| anyhow!("missing state"))?;
        let decoded = decode_state(&state.jwt_secret, raw_state)?;
        if decoded.sub != claims.sub {
            bail!("state belongs to another user");
        }
        let query = serde_urlencoded::to_string(&[("code", code), ("state", raw_state)])?;
        Ok::<_, anyhow::Error>(format!("/api/social/callback/{}?{}", decoded.platform, query))
    })();

    match target {
        Ok(url) => Redirect::to(&url),
        Err(e) => {
            error!("Error parsing state in mock callback: {:#}", e);
            Redirect::to(OAUTH_FAILED)
        }
    }
}

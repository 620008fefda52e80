use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};

use postdeck_types::api::Claims;

use crate::error::ApiErr;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "postdeck_session";

pub const SESSION_AUDIENCE: &str = "postdeck-session";

const SESSION_DAYS: i64 = 30;

/// Extract and validate the session JWT from the `Authorization: Bearer`
/// header, falling back to the session cookie.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiErr> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let token = bearer
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))
        .ok_or_else(|| ApiErr::unauthorized("Unauthorized"))?;

    let claims = decode_session(&state.jwt_secret, &token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

pub fn decode_session(secret: &str, token: &str) -> Result<Claims, ApiErr> {
    let mut validation = Validation::default();
    validation.set_audience(&[SESSION_AUDIENCE]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|_| ApiErr::unauthorized("Unauthorized"))
}

pub fn create_session_token(
    secret: &str,
    user_id: &str,
    email: Option<&str>,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(str::to_string),
        aud: SESSION_AUDIENCE.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

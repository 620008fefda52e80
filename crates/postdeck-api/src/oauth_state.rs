//! Signed OAuth `state` parameter.
//!
//! The state names the user and platform that started the flow. It is an
//! HS256 JWT so the unauthenticated callback cannot be pointed at someone
//! else's account.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use postdeck_types::models::Platform;

const STATE_TTL_MINUTES: i64 = 10;

const STATE_AUDIENCE: &str = "postdeck-oauth-state";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthState {
    pub sub: String,
    pub platform: Platform,
    pub aud: String,
    pub exp: usize,
}

pub fn encode_state(secret: &str, user_id: &str, platform: Platform) -> anyhow::Result<String> {
    let claims = OAuthState {
        sub: user_id.to_string(),
        platform,
        aud: STATE_AUDIENCE.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::minutes(STATE_TTL_MINUTES)).timestamp() as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

pub fn decode_state(secret: &str, state: &str) -> anyhow::Result<OAuthState> {
    let mut validation = Validation::default();
    validation.set_audience(&[STATE_AUDIENCE]);

    let data = decode::<OAuthState>(state, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
    Ok(data.claims)
}

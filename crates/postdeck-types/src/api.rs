use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{PlatformPublishResult, Post, SubscriptionTier, User};

// -- Session claims --

/// JWT claims carried by the session cookie or bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: Option<String>,
    /// Always the session audience; other tokens signed with the same
    /// secret carry a different one.
    pub aud: String,
    pub exp: usize,
}

// -- Auth --

/// Sign-in payload. Either `id` (identity provider subject) or `email` must be present.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// -- Plans --

#[derive(Debug, Serialize, Deserialize)]
pub struct PlanResponse {
    pub id: SubscriptionTier,
    pub name: String,
    pub description: String,
    pub monthly_price_cents: u32,
    pub currency: String,
}

// -- Connected accounts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateConnectedAccountRequest {
    pub platform: String,
    pub account_name: Option<String>,
    pub account_id: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    /// Accounts recorded by hand start disconnected unless the client says otherwise.
    #[serde(default)]
    pub is_connected: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectResponse {
    pub url: String,
    pub is_mock: bool,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

// -- Posts --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub content: String,
    pub image_url: Option<String>,
    pub platforms: Vec<String>,
    /// RFC 3339 timestamp.
    pub scheduled_for: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    pub post: Post,
    pub results: Vec<PlatformPublishResult>,
}

// -- Media --

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadUrlResponse {
    pub upload_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub object_id: String,
    pub size: u64,
    pub sha256: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPostImageRequest {
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ObjectPathResponse {
    pub object_path: String,
}

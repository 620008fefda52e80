use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use postdeck_types::models::Platform;

use crate::error::PlatformError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires.
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishContent {
    pub text: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishResult {
    pub success: bool,
    pub post_id: Option<String>,
    pub platform_url: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountInfo {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub profile_url: Option<String>,
}

impl AccountInfo {
    /// Name to show for the linked account.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// One social platform's OAuth and publishing surface.
#[async_trait]
pub trait PlatformProvider: Send + Sync {
    fn platform(&self) -> Platform;

    /// URL the user is sent to in order to grant access. `state` is echoed
    /// back untouched on the callback.
    fn auth_url(&self, state: &str, redirect_uri: &str) -> String;

    async fn handle_callback(&self, code: &str, state: &str) -> Result<OAuthTokens, PlatformError>;

    async fn refresh_token(&self, refresh_token: &str) -> Result<OAuthTokens, PlatformError>;

    async fn publish_post(
        &self,
        access_token: &str,
        content: &PublishContent,
    ) -> Result<PublishResult, PlatformError>;

    async fn account_info(&self, access_token: &str) -> Result<AccountInfo, PlatformError>;
}

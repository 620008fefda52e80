use async_trait::async_trait;
use rand::Rng;
use rand::distr::Alphanumeric;
use tracing::info;

use postdeck_types::models::Platform;

use crate::error::PlatformError;
use crate::provider::{AccountInfo, OAuthTokens, PlatformProvider, PublishContent, PublishResult};

/// 60 days
const MOCK_TOKEN_TTL_SECS: i64 = 3600 * 24 * 60;

/// Simulated provider for running without real API credentials. OAuth
/// round-trips through the local mock-callback route and every publish
/// succeeds.
pub struct MockProvider {
    platform: Platform,
}

impl MockProvider {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    fn tokens(&self, refresh_token: Option<String>) -> OAuthTokens {
        OAuthTokens {
            access_token: format!("mock_access_{}_{}", self.platform, random_id(21)),
            refresh_token: Some(
                refresh_token
                    .unwrap_or_else(|| format!("mock_refresh_{}_{}", self.platform, random_id(21))),
            ),
            expires_in: Some(MOCK_TOKEN_TTL_SECS),
            token_type: Some("Bearer".into()),
        }
    }
}

fn random_id(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[async_trait]
impl PlatformProvider for MockProvider {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn auth_url(&self, state: &str, _redirect_uri: &str) -> String {
        // Skips the consent screen: straight back to our own callback with a fake code.
        format!("/api/social/mock-callback?code={}&state={}", random_id(21), state)
    }

    async fn handle_callback(&self, code: &str, _state: &str) -> Result<OAuthTokens, PlatformError> {
        if code.is_empty() {
            return Err(PlatformError::OAuth("empty authorization code".into()));
        }
        Ok(self.tokens(None))
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<OAuthTokens, PlatformError> {
        Ok(self.tokens(Some(refresh_token.to_string())))
    }

    async fn publish_post(
        &self,
        _access_token: &str,
        content: &PublishContent,
    ) -> Result<PublishResult, PlatformError> {
        let preview: String = content.text.chars().take(50).collect();
        info!("[MOCK {}] Publishing post: {}...", self.platform.as_str().to_uppercase(), preview);

        Ok(PublishResult {
            success: true,
            post_id: Some(format!("mock_post_{}", random_id(21))),
            platform_url: Some(format!(
                "https://{}.com/posts/mock_{}",
                self.platform,
                random_id(21)
            )),
            error: None,
        })
    }

    async fn account_info(&self, _access_token: &str) -> Result<AccountInfo, PlatformError> {
        Ok(AccountInfo {
            id: format!("mock_user_{}", random_id(8)),
            username: format!("test_{}_user", self.platform),
            display_name: Some(format!("Test {} Account", self.platform.display_name())),
            profile_url: Some(format!("https://{}.com/test_user", self.platform)),
        })
    }
}

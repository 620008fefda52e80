use anyhow::{Result, anyhow, bail};
use chrono::{Duration, Utc};
use tracing::{info, warn};

use postdeck_db::models::{AccountRow, PostRow};
use postdeck_platforms::{PlatformProvider, PublishContent, PublishResult};
use postdeck_types::models::{Platform, PlatformPublishResult, Post, PostStatus};

use crate::state::{AppState, db_task};

/// Tokens this close to expiry are refreshed before use.
const REFRESH_MARGIN_MINUTES: i64 = 5;

/// Publish a post to each of its platforms and persist the outcome.
///
/// Platforms are attempted independently; one failing does not stop the
/// rest. The post ends `published` only if every platform succeeded,
/// otherwise `failed`.
pub async fn publish_post(
    state: &AppState,
    row: PostRow,
) -> Result<(Post, Vec<PlatformPublishResult>)> {
    let post = Post::try_from(row)?;
    let content = PublishContent {
        text: post.content.clone(),
        image_url: post.image_url.clone(),
        video_url: None,
    };

    let mut results = Vec::with_capacity(post.platforms.len());
    for &platform in &post.platforms {
        results.push(publish_to(state, &post.user_id, platform, &content).await);
    }

    let now = Utc::now();
    let (status, published_at) = if results.iter().all(|r| r.success) {
        (PostStatus::Published, Some(now))
    } else {
        (PostStatus::Failed, None)
    };

    let id = post.id.to_string();
    let recorded = results.clone();
    let row = db_task(state, move |db| db.record_publish(&id, status, published_at, &recorded)).await?;

    let succeeded = results.iter().filter(|r| r.success).count();
    info!(
        "Post {} {}: {}/{} platforms succeeded",
        post.id,
        status.as_str(),
        succeeded,
        results.len()
    );

    Ok((Post::try_from(row)?, results))
}

async fn publish_to(
    state: &AppState,
    user_id: &str,
    platform: Platform,
    content: &PublishContent,
) -> PlatformPublishResult {
    match try_publish_to(state, user_id, platform, content).await {
        Ok(result) => PlatformPublishResult {
            platform,
            success: result.success,
            post_id: result.post_id,
            platform_url: result.platform_url,
            error: result.error,
        },
        Err(e) => {
            warn!("Publishing to {} for user {} failed: {:#}", platform, user_id, e);
            PlatformPublishResult {
                platform,
                success: false,
                post_id: None,
                platform_url: None,
                error: Some(e.to_string()),
            }
        }
    }
}

async fn try_publish_to(
    state: &AppState,
    user_id: &str,
    platform: Platform,
    content: &PublishContent,
) -> Result<PublishResult> {
    let provider = state.platforms.get(platform)?;

    let uid = user_id.to_string();
    let account = db_task(state, move |db| db.find_connected_account(&uid, platform))
        .await?
        .ok_or_else(|| anyhow!("No connected {} account", platform))?;

    let access_token = usable_access_token(state, provider.as_ref(), &account).await?;
    Ok(provider.publish_post(&access_token, content).await?)
}

/// The account's access token, refreshed first when it is about to expire.
async fn usable_access_token(
    state: &AppState,
    provider: &dyn PlatformProvider,
    account: &AccountRow,
) -> Result<String> {
    let access_token = account
        .access_token
        .clone()
        .ok_or_else(|| anyhow!("{} account has no access token", provider.platform()))?;

    let now = Utc::now();
    let Some(expires_at) = account.expires_at()? else {
        return Ok(access_token);
    };
    if expires_at - now > Duration::minutes(REFRESH_MARGIN_MINUTES) {
        return Ok(access_token);
    }

    let Some(refresh_token) = account.refresh_token.clone() else {
        if expires_at <= now {
            bail!("{} access token expired and no refresh token is stored", provider.platform());
        }
        return Ok(access_token);
    };

    let tokens = provider.refresh_token(&refresh_token).await?;
    let new_expiry = tokens.expires_in.map(|secs| now + Duration::seconds(secs));

    let id = account.id.clone();
    let new_access = tokens.access_token.clone();
    db_task(state, move |db| {
        db.update_account_tokens(&id, &new_access, tokens.refresh_token.as_deref(), new_expiry)
    })
    .await?;

    info!("Refreshed {} token for account {}", provider.platform(), account.id);
    Ok(tokens.access_token)
}

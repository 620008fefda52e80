//! Database row types. These map directly to SQLite rows and are kept
//! distinct from the postdeck-types API models; the `TryFrom` impls below
//! are the only place the two meet.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use postdeck_types::models::{
    ConnectedAccount, Platform, PlatformPublishResult, Post, PostStatus, SubscriptionTier,
    User, Visibility,
};

/// Canonical on-disk timestamp format. Fixed width, so lexical order in
/// SQLite matches chronological order.
pub fn fmt_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') has no timezone; treat as UTC.
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .with_context(|| format!("invalid timestamp '{}'", raw))
}

fn parse_opt_timestamp(raw: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    raw.map(parse_timestamp).transpose()
}

#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub subscription_tier: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields written on every sign-in.
#[derive(Debug, Clone, Default)]
pub struct UpsertUser {
    pub id: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AccountRow {
    pub id: String,
    pub user_id: String,
    pub platform: String,
    pub account_name: Option<String>,
    pub account_id: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<String>,
    pub is_connected: bool,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: String,
    pub platform: Platform,
    pub account_name: Option<String>,
    pub account_id: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub is_connected: bool,
}

#[derive(Debug, Clone)]
pub struct PostRow {
    pub id: String,
    pub user_id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub platforms: String,
    pub scheduled_for: String,
    pub status: String,
    pub published_at: Option<String>,
    pub publish_results: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub platforms: Vec<Platform>,
    pub scheduled_for: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MediaRow {
    pub id: String,
    pub owner_id: String,
    pub visibility: String,
    pub content_type: Option<String>,
    pub size: i64,
    pub sha256: Option<String>,
    pub uploaded: bool,
    pub expires_at: String,
    pub created_at: String,
}

impl MediaRow {
    pub fn visibility(&self) -> Visibility {
        self.visibility.parse().unwrap_or(Visibility::Private)
    }

    pub fn is_expired_ticket(&self, now: DateTime<Utc>) -> bool {
        !self.uploaded
            && parse_timestamp(&self.expires_at)
                .map(|deadline| deadline < now)
                .unwrap_or(true)
    }
}

impl AccountRow {
    pub fn platform(&self) -> Result<Platform> {
        self.platform
            .parse()
            .map_err(|e| anyhow!("corrupt platform on account {}: {}", self.id, e))
    }

    pub fn expires_at(&self) -> Result<Option<DateTime<Utc>>> {
        parse_opt_timestamp(self.token_expires_at.as_deref())
    }
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            subscription_tier: row
                .subscription_tier
                .parse::<SubscriptionTier>()
                .map_err(|e| anyhow!("corrupt tier on user {}: {}", row.id, e))?,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            profile_image_url: row.profile_image_url,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
        })
    }
}

impl TryFrom<AccountRow> for ConnectedAccount {
    type Error = anyhow::Error;

    fn try_from(row: AccountRow) -> Result<Self> {
        Ok(ConnectedAccount {
            id: row.id.parse::<Uuid>()?,
            platform: row.platform()?,
            token_expires_at: row.expires_at()?,
            created_at: parse_timestamp(&row.created_at)?,
            user_id: row.user_id,
            account_name: row.account_name,
            account_id: row.account_id,
            is_connected: row.is_connected,
        })
    }
}

impl TryFrom<PostRow> for Post {
    type Error = anyhow::Error;

    fn try_from(row: PostRow) -> Result<Self> {
        let platforms: Vec<Platform> = serde_json::from_str(&row.platforms)
            .with_context(|| format!("corrupt platforms on post {}", row.id))?;
        let publish_results: Vec<PlatformPublishResult> = serde_json::from_str(&row.publish_results)
            .with_context(|| format!("corrupt publish results on post {}", row.id))?;

        Ok(Post {
            id: row.id.parse::<Uuid>()?,
            status: row
                .status
                .parse::<PostStatus>()
                .map_err(|e| anyhow!("corrupt status on post {}: {}", row.id, e))?,
            scheduled_for: parse_timestamp(&row.scheduled_for)?,
            published_at: parse_opt_timestamp(row.published_at.as_deref())?,
            created_at: parse_timestamp(&row.created_at)?,
            user_id: row.user_id,
            content: row.content,
            image_url: row.image_url,
            platforms,
            publish_results,
        })
    }
}

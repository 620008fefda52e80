use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Social platforms a post can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    Linkedin,
    Twitter,
    Youtube,
    Tiktok,
}

impl Platform {
    pub const ALL: [Platform; 6] = [
        Platform::Facebook,
        Platform::Instagram,
        Platform::Linkedin,
        Platform::Twitter,
        Platform::Youtube,
        Platform::Tiktok,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
            Self::Linkedin => "linkedin",
            Self::Twitter => "twitter",
            Self::Youtube => "youtube",
            Self::Tiktok => "tiktok",
        }
    }

    /// Human-facing brand name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Facebook => "Facebook",
            Self::Instagram => "Instagram",
            Self::Linkedin => "LinkedIn",
            Self::Twitter => "X (Twitter)",
            Self::Youtube => "YouTube",
            Self::Tiktok => "TikTok",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown value: {0}")]
pub struct UnknownVariant(pub String);

impl FromStr for Platform {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Lifecycle of a post: `scheduled` until a publish attempt, then
/// `published` if every platform succeeded or `failed` otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Scheduled,
    Published,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Published => "published",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for PostStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "published" => Ok(Self::Published),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Pro,
    Agency,
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 3] = [Self::Free, Self::Pro, Self::Agency];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Agency => "agency",
        }
    }

    /// Monthly price in USD cents.
    pub fn monthly_price_cents(&self) -> u32 {
        match self {
            Self::Free => 0,
            Self::Pro => 999,
            Self::Agency => 2499,
        }
    }

    pub fn plan_name(&self) -> &'static str {
        match self {
            Self::Free => "Free Plan",
            Self::Pro => "Pro Plan",
            Self::Agency => "Agency Plan",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Free => "Schedule posts across your connected accounts",
            Self::Pro => "Everything you need to grow faster and smarter",
            Self::Agency => "Built for agencies, power users & professionals",
        }
    }
}

impl FromStr for SubscriptionTier {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SubscriptionTier::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Who may read a stored media object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Private => "private",
            Self::Public => "public",
        }
    }
}

impl FromStr for Visibility {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(Self::Private),
            "public" => Ok(Self::Public),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub subscription_tier: SubscriptionTier,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A linked social account as shown to its owner. OAuth tokens stay server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedAccount {
    pub id: Uuid,
    pub user_id: String,
    pub platform: Platform,
    pub account_name: Option<String>,
    pub account_id: Option<String>,
    pub token_expires_at: Option<DateTime<Utc>>,
    pub is_connected: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub platforms: Vec<Platform>,
    pub scheduled_for: DateTime<Utc>,
    pub status: PostStatus,
    pub published_at: Option<DateTime<Utc>>,
    pub publish_results: Vec<PlatformPublishResult>,
    pub created_at: DateTime<Utc>,
}

/// Outcome of publishing one post to one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformPublishResult {
    pub platform: Platform,
    pub success: bool,
    pub post_id: Option<String>,
    pub platform_url: Option<String>,
    pub error: Option<String>,
}

use crate::Database;
use crate::models::{
    AccountRow, MediaRow, NewAccount, NewPost, PostRow, UpsertUser, UserRow, fmt_timestamp,
};
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use postdeck_types::models::{Platform, PlatformPublishResult, PostStatus, Visibility};
use rusqlite::{Connection, Row};
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, first_name, last_name, profile_image_url, subscription_tier,
     stripe_customer_id, stripe_subscription_id, created_at, updated_at";

const ACCOUNT_COLUMNS: &str = "id, user_id, platform, account_name, account_id, access_token,
     refresh_token, token_expires_at, is_connected, created_at";

const POST_COLUMNS: &str = "id, user_id, content, image_url, platforms, scheduled_for, status,
     published_at, publish_results, created_at";

const MEDIA_COLUMNS: &str =
    "id, owner_id, visibility, content_type, size, sha256, uploaded, expires_at, created_at";

impl Database {
    // -- Users --

    pub fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    /// Insert or refresh a user on sign-in. Matches an existing row by id
    /// first, then by email; profile fields are overwritten, the tier and
    /// billing references are left alone.
    pub fn upsert_user(&self, user: &UpsertUser) -> Result<UserRow> {
        if user.id.is_none() && user.email.is_none() {
            return Err(anyhow!("upsert_user needs an id or an email"));
        }

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let now = fmt_timestamp(Utc::now());

            let existing = match (&user.id, &user.email) {
                (Some(id), _) => query_user(&tx, "id", id)?,
                (None, Some(email)) => query_user(&tx, "email", email)?,
                (None, None) => None,
            };

            let id = match existing {
                Some(row) => {
                    tx.execute(
                        "UPDATE users
                         SET email = COALESCE(?2, email), first_name = ?3, last_name = ?4,
                             profile_image_url = ?5, updated_at = ?6
                         WHERE id = ?1",
                        rusqlite::params![
                            &row.id,
                            &user.email,
                            &user.first_name,
                            &user.last_name,
                            &user.profile_image_url,
                            &now,
                        ],
                    )?;
                    row.id
                }
                None => {
                    let id = user.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
                    tx.execute(
                        "INSERT INTO users (id, email, first_name, last_name, profile_image_url, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                        rusqlite::params![
                            &id,
                            &user.email,
                            &user.first_name,
                            &user.last_name,
                            &user.profile_image_url,
                            &now,
                        ],
                    )?;
                    id
                }
            };

            let row = query_user(&tx, "id", &id)?
                .ok_or_else(|| anyhow!("user {} vanished during upsert", id))?;
            tx.commit()?;
            Ok(row)
        })
    }

    // -- Connected accounts --

    pub fn list_accounts(&self, user_id: &str) -> Result<Vec<AccountRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM connected_accounts WHERE user_id = ?1 ORDER BY created_at",
                ACCOUNT_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], account_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_account(&self, id: &str) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM connected_accounts WHERE id = ?1", ACCOUNT_COLUMNS);
            conn.query_row(&sql, [id], account_from_row).optional()
        })
    }

    /// The most recent connected account a user has on a platform.
    pub fn find_connected_account(
        &self,
        user_id: &str,
        platform: Platform,
    ) -> Result<Option<AccountRow>> {
        self.with_conn(|conn| query_connected_account(conn, user_id, platform))
    }

    pub fn insert_account(&self, account: &NewAccount) -> Result<AccountRow> {
        self.with_conn_mut(|conn| insert_account_row(conn, account))
    }

    /// OAuth grant storage: replaces the tokens of the user's existing
    /// connected row for the platform, or inserts one if there is none.
    pub fn upsert_oauth_account(&self, account: &NewAccount) -> Result<AccountRow> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let row = match query_connected_account(&tx, &account.user_id, account.platform)? {
                Some(existing) => {
                    tx.execute(
                        "UPDATE connected_accounts
                         SET account_name = ?2, account_id = ?3, access_token = ?4,
                             refresh_token = ?5, token_expires_at = ?6, is_connected = ?7
                         WHERE id = ?1",
                        rusqlite::params![
                            &existing.id,
                            &account.account_name,
                            &account.account_id,
                            &account.access_token,
                            &account.refresh_token,
                            account.token_expires_at.map(fmt_timestamp),
                            account.is_connected,
                        ],
                    )?;
                    query_account(&tx, &existing.id)?
                        .ok_or_else(|| anyhow!("account {} vanished during upsert", existing.id))?
                }
                None => insert_account_row(&tx, account)?,
            };
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn update_account_tokens(
        &self,
        id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE connected_accounts
                 SET access_token = ?2, refresh_token = COALESCE(?3, refresh_token), token_expires_at = ?4
                 WHERE id = ?1",
                rusqlite::params![id, access_token, refresh_token, expires_at.map(fmt_timestamp)],
            )?;
            Ok(())
        })
    }

    /// Returns false when no row matched.
    pub fn delete_account(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute("DELETE FROM connected_accounts WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    // -- Posts --

    pub fn insert_post(&self, post: &NewPost) -> Result<PostRow> {
        let platforms = serde_json::to_string(&post.platforms)?;
        self.with_conn_mut(|conn| {
            let id = Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO posts (id, user_id, content, image_url, platforms, scheduled_for, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    &id,
                    &post.user_id,
                    &post.content,
                    &post.image_url,
                    &platforms,
                    fmt_timestamp(post.scheduled_for),
                    PostStatus::Scheduled.as_str(),
                    fmt_timestamp(Utc::now()),
                ],
            )?;
            query_post(conn, &id)?.ok_or_else(|| anyhow!("post {} vanished after insert", id))
        })
    }

    /// A user's posts, latest `scheduled_for` first.
    pub fn list_posts(&self, user_id: &str) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM posts WHERE user_id = ?1 ORDER BY scheduled_for DESC, created_at DESC",
                POST_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_post(&self, id: &str) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    /// Scheduled posts whose time has come, oldest first.
    pub fn due_posts(&self, now: DateTime<Utc>, limit: u32) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM posts
                 WHERE status = ?1 AND scheduled_for <= ?2
                 ORDER BY scheduled_for ASC
                 LIMIT ?3",
                POST_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(
                    rusqlite::params![PostStatus::Scheduled.as_str(), fmt_timestamp(now), limit],
                    post_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn record_publish(
        &self,
        id: &str,
        status: PostStatus,
        published_at: Option<DateTime<Utc>>,
        results: &[PlatformPublishResult],
    ) -> Result<PostRow> {
        let results = serde_json::to_string(results)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE posts SET status = ?2, published_at = ?3, publish_results = ?4 WHERE id = ?1",
                rusqlite::params![id, status.as_str(), published_at.map(fmt_timestamp), &results],
            )?;
            query_post(conn, id)?.ok_or_else(|| anyhow!("post {} not found", id))
        })
    }

    // -- Media objects --

    pub fn insert_media_ticket(&self, id: &str, owner_id: &str, expires_at: DateTime<Utc>) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO media_objects (id, owner_id, visibility, expires_at, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    id,
                    owner_id,
                    Visibility::Private.as_str(),
                    fmt_timestamp(expires_at),
                    fmt_timestamp(Utc::now()),
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_media(&self, id: &str) -> Result<Option<MediaRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} FROM media_objects WHERE id = ?1", MEDIA_COLUMNS);
            conn.query_row(&sql, [id], media_from_row).optional()
        })
    }

    pub fn mark_media_uploaded(&self, id: &str, content_type: &str, size: u64, sha256: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE media_objects SET content_type = ?2, size = ?3, sha256 = ?4, uploaded = 1 WHERE id = ?1",
                rusqlite::params![id, content_type, size as i64, sha256],
            )?;
            Ok(())
        })
    }

    pub fn set_media_acl(&self, id: &str, owner_id: &str, visibility: Visibility) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE media_objects SET owner_id = ?2, visibility = ?3 WHERE id = ?1",
                rusqlite::params![id, owner_id, visibility.as_str()],
            )?;
            Ok(())
        })
    }

    /// Upload tickets that passed their deadline without receiving bytes.
    pub fn expired_media_tickets(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id FROM media_objects WHERE uploaded = 0 AND expires_at < ?1",
            )?;
            let ids = stmt
                .query_map([fmt_timestamp(now)], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    pub fn delete_media(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute("DELETE FROM media_objects WHERE id = ?1", [id])?;
            Ok(())
        })
    }
}

fn query_user(conn: &Connection, key: &str, value: &str) -> Result<Option<UserRow>> {
    // `key` is always a literal column name from this module.
    let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, key);
    conn.query_row(&sql, [value], user_from_row).optional()
}

fn query_account(conn: &Connection, id: &str) -> Result<Option<AccountRow>> {
    let sql = format!("SELECT {} FROM connected_accounts WHERE id = ?1", ACCOUNT_COLUMNS);
    conn.query_row(&sql, [id], account_from_row).optional()
}

fn query_connected_account(
    conn: &Connection,
    user_id: &str,
    platform: Platform,
) -> Result<Option<AccountRow>> {
    let sql = format!(
        "SELECT {} FROM connected_accounts
         WHERE user_id = ?1 AND platform = ?2 AND is_connected = 1
         ORDER BY created_at DESC
         LIMIT 1",
        ACCOUNT_COLUMNS
    );
    conn.query_row(&sql, [user_id, platform.as_str()], account_from_row)
        .optional()
}

fn insert_account_row(conn: &Connection, account: &NewAccount) -> Result<AccountRow> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO connected_accounts
            (id, user_id, platform, account_name, account_id, access_token, refresh_token,
             token_expires_at, is_connected, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        rusqlite::params![
            &id,
            &account.user_id,
            account.platform.as_str(),
            &account.account_name,
            &account.account_id,
            &account.access_token,
            &account.refresh_token,
            account.token_expires_at.map(fmt_timestamp),
            account.is_connected,
            fmt_timestamp(Utc::now()),
        ],
    )?;
    query_account(conn, &id)?.ok_or_else(|| anyhow!("account {} vanished after insert", id))
}

fn query_post(conn: &Connection, id: &str) -> Result<Option<PostRow>> {
    let sql = format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS);
    conn.query_row(&sql, [id], post_from_row).optional()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        profile_image_url: row.get(4)?,
        subscription_tier: row.get(5)?,
        stripe_customer_id: row.get(6)?,
        stripe_subscription_id: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        platform: row.get(2)?,
        account_name: row.get(3)?,
        account_id: row.get(4)?,
        access_token: row.get(5)?,
        refresh_token: row.get(6)?,
        token_expires_at: row.get(7)?,
        is_connected: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        content: row.get(2)?,
        image_url: row.get(3)?,
        platforms: row.get(4)?,
        scheduled_for: row.get(5)?,
        status: row.get(6)?,
        published_at: row.get(7)?,
        publish_results: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn media_from_row(row: &Row<'_>) -> rusqlite::Result<MediaRow> {
    Ok(MediaRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        visibility: row.get(2)?,
        content_type: row.get(3)?,
        size: row.get(4)?,
        sha256: row.get(5)?,
        uploaded: row.get(6)?,
        expires_at: row.get(7)?,
        created_at: row.get(8)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

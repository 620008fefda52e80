use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id                      TEXT PRIMARY KEY,
                email                   TEXT UNIQUE,
                first_name              TEXT,
                last_name               TEXT,
                profile_image_url       TEXT,
                subscription_tier       TEXT NOT NULL DEFAULT 'free',
                stripe_customer_id      TEXT,
                stripe_subscription_id  TEXT,
                created_at              TEXT NOT NULL,
                updated_at              TEXT NOT NULL
            );

            CREATE TABLE connected_accounts (
                id                  TEXT PRIMARY KEY,
                user_id             TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                platform            TEXT NOT NULL,
                account_name        TEXT,
                account_id          TEXT,
                access_token        TEXT,
                refresh_token       TEXT,
                token_expires_at    TEXT,
                is_connected        INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL
            );

            CREATE INDEX idx_accounts_user_platform
                ON connected_accounts(user_id, platform);

            CREATE TABLE posts (
                id                  TEXT PRIMARY KEY,
                user_id             TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                content             TEXT NOT NULL,
                image_url           TEXT,
                platforms           TEXT NOT NULL,
                scheduled_for       TEXT NOT NULL,
                status              TEXT NOT NULL DEFAULT 'scheduled',
                published_at        TEXT,
                publish_results     TEXT NOT NULL DEFAULT '[]',
                created_at          TEXT NOT NULL
            );

            CREATE INDEX idx_posts_user_scheduled
                ON posts(user_id, scheduled_for);

            CREATE INDEX idx_posts_status_scheduled
                ON posts(status, scheduled_for);

            CREATE TABLE media_objects (
                id              TEXT PRIMARY KEY,
                owner_id        TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                visibility      TEXT NOT NULL DEFAULT 'private',
                content_type    TEXT,
                size            INTEGER NOT NULL DEFAULT 0,
                sha256          TEXT,
                uploaded        INTEGER NOT NULL DEFAULT 0,
                expires_at      TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

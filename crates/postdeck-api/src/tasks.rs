use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::publisher;
use crate::state::{AppState, db_task};

/// Posts handled per auto-publish tick.
const DUE_BATCH: u32 = 50;

/// Background task that publishes scheduled posts once their time arrives.
pub async fn run_auto_publish_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match publish_due_posts(&state).await {
            Ok(count) => {
                if count > 0 {
                    info!("Auto-publish: processed {} due posts", count);
                }
            }
            Err(e) => {
                warn!("Auto-publish error: {:#}", e);
            }
        }
    }
}

pub async fn publish_due_posts(state: &AppState) -> anyhow::Result<usize> {
    let now = Utc::now();
    let due = db_task(state, move |db| db.due_posts(now, DUE_BATCH)).await?;

    let count = due.len();
    for row in due {
        let id = row.id.clone();
        if let Err(e) = publisher::publish_post(state, row).await {
            warn!("Auto-publish of post {} failed: {:#}", id, e);
        }
    }

    Ok(count)
}

/// Background task that prunes upload tickets nobody used.
pub async fn run_media_cleanup_loop(state: AppState, interval_secs: u64) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));

    loop {
        interval.tick().await;

        match cleanup_expired_uploads(&state).await {
            Ok(count) => {
                if count > 0 {
                    info!("Cleanup: pruned {} expired upload tickets", count);
                }
            }
            Err(e) => {
                warn!("Cleanup error: {:#}", e);
            }
        }
    }
}

pub async fn cleanup_expired_uploads(state: &AppState) -> anyhow::Result<usize> {
    let now = Utc::now();
    let expired = db_task(state, move |db| db.expired_media_tickets(now)).await?;

    let count = expired.len();
    for id in expired {
        // A failed write can leave a partial file behind.
        state.storage.delete_object(&id).await.ok();

        db_task(state, move |db| db.delete_media(&id)).await?;
    }

    Ok(count)
}

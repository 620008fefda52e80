mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use postdeck_api::{AppStateInner, tasks};
use postdeck_db::Database;
use postdeck_media::MediaStorage;
use postdeck_platforms::PlatformRegistry;

use crate::config::Config;

/// Upload tickets are swept hourly.
const MEDIA_CLEANUP_SECS: u64 = 3600;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "postdeck_server=debug,postdeck_api=debug,postdeck_platforms=info,tower_http=debug".into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("FATAL: {}", e);
            std::process::exit(1);
        }
    };

    // Init database and media storage
    let db = Database::open(&config.db_path)?;
    let storage = MediaStorage::new(config.media_dir.clone()).await?;
    let platforms = PlatformRegistry::new(config.mock_mode);
    if config.dev_login {
        warn!("Dev login is enabled: POST /api/login signs in without credentials");
    }

    let state = Arc::new(AppStateInner {
        db,
        storage,
        platforms,
        jwt_secret: config.jwt_secret.clone(),
        public_url: config.public_url.clone(),
        dev_login: config.dev_login,
    });

    tokio::spawn(tasks::run_media_cleanup_loop(state.clone(), MEDIA_CLEANUP_SECS));
    if config.auto_publish_secs > 0 {
        info!("Auto-publish every {} seconds", config.auto_publish_secs);
        tokio::spawn(tasks::run_auto_publish_loop(state.clone(), config.auto_publish_secs));
    }

    let app = postdeck_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let listener = config.bind().await?;
    info!("Postdeck server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    ctrl_c.await.ok();
                    return;
                }
            };
        tokio::select! {
            _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

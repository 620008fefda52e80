use std::sync::Arc;

use postdeck_db::Database;
use postdeck_media::MediaStorage;
use postdeck_platforms::PlatformRegistry;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub storage: MediaStorage,
    pub platforms: PlatformRegistry,
    pub jwt_secret: String,
    /// Externally reachable base URL, used to build OAuth redirect URIs.
    pub public_url: String,
    /// Enables the credential-less `POST /api/login`.
    pub dev_login: bool,
}

/// Run a blocking DB closure off the async runtime.
pub async fn db_task<F, T>(state: &AppState, f: F) -> anyhow::Result<T>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db)).await?
}

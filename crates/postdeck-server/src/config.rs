use std::path::PathBuf;

use thiserror::Error;
use tokio::net::TcpListener;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("POSTDECK_JWT_SECRET is unset or still a placeholder")]
    MissingSecret,

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub public_url: String,
    pub media_dir: PathBuf,
    pub mock_mode: bool,
    /// 0 disables the auto-publisher.
    pub auto_publish_secs: u64,
    pub dev_login: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = get("POSTDECK_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::MissingSecret);
        }

        let port = parse_or(&get, "POSTDECK_PORT", 3000u16)?;
        let public_url = get("POSTDECK_PUBLIC_URL").unwrap_or_else(|| format!("http://localhost:{}", port));

        Ok(Self {
            jwt_secret,
            db_path: get("POSTDECK_DB_PATH").unwrap_or_else(|| "postdeck.db".into()).into(),
            host: get("POSTDECK_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            public_url,
            media_dir: get("POSTDECK_MEDIA_DIR").unwrap_or_else(|| "./media".into()).into(),
            // Mock unless explicitly turned off.
            mock_mode: get("POSTDECK_SOCIAL_MOCK_MODE").as_deref() != Some("false"),
            auto_publish_secs: parse_or(&get, "POSTDECK_AUTO_PUBLISH_SECS", 0u64)?,
            dev_login: parse_or(&get, "POSTDECK_DEV_LOGIN", false)?,
        })
    }

    /// Bind the listen socket. `host` may be a name or a bare IP of either family.
    pub async fn bind(&self) -> std::io::Result<TcpListener> {
        TcpListener::bind((self.host.as_str(), self.port)).await
    }
}

fn parse_or<F, T>(get: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match get(name) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
    }
}

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use estate_chat::CompletionConfig;

/// Placeholder used when no secret is configured. Fine for local runs only.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub uploads_dir: PathBuf,
    pub completion: CompletionConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = CompletionConfig::default();

        let timeout_secs: u64 = parse_or(&get, "ESTATE_COMPLETION_TIMEOUT_SECS", 10)?;
        if timeout_secs == 0 {
            anyhow::bail!("ESTATE_COMPLETION_TIMEOUT_SECS must be positive");
        }
        let ttl_hours: i64 = parse_or(&get, "ESTATE_TOKEN_TTL_HOURS", 24)?;
        if ttl_hours <= 0 {
            anyhow::bail!("ESTATE_TOKEN_TTL_HOURS must be positive");
        }

        Ok(Self {
            host: get("ESTATE_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&get, "ESTATE_PORT", 5000)?,
            db_path: get("ESTATE_DB_PATH")
                .unwrap_or_else(|| "real_estate.db".into())
                .into(),
            jwt_secret: get("ESTATE_JWT_SECRET").unwrap_or_else(|| DEV_JWT_SECRET.into()),
            token_ttl: chrono::Duration::hours(ttl_hours),
            uploads_dir: get("ESTATE_UPLOADS_DIR")
                .unwrap_or_else(|| "./uploads".into())
                .into(),
            completion: CompletionConfig {
                api_key: get("ESTATE_COMPLETION_API_KEY"),
                base_url: get("ESTATE_COMPLETION_BASE_URL").unwrap_or(defaults.base_url),
                model: get("ESTATE_COMPLETION_MODEL").unwrap_or(defaults.model),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

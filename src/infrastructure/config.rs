use std::env;
use std::time::Duration;

use tracing::warn;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the user data server
    pub base_url: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Time-to-live for cached user sets
    pub cache_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300), // 5 minutes
        }
    }
}

impl AppConfig {
    /// Build a configuration from `USERFEED_*` environment variables,
    /// falling back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("USERFEED_BASE_URL") {
            if !url.trim().is_empty() {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }
        if let Some(secs) = read_secs("USERFEED_TIMEOUT_SECS") {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = read_secs("USERFEED_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = read_secs("USERFEED_CACHE_TTL_SECS") {
            config.cache_ttl = Duration::from_secs(secs);
        }

        config
    }
}

fn read_secs(var: &str) -> Option<u64> {
    match env::var(var) {
        Ok(raw) => match raw.parse::<u64>() {
            Ok(secs) => Some(secs),
            Err(_) => {
                warn!("ignoring invalid value for {}: {}", var, raw);
                None
            }
        },
        Err(_) => None,
    }
}

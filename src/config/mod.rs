use std::env;
use std::time::Duration;

/// Config holds the connection settings for Infrahub
#[derive(Debug, Clone)]
pub struct Config {
    pub address: String,
    pub api_token: String,
    pub default_branch: String,
    /// Infrahub release used by the compose tasks; `None` means latest
    pub version: Option<String>,
    pub timeout_secs: u64,
    pub max_concurrent: usize,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            address: get_env("INFRAHUB_ADDRESS", "http://localhost:8000"),
            api_token: get_env("INFRAHUB_API_TOKEN", ""),
            default_branch: get_env("INFRAHUB_DEFAULT_BRANCH", "main"),
            version: env::var("INFRAHUB_VERSION").ok().filter(|v| !v.is_empty()),
            timeout_secs: get_env("INFRAHUB_TIMEOUT", "60").parse().unwrap_or(60),
            max_concurrent: get_env("INFRAHUB_MAX_CONCURRENT_EXECUTION", "5")
                .parse()
                .unwrap_or(5),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Recommendation backend base URL
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Local API host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Local API port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of ranked items requested per batch fetch
    #[serde(default = "default_batch_limit")]
    pub batch_limit: u32,

    /// Remaining-supply threshold below which regeneration is requested
    #[serde(default = "default_low_watermark")]
    pub low_watermark: i64,

    /// Generation status poll interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Upper bound on how long a single generation job is polled
    #[serde(default = "default_max_poll_secs")]
    pub max_poll_secs: u64,

    /// Timeout for individual backend requests
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Where the last applied filter selection is persisted
    #[serde(default = "default_filters_path")]
    pub filters_path: String,
}

fn default_backend_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3100
}

fn default_batch_limit() -> u32 {
    50
}

fn default_low_watermark() -> i64 {
    10
}

fn default_poll_interval_ms() -> u64 {
    2000
}

fn default_max_poll_secs() -> u64 {
    600
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_filters_path() -> String {
    "feedmovie_filters.json".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Build configuration from an explicit set of key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.batch_limit == 0 {
            anyhow::bail!("BATCH_LIMIT must be greater than zero");
        }
        if config.poll_interval_ms == 0 {
            anyhow::bail!("POLL_INTERVAL_MS must be greater than zero");
        }

        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn max_poll_duration(&self) -> Duration {
        Duration::from_secs(self.max_poll_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

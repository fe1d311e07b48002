use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Catalog API key (sent as `api_key` query parameter)
    pub catalog_api_key: String,

    /// Catalog API base URL
    #[serde(default = "default_catalog_api_url")]
    pub catalog_api_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of cache entries
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    /// Maximum cache memory in bytes
    #[serde(default = "default_cache_max_memory_bytes")]
    pub cache_max_memory_bytes: usize,

    /// TTL for cached recommendation results, in seconds
    #[serde(default = "default_result_ttl_secs")]
    pub result_ttl_secs: u64,

    /// TTL for cached item details, in seconds
    #[serde(default = "default_details_ttl_secs")]
    pub details_ttl_secs: u64,

    /// Interval between expired-entry sweeps, in seconds
    #[serde(default = "default_cache_cleanup_interval_secs")]
    pub cache_cleanup_interval_secs: u64,

    /// Maximum upstream requests per rate-limit window
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Rate-limit window length, in milliseconds
    #[serde(default = "default_rate_limit_window_ms")]
    pub rate_limit_window_ms: u64,

    /// Maximum retry attempts per upstream call
    #[serde(default = "default_fetch_max_retries")]
    pub fetch_max_retries: u32,

    /// Base retry backoff delay, in milliseconds
    #[serde(default = "default_fetch_base_delay_ms")]
    pub fetch_base_delay_ms: u64,

    /// Backoff ceiling, in milliseconds
    #[serde(default = "default_fetch_max_delay_ms")]
    pub fetch_max_delay_ms: u64,

    /// Per-call HTTP deadline, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Per-adapter time box on the fast path, in milliseconds
    #[serde(default = "default_fast_path_timeout_ms")]
    pub fast_path_timeout_ms: u64,

    /// Number of detail-enrichment workers
    #[serde(default = "default_enrich_workers")]
    pub enrich_workers: usize,
}

fn default_catalog_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cache_max_entries() -> usize {
    500
}

fn default_cache_max_memory_bytes() -> usize {
    50 * 1024 * 1024
}

fn default_result_ttl_secs() -> u64 {
    1800
}

fn default_details_ttl_secs() -> u64 {
    21600
}

fn default_cache_cleanup_interval_secs() -> u64 {
    300
}

fn default_rate_limit_max_requests() -> u32 {
    40
}

fn default_rate_limit_window_ms() -> u64 {
    10_000
}

fn default_fetch_max_retries() -> u32 {
    3
}

fn default_fetch_base_delay_ms() -> u64 {
    300
}

fn default_fetch_max_delay_ms() -> u64 {
    5_000
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_fast_path_timeout_ms() -> u64 {
    1_300
}

fn default_enrich_workers() -> usize {
    3
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: Config = envy::from_iter(vec![(
            "CATALOG_API_KEY".to_string(),
            "test_key".to_string(),
        )])
        .unwrap();

        assert_eq!(config.catalog_api_key, "test_key");
        assert_eq!(config.catalog_api_url, "https://api.themoviedb.org/3");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cache_max_entries, 500);
        assert_eq!(config.enrich_workers, 3);
    }

    #[test]
    fn test_overrides() {
        let config: Config = envy::from_iter(vec![
            ("CATALOG_API_KEY".to_string(), "k".to_string()),
            ("PORT".to_string(), "8080".to_string()),
            ("RATE_LIMIT_MAX_REQUESTS".to_string(), "5".to_string()),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limit_max_requests, 5);
    }
}

use std::sync::Arc;
use std::time::Duration;

use crate::cache::SwrCache;
use crate::config::Config;
use crate::fetch::catalog::CatalogClient;
use crate::fetch::rate_limiter::RateLimiter;
use crate::fetch::retry::RetryPolicy;
use crate::fetch::sources::default_adapters;
use crate::services::aggregator::CandidateAggregator;
use crate::services::recommendations::RecommendationService;
use crate::services::similarity::SimilarityScorer;

/// Shared application state.
///
/// All process-wide services — cache, rate limiter, catalog client — are
/// constructed here and owned by the recommendation service; there are no
/// module-level singletons. Lifetime is the process; tests get isolation by
/// constructing their own state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecommendationService>,
}

impl AppState {
    /// Builds the full service graph from configuration
    pub fn new(config: &Config) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            config.rate_limit_max_requests,
            Duration::from_millis(config.rate_limit_window_ms),
        ));

        let retry = RetryPolicy {
            max_retries: config.fetch_max_retries,
            base_delay: Duration::from_millis(config.fetch_base_delay_ms),
            max_delay: Duration::from_millis(config.fetch_max_delay_ms),
            multiplier: 2.0,
        };

        let client = Arc::new(CatalogClient::new(
            config.catalog_api_url.clone(),
            config.catalog_api_key.clone(),
            rate_limiter,
            retry,
            Duration::from_secs(config.fetch_timeout_secs),
        ));

        let details_cache = SwrCache::new(
            config.cache_max_entries,
            config.cache_max_memory_bytes,
            Duration::from_secs(config.details_ttl_secs),
        );

        let aggregator = Arc::new(CandidateAggregator::new(
            default_adapters(Arc::clone(&client)),
            Arc::clone(&client),
            details_cache.clone(),
            config.enrich_workers,
        ));

        let results_cache = SwrCache::new(
            config.cache_max_entries,
            config.cache_max_memory_bytes,
            Duration::from_secs(config.result_ttl_secs),
        );

        let service = Arc::new(RecommendationService::new(
            aggregator,
            Arc::new(SimilarityScorer::default()),
            client,
            results_cache,
            details_cache,
            Duration::from_millis(config.fast_path_timeout_ms),
        ));

        Self { service }
    }

    /// Spawns the periodic cache sweeper. Called once at startup.
    pub fn start_background_tasks(&self, config: &Config) {
        self.service
            .start_cleanup_task(Duration::from_secs(config.cache_cleanup_interval_secs));
    }
}

//! Recommendation facade.
//!
//! Orchestrates the pipeline: aggregate -> dedup -> enrich -> score ->
//! threshold -> diversity -> rank. Results are cached with
//! stale-while-revalidate semantics; per-request knobs (limit, minimum
//! score, cultural context) are applied after the cache so callers with
//! different options share one pipeline run.
//!
//! The facade never surfaces upstream trouble: total failure is an empty
//! list. The only error a caller can see is invalid input.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::cache::{CacheKey, CacheStats, SwrCache};
use crate::error::{AppError, AppResult};
use crate::fetch::catalog::CatalogClient;
use crate::models::{CandidateItem, ContentType, CulturalContext};
use crate::services::aggregator::CandidateAggregator;
use crate::services::diversity::DiversityPostProcessor;
use crate::services::similarity::SimilarityScorer;

/// Below this many results the score threshold relaxes to backfill
const MIN_RESULT_COUNT: usize = 8;
/// Relaxed threshold is `min_score` times this factor
const RELAXED_THRESHOLD_FACTOR: f64 = 0.5;

/// Per-request options for [`RecommendationService::get_similar_content`]
#[derive(Debug, Clone)]
pub struct SimilarOptions {
    pub limit: usize,
    pub min_score: f64,
    pub force_refresh: bool,
    pub page: u32,
    /// Shallow low-latency pass that warms the cache in the background
    pub fast: bool,
    pub context: CulturalContext,
    pub token: CancellationToken,
}

impl Default for SimilarOptions {
    fn default() -> Self {
        Self {
            limit: 20,
            min_score: 0.3,
            force_refresh: false,
            page: 1,
            fast: false,
            context: CulturalContext::default(),
            token: CancellationToken::new(),
        }
    }
}

/// Aggregate statistics across the service's caches
#[derive(Debug, Clone, serde::Serialize)]
pub struct ServiceStats {
    pub results: CacheStats,
    pub details: CacheStats,
}

pub struct RecommendationService {
    aggregator: Arc<CandidateAggregator>,
    scorer: Arc<SimilarityScorer>,
    diversity: DiversityPostProcessor,
    client: Arc<CatalogClient>,
    results_cache: SwrCache<Vec<CandidateItem>>,
    details_cache: SwrCache<CandidateItem>,
    fast_time_box: Duration,
}

impl RecommendationService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        aggregator: Arc<CandidateAggregator>,
        scorer: Arc<SimilarityScorer>,
        client: Arc<CatalogClient>,
        results_cache: SwrCache<Vec<CandidateItem>>,
        details_cache: SwrCache<CandidateItem>,
        fast_time_box: Duration,
    ) -> Self {
        Self {
            aggregator,
            scorer,
            diversity: DiversityPostProcessor::default(),
            client,
            results_cache,
            details_cache,
            fast_time_box,
        }
    }

    /// Returns items similar to the reference, sorted by descending
    /// similarity score, at most `limit` long. Invalid input is the only
    /// error; any upstream failure degrades to an empty list.
    pub async fn get_similar_content(
        &self,
        content_id: u64,
        content_type: ContentType,
        options: SimilarOptions,
    ) -> AppResult<Vec<CandidateItem>> {
        if content_id == 0 {
            return Err(AppError::InvalidInput(
                "content id must be non-zero".to_string(),
            ));
        }

        let key = CacheKey::SimilarResults {
            content_type,
            id: content_id,
            page: options.page,
        }
        .to_string();

        if options.fast {
            return Ok(self.fast_path(content_id, content_type, &key, &options).await);
        }

        let ranked = if options.force_refresh {
            let fresh = self
                .run_pipeline(
                    content_id,
                    content_type,
                    options.page,
                    options.context.clone(),
                    options.token.clone(),
                )
                .await;
            if let Some(ref items) = fresh {
                self.results_cache.set(&key, items.clone());
            }
            fresh
        } else {
            let service = self.clone_for_task();
            let page = options.page;
            let context = options.context.clone();
            let token = options.token.clone();
            self.results_cache
                .get_or_revalidate(&key, move || async move {
                    service
                        .run_pipeline(content_id, content_type, page, context, token)
                        .await
                })
                .await
        };

        Ok(self.finalize(ranked.unwrap_or_default(), &options))
    }

    /// Shallow pass: candidates scored from rating and popularity alone,
    /// returned immediately, while a detached full pass warms the cache for
    /// subsequent readers. The delivered response is never updated in place.
    async fn fast_path(
        &self,
        content_id: u64,
        content_type: ContentType,
        key: &str,
        options: &SimilarOptions,
    ) -> Vec<CandidateItem> {
        if !options.force_refresh {
            if let Some(cached) = self.results_cache.get(key) {
                return self.finalize(cached, options);
            }
        }

        let mut shallow = self
            .aggregator
            .aggregate(
                content_id,
                content_type,
                options.page,
                Some(self.fast_time_box),
                &options.token,
            )
            .await;

        for item in shallow.iter_mut() {
            item.similarity_score = Some(self.scorer.quick_score(item));
        }
        shallow.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        self.spawn_cache_warm(
            content_id,
            content_type,
            options.page,
            options.context.clone(),
            key.to_string(),
        );

        self.finalize(shallow, options)
    }

    /// Detached background full pass. Runs under its own cancellation scope
    /// so it outlives the originating request; failures are logged only.
    fn spawn_cache_warm(
        &self,
        content_id: u64,
        content_type: ContentType,
        page: u32,
        context: CulturalContext,
        key: String,
    ) {
        let service = self.clone_for_task();
        tokio::spawn(async move {
            let token = CancellationToken::new();
            match service
                .run_pipeline(content_id, content_type, page, context, token)
                .await
            {
                Some(items) => {
                    service.results_cache.set(&key, items);
                    tracing::debug!(key = %key, "Cache warmed by background pass");
                }
                None => {
                    tracing::warn!(key = %key, "Background cache warm produced nothing");
                }
            }
        });
    }

    /// The full pipeline: reference details, fan-out, dedup, enrichment,
    /// scoring, sort. Returns `None` on total failure so nothing is cached.
    async fn run_pipeline(
        &self,
        content_id: u64,
        content_type: ContentType,
        page: u32,
        context: CulturalContext,
        token: CancellationToken,
    ) -> Option<Vec<CandidateItem>> {
        let reference = self.fetch_reference(content_id, content_type, &token).await?;

        let candidates = self
            .aggregator
            .aggregate(content_id, content_type, page, None, &token)
            .await;
        if candidates.is_empty() {
            return None;
        }

        let enriched = self.aggregator.enrich(candidates, &token).await;

        let mut scored: Vec<CandidateItem> = enriched
            .into_iter()
            .map(|mut item| {
                let score = self.scorer.score(&reference, &item, &context);
                item.similarity_score = Some(score);
                item
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::info!(
            reference_id = content_id,
            content_type = %content_type,
            candidates = scored.len(),
            "Similar-content pipeline completed"
        );
        Some(scored)
    }

    /// Fetches and enriches the reference item, via the details cache
    async fn fetch_reference(
        &self,
        content_id: u64,
        content_type: ContentType,
        token: &CancellationToken,
    ) -> Option<CandidateItem> {
        let key = CacheKey::Details {
            content_type,
            id: content_id,
        }
        .to_string();

        if let Some(cached) = self.details_cache.get(&key) {
            return Some(cached);
        }

        match self.client.details(content_type, content_id, token).await {
            Ok(details) => {
                let mut item = CandidateItem::shallow(
                    content_id,
                    details.display_title().to_string(),
                    content_type,
                );
                details.enrich(&mut item);
                self.details_cache.set(&key, item.clone());
                Some(item)
            }
            Err(err) => {
                if !err.is_cancelled() {
                    tracing::warn!(content_id, error = %err, "Reference item unavailable");
                }
                None
            }
        }
    }

    /// Per-request post-processing of a ranked list: score threshold with
    /// backfill relaxation, diversity boosts, limit.
    fn finalize(&self, ranked: Vec<CandidateItem>, options: &SimilarOptions) -> Vec<CandidateItem> {
        let mut kept: Vec<CandidateItem> = ranked
            .iter()
            .filter(|item| item.score() >= options.min_score)
            .cloned()
            .collect();

        if kept.len() < MIN_RESULT_COUNT {
            let relaxed = options.min_score * RELAXED_THRESHOLD_FACTOR;
            for item in &ranked {
                if kept.len() >= MIN_RESULT_COUNT {
                    break;
                }
                if item.score() < options.min_score && item.score() >= relaxed {
                    kept.push(item.clone());
                }
            }
        }

        self.diversity.apply(&mut kept, &options.context);
        kept.truncate(options.limit);
        kept
    }

    fn clone_for_task(&self) -> Self {
        Self {
            aggregator: Arc::clone(&self.aggregator),
            scorer: Arc::clone(&self.scorer),
            diversity: DiversityPostProcessor::default(),
            client: Arc::clone(&self.client),
            results_cache: self.results_cache.clone(),
            details_cache: self.details_cache.clone(),
            fast_time_box: self.fast_time_box,
        }
    }

    // Operational surface, off the hot path

    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            results: self.results_cache.stats(),
            details: self.details_cache.stats(),
        }
    }

    /// Removes one cached entry by key. Returns whether anything was
    /// removed.
    pub fn clear_cache(&self, key: &str) -> bool {
        self.results_cache.delete(key) | self.details_cache.delete(key)
    }

    pub fn clear_all(&self) {
        self.results_cache.clear();
        self.details_cache.clear();
    }

    /// Spawns the periodic expired-entry sweeper
    pub fn start_cleanup_task(&self, interval: Duration) {
        let results = self.results_cache.clone();
        let details = self.details_cache.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = results.cleanup() + details.cleanup();
                if removed > 0 {
                    tracing::debug!(removed, "Periodic cache cleanup");
                }
            }
        });
    }
}

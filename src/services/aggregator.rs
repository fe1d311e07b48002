//! Candidate aggregation: multi-source fan-out and detail enrichment.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::cache::{CacheKey, SwrCache};
use crate::fetch::catalog::CatalogClient;
use crate::fetch::sources::SourceAdapter;
use crate::models::{CandidateItem, ContentType};
use crate::services::dedup::Deduplicator;

/// Fans out to the registered source adapters, merges and deduplicates, and
/// enriches candidates with detail metadata through a bounded worker pool.
pub struct CandidateAggregator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    client: Arc<CatalogClient>,
    details_cache: SwrCache<CandidateItem>,
    dedup: Deduplicator,
    enrich_workers: usize,
}

impl CandidateAggregator {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        client: Arc<CatalogClient>,
        details_cache: SwrCache<CandidateItem>,
        enrich_workers: usize,
    ) -> Self {
        Self {
            adapters,
            client,
            details_cache,
            dedup: Deduplicator::default(),
            enrich_workers: enrich_workers.max(1),
        }
    }

    /// Concurrent fan-out across all adapters. `time_box` bounds each
    /// adapter call individually (fast path); `None` leaves each call to
    /// its own internal timeout and retry budget (full pass). A slow or
    /// failing source contributes an empty list, never an error.
    pub async fn aggregate(
        &self,
        reference_id: u64,
        content_type: ContentType,
        page: u32,
        time_box: Option<Duration>,
        token: &CancellationToken,
    ) -> Vec<CandidateItem> {
        if token.is_cancelled() {
            return Vec::new();
        }

        let fetches = self.adapters.iter().map(|adapter| {
            let adapter = Arc::clone(adapter);
            let token = token.clone();
            async move {
                let fetch = adapter.fetch(reference_id, content_type, page, &token);
                match time_box {
                    Some(limit) => match tokio::time::timeout(limit, fetch).await {
                        Ok(items) => items,
                        Err(_) => {
                            tracing::debug!(source = adapter.name(), "Source timed out, skipping");
                            Vec::new()
                        }
                    },
                    None => fetch.await,
                }
            }
        });

        let results = join_all(fetches).await;
        let merged: Vec<CandidateItem> = results
            .into_iter()
            .flatten()
            .filter(|item| item.id != reference_id)
            .collect();

        let total = merged.len();
        let deduped = self.dedup.dedupe(merged);
        tracing::debug!(
            reference_id,
            sources = self.adapters.len(),
            fetched = total,
            unique = deduped.len(),
            "Aggregation completed"
        );
        deduped
    }

    /// Enriches candidates with detail metadata using a fixed worker pool.
    ///
    /// Workers pull the next unprocessed candidate from a shared queue;
    /// completion order is not preserved — ranking is re-established by the
    /// scorer. An enrichment failure keeps the shallow item.
    pub async fn enrich(
        &self,
        items: Vec<CandidateItem>,
        token: &CancellationToken,
    ) -> Vec<CandidateItem> {
        if items.is_empty() || token.is_cancelled() {
            return items;
        }

        let queue: Arc<Mutex<VecDeque<CandidateItem>>> =
            Arc::new(Mutex::new(items.into_iter().collect()));

        let workers = (0..self.enrich_workers).map(|_| {
            let queue = Arc::clone(&queue);
            let client = Arc::clone(&self.client);
            let cache = self.details_cache.clone();
            let token = token.clone();
            async move {
                let mut done = Vec::new();
                loop {
                    let next = queue.lock().pop_front();
                    let Some(item) = next else { break };

                    if token.is_cancelled() {
                        done.push(item);
                        continue;
                    }
                    done.push(enrich_one(&client, &cache, item, &token).await);
                }
                done
            }
        });

        join_all(workers).await.into_iter().flatten().collect()
    }
}

async fn enrich_one(
    client: &CatalogClient,
    cache: &SwrCache<CandidateItem>,
    mut item: CandidateItem,
    token: &CancellationToken,
) -> CandidateItem {
    let key = CacheKey::Details {
        content_type: item.content_type,
        id: item.id,
    }
    .to_string();

    if let Some(cached) = cache.get(&key) {
        return cached;
    }

    match client.details(item.content_type, item.id, token).await {
        Ok(details) => {
            details.enrich(&mut item);
            cache.set(&key, item.clone());
            item
        }
        Err(err) => {
            if !err.is_cancelled() {
                tracing::debug!(id = item.id, error = %err, "Detail enrichment failed, keeping shallow item");
            }
            item
        }
    }
}

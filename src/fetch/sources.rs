//! Source adapters for the upstream catalog.
//!
//! Each adapter queries one list endpoint and is deliberately infallible at
//! its boundary: failures are logged and converted to an empty list so a
//! single bad source never poisons the aggregate. Sources are added or
//! removed by changing the registered set in
//! [`default_adapters`](default_adapters), not by branching on type.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::fetch::catalog::CatalogClient;
use crate::models::{CandidateItem, ContentType};

/// One upstream content source
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Source name for logging and diagnostics
    fn name(&self) -> &'static str;

    /// Fetches one page of shallow candidates. Never fails: upstream errors
    /// are absorbed into an empty list, and a cancelled token returns empty
    /// without logging noise.
    async fn fetch(
        &self,
        reference_id: u64,
        content_type: ContentType,
        page: u32,
        token: &CancellationToken,
    ) -> Vec<CandidateItem>;
}

/// Shared fetch-and-absorb helper used by every adapter
async fn fetch_list(
    client: &CatalogClient,
    source: &'static str,
    path: &str,
    query: &[(String, String)],
    content_type: ContentType,
    token: &CancellationToken,
) -> Vec<CandidateItem> {
    if token.is_cancelled() {
        return Vec::new();
    }

    match client.list(path, query, token).await {
        Ok(page) => {
            let items: Vec<CandidateItem> = page
                .results
                .into_iter()
                .map(|row| row.into_candidate(content_type))
                .collect();
            tracing::debug!(source, count = items.len(), "Source fetch completed");
            items
        }
        Err(err) if err.is_cancelled() => Vec::new(),
        Err(FetchError::Status(404)) => {
            tracing::debug!(source, "Source has no data for reference");
            Vec::new()
        }
        Err(FetchError::Status(429)) => {
            tracing::warn!(source, "Source rate-limited, skipping this pass");
            Vec::new()
        }
        Err(err) => {
            tracing::warn!(source, error = %err, "Source fetch failed");
            Vec::new()
        }
    }
}

fn page_query(page: u32) -> Vec<(String, String)> {
    vec![("page".to_string(), page.to_string())]
}

pub struct RecommendationsAdapter {
    client: Arc<CatalogClient>,
}

impl RecommendationsAdapter {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for RecommendationsAdapter {
    fn name(&self) -> &'static str {
        "recommendations"
    }

    async fn fetch(
        &self,
        reference_id: u64,
        content_type: ContentType,
        page: u32,
        token: &CancellationToken,
    ) -> Vec<CandidateItem> {
        let path = format!(
            "/{}/{}/recommendations",
            content_type.as_path(),
            reference_id
        );
        fetch_list(
            &self.client,
            self.name(),
            &path,
            &page_query(page),
            content_type,
            token,
        )
        .await
    }
}

pub struct SimilarAdapter {
    client: Arc<CatalogClient>,
}

impl SimilarAdapter {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for SimilarAdapter {
    fn name(&self) -> &'static str {
        "similar"
    }

    async fn fetch(
        &self,
        reference_id: u64,
        content_type: ContentType,
        page: u32,
        token: &CancellationToken,
    ) -> Vec<CandidateItem> {
        let path = format!("/{}/{}/similar", content_type.as_path(), reference_id);
        fetch_list(
            &self.client,
            self.name(),
            &path,
            &page_query(page),
            content_type,
            token,
        )
        .await
    }
}

/// Discovers candidates sharing the reference item's genres. Resolves the
/// reference's genre set through the (coalesced, cached) details call first.
pub struct GenreDiscoverAdapter {
    client: Arc<CatalogClient>,
}

impl GenreDiscoverAdapter {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for GenreDiscoverAdapter {
    fn name(&self) -> &'static str {
        "genre_discover"
    }

    async fn fetch(
        &self,
        reference_id: u64,
        content_type: ContentType,
        page: u32,
        token: &CancellationToken,
    ) -> Vec<CandidateItem> {
        if token.is_cancelled() {
            return Vec::new();
        }

        let genres = match self.client.details(content_type, reference_id, token).await {
            Ok(details) => details
                .genres
                .iter()
                .map(|g| g.id.to_string())
                .collect::<Vec<_>>(),
            Err(err) => {
                if !err.is_cancelled() {
                    tracing::warn!(source = self.name(), error = %err, "Reference details unavailable");
                }
                return Vec::new();
            }
        };
        if genres.is_empty() {
            return Vec::new();
        }

        let path = format!("/discover/{}", content_type.as_path());
        let mut query = page_query(page);
        query.push(("with_genres".to_string(), genres.join(",")));
        query.push(("sort_by".to_string(), "popularity.desc".to_string()));
        fetch_list(&self.client, self.name(), &path, &query, content_type, token).await
    }
}

pub struct TrendingAdapter {
    client: Arc<CatalogClient>,
}

impl TrendingAdapter {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for TrendingAdapter {
    fn name(&self) -> &'static str {
        "trending"
    }

    async fn fetch(
        &self,
        _reference_id: u64,
        content_type: ContentType,
        page: u32,
        token: &CancellationToken,
    ) -> Vec<CandidateItem> {
        let path = format!("/trending/{}/week", content_type.as_path());
        fetch_list(
            &self.client,
            self.name(),
            &path,
            &page_query(page),
            content_type,
            token,
        )
        .await
    }
}

pub struct PopularAdapter {
    client: Arc<CatalogClient>,
}

impl PopularAdapter {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for PopularAdapter {
    fn name(&self) -> &'static str {
        "popular"
    }

    async fn fetch(
        &self,
        _reference_id: u64,
        content_type: ContentType,
        page: u32,
        token: &CancellationToken,
    ) -> Vec<CandidateItem> {
        let path = format!("/{}/popular", content_type.as_path());
        fetch_list(
            &self.client,
            self.name(),
            &path,
            &page_query(page),
            content_type,
            token,
        )
        .await
    }
}

pub struct TopRatedAdapter {
    client: Arc<CatalogClient>,
}

impl TopRatedAdapter {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for TopRatedAdapter {
    fn name(&self) -> &'static str {
        "top_rated"
    }

    async fn fetch(
        &self,
        _reference_id: u64,
        content_type: ContentType,
        page: u32,
        token: &CancellationToken,
    ) -> Vec<CandidateItem> {
        let path = format!("/{}/top_rated", content_type.as_path());
        fetch_list(
            &self.client,
            self.name(),
            &path,
            &page_query(page),
            content_type,
            token,
        )
        .await
    }
}

/// Upcoming releases. The catalog names this `on_the_air` for TV.
pub struct UpcomingAdapter {
    client: Arc<CatalogClient>,
}

impl UpcomingAdapter {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for UpcomingAdapter {
    fn name(&self) -> &'static str {
        "upcoming"
    }

    async fn fetch(
        &self,
        _reference_id: u64,
        content_type: ContentType,
        page: u32,
        token: &CancellationToken,
    ) -> Vec<CandidateItem> {
        let path = match content_type {
            ContentType::Movie => "/movie/upcoming".to_string(),
            ContentType::Tv => "/tv/on_the_air".to_string(),
        };
        fetch_list(
            &self.client,
            self.name(),
            &path,
            &page_query(page),
            content_type,
            token,
        )
        .await
    }
}

/// Currently-playing releases. The catalog names this `airing_today` for TV.
pub struct NowPlayingAdapter {
    client: Arc<CatalogClient>,
}

impl NowPlayingAdapter {
    pub fn new(client: Arc<CatalogClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceAdapter for NowPlayingAdapter {
    fn name(&self) -> &'static str {
        "now_playing"
    }

    async fn fetch(
        &self,
        _reference_id: u64,
        content_type: ContentType,
        page: u32,
        token: &CancellationToken,
    ) -> Vec<CandidateItem> {
        let path = match content_type {
            ContentType::Movie => "/movie/now_playing".to_string(),
            ContentType::Tv => "/tv/airing_today".to_string(),
        };
        fetch_list(
            &self.client,
            self.name(),
            &path,
            &page_query(page),
            content_type,
            token,
        )
        .await
    }
}

/// The full registered source set
pub fn default_adapters(client: Arc<CatalogClient>) -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(RecommendationsAdapter::new(Arc::clone(&client))),
        Arc::new(SimilarAdapter::new(Arc::clone(&client))),
        Arc::new(GenreDiscoverAdapter::new(Arc::clone(&client))),
        Arc::new(TrendingAdapter::new(Arc::clone(&client))),
        Arc::new(PopularAdapter::new(Arc::clone(&client))),
        Arc::new(TopRatedAdapter::new(Arc::clone(&client))),
        Arc::new(UpcomingAdapter::new(Arc::clone(&client))),
        Arc::new(NowPlayingAdapter::new(client)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::rate_limiter::RateLimiter;
    use crate::fetch::retry::RetryPolicy;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String) -> Arc<CatalogClient> {
        Arc::new(CatalogClient::new(
            base_url,
            "test_key".to_string(),
            Arc::new(RateLimiter::new(100, Duration::from_secs(10))),
            RetryPolicy {
                max_retries: 2,
                base_delay: Duration::from_millis(5),
                max_delay: Duration::from_millis(10),
                multiplier: 2.0,
            },
            Duration::from_secs(2),
        ))
    }

    #[tokio::test]
    async fn test_adapter_returns_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603/similar"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "page": 1,
                "results": [
                    {"id": 604, "title": "The Matrix Reloaded", "genre_ids": [28]},
                    {"id": 605, "title": "The Matrix Revolutions", "genre_ids": [28]}
                ]
            })))
            .mount(&server)
            .await;

        let adapter = SimilarAdapter::new(test_client(server.uri()));
        let token = CancellationToken::new();
        let items = adapter.fetch(603, ContentType::Movie, 1, &token).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "The Matrix Reloaded");
    }

    #[tokio::test]
    async fn test_adapter_absorbs_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/999/recommendations"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = RecommendationsAdapter::new(test_client(server.uri()));
        let token = CancellationToken::new();
        let items = adapter.fetch(999, ContentType::Movie, 1, &token).await;

        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_adapter_absorbs_server_errors_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/popular"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let adapter = PopularAdapter::new(test_client(server.uri()));
        let token = CancellationToken::new();
        let items = adapter.fetch(1, ContentType::Movie, 1, &token).await;

        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let adapter = TrendingAdapter::new(test_client(server.uri()));
        let token = CancellationToken::new();
        token.cancel();

        let items = adapter.fetch(1, ContentType::Movie, 1, &token).await;
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_genre_discover_uses_reference_genres() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 603,
                "title": "The Matrix",
                "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(wiremock::matchers::query_param("with_genres", "28,878"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "page": 1,
                "results": [{"id": 155, "title": "The Dark Knight", "genre_ids": [28]}]
            })))
            .mount(&server)
            .await;

        let adapter = GenreDiscoverAdapter::new(test_client(server.uri()));
        let token = CancellationToken::new();
        let items = adapter.fetch(603, ContentType::Movie, 1, &token).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 155);
    }

    #[test]
    fn test_default_adapter_set_is_complete() {
        let client = Arc::new(CatalogClient::new(
            "http://localhost".to_string(),
            "k".to_string(),
            Arc::new(RateLimiter::new(1, Duration::from_secs(1))),
            RetryPolicy::default(),
            Duration::from_secs(1),
        ));
        let adapters = default_adapters(client);
        let names: Vec<&str> = adapters.iter().map(|a| a.name()).collect();
        assert_eq!(
            names,
            vec![
                "recommendations",
                "similar",
                "genre_discover",
                "trending",
                "popular",
                "top_rated",
                "upcoming",
                "now_playing"
            ]
        );
    }
}

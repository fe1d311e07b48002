//! HTTP client for the upstream catalog API.
//!
//! Every call goes through the same funnel: rate-limiter admission, then a
//! coalesced, deadline-bounded request, wrapped in classified retry. The
//! coalescing key is the full request URL plus the attempt number, so
//! identical concurrent fetches share one network call while separate retry
//! attempts stay distinct flights.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client as HttpClient;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::fetch::coalescer::RequestCoalescer;
use crate::fetch::rate_limiter::RateLimiter;
use crate::fetch::retry::{with_retries, RetryPolicy};
use crate::models::{CatalogDetails, CatalogListPage, ContentType};

#[derive(Clone)]
pub struct CatalogClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
    rate_limiter: Arc<RateLimiter>,
    coalescer: Arc<RequestCoalescer<serde_json::Value>>,
    retry: RetryPolicy,
    timeout: Duration,
}

impl CatalogClient {
    pub fn new(
        base_url: String,
        api_key: String,
        rate_limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            http: HttpClient::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter,
            coalescer: Arc::new(RequestCoalescer::new()),
            retry,
            timeout,
        }
    }

    /// Fetches one page from a list endpoint
    pub async fn list(
        &self,
        path: &str,
        query: &[(String, String)],
        token: &CancellationToken,
    ) -> Result<CatalogListPage, FetchError> {
        let value = self.get_json(path, query, token).await?;
        serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Fetches the enrichment detail payload for one item
    pub async fn details(
        &self,
        content_type: ContentType,
        id: u64,
        token: &CancellationToken,
    ) -> Result<CatalogDetails, FetchError> {
        let path = format!("/{}/{}", content_type.as_path(), id);
        let query = vec![(
            "append_to_response".to_string(),
            "credits".to_string(),
        )];
        let value = self.get_json(&path, &query, token).await?;
        serde_json::from_value(value).map_err(|e| FetchError::Decode(e.to_string()))
    }

    /// Rate-limited, coalesced, retried GET returning raw JSON
    pub async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
        token: &CancellationToken,
    ) -> Result<serde_json::Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let mut params: Vec<(String, String)> =
            vec![("api_key".to_string(), self.api_key.clone())];
        params.extend_from_slice(query);

        let identity = {
            let qs: Vec<String> = query.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            format!("{}?{}", url, qs.join("&"))
        };

        with_retries(&self.retry, token, |attempt| {
            let key = format!("{}#attempt{}", identity, attempt);
            let http = self.http.clone();
            let limiter = Arc::clone(&self.rate_limiter);
            let url = url.clone();
            let params = params.clone();
            let timeout = self.timeout;
            let token = token.clone();
            let coalescer = Arc::clone(&self.coalescer);
            async move {
                coalescer
                    .dedupe(&key, move || {
                        request_once(http, limiter, url, params, timeout, token)
                    })
                    .await
            }
        })
        .await
    }
}

/// One admission-controlled HTTP attempt with a hard deadline
async fn request_once(
    http: HttpClient,
    limiter: Arc<RateLimiter>,
    url: String,
    params: Vec<(String, String)>,
    timeout: Duration,
    token: CancellationToken,
) -> Result<serde_json::Value, FetchError> {
    limiter.acquire(&token).await?;

    let send = async {
        let response = http
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(url = %url, status = %status, body = %body, "Catalog request failed");
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    };

    tokio::select! {
        result = tokio::time::timeout(timeout, send) => match result {
            Ok(inner) => inner,
            Err(_) => Err(FetchError::Timeout),
        },
        _ = token.cancelled() => Err(FetchError::Cancelled),
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}

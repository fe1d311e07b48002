//! Request coalescing: at most one in-flight upstream call per key.
//!
//! Concurrent callers for the same key await one shared future instead of
//! issuing duplicate network calls. Keys are fully-qualified request
//! identity — `{url}#attempt{n}` — so distinct retry attempts never
//! coalesce with each other.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use parking_lot::Mutex;

use crate::error::FetchError;

type PendingFuture<T> = Shared<BoxFuture<'static, Result<T, FetchError>>>;

/// Pending-request registry keyed by request identity
pub struct RequestCoalescer<T: Clone> {
    pending: Arc<Mutex<HashMap<String, PendingFuture<T>>>>,
}

impl<T> Default for RequestCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RequestCoalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the in-flight future for `key` if one exists, otherwise
    /// registers `factory()`'s future under `key`. The registry entry is
    /// removed when the call settles — success or error — so completed
    /// entries never leak and every waiter still holding the shared handle
    /// gets the settled result.
    pub async fn dedupe<F, Fut>(&self, key: &str, factory: F) -> Result<T, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let shared = {
            let mut pending = self.pending.lock();
            if let Some(existing) = pending.get(key) {
                existing.clone()
            } else {
                let registry = Arc::clone(&self.pending);
                let owned_key = key.to_string();
                let fut = factory();
                let wrapped: BoxFuture<'static, Result<T, FetchError>> = async move {
                    let result = fut.await;
                    registry.lock().remove(&owned_key);
                    result
                }
                .boxed();
                let shared = wrapped.shared();
                pending.insert(key.to_string(), shared.clone());
                shared
            }
        };

        shared.await
    }

    /// Number of in-flight entries, for tests and diagnostics
    pub fn in_flight(&self) -> usize {
        self.pending.lock().len()
    }
}

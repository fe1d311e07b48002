use std::fmt::Display;

use crate::models::ContentType;

/// Typed builder for cache keys so key formats live in one place
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Ranked similar-content results for one reference item and page
    SimilarResults {
        content_type: ContentType,
        id: u64,
        page: u32,
    },
    /// Enriched detail payload for one item
    Details { content_type: ContentType, id: u64 },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::SimilarResults {
                content_type,
                id,
                page,
            } => write!(f, "similar:{}:{}:p{}", content_type, id, page),
            CacheKey::Details { content_type, id } => {
                write!(f, "details:{}:{}", content_type, id)
            }
        }
    }
}

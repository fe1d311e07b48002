use serde::{Deserialize, Serialize};

/// Per-request cultural context supplied by the user-profile collaborator.
///
/// Ephemeral: never persisted by this service. When absent (or when the
/// profile service is unavailable) the scorer falls back to its base weight
/// table with no preference boosts.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CulturalContext {
    pub preferred_language: Option<String>,
    pub region: Option<String>,
}

impl CulturalContext {
    pub fn new(preferred_language: Option<String>, region: Option<String>) -> Self {
        Self {
            preferred_language: preferred_language.map(|l| l.to_lowercase()),
            region: region.map(|r| r.to_uppercase()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.preferred_language.is_none() && self.region.is_none()
    }
}

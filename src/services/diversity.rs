//! Diversity post-processing.
//!
//! A score-sorted list tends toward monoculture: one franchise, one genre,
//! one production region. A single left-to-right pass gives the first
//! candidate that introduces a not-yet-seen genre, region, or language a
//! multiplicative score boost, then re-sorts. This is deliberately not a
//! global optimization; ties break on pre-boost rank.

use std::collections::HashSet;

use crate::models::{CandidateItem, CulturalContext};

pub struct DiversityPostProcessor {
    /// Boost for introducing an unseen attribute value
    first_seen_boost: f64,
    /// Larger boost when the introduced value matches the viewer's
    /// preference
    preferred_boost: f64,
}

impl Default for DiversityPostProcessor {
    fn default() -> Self {
        Self {
            first_seen_boost: 1.08,
            preferred_boost: 1.15,
        }
    }
}

impl DiversityPostProcessor {
    pub fn new(first_seen_boost: f64, preferred_boost: f64) -> Self {
        Self {
            first_seen_boost,
            preferred_boost,
        }
    }

    /// Applies first-seen boosts in rank order and re-sorts by boosted
    /// score. Scores stay clamped to [0, 1].
    pub fn apply(&self, items: &mut [CandidateItem], context: &CulturalContext) {
        let mut seen_genres: HashSet<u64> = HashSet::new();
        let mut seen_regions: HashSet<String> = HashSet::new();
        let mut seen_languages: HashSet<String> = HashSet::new();

        let preferred_language = context.preferred_language.as_deref();
        let preferred_region = context.region.as_deref();

        let mut ranked: Vec<(usize, f64)> = Vec::with_capacity(items.len());

        for (rank, item) in items.iter().enumerate() {
            let mut boost = 1.0;

            let introduces_genre = item.genres.iter().any(|g| !seen_genres.contains(g));
            if introduces_genre {
                boost *= self.first_seen_boost;
            }
            seen_genres.extend(item.genres.iter().copied());

            if let Some(region) = item.production_countries.first() {
                if !seen_regions.contains(region) {
                    boost *= if Some(region.as_str()) == preferred_region {
                        self.preferred_boost
                    } else {
                        self.first_seen_boost
                    };
                }
                seen_regions.extend(item.production_countries.iter().cloned());
            }

            if let Some(language) = item.original_language.as_deref() {
                if !seen_languages.contains(language) {
                    boost *= if Some(language) == preferred_language {
                        self.preferred_boost
                    } else {
                        self.first_seen_boost
                    };
                }
                seen_languages.insert(language.to_string());
            }

            ranked.push((rank, (item.score() * boost).clamp(0.0, 1.0)));
        }

        for (rank, boosted) in &ranked {
            items[*rank].similarity_score = Some(*boosted);
        }

        // Stable sort: pre-boost rank breaks ties
        items.sort_by(|a, b| {
            b.score()
                .partial_cmp(&a.score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

//! Candidate deduplication.
//!
//! Multiple sources regularly return the same content under the same id, and
//! occasionally the same content under different ids with near-identical
//! titles. Collisions keep the higher-scoring instance; items without a
//! collision are never dropped. Order among survivors is not part of the
//! contract — ranking is re-established downstream.

use strsim::normalized_levenshtein;

use crate::models::CandidateItem;

/// How aggressively to collapse duplicates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DedupStrategy {
    /// Exact id collision only
    Id,
    /// Normalized-title collision only (handles cross-source id mismatches)
    Title,
    /// Id or title collision
    Strict,
    /// Id, title, or fuzzy-title collision above the threshold
    Smart,
}

pub struct Deduplicator {
    strategy: DedupStrategy,
    /// Normalized Levenshtein ratio above which two titles are the same
    /// content under `Smart`
    fuzzy_threshold: f64,
    keep_best_score: bool,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DedupStrategy::Smart)
    }
}

fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

impl Deduplicator {
    pub fn new(strategy: DedupStrategy) -> Self {
        Self {
            strategy,
            fuzzy_threshold: 0.9,
            keep_best_score: true,
        }
    }

    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    /// When disabled, the first-seen instance survives a collision instead
    /// of the higher-scoring one
    pub fn with_keep_best_score(mut self, keep: bool) -> Self {
        self.keep_best_score = keep;
        self
    }

    fn collides(&self, a: &CandidateItem, b: &CandidateItem) -> bool {
        let id_match = a.id == b.id;
        let title_match =
            || normalize_title(&a.title) == normalize_title(&b.title);

        match self.strategy {
            DedupStrategy::Id => id_match,
            DedupStrategy::Title => title_match(),
            DedupStrategy::Strict => id_match || title_match(),
            DedupStrategy::Smart => {
                id_match || title_match() || {
                    let ratio = normalized_levenshtein(
                        &normalize_title(&a.title),
                        &normalize_title(&b.title),
                    );
                    ratio >= self.fuzzy_threshold
                }
            }
        }
    }

    /// Collapses duplicates, keeping the higher-scoring instance of each
    /// collision group
    pub fn dedupe(&self, items: Vec<CandidateItem>) -> Vec<CandidateItem> {
        let mut kept: Vec<CandidateItem> = Vec::with_capacity(items.len());

        'outer: for item in items {
            for existing in kept.iter_mut() {
                if self.collides(existing, &item) {
                    if self.keep_best_score && item.score() > existing.score() {
                        *existing = item;
                    }
                    continue 'outer;
                }
            }
            kept.push(item);
        }

        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;

    fn item(id: u64, title: &str, score: Option<f64>) -> CandidateItem {
        let mut it = CandidateItem::shallow(id, title.to_string(), ContentType::Movie);
        it.similarity_score = score;
        it
    }

    #[test]
    fn test_id_collision_keeps_best_score() {
        let dedup = Deduplicator::new(DedupStrategy::Id);
        let out = dedup.dedupe(vec![
            item(1, "Alpha", Some(0.4)),
            item(1, "Alpha (4K)", Some(0.9)),
            item(2, "Beta", Some(0.5)),
        ]);

        assert_eq!(out.len(), 2);
        let survivor = out.iter().find(|i| i.id == 1).unwrap();
        assert_eq!(survivor.similarity_score, Some(0.9));
    }

    #[test]
    fn test_first_seen_wins_when_keep_best_disabled() {
        let dedup = Deduplicator::new(DedupStrategy::Id).with_keep_best_score(false);
        let out = dedup.dedupe(vec![item(1, "Alpha", Some(0.4)), item(1, "Alpha", Some(0.9))]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].similarity_score, Some(0.4));
    }

    #[test]
    fn test_unscored_items_count_as_zero() {
        let dedup = Deduplicator::new(DedupStrategy::Id);
        let out = dedup.dedupe(vec![item(1, "Alpha", None), item(1, "Alpha", Some(0.1))]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].similarity_score, Some(0.1));
    }

    #[test]
    fn test_title_collision_across_sources() {
        // Same content, different ids from different sources
        let dedup = Deduplicator::new(DedupStrategy::Title);
        let out = dedup.dedupe(vec![
            item(10, "  The Matrix ", Some(0.8)),
            item(20, "the matrix", Some(0.3)),
        ]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, 10);
    }

    #[test]
    fn test_title_strategy_ignores_id_collision() {
        let dedup = Deduplicator::new(DedupStrategy::Title);
        let out = dedup.dedupe(vec![item(1, "Alpha", None), item(1, "Beta", None)]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_strict_collapses_either_collision() {
        let dedup = Deduplicator::new(DedupStrategy::Strict);
        let out = dedup.dedupe(vec![
            item(1, "Alpha", Some(0.5)),
            item(1, "Totally Different", Some(0.2)),
            item(3, "alpha", Some(0.1)),
        ]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].similarity_score, Some(0.5));
    }

    #[test]
    fn test_smart_fuzzy_match() {
        let dedup = Deduplicator::new(DedupStrategy::Smart);
        let out = dedup.dedupe(vec![
            item(1, "The Lord of the Rings: The Return of the King", Some(0.9)),
            item(2, "The Lord of the Rings - The Return of the King", Some(0.4)),
            item(3, "The Hobbit", Some(0.5)),
        ]);

        assert_eq!(out.len(), 2);
        assert!(out.iter().any(|i| i.id == 1));
        assert!(out.iter().any(|i| i.id == 3));
    }

    #[test]
    fn test_smart_does_not_merge_distinct_titles() {
        let dedup = Deduplicator::new(DedupStrategy::Smart);
        let out = dedup.dedupe(vec![
            item(1, "Alien", None),
            item(2, "Aliens", None),
            item(3, "Heat", None),
        ]);

        // "Alien" vs "Aliens" is below the 0.9 ratio only for very short
        // strings; these two are 5/6 similar which is under threshold
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_never_drops_without_collision() {
        let dedup = Deduplicator::new(DedupStrategy::Smart);
        let titles = [
            "Heat",
            "Arrival",
            "Gladiator",
            "Spirited Away",
            "The Godfather",
            "Parasite",
            "Whiplash",
            "Amélie",
        ];
        let input: Vec<CandidateItem> = titles
            .iter()
            .enumerate()
            .map(|(i, t)| item(i as u64, t, None))
            .collect();
        let out = dedup.dedupe(input.clone());
        assert_eq!(out.len(), input.len());
    }

    #[test]
    fn test_idempotence() {
        let dedup = Deduplicator::new(DedupStrategy::Smart);
        let input = vec![
            item(1, "Alpha", Some(0.4)),
            item(1, "Alpha", Some(0.9)),
            item(2, "Beta", Some(0.5)),
            item(3, "beta ", Some(0.7)),
        ];

        let once = dedup.dedupe(input);
        let twice = dedup.dedupe(once.clone());
        assert_eq!(once, twice);
    }
}

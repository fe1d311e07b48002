pub mod aggregator;
pub mod dedup;
pub mod diversity;
pub mod recommendations;
pub mod similarity;

pub use aggregator::CandidateAggregator;
pub use dedup::{DedupStrategy, Deduplicator};
pub use diversity::DiversityPostProcessor;
pub use recommendations::{RecommendationService, SimilarOptions};
pub use similarity::{ScorerConfig, SimilarityScorer};

//! Multi-factor similarity scoring.
//!
//! The score between a reference item and a candidate is a weighted mean of
//! independently-normalized sub-scores. A factor whose inputs are missing on
//! either side contributes neither its term nor its weight, so sparse
//! metadata is never punished beyond the omission itself. Scoring is fully
//! deterministic: fixed inputs and weights always produce the same bits.
//!
//! Weights come from one consolidated base table, re-derived per request
//! when the caller supplies a cultural context — a viewer in an Asian
//! region, for example, up-weights language and region relative to genre.
//!
//! Scoring is direction-specific: only `score(reference, candidate)` is
//! ever used, and `score(a, b) == score(b, a)` is intentionally not
//! guaranteed.

use std::collections::HashSet;

use crate::models::{CandidateItem, CulturalContext};

/// Factor weights. Re-derived per region from the base table; the final
/// score normalizes by the sum of applicable weights, so the table does not
/// need to sum to 1.
#[derive(Debug, Clone, PartialEq)]
pub struct FactorWeights {
    pub genre: f64,
    pub cast: f64,
    pub crew: f64,
    pub franchise: f64,
    pub language: f64,
    pub region: f64,
    pub year: f64,
    pub rating: f64,
    pub popularity: f64,
    pub runtime: f64,
    pub budget: f64,
    pub company: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            genre: 0.20,
            cast: 0.12,
            crew: 0.08,
            franchise: 0.15,
            language: 0.08,
            region: 0.07,
            year: 0.08,
            rating: 0.07,
            popularity: 0.05,
            runtime: 0.03,
            budget: 0.02,
            company: 0.05,
        }
    }
}

/// Tolerance windows for the linear-decay numeric factors
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    pub weights: FactorWeights,
    /// Years of release-date distance at which the year factor reaches 0
    pub year_window: f64,
    pub rating_tolerance: f64,
    pub popularity_tolerance: f64,
    pub runtime_tolerance_minutes: f64,
    pub budget_tolerance: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            weights: FactorWeights::default(),
            year_window: 18.0,
            rating_tolerance: 3.0,
            popularity_tolerance: 100.0,
            runtime_tolerance_minutes: 60.0,
            budget_tolerance: 150_000_000.0,
        }
    }
}

/// Curated language families. Codes are ISO 639-1.
const LANGUAGE_FAMILIES: &[(&str, &[&str])] = &[
    ("germanic", &["en", "de", "nl", "sv", "no", "da", "is"]),
    ("romance", &["es", "pt", "fr", "it", "ro"]),
    ("slavic", &["ru", "pl", "cs", "uk", "sr", "bg"]),
    ("east_asian", &["zh", "ja", "ko"]),
    ("indic", &["hi", "bn", "ta", "te", "ml", "mr", "pa"]),
    ("semitic", &["ar", "he"]),
    ("turkic", &["tr", "az", "kk"]),
    ("southeast_asian", &["th", "vi", "id", "ms", "tl"]),
];

/// Family pairs considered related (e.g. heavy loan vocabulary or shared
/// audience overlap in practice)
const RELATED_LANGUAGE_FAMILIES: &[(&str, &str)] = &[
    ("germanic", "romance"),
    ("east_asian", "southeast_asian"),
    ("indic", "semitic"),
    ("slavic", "turkic"),
];

/// ISO 3166-1 country -> macro region
const MACRO_REGIONS: &[(&str, &[&str])] = &[
    ("north_america", &["US", "CA", "MX"]),
    (
        "europe",
        &["GB", "FR", "DE", "IT", "ES", "NL", "SE", "NO", "DK", "PL", "IE", "BE", "AT", "CH", "PT", "CZ", "RU", "UA"],
    ),
    ("east_asia", &["JP", "KR", "CN", "TW", "HK"]),
    ("south_asia", &["IN", "PK", "BD", "LK", "NP"]),
    ("southeast_asia", &["TH", "VN", "ID", "MY", "PH", "SG"]),
    ("latin_america", &["BR", "AR", "CL", "CO", "PE", "VE", "UY"]),
    ("middle_east_africa", &["AE", "SA", "EG", "IL", "TR", "ZA", "NG", "MA"]),
    ("oceania", &["AU", "NZ"]),
];

const RELATED_MACRO_REGIONS: &[(&str, &str)] = &[
    ("north_america", "europe"),
    ("north_america", "oceania"),
    ("europe", "oceania"),
    ("east_asia", "southeast_asia"),
    ("south_asia", "southeast_asia"),
    ("latin_america", "europe"),
];

/// Regional language affinity: audiences in a region engage more with these
/// languages than family distance alone suggests
const REGIONAL_LANGUAGE_AFFINITY: &[(&str, &str, f64)] = &[
    ("east_asia", "ja", 1.2),
    ("east_asia", "ko", 1.2),
    ("east_asia", "zh", 1.2),
    ("south_asia", "hi", 1.25),
    ("south_asia", "ta", 1.2),
    ("south_asia", "te", 1.2),
    ("latin_america", "es", 1.2),
    ("latin_america", "pt", 1.15),
    ("europe", "en", 1.1),
    ("middle_east_africa", "ar", 1.2),
];

/// Cultural affinity between a viewer's macro region and a production
/// country's macro region, beyond plain region matching
const REGION_CULTURAL_AFFINITY: &[(&str, &str, f64)] = &[
    ("east_asia", "east_asia", 1.25),
    ("south_asia", "south_asia", 1.3),
    ("latin_america", "latin_america", 1.2),
    ("east_asia", "southeast_asia", 1.1),
    ("southeast_asia", "east_asia", 1.15),
];

/// Franchise keywords that mark well-known series even when collection
/// metadata is missing
const FRANCHISE_KEYWORDS: &[&str] = &[
    "star wars",
    "star trek",
    "harry potter",
    "james bond",
    "lord of the rings",
    "the hobbit",
    "avengers",
    "x-men",
    "spider-man",
    "batman",
    "superman",
    "jurassic",
    "fast & furious",
    "mission: impossible",
    "john wick",
    "terminator",
    "alien",
    "godzilla",
    "pirates of the caribbean",
];

fn language_family(code: &str) -> Option<&'static str> {
    LANGUAGE_FAMILIES
        .iter()
        .find(|(_, members)| members.contains(&code))
        .map(|(family, _)| *family)
}

fn families_related(a: &str, b: &str) -> bool {
    RELATED_LANGUAGE_FAMILIES
        .iter()
        .any(|(x, y)| (*x == a && *y == b) || (*x == b && *y == a))
}

fn macro_region(country: &str) -> Option<&'static str> {
    MACRO_REGIONS
        .iter()
        .find(|(_, members)| members.contains(&country))
        .map(|(region, _)| *region)
}

fn macro_regions_related(a: &str, b: &str) -> bool {
    RELATED_MACRO_REGIONS
        .iter()
        .any(|(x, y)| (*x == a && *y == b) || (*x == b && *y == a))
}

fn regional_language_affinity(viewer_region: &str, language: &str) -> f64 {
    macro_region(viewer_region)
        .and_then(|region| {
            REGIONAL_LANGUAGE_AFFINITY
                .iter()
                .find(|(r, l, _)| *r == region && *l == language)
                .map(|(_, _, factor)| *factor)
        })
        .unwrap_or(1.0)
}

fn region_cultural_affinity(viewer_region: &str, production_country: &str) -> f64 {
    match (macro_region(viewer_region), macro_region(production_country)) {
        (Some(viewer), Some(producer)) => REGION_CULTURAL_AFFINITY
            .iter()
            .find(|(v, p, _)| *v == viewer && *p == producer)
            .map(|(_, _, factor)| *factor)
            .unwrap_or(1.0),
        _ => 1.0,
    }
}

fn franchise_keyword(title: &str) -> Option<&'static str> {
    let lowered = title.to_lowercase();
    FRANCHISE_KEYWORDS.iter().find(|k| lowered.contains(*k)).copied()
}

fn jaccard(a: &[u64], b: &[u64]) -> f64 {
    let set_a: HashSet<u64> = a.iter().copied().collect();
    let set_b: HashSet<u64> = b.iter().copied().collect();
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Linear decay of an absolute difference over a tolerance window
fn linear_decay(diff: f64, tolerance: f64) -> f64 {
    if tolerance <= 0.0 {
        return 0.0;
    }
    (1.0 - diff.abs() / tolerance).max(0.0)
}

pub struct SimilarityScorer {
    config: ScorerConfig,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new(ScorerConfig::default())
    }
}

impl SimilarityScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    /// Re-derives the weight table for the viewer's region. Regions with a
    /// strong local-content skew up-weight language and region and slightly
    /// down-weight genre.
    fn weights_for(&self, context: &CulturalContext) -> FactorWeights {
        let mut weights = self.config.weights.clone();
        let Some(region) = context.region.as_deref() else {
            return weights;
        };

        match macro_region(region) {
            Some("east_asia") | Some("south_asia") => {
                weights.language *= 1.4;
                weights.region *= 1.35;
                weights.genre *= 0.9;
            }
            Some("southeast_asia") => {
                weights.language *= 1.3;
                weights.region *= 1.25;
            }
            Some("latin_america") => {
                weights.language *= 1.3;
                weights.region *= 1.2;
            }
            Some("europe") => {
                weights.language *= 1.2;
                weights.region *= 1.15;
            }
            Some("middle_east_africa") => {
                weights.language *= 1.25;
                weights.region *= 1.2;
            }
            _ => {}
        }
        weights
    }

    /// Full multi-factor score, clamped to [0, 1]
    pub fn score(
        &self,
        reference: &CandidateItem,
        candidate: &CandidateItem,
        context: &CulturalContext,
    ) -> f64 {
        let weights = self.weights_for(context);
        let mut acc = FactorAccumulator::default();

        acc.add(weights.genre, self.genre_score(reference, candidate));
        acc.add(weights.cast, self.cast_score(reference, candidate));
        acc.add(weights.crew, self.crew_score(reference, candidate));
        acc.add(weights.franchise, self.franchise_score(reference, candidate));
        acc.add(
            weights.language,
            self.language_score(reference, candidate, context),
        );
        acc.add(
            weights.region,
            self.region_score(reference, candidate, context),
        );
        acc.add(weights.year, self.year_score(reference, candidate));
        acc.add(weights.rating, self.rating_score(reference, candidate));
        acc.add(
            weights.popularity,
            self.popularity_score(reference, candidate),
        );
        acc.add(weights.runtime, self.runtime_score(reference, candidate));
        acc.add(weights.budget, self.budget_score(reference, candidate));
        acc.add(weights.company, self.company_score(reference, candidate));

        acc.finish()
    }

    /// Cheap score for the fast path: a rating/popularity prior over the
    /// candidate alone, so no enrichment (and no reference details fetch) is
    /// needed
    pub fn quick_score(&self, candidate: &CandidateItem) -> f64 {
        let mut acc = FactorAccumulator::default();
        acc.add(
            0.6,
            candidate.vote_average.map(|v| (v / 10.0).clamp(0.0, 1.0)),
        );
        acc.add(
            0.4,
            candidate
                .popularity
                .map(|p| (p / self.config.popularity_tolerance).clamp(0.0, 1.0)),
        );
        acc.finish()
    }

    fn genre_score(&self, reference: &CandidateItem, candidate: &CandidateItem) -> Option<f64> {
        if reference.genres.is_empty() || candidate.genres.is_empty() {
            return None;
        }
        Some(jaccard(&reference.genres, &candidate.genres))
    }

    fn cast_score(&self, reference: &CandidateItem, candidate: &CandidateItem) -> Option<f64> {
        if reference.cast.is_empty() || candidate.cast.is_empty() {
            return None;
        }
        let ref_ids: Vec<u64> = reference.cast.iter().take(10).map(|c| c.id).collect();
        let cand_ids: Vec<u64> = candidate.cast.iter().take(10).map(|c| c.id).collect();
        Some(jaccard(&ref_ids, &cand_ids))
    }

    fn crew_score(&self, reference: &CandidateItem, candidate: &CandidateItem) -> Option<f64> {
        if reference.crew.is_empty() || candidate.crew.is_empty() {
            return None;
        }

        let ref_directors: HashSet<u64> = reference.directors().map(|c| c.id).collect();
        let cand_directors: HashSet<u64> = candidate.directors().map(|c| c.id).collect();
        let ref_writers: HashSet<u64> = reference.writers().map(|c| c.id).collect();
        let cand_writers: HashSet<u64> = candidate.writers().map(|c| c.id).collect();

        let mut score: f64 = 0.0;
        if !ref_directors.is_disjoint(&cand_directors) {
            score += 0.5;
        }
        if !ref_writers.is_disjoint(&cand_writers) {
            score += 0.3;
        }
        Some(score.min(1.0))
    }

    fn franchise_score(&self, reference: &CandidateItem, candidate: &CandidateItem) -> Option<f64> {
        // The factor applies only when the reference carries franchise
        // evidence; a non-franchise reference should not penalize franchise
        // candidates
        let ref_keyword = franchise_keyword(&reference.title);
        if reference.collection_id.is_none()
            && reference.collection_name.is_none()
            && ref_keyword.is_none()
        {
            return None;
        }

        if reference.collection_id.is_some() && reference.collection_id == candidate.collection_id {
            return Some(1.0);
        }

        if let (Some(ref_name), Some(cand_name)) = (
            reference.collection_name.as_deref(),
            candidate.collection_name.as_deref(),
        ) {
            let a = ref_name.to_lowercase();
            let b = cand_name.to_lowercase();
            if !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a)) {
                return Some(0.8);
            }
        }

        if let Some(keyword) = ref_keyword {
            if candidate.title.to_lowercase().contains(keyword) {
                return Some(0.6);
            }
        }

        Some(0.0)
    }

    fn language_score(
        &self,
        reference: &CandidateItem,
        candidate: &CandidateItem,
        context: &CulturalContext,
    ) -> Option<f64> {
        let ref_lang = reference.original_language.as_deref()?;
        let cand_lang = candidate.original_language.as_deref()?;

        let mut score = if ref_lang == cand_lang {
            1.0
        } else {
            match (language_family(ref_lang), language_family(cand_lang)) {
                (Some(a), Some(b)) if a == b => 0.8,
                (Some(a), Some(b)) if families_related(a, b) => 0.6,
                _ => 0.0,
            }
        };

        if let Some(preferred) = context.preferred_language.as_deref() {
            if cand_lang == preferred {
                score *= 1.5;
            }
        }
        if let Some(region) = context.region.as_deref() {
            score *= regional_language_affinity(region, cand_lang);
        }

        Some(score.min(1.0))
    }

    fn region_score(
        &self,
        reference: &CandidateItem,
        candidate: &CandidateItem,
        context: &CulturalContext,
    ) -> Option<f64> {
        if reference.production_countries.is_empty() || candidate.production_countries.is_empty() {
            return None;
        }

        let ref_set: HashSet<&str> = reference
            .production_countries
            .iter()
            .map(String::as_str)
            .collect();
        let cand_set: HashSet<&str> = candidate
            .production_countries
            .iter()
            .map(String::as_str)
            .collect();

        let shared = ref_set.intersection(&cand_set).count();
        let mut score = if shared > 0 {
            // Full credit scaled by how much of the smaller production list
            // overlaps
            shared as f64 / ref_set.len().min(cand_set.len()) as f64
        } else {
            let ref_regions: HashSet<&str> =
                ref_set.iter().filter_map(|c| macro_region(c)).collect();
            let cand_regions: HashSet<&str> =
                cand_set.iter().filter_map(|c| macro_region(c)).collect();

            if !ref_regions.is_disjoint(&cand_regions) {
                0.7
            } else if ref_regions
                .iter()
                .any(|a| cand_regions.iter().any(|b| macro_regions_related(a, b)))
            {
                0.5
            } else {
                0.0
            }
        };

        if let Some(viewer_region) = context.region.as_deref() {
            if cand_set.contains(viewer_region) {
                score *= 1.3;
            }
            if let Some(primary) = candidate.production_countries.first() {
                score *= region_cultural_affinity(viewer_region, primary);
            }
        }

        Some(score.min(1.0))
    }

    fn year_score(&self, reference: &CandidateItem, candidate: &CandidateItem) -> Option<f64> {
        let diff = (reference.year? - candidate.year?) as f64;
        Some(linear_decay(diff, self.config.year_window))
    }

    fn rating_score(&self, reference: &CandidateItem, candidate: &CandidateItem) -> Option<f64> {
        let diff = reference.vote_average? - candidate.vote_average?;
        Some(linear_decay(diff, self.config.rating_tolerance))
    }

    fn popularity_score(&self, reference: &CandidateItem, candidate: &CandidateItem) -> Option<f64> {
        let diff = reference.popularity? - candidate.popularity?;
        Some(linear_decay(diff, self.config.popularity_tolerance))
    }

    fn runtime_score(&self, reference: &CandidateItem, candidate: &CandidateItem) -> Option<f64> {
        let diff = reference.runtime_minutes? as f64 - candidate.runtime_minutes? as f64;
        Some(linear_decay(diff, self.config.runtime_tolerance_minutes))
    }

    fn budget_score(&self, reference: &CandidateItem, candidate: &CandidateItem) -> Option<f64> {
        let diff = reference.budget? as f64 - candidate.budget? as f64;
        Some(linear_decay(diff, self.config.budget_tolerance))
    }

    fn company_score(&self, reference: &CandidateItem, candidate: &CandidateItem) -> Option<f64> {
        if reference.production_companies.is_empty() || candidate.production_companies.is_empty() {
            return None;
        }
        Some(jaccard(
            &reference.production_companies,
            &candidate.production_companies,
        ))
    }
}

/// Accumulates (weight, sub-score) terms and yields the clamped weighted mean
#[derive(Default)]
struct FactorAccumulator {
    weighted_sum: f64,
    weight_total: f64,
}

impl FactorAccumulator {
    fn add(&mut self, weight: f64, sub_score: Option<f64>) {
        if let Some(s) = sub_score {
            self.weighted_sum += weight * s;
            self.weight_total += weight;
        }
    }

    fn finish(self) -> f64 {
        if self.weight_total <= 0.0 {
            return 0.0;
        }
        (self.weighted_sum / self.weight_total).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CastMember, ContentType, CrewMember};

    fn item(id: u64, title: &str) -> CandidateItem {
        CandidateItem::shallow(id, title.to_string(), ContentType::Movie)
    }

    fn cast(ids: &[u64]) -> Vec<CastMember> {
        ids.iter()
            .enumerate()
            .map(|(order, id)| CastMember {
                id: *id,
                name: format!("Actor {}", id),
                order: order as u32,
            })
            .collect()
    }

    fn crew(id: u64, job: &str) -> CrewMember {
        CrewMember {
            id,
            name: format!("Crew {}", id),
            job: job.to_string(),
        }
    }

    #[test]
    fn test_score_bounds_on_rich_items() {
        let scorer = SimilarityScorer::default();
        let mut a = item(1, "Star Wars: A New Hope");
        let mut b = item(2, "Star Wars: The Empire Strikes Back");
        for it in [&mut a, &mut b] {
            it.genres = vec![12, 878];
            it.cast = cast(&[1, 2, 3]);
            it.crew = vec![crew(10, "Director"), crew(11, "Writer")];
            it.year = Some(1978);
            it.original_language = Some("en".to_string());
            it.production_countries = vec!["US".to_string()];
            it.production_companies = vec![1];
            it.collection_id = Some(10);
            it.vote_average = Some(8.5);
            it.popularity = Some(80.0);
            it.runtime_minutes = Some(121);
            it.budget = Some(11_000_000);
        }

        let score = scorer.score(&a, &b, &CulturalContext::default());
        assert!((0.0..=1.0).contains(&score));
        // Identical metadata scores near the ceiling (crew tops out at 0.8)
        assert!(score > 0.95);
    }

    #[test]
    fn test_score_zero_when_no_factors_apply() {
        let scorer = SimilarityScorer::default();
        let a = item(1, "Alpha");
        let b = item(2, "Beta");
        assert_eq!(scorer.score(&a, &b, &CulturalContext::default()), 0.0);
    }

    #[test]
    fn test_determinism() {
        let scorer = SimilarityScorer::default();
        let mut a = item(1, "Alpha");
        let mut b = item(2, "Beta");
        a.genres = vec![28, 12];
        b.genres = vec![28, 35];
        a.year = Some(2000);
        b.year = Some(2010);

        let ctx = CulturalContext::new(Some("en".to_string()), Some("US".to_string()));
        let first = scorer.score(&a, &b, &ctx);
        for _ in 0..10 {
            assert_eq!(scorer.score(&a, &b, &ctx).to_bits(), first.to_bits());
        }
    }

    #[test]
    fn test_genre_jaccard_dominates_ranking() {
        // Identical genre sets must beat disjoint ones with all other
        // factors equal
        let scorer = SimilarityScorer::default();
        let mut reference = item(1, "Reference");
        reference.genres = vec![28, 12]; // Action, Adventure
        reference.year = Some(2010);

        let mut a = item(2, "Candidate A");
        a.genres = vec![28, 12];
        a.year = Some(2010);

        let mut b = item(3, "Candidate B");
        b.genres = vec![35]; // Comedy
        b.year = Some(2010);

        let ctx = CulturalContext::default();
        let score_a = scorer.score(&reference, &a, &ctx);
        let score_b = scorer.score(&reference, &b, &ctx);
        assert!(score_a > score_b);
    }

    #[test]
    fn test_missing_factor_not_penalized() {
        let scorer = SimilarityScorer::default();
        let mut reference = item(1, "Reference");
        reference.genres = vec![28];
        reference.year = Some(2010);

        // Same genre overlap; B additionally has a matching year
        let mut a = item(2, "A");
        a.genres = vec![28];

        let mut b = item(3, "B");
        b.genres = vec![28];
        b.year = Some(2010);

        let ctx = CulturalContext::default();
        // A's year factor is omitted, not zeroed: both score 1.0 on what
        // they can be judged on
        assert_eq!(scorer.score(&reference, &a, &ctx), 1.0);
        assert_eq!(scorer.score(&reference, &b, &ctx), 1.0);
    }

    #[test]
    fn test_crew_director_and_writer_bonuses() {
        let scorer = SimilarityScorer::default();
        let mut reference = item(1, "Ref");
        reference.crew = vec![crew(10, "Director"), crew(11, "Writer")];

        let mut director_match = item(2, "A");
        director_match.crew = vec![crew(10, "Director")];

        let mut both_match = item(3, "B");
        both_match.crew = vec![crew(10, "Director"), crew(11, "Writer")];

        assert_eq!(
            scorer.crew_score(&reference, &director_match),
            Some(0.5)
        );
        assert_eq!(scorer.crew_score(&reference, &both_match), Some(0.8));
    }

    #[test]
    fn test_franchise_tiers() {
        let scorer = SimilarityScorer::default();

        let mut reference = item(1, "The Matrix");
        reference.collection_id = Some(2344);
        reference.collection_name = Some("The Matrix Collection".to_string());

        let mut same_collection = item(2, "The Matrix Reloaded");
        same_collection.collection_id = Some(2344);
        assert_eq!(scorer.franchise_score(&reference, &same_collection), Some(1.0));

        let mut name_overlap = item(3, "The Animatrix");
        name_overlap.collection_id = Some(999);
        name_overlap.collection_name = Some("The Matrix".to_string());
        assert_eq!(scorer.franchise_score(&reference, &name_overlap), Some(0.8));

        let keyword_ref = {
            let mut r = item(4, "Star Wars: A New Hope");
            r.collection_id = None;
            r
        };
        let keyword_cand = item(5, "Star Wars: The Last Jedi");
        assert_eq!(
            scorer.franchise_score(&keyword_ref, &keyword_cand),
            Some(0.6)
        );

        let unrelated = item(6, "Heat");
        assert_eq!(scorer.franchise_score(&reference, &unrelated), Some(0.0));

        // A non-franchise reference omits the factor entirely
        let plain_ref = item(7, "Manchester by the Sea");
        assert_eq!(scorer.franchise_score(&plain_ref, &unrelated), None);
    }

    #[test]
    fn test_language_family_tiers() {
        let scorer = SimilarityScorer::default();
        let ctx = CulturalContext::default();

        let mut reference = item(1, "Ref");
        reference.original_language = Some("es".to_string());

        let mut same = item(2, "A");
        same.original_language = Some("es".to_string());
        assert_eq!(scorer.language_score(&reference, &same, &ctx), Some(1.0));

        let mut family = item(3, "B");
        family.original_language = Some("pt".to_string());
        assert_eq!(scorer.language_score(&reference, &family, &ctx), Some(0.8));

        let mut related = item(4, "C");
        related.original_language = Some("en".to_string());
        assert_eq!(scorer.language_score(&reference, &related, &ctx), Some(0.6));

        let mut unrelated = item(5, "D");
        unrelated.original_language = Some("ja".to_string());
        assert_eq!(scorer.language_score(&reference, &unrelated, &ctx), Some(0.0));
    }

    #[test]
    fn test_preferred_language_boost_capped() {
        let scorer = SimilarityScorer::default();
        let ctx = CulturalContext::new(Some("ko".to_string()), Some("KR".to_string()));

        let mut reference = item(1, "Ref");
        reference.original_language = Some("ko".to_string());
        let mut candidate = item(2, "A");
        candidate.original_language = Some("ko".to_string());

        // 1.0 * 1.5 * affinity would exceed 1; must cap
        assert_eq!(
            scorer.language_score(&reference, &candidate, &ctx),
            Some(1.0)
        );
    }

    #[test]
    fn test_region_tiers() {
        let scorer = SimilarityScorer::default();
        let ctx = CulturalContext::default();

        let mut reference = item(1, "Ref");
        reference.production_countries = vec!["US".to_string()];

        let mut shared = item(2, "A");
        shared.production_countries = vec!["US".to_string()];
        assert_eq!(scorer.region_score(&reference, &shared, &ctx), Some(1.0));

        let mut same_macro = item(3, "B");
        same_macro.production_countries = vec!["CA".to_string()];
        assert_eq!(scorer.region_score(&reference, &same_macro, &ctx), Some(0.7));

        let mut related_macro = item(4, "C");
        related_macro.production_countries = vec!["GB".to_string()];
        assert_eq!(
            scorer.region_score(&reference, &related_macro, &ctx),
            Some(0.5)
        );

        let mut unrelated = item(5, "D");
        unrelated.production_countries = vec!["JP".to_string()];
        assert_eq!(scorer.region_score(&reference, &unrelated, &ctx), Some(0.0));
    }

    #[test]
    fn test_year_linear_decay() {
        let scorer = SimilarityScorer::default();
        let mut reference = item(1, "Ref");
        reference.year = Some(2000);

        let mut near = item(2, "A");
        near.year = Some(2009);
        let mut far = item(3, "B");
        far.year = Some(2030);

        assert_eq!(scorer.year_score(&reference, &near), Some(0.5));
        // Beyond the window decays to zero, never negative
        assert_eq!(scorer.year_score(&reference, &far), Some(0.0));
    }

    #[test]
    fn test_regional_reweighting_changes_ranking_emphasis() {
        let scorer = SimilarityScorer::default();

        let mut reference = item(1, "Ref");
        reference.genres = vec![28];
        reference.original_language = Some("ko".to_string());

        // Language-matching candidate vs genre-matching candidate
        let mut language_match = item(2, "A");
        language_match.genres = vec![99];
        language_match.original_language = Some("ko".to_string());

        let mut genre_match = item(3, "B");
        genre_match.genres = vec![28];
        genre_match.original_language = Some("fr".to_string());

        let neutral = CulturalContext::default();
        let korean_viewer = CulturalContext::new(Some("ko".to_string()), Some("KR".to_string()));

        let neutral_gap = scorer.score(&reference, &genre_match, &neutral)
            - scorer.score(&reference, &language_match, &neutral);
        let regional_gap = scorer.score(&reference, &genre_match, &korean_viewer)
            - scorer.score(&reference, &language_match, &korean_viewer);

        // The Korean viewer's context narrows the genre candidate's lead
        assert!(regional_gap < neutral_gap);
    }

    #[test]
    fn test_quick_score_uses_only_cheap_factors() {
        let scorer = SimilarityScorer::default();
        let mut candidate = item(2, "A");
        candidate.vote_average = Some(8.0);
        candidate.popularity = Some(50.0);
        // Genre data present but must not affect the quick score
        candidate.genres = vec![99];

        // 0.6 * 0.8 + 0.4 * 0.5 over weight 1.0
        let expected = (0.6 * 0.8 + 0.4 * 0.5) / 1.0;
        assert!((scorer.quick_score(&candidate) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_quick_score_zero_without_data() {
        let scorer = SimilarityScorer::default();
        assert_eq!(scorer.quick_score(&item(2, "B")), 0.0);
    }
}

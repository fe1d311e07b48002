use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Type of content in the catalog
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Tv,
}

impl ContentType {
    /// Path segment used by the catalog API
    pub fn as_path(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Tv => "tv",
        }
    }
}

impl Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path())
    }
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(ContentType::Movie),
            "tv" => Ok(ContentType::Tv),
            other => Err(format!("unknown content type '{}'", other)),
        }
    }
}

/// A cast credit, ordered by billing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub order: u32,
}

/// A crew credit with its department job
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrewMember {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub job: String,
}

/// One piece of content under consideration by the recommendation pipeline.
///
/// Shallow candidates (straight from a list endpoint) carry only the fields a
/// list row provides; detail enrichment fills in cast, crew, countries,
/// companies, collection, runtime and budget. `similarity_score` is absent
/// until the scorer has run and is always clamped to [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateItem {
    pub id: u64,
    pub title: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub genres: Vec<u64>,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
    pub year: Option<i32>,
    pub original_language: Option<String>,
    #[serde(default)]
    pub production_countries: Vec<String>,
    #[serde(default)]
    pub production_companies: Vec<u64>,
    pub collection_id: Option<u64>,
    pub collection_name: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub runtime_minutes: Option<u32>,
    pub budget: Option<u64>,
    pub similarity_score: Option<f64>,
}

impl CandidateItem {
    /// Creates a shallow candidate with only list-row fields populated
    pub fn shallow(id: u64, title: String, content_type: ContentType) -> Self {
        Self {
            id,
            title,
            content_type,
            genres: Vec::new(),
            cast: Vec::new(),
            crew: Vec::new(),
            year: None,
            original_language: None,
            production_countries: Vec::new(),
            production_companies: Vec::new(),
            collection_id: None,
            collection_name: None,
            vote_average: None,
            popularity: None,
            runtime_minutes: None,
            budget: None,
            similarity_score: None,
        }
    }

    /// Score used in ranking comparisons; unscored items count as 0
    pub fn score(&self) -> f64 {
        self.similarity_score.unwrap_or(0.0)
    }

    /// Director crew credits, if enriched
    pub fn directors(&self) -> impl Iterator<Item = &CrewMember> {
        self.crew.iter().filter(|c| c.job == "Director")
    }

    /// Writer crew credits, if enriched
    pub fn writers(&self) -> impl Iterator<Item = &CrewMember> {
        self.crew
            .iter()
            .filter(|c| c.job == "Writer" || c.job == "Screenplay")
    }
}

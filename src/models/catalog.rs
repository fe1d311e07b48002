//! Wire types for the upstream catalog API.
//!
//! Deserialization is tolerant by design: list rows and detail payloads vary
//! between movie and TV endpoints (`title` vs `name`, `release_date` vs
//! `first_air_date`), and every field beyond `id` is optional or defaulted so
//! one malformed row never sinks a whole page.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::candidate::{CandidateItem, CastMember, ContentType, CrewMember};

/// One page of results from a catalog list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogListPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<CatalogListItem>,
    #[serde(default)]
    pub total_pages: u32,
}

/// Shallow list row as returned by recommendations/similar/discover/trending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogListItem {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    /// TV endpoints use `name` instead of `title`
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<u64>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
}

impl CatalogListItem {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("")
    }

    /// Release year parsed from whichever date field the row carries
    pub fn year(&self) -> Option<i32> {
        let date = self.release_date.as_deref().or(self.first_air_date.as_deref())?;
        parse_year(date)
    }

    /// Converts a list row into a shallow candidate
    pub fn into_candidate(self, content_type: ContentType) -> CandidateItem {
        let mut item =
            CandidateItem::shallow(self.id, self.display_title().to_string(), content_type);
        item.genres = self.genre_ids.clone();
        item.year = self.year();
        item.original_language = self.original_language.clone();
        item.vote_average = self.vote_average;
        item.popularity = self.popularity;
        item
    }
}

/// Franchise grouping on a detail payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenreRef {
    pub id: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductionCountryRef {
    #[serde(default)]
    pub iso_3166_1: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductionCompanyRef {
    pub id: u64,
}

/// Credits block appended to a detail request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogCredits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

/// Full detail payload used for candidate enrichment
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogDetails {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub genres: Vec<GenreRef>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub production_countries: Vec<ProductionCountryRef>,
    #[serde(default)]
    pub production_companies: Vec<ProductionCompanyRef>,
    #[serde(default)]
    pub belongs_to_collection: Option<Collection>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default)]
    pub credits: Option<CatalogCredits>,
}

/// Catalog dates are `YYYY-MM-DD`; anything else yields no year
fn parse_year(date: &str) -> Option<i32> {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .map(|d| d.year())
}

/// Cast credits beyond this rank carry little similarity signal
const SIGNIFICANT_CAST: usize = 10;

impl CatalogDetails {
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.name.as_deref())
            .unwrap_or("")
    }

    pub fn year(&self) -> Option<i32> {
        let date = self.release_date.as_deref().or(self.first_air_date.as_deref())?;
        parse_year(date)
    }

    /// Merges detail fields into a shallow candidate, keeping list-row values
    /// where the detail payload has nothing better
    pub fn enrich(self, item: &mut CandidateItem) {
        let computed_year = self.year();
        if !self.genres.is_empty() {
            item.genres = self.genres.iter().map(|g| g.id).collect();
        }
        if let Some(credits) = self.credits {
            let mut cast = credits.cast;
            cast.sort_by_key(|c| c.order);
            cast.truncate(SIGNIFICANT_CAST);
            item.cast = cast;
            item.crew = credits
                .crew
                .into_iter()
                .filter(|c| matches!(c.job.as_str(), "Director" | "Writer" | "Screenplay"))
                .collect();
        }
        item.production_countries = self
            .production_countries
            .iter()
            .map(|c| c.iso_3166_1.clone())
            .collect();
        item.production_companies = self.production_companies.iter().map(|c| c.id).collect();
        if let Some(collection) = self.belongs_to_collection {
            item.collection_id = Some(collection.id);
            item.collection_name = Some(collection.name);
        }
        if item.year.is_none() {
            item.year = computed_year;
        }
        if item.original_language.is_none() {
            item.original_language = self.original_language;
        }
        if item.vote_average.is_none() {
            item.vote_average = self.vote_average;
        }
        if item.popularity.is_none() {
            item.popularity = self.popularity;
        }
        item.runtime_minutes = self.runtime;
        item.budget = self.budget.filter(|b| *b > 0);
    }
}

pub mod candidate;
pub mod catalog;
pub mod context;

pub use candidate::{CandidateItem, CastMember, ContentType, CrewMember};
pub use catalog::{CatalogCredits, CatalogDetails, CatalogListItem, CatalogListPage, Collection};
pub use context::CulturalContext;

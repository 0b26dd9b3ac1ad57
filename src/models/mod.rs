pub mod catalog;
pub mod details;
pub mod similarity;

pub use catalog::{Catalog, CatalogRecord, DuplicateTitles, Item};
pub use details::{MovieDetails, RecommendedMovie, OVERVIEW_UNAVAILABLE, PLACEHOLDER_POSTER_URL};
pub use similarity::SimilarityMatrix;

pub mod artifacts;
pub mod download;
pub mod metadata;
pub mod providers;
pub mod recommendations;
pub mod recommender;

pub use metadata::MetadataService;
pub use recommender::RecommendationIndex;

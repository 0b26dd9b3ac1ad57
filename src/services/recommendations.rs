use crate::{
    error::AppResult,
    models::{Item, RecommendedMovie},
    services::{metadata::MetadataService, recommender::RecommendationIndex},
};

/// Which movie a recommendation request is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Title(String),
    MovieId(u64),
}

/// Recommendations for a selected movie, enriched with display metadata
///
/// Fails only when the selection is not in the catalog; metadata problems
/// degrade individual fields instead.
pub async fn get_recommendations(
    index: &RecommendationIndex,
    metadata: &MetadataService,
    selection: &Selection,
) -> AppResult<(Item, Vec<RecommendedMovie>)> {
    let (selected, neighbors) = match selection {
        Selection::Title(title) => (index.find_title(title)?, index.recommend(title)?),
        Selection::MovieId(id) => (index.find_id(*id)?, index.recommend_by_id(*id)?),
    };

    let ids: Vec<u64> = neighbors.iter().map(|item| item.id).collect();
    let details = metadata.resolve_many(&ids).await;

    let recommendations = neighbors
        .into_iter()
        .zip(details)
        .map(|(item, details)| RecommendedMovie::new(item, details))
        .collect();

    Ok((selected.clone(), recommendations))
}

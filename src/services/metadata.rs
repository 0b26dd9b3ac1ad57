use std::sync::Arc;

use tracing::instrument;

use crate::{models::MovieDetails, services::providers::MetadataProvider};

/// Resolves display metadata for movies
///
/// Metadata is enrichment only: every failure is logged and replaced with
/// defaults, and nothing here returns an error.
#[derive(Clone)]
pub struct MetadataService {
    provider: Arc<dyn MetadataProvider>,
    image_base_url: String,
}

impl MetadataService {
    pub fn new(provider: Arc<dyn MetadataProvider>, image_base_url: impl Into<String>) -> Self {
        Self {
            provider,
            image_base_url: image_base_url.into(),
        }
    }

    /// Details for one movie, defaults substituted for whatever is unavailable
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn resolve(&self, movie_id: u64) -> MovieDetails {
        match self.provider.fetch_movie(movie_id).await {
            Ok(document) => MovieDetails::from_document(&document, &self.image_base_url),
            Err(e) => {
                tracing::warn!(movie_id, error = %e, "Metadata unavailable, using defaults");
                MovieDetails::default()
            }
        }
    }

    /// Details for several movies, in input order
    ///
    /// Each lookup runs on its own task so a slow or failing call does not
    /// hold up or affect the others.
    pub async fn resolve_many(&self, movie_ids: &[u64]) -> Vec<MovieDetails> {
        let tasks: Vec<_> = movie_ids
            .iter()
            .map(|&movie_id| {
                let service = self.clone();
                tokio::spawn(async move { service.resolve(movie_id).await })
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for (task, movie_id) in tasks.into_iter().zip(movie_ids) {
            match task.await {
                Ok(details) => results.push(details),
                Err(e) => {
                    tracing::error!(movie_id, error = %e, "Metadata task failed");
                    results.push(MovieDetails::default());
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{OVERVIEW_UNAVAILABLE, PLACEHOLDER_POSTER_URL};
    use crate::services::providers::MockMetadataProvider;
    use serde_json::json;

    const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

    fn service(mock: MockMetadataProvider) -> MetadataService {
        MetadataService::new(Arc::new(mock), IMAGE_BASE)
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let mut mock = MockMetadataProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_fetch_movie()
            .withf(|id| *id == 27205)
            .times(1)
            .returning(|_| {
                Ok(json!({
                    "poster_path": "/inception.jpg",
                    "vote_average": 8.369,
                    "release_date": "2010-07-15",
                    "genres": [{"name": "Science Fiction"}],
                    "runtime": 148
                }))
            });

        let details = service(mock).resolve(27205).await;

        assert_eq!(details.poster_url, format!("{}/inception.jpg", IMAGE_BASE));
        assert_eq!(details.rating, Some(8.4));
        assert_eq!(details.year.as_deref(), Some("2010"));
        assert_eq!(details.genres, vec!["Science Fiction"]);
        assert_eq!(details.runtime, Some(148));
        assert_eq!(details.overview, OVERVIEW_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_resolve_failure_uses_all_defaults() {
        let mut mock = MockMetadataProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_fetch_movie()
            .returning(|_| Err(AppError::ExternalApi("connection reset".to_string())));

        let details = service(mock).resolve(1).await;

        assert_eq!(details.poster_url, PLACEHOLDER_POSTER_URL);
        assert_eq!(details.overview, OVERVIEW_UNAVAILABLE);
        assert_eq!(details.rating, None);
        assert_eq!(details.year, None);
        assert!(details.genres.is_empty());
        assert_eq!(details.runtime, None);
    }

    #[tokio::test]
    async fn test_resolve_many_preserves_order_and_isolates_failures() {
        let mut mock = MockMetadataProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_fetch_movie().returning(|id| match id {
            2 => Err(AppError::ExternalApi("timeout".to_string())),
            _ => Ok(json!({ "runtime": id * 10 })),
        });

        let results = service(mock).resolve_many(&[1, 2, 3]).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].runtime, Some(10));
        assert_eq!(results[1], MovieDetails::default());
        assert_eq!(results[2].runtime, Some(30));
    }

    #[tokio::test]
    async fn test_resolve_many_empty() {
        let mock = MockMetadataProvider::new();
        assert!(service(mock).resolve_many(&[]).await.is_empty());
    }
}

/// Movie metadata provider abstraction
///
/// A provider fetches the raw metadata document for a movie id. Turning that
/// document into display fields, and absorbing failures, is the job of
/// `services::metadata`.
use serde_json::Value;

use crate::error::AppResult;

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Trait for movie metadata sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch the metadata document for a movie
    ///
    /// Errors on transport failures, non-2xx responses and bodies that are not
    /// JSON. Field-level validation is left to the caller.
    async fn fetch_movie(&self, movie_id: u64) -> AppResult<Value>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

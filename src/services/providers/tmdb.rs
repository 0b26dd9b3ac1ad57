/// TMDB (The Movie Database) metadata provider
///
/// Fetches `/movie/{id}` documents using an API key supplied through
/// configuration. Successful documents are optionally cached in Redis.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde_json::Value;

use crate::{
    cached,
    config::Config,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    services::providers::MetadataProvider,
};

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    cache: Option<Cache>,
    cache_ttl: u64,
}

impl TmdbProvider {
    /// Creates a provider whose requests time out after `timeout`
    pub fn new(
        api_key: String,
        api_url: String,
        language: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
            cache: None,
            cache_ttl: 0,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_language.clone(),
            config.metadata_timeout(),
        )
    }

    /// Enables read-through caching of movie documents
    pub fn with_cache(mut self, cache: Cache, ttl: u64) -> Self {
        self.cache = Some(cache);
        self.cache_ttl = ttl;
        self
    }

    async fn request_movie(&self, movie_id: u64) -> AppResult<Value> {
        let url = format!("{}/movie/{}", self.api_url, movie_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", self.language.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {} for movie {}: {}",
                status, movie_id, body
            )));
        }

        let document: Value = response.json().await?;

        tracing::debug!(movie_id, provider = "tmdb", "Movie document fetched");

        Ok(document)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn fetch_movie(&self, movie_id: u64) -> AppResult<Value> {
        cached!(
            self.cache.as_ref(),
            CacheKey::MovieDetails {
                id: movie_id,
                language: self.language.clone(),
            },
            self.cache_ttl,
            self.request_movie(movie_id)
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer, timeout: Duration) -> TmdbProvider {
        TmdbProvider::new(
            "test_key".to_string(),
            server.uri(),
            "en-US".to_string(),
            timeout,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_movie_sends_key_and_language() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .and(query_param("api_key", "test_key"))
            .and(query_param("language", "en-US"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 603,
                "title": "The Matrix",
                "runtime": 136
            })))
            .expect(1)
            .mount(&server)
            .await;

        let document = provider(&server, Duration::from_secs(5))
            .fetch_movie(603)
            .await
            .unwrap();

        assert_eq!(document["runtime"], 136);
    }

    #[tokio::test]
    async fn test_fetch_movie_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/1"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let result = provider(&server, Duration::from_secs(5)).fetch_movie(1).await;

        assert!(matches!(result, Err(AppError::ExternalApi(msg)) if msg.contains("401")));
    }

    #[tokio::test]
    async fn test_fetch_movie_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = provider(&server, Duration::from_secs(5)).fetch_movie(2).await;

        assert!(matches!(result, Err(AppError::HttpClient(_))));
    }

    #[tokio::test]
    async fn test_fetch_movie_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/3"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let result = provider(&server, Duration::from_millis(50)).fetch_movie(3).await;

        assert!(matches!(result, Err(AppError::HttpClient(e)) if e.is_timeout()));
    }

    #[test]
    fn test_trailing_slash_trimmed_from_api_url() {
        let provider = TmdbProvider::new(
            "k".to_string(),
            "https://api.themoviedb.org/3/".to_string(),
            "en-US".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();

        assert_eq!(provider.api_url, "https://api.themoviedb.org/3");
        assert_eq!(provider.name(), "tmdb");
    }
}

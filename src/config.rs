use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::services::download::RetryPolicy;

pub const CATALOG_FILE: &str = "movie_dict.json";
pub const SIMILARITY_FILE: &str = "similarity.bin";

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API key. Must be supplied externally.
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Base URL poster paths are joined onto
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// Per-call timeout for metadata lookups
    #[serde(default = "default_metadata_timeout_secs")]
    pub metadata_timeout_secs: u64,

    /// Redis connection URL. Metadata caching is disabled when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_metadata_cache_ttl")]
    pub metadata_cache_ttl: u64,

    /// Local candidates for the catalog artifact, first non-empty file wins
    #[serde(default = "default_catalog_paths")]
    pub catalog_paths: Vec<String>,

    /// Local candidates for the similarity artifact, first non-empty file wins
    #[serde(default = "default_similarity_paths")]
    pub similarity_paths: Vec<String>,

    /// Base URL both artifacts can be downloaded from
    #[serde(default)]
    pub artifact_base_url: Option<String>,

    #[serde(default)]
    pub catalog_url: Option<String>,

    #[serde(default)]
    pub similarity_url: Option<String>,

    /// Directory downloaded artifacts are cached in
    #[serde(default)]
    pub cache_dir: Option<String>,

    #[serde(default = "default_download_retries")]
    pub download_retries: u32,

    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,

    #[serde(default = "default_download_backoff_ms")]
    pub download_backoff_ms: u64,

    /// Refuse to start when two catalog entries share a title
    #[serde(default)]
    pub reject_duplicate_titles: bool,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_metadata_timeout_secs() -> u64 {
    10
}

fn default_metadata_cache_ttl() -> u64 {
    86400 // 1 day
}

fn default_catalog_paths() -> Vec<String> {
    vec![format!("data/{}", CATALOG_FILE), CATALOG_FILE.to_string()]
}

fn default_similarity_paths() -> Vec<String> {
    vec![format!("data/{}", SIMILARITY_FILE), SIMILARITY_FILE.to_string()]
}

fn default_download_retries() -> u32 {
    3
}

fn default_download_timeout_secs() -> u64 {
    20
}

fn default_download_backoff_ms() -> u64 {
    1000
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Remote location of the catalog artifact, if one is configured
    pub fn catalog_url(&self) -> Option<String> {
        self.artifact_url(&self.catalog_url, CATALOG_FILE)
    }

    /// Remote location of the similarity artifact, if one is configured
    pub fn similarity_url(&self) -> Option<String> {
        self.artifact_url(&self.similarity_url, SIMILARITY_FILE)
    }

    fn artifact_url(&self, explicit: &Option<String>, file_name: &str) -> Option<String> {
        explicit.clone().or_else(|| {
            self.artifact_base_url
                .as_ref()
                .map(|base| format!("{}/{}", base.trim_end_matches('/'), file_name))
        })
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("movie_reco_cache"))
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_secs(self.metadata_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.download_retries.max(1),
            timeout: Duration::from_secs(self.download_timeout_secs),
            base_delay: Duration::from_millis(self.download_backoff_ms),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Config {
        envy::from_iter::<_, Config>(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[("TMDB_API_KEY", "secret")]);

        assert_eq!(config.tmdb_api_key, "secret");
        assert_eq!(config.tmdb_api_url, "https://api.themoviedb.org/3");
        assert_eq!(config.metadata_timeout(), Duration::from_secs(10));
        assert_eq!(config.download_retries, 3);
        assert!(config.redis_url.is_none());
        assert!(!config.reject_duplicate_titles);
        assert_eq!(config.catalog_paths, vec!["data/movie_dict.json", "movie_dict.json"]);
        assert_eq!(config.catalog_url(), None);
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let result = envy::from_iter::<_, Config>(Vec::<(String, String)>::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_comma_separated_paths() {
        let config = from_pairs(&[
            ("TMDB_API_KEY", "secret"),
            ("SIMILARITY_PATHS", "/srv/similarity.bin,similarity.bin"),
        ]);

        assert_eq!(
            config.similarity_paths,
            vec!["/srv/similarity.bin", "similarity.bin"]
        );
    }

    #[test]
    fn test_artifact_urls_derive_from_base() {
        let config = from_pairs(&[
            ("TMDB_API_KEY", "secret"),
            ("ARTIFACT_BASE_URL", "https://example.com/releases/"),
            ("SIMILARITY_URL", "https://mirror.example.com/sim.bin"),
        ]);

        assert_eq!(
            config.catalog_url().as_deref(),
            Some("https://example.com/releases/movie_dict.json")
        );
        assert_eq!(
            config.similarity_url().as_deref(),
            Some("https://mirror.example.com/sim.bin")
        );
    }

    #[test]
    fn test_retry_policy_has_at_least_one_attempt() {
        let config = from_pairs(&[("TMDB_API_KEY", "secret"), ("DOWNLOAD_RETRIES", "0")]);
        assert_eq!(config.retry_policy().attempts, 1);
    }
}

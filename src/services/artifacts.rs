use std::path::{Path, PathBuf};

use reqwest::Client as HttpClient;

use crate::{
    config::{Config, CATALOG_FILE, SIMILARITY_FILE},
    error::{AppError, AppResult},
    models::{Catalog, DuplicateTitles, SimilarityMatrix},
    services::{
        download::{fetch_with_retry, first_existing, RetryPolicy},
        recommender::RecommendationIndex,
    },
};

/// Where one artifact may be found
#[derive(Debug, Clone)]
pub struct ArtifactSource {
    /// Local candidates, checked in order
    pub candidates: Vec<PathBuf>,
    /// Remote fallback
    pub url: Option<String>,
    /// File name used inside the download cache directory
    pub cache_name: String,
}

impl ArtifactSource {
    /// Finds the artifact locally, downloading it into `cache_dir` as a last resort
    pub async fn locate(
        &self,
        client: &HttpClient,
        cache_dir: &Path,
        policy: RetryPolicy,
    ) -> AppResult<PathBuf> {
        if let Some(path) = first_existing(&self.candidates) {
            tracing::info!(path = %path.display(), "Found local artifact");
            return Ok(path);
        }

        let url = self.url.as_deref().ok_or_else(|| {
            AppError::DataUnavailable(format!(
                "{} not found in {:?} and no download URL is configured",
                self.cache_name, self.candidates
            ))
        })?;

        tracing::info!(url, artifact = %self.cache_name, "Artifact not found locally, downloading");
        fetch_with_retry(client, url, &cache_dir.join(&self.cache_name), policy).await
    }
}

/// Everything needed to load the recommendation index
#[derive(Debug, Clone)]
pub struct ArtifactPlan {
    pub catalog: ArtifactSource,
    pub similarity: ArtifactSource,
    pub cache_dir: PathBuf,
    pub policy: RetryPolicy,
    pub duplicates: DuplicateTitles,
}

impl ArtifactPlan {
    pub fn from_config(config: &Config) -> Self {
        Self {
            catalog: ArtifactSource {
                candidates: config.catalog_paths.iter().map(PathBuf::from).collect(),
                url: config.catalog_url(),
                cache_name: CATALOG_FILE.to_string(),
            },
            similarity: ArtifactSource {
                candidates: config.similarity_paths.iter().map(PathBuf::from).collect(),
                url: config.similarity_url(),
                cache_name: SIMILARITY_FILE.to_string(),
            },
            cache_dir: config.cache_dir(),
            policy: config.retry_policy(),
            duplicates: if config.reject_duplicate_titles {
                DuplicateTitles::Reject
            } else {
                DuplicateTitles::FirstWins
            },
        }
    }
}

/// Locates, reads and validates both artifacts
///
/// Any failure here is fatal: the service must not start without its data.
pub async fn load_index(client: &HttpClient, plan: &ArtifactPlan) -> AppResult<RecommendationIndex> {
    let catalog_path = plan
        .catalog
        .locate(client, &plan.cache_dir, plan.policy)
        .await?;
    let similarity_path = plan
        .similarity
        .locate(client, &plan.cache_dir, plan.policy)
        .await?;

    let catalog = read_catalog(&catalog_path, plan.duplicates).await?;
    let similarity = read_similarity(&similarity_path).await?;
    let index = RecommendationIndex::new(catalog, similarity)?;

    tracing::info!(
        catalog = %catalog_path.display(),
        similarity = %similarity_path.display(),
        items = index.catalog().len(),
        "Recommendation index loaded"
    );

    Ok(index)
}

pub async fn read_catalog(path: &Path, duplicates: DuplicateTitles) -> AppResult<Catalog> {
    let bytes = tokio::fs::read(path).await?;
    Catalog::from_json(&bytes, duplicates)
        .map_err(|e| with_path(e, path))
}

pub async fn read_similarity(path: &Path) -> AppResult<SimilarityMatrix> {
    let bytes = tokio::fs::read(path).await?;
    SimilarityMatrix::from_bytes(&bytes).map_err(|e| with_path(e, path))
}

pub async fn write_catalog(path: &Path, catalog: &Catalog) -> AppResult<()> {
    tokio::fs::write(path, catalog.to_json()?).await?;
    Ok(())
}

pub async fn write_similarity(path: &Path, matrix: &SimilarityMatrix) -> AppResult<()> {
    tokio::fs::write(path, matrix.to_bytes()?).await?;
    Ok(())
}

/// Builds serving artifacts from exported sources
///
/// Reads a catalog in either JSON layout and a similarity matrix as JSON rows,
/// checks that they agree, then writes `movie_dict.json` (row layout) and
/// `similarity.bin` into `out_dir`.
pub async fn convert(
    catalog_source: &Path,
    matrix_source: &Path,
    out_dir: &Path,
    duplicates: DuplicateTitles,
) -> AppResult<RecommendationIndex> {
    let catalog = read_catalog(catalog_source, duplicates).await?;
    let bytes = tokio::fs::read(matrix_source).await?;
    let similarity =
        SimilarityMatrix::from_json(&bytes).map_err(|e| with_path(e, matrix_source))?;
    let index = RecommendationIndex::new(catalog, similarity)?;

    tokio::fs::create_dir_all(out_dir).await?;
    write_catalog(&out_dir.join(CATALOG_FILE), index.catalog()).await?;
    write_similarity(&out_dir.join(SIMILARITY_FILE), index.similarity()).await?;

    tracing::info!(
        out_dir = %out_dir.display(),
        items = index.catalog().len(),
        "Artifacts written"
    );

    Ok(index)
}

fn with_path(error: AppError, path: &Path) -> AppError {
    match error {
        AppError::InvalidData(msg) => AppError::InvalidData(format!("{}: {}", path.display(), msg)),
        other => other,
    }
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::error::{AppError, AppResult};

/// Bounds for `fetch_with_retry`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, at least one
    pub attempts: u32,
    /// Timeout for a single attempt
    pub timeout: Duration,
    /// Backoff unit; failed attempt `n` (1-based) waits `base_delay * 2^n`
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Backoff before retrying after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Returns the first path that exists and is non-empty
pub fn first_existing<P: AsRef<Path>>(paths: &[P]) -> Option<PathBuf> {
    paths
        .iter()
        .map(|p| p.as_ref())
        .find(|p| is_non_empty_file(p))
        .map(Path::to_path_buf)
}

fn is_non_empty_file(path: &Path) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

/// Downloads `url` to `dest` unless a non-empty file is already there
///
/// The body is written to `dest` with a `.part` suffix and renamed into place,
/// so an interrupted download never leaves a truncated file at `dest`.
pub async fn fetch_with_retry(
    client: &HttpClient,
    url: &str,
    dest: &Path,
    policy: RetryPolicy,
) -> AppResult<PathBuf> {
    if is_non_empty_file(dest) {
        tracing::debug!(path = %dest.display(), "Using cached download");
        return Ok(dest.to_path_buf());
    }

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let attempts = policy.attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match download_once(client, url, dest, policy.timeout).await {
            Ok(bytes) => {
                tracing::info!(url, path = %dest.display(), bytes, attempt, "Download completed");
                return Ok(dest.to_path_buf());
            }
            Err(e) => {
                tracing::warn!(url, attempt, attempts, error = %e, "Download attempt failed");
                last_error = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(policy.delay_after(attempt)).await;
                }
            }
        }
    }

    let reason = last_error.map(|e| e.to_string()).unwrap_or_default();
    Err(AppError::DataUnavailable(format!(
        "Failed to download {} from {}: {}",
        dest.display(),
        url,
        reason
    )))
}

async fn download_once(
    client: &HttpClient,
    url: &str,
    dest: &Path,
    timeout: Duration,
) -> AppResult<usize> {
    let response = client.get(url).timeout(timeout).send().await?;

    if !response.status().is_success() {
        return Err(AppError::ExternalApi(format!(
            "{} returned status {}",
            url,
            response.status()
        )));
    }

    let body = response.bytes().await?;
    if body.is_empty() {
        return Err(AppError::ExternalApi(format!("{} returned an empty body", url)));
    }

    let mut part = dest.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    tokio::fs::write(&part, &body).await?;
    tokio::fs::rename(&part, dest).await?;

    Ok(body.len())
}

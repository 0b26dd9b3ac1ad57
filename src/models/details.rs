use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Item;

pub const PLACEHOLDER_POSTER_URL: &str = "https://via.placeholder.com/500x750?text=No+Poster";
pub const OVERVIEW_UNAVAILABLE: &str = "Description unavailable.";

/// Display metadata for a movie
///
/// Every field degrades to its own default, so a partial TMDB document still
/// yields whatever it does carry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieDetails {
    pub poster_url: String,
    pub overview: String,
    pub rating: Option<f64>,
    pub year: Option<String>,
    pub genres: Vec<String>,
    pub runtime: Option<u32>,
}

impl Default for MovieDetails {
    fn default() -> Self {
        Self {
            poster_url: PLACEHOLDER_POSTER_URL.to_string(),
            overview: OVERVIEW_UNAVAILABLE.to_string(),
            rating: None,
            year: None,
            genres: Vec::new(),
            runtime: None,
        }
    }
}

impl MovieDetails {
    /// Extracts details from a TMDB `/movie/{id}` document
    pub fn from_document(document: &Value, image_base_url: &str) -> Self {
        let defaults = Self::default();

        Self {
            poster_url: poster_url(document, image_base_url).unwrap_or(defaults.poster_url),
            overview: overview(document).unwrap_or(defaults.overview),
            rating: rating(document),
            year: year(document),
            genres: genres(document),
            runtime: runtime(document),
        }
    }
}

fn poster_url(document: &Value, image_base_url: &str) -> Option<String> {
    let path = document.get("poster_path")?.as_str()?.trim();
    if path.is_empty() {
        return None;
    }
    Some(format!(
        "{}/{}",
        image_base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
}

fn overview(document: &Value) -> Option<String> {
    let text = document.get("overview")?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_string())
}

fn rating(document: &Value) -> Option<f64> {
    let vote = document.get("vote_average")?.as_f64()?;
    if !vote.is_finite() {
        return None;
    }
    // Decimal formatting rounds the exact binary value, ties to even
    format!("{:.1}", vote).parse().ok()
}

fn year(document: &Value) -> Option<String> {
    let date = document.get("release_date")?.as_str()?;
    let year: String = date.chars().take(4).collect();
    (year.chars().count() == 4).then_some(year)
}

fn genres(document: &Value) -> Vec<String> {
    document
        .get("genres")
        .and_then(Value::as_array)
        .map(|records| {
            records
                .iter()
                .filter_map(|record| record.get("name")?.as_str())
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn runtime(document: &Value) -> Option<u32> {
    let minutes = document.get("runtime")?.as_u64()?;
    u32::try_from(minutes).ok().filter(|m| *m > 0)
}

/// A recommended movie with its resolved display metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendedMovie {
    pub id: u64,
    pub title: String,
    #[serde(flatten)]
    pub details: MovieDetails,
}

impl RecommendedMovie {
    pub fn new(item: &Item, details: MovieDetails) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            details,
        }
    }
}

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Form, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Item, RecommendedMovie},
    services::recommendations::{self, Selection},
};

use super::AppState;

const DEFAULT_TITLE_LIMIT: usize = 50;
const MAX_TITLE_LIMIT: usize = 500;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct TitleQuery {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default, alias = "movie_name")]
    pub title: Option<String>,
    #[serde(default)]
    pub movie_id: Option<u64>,
}

impl RecommendationRequest {
    /// An explicit id wins over a title, since titles may collide
    fn selection(self) -> AppResult<Selection> {
        match (self.movie_id, self.title) {
            (Some(id), _) => Ok(Selection::MovieId(id)),
            (None, Some(title)) if !title.trim().is_empty() => Ok(Selection::Title(title)),
            (None, Some(_)) => Err(AppError::InvalidInput("Title cannot be empty".to_string())),
            (None, None) => Err(AppError::InvalidInput(
                "Either title or movie_id is required".to_string(),
            )),
        }
    }
}

/// Form posted by the title selector
#[derive(Debug, Deserialize)]
pub struct RecommendationForm {
    pub movie_name: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub selected: Item,
    pub recommendations: Vec<RecommendedMovie>,
}

// Handlers

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "catalog_size": state.index.catalog().len()
        })),
    )
}

/// Catalog titles for the selector, optionally filtered by substring
pub async fn list_titles(
    State(state): State<AppState>,
    Query(params): Query<TitleQuery>,
) -> Json<Vec<Item>> {
    let catalog = state.index.catalog();
    let titles = match params.q {
        Some(q) => {
            let limit = params.limit.unwrap_or(DEFAULT_TITLE_LIMIT).min(MAX_TITLE_LIMIT);
            catalog.search(&q, limit).into_iter().cloned().collect()
        }
        None => {
            let limit = params.limit.unwrap_or(catalog.len());
            catalog.items().iter().take(limit).cloned().collect()
        }
    };
    Json(titles)
}

/// Recommendations for a title or movie id (JSON body)
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let selection = request.selection()?;
    respond(&state, &request_id, selection).await
}

/// Recommendations for the title posted by the selector form
pub async fn recommend_form(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Form(form): Form<RecommendationForm>,
) -> AppResult<Json<RecommendationResponse>> {
    if form.movie_name.trim().is_empty() {
        return Err(AppError::InvalidInput("movie_name cannot be empty".to_string()));
    }
    respond(&state, &request_id, Selection::Title(form.movie_name)).await
}

async fn respond(
    state: &AppState,
    request_id: &RequestId,
    selection: Selection,
) -> AppResult<Json<RecommendationResponse>> {
    tracing::info!(
        request_id = %request_id,
        selection = ?selection,
        "Processing recommendation request"
    );

    let (selected, recommendations) =
        recommendations::get_recommendations(&state.index, &state.metadata, &selection).await?;

    tracing::info!(
        request_id = %request_id,
        selected = %selected.title,
        count = recommendations.len(),
        "Recommendations completed"
    );

    Ok(Json(RecommendationResponse {
        selected,
        recommendations,
    }))
}

//! Article handlers

use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use linkforge_common::errors::Result;
use linkforge_engine::Suggestion;
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize)]
pub struct SuggestionsResponse {
    pub article_id: Uuid,
    pub suggestions: Vec<Suggestion>,
}

/// New internal link proposals; unknown articles get an empty list
pub async fn suggestions(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
) -> Result<Json<SuggestionsResponse>> {
    let suggestions = state.engine.suggest_links(article_id).await?;
    Ok(Json(SuggestionsResponse {
        article_id,
        suggestions,
    }))
}

//! Platform-wide handlers: balance, authority, repair

use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use linkforge_common::domain::StatusScope;
use linkforge_common::errors::Result;
use linkforge_engine::authority::ArticleAuthority;
use linkforge_engine::{BalanceReport, RepairResult, RunContext};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct BalanceQuery {
    pub language: Option<String>,
    /// Defaults to the configured scope
    pub scope: Option<StatusScope>,
}

/// Balance report for a platform
pub async fn balance(
    State(state): State<AppState>,
    Path(platform_id): Path<Uuid>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceReport>> {
    let scope = query
        .scope
        .unwrap_or(state.config.engine.balance.status_scope);

    let report = state
        .engine
        .analyze_with(platform_id, query.language.as_deref(), scope, &RunContext::new())
        .await?;

    Ok(Json(report))
}

#[derive(Debug, Default, Deserialize)]
pub struct AuthorityQuery {
    /// Only the top N articles
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct AuthorityResponse {
    pub platform_id: Uuid,
    pub iterations: usize,
    pub converged: bool,
    pub computed_at: DateTime<Utc>,
    pub total_articles: usize,
    pub articles: Vec<ArticleAuthority>,
}

/// Authority scores in rank order
pub async fn authority(
    State(state): State<AppState>,
    Path(platform_id): Path<Uuid>,
    Query(query): Query<AuthorityQuery>,
) -> Result<Json<AuthorityResponse>> {
    let scores = state.engine.compute_authority(platform_id).await?;
    let limit = query.limit.unwrap_or(scores.len());

    Ok(Json(AuthorityResponse {
        platform_id,
        iterations: scores.iterations,
        converged: scores.converged,
        computed_at: scores.computed_at,
        total_articles: scores.len(),
        articles: scores.top(limit).to_vec(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct RepairRequest {
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,
}

fn default_dry_run() -> bool {
    true
}

/// Plan, and unless `dry_run`, apply repairs
pub async fn repair(
    State(state): State<AppState>,
    Path(platform_id): Path<Uuid>,
    Json(request): Json<RepairRequest>,
) -> Result<Json<RepairResult>> {
    let result = state.engine.repair(platform_id, request.dry_run).await?;
    Ok(Json(result))
}

//! External link handlers

use crate::AppState;
use axum::{extract::State, Json};
use linkforge_common::domain::{ExternalLinkFilter, VerificationScope};
use linkforge_common::errors::Result;
use linkforge_engine::{VerificationSummary, VerifyRequest};
use serde::Deserialize;
use uuid::Uuid;

/// Verification pass request
#[derive(Debug, Default, Deserialize)]
pub struct VerifyLinksRequest {
    pub platform_id: Option<Uuid>,
    #[serde(default)]
    pub scope: VerificationScope,
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub only_broken: bool,
    pub limit: Option<usize>,
}

impl From<VerifyLinksRequest> for VerifyRequest {
    fn from(request: VerifyLinksRequest) -> Self {
        VerifyRequest {
            filter: ExternalLinkFilter {
                platform_id: request.platform_id,
                scope: request.scope,
                limit: request.limit,
            },
            concurrency: request.concurrency,
            only_broken: request.only_broken,
        }
    }
}

/// Check external links and store the verdicts
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyLinksRequest>,
) -> Result<Json<VerificationSummary>> {
    let summary = state.engine.verify_links(&request.into()).await?;
    Ok(Json(summary))
}

//! Link balance analysis
//!
//! Read-only structural health checks over a link graph snapshot:
//! inbound/outbound distributions, an imbalance ratio with bands,
//! orphan and dead-end defects, and ranked remediation advice.

mod analyzer;
mod stats;

pub use analyzer::BalanceAnalyzer;
pub use stats::DistributionStats;

use chrono::{DateTime, Utc};
use linkforge_common::domain::{ContentType, StatusScope};
use serde::Serialize;
use uuid::Uuid;

/// Imbalance band of the inbound distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImbalanceBand {
    Good,
    Warning,
    Poor,
}

/// Severity of a defect or recommendation, ordered low to critical
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    /// No inbound internal links
    Orphan,
    /// No outbound internal links
    DeadEnd,
}

impl DefectKind {
    /// Severity of this defect on an article of the given type
    pub fn severity_for(&self, content_type: ContentType) -> Severity {
        match (self, content_type) {
            (DefectKind::Orphan, ContentType::Pillar) => Severity::Critical,
            (DefectKind::Orphan, ContentType::Landing) => Severity::High,
            (DefectKind::Orphan, ContentType::Satellite) => Severity::Medium,
            (DefectKind::Orphan, ContentType::Standard) => Severity::Low,
            (DefectKind::DeadEnd, ContentType::Pillar) => Severity::High,
            (DefectKind::DeadEnd, ContentType::Landing | ContentType::Satellite) => Severity::Medium,
            (DefectKind::DeadEnd, ContentType::Standard) => Severity::Low,
        }
    }
}

/// A structural defect on one article
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Defect {
    pub article_id: Uuid,
    pub title: String,
    pub content_type: ContentType,
    pub kind: DefectKind,
    pub severity: Severity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    LinkOrphans,
    AddOutboundLinks,
    LinkSatellitesToPillar,
    SpreadConcentratedInbound,
    Rebalance,
}

/// One remediation suggestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub severity: Severity,
    /// Human-readable action
    pub action: String,
    pub article_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceSummary {
    /// Articles in the snapshot
    pub total_articles: usize,
    /// Articles passing the language and status filters
    pub considered_articles: usize,
    pub total_links: usize,
    pub orphans: usize,
    pub dead_ends: usize,
    pub imbalance_ratio: f64,
    pub band: ImbalanceBand,
}

/// Structured result of one balance analysis
#[derive(Debug, Clone, Serialize)]
pub struct BalanceReport {
    pub platform_id: Uuid,
    pub language: Option<String>,
    pub scope: StatusScope,
    pub generated_at: DateTime<Utc>,
    pub summary: BalanceSummary,
    pub inbound: DistributionStats,
    pub outbound: DistributionStats,
    /// Most severe first
    pub orphans: Vec<Defect>,
    /// Most severe first
    pub dead_ends: Vec<Defect>,
    /// Most severe first
    pub recommendations: Vec<Recommendation>,
}

impl BalanceReport {
    /// True when no defect or recommendation was raised
    pub fn is_healthy(&self) -> bool {
        self.orphans.is_empty() && self.dead_ends.is_empty() && self.recommendations.is_empty()
    }
}

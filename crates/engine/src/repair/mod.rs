//! Automated link repair
//!
//! Provides:
//! - Planning of corrective actions for orphans, dead-ends and broken
//!   external links
//! - Dry-run reporting from the same plan
//! - Idempotent, per-article serialised application of the plan

mod locks;
mod orchestrator;
mod planner;

pub use locks::ArticleLocks;
pub use orchestrator::{RepairInput, RepairOrchestrator};
pub use planner::{RepairPlan, RepairPlanner};

use serde::Serialize;
use uuid::Uuid;

/// Defect a repair action addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairActionKind {
    /// New inbound link to an orphan
    LinkOrphan,
    /// New outbound links from a dead-end
    ExtendDeadEnd,
    /// Reroute a broken external link
    ReplaceExternalLink,
}

impl RepairActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairActionKind::LinkOrphan => "link_orphan",
            RepairActionKind::ExtendDeadEnd => "extend_dead_end",
            RepairActionKind::ReplaceExternalLink => "replace_external_link",
        }
    }
}

/// Mutation an action performs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDetail {
    InternalLink {
        source_article_id: Uuid,
        target_article_id: Uuid,
        anchor_text: String,
        similarity: f64,
    },
    ExternalLink {
        link_id: Uuid,
        old_url: String,
        new_url: String,
        domain: String,
        trust_score: u8,
    },
}

/// One planned corrective action
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairAction {
    pub kind: RepairActionKind,
    /// Article carrying the defect
    pub article_id: Uuid,
    pub detail: ActionDetail,
}

impl RepairAction {
    /// Article whose links the action writes; writes are serialised per key
    pub fn write_key(&self) -> Uuid {
        match &self.detail {
            ActionDetail::InternalLink { source_article_id, .. } => *source_article_id,
            ActionDetail::ExternalLink { .. } => self.article_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Dry run: would be applied
    Planned,
    Applied,
    /// The edge already existed at write time
    Duplicate,
    Failed,
    /// The run was cancelled before this action
    Cancelled,
}

impl ActionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionOutcome::Planned => "planned",
            ActionOutcome::Applied => "applied",
            ActionOutcome::Duplicate => "duplicate",
            ActionOutcome::Failed => "failed",
            ActionOutcome::Cancelled => "cancelled",
        }
    }

    /// Whether the defect is (or would be) resolved by this action
    pub fn resolves(&self) -> bool {
        matches!(
            self,
            ActionOutcome::Planned | ActionOutcome::Applied | ActionOutcome::Duplicate
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionReport {
    pub action: RepairAction,
    pub outcome: ActionOutcome,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotRepairableReason {
    /// No article qualifies as a source for the orphan
    NoSourceCandidate,
    /// The suggester had nothing for the dead-end
    NoSuggestions,
    /// No active registry entry matches topic, country and trust
    NoReplacementDomain,
}

/// A defect left as is
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotRepairable {
    pub kind: RepairActionKind,
    pub article_id: Uuid,
    /// Set for broken external links
    pub link_id: Option<Uuid>,
    pub reason: NotRepairableReason,
}

/// Found/fixed counts for one defect kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DefectCounts {
    pub found: usize,
    pub fixed: usize,
}

/// Aggregate of one repair run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepairResult {
    pub platform_id: Uuid,
    pub dry_run: bool,
    pub orphans: DefectCounts,
    pub dead_ends: DefectCounts,
    pub broken_links: DefectCounts,
    /// Plan order
    pub actions: Vec<ActionReport>,
    pub not_repairable: Vec<NotRepairable>,
    /// Articles with at least one resolving action, sorted
    pub repairable_articles: Vec<Uuid>,
    pub applied: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub elapsed_ms: u64,
}

impl RepairResult {
    /// The planned actions without outcomes
    pub fn action_set(&self) -> Vec<&RepairAction> {
        self.actions.iter().map(|r| &r.action).collect()
    }
}

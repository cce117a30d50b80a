//! LinkForge Engine
//!
//! Link graph intelligence over one platform's articles:
//! - Authority propagation (PageRank) with a fingerprint-keyed cache
//! - Inbound/outbound balance analysis with orphan and dead-end detection
//! - TF-IDF internal link suggestions with pillar and quota rules
//! - External link verification with bounded concurrency and retries
//! - Dry-run capable, idempotent repair of the defects found
//!
//! [`LinkEngine`] is the entry point; the component types are public for
//! callers that hold their own snapshots.

pub mod authority;
pub mod balance;
pub mod engine;
pub mod graph;
pub mod registry;
pub mod repair;
pub mod run;
pub mod similarity;
pub mod verifier;

pub use authority::{AuthorityScores, PageRankScorer};
pub use balance::{BalanceAnalyzer, BalanceReport};
pub use engine::LinkEngine;
pub use graph::LinkGraph;
pub use registry::{AuthorityDomainRegistry, DomainQuery, InMemoryDomainRegistry};
pub use repair::{RepairOrchestrator, RepairResult};
pub use run::{Progress, RunContext};
pub use similarity::{SimilaritySuggester, Suggestion};
pub use verifier::{LinkProber, LinkVerifier, VerificationSummary, VerifyRequest};

//! Authority propagation over the internal link graph
//!
//! Provides:
//! - Power-iteration PageRank with dangling-node redistribution
//! - 0-100 presentation scores and a deterministic rank order
//! - A per-platform cache keyed by the snapshot fingerprint

mod cache;
mod pagerank;

pub use cache::AuthorityCache;
pub use pagerank::{PageRankConfig, PageRankScorer};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Authority of one article
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleAuthority {
    pub article_id: Uuid,

    /// Share of the total mass; all raw scores sum to 1
    pub raw: f64,

    /// Linear rescale against the graph maximum, 0-100
    pub score: f64,

    /// 1-based position in the rank order
    pub rank: usize,

    pub inbound: usize,
    pub outbound: usize,
}

/// Result of one authority computation
#[derive(Debug, Clone, Serialize)]
pub struct AuthorityScores {
    pub platform_id: Uuid,

    /// Fingerprint of the snapshot the scores were computed from
    pub fingerprint: String,

    pub iterations: usize,

    /// False when the iteration cap was hit first
    pub converged: bool,

    pub computed_at: DateTime<Utc>,

    /// Ordered by rank
    pub articles: Vec<ArticleAuthority>,

    #[serde(skip)]
    index: HashMap<Uuid, usize>,
}

impl AuthorityScores {
    pub(crate) fn new(
        platform_id: Uuid,
        fingerprint: String,
        iterations: usize,
        converged: bool,
        articles: Vec<ArticleAuthority>,
    ) -> Self {
        let index = articles
            .iter()
            .enumerate()
            .map(|(i, a)| (a.article_id, i))
            .collect();

        Self {
            platform_id,
            fingerprint,
            iterations,
            converged,
            computed_at: Utc::now(),
            articles,
            index,
        }
    }

    /// Empty result for a graph without nodes
    pub(crate) fn empty(platform_id: Uuid, fingerprint: String) -> Self {
        Self::new(platform_id, fingerprint, 0, true, Vec::new())
    }

    pub fn get(&self, article_id: Uuid) -> Option<&ArticleAuthority> {
        self.index.get(&article_id).map(|&i| &self.articles[i])
    }

    /// Raw score, 0.0 for unknown articles
    pub fn raw(&self, article_id: Uuid) -> f64 {
        self.get(article_id).map(|a| a.raw).unwrap_or(0.0)
    }

    /// Presentation score, 0.0 for unknown articles
    pub fn score(&self, article_id: Uuid) -> f64 {
        self.get(article_id).map(|a| a.score).unwrap_or(0.0)
    }

    pub fn total_mass(&self) -> f64 {
        self.articles.iter().map(|a| a.raw).sum()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Article id to presentation score
    pub fn scores(&self) -> HashMap<Uuid, f64> {
        self.articles.iter().map(|a| (a.article_id, a.score)).collect()
    }

    /// Highest ranked articles
    pub fn top(&self, limit: usize) -> &[ArticleAuthority] {
        &self.articles[..limit.min(self.articles.len())]
    }
}

//! Authority domain registry
//!
//! Read-only lookup of curated external domains used as replacement targets
//! for broken external links.

use async_trait::async_trait;
use linkforge_common::db::GraphRepository;
use linkforge_common::domain::DomainEntry;
use linkforge_common::errors::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lookup criteria for a replacement domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainQuery {
    pub topic: Option<String>,
    /// Country code; global entries always qualify
    pub country: Option<String>,
    pub min_trust: u8,
    /// Domain that must not be returned (the broken one)
    pub exclude_domain: Option<String>,
}

#[async_trait]
pub trait AuthorityDomainRegistry: Send + Sync {
    /// Highest-trust active entry matching the query
    async fn lookup_best_match(&self, query: &DomainQuery) -> Result<Option<DomainEntry>>;
}

/// Registry holding all entries in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryDomainRegistry {
    entries: Vec<DomainEntry>,
}

impl InMemoryDomainRegistry {
    pub fn new(entries: Vec<DomainEntry>) -> Self {
        Self { entries }
    }

    /// Load the registry from the repository's authority domain table
    pub async fn load(repo: &dyn GraphRepository) -> Result<Self> {
        let entries = repo.load_authority_domains().await?;
        debug!(count = entries.len(), "Authority domains loaded");
        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every qualifying entry, best first
    pub fn candidates(&self, query: &DomainQuery) -> Vec<&DomainEntry> {
        let mut matches: Vec<&DomainEntry> = self
            .entries
            .iter()
            .filter(|e| e.is_active && e.trust_score >= query.min_trust)
            .filter(|e| match &query.exclude_domain {
                Some(excluded) => !same_domain(&e.domain, excluded),
                None => true,
            })
            .filter(|e| match &query.topic {
                Some(topic) => e.topics.iter().any(|t| t.eq_ignore_ascii_case(topic)),
                None => true,
            })
            .filter(|e| match &query.country {
                Some(country) => {
                    e.countries.is_empty() || e.countries.iter().any(|c| c.eq_ignore_ascii_case(country))
                }
                None => true,
            })
            .collect();

        // Trust desc, country-specific before global, then domain name
        matches.sort_by(|a, b| {
            b.trust_score
                .cmp(&a.trust_score)
                .then_with(|| specificity(b, query).cmp(&specificity(a, query)))
                .then_with(|| a.domain.cmp(&b.domain))
        });
        matches
    }
}

#[async_trait]
impl AuthorityDomainRegistry for InMemoryDomainRegistry {
    async fn lookup_best_match(&self, query: &DomainQuery) -> Result<Option<DomainEntry>> {
        Ok(self.candidates(query).first().map(|e| (*e).clone()))
    }
}

/// 1 when the entry is tagged with the queried country
fn specificity(entry: &DomainEntry, query: &DomainQuery) -> u8 {
    match &query.country {
        Some(country) if entry.countries.iter().any(|c| c.eq_ignore_ascii_case(country)) => 1,
        _ => 0,
    }
}

fn same_domain(a: &str, b: &str) -> bool {
    a.trim_start_matches("www.")
        .eq_ignore_ascii_case(b.trim_start_matches("www."))
}

//! In-memory graph repository
//!
//! Holds a whole platform graph behind one async lock. Used by the test
//! suites and for local dry runs against exported data.

use crate::db::{check_internal_link, GraphRepository};
use crate::domain::{
    Article, DomainEntry, ExternalLink, ExternalLinkFilter, InternalLink, Platform, UpsertOutcome,
};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Initial content of an in-memory repository
#[derive(Debug, Clone, Default)]
pub struct GraphSeed {
    pub platforms: Vec<Platform>,
    pub articles: Vec<Article>,
    pub internal_links: Vec<InternalLink>,
    pub external_links: Vec<ExternalLink>,
    pub domains: Vec<DomainEntry>,
}

#[derive(Debug, Default)]
struct State {
    platforms: BTreeMap<Uuid, Platform>,
    articles: BTreeMap<Uuid, Article>,
    internal_links: Vec<InternalLink>,
    external_links: BTreeMap<Uuid, ExternalLink>,
    domains: Vec<DomainEntry>,
}

/// Graph repository kept entirely in process memory
#[derive(Debug)]
pub struct InMemoryRepository {
    state: RwLock<State>,
    writes: AtomicUsize,
}

impl InMemoryRepository {
    pub fn new(seed: GraphSeed) -> Self {
        let state = State {
            platforms: seed.platforms.into_iter().map(|p| (p.id, p)).collect(),
            articles: seed.articles.into_iter().map(|a| (a.id, a)).collect(),
            internal_links: seed.internal_links,
            external_links: seed.external_links.into_iter().map(|l| (l.id, l)).collect(),
            domains: seed.domains,
        };

        Self {
            state: RwLock::new(state),
            writes: AtomicUsize::new(0),
        }
    }

    /// Successful writes since creation
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current internal links
    pub async fn internal_links(&self) -> Vec<InternalLink> {
        self.state.read().await.internal_links.clone()
    }

    /// Current (source, target) pairs
    pub async fn edge_set(&self) -> HashSet<(Uuid, Uuid)> {
        self.state
            .read()
            .await
            .internal_links
            .iter()
            .map(|l| (l.source_article_id, l.target_article_id))
            .collect()
    }

    pub async fn external_link(&self, id: Uuid) -> Option<ExternalLink> {
        self.state.read().await.external_links.get(&id).cloned()
    }

    /// Independent deep copy of the current content
    pub async fn fork(&self) -> Self {
        let state = self.state.read().await;
        Self::new(GraphSeed {
            platforms: state.platforms.values().cloned().collect(),
            articles: state.articles.values().cloned().collect(),
            internal_links: state.internal_links.clone(),
            external_links: state.external_links.values().cloned().collect(),
            domains: state.domains.clone(),
        })
    }
}

#[async_trait]
impl GraphRepository for InMemoryRepository {
    async fn find_platform(&self, platform_id: Uuid) -> Result<Option<Platform>> {
        Ok(self.state.read().await.platforms.get(&platform_id).cloned())
    }

    async fn find_article(&self, article_id: Uuid) -> Result<Option<Article>> {
        Ok(self.state.read().await.articles.get(&article_id).cloned())
    }

    async fn load_articles(&self, platform_id: Uuid, language: Option<&str>) -> Result<Vec<Article>> {
        let state = self.state.read().await;
        Ok(state
            .articles
            .values()
            .filter(|a| a.platform_id == platform_id)
            .filter(|a| language.map_or(true, |l| a.language == l))
            .cloned()
            .collect())
    }

    async fn load_internal_links(&self, platform_id: Uuid) -> Result<Vec<InternalLink>> {
        let state = self.state.read().await;
        Ok(state
            .internal_links
            .iter()
            .filter(|l| {
                state
                    .articles
                    .get(&l.source_article_id)
                    .is_some_and(|a| a.platform_id == platform_id)
            })
            .cloned()
            .collect())
    }

    async fn load_external_links(&self, filter: &ExternalLinkFilter) -> Result<Vec<ExternalLink>> {
        let state = self.state.read().await;
        let links = state
            .external_links
            .values()
            .filter(|l| filter.matches_scope(l))
            .filter(|l| match filter.platform_id {
                Some(platform_id) => state
                    .articles
                    .get(&l.article_id)
                    .is_some_and(|a| a.platform_id == platform_id),
                None => true,
            })
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(links)
    }

    async fn upsert_internal_link(&self, link: &InternalLink) -> Result<UpsertOutcome> {
        check_internal_link(link)?;

        let mut state = self.state.write().await;
        let exists = state.internal_links.iter().any(|l| {
            l.source_article_id == link.source_article_id
                && l.target_article_id == link.target_article_id
        });

        if exists {
            return Ok(UpsertOutcome::AlreadyExists);
        }

        state.internal_links.push(link.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(UpsertOutcome::Inserted)
    }

    async fn update_external_link(&self, link: &ExternalLink) -> Result<()> {
        let mut state = self.state.write().await;
        match state.external_links.get_mut(&link.id) {
            Some(stored) => {
                *stored = link.clone();
                self.writes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(AppError::NotFound {
                resource_type: "external_link".to_string(),
                id: link.id.to_string(),
            }),
        }
    }

    async fn load_authority_domains(&self) -> Result<Vec<DomainEntry>> {
        Ok(self.state.read().await.domains.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentType, PublicationStatus, VerificationScope};

    fn article(id: u128, platform: u128, language: &str) -> Article {
        Article {
            id: Uuid::from_u128(id),
            platform_id: Uuid::from_u128(platform),
            title: format!("Article {}", id),
            language: language.to_string(),
            country: None,
            content_type: ContentType::Standard,
            status: PublicationStatus::Published,
            pillar_id: None,
            topic: None,
            content: String::new(),
        }
    }

    fn link(source: u128, target: u128) -> InternalLink {
        InternalLink::automatic(Uuid::from_u128(source), Uuid::from_u128(target), "anchor".into())
    }

    #[tokio::test]
    async fn test_upsert_deduplicates_pairs() {
        let repo = InMemoryRepository::new(GraphSeed {
            articles: vec![article(1, 9, "en"), article(2, 9, "en")],
            ..Default::default()
        });

        assert_eq!(repo.upsert_internal_link(&link(1, 2)).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(
            repo.upsert_internal_link(&link(1, 2)).await.unwrap(),
            UpsertOutcome::AlreadyExists
        );
        assert_eq!(repo.internal_links().await.len(), 1);
        assert_eq!(repo.write_count(), 1);
    }

    #[test]
    fn test_upsert_rejects_self_link() {
        let repo = InMemoryRepository::new(GraphSeed::default());
        tokio_test::assert_err!(tokio_test::block_on(repo.upsert_internal_link(&link(1, 1))));
        assert_eq!(repo.write_count(), 0);
    }

    #[test]
    fn test_fork_is_independent() {
        let repo = InMemoryRepository::new(GraphSeed {
            articles: vec![article(1, 9, "en"), article(2, 9, "en")],
            ..Default::default()
        });
        let fork = tokio_test::block_on(repo.fork());

        tokio_test::assert_ok!(tokio_test::block_on(fork.upsert_internal_link(&link(1, 2))));
        assert!(tokio_test::block_on(repo.internal_links()).is_empty());
        assert_eq!(tokio_test::block_on(fork.internal_links()).len(), 1);
    }

    #[tokio::test]
    async fn test_platform_and_language_scoping() {
        let repo = InMemoryRepository::new(GraphSeed {
            articles: vec![article(1, 9, "en"), article(2, 9, "fr"), article(3, 8, "en")],
            internal_links: vec![link(1, 2), link(3, 1)],
            ..Default::default()
        });
        let platform = Uuid::from_u128(9);

        assert_eq!(repo.load_articles(platform, None).await.unwrap().len(), 2);
        assert_eq!(repo.load_articles(platform, Some("fr")).await.unwrap().len(), 1);
        assert_eq!(repo.load_internal_links(platform).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_external_filter_scope() {
        let broken = ExternalLink {
            id: Uuid::from_u128(10),
            article_id: Uuid::from_u128(1),
            url: "https://gone.example/x".into(),
            domain: "gone.example".into(),
            is_broken: true,
            last_verified_at: Some(chrono::Utc::now()),
            status_code: Some(404),
            last_error: None,
        };
        let fresh = ExternalLink {
            id: Uuid::from_u128(11),
            is_broken: false,
            last_verified_at: None,
            status_code: None,
            ..broken.clone()
        };
        let repo = InMemoryRepository::new(GraphSeed {
            articles: vec![article(1, 9, "en")],
            external_links: vec![broken, fresh],
            ..Default::default()
        });

        let filter = ExternalLinkFilter::for_platform(Uuid::from_u128(9), VerificationScope::Broken);
        let links = repo.load_external_links(&filter).await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].id, Uuid::from_u128(10));

        let filter = ExternalLinkFilter::for_platform(Uuid::from_u128(8), VerificationScope::All);
        assert!(repo.load_external_links(&filter).await.unwrap().is_empty());
    }
}

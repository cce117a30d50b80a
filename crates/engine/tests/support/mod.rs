//! Fixtures shared by the engine integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use linkforge_common::config::EngineConfig;
use linkforge_common::db::{GraphSeed, InMemoryRepository};
use linkforge_common::domain::{
    Article, ContentType, DomainCategory, DomainEntry, ExternalLink, InternalLink, Platform,
    PublicationStatus,
};
use linkforge_engine::verifier::ProbeError;
use linkforge_engine::{LinkEngine, LinkProber};
use std::sync::Arc;
use uuid::Uuid;

pub const PLATFORM: Uuid = Uuid::from_u128(999);

pub fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

pub fn platform() -> Platform {
    Platform {
        id: PLATFORM,
        name: "fixtures".to_string(),
        is_active: true,
    }
}

pub fn article(n: u128, title: &str, content: &str) -> Article {
    Article {
        id: id(n),
        platform_id: PLATFORM,
        title: title.to_string(),
        language: "en".to_string(),
        country: None,
        content_type: ContentType::Standard,
        status: PublicationStatus::Published,
        pillar_id: None,
        topic: None,
        content: content.to_string(),
    }
}

/// Editor-created link
pub fn edge(source: u128, target: u128) -> InternalLink {
    InternalLink {
        is_automatic: false,
        ..InternalLink::automatic(id(source), id(target), "related".to_string())
    }
}

pub fn broken_link(n: u128, article: u128, domain: &str) -> ExternalLink {
    ExternalLink {
        id: id(n),
        article_id: id(article),
        url: format!("https://{}/page/{}", domain, n),
        domain: domain.to_string(),
        is_broken: true,
        last_verified_at: Some(chrono::Utc::now()),
        status_code: Some(404),
        last_error: Some("HTTP 404".to_string()),
    }
}

pub fn unverified_link(n: u128, article: u128, url: &str) -> ExternalLink {
    ExternalLink {
        is_broken: false,
        last_verified_at: None,
        status_code: None,
        last_error: None,
        url: url.to_string(),
        ..broken_link(n, article, "example.org")
    }
}

pub fn domain(name: &str, trust: u8, topics: &[&str]) -> DomainEntry {
    DomainEntry {
        domain: name.to_string(),
        homepage: Some(format!("https://{}/", name)),
        category: DomainCategory::Reference,
        countries: Vec::new(),
        topics: topics.iter().map(|t| t.to_string()).collect(),
        trust_score: trust,
        is_active: true,
        auto_discovered: false,
    }
}

/// Answers 200 for every URL
pub struct AlwaysOk;

#[async_trait]
impl LinkProber for AlwaysOk {
    async fn probe(&self, _url: &str) -> Result<u16, ProbeError> {
        Ok(200)
    }
}

/// Config without delays so tests run fast
pub fn fast_config() -> EngineConfig {
    let mut config = EngineConfig::default();
    config.verifier.retry_delay_ms = 1;
    config.verifier.host_delay_ms = 0;
    config
}

pub fn engine_over(
    seed: GraphSeed,
    config: EngineConfig,
    prober: Arc<dyn LinkProber>,
) -> (Arc<InMemoryRepository>, LinkEngine) {
    let repo = Arc::new(InMemoryRepository::new(seed));
    let engine = LinkEngine::new(repo.clone(), config, prober).expect("valid engine config");
    (repo, engine)
}

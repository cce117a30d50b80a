//! Domain types shared by the engine, the repositories and the gateway
//!
//! These are plain values: the repositories convert their storage rows into
//! them and the engine never sees a database model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Editorial role of an article within its platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// Hub article that satellites link back to
    Pillar,
    /// Supporting article attached to a pillar
    Satellite,
    /// Conversion/landing page
    Landing,
    /// Regular standalone article
    Standard,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Pillar => "pillar",
            ContentType::Satellite => "satellite",
            ContentType::Landing => "landing",
            ContentType::Standard => "standard",
        }
    }
}

impl From<String> for ContentType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pillar" => ContentType::Pillar,
            "satellite" => ContentType::Satellite,
            "landing" => ContentType::Landing,
            _ => ContentType::Standard,
        }
    }
}

impl From<ContentType> for String {
    fn from(kind: ContentType) -> Self {
        kind.as_str().to_string()
    }
}

/// Publication lifecycle of an article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationStatus {
    Draft,
    Scheduled,
    Published,
    Archived,
}

impl PublicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublicationStatus::Draft => "draft",
            PublicationStatus::Scheduled => "scheduled",
            PublicationStatus::Published => "published",
            PublicationStatus::Archived => "archived",
        }
    }
}

impl From<String> for PublicationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "scheduled" => PublicationStatus::Scheduled,
            "published" => PublicationStatus::Published,
            "archived" => PublicationStatus::Archived,
            _ => PublicationStatus::Draft,
        }
    }
}

impl From<PublicationStatus> for String {
    fn from(status: PublicationStatus) -> Self {
        status.as_str().to_string()
    }
}

/// Which articles count toward balance statistics and defects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusScope {
    #[default]
    PublishedOnly,
    AllStatuses,
}

impl StatusScope {
    pub fn includes(&self, status: PublicationStatus) -> bool {
        match self {
            StatusScope::PublishedOnly => status == PublicationStatus::Published,
            StatusScope::AllStatuses => true,
        }
    }
}

/// A platform groups the articles one engine run operates on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
}

/// Article node of the link graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub platform_id: Uuid,
    pub title: String,
    /// ISO 639-1 code
    pub language: String,
    /// ISO 3166-1 alpha-2 code
    pub country: Option<String>,
    pub content_type: ContentType,
    pub status: PublicationStatus,
    /// Pillar this article supports (satellites only)
    pub pillar_id: Option<Uuid>,
    /// Topic tag used to match authority domains
    pub topic: Option<String>,
    /// Raw article body (HTML or markdown)
    pub content: String,
}

impl Article {
    pub fn is_published(&self) -> bool {
        self.status == PublicationStatus::Published
    }
}

/// Directed article-to-article hyperlink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalLink {
    pub id: Uuid,
    pub source_article_id: Uuid,
    pub target_article_id: Uuid,
    pub anchor_text: String,
    /// Character offset of the anchor inside the source content
    pub position: Option<i32>,
    /// Created by the engine rather than by an editor
    pub is_automatic: bool,
    pub created_at: DateTime<Utc>,
}

impl InternalLink {
    /// New engine-created link
    pub fn automatic(source_article_id: Uuid, target_article_id: Uuid, anchor_text: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            source_article_id,
            target_article_id,
            anchor_text,
            position: None,
            is_automatic: true,
            created_at: Utc::now(),
        }
    }
}

/// Result of writing an internal link through the repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    AlreadyExists,
}

/// Article-to-outside-domain hyperlink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub id: Uuid,
    pub article_id: Uuid,
    pub url: String,
    pub domain: String,
    pub is_broken: bool,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub status_code: Option<u16>,
    pub last_error: Option<String>,
}

impl ExternalLink {
    /// Never checked by the verifier
    pub fn is_unverified(&self) -> bool {
        self.last_verified_at.is_none()
    }
}

/// Which external links a verification pass picks up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationScope {
    #[default]
    Unverified,
    Broken,
    All,
}

/// Selection of external links to load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLinkFilter {
    /// Restrict to one platform (all platforms when absent)
    pub platform_id: Option<Uuid>,
    #[serde(default)]
    pub scope: VerificationScope,
    /// Maximum number of links to return
    pub limit: Option<usize>,
}

impl ExternalLinkFilter {
    pub fn for_platform(platform_id: Uuid, scope: VerificationScope) -> Self {
        Self {
            platform_id: Some(platform_id),
            scope,
            limit: None,
        }
    }

    /// Whether a link belongs to the scope (platform is checked by the caller)
    pub fn matches_scope(&self, link: &ExternalLink) -> bool {
        match self.scope {
            VerificationScope::Unverified => link.is_unverified(),
            VerificationScope::Broken => link.is_broken,
            VerificationScope::All => true,
        }
    }
}

/// Kind of curated authority domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainCategory {
    Government,
    Organization,
    Reference,
    News,
    Authority,
}

impl From<String> for DomainCategory {
    fn from(s: String) -> Self {
        match s.as_str() {
            "government" => DomainCategory::Government,
            "organization" => DomainCategory::Organization,
            "reference" => DomainCategory::Reference,
            "news" => DomainCategory::News,
            _ => DomainCategory::Authority,
        }
    }
}

/// Curated, trust-scored external domain used as a replacement target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEntry {
    pub domain: String,
    /// Landing URL to link to; `https://{domain}/` when absent
    pub homepage: Option<String>,
    pub category: DomainCategory,
    /// Country codes the domain is relevant for (empty means global)
    pub countries: Vec<String>,
    pub topics: Vec<String>,
    /// 0-100
    pub trust_score: u8,
    pub is_active: bool,
    pub auto_discovered: bool,
}

impl DomainEntry {
    /// URL a broken link is rerouted to
    pub fn replacement_url(&self) -> String {
        self.homepage
            .clone()
            .unwrap_or_else(|| format!("https://{}/", self.domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_round_trip_and_fallback() {
        assert_eq!(ContentType::from("pillar".to_string()), ContentType::Pillar);
        assert_eq!(String::from(ContentType::Satellite), "satellite");
        assert_eq!(ContentType::from("listicle".to_string()), ContentType::Standard);
    }

    #[test]
    fn test_unknown_status_is_draft() {
        assert_eq!(PublicationStatus::from("??".to_string()), PublicationStatus::Draft);
    }

    #[test]
    fn test_scope_matching() {
        let mut link = ExternalLink {
            id: Uuid::from_u128(1),
            article_id: Uuid::from_u128(2),
            url: "https://example.org/a".into(),
            domain: "example.org".into(),
            is_broken: false,
            last_verified_at: None,
            status_code: None,
            last_error: None,
        };
        let unverified = ExternalLinkFilter::default();
        let broken = ExternalLinkFilter { scope: VerificationScope::Broken, ..Default::default() };

        assert!(unverified.matches_scope(&link));
        assert!(!broken.matches_scope(&link));

        link.is_broken = true;
        link.last_verified_at = Some(Utc::now());
        assert!(!unverified.matches_scope(&link));
        assert!(broken.matches_scope(&link));
    }

    #[test]
    fn test_replacement_url_defaults_to_domain_root() {
        let entry = DomainEntry {
            domain: "who.int".into(),
            homepage: None,
            category: DomainCategory::Organization,
            countries: vec![],
            topics: vec!["health".into()],
            trust_score: 95,
            is_active: true,
            auto_discovered: false,
        };
        assert_eq!(entry.replacement_url(), "https://who.int/");
    }
}

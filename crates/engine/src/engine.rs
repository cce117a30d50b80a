//! Engine facade
//!
//! One entry point per operation. Every operation loads its own snapshot
//! through the repository, so calls are independent of each other and carry
//! the platform explicitly.

use crate::authority::{AuthorityCache, AuthorityScores, PageRankConfig, PageRankScorer};
use crate::balance::{BalanceAnalyzer, BalanceReport};
use crate::graph::LinkGraph;
use crate::registry::{AuthorityDomainRegistry, InMemoryDomainRegistry};
use crate::repair::{ArticleLocks, RepairInput, RepairOrchestrator, RepairResult};
use crate::run::RunContext;
use crate::similarity::{SimilaritySuggester, Suggestion};
use crate::verifier::{
    HostThrottle, HttpProber, LinkProber, LinkVerifier, RetryPolicy, VerificationSummary,
    VerifyRequest,
};
use linkforge_common::config::EngineConfig;
use linkforge_common::db::GraphRepository;
use linkforge_common::domain::{ExternalLinkFilter, Platform, StatusScope, VerificationScope};
use linkforge_common::errors::{AppError, Result};
use linkforge_common::metrics;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Link graph intelligence engine
pub struct LinkEngine {
    repo: Arc<dyn GraphRepository>,
    config: EngineConfig,
    scorer: PageRankScorer,
    analyzer: BalanceAnalyzer,
    suggester: SimilaritySuggester,
    verifier: LinkVerifier,
    orchestrator: RepairOrchestrator,
    cache: Arc<AuthorityCache>,
    /// Loaded from the repository on each repair when absent
    registry: Option<Arc<dyn AuthorityDomainRegistry>>,
}

impl LinkEngine {
    /// Create an engine checking links through `prober`
    pub fn new(
        repo: Arc<dyn GraphRepository>,
        config: EngineConfig,
        prober: Arc<dyn LinkProber>,
    ) -> Result<Self> {
        let pagerank = PageRankConfig::from(&config.authority);
        pagerank.validate()?;

        let cache = Arc::new(AuthorityCache::new());
        let locks = Arc::new(ArticleLocks::new());

        let verifier = LinkVerifier::new(
            prober,
            RetryPolicy::from(&config.verifier),
            HostThrottle::new(config.verifier.host_delay()),
            config.verifier.concurrency,
        );

        let orchestrator = RepairOrchestrator::new(
            SimilaritySuggester::new(config.suggestions.clone()),
            config.repair.clone(),
            locks,
            cache.clone(),
        );

        Ok(Self {
            repo,
            scorer: PageRankScorer::new(pagerank),
            analyzer: BalanceAnalyzer::new(config.balance.clone()),
            suggester: SimilaritySuggester::new(config.suggestions.clone()),
            verifier,
            orchestrator,
            cache,
            registry: None,
            config,
        })
    }

    /// Create an engine checking links over HTTP
    pub fn from_config(repo: Arc<dyn GraphRepository>, config: EngineConfig) -> Result<Self> {
        let prober = HttpProber::new(&config.verifier)?;
        Self::new(repo, config, Arc::new(prober))
    }

    /// Use a fixed domain registry instead of the repository's table
    pub fn with_registry(mut self, registry: Arc<dyn AuthorityDomainRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<dyn GraphRepository> {
        &self.repo
    }

    pub fn authority_cache(&self) -> &Arc<AuthorityCache> {
        &self.cache
    }

    async fn platform(&self, platform_id: Uuid) -> Result<Platform> {
        self.repo
            .find_platform(platform_id)
            .await?
            .ok_or_else(|| AppError::PlatformNotFound {
                id: platform_id.to_string(),
            })
    }

    // =========================================================================
    // Balance
    // =========================================================================

    /// Balance report for a platform, optionally restricted to one language
    pub async fn analyze(&self, platform_id: Uuid, language: Option<&str>) -> Result<BalanceReport> {
        self.analyze_with(platform_id, language, self.config.balance.status_scope, &RunContext::new())
            .await
    }

    #[instrument(skip(self, ctx), fields(platform_id = %platform_id))]
    pub async fn analyze_with(
        &self,
        platform_id: Uuid,
        language: Option<&str>,
        scope: StatusScope,
        ctx: &RunContext,
    ) -> Result<BalanceReport> {
        self.platform(platform_id).await?;
        ctx.check("analyze")?;

        // Degrees count links from every language; the filter only picks
        // the articles that are reported on
        let graph = LinkGraph::load(self.repo.as_ref(), platform_id, None).await?;
        ctx.progress().reset(graph.node_count());

        let report = self.analyzer.analyze_scoped(&graph, language, scope);
        ctx.progress().advance(graph.node_count());

        metrics::record_balance(
            &platform_id.to_string(),
            report.orphans.len(),
            report.dead_ends.len(),
            report.summary.imbalance_ratio,
        );

        info!(
            articles = report.summary.considered_articles,
            orphans = report.orphans.len(),
            dead_ends = report.dead_ends.len(),
            imbalance_ratio = report.summary.imbalance_ratio,
            band = ?report.summary.band,
            "Balance analysis complete"
        );

        Ok(report)
    }

    // =========================================================================
    // Authority
    // =========================================================================

    /// Authority scores for every article of a platform
    pub async fn compute_authority(&self, platform_id: Uuid) -> Result<Arc<AuthorityScores>> {
        self.compute_authority_with(platform_id, &RunContext::new()).await
    }

    #[instrument(skip(self, ctx), fields(platform_id = %platform_id))]
    pub async fn compute_authority_with(
        &self,
        platform_id: Uuid,
        ctx: &RunContext,
    ) -> Result<Arc<AuthorityScores>> {
        self.platform(platform_id).await?;
        let graph = LinkGraph::load(self.repo.as_ref(), platform_id, None).await?;
        self.authority_for(&graph, ctx).await
    }

    /// Cached scores for the snapshot, computed when the fingerprint moved
    async fn authority_for(&self, graph: &LinkGraph, ctx: &RunContext) -> Result<Arc<AuthorityScores>> {
        let fingerprint = graph.fingerprint();
        if let Some(scores) = self.cache.get(graph.platform_id(), &fingerprint).await {
            debug!(platform_id = %graph.platform_id(), "Authority cache hit");
            return Ok(scores);
        }

        let started = Instant::now();
        let scores = self.scorer.rank(graph, ctx)?;
        metrics::record_authority(
            started.elapsed().as_secs_f64(),
            scores.iterations,
            scores.converged,
        );

        if !scores.converged {
            warn!(
                platform_id = %graph.platform_id(),
                iterations = scores.iterations,
                "Authority did not converge within the iteration cap"
            );
        }

        info!(
            platform_id = %graph.platform_id(),
            articles = scores.len(),
            iterations = scores.iterations,
            converged = scores.converged,
            "Authority computed"
        );

        Ok(self.cache.put(scores).await)
    }

    // =========================================================================
    // Suggestions
    // =========================================================================

    /// New internal link proposals for one article; empty for unknown ids
    pub async fn suggest_links(&self, article_id: Uuid) -> Result<Vec<Suggestion>> {
        self.suggest_links_with(article_id, &RunContext::new()).await
    }

    #[instrument(skip(self, ctx), fields(article_id = %article_id))]
    pub async fn suggest_links_with(
        &self,
        article_id: Uuid,
        ctx: &RunContext,
    ) -> Result<Vec<Suggestion>> {
        let Some(article) = self.repo.find_article(article_id).await? else {
            debug!("Article not found, nothing to suggest");
            return Ok(Vec::new());
        };
        ctx.check("suggest_links")?;

        let graph = LinkGraph::load(self.repo.as_ref(), article.platform_id, None).await?;
        let authority = self.authority_for(&graph, ctx).await?;
        let suggestions = self.suggester.suggest_for(&graph, &authority, article_id);

        metrics::record_suggestions(suggestions.len());
        debug!(count = suggestions.len(), "Suggestions computed");

        Ok(suggestions)
    }

    // =========================================================================
    // Verification
    // =========================================================================

    /// Check the external links selected by the request
    pub async fn verify_links(&self, request: &VerifyRequest) -> Result<VerificationSummary> {
        self.verify_links_with(request, &RunContext::new()).await
    }

    pub async fn verify_links_with(
        &self,
        request: &VerifyRequest,
        ctx: &RunContext,
    ) -> Result<VerificationSummary> {
        if let Some(platform_id) = request.filter.platform_id {
            self.platform(platform_id).await?;
        }
        self.verifier.verify(self.repo.as_ref(), request, ctx).await
    }

    // =========================================================================
    // Repair
    // =========================================================================

    /// Fix orphans, dead-ends and broken external links of a platform
    pub async fn repair(&self, platform_id: Uuid, dry_run: bool) -> Result<RepairResult> {
        self.repair_with(platform_id, dry_run, &RunContext::new()).await
    }

    #[instrument(skip(self, ctx), fields(platform_id = %platform_id, dry_run = dry_run))]
    pub async fn repair_with(
        &self,
        platform_id: Uuid,
        dry_run: bool,
        ctx: &RunContext,
    ) -> Result<RepairResult> {
        self.platform(platform_id).await?;

        let graph = LinkGraph::load(self.repo.as_ref(), platform_id, None).await?;
        let authority = self.authority_for(&graph, &RunContext::new()).await?;
        let report = self.analyzer.analyze(&graph, None);

        let filter = ExternalLinkFilter::for_platform(platform_id, VerificationScope::Broken);
        let broken_links = self.repo.load_external_links(&filter).await?;

        let registry: Arc<dyn AuthorityDomainRegistry> = match &self.registry {
            Some(registry) => registry.clone(),
            None => Arc::new(InMemoryDomainRegistry::load(self.repo.as_ref()).await?),
        };

        let input = RepairInput {
            graph: &graph,
            authority: &authority,
            report: &report,
            broken_links: &broken_links,
        };

        self.orchestrator
            .repair(self.repo.as_ref(), registry.as_ref(), input, dry_run, ctx)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::article;
    use crate::verifier::ProbeError;
    use async_trait::async_trait;
    use linkforge_common::db::{GraphSeed, InMemoryRepository};
    use linkforge_common::domain::InternalLink;

    struct AlwaysOk;

    #[async_trait]
    impl LinkProber for AlwaysOk {
        async fn probe(&self, _url: &str) -> std::result::Result<u16, ProbeError> {
            Ok(200)
        }
    }

    fn engine(seed: GraphSeed) -> LinkEngine {
        LinkEngine::new(
            Arc::new(InMemoryRepository::new(seed)),
            EngineConfig::default(),
            Arc::new(AlwaysOk),
        )
        .unwrap()
    }

    fn platform() -> Platform {
        Platform {
            id: Uuid::from_u128(999),
            name: "test".to_string(),
            is_active: true,
        }
    }

    fn edge(s: u128, t: u128) -> InternalLink {
        InternalLink::automatic(Uuid::from_u128(s), Uuid::from_u128(t), "x".into())
    }

    #[tokio::test]
    async fn test_unknown_platform_is_rejected() {
        let engine = engine(GraphSeed::default());
        let missing = Uuid::from_u128(42);

        assert!(matches!(
            engine.analyze(missing, None).await,
            Err(AppError::PlatformNotFound { .. })
        ));
        assert!(matches!(
            engine.compute_authority(missing).await,
            Err(AppError::PlatformNotFound { .. })
        ));
        assert!(matches!(
            engine.repair(missing, true).await,
            Err(AppError::PlatformNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_platform_yields_empty_results() {
        let engine = engine(GraphSeed {
            platforms: vec![platform()],
            ..Default::default()
        });

        let report = engine.analyze(platform().id, None).await.unwrap();
        assert_eq!(report.summary.total_articles, 0);
        assert!(report.orphans.is_empty());

        let scores = engine.compute_authority(platform().id).await.unwrap();
        assert!(scores.is_empty());
    }

    #[tokio::test]
    async fn test_missing_article_has_no_suggestions() {
        let engine = engine(GraphSeed::default());
        assert!(engine.suggest_links(Uuid::from_u128(7)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_authority_is_cached_until_graph_changes() {
        let engine = engine(GraphSeed {
            platforms: vec![platform()],
            articles: vec![article(1), article(2), article(3)],
            internal_links: vec![edge(1, 2), edge(2, 3)],
            ..Default::default()
        });

        let first = engine.compute_authority(platform().id).await.unwrap();
        let second = engine.compute_authority(platform().id).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        engine.repository().upsert_internal_link(&edge(3, 1)).await.unwrap();
        let third = engine.compute_authority(platform().id).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_ne!(first.fingerprint, third.fingerprint);
    }

    #[tokio::test]
    async fn test_cancelled_authority_run_fails() {
        let engine = engine(GraphSeed {
            platforms: vec![platform()],
            articles: vec![article(1), article(2)],
            internal_links: vec![edge(1, 2)],
            ..Default::default()
        });
        let ctx = RunContext::new();
        ctx.cancel();

        assert!(matches!(
            engine.compute_authority_with(platform().id, &ctx).await,
            Err(AppError::Cancelled { .. })
        ));
    }

    #[test]
    fn test_invalid_damping_rejected_at_construction() {
        let mut config = EngineConfig::default();
        config.authority.damping = 1.5;
        let result = LinkEngine::new(
            Arc::new(InMemoryRepository::new(GraphSeed::default())),
            config,
            Arc::new(AlwaysOk),
        );
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }
}

//! Repair execution
//!
//! Runs a plan against the repository. Actions are grouped by the article
//! whose links they write; groups run concurrently, actions inside a group run
//! in plan order under that article's lock.

use super::locks::ArticleLocks;
use super::planner::RepairPlanner;
use super::{
    ActionDetail, ActionOutcome, ActionReport, DefectCounts, RepairAction, RepairActionKind,
    RepairResult,
};
use crate::authority::{AuthorityCache, AuthorityScores};
use crate::balance::BalanceReport;
use crate::graph::LinkGraph;
use crate::registry::AuthorityDomainRegistry;
use crate::run::RunContext;
use crate::similarity::SimilaritySuggester;
use futures::stream::{self, StreamExt};
use linkforge_common::config::RepairConfig;
use linkforge_common::db::GraphRepository;
use linkforge_common::domain::{ExternalLink, InternalLink, UpsertOutcome};
use linkforge_common::errors::{AppError, Result};
use linkforge_common::metrics;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Analysis output a repair run works from
#[derive(Clone, Copy)]
pub struct RepairInput<'a> {
    pub graph: &'a LinkGraph,
    pub authority: &'a AuthorityScores,
    pub report: &'a BalanceReport,
    /// Broken external links of the platform
    pub broken_links: &'a [ExternalLink],
}

type IndexedOutcome = (usize, ActionOutcome, Option<String>);

/// Plans and applies link repairs
pub struct RepairOrchestrator {
    suggester: SimilaritySuggester,
    config: RepairConfig,
    locks: Arc<ArticleLocks>,
    cache: Arc<AuthorityCache>,
}

impl RepairOrchestrator {
    pub fn new(
        suggester: SimilaritySuggester,
        config: RepairConfig,
        locks: Arc<ArticleLocks>,
        cache: Arc<AuthorityCache>,
    ) -> Self {
        Self {
            suggester,
            config,
            locks,
            cache,
        }
    }

    /// Plan the repairs for `input` and, unless `dry_run`, apply them.
    ///
    /// A dry run reports the exact action set a real run on the same
    /// snapshot would attempt, with every outcome `Planned`.
    #[instrument(
        skip_all,
        fields(platform_id = %input.graph.platform_id(), dry_run = dry_run)
    )]
    pub async fn repair(
        &self,
        repo: &dyn GraphRepository,
        registry: &dyn AuthorityDomainRegistry,
        input: RepairInput<'_>,
        dry_run: bool,
        ctx: &RunContext,
    ) -> Result<RepairResult> {
        let started = Instant::now();
        let platform_id = input.graph.platform_id();

        let plan = RepairPlanner::new(input.graph, input.authority, &self.suggester, &self.config)
            .plan(input.report, input.broken_links, registry)
            .await?;
        ctx.progress().reset(plan.actions.len());

        let outcomes: Vec<(ActionOutcome, Option<String>)> = if dry_run {
            ctx.progress().advance(plan.actions.len());
            vec![(ActionOutcome::Planned, None); plan.actions.len()]
        } else {
            let links: HashMap<Uuid, &ExternalLink> =
                input.broken_links.iter().map(|l| (l.id, l)).collect();
            self.apply(repo, &plan.actions, &links, ctx).await
        };

        let mut result = RepairResult {
            platform_id,
            dry_run,
            orphans: DefectCounts {
                found: plan.orphans,
                fixed: 0,
            },
            dead_ends: DefectCounts {
                found: plan.dead_ends,
                fixed: 0,
            },
            broken_links: DefectCounts {
                found: plan.broken_links,
                fixed: 0,
            },
            actions: Vec::with_capacity(plan.actions.len()),
            not_repairable: plan.not_repairable,
            repairable_articles: Vec::new(),
            applied: 0,
            duplicates: 0,
            failed: 0,
            cancelled: 0,
            elapsed_ms: 0,
        };

        let mut fixed: HashSet<(RepairActionKind, Uuid)> = HashSet::new();
        let mut repairable: BTreeSet<Uuid> = BTreeSet::new();

        for (action, (outcome, error)) in plan.actions.into_iter().zip(outcomes) {
            match outcome {
                ActionOutcome::Applied => result.applied += 1,
                ActionOutcome::Duplicate => result.duplicates += 1,
                ActionOutcome::Failed => result.failed += 1,
                ActionOutcome::Cancelled => result.cancelled += 1,
                ActionOutcome::Planned => {}
            }

            if outcome.resolves() {
                repairable.insert(action.article_id);
                fixed.insert((action.kind, defect_key(&action)));
            }

            metrics::record_repair_action(action.kind.as_str(), outcome.as_str(), dry_run);
            result.actions.push(ActionReport {
                action,
                outcome,
                error,
            });
        }

        let fixed_of = |kind: RepairActionKind| fixed.iter().filter(|(k, _)| *k == kind).count();
        result.orphans.fixed = fixed_of(RepairActionKind::LinkOrphan);
        result.dead_ends.fixed = fixed_of(RepairActionKind::ExtendDeadEnd);
        result.broken_links.fixed = fixed_of(RepairActionKind::ReplaceExternalLink);
        result.repairable_articles = repairable.into_iter().collect();

        if result.applied > 0 {
            self.cache.invalidate(platform_id).await;
        }
        self.locks.prune().await;

        result.elapsed_ms = started.elapsed().as_millis() as u64;

        info!(
            actions = result.actions.len(),
            applied = result.applied,
            duplicates = result.duplicates,
            failed = result.failed,
            cancelled = result.cancelled,
            not_repairable = result.not_repairable.len(),
            elapsed_ms = result.elapsed_ms,
            "Repair run complete"
        );

        Ok(result)
    }

    /// Outcomes in plan order
    async fn apply(
        &self,
        repo: &dyn GraphRepository,
        actions: &[RepairAction],
        links: &HashMap<Uuid, &ExternalLink>,
        ctx: &RunContext,
    ) -> Vec<(ActionOutcome, Option<String>)> {
        let mut groups: Vec<(Uuid, Vec<usize>)> = Vec::new();
        let mut slots: HashMap<Uuid, usize> = HashMap::new();
        for (i, action) in actions.iter().enumerate() {
            let key = action.write_key();
            let slot = *slots.entry(key).or_insert_with(|| {
                groups.push((key, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(i);
        }

        let applied: Vec<Vec<IndexedOutcome>> = stream::iter(groups)
            .map(|(key, indices)| self.apply_group(repo, actions, links, key, indices, ctx))
            .buffer_unordered(self.config.write_concurrency.max(1))
            .collect()
            .await;

        let mut outcomes = vec![(ActionOutcome::Cancelled, None); actions.len()];
        for (i, outcome, error) in applied.into_iter().flatten() {
            outcomes[i] = (outcome, error);
        }
        outcomes
    }

    async fn apply_group(
        &self,
        repo: &dyn GraphRepository,
        actions: &[RepairAction],
        links: &HashMap<Uuid, &ExternalLink>,
        key: Uuid,
        indices: Vec<usize>,
        ctx: &RunContext,
    ) -> Vec<IndexedOutcome> {
        let _guard = self.locks.lock(key).await;
        let mut applied = Vec::with_capacity(indices.len());

        for i in indices {
            if ctx.is_cancelled() {
                applied.push((i, ActionOutcome::Cancelled, None));
                continue;
            }

            let action = &actions[i];
            let entry = match apply_action(repo, action, links).await {
                Ok(outcome) => (i, outcome, None),
                Err(e) => {
                    warn!(
                        article_id = %action.article_id,
                        kind = action.kind.as_str(),
                        error = %e,
                        "Repair action failed"
                    );
                    (i, ActionOutcome::Failed, Some(e.to_string()))
                }
            };
            ctx.progress().advance(1);
            applied.push(entry);
        }

        applied
    }
}

async fn apply_action(
    repo: &dyn GraphRepository,
    action: &RepairAction,
    links: &HashMap<Uuid, &ExternalLink>,
) -> Result<ActionOutcome> {
    match &action.detail {
        ActionDetail::InternalLink {
            source_article_id,
            target_article_id,
            anchor_text,
            ..
        } => {
            let link = InternalLink::automatic(*source_article_id, *target_article_id, anchor_text.clone());
            Ok(match repo.upsert_internal_link(&link).await? {
                UpsertOutcome::Inserted => ActionOutcome::Applied,
                UpsertOutcome::AlreadyExists => ActionOutcome::Duplicate,
            })
        }
        ActionDetail::ExternalLink {
            link_id,
            new_url,
            domain,
            ..
        } => {
            let current = links.get(link_id).ok_or_else(|| AppError::NotFound {
                resource_type: "external_link".to_string(),
                id: link_id.to_string(),
            })?;

            // The new target has not been checked yet
            let replaced = ExternalLink {
                url: new_url.clone(),
                domain: domain.clone(),
                is_broken: false,
                last_verified_at: None,
                status_code: None,
                last_error: None,
                ..(*current).clone()
            };
            repo.update_external_link(&replaced).await?;
            Ok(ActionOutcome::Applied)
        }
    }
}

/// Identity of the defect an action addresses
fn defect_key(action: &RepairAction) -> Uuid {
    match &action.detail {
        ActionDetail::ExternalLink { link_id, .. } => *link_id,
        ActionDetail::InternalLink { .. } => action.article_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::{PageRankConfig, PageRankScorer};
    use crate::balance::BalanceAnalyzer;
    use crate::graph::tests::article;
    use crate::registry::InMemoryDomainRegistry;
    use linkforge_common::config::{BalanceConfig, SuggestionConfig};
    use linkforge_common::db::{GraphSeed, InMemoryRepository};
    use linkforge_common::domain::{DomainCategory, DomainEntry, Platform};

    const PLATFORM: u128 = 999;

    fn topical(id: u128, title: &str, content: &str) -> linkforge_common::domain::Article {
        linkforge_common::domain::Article {
            title: title.to_string(),
            content: content.to_string(),
            topic: Some("tax".to_string()),
            country: Some("fr".to_string()),
            ..article(id)
        }
    }

    fn link(source: u128, target: u128) -> InternalLink {
        InternalLink {
            is_automatic: false,
            ..InternalLink::automatic(Uuid::from_u128(source), Uuid::from_u128(target), "see".into())
        }
    }

    fn broken(id: u128, article_id: u128) -> ExternalLink {
        ExternalLink {
            id: Uuid::from_u128(id),
            article_id: Uuid::from_u128(article_id),
            url: "https://gone.example/page".to_string(),
            domain: "gone.example".to_string(),
            is_broken: true,
            last_verified_at: Some(chrono::Utc::now()),
            status_code: Some(404),
            last_error: Some("HTTP 404".to_string()),
        }
    }

    /// 1 -> 2 -> 3 -> 1 cycle, 4 is an orphan dead-end, 5 is a dead-end
    /// linked from 1. Article 2 carries a broken external link.
    fn seed() -> GraphSeed {
        GraphSeed {
            platforms: vec![Platform {
                id: Uuid::from_u128(PLATFORM),
                name: "test".to_string(),
                is_active: true,
            }],
            articles: vec![
                topical(1, "Income tax basics", "income tax brackets and income tax returns"),
                topical(2, "Tax returns guide", "filing tax returns before the deadline"),
                topical(3, "Property tax", "property tax rates for homeowners"),
                topical(4, "Income tax deductions", "income tax deductions reduce taxable income"),
                topical(5, "Tax deadline calendar", "every tax deadline and filing date"),
            ],
            internal_links: vec![link(1, 2), link(2, 3), link(3, 1), link(1, 5)],
            external_links: vec![broken(100, 2)],
            domains: vec![DomainEntry {
                domain: "impots.gouv.fr".to_string(),
                homepage: None,
                category: DomainCategory::Government,
                countries: vec!["fr".to_string()],
                topics: vec!["tax".to_string()],
                trust_score: 95,
                is_active: true,
                auto_discovered: false,
            }],
        }
    }

    fn orchestrator(cache: Arc<AuthorityCache>) -> RepairOrchestrator {
        RepairOrchestrator::new(
            SimilaritySuggester::new(SuggestionConfig {
                max_links_per_run: 2,
                min_outbound_links: 1,
                min_similarity: 0.0,
                anchor_max_chars: 60,
            }),
            RepairConfig::default(),
            Arc::new(ArticleLocks::new()),
            cache,
        )
    }

    async fn run(
        repo: &InMemoryRepository,
        orchestrator: &RepairOrchestrator,
        dry_run: bool,
        ctx: &RunContext,
    ) -> RepairResult {
        let platform = Uuid::from_u128(PLATFORM);
        let graph = LinkGraph::load(repo, platform, None).await.unwrap();
        let authority = PageRankScorer::new(PageRankConfig::default())
            .rank(&graph, &RunContext::new())
            .unwrap();
        let report = BalanceAnalyzer::new(BalanceConfig::default()).analyze(&graph, None);
        let filter = linkforge_common::domain::ExternalLinkFilter::for_platform(
            platform,
            linkforge_common::domain::VerificationScope::Broken,
        );
        let broken_links = repo.load_external_links(&filter).await.unwrap();
        let registry = InMemoryDomainRegistry::load(repo).await.unwrap();

        let input = RepairInput {
            graph: &graph,
            authority: &authority,
            report: &report,
            broken_links: &broken_links,
        };
        orchestrator
            .repair(repo, &registry, input, dry_run, ctx)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_dry_run_matches_real_run() {
        let repo = InMemoryRepository::new(seed());
        let copy = repo.fork().await;
        let orchestrator = orchestrator(Arc::new(AuthorityCache::new()));

        let dry = run(&repo, &orchestrator, true, &RunContext::new()).await;
        assert_eq!(repo.write_count(), 0);
        assert!(dry.actions.iter().all(|a| a.outcome == ActionOutcome::Planned));

        let real = run(&copy, &orchestrator, false, &RunContext::new()).await;
        assert_eq!(dry.action_set(), real.action_set());
        assert_eq!(real.applied, real.actions.len());
        assert_eq!(copy.write_count(), real.applied);
    }

    #[tokio::test]
    async fn test_fixes_every_defect_kind() {
        let repo = InMemoryRepository::new(seed());
        let result = run(&repo, &orchestrator(Arc::new(AuthorityCache::new())), false, &RunContext::new()).await;

        assert_eq!(result.orphans, DefectCounts { found: 1, fixed: 1 });
        assert_eq!(result.dead_ends.found, 2);
        assert_eq!(result.dead_ends.fixed, 2);
        assert_eq!(result.broken_links, DefectCounts { found: 1, fixed: 1 });
        assert!(result.repairable_articles.contains(&Uuid::from_u128(4)));

        let edges = repo.edge_set().await;
        assert!(edges.iter().any(|&(_, t)| t == Uuid::from_u128(4)));
        assert!(edges.iter().any(|&(s, _)| s == Uuid::from_u128(5)));

        let replaced = repo.external_link(Uuid::from_u128(100)).await.unwrap();
        assert_eq!(replaced.url, "https://impots.gouv.fr/");
        assert_eq!(replaced.domain, "impots.gouv.fr");
        assert!(!replaced.is_broken);
        assert!(replaced.last_verified_at.is_none());
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let repo = InMemoryRepository::new(seed());
        let orchestrator = orchestrator(Arc::new(AuthorityCache::new()));

        run(&repo, &orchestrator, false, &RunContext::new()).await;
        let edges = repo.edge_set().await;
        let writes = repo.write_count();

        let again = run(&repo, &orchestrator, false, &RunContext::new()).await;
        assert!(again.actions.is_empty());
        assert_eq!(repo.edge_set().await, edges);
        assert_eq!(repo.write_count(), writes);
    }

    #[tokio::test]
    async fn test_concurrent_write_becomes_duplicate() {
        let repo = InMemoryRepository::new(seed());
        let orchestrator = orchestrator(Arc::new(AuthorityCache::new()));

        // Learn the planned edges, then write them behind the planner's back
        let dry = run(&repo, &orchestrator, true, &RunContext::new()).await;
        for report in &dry.actions {
            if let ActionDetail::InternalLink {
                source_article_id,
                target_article_id,
                ..
            } = report.action.detail
            {
                repo.upsert_internal_link(&InternalLink::automatic(
                    source_article_id,
                    target_article_id,
                    "manual".into(),
                ))
                .await
                .unwrap();
            }
        }

        // Replay the stale plan against the updated repository
        let platform = Uuid::from_u128(PLATFORM);
        let stale = InMemoryRepository::new(seed());
        let graph = LinkGraph::load(&stale, platform, None).await.unwrap();
        let authority = PageRankScorer::new(PageRankConfig::default())
            .rank(&graph, &RunContext::new())
            .unwrap();
        let report = BalanceAnalyzer::new(BalanceConfig::default()).analyze(&graph, None);
        let registry = InMemoryDomainRegistry::new(Vec::new());
        let input = RepairInput {
            graph: &graph,
            authority: &authority,
            report: &report,
            broken_links: &[],
        };

        let result = orchestrator
            .repair(&repo, &registry, input, false, &RunContext::new())
            .await
            .unwrap();

        assert!(!result.actions.is_empty());
        assert_eq!(result.duplicates, result.actions.len());
        assert_eq!(result.applied, 0);
        assert_eq!(result.orphans.fixed, 1);
    }

    #[tokio::test]
    async fn test_cancelled_run_writes_nothing() {
        let repo = InMemoryRepository::new(seed());
        let ctx = RunContext::new();
        ctx.cancel();

        let result = run(&repo, &orchestrator(Arc::new(AuthorityCache::new())), false, &ctx).await;

        assert!(!result.actions.is_empty());
        assert_eq!(result.cancelled, result.actions.len());
        assert_eq!(result.orphans.fixed, 0);
        assert_eq!(repo.write_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_registry_match_is_reported() {
        let mut seed = seed();
        seed.domains.clear();
        let repo = InMemoryRepository::new(seed);

        let result = run(&repo, &orchestrator(Arc::new(AuthorityCache::new())), false, &RunContext::new()).await;

        assert_eq!(result.broken_links, DefectCounts { found: 1, fixed: 0 });
        assert!(result
            .not_repairable
            .iter()
            .any(|n| n.link_id == Some(Uuid::from_u128(100))));
        assert!(repo.external_link(Uuid::from_u128(100)).await.unwrap().is_broken);
    }

    #[tokio::test]
    async fn test_applied_run_invalidates_cache() {
        let repo = InMemoryRepository::new(seed());
        let cache = Arc::new(AuthorityCache::new());
        let graph = LinkGraph::load(&repo, Uuid::from_u128(PLATFORM), None).await.unwrap();
        cache
            .put(
                PageRankScorer::new(PageRankConfig::default())
                    .rank(&graph, &RunContext::new())
                    .unwrap(),
            )
            .await;

        run(&repo, &orchestrator(cache.clone()), true, &RunContext::new()).await;
        assert_eq!(cache.len().await, 1);

        run(&repo, &orchestrator(cache.clone()), false, &RunContext::new()).await;
        assert_eq!(cache.len().await, 0);
    }
}

//! Repair planning
//!
//! Planning never writes. The same plan backs dry runs and real runs, and
//! every internal edge it proposes is new: pairs already in the snapshot or
//! already planned are skipped.

use super::{ActionDetail, NotRepairable, NotRepairableReason, RepairAction, RepairActionKind};
use crate::authority::AuthorityScores;
use crate::balance::BalanceReport;
use crate::graph::LinkGraph;
use crate::registry::{AuthorityDomainRegistry, DomainQuery};
use crate::similarity::{anchor_text, Corpus, SimilaritySuggester};
use linkforge_common::config::RepairConfig;
use linkforge_common::domain::{Article, ExternalLink};
use linkforge_common::errors::Result;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// Keywords per target considered for anchor spans
const ANCHOR_KEYWORDS: usize = 8;

/// Actions to take plus the defects that cannot be fixed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairPlan {
    pub actions: Vec<RepairAction>,
    pub not_repairable: Vec<NotRepairable>,
    pub orphans: usize,
    pub dead_ends: usize,
    pub broken_links: usize,
}

/// Builds repair plans from analysis output
pub struct RepairPlanner<'a> {
    graph: &'a LinkGraph,
    authority: &'a AuthorityScores,
    suggester: &'a SimilaritySuggester,
    config: &'a RepairConfig,
    corpora: HashMap<String, Corpus>,
    planned: HashSet<(Uuid, Uuid)>,
}

impl<'a> RepairPlanner<'a> {
    pub fn new(
        graph: &'a LinkGraph,
        authority: &'a AuthorityScores,
        suggester: &'a SimilaritySuggester,
        config: &'a RepairConfig,
    ) -> Self {
        Self {
            graph,
            authority,
            suggester,
            config,
            corpora: HashMap::new(),
            planned: HashSet::new(),
        }
    }

    /// Plan every repair for a report and a set of broken links
    pub async fn plan(
        mut self,
        report: &BalanceReport,
        broken_links: &[ExternalLink],
        registry: &dyn AuthorityDomainRegistry,
    ) -> Result<RepairPlan> {
        let mut plan = RepairPlan {
            orphans: report.orphans.len(),
            dead_ends: report.dead_ends.len(),
            broken_links: broken_links.len(),
            ..Default::default()
        };

        for defect in &report.orphans {
            match self.plan_orphan(defect.article_id, report) {
                Some(action) => plan.actions.push(action),
                None => plan.not_repairable.push(NotRepairable {
                    kind: RepairActionKind::LinkOrphan,
                    article_id: defect.article_id,
                    link_id: None,
                    reason: NotRepairableReason::NoSourceCandidate,
                }),
            }
        }

        for defect in &report.dead_ends {
            let actions = self.plan_dead_end(defect.article_id);
            if actions.is_empty() {
                plan.not_repairable.push(NotRepairable {
                    kind: RepairActionKind::ExtendDeadEnd,
                    article_id: defect.article_id,
                    link_id: None,
                    reason: NotRepairableReason::NoSuggestions,
                });
            }
            plan.actions.extend(actions);
        }

        for link in broken_links {
            match self.plan_external(link, registry).await? {
                Some(action) => plan.actions.push(action),
                None => plan.not_repairable.push(NotRepairable {
                    kind: RepairActionKind::ReplaceExternalLink,
                    article_id: link.article_id,
                    link_id: Some(link.id),
                    reason: NotRepairableReason::NoReplacementDomain,
                }),
            }
        }

        debug!(
            platform_id = %self.graph.platform_id(),
            actions = plan.actions.len(),
            not_repairable = plan.not_repairable.len(),
            "Repair plan built"
        );

        Ok(plan)
    }

    /// One inbound link: the orphan's pillar, else the most similar
    /// article, else the strongest article of the same language
    fn plan_orphan(&mut self, orphan_id: Uuid, report: &BalanceReport) -> Option<RepairAction> {
        let graph = self.graph;
        let orphan = graph.article(orphan_id)?;
        let eligible = |source: &Article| {
            source.id != orphan_id
                && source.platform_id == orphan.platform_id
                && report.scope.includes(source.status)
                && !graph.has_edge(source.id, orphan_id)
        };

        let mut choice: Option<Uuid> = orphan
            .pillar_id
            .and_then(|id| graph.article(id))
            .filter(|pillar| eligible(pillar) && !self.planned.contains(&(pillar.id, orphan_id)))
            .map(|pillar| pillar.id);

        let min_similarity = self.suggester.config().min_similarity;
        let planned = &self.planned;
        let corpus = corpus_for(&mut self.corpora, graph, &orphan.language);

        if choice.is_none() {
            choice = corpus
                .index()
                .most_similar(orphan_id)
                .into_iter()
                .filter(|&(_, similarity)| similarity >= min_similarity)
                .filter(|&(id, _)| !planned.contains(&(id, orphan_id)))
                .find(|&(id, _)| graph.article(id).is_some_and(|a| eligible(a)))
                .map(|(id, _)| id);
        }

        if choice.is_none() {
            choice = self
                .authority
                .articles
                .iter()
                .filter_map(|a| graph.article(a.article_id))
                .filter(|a| a.language == orphan.language)
                .find(|a| eligible(a) && !planned.contains(&(a.id, orphan_id)))
                .map(|a| a.id);
        }

        let source = graph.article(choice?)?;
        let similarity = corpus.similarity(source.id, orphan_id);

        let keywords: Vec<&str> = corpus
            .index()
            .top_terms(orphan_id, ANCHOR_KEYWORDS)
            .into_iter()
            .map(|(term, _)| term)
            .collect();
        let anchor = anchor_text(
            source,
            orphan,
            &keywords,
            self.suggester.config().anchor_max_chars,
        );

        self.planned.insert((source.id, orphan_id));

        Some(RepairAction {
            kind: RepairActionKind::LinkOrphan,
            article_id: orphan_id,
            detail: ActionDetail::InternalLink {
                source_article_id: source.id,
                target_article_id: orphan_id,
                anchor_text: anchor,
                similarity,
            },
        })
    }

    /// Up to quota outbound links from the suggester
    fn plan_dead_end(&mut self, article_id: Uuid) -> Vec<RepairAction> {
        let graph = self.graph;
        let Some(article) = graph.article(article_id) else {
            return Vec::new();
        };

        let corpus = corpus_for(&mut self.corpora, graph, &article.language);
        let suggestions =
            self.suggester
                .suggest(graph, corpus, self.authority, article_id, &self.planned);

        suggestions
            .into_iter()
            .map(|s| {
                self.planned.insert((s.source_article_id, s.target_article_id));
                RepairAction {
                    kind: RepairActionKind::ExtendDeadEnd,
                    article_id,
                    detail: ActionDetail::InternalLink {
                        source_article_id: s.source_article_id,
                        target_article_id: s.target_article_id,
                        anchor_text: s.anchor_text,
                        similarity: s.similarity,
                    },
                }
            })
            .collect()
    }

    /// Replacement from the registry using the article's topic and country
    async fn plan_external(
        &self,
        link: &ExternalLink,
        registry: &dyn AuthorityDomainRegistry,
    ) -> Result<Option<RepairAction>> {
        let article = self.graph.article(link.article_id);
        let query = DomainQuery {
            topic: article.and_then(|a| a.topic.clone()),
            country: article.and_then(|a| a.country.clone()),
            min_trust: self.config.min_trust_score,
            exclude_domain: Some(link.domain.clone()),
        };

        let Some(entry) = registry.lookup_best_match(&query).await? else {
            return Ok(None);
        };

        Ok(Some(RepairAction {
            kind: RepairActionKind::ReplaceExternalLink,
            article_id: link.article_id,
            detail: ActionDetail::ExternalLink {
                link_id: link.id,
                old_url: link.url.clone(),
                new_url: entry.replacement_url(),
                domain: entry.domain.clone(),
                trust_score: entry.trust_score,
            },
        }))
    }
}

/// Corpora are built lazily, once per language
fn corpus_for<'c>(
    corpora: &'c mut HashMap<String, Corpus>,
    graph: &LinkGraph,
    language: &str,
) -> &'c Corpus {
    corpora
        .entry(language.to_string())
        .or_insert_with(|| Corpus::build(graph, language))
}

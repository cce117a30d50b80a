//! Balance analyzer
//!
//! Degrees are always taken from the whole snapshot. The language and status
//! filters only decide which articles are measured and reported.

use super::{
    BalanceReport, BalanceSummary, Defect, DefectKind, DistributionStats, ImbalanceBand,
    Recommendation, RecommendationKind, Severity,
};
use crate::graph::LinkGraph;
use chrono::Utc;
use linkforge_common::config::BalanceConfig;
use linkforge_common::domain::{Article, ContentType, StatusScope};
use std::cmp::Reverse;
use tracing::debug;
use uuid::Uuid;

/// Read-only structural analysis of a link graph
pub struct BalanceAnalyzer {
    config: BalanceConfig,
}

impl BalanceAnalyzer {
    pub fn new(config: BalanceConfig) -> Self {
        Self { config }
    }

    /// Map an imbalance ratio to its band
    pub fn band(&self, ratio: f64) -> ImbalanceBand {
        if ratio < self.config.good_threshold {
            ImbalanceBand::Good
        } else if ratio < self.config.warning_threshold {
            ImbalanceBand::Warning
        } else {
            ImbalanceBand::Poor
        }
    }

    /// Analyze the graph with the configured status scope
    pub fn analyze(&self, graph: &LinkGraph, language: Option<&str>) -> BalanceReport {
        self.analyze_scoped(graph, language, self.config.status_scope)
    }

    pub fn analyze_scoped(
        &self,
        graph: &LinkGraph,
        language: Option<&str>,
        scope: StatusScope,
    ) -> BalanceReport {
        let considered: Vec<&Article> = graph
            .articles()
            .filter(|a| scope.includes(a.status))
            .filter(|a| language.map_or(true, |l| a.language == l))
            .collect();

        let inbound_counts: Vec<usize> = considered.iter().map(|a| graph.inbound_count(a.id)).collect();
        let outbound_counts: Vec<usize> = considered.iter().map(|a| graph.outbound_count(a.id)).collect();

        let inbound = DistributionStats::from_counts(&inbound_counts);
        let outbound = DistributionStats::from_counts(&outbound_counts);
        let imbalance_ratio = inbound.imbalance_ratio();
        let band = self.band(imbalance_ratio);

        let mut orphans = Vec::new();
        let mut dead_ends = Vec::new();
        for (article, (&inbound_count, &outbound_count)) in considered
            .iter()
            .zip(inbound_counts.iter().zip(&outbound_counts))
        {
            if inbound_count == 0 {
                orphans.push(defect(article, DefectKind::Orphan));
            }
            if outbound_count == 0 {
                dead_ends.push(defect(article, DefectKind::DeadEnd));
            }
        }

        // Most severe first, then id
        orphans.sort_by_key(|d| (Reverse(d.severity), d.article_id));
        dead_ends.sort_by_key(|d| (Reverse(d.severity), d.article_id));

        let mut recommendations = Vec::new();

        if let Some(worst) = orphans.first() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::LinkOrphans,
                severity: worst.severity,
                action: format!(
                    "Add at least one inbound internal link to {} orphan article(s)",
                    orphans.len()
                ),
                article_ids: orphans.iter().map(|d| d.article_id).collect(),
            });
        }

        if let Some(worst) = dead_ends.first() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::AddOutboundLinks,
                severity: worst.severity,
                action: format!(
                    "Add outbound internal links to {} dead-end article(s)",
                    dead_ends.len()
                ),
                article_ids: dead_ends.iter().map(|d| d.article_id).collect(),
            });
        }

        let unlinked_satellites: Vec<Uuid> = considered
            .iter()
            .filter(|a| a.content_type == ContentType::Satellite)
            .filter_map(|a| {
                let pillar = a.pillar_id?;
                (graph.contains(pillar) && !graph.has_edge(a.id, pillar)).then_some(a.id)
            })
            .collect();

        if !unlinked_satellites.is_empty() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::LinkSatellitesToPillar,
                severity: Severity::High,
                action: format!(
                    "Link {} satellite article(s) back to their pillar",
                    unlinked_satellites.len()
                ),
                article_ids: unlinked_satellites,
            });
        }

        let concentration_limit = inbound.mean + 2.0 * inbound.std_dev;
        let concentrated: Vec<Uuid> = considered
            .iter()
            .zip(&inbound_counts)
            .filter(|(_, count)| {
                **count >= self.config.concentration_floor && **count as f64 > concentration_limit
            })
            .map(|(a, _)| a.id)
            .collect();

        if !concentrated.is_empty() {
            recommendations.push(Recommendation {
                kind: RecommendationKind::SpreadConcentratedInbound,
                severity: Severity::Medium,
                action: format!(
                    "Redirect some inbound links away from {} over-linked article(s) (more than {:.1} inbound)",
                    concentrated.len(),
                    concentration_limit
                ),
                article_ids: concentrated,
            });
        }

        match band {
            ImbalanceBand::Good => {}
            ImbalanceBand::Warning | ImbalanceBand::Poor => {
                recommendations.push(Recommendation {
                    kind: RecommendationKind::Rebalance,
                    severity: if band == ImbalanceBand::Poor {
                        Severity::High
                    } else {
                        Severity::Medium
                    },
                    action: format!(
                        "Inbound links are unevenly distributed (imbalance ratio {:.2}); spread new links toward weakly linked articles",
                        imbalance_ratio
                    ),
                    article_ids: Vec::new(),
                });
            }
        }

        // Stable sort keeps insertion order within one severity
        recommendations.sort_by_key(|r| Reverse(r.severity));

        let summary = BalanceSummary {
            total_articles: graph.node_count(),
            considered_articles: considered.len(),
            total_links: graph.edge_count(),
            orphans: orphans.len(),
            dead_ends: dead_ends.len(),
            imbalance_ratio,
            band,
        };

        debug!(
            platform_id = %graph.platform_id(),
            considered = summary.considered_articles,
            orphans = summary.orphans,
            dead_ends = summary.dead_ends,
            imbalance_ratio = summary.imbalance_ratio,
            "Balance analysis complete"
        );

        BalanceReport {
            platform_id: graph.platform_id(),
            language: language.map(str::to_string),
            scope,
            generated_at: Utc::now(),
            summary,
            inbound,
            outbound,
            orphans,
            dead_ends,
            recommendations,
        }
    }
}

fn defect(article: &Article, kind: DefectKind) -> Defect {
    Defect {
        article_id: article.id,
        title: article.title.clone(),
        content_type: article.content_type,
        kind,
        severity: kind.severity_for(article.content_type),
    }
}

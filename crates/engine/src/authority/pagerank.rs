//! PageRank-based authority scoring
//!
//! Classic power iteration. Articles without outgoing links spread their
//! score uniformly over all articles so the vector keeps a total mass of 1.

use super::{ArticleAuthority, AuthorityScores};
use crate::graph::LinkGraph;
use crate::run::RunContext;
use linkforge_common::config::AuthorityConfig;
use linkforge_common::errors::{AppError, Result};
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

/// PageRank configuration
#[derive(Debug, Clone)]
pub struct PageRankConfig {
    /// Damping factor (typically 0.85)
    pub damping: f64,

    /// Maximum iterations
    pub max_iterations: usize,

    /// Convergence threshold on the L1 change between iterations
    pub epsilon: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            epsilon: 1e-6,
        }
    }
}

impl From<&AuthorityConfig> for PageRankConfig {
    fn from(config: &AuthorityConfig) -> Self {
        Self {
            damping: config.damping,
            max_iterations: config.max_iterations,
            epsilon: config.epsilon,
        }
    }
}

impl PageRankConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(AppError::validation("damping", "damping must be in (0, 1)"));
        }
        if !(self.epsilon > 0.0) {
            return Err(AppError::validation("epsilon", "epsilon must be positive"));
        }
        if self.max_iterations == 0 {
            return Err(AppError::validation(
                "max_iterations",
                "at least one iteration is required",
            ));
        }
        Ok(())
    }
}

/// PageRank scorer for articles
pub struct PageRankScorer {
    config: PageRankConfig,
}

impl PageRankScorer {
    /// Create a new scorer
    pub fn new(config: PageRankConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PageRankConfig {
        &self.config
    }

    /// Compute raw scores in node order.
    ///
    /// Returns the score vector, the number of iterations run and whether
    /// the L1 change fell below epsilon. Cancellation is checked between
    /// iterations.
    pub fn compute(&self, graph: &LinkGraph, ctx: &RunContext) -> Result<(Vec<f64>, usize, bool)> {
        self.config.validate()?;

        let nodes: Vec<Uuid> = graph.nodes().copied().collect();
        let n = nodes.len();
        if n == 0 {
            return Ok((Vec::new(), 0, true));
        }

        let position: HashMap<Uuid, usize> = nodes.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        // Predecessor positions per node
        let predecessors: Vec<Vec<usize>> = nodes
            .iter()
            .map(|&id| {
                graph
                    .incoming(id)
                    .iter()
                    .filter_map(|source| position.get(source).copied())
                    .collect()
            })
            .collect();

        let out_degree: Vec<usize> = nodes.iter().map(|&id| graph.outbound_count(id)).collect();
        let dangling: Vec<usize> = (0..n).filter(|&i| out_degree[i] == 0).collect();

        let n_f64 = n as f64;
        let damping = self.config.damping;
        let teleport = (1.0 - damping) / n_f64;

        let mut scores = vec![1.0 / n_f64; n];
        let mut next = vec![0.0; n];
        let mut iterations = 0;
        let mut converged = false;

        ctx.progress().reset(self.config.max_iterations);

        while iterations < self.config.max_iterations {
            ctx.check("compute_authority")?;

            let dangling_mass: f64 = dangling.iter().map(|&i| scores[i]).sum();
            let base = teleport + damping * dangling_mass / n_f64;

            for (i, preds) in predecessors.iter().enumerate() {
                let link_sum: f64 = preds
                    .iter()
                    .map(|&j| scores[j] / out_degree[j] as f64)
                    .sum();
                next[i] = base + damping * link_sum;
            }

            let diff: f64 = scores.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
            std::mem::swap(&mut scores, &mut next);
            iterations += 1;
            ctx.progress().advance(1);

            if diff < self.config.epsilon {
                converged = true;
                break;
            }
        }

        Ok((scores, iterations, converged))
    }

    /// Score and rank every article of the graph
    pub fn rank(&self, graph: &LinkGraph, ctx: &RunContext) -> Result<AuthorityScores> {
        let fingerprint = graph.fingerprint();
        let (raw, iterations, converged) = self.compute(graph, ctx)?;

        if raw.is_empty() {
            return Ok(AuthorityScores::empty(graph.platform_id(), fingerprint));
        }

        let max_score = raw.iter().cloned().fold(0.0f64, f64::max);

        let mut articles: Vec<ArticleAuthority> = graph
            .nodes()
            .zip(&raw)
            .map(|(&article_id, &raw)| ArticleAuthority {
                article_id,
                raw,
                score: if max_score > 0.0 { raw / max_score * 100.0 } else { 0.0 },
                rank: 0,
                inbound: graph.inbound_count(article_id),
                outbound: graph.outbound_count(article_id),
            })
            .collect();

        // Raw score descending, ties by id
        articles.sort_by(|a, b| {
            b.raw
                .partial_cmp(&a.raw)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.article_id.cmp(&b.article_id))
        });

        for (i, article) in articles.iter_mut().enumerate() {
            article.rank = i + 1;
        }

        Ok(AuthorityScores::new(
            graph.platform_id(),
            fingerprint,
            iterations,
            converged,
            articles,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::graph_with;

    fn scorer() -> PageRankScorer {
        PageRankScorer::new(PageRankConfig::default())
    }

    #[test]
    fn test_pagerank_basic() {
        // Create a simple graph:
        // A -> B -> C
        //      ^
        //      D
        // B should have highest score among A, B, D
        let graph = graph_with(4, &[(1, 2), (2, 3), (4, 2)]);
        let scores = scorer().rank(&graph, &RunContext::new()).unwrap();

        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        let d = Uuid::from_u128(4);

        assert!(scores.raw(b) > scores.raw(a));
        assert!(scores.raw(b) > scores.raw(d));
        assert!(scores.converged);
    }

    #[test]
    fn test_empty_graph() {
        let graph = graph_with(0, &[]);
        let scores = scorer().rank(&graph, &RunContext::new()).unwrap();
        assert!(scores.is_empty());
        assert!(scores.converged);
    }

    #[test]
    fn test_no_edges_gives_uniform_scores() {
        let graph = graph_with(4, &[]);
        let scores = scorer().rank(&graph, &RunContext::new()).unwrap();

        for article in &scores.articles {
            assert!((article.raw - 0.25).abs() < 1e-12);
            assert!((article.score - 100.0).abs() < 1e-9);
        }
        // Ties break by id
        let order: Vec<u128> = scores.articles.iter().map(|a| a.article_id.as_u128()).collect();
        assert_eq!(order, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_mass_conserved_with_dangling_nodes() {
        // 3 and 4 are dead-ends
        let graph = graph_with(4, &[(1, 3), (2, 3), (2, 4)]);
        let scores = scorer().rank(&graph, &RunContext::new()).unwrap();
        assert!((scores.total_mass() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalisation_and_rank() {
        let graph = graph_with(3, &[(1, 2), (3, 2), (2, 1)]);
        let scores = scorer().rank(&graph, &RunContext::new()).unwrap();

        let top = &scores.articles[0];
        assert_eq!(top.article_id, Uuid::from_u128(2));
        assert_eq!(top.rank, 1);
        assert!((top.score - 100.0).abs() < 1e-9);
        assert!(scores.articles.iter().all(|a| a.score >= 0.0 && a.score <= 100.0));
    }

    #[test]
    fn test_iteration_cap_is_soft() {
        let scorer = PageRankScorer::new(PageRankConfig {
            max_iterations: 1,
            epsilon: 1e-15,
            ..Default::default()
        });
        let graph = graph_with(3, &[(1, 2), (2, 3)]);
        let scores = scorer.rank(&graph, &RunContext::new()).unwrap();

        assert!(!scores.converged);
        assert_eq!(scores.iterations, 1);
        assert_eq!(scores.len(), 3);
    }

    #[test]
    fn test_invalid_damping_rejected() {
        let scorer = PageRankScorer::new(PageRankConfig {
            damping: 1.0,
            ..Default::default()
        });
        let graph = graph_with(2, &[(1, 2)]);
        assert!(matches!(
            scorer.rank(&graph, &RunContext::new()),
            Err(AppError::Validation { .. })
        ));
    }

    #[test]
    fn test_cancelled_run() {
        let ctx = RunContext::new();
        ctx.cancel();
        let graph = graph_with(2, &[(1, 2)]);
        assert!(matches!(
            scorer().rank(&graph, &ctx),
            Err(AppError::Cancelled { .. })
        ));
    }
}

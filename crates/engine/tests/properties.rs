//! Invariants checked over seeded random graphs

mod support;

use linkforge_common::domain::{Article, ContentType, InternalLink, PublicationStatus};
use linkforge_engine::authority::PageRankConfig;
use linkforge_engine::{BalanceAnalyzer, LinkGraph, PageRankScorer, RunContext, SimilaritySuggester};
use linkforge_common::config::{BalanceConfig, SuggestionConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use support::*;
use uuid::Uuid;

const VOCABULARY: &[&str] = &[
    "garden", "tomato", "compost", "seedling", "pruning", "orchard", "watering", "mulch",
    "greenhouse", "harvest", "soil", "fertilizer", "roses", "herbs", "pest", "irrigation",
];

fn precise() -> PageRankScorer {
    PageRankScorer::new(PageRankConfig {
        damping: 0.85,
        max_iterations: 1000,
        epsilon: 1e-10,
    })
}

fn random_article(rng: &mut StdRng, n: u128) -> Article {
    let words: Vec<&str> = (0..rng.gen_range(4..12))
        .map(|_| VOCABULARY[rng.gen_range(0..VOCABULARY.len())])
        .collect();
    let mut a = article(n, VOCABULARY[rng.gen_range(0..VOCABULARY.len())], &words.join(" "));
    if rng.gen_bool(0.2) {
        a.status = PublicationStatus::Draft;
    }
    a
}

fn random_graph(rng: &mut StdRng) -> LinkGraph {
    let n = rng.gen_range(2..30u128);
    let articles: Vec<Article> = (1..=n).map(|i| random_article(rng, i)).collect();
    let links: Vec<InternalLink> = (0..rng.gen_range(0..n * 3))
        .map(|_| edge(rng.gen_range(1..=n), rng.gen_range(1..=n)))
        .collect();
    LinkGraph::from_parts(PLATFORM, articles, &links)
}

#[test]
fn authority_mass_is_conserved() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..50 {
        let graph = random_graph(&mut rng);
        let scores = precise().rank(&graph, &RunContext::new()).unwrap();
        assert!(scores.converged);
        assert!((scores.total_mass() - 1.0).abs() < 1e-8, "mass {}", scores.total_mass());
    }
}

#[test]
fn adding_a_link_raises_the_target() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut checked = 0;

    while checked < 30 {
        let graph = random_graph(&mut rng);
        if graph.edge_count() == 0 {
            continue;
        }

        let nodes: Vec<Uuid> = graph.nodes().copied().collect();
        let source = nodes[rng.gen_range(0..nodes.len())];
        let target = nodes[rng.gen_range(0..nodes.len())];
        if source == target || graph.has_edge(source, target) {
            continue;
        }

        let before = precise().rank(&graph, &RunContext::new()).unwrap();

        let mut extended = graph.clone();
        assert!(extended.add_edge(source, target));
        let after = precise().rank(&extended, &RunContext::new()).unwrap();

        assert!(
            after.raw(target) > before.raw(target),
            "{} -> {}: {} vs {}",
            source,
            target,
            before.raw(target),
            after.raw(target)
        );
        checked += 1;
    }
}

#[test]
fn defects_follow_degree_and_publication() {
    let mut rng = StdRng::seed_from_u64(3);
    let analyzer = BalanceAnalyzer::new(BalanceConfig::default());

    for _ in 0..50 {
        let graph = random_graph(&mut rng);
        let report = analyzer.analyze(&graph, None);

        let orphans: HashSet<Uuid> = report.orphans.iter().map(|d| d.article_id).collect();
        let dead_ends: HashSet<Uuid> = report.dead_ends.iter().map(|d| d.article_id).collect();

        for article in graph.articles() {
            let published = article.is_published();
            assert_eq!(
                orphans.contains(&article.id),
                published && graph.inbound_count(article.id) == 0
            );
            assert_eq!(
                dead_ends.contains(&article.id),
                published && graph.outbound_count(article.id) == 0
            );
        }
    }
}

#[test]
fn suggestions_respect_quota_and_existing_links() {
    let mut rng = StdRng::seed_from_u64(19);
    let config = SuggestionConfig {
        max_links_per_run: 3,
        min_outbound_links: 2,
        min_similarity: 0.05,
        anchor_max_chars: 40,
    };
    let suggester = SimilaritySuggester::new(config.clone());

    for _ in 0..30 {
        let mut graph = random_graph(&mut rng);

        // Attach a satellite to the first article
        let pillar = *graph.nodes().next().unwrap();
        let mut satellite = random_article(&mut rng, 500);
        satellite.content_type = ContentType::Satellite;
        satellite.pillar_id = Some(pillar);
        graph.add_article(satellite);

        let authority = precise().rank(&graph, &RunContext::new()).unwrap();
        let nodes: Vec<Uuid> = graph.nodes().copied().collect();

        for source in nodes {
            let suggestions = suggester.suggest_for(&graph, &authority, source);
            assert!(suggestions.len() <= config.max_links_per_run);

            let mut targets = HashSet::new();
            for s in &suggestions {
                assert_eq!(s.source_article_id, source);
                assert_ne!(s.target_article_id, source);
                assert!(!graph.has_edge(source, s.target_article_id));
                assert!(targets.insert(s.target_article_id), "duplicate target");
                assert!(s.anchor_text.chars().count() <= config.anchor_max_chars);
            }
        }

        let first = suggester.suggest_for(&graph, &authority, Uuid::from_u128(500));
        assert_eq!(first[0].target_article_id, pillar);
    }
}

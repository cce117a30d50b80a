//! Internal link suggester
//!
//! Candidates share the source's platform and language and are published.
//! A satellite always gets its pillar link first; similarity picks fill the
//! remaining quota, and below-threshold picks top up to the outbound floor.

use super::anchor::anchor_text;
use super::tfidf::TfIdfIndex;
use super::tokenizer::tokenize;
use super::{Suggestion, SuggestionReason};
use crate::authority::AuthorityScores;
use crate::graph::LinkGraph;
use linkforge_common::config::SuggestionConfig;
use linkforge_common::domain::{Article, ContentType};
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

/// Keywords per target considered for anchor spans
const ANCHOR_KEYWORDS: usize = 8;

/// TF-IDF corpus of one language of a snapshot
#[derive(Debug)]
pub struct Corpus {
    language: String,
    index: TfIdfIndex,
}

impl Corpus {
    /// Index every article of the graph written in `language`
    pub fn build(graph: &LinkGraph, language: &str) -> Self {
        let documents = graph
            .articles()
            .filter(|a| a.language == language)
            .map(|a| (a.id, document_tokens(a)));

        Self {
            language: language.to_string(),
            index: TfIdfIndex::build(documents),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn index(&self) -> &TfIdfIndex {
        &self.index
    }

    pub fn similarity(&self, a: Uuid, b: Uuid) -> f64 {
        self.index.similarity(a, b)
    }
}

/// Title terms are part of every document
fn document_tokens(article: &Article) -> Vec<String> {
    let mut tokens = tokenize(&article.title, &article.language);
    tokens.extend(tokenize(&article.content, &article.language));
    tokens
}

/// Proposes new internal links by content similarity
pub struct SimilaritySuggester {
    config: SuggestionConfig,
}

impl SimilaritySuggester {
    pub fn new(config: SuggestionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SuggestionConfig {
        &self.config
    }

    /// Suggestions for one article, building the corpus on the fly
    pub fn suggest_for(
        &self,
        graph: &LinkGraph,
        authority: &AuthorityScores,
        source_id: Uuid,
    ) -> Vec<Suggestion> {
        let Some(source) = graph.article(source_id) else {
            return Vec::new();
        };
        let corpus = Corpus::build(graph, &source.language);
        self.suggest(graph, &corpus, authority, source_id, &HashSet::new())
    }

    /// Suggestions for one article against a prebuilt corpus.
    ///
    /// `excluded` holds (source, target) pairs already planned elsewhere;
    /// they are treated like existing links.
    pub fn suggest(
        &self,
        graph: &LinkGraph,
        corpus: &Corpus,
        authority: &AuthorityScores,
        source_id: Uuid,
        excluded: &HashSet<(Uuid, Uuid)>,
    ) -> Vec<Suggestion> {
        let quota = self.config.max_links_per_run;
        let Some(source) = graph.article(source_id) else {
            return Vec::new();
        };
        if quota == 0 {
            return Vec::new();
        }

        let taken = |target: Uuid| {
            target == source_id || graph.has_edge(source_id, target) || excluded.contains(&(source_id, target))
        };

        let mut suggestions: Vec<Suggestion> = Vec::new();

        // Satellite -> pillar comes first and counts against the quota
        if source.content_type == ContentType::Satellite {
            if let Some(pillar) = source.pillar_id.and_then(|id| graph.article(id)) {
                if !taken(pillar.id) {
                    suggestions.push(self.suggestion(
                        source,
                        pillar,
                        corpus,
                        authority,
                        corpus.similarity(source_id, pillar.id),
                        SuggestionReason::Pillar,
                    ));
                }
            }
        }

        if corpus.language() != source.language || corpus.index().len() < 2 {
            return suggestions;
        }

        let mut candidates: Vec<(&Article, f64)> = corpus
            .index()
            .most_similar(source_id)
            .into_iter()
            .filter(|&(target, _)| !taken(target))
            .filter(|&(target, _)| !suggestions.iter().any(|s| s.target_article_id == target))
            .filter_map(|(target, similarity)| {
                graph
                    .article(target)
                    .filter(|a| a.is_published() && a.platform_id == source.platform_id)
                    .map(|a| (a, similarity))
            })
            .collect();

        // Similarity descending, then target authority, then id
        candidates.sort_by(|(a, sa), (b, sb)| {
            sb.partial_cmp(sa)
                .unwrap_or(Ordering::Equal)
                .then_with(|| {
                    authority
                        .raw(b.id)
                        .partial_cmp(&authority.raw(a.id))
                        .unwrap_or(Ordering::Equal)
                })
                .then_with(|| a.id.cmp(&b.id))
        });

        let (above, below): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|&(_, similarity)| similarity >= self.config.min_similarity);

        for (target, similarity) in above {
            if suggestions.len() >= quota {
                break;
            }
            suggestions.push(self.suggestion(
                source,
                target,
                corpus,
                authority,
                similarity,
                SuggestionReason::Similarity,
            ));
        }

        let existing = graph.outbound_count(source_id);
        for (target, similarity) in below {
            if suggestions.len() >= quota
                || existing + suggestions.len() >= self.config.min_outbound_links
            {
                break;
            }
            suggestions.push(self.suggestion(
                source,
                target,
                corpus,
                authority,
                similarity,
                SuggestionReason::OutboundFloor,
            ));
        }

        debug!(
            source_article_id = %source_id,
            count = suggestions.len(),
            "Link suggestions computed"
        );

        suggestions
    }

    fn suggestion(
        &self,
        source: &Article,
        target: &Article,
        corpus: &Corpus,
        authority: &AuthorityScores,
        similarity: f64,
        reason: SuggestionReason,
    ) -> Suggestion {
        let keywords: Vec<&str> = corpus
            .index()
            .top_terms(target.id, ANCHOR_KEYWORDS)
            .into_iter()
            .map(|(term, _)| term)
            .collect();

        Suggestion {
            source_article_id: source.id,
            target_article_id: target.id,
            target_title: target.title.clone(),
            similarity,
            target_authority: authority.score(target.id),
            anchor_text: anchor_text(source, target, &keywords, self.config.anchor_max_chars),
            reason,
        }
    }
}

//! Content-similarity link suggestions
//!
//! Provides:
//! - Markup-aware tokenization with per-language stopwords
//! - Sparse TF-IDF vectors and cosine similarity
//! - Quota-bounded internal link suggestions with the pillar rule

mod anchor;
mod suggester;
mod tfidf;
pub mod tokenizer;

pub use anchor::{anchor_text, truncate};
pub use suggester::{Corpus, SimilaritySuggester};
pub use tfidf::TfIdfIndex;

use serde::Serialize;
use uuid::Uuid;

/// Why a suggestion was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionReason {
    /// Satellite back-link to its pillar
    Pillar,
    /// Similarity at or above the threshold
    Similarity,
    /// Below-threshold candidate used to reach the outbound floor
    OutboundFloor,
}

impl SuggestionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionReason::Pillar => "pillar",
            SuggestionReason::Similarity => "similarity",
            SuggestionReason::OutboundFloor => "outbound_floor",
        }
    }
}

/// Proposed new internal link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub source_article_id: Uuid,
    pub target_article_id: Uuid,
    pub target_title: String,
    /// Cosine similarity of the two articles
    pub similarity: f64,
    /// Presentation authority of the target, 0-100
    pub target_authority: f64,
    pub anchor_text: String,
    pub reason: SuggestionReason,
}

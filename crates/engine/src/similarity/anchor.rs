//! Anchor text selection

use super::tokenizer::{normalize, strip_markup, tokenize};
use linkforge_common::domain::Article;
use std::collections::HashSet;

/// Longest keyword span taken from the source text, in words
const MAX_SPAN_WORDS: usize = 4;

/// Shortest keyword span worth using instead of the title
const MIN_SPAN_WORDS: usize = 2;

/// Pick anchor text for a link from `source` to `target`.
///
/// The target title is used when the source already mentions it. Otherwise
/// the longest run of source words that are target keywords is used, and
/// the title again when no such run exists. The result is cut at a word
/// boundary to `max_chars`.
pub fn anchor_text(source: &Article, target: &Article, keywords: &[&str], max_chars: usize) -> String {
    let title = target.title.trim();
    let source_text = normalize(&source.content);

    if !title.is_empty() && source_text.contains(&title.to_lowercase()) {
        return truncate(title, max_chars);
    }

    let mut wanted: HashSet<String> = tokenize(title, &target.language).into_iter().collect();
    wanted.extend(keywords.iter().map(|k| k.to_string()));

    match keyword_span(&strip_markup(&source.content), &wanted) {
        Some(span) => truncate(&span, max_chars),
        None => truncate(title, max_chars),
    }
}

/// Longest run of consecutive keyword words, first occurrence wins
fn keyword_span(text: &str, keywords: &HashSet<String>) -> Option<String> {
    let words: Vec<&str> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .collect();

    let mut best: Option<(usize, usize)> = None;
    let mut start = 0;

    for (i, word) in words.iter().enumerate() {
        if word.is_empty() || !keywords.contains(&word.to_lowercase()) {
            start = i + 1;
            continue;
        }
        let from = start.max((i + 1).saturating_sub(MAX_SPAN_WORDS));
        let len = i + 1 - from;
        if best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((from, len));
        }
    }

    best.filter(|&(_, len)| len >= MIN_SPAN_WORDS)
        .map(|(from, len)| words[from..from + len].join(" "))
}

/// Cut to at most `max_chars` characters, preferring a word boundary
pub fn truncate(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    let next_is_break = text
        .chars()
        .nth(max_chars)
        .map_or(true, char::is_whitespace);

    if next_is_break {
        return cut.trim_end().to_string();
    }

    match cut.rfind(char::is_whitespace) {
        Some(pos) if pos > 0 => cut[..pos].trim_end().to_string(),
        _ => cut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::article;

    #[test]
    fn test_title_mentioned_in_source() {
        let source = Article {
            content: "See our <b>Income Tax Guide</b> for details.".to_string(),
            ..article(1)
        };
        let target = Article {
            title: "Income Tax Guide".to_string(),
            ..article(2)
        };
        assert_eq!(anchor_text(&source, &target, &[], 60), "Income Tax Guide");
    }

    #[test]
    fn test_keyword_span_from_source() {
        let source = Article {
            content: "When filing, quarterly pension contributions matter a lot.".to_string(),
            ..article(1)
        };
        let target = Article {
            title: "Pension contributions explained".to_string(),
            ..article(2)
        };
        let anchor = anchor_text(&source, &target, &["quarterly"], 60);
        assert_eq!(anchor, "quarterly pension contributions");
    }

    #[test]
    fn test_falls_back_to_title() {
        let source = Article {
            content: "Nothing related here.".to_string(),
            ..article(1)
        };
        let target = Article {
            title: "Garden irrigation".to_string(),
            ..article(2)
        };
        assert_eq!(anchor_text(&source, &target, &[], 60), "Garden irrigation");
    }

    #[test]
    fn test_span_is_capped() {
        let keywords: HashSet<String> = ["alpha", "beta", "gamma", "delta", "epsilon"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let span = keyword_span("alpha beta gamma delta epsilon", &keywords).unwrap();
        assert_eq!(span, "alpha beta gamma delta");
    }

    #[test]
    fn test_truncate_on_word_boundary() {
        assert_eq!(truncate("Complete guide to taxes", 14), "Complete guide");
        assert_eq!(truncate("Complete guide", 14), "Complete guide");
        assert_eq!(truncate("Supercalifragilistic", 5), "Super");
    }
}

//! Text normalisation and tokenization
//!
//! Markup is removed before splitting: markdown links keep their label,
//! HTML tags, entities and bare URLs are dropped. Tokens are lowercase
//! alphanumeric runs of at least three characters that are not pure
//! numbers and not stopwords of the article's language.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::{HashMap, HashSet};

/// Minimum token length in characters
pub const MIN_TOKEN_CHARS: usize = 3;

static MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").expect("markdown link pattern"));

static HTML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("html tag pattern"));

static HTML_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#?[A-Za-z0-9]+;").expect("html entity pattern"));

static URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:https?://|www\.)\S+").expect("url pattern"));

static STOPWORDS: Lazy<HashMap<&'static str, HashSet<&'static str>>> = Lazy::new(|| {
    let mut lists = HashMap::new();
    lists.insert("en", EN.iter().copied().collect());
    lists.insert("fr", FR.iter().copied().collect());
    lists.insert("es", ES.iter().copied().collect());
    lists.insert("de", DE.iter().copied().collect());
    lists.insert("it", IT.iter().copied().collect());
    lists.insert("pt", PT.iter().copied().collect());
    lists
});

static EMPTY: Lazy<HashSet<&'static str>> = Lazy::new(HashSet::new);

const EN: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "any", "can", "had", "her", "was",
    "one", "our", "out", "has", "have", "him", "his", "how", "its", "may", "new", "now", "old",
    "see", "two", "way", "who", "did", "get", "let", "say", "she", "too", "use", "that", "with",
    "this", "from", "they", "will", "would", "there", "their", "what", "about", "which", "when",
    "make", "like", "time", "just", "know", "take", "into", "year", "your", "some", "could",
    "them", "than", "then", "look", "only", "come", "over", "also", "back", "after", "first",
    "well", "even", "want", "because", "these", "give", "most", "more", "very", "been", "were",
    "does", "each", "such", "here", "where", "while", "should", "other", "those", "being",
    "through", "between", "both", "under", "again", "before", "same", "own", "off", "yes",
];

const FR: &[&str] = &[
    "les", "des", "une", "est", "pas", "que", "qui", "dans", "pour", "par", "sur", "avec", "son",
    "ses", "aux", "ces", "mais", "ont", "plus", "tout", "tous", "toute", "elle", "ils", "elles",
    "nous", "vous", "leur", "leurs", "sont", "comme", "cette", "cet", "entre", "aussi", "sans",
    "sous", "dont", "fait", "peut", "avoir", "être", "était", "ainsi", "donc", "car", "lors",
    "chez", "même", "très", "bien", "encore", "votre", "notre", "quand", "alors",
];

const ES: &[&str] = &[
    "los", "las", "del", "una", "por", "con", "para", "que", "como", "más", "pero", "sus", "este",
    "esta", "estos", "estas", "son", "ser", "está", "hay", "muy", "sin", "sobre", "también",
    "entre", "cuando", "todo", "todos", "donde", "desde", "puede", "tiene", "porque", "así",
    "otro", "otros", "hasta", "nos", "ese", "esa", "eso", "cual", "fue", "era",
];

const DE: &[&str] = &[
    "der", "die", "das", "und", "den", "dem", "des", "ein", "eine", "einer", "eines", "einem",
    "nicht", "mit", "sich", "auf", "für", "ist", "von", "auch", "als", "wie", "bei", "aus",
    "nach", "wird", "werden", "sind", "oder", "aber", "wenn", "noch", "nur", "über", "kann",
    "hat", "haben", "sein", "ihre", "ihr", "zum", "zur", "durch", "unter", "sehr", "diese",
    "dieser", "dieses", "man", "mehr", "schon",
];

const IT: &[&str] = &[
    "che", "non", "per", "una", "con", "del", "della", "delle", "dei", "degli", "nel", "nella",
    "sono", "come", "più", "anche", "suo", "sua", "loro", "questo", "questa", "quello", "quella",
    "tra", "fra", "dal", "dalla", "alla", "allo", "agli", "alle", "essere", "stato", "molto",
    "tutto", "tutti", "quando", "dove", "perché", "ogni", "hanno", "gli",
];

const PT: &[&str] = &[
    "que", "não", "uma", "com", "para", "por", "dos", "das", "mais", "como", "mas", "foi", "ele",
    "ela", "eles", "elas", "seu", "sua", "seus", "suas", "são", "ser", "está", "tem", "muito",
    "também", "quando", "onde", "entre", "sobre", "este", "esta", "isso", "isto", "pelo",
    "pela", "nos", "nas", "aos", "até", "sem", "já", "ainda",
];

/// Stopword list of a language; English when the language is unknown
pub fn stopwords(language: &str) -> &'static HashSet<&'static str> {
    let code = language.get(..2).unwrap_or(language).to_ascii_lowercase();
    STOPWORDS
        .get(code.as_str())
        .or_else(|| STOPWORDS.get("en"))
        .unwrap_or(&*EMPTY)
}

/// Strip markup and URLs, keeping link labels and original casing
pub fn strip_markup(text: &str) -> String {
    let text = MARKDOWN_LINK.replace_all(text, " $1 ");
    let text = HTML_TAG.replace_all(&text, " ");
    let text = HTML_ENTITY.replace_all(&text, " ");
    URL.replace_all(&text, " ").into_owned()
}

/// Markup-free lowercase text
pub fn normalize(text: &str) -> String {
    strip_markup(text).to_lowercase()
}

/// Normalised tokens of a text, in order of appearance
pub fn tokenize(text: &str, language: &str) -> Vec<String> {
    let stop = stopwords(language);
    normalize(text)
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= MIN_TOKEN_CHARS)
        .filter(|w| !w.chars().all(|c| c.is_numeric()))
        .filter(|w| !stop.contains(w))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_markup() {
        let text = r#"<p>Read the <a href="/x">guide</a> at https://example.com/page and [tax tips](https://t.co/1)&nbsp;now</p>"#;
        let tokens = tokenize(text, "en");
        assert_eq!(tokens, vec!["read", "guide", "tax", "tips"]);
    }

    #[test]
    fn test_drops_short_numeric_and_stopwords() {
        let tokens = tokenize("The 2024 budget of an EU state is 300 euros", "en");
        assert_eq!(tokens, vec!["budget", "state", "euros"]);
    }

    #[test]
    fn test_language_specific_stopwords() {
        let tokens = tokenize("Les impôts dans une région française", "fr");
        assert_eq!(tokens, vec!["impôts", "région", "française"]);
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        assert!(stopwords("xx").contains("the"));
        assert!(stopwords("fr-CA").contains("les"));
    }
}

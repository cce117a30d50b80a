//! Sparse TF-IDF vectors
//!
//! Term frequency is normalised by document length, IDF is smoothed as
//! `ln((1 + N) / (1 + df)) + 1`, and each vector is L2-normalised so the
//! cosine of two documents is the dot product of their vectors.

use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

/// Sparse vector as (term id, weight), sorted by term id
type SparseVector = Vec<(u32, f64)>;

/// TF-IDF index over one candidate corpus
#[derive(Debug, Default)]
pub struct TfIdfIndex {
    vocabulary: HashMap<String, u32>,
    terms: Vec<String>,
    idf: Vec<f64>,
    vectors: Vec<SparseVector>,
    positions: HashMap<Uuid, usize>,
    ids: Vec<Uuid>,
}

impl TfIdfIndex {
    /// Build the index from tokenized documents
    pub fn build<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = (Uuid, Vec<String>)>,
    {
        let mut index = Self::default();
        let mut counts: Vec<HashMap<u32, usize>> = Vec::new();
        let mut lengths: Vec<usize> = Vec::new();

        for (id, tokens) in documents {
            if index.positions.contains_key(&id) {
                continue;
            }

            let mut tf: HashMap<u32, usize> = HashMap::new();
            for token in &tokens {
                let term = index.term_id(token);
                *tf.entry(term).or_default() += 1;
            }

            index.positions.insert(id, index.ids.len());
            index.ids.push(id);
            lengths.push(tokens.len());
            counts.push(tf);
        }

        let n = index.ids.len() as f64;
        let mut df = vec![0usize; index.terms.len()];
        for tf in &counts {
            for &term in tf.keys() {
                df[term as usize] += 1;
            }
        }

        index.idf = df
            .iter()
            .map(|&d| ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        index.vectors = counts
            .into_iter()
            .zip(lengths)
            .map(|(tf, len)| {
                let mut vector: SparseVector = tf
                    .into_iter()
                    .map(|(term, count)| {
                        let weight = count as f64 / len.max(1) as f64 * index.idf[term as usize];
                        (term, weight)
                    })
                    .collect();
                vector.sort_unstable_by_key(|&(term, _)| term);

                let norm = vector.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in vector.iter_mut() {
                        *w /= norm;
                    }
                }
                vector
            })
            .collect();

        index
    }

    fn term_id(&mut self, token: &str) -> u32 {
        if let Some(&id) = self.vocabulary.get(token) {
            return id;
        }
        let id = self.terms.len() as u32;
        self.vocabulary.insert(token.to_string(), id);
        self.terms.push(token.to_string());
        id
    }

    /// Number of documents
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.positions.contains_key(&id)
    }

    /// Document ids in insertion order
    pub fn ids(&self) -> &[Uuid] {
        &self.ids
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.vocabulary.get(term).map(|&t| self.idf[t as usize])
    }

    /// Cosine similarity of two indexed documents; 0.0 if either is unknown
    pub fn similarity(&self, a: Uuid, b: Uuid) -> f64 {
        match (self.positions.get(&a), self.positions.get(&b)) {
            (Some(&i), Some(&j)) => dot(&self.vectors[i], &self.vectors[j]),
            _ => 0.0,
        }
    }

    /// All other documents with a positive similarity, best first, ties by id
    pub fn most_similar(&self, id: Uuid) -> Vec<(Uuid, f64)> {
        let Some(&i) = self.positions.get(&id) else {
            return Vec::new();
        };

        let mut scored: Vec<(Uuid, f64)> = self
            .vectors
            .iter()
            .enumerate()
            .filter(|&(j, _)| j != i)
            .map(|(j, v)| (self.ids[j], dot(&self.vectors[i], v)))
            .filter(|&(_, s)| s > 0.0)
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        scored
    }

    /// Highest weighted terms of a document
    pub fn top_terms(&self, id: Uuid, limit: usize) -> Vec<(&str, f64)> {
        let Some(&i) = self.positions.get(&id) else {
            return Vec::new();
        };

        let mut terms: Vec<(&str, f64)> = self.vectors[i]
            .iter()
            .map(|&(t, w)| (self.terms[t as usize].as_str(), w))
            .collect();
        terms.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(b.0))
        });
        terms.truncate(limit);
        terms
    }

    /// Weight of a term in a document
    pub fn weight(&self, id: Uuid, term: &str) -> f64 {
        let (Some(&i), Some(&t)) = (self.positions.get(&id), self.vocabulary.get(term)) else {
            return 0.0;
        };
        self.vectors[i]
            .binary_search_by_key(&t, |&(term, _)| term)
            .map(|k| self.vectors[i][k].1)
            .unwrap_or(0.0)
    }
}

/// Dot product of two sorted sparse vectors
fn dot(a: &[(u32, f64)], b: &[(u32, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut sum = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

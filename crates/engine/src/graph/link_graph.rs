//! Link graph representation

use linkforge_common::db::GraphRepository;
use linkforge_common::domain::{Article, InternalLink};
use linkforge_common::errors::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// What the build step kept and dropped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotStats {
    pub articles: usize,
    pub edges: usize,
    pub self_loops_dropped: usize,
    /// Edges with an endpoint outside the loaded article set
    pub dangling_dropped: usize,
    /// Repeated (source, target) pairs
    pub duplicates_dropped: usize,
}

/// In-memory link graph for one platform
#[derive(Debug, Clone)]
pub struct LinkGraph {
    platform_id: Uuid,

    /// Nodes keyed by id; iteration order is the id order
    articles: BTreeMap<Uuid, Article>,

    /// Adjacency list: article_id -> articles it links to
    outgoing: HashMap<Uuid, Vec<Uuid>>,

    /// Reverse adjacency: article_id -> articles linking to it
    incoming: HashMap<Uuid, Vec<Uuid>>,

    edges: HashSet<(Uuid, Uuid)>,

    /// Pairs whose link was created by the engine
    automatic: HashSet<(Uuid, Uuid)>,

    stats: SnapshotStats,
}

impl LinkGraph {
    /// Create an empty graph
    pub fn new(platform_id: Uuid) -> Self {
        Self {
            platform_id,
            articles: BTreeMap::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            edges: HashSet::new(),
            automatic: HashSet::new(),
            stats: SnapshotStats::default(),
        }
    }

    /// Build a graph from already loaded rows
    pub fn from_parts(platform_id: Uuid, articles: Vec<Article>, links: &[InternalLink]) -> Self {
        let mut graph = Self::new(platform_id);

        for article in articles {
            graph.add_article(article);
        }

        for link in links {
            graph.add_link(link.source_article_id, link.target_article_id, link.is_automatic);
        }

        debug!(
            platform_id = %platform_id,
            articles = graph.stats.articles,
            edges = graph.stats.edges,
            self_loops = graph.stats.self_loops_dropped,
            dangling = graph.stats.dangling_dropped,
            duplicates = graph.stats.duplicates_dropped,
            "Link graph built"
        );

        graph
    }

    /// Load a platform snapshot through the repository
    pub async fn load(
        repo: &dyn GraphRepository,
        platform_id: Uuid,
        language: Option<&str>,
    ) -> Result<Self> {
        let articles = repo.load_articles(platform_id, language).await?;
        let links = repo.load_internal_links(platform_id).await?;
        Ok(Self::from_parts(platform_id, articles, &links))
    }

    /// Add a node
    pub fn add_article(&mut self, article: Article) {
        if self.articles.insert(article.id, article).is_none() {
            self.stats.articles += 1;
        }
    }

    /// Add a human-created edge; returns false when the edge was dropped
    pub fn add_edge(&mut self, source: Uuid, target: Uuid) -> bool {
        self.add_link(source, target, false)
    }

    /// Add an edge between two known articles
    pub fn add_link(&mut self, source: Uuid, target: Uuid, is_automatic: bool) -> bool {
        if source == target {
            self.stats.self_loops_dropped += 1;
            return false;
        }

        if !self.articles.contains_key(&source) || !self.articles.contains_key(&target) {
            self.stats.dangling_dropped += 1;
            return false;
        }

        if !self.edges.insert((source, target)) {
            self.stats.duplicates_dropped += 1;
            if is_automatic {
                self.automatic.insert((source, target));
            }
            return false;
        }

        if is_automatic {
            self.automatic.insert((source, target));
        }

        self.outgoing.entry(source).or_default().push(target);
        self.incoming.entry(target).or_default().push(source);
        self.stats.edges += 1;
        true
    }

    pub fn platform_id(&self) -> Uuid {
        self.platform_id
    }

    pub fn stats(&self) -> SnapshotStats {
        self.stats
    }

    /// Get articles this article links to
    pub fn outgoing(&self, article_id: Uuid) -> &[Uuid] {
        self.outgoing.get(&article_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Get articles linking to this article
    pub fn incoming(&self, article_id: Uuid) -> &[Uuid] {
        self.incoming.get(&article_id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Node ids in ascending order
    pub fn nodes(&self) -> impl Iterator<Item = &Uuid> {
        self.articles.keys()
    }

    /// Articles in ascending id order
    pub fn articles(&self) -> impl Iterator<Item = &Article> {
        self.articles.values()
    }

    pub fn article(&self, article_id: Uuid) -> Option<&Article> {
        self.articles.get(&article_id)
    }

    pub fn contains(&self, article_id: Uuid) -> bool {
        self.articles.contains_key(&article_id)
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.articles.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Incoming edge count
    pub fn inbound_count(&self, article_id: Uuid) -> usize {
        self.incoming.get(&article_id).map(|v| v.len()).unwrap_or(0)
    }

    /// Outgoing edge count
    pub fn outbound_count(&self, article_id: Uuid) -> usize {
        self.outgoing.get(&article_id).map(|v| v.len()).unwrap_or(0)
    }

    pub fn has_edge(&self, source: Uuid, target: Uuid) -> bool {
        self.edges.contains(&(source, target))
    }

    pub fn is_automatic(&self, source: Uuid, target: Uuid) -> bool {
        self.automatic.contains(&(source, target))
    }

    /// All edges sorted by (source, target)
    pub fn edges(&self) -> Vec<(Uuid, Uuid)> {
        let mut edges: Vec<(Uuid, Uuid)> = self.edges.iter().copied().collect();
        edges.sort_unstable();
        edges
    }

    /// Stable content hash of the node and edge sets
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.platform_id.as_bytes());

        for id in self.articles.keys() {
            hasher.update(b"n");
            hasher.update(id.as_bytes());
        }

        for (source, target) in self.edges() {
            hasher.update(b"e");
            hasher.update(source.as_bytes());
            hasher.update(target.as_bytes());
        }

        hex::encode(hasher.finalize())
    }
}

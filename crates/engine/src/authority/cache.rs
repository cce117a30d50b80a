//! Per-platform authority cache
//!
//! Scores are never updated incrementally. A cached entry is served only
//! while the snapshot fingerprint is unchanged; repair invalidates
//! explicitly after it writes.

use super::AuthorityScores;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct AuthorityCache {
    entries: RwLock<HashMap<Uuid, Arc<AuthorityScores>>>,
}

impl AuthorityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached scores for the platform if they match the fingerprint
    pub async fn get(&self, platform_id: Uuid, fingerprint: &str) -> Option<Arc<AuthorityScores>> {
        let entries = self.entries.read().await;
        entries
            .get(&platform_id)
            .filter(|scores| scores.fingerprint == fingerprint)
            .cloned()
    }

    pub async fn put(&self, scores: AuthorityScores) -> Arc<AuthorityScores> {
        let scores = Arc::new(scores);
        self.entries
            .write()
            .await
            .insert(scores.platform_id, scores.clone());
        scores
    }

    /// Drop the cached entry; returns whether one existed
    pub async fn invalidate(&self, platform_id: Uuid) -> bool {
        let removed = self.entries.write().await.remove(&platform_id).is_some();
        if removed {
            debug!(platform_id = %platform_id, "Authority cache invalidated");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

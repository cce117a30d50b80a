//! Per-article write locks

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

/// Keyed async mutexes; holders of the same article key run one at a time
#[derive(Debug, Default)]
pub struct ArticleLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ArticleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive write access to an article's links
    pub async fn lock(&self, article_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(article_id).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Forget locks nobody holds or waits for
    pub async fn prune(&self) {
        self.locks
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_article_is_serialised() {
        let locks = Arc::new(ArticleLocks::new());
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let active = active.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(Uuid::from_u128(1)).await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_articles_do_not_block() {
        let locks = ArticleLocks::new();
        let _a = locks.lock(Uuid::from_u128(1)).await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock(Uuid::from_u128(2))).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_prune_keeps_held_locks() {
        let locks = ArticleLocks::new();
        let held = locks.lock(Uuid::from_u128(1)).await;
        drop(locks.lock(Uuid::from_u128(2)).await);

        locks.prune().await;
        assert_eq!(locks.len().await, 1);
        drop(held);
    }
}

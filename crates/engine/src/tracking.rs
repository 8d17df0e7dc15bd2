use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use aquawatch_common::keys;

use crate::kv::{KvError, KvStore};

/// Per-condition firing marker. Presence of the key means the condition is
/// currently alerting; the TTL self-heals an orphaned marker when the
/// resolve transition is never observed (a station that stops reporting
/// while firing). All three operations run under the condition's lock.
#[derive(Clone)]
pub struct TrackingStore {
    store: Arc<dyn KvStore>,
}

impl TrackingStore {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn is_firing(&self, condition_uid: Uuid) -> Result<bool, KvError> {
        self.store.exists(&keys::tracking_key(condition_uid)).await
    }

    pub async fn mark_firing(&self, condition_uid: Uuid, ttl: Duration) -> Result<(), KvError> {
        self.store
            .set_with_ttl(&keys::tracking_key(condition_uid), "1", ttl)
            .await
    }

    pub async fn clear_firing(&self, condition_uid: Uuid) -> Result<(), KvError> {
        self.store.del(&[keys::tracking_key(condition_uid)]).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryKv;

    fn tracking() -> TrackingStore {
        TrackingStore::new(Arc::new(MemoryKv::new()))
    }

    #[tokio::test]
    async fn mark_then_clear() {
        let t = tracking();
        let uid = Uuid::new_v4();
        assert!(!t.is_firing(uid).await.unwrap());

        t.mark_firing(uid, Duration::from_secs(60)).await.unwrap();
        assert!(t.is_firing(uid).await.unwrap());

        t.clear_firing(uid).await.unwrap();
        assert!(!t.is_firing(uid).await.unwrap());
    }

    #[tokio::test]
    async fn marker_expires() {
        let t = tracking();
        let uid = Uuid::new_v4();
        t.mark_firing(uid, Duration::from_millis(20)).await.unwrap();
        assert!(t.is_firing(uid).await.unwrap());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!t.is_firing(uid).await.unwrap());
    }

    #[tokio::test]
    async fn conditions_are_independent() {
        let t = tracking();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        t.mark_firing(a, Duration::from_secs(60)).await.unwrap();
        assert!(t.is_firing(a).await.unwrap());
        assert!(!t.is_firing(b).await.unwrap());
    }
}

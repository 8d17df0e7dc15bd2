use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::store::{KvError, KvStore};

const ACQUIRE_POLL: Duration = Duration::from_millis(50);

/// Mutual exclusion keyed on an arbitrary store key, with a bounded
/// acquisition wait and an expiring lease so a crashed holder cannot pin
/// the key forever.
#[derive(Clone)]
pub struct KvLock {
    store: Arc<dyn KvStore>,
}

/// Held lease. The guard's token ties release to this acquisition: once
/// the lease has lapsed and someone else holds the key, release is a no-op
/// instead of a steal.
pub struct LockGuard {
    store: Arc<dyn KvStore>,
    key: String,
    token: String,
}

impl KvLock {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// `Ok(None)` when the wait deadline passes without acquiring.
    pub async fn acquire(
        &self,
        key: &str,
        wait: Duration,
        lease: Duration,
    ) -> Result<Option<LockGuard>, KvError> {
        let token = Uuid::new_v4().to_string();
        let deadline = tokio::time::Instant::now() + wait;

        loop {
            if self.store.set_nx_with_ttl(key, &token, lease).await? {
                return Ok(Some(LockGuard {
                    store: Arc::clone(&self.store),
                    key: key.to_string(),
                    token,
                }));
            }
            let now = tokio::time::Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            tokio::time::sleep(ACQUIRE_POLL.min(deadline - now)).await;
        }
    }
}

impl LockGuard {
    pub async fn release(self) {
        if let Err(e) = self.store.del_if(&self.key, &self.token).await {
            tracing::warn!(key = %self.key, error = %e, "lock release failed; lease will expire");
        }
    }
}

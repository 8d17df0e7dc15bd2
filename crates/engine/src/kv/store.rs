use std::time::Duration;

/// Write operation for pipelined batches. The index publishes a value key
/// and its membership-set entry in one round trip, and the reconciler
/// replaces whole generations in bounded chunks.
#[derive(Debug, Clone)]
pub enum KvOp {
    Set { key: String, value: String },
    SAdd { key: String, member: String },
    Del { key: String },
    SRem { key: String, member: String },
}

#[derive(Debug)]
pub struct KvError(pub String);

impl std::fmt::Display for KvError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "kv: {}", self.0)
    }
}

impl std::error::Error for KvError {}

/// Shared key-value store backing the rule index, the tracking store and
/// the per-condition locks. Any store with string values, sets, TTLs,
/// pattern scans and pipelined writes can implement this.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError>;

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError>;

    /// Set only if absent, with a TTL. Returns whether the key was set.
    async fn set_nx_with_ttl(&self, key: &str, value: &str, ttl: Duration)
        -> Result<bool, KvError>;

    async fn del(&self, keys: &[String]) -> Result<u64, KvError>;

    /// Delete only if the current value equals `expected`. Returns whether
    /// a deletion happened.
    async fn del_if(&self, key: &str, expected: &str) -> Result<bool, KvError>;

    async fn exists(&self, key: &str) -> Result<bool, KvError>;

    async fn sadd(&self, key: &str, members: &[String]) -> Result<(), KvError>;

    async fn srem(&self, key: &str, members: &[String]) -> Result<(), KvError>;

    async fn smembers(&self, key: &str) -> Result<Vec<String>, KvError>;

    /// Non-blocking cursor scan for keys matching a `*` glob pattern.
    async fn scan(&self, pattern: &str) -> Result<Vec<String>, KvError>;

    /// Apply a batch of writes in one pipelined round trip.
    async fn apply_batch(&self, ops: Vec<KvOp>) -> Result<(), KvError>;
}

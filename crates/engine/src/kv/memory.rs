use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use super::store::{KvError, KvOp, KvStore};

/// In-process store used by tests and the replay harness. Expiry is lazy:
/// an entry past its deadline is treated as absent and dropped on access.
#[derive(Clone)]
pub struct MemoryKv {
    entries: Arc<DashMap<String, Entry>>,
}

#[derive(Clone)]
struct Entry {
    value: Value,
    expires_at_ms: Option<i64>,
}

#[derive(Clone)]
enum Value {
    Str(String),
    Set(HashSet<String>),
}

impl Entry {
    fn is_expired(&self, now_ms: i64) -> bool {
        self.expires_at_ms.is_some_and(|deadline| now_ms >= deadline)
    }
}

fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

impl Default for MemoryKv {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryKv {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    fn live_entry(&self, key: &str) -> Option<Entry> {
        let now = now_ms();
        let found = self.entries.get(key).map(|e| e.clone());
        match found {
            Some(e) if !e.is_expired(now) => Some(e),
            Some(_) => {
                self.entries.remove_if(key, |_, e| e.is_expired(now));
                None
            }
            None => None,
        }
    }

    fn put_str(&self, key: &str, value: &str, ttl: Option<Duration>) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: Value::Str(value.to_string()),
                expires_at_ms: ttl.map(|t| now_ms() + t.as_millis() as i64),
            },
        );
    }
}

#[async_trait::async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        match self.live_entry(key) {
            Some(Entry { value: Value::Str(s), .. }) => Ok(Some(s)),
            Some(_) => Err(KvError(format!("wrong type for key {key}"))),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        self.put_str(key, value, None);
        Ok(())
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        self.put_str(key, value, Some(ttl));
        Ok(())
    }

    async fn set_nx_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, KvError> {
        let now = now_ms();
        let fresh = Entry {
            value: Value::Str(value.to_string()),
            expires_at_ms: Some(now + ttl.as_millis() as i64),
        };
        match self.entries.entry(key.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired(now) {
                    occupied.insert(fresh);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(fresh);
                Ok(true)
            }
        }
    }

    async fn del(&self, keys: &[String]) -> Result<u64, KvError> {
        let mut removed = 0;
        for key in keys {
            if self.entries.remove(key).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn del_if(&self, key: &str, expected: &str) -> Result<bool, KvError> {
        let now = now_ms();
        let removed = self.entries.remove_if(key, |_, e| {
            !e.is_expired(now) && matches!(&e.value, Value::Str(s) if s == expected)
        });
        Ok(removed.is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, KvError> {
        Ok(self.live_entry(key).is_some())
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<(), KvError> {
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: Value::Set(HashSet::new()),
            expires_at_ms: None,
        });
        if entry.is_expired(now_ms()) {
            entry.value = Value::Set(HashSet::new());
            entry.expires_at_ms = None;
        }
        match &mut entry.value {
            Value::Set(set) => {
                set.extend(members.iter().cloned());
                Ok(())
            }
            Value::Str(_) => Err(KvError(format!("wrong type for key {key}"))),
        }
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<(), KvError> {
        if let Some(mut entry) = self.entries.get_mut(key) {
            if let Value::Set(set) = &mut entry.value {
                for member in members {
                    set.remove(member);
                }
            }
        }
        Ok(())
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, KvError> {
        match self.live_entry(key) {
            Some(Entry { value: Value::Set(set), .. }) => Ok(set.into_iter().collect()),
            Some(_) => Err(KvError(format!("wrong type for key {key}"))),
            None => Ok(Vec::new()),
        }
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        let now = now_ms();
        Ok(self
            .entries
            .iter()
            .filter(|e| !e.value().is_expired(now))
            .filter(|e| glob_match(pattern, e.key()))
            .map(|e| e.key().clone())
            .collect())
    }

    async fn apply_batch(&self, ops: Vec<KvOp>) -> Result<(), KvError> {
        for op in ops {
            match op {
                KvOp::Set { key, value } => self.set(&key, &value).await?,
                KvOp::SAdd { key, member } => self.sadd(&key, &[member]).await?,
                KvOp::Del { key } => {
                    self.del(std::slice::from_ref(&key)).await?;
                }
                KvOp::SRem { key, member } => self.srem(&key, &[member]).await?,
            }
        }
        Ok(())
    }
}

/// `*` matches any run of characters; everything else is literal.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let (mut star, mut mark) = (None::<usize>, 0usize);

    while ti < t.len() {
        if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some(s) = star {
            pi = s + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_del() {
        let kv = MemoryKv::new();
        kv.set("a", "1").await.unwrap();
        assert_eq!(kv.get("a").await.unwrap(), Some("1".into()));
        assert_eq!(kv.del(&["a".into()]).await.unwrap(), 1);
        assert_eq!(kv.get("a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn ttl_expires() {
        let kv = MemoryKv::new();
        kv.set_with_ttl("t", "1", Duration::from_millis(20)).await.unwrap();
        assert!(kv.exists("t").await.unwrap());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!kv.exists("t").await.unwrap());
        assert_eq!(kv.get("t").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_nx_respects_existing() {
        let kv = MemoryKv::new();
        assert!(kv.set_nx_with_ttl("n", "a", Duration::from_secs(5)).await.unwrap());
        assert!(!kv.set_nx_with_ttl("n", "b", Duration::from_secs(5)).await.unwrap());
        assert_eq!(kv.get("n").await.unwrap(), Some("a".into()));
    }

    #[tokio::test]
    async fn set_nx_reclaims_expired() {
        let kv = MemoryKv::new();
        assert!(kv.set_nx_with_ttl("n", "a", Duration::from_millis(10)).await.unwrap());
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(kv.set_nx_with_ttl("n", "b", Duration::from_secs(5)).await.unwrap());
        assert_eq!(kv.get("n").await.unwrap(), Some("b".into()));
    }

    #[tokio::test]
    async fn del_if_matches_value() {
        let kv = MemoryKv::new();
        kv.set("k", "token-1").await.unwrap();
        assert!(!kv.del_if("k", "token-2").await.unwrap());
        assert!(kv.exists("k").await.unwrap());
        assert!(kv.del_if("k", "token-1").await.unwrap());
        assert!(!kv.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn set_membership() {
        let kv = MemoryKv::new();
        kv.sadd("s", &["x".into(), "y".into()]).await.unwrap();
        let mut members = kv.smembers("s").await.unwrap();
        members.sort();
        assert_eq!(members, vec!["x".to_string(), "y".to_string()]);

        kv.srem("s", &["x".into()]).await.unwrap();
        assert_eq!(kv.smembers("s").await.unwrap(), vec!["y".to_string()]);
    }

    #[tokio::test]
    async fn smembers_missing_is_empty() {
        let kv = MemoryKv::new();
        assert!(kv.smembers("nope").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scan_matches_glob() {
        let kv = MemoryKv::new();
        kv.set("station:7:alert:a", "1").await.unwrap();
        kv.set("station:8:alert:b", "1").await.unwrap();
        kv.set("tracking:x", "1").await.unwrap();

        let mut keys = kv.scan("station:*:alert:*").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["station:7:alert:a".to_string(), "station:8:alert:b".to_string()]);
    }

    #[tokio::test]
    async fn batch_applies_all_ops() {
        let kv = MemoryKv::new();
        kv.apply_batch(vec![
            KvOp::Set { key: "a".into(), value: "1".into() },
            KvOp::SAdd { key: "s".into(), member: "a".into() },
        ])
        .await
        .unwrap();
        assert_eq!(kv.get("a").await.unwrap(), Some("1".into()));
        assert_eq!(kv.smembers("s").await.unwrap(), vec!["a".to_string()]);

        kv.apply_batch(vec![
            KvOp::Del { key: "a".into() },
            KvOp::SRem { key: "s".into(), member: "a".into() },
        ])
        .await
        .unwrap();
        assert_eq!(kv.get("a").await.unwrap(), None);
        assert!(kv.smembers("s").await.unwrap().is_empty());
    }

    #[test]
    fn glob_star_runs() {
        assert!(glob_match("idx:station:7:metric:*", "idx:station:7:metric:3"));
        assert!(!glob_match("idx:station:7:metric:*", "idx:station:8:metric:3"));
        assert!(glob_match("station:*:alert:*:metric:*:condition:*", "station:7:alert:r:metric:3:condition:c"));
        assert!(glob_match("*", "anything"));
        assert!(!glob_match("abc", "abd"));
        assert!(glob_match("a*c*", "abcde"));
    }
}

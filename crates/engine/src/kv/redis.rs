use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

use super::store::{KvError, KvOp, KvStore};

/// Redis-backed store. The connection manager reconnects on its own; a
/// request that fails mid-outage surfaces as a `KvError` and the caller
/// skips, per the transient-error policy.
#[derive(Clone)]
pub struct RedisKv {
    manager: ConnectionManager,
}

impl RedisKv {
    pub async fn connect(url: &str) -> Result<Self, KvError> {
        let client = redis::Client::open(url).map_err(kv_err)?;
        let manager = client.get_connection_manager().await.map_err(kv_err)?;
        Ok(Self { manager })
    }

    fn conn(&self) -> ConnectionManager {
        self.manager.clone()
    }
}

fn kv_err(e: redis::RedisError) -> KvError {
    KvError(e.to_string())
}

const DEL_IF_SCRIPT: &str = r#"
if redis.call('get', KEYS[1]) == ARGV[1] then
    return redis.call('del', KEYS[1])
else
    return 0
end
"#;

#[async_trait::async_trait]
impl KvStore for RedisKv {
    async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let mut conn = self.conn();
        conn.get(key).await.map_err(kv_err)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut conn = self.conn();
        conn.set::<_, _, ()>(key, value).await.map_err(kv_err)
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> Result<(), KvError> {
        let mut conn = self.conn();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async::<()>(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn set_nx_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, KvError> {
        let mut conn = self.conn();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)?;
        Ok(reply.is_some())
    }

    async fn del(&self, keys: &[String]) -> Result<u64, KvError> {
        if keys.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn();
        conn.del(keys.to_vec()).await.map_err(kv_err)
    }

    async fn del_if(&self, key: &str, expected: &str) -> Result<bool, KvError> {
        let mut conn = self.conn();
        let removed: i64 = redis::Script::new(DEL_IF_SCRIPT)
            .key(key)
            .arg(expected)
            .invoke_async(&mut conn)
            .await
            .map_err(kv_err)?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool, KvError> {
        let mut conn = self.conn();
        conn.exists(key).await.map_err(kv_err)
    }

    async fn sadd(&self, key: &str, members: &[String]) -> Result<(), KvError> {
        if members.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        conn.sadd::<_, _, ()>(key, members.to_vec()).await.map_err(kv_err)
    }

    async fn srem(&self, key: &str, members: &[String]) -> Result<(), KvError> {
        if members.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn();
        conn.srem::<_, _, ()>(key, members.to_vec()).await.map_err(kv_err)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, KvError> {
        let mut conn = self.conn();
        conn.smembers(key).await.map_err(kv_err)
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>, KvError> {
        let mut conn = self.conn();
        let mut keys = Vec::new();
        let mut iter: redis::AsyncIter<String> =
            conn.scan_match(pattern).await.map_err(kv_err)?;
        while let Some(key) = iter.next_item().await {
            keys.push(key);
        }
        Ok(keys)
    }

    async fn apply_batch(&self, ops: Vec<KvOp>) -> Result<(), KvError> {
        if ops.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        for op in &ops {
            match op {
                KvOp::Set { key, value } => {
                    pipe.set(key, value).ignore();
                }
                KvOp::SAdd { key, member } => {
                    pipe.sadd(key, member).ignore();
                }
                KvOp::Del { key } => {
                    pipe.del(key).ignore();
                }
                KvOp::SRem { key, member } => {
                    pipe.srem(key, member).ignore();
                }
            }
        }
        let mut conn = self.conn();
        pipe.query_async::<()>(&mut conn).await.map_err(kv_err)
    }
}

mod lock;
mod memory;
mod redis;
mod store;

pub use self::lock::{KvLock, LockGuard};
pub use self::memory::MemoryKv;
pub use self::redis::RedisKv;
pub use self::store::{KvError, KvOp, KvStore};

//! 测试工具模块
//!
//! 提供无外部依赖的内存版 `LockStore` 实现和测试辅助函数，
//! 用于在不连接 Redis 的情况下验证互斥锁协议。

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::Result;
use crate::store::LockStore;

/// 生成唯一的测试锁 key
pub fn test_key(prefix: &str) -> String {
    format!("{}:{}", prefix, Uuid::new_v4())
}

/// 内存存储条目
#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

/// 内存版锁存储
///
/// 行为对齐 Redis 的 SET NX PX / GET / DEL 语义：条目带过期时间，
/// 访问时惰性剔除已过期的条目。基于 `tokio::time::Instant` 计时，
/// 在暂停时钟的测试中过期行为完全确定。
///
/// Clone 共享同一份底层数据，多个 Mutex 实例可共用一个存储来模拟
/// 多进程竞争。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, MemoryEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入一个条目，绕过条件写入
    ///
    /// 用于模拟锁被第三方重新获取的场景。
    pub fn force_set(&self, key: &str, value: &str, ttl: Duration) {
        let mut entries = self.entries.lock();
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// 当前未过期的 key 是否存在
    pub fn contains(&self, key: &str) -> bool {
        let mut entries = self.entries.lock();
        Self::evict_if_expired(&mut entries, key);
        entries.contains_key(key)
    }

    /// 当前未过期的条目数量
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_if_expired(entries: &mut HashMap<String, MemoryEntry>, key: &str) {
        if let Some(entry) = entries.get(key)
            && entry.expires_at <= Instant::now()
        {
            entries.remove(key);
        }
    }
}

#[async_trait]
impl LockStore for MemoryStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.lock();
        Self::evict_if_expired(&mut entries, key);

        if entries.contains_key(key) {
            return Ok(false);
        }

        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(true)
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock();
        Self::evict_if_expired(&mut entries, key);
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.remove(key);
        Ok(())
    }
}

//! 锁存储后端模块
//!
//! 互斥锁核心只依赖存储的三个原语：条件写入（带 TTL）、读取、删除。
//! 生产环境使用 Redis 后端；测试使用 `test_utils::MemoryStore`。

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::Deserialize;
use tracing::info;

use crate::error::{MutexError, Result};

/// Redis 配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
        }
    }
}

/// 锁存储能力抽象
///
/// 三个操作都假定在存储侧是原子的，`set_if_absent` 是决定锁归属的
/// 唯一原语：同一个 key 在未过期期间，所有竞争者中至多一个会得到 true。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LockStore: Send + Sync {
    /// 仅当 key 不存在时原子写入 value，并设置过期时间
    ///
    /// 返回 true 表示写入成功（获得归属），false 表示 key 已存在。
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// 读取 key 当前存储的值，不存在时返回 None
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 删除 key
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Redis 存储后端
#[derive(Clone, Debug)]
pub struct RedisStore {
    client: Client,
}

impl RedisStore {
    /// 创建 Redis 后端
    ///
    /// URL 不合法视为构造失败，等价于传入无效的存储句柄。
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str())?;
        info!("Redis client created");
        Ok(Self { client })
    }

    /// 获取连接
    async fn get_conn(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(MutexError::from)
    }

    /// 健康检查
    pub async fn health_check(&self) -> Result<()> {
        let mut conn = self.get_conn().await?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(MutexError::from)
    }
}

#[async_trait]
impl LockStore for RedisStore {
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self.get_conn().await?;

        // SET key value NX PX milliseconds
        // NX: 只在 key 不存在时设置
        // PX: 设置过期时间（毫秒）
        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async(&mut conn)
            .await?;

        // SET NX 成功时返回 "OK"，失败时返回 None
        Ok(result.is_some())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_conn().await?;
        let _: () = conn.del(key).await?;
        Ok(())
    }
}

//! 分布式互斥锁核心
//!
//! 实现加锁/轮询/解锁协议的状态机。协议依赖存储的原子条件写入
//! 决定归属，依赖 token 校验保证只删除自己持有的锁。
//!
//! ## 固有限制
//!
//! TTL 过期是持有者崩溃后的唯一安全网。持有者执行过慢时，key 可能
//! 被第三方在过期后重新获取，此时两个进程会在一段窗口内同时处于
//! 临界区。token 校验只能在解锁时事后发现（`OwnershipLost`），无法
//! 阻止该窗口本身。这是单存储、不续期租约的固有代价。

use tokio::time::{Instant, sleep};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::config::MutexConfig;
use crate::error::{MutexError, Result};
use crate::store::LockStore;

/// 当前持有的锁标识
///
/// key 与 token 要么同时存在，要么同时不存在，由类型结构保证。
#[derive(Debug, Clone)]
struct HeldLock {
    key: String,
    token: String,
}

/// 基于单个共享存储的分布式互斥锁
///
/// 实例在 idle 与 held 两个状态间切换，可在不重叠的前提下
/// 复用于不同 key 的多次加锁。
///
/// ## 使用示例
///
/// ```ignore
/// let store = RedisStore::new(&RedisConfig::default())?;
/// let mut mutex = RedisMutex::with_defaults(store)?;
///
/// mutex.acquire("order:123").await?;
/// do_critical_work().await?;
/// mutex.release().await?;
/// ```
#[derive(Debug)]
pub struct RedisMutex<S: LockStore> {
    store: S,
    config: MutexConfig,
    held: Option<HeldLock>,
}

impl<S: LockStore> RedisMutex<S> {
    /// 创建互斥锁实例
    ///
    /// 配置校验失败返回 `Configuration` 错误，成功后实例处于 idle 状态。
    pub fn new(store: S, config: MutexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            held: None,
        })
    }

    /// 使用默认配置创建互斥锁实例
    pub fn with_defaults(store: S) -> Result<Self> {
        Self::new(store, MutexConfig::default())
    }

    /// 当前持有的锁 key，idle 时为 None
    pub fn key(&self) -> Option<&str> {
        self.held.as_ref().map(|h| h.key.as_str())
    }

    /// 当前持有的锁 token，idle 时为 None
    pub fn token(&self) -> Option<&str> {
        self.held.as_ref().map(|h| h.token.as_str())
    }

    /// 是否处于持锁状态
    pub fn is_held(&self) -> bool {
        self.held.is_some()
    }

    /// 当前配置
    pub fn config(&self) -> &MutexConfig {
        &self.config
    }

    /// 生成锁 token
    ///
    /// 每次 acquire 调用生成一个新 token，同一实例的不同加锁尝试
    /// 永不复用，避免误匹配自己早已失效的旧锁。
    fn generate_token() -> String {
        Uuid::new_v4().to_string()
    }

    /// 单次条件写入探测
    async fn try_lock(&self, key: &str, token: &str) -> Result<bool> {
        self.store
            .set_if_absent(key, token, self.config.expiry)
            .await
    }

    /// 获取锁
    ///
    /// 非阻塞模式下竞争立即失败（`Lock`）；阻塞模式下按 `delay` 间隔
    /// 轮询，从第一次尝试起计时，超过 `block_time` 失败
    /// （`BlockTimeExceeded`）。任何失败路径实例都保持 idle，可复用。
    #[instrument(skip(self))]
    pub async fn acquire(&mut self, key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(MutexError::Configuration(
                "锁 key 不能为空字符串".to_string(),
            ));
        }

        if let Some(held) = &self.held {
            return Err(MutexError::AlreadyHeld {
                key: held.key.clone(),
            });
        }

        let token = Self::generate_token();

        // 第一次条件写入，原子决定归属
        if self.try_lock(key, &token).await? {
            debug!(key = %key, "lock acquired");
            self.held = Some(HeldLock {
                key: key.to_string(),
                token,
            });
            return Ok(());
        }

        if !self.config.blocking {
            debug!(key = %key, "lock busy, non-blocking acquire gives up");
            return Err(MutexError::Lock {
                key: key.to_string(),
            });
        }

        // 阻塞模式：固定间隔轮询，直到成功或超出等待预算。
        // 失败的条件写入不会在存储中留下任何痕迹。
        let deadline = Instant::now() + self.config.block_time;
        loop {
            sleep(self.config.delay).await;

            if self.try_lock(key, &token).await? {
                debug!(key = %key, "lock acquired after polling");
                self.held = Some(HeldLock {
                    key: key.to_string(),
                    token,
                });
                return Ok(());
            }

            if Instant::now() >= deadline {
                warn!(
                    key = %key,
                    block_time_ms = self.config.block_time.as_millis() as u64,
                    "exceeded block time waiting for lock"
                );
                return Err(MutexError::BlockTimeExceeded {
                    key: key.to_string(),
                });
            }
        }
    }

    /// 释放锁
    ///
    /// 先读取存储中的当前值校验所有权：key 不存在说明锁已过期
    /// （`LockExpired`）；值与本实例 token 不符说明 key 已被其他
    /// 持有者重新获取（`OwnershipLost`），此时绝不删除对方的锁。
    /// 校验通过才执行删除。
    ///
    /// 无论结果如何，本地状态都会清空：与存储不一致的 held 状态
    /// 不再可信，保留它比报错后回到 idle 更危险。
    #[instrument(skip(self))]
    pub async fn release(&mut self) -> Result<()> {
        let Some(held) = self.held.take() else {
            return Err(MutexError::NotHeld);
        };

        let stored = self.store.get(&held.key).await?;

        match stored {
            None => {
                warn!(key = %held.key, "lock key missing at release, likely expired");
                Err(MutexError::LockExpired { key: held.key })
            }
            Some(value) if value != held.token => {
                warn!(
                    key = %held.key,
                    "lock token mismatch, key was reclaimed by another holder"
                );
                Err(MutexError::OwnershipLost { key: held.key })
            }
            Some(_) => {
                self.store.delete(&held.key).await?;
                debug!(key = %held.key, "lock released");
                Ok(())
            }
        }
    }
}

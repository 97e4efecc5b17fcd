//! 配置管理模块
//!
//! 互斥锁的轮询与过期参数，构造时一次性校验，之后不可变。

use std::time::Duration;

use serde::Deserialize;

use crate::error::{MutexError, Result};

/// 默认最大阻塞等待时间
pub const DEFAULT_BLOCK_TIME: Duration = Duration::from_secs(5);
/// 默认轮询间隔
pub const DEFAULT_DELAY: Duration = Duration::from_millis(500);
/// 默认锁过期时间
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(7);

/// 互斥锁配置
///
/// 必须满足 `delay < block_time < expiry`：
/// - 轮询间隔比等待预算还长的配置没有意义；
/// - 过期时间不大于等待预算时，一次阻塞等待可能比锁本身的
///   生命周期还长。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MutexConfig {
    /// 竞争时是否阻塞轮询等待
    pub blocking: bool,
    /// 最大阻塞等待时间，从第一次尝试开始计
    pub block_time: Duration,
    /// 两次轮询之间的间隔
    pub delay: Duration,
    /// 锁在存储中的过期时间（TTL），持有者崩溃后的唯一安全网
    pub expiry: Duration,
}

impl Default for MutexConfig {
    fn default() -> Self {
        Self {
            blocking: true,
            block_time: DEFAULT_BLOCK_TIME,
            delay: DEFAULT_DELAY,
            expiry: DEFAULT_EXPIRY,
        }
    }
}

impl MutexConfig {
    /// 非阻塞配置：竞争时立即失败，不轮询
    pub fn non_blocking() -> Self {
        Self {
            blocking: false,
            ..Default::default()
        }
    }

    /// 校验配置约束
    ///
    /// 每条约束对应一种独立的构造失败，校验通过后配置即不可变。
    pub fn validate(&self) -> Result<()> {
        if self.delay >= self.block_time {
            return Err(MutexError::Configuration(
                "轮询间隔 delay 必须小于最大等待时间 block_time".to_string(),
            ));
        }

        if self.expiry <= self.block_time {
            return Err(MutexError::Configuration(
                "过期时间 expiry 必须大于最大等待时间 block_time".to_string(),
            ));
        }

        Ok(())
    }
}

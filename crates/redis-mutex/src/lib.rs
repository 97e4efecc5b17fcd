//! 分布式互斥锁库
//!
//! 基于单个共享 Redis（或兼容语义的 KV 存储）实现的进程间互斥原语：
//! 原子的 SET NX + TTL 决定锁归属，唯一 token 校验保证只释放自己
//! 持有的锁。进程之间不直接通信，存储是唯一的仲裁者。
//!
//! ## 设计理念
//!
//! - **单存储仲裁**: 不做多节点多数派（Redlock），假定存在单一权威存储
//! - **TTL 安全网**: 持有者崩溃后锁靠过期自动回收，不提供续期
//! - **安全释放**: 释放前校验存储中的 token，绝不删除他人持有的锁
//!
//! 注意：过期回收意味着存在一个固有的竞态窗口，执行过慢的持有者
//! 可能与接管者短暂并发，详见 [`mutex`] 模块文档。

pub mod config;
pub mod error;
pub mod mutex;
pub mod scoped;
pub mod store;
pub mod test_utils;

pub use config::{DEFAULT_BLOCK_TIME, DEFAULT_DELAY, DEFAULT_EXPIRY, MutexConfig};
pub use error::{MutexError, Result};
pub use mutex::RedisMutex;
pub use scoped::{with_keyed_lock, with_lock};
pub use store::{LockStore, RedisConfig, RedisStore};

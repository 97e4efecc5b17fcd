//! 统一错误处理模块
//!
//! 定义互斥锁协议的全部错误类型，使用 thiserror 提供良好的错误信息。
//! 所有失败都同步上报给调用方，不做静默兜底，也不在文档化的轮询窗口
//! 之外自动重试。

use thiserror::Error;

/// 互斥锁错误类型
#[derive(Debug, Error)]
pub enum MutexError {
    // ==================== 配置错误 ====================
    #[error("配置无效: {0}")]
    Configuration(String),

    // ==================== 存储后端错误 ====================
    #[error("Redis 错误: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("存储后端错误: {0}")]
    Store(String),

    // ==================== 加锁错误 ====================
    #[error("实例已持有锁: key={key}，需先释放再获取")]
    AlreadyHeld { key: String },

    #[error("无法获取锁: key={key} 已被占用")]
    Lock { key: String },

    #[error("获取锁超过最大等待时间: key={key}")]
    BlockTimeExceeded { key: String },

    // ==================== 解锁错误 ====================
    #[error("当前没有持有任何锁")]
    NotHeld,

    #[error("锁已失效: key={key} 在存储中不存在，可能已过期")]
    LockExpired { key: String },

    #[error("锁所有权校验失败: key={key} 已被其他持有者重新获取")]
    OwnershipLost { key: String },
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, MutexError>;

impl MutexError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::Store(_) => "STORE_ERROR",
            Self::AlreadyHeld { .. } => "ALREADY_HELD",
            Self::Lock { .. } => "LOCK_ERROR",
            Self::BlockTimeExceeded { .. } => "BLOCK_TIME_EXCEEDED",
            Self::NotHeld => "NOT_HELD",
            Self::LockExpired { .. } => "LOCK_EXPIRED",
            Self::OwnershipLost { .. } => "OWNERSHIP_LOST",
        }
    }

    /// 是否为解锁类错误
    ///
    /// 解锁类错误意味着临界区可能已与其他持有者并发执行过，
    /// 调用方不应忽略。
    pub fn is_unlock_error(&self) -> bool {
        matches!(
            self,
            Self::NotHeld | Self::LockExpired { .. } | Self::OwnershipLost { .. }
        )
    }

    /// 是否为可重试错误
    ///
    /// 配置错误和解锁错误重试没有意义；锁竞争类失败由调用方
    /// 决定是否重新发起 acquire。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Redis(_) | Self::Store(_) | Self::Lock { .. } | Self::BlockTimeExceeded { .. }
        )
    }
}

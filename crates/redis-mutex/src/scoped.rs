//! 作用域加锁辅助
//!
//! 在持锁状态下执行一段异步逻辑，无论正常返回还是中途出错都保证
//! 尝试释放。释放失败不会掩盖受保护逻辑自身的错误，只会记录日志。

use std::future::Future;

use tracing::warn;

use crate::error::Result;
use crate::mutex::RedisMutex;
use crate::store::LockStore;

/// 合并受保护逻辑与释放两步的结果
///
/// 受保护逻辑的错误优先于释放错误：释放失败通常意味着锁已过期或
/// 被他人接管，记录告警后交由调用方处理原始错误。
fn settle<T>(outcome: Result<T>, released: Result<()>) -> Result<T> {
    match (outcome, released) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(release_err)) => Err(release_err),
        (Err(body_err), Ok(())) => Err(body_err),
        (Err(body_err), Err(release_err)) => {
            warn!(error = %release_err, "lock release failed while unwinding");
            Err(body_err)
        }
    }
}

/// 在 key 上持锁执行 body
///
/// ## 使用示例
///
/// ```ignore
/// let result = with_lock(&mut mutex, "order:123", || async {
///     process_order().await
/// })
/// .await?;
/// ```
pub async fn with_lock<S, F, Fut, T>(mutex: &mut RedisMutex<S>, key: &str, body: F) -> Result<T>
where
    S: LockStore,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    mutex.acquire(key).await?;
    let outcome = body().await;
    let released = mutex.release().await;
    settle(outcome, released)
}

/// 按调用参数派生锁 key，再持锁执行 body
///
/// 适用于同一段逻辑按资源维度互斥的场景，例如 `user:{id}`。
pub async fn with_keyed_lock<S, A, K, F, Fut, T>(
    mutex: &mut RedisMutex<S>,
    key_fn: K,
    arg: A,
    body: F,
) -> Result<T>
where
    S: LockStore,
    K: Fn(&A) -> String,
    F: FnOnce(A) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let key = key_fn(&arg);
    mutex.acquire(&key).await?;
    let outcome = body(arg).await;
    let released = mutex.release().await;
    settle(outcome, released)
}

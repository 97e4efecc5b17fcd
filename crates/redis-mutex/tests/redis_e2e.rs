//! 真实 Redis 端到端测试
//!
//! 需要本地可用的 Redis 实例，默认 `redis://localhost:6379/1`，
//! 可通过环境变量 `TEST_REDIS_URL` 覆盖。CI 中默认忽略：
//!
//! ```text
//! cargo test -p redis-mutex --test redis_e2e -- --ignored
//! ```

use std::time::Duration;

use redis_mutex::test_utils::test_key;
use redis_mutex::{LockStore, MutexConfig, MutexError, RedisConfig, RedisMutex, RedisStore};

fn e2e_store() -> RedisStore {
    let config = RedisConfig {
        url: std::env::var("TEST_REDIS_URL")
            .unwrap_or_else(|_| "redis://localhost:6379/1".to_string()),
    };
    RedisStore::new(&config).expect("valid redis url")
}

#[tokio::test]
#[ignore = "requires a running Redis instance"]
async fn test_redis_round_trip() {
    let store = e2e_store();
    store.health_check().await.unwrap();

    let mut mutex = RedisMutex::with_defaults(store.clone()).unwrap();
    let key = test_key("e2e:roundtrip");

    mutex.acquire(&key).await.unwrap();
    let token = mutex.token().unwrap().to_string();
    assert_eq!(store.get(&key).await.unwrap(), Some(token));

    mutex.release().await.unwrap();
    assert_eq!(store.get(&key).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires a running Redis instance"]
async fn test_redis_contention_and_timeout() {
    let store = e2e_store();
    let key = test_key("e2e:contention");

    let mut holder = RedisMutex::with_defaults(store.clone()).unwrap();
    holder.acquire(&key).await.unwrap();

    // 非阻塞竞争立即失败
    let mut non_blocking = RedisMutex::new(store.clone(), MutexConfig::non_blocking()).unwrap();
    let err = non_blocking.acquire(&key).await.unwrap_err();
    assert!(matches!(err, MutexError::Lock { .. }));

    // 阻塞竞争在等待预算内失败
    let contender_config = MutexConfig {
        blocking: true,
        block_time: Duration::from_secs(1),
        delay: Duration::from_millis(200),
        expiry: Duration::from_secs(2),
    };
    let mut contender = RedisMutex::new(store.clone(), contender_config).unwrap();
    let err = contender.acquire(&key).await.unwrap_err();
    assert!(matches!(err, MutexError::BlockTimeExceeded { .. }));

    holder.release().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a running Redis instance"]
async fn test_redis_expiry_and_safe_release() {
    let store = e2e_store();
    let key = test_key("e2e:expiry");

    let config = MutexConfig {
        blocking: true,
        block_time: Duration::from_secs(1),
        delay: Duration::from_millis(200),
        expiry: Duration::from_secs(2),
    };
    let mut slow_holder = RedisMutex::new(store.clone(), config.clone()).unwrap();
    slow_holder.acquire(&key).await.unwrap();

    // 等到 key 过期后由第二个实例接管
    tokio::time::sleep(Duration::from_millis(2500)).await;
    let mut new_holder = RedisMutex::new(store.clone(), config).unwrap();
    new_holder.acquire(&key).await.unwrap();

    // 慢速持有者的释放必须失败，且不能删掉接管者的锁
    let err = slow_holder.release().await.unwrap_err();
    assert!(matches!(err, MutexError::OwnershipLost { .. }));
    assert!(store.get(&key).await.unwrap().is_some());

    new_holder.release().await.unwrap();
}

use std::time::Duration;

use redis::aio::ConnectionManager;
use uuid::Uuid;

/// A held distributed lease. Call `release` explicitly once the critical
/// section is done; there is no async `Drop`, so (as in the source's
/// `async with lock:` block) the caller is responsible for releasing it,
/// ideally in a way that runs even on the error path.
pub struct LockGuard {
    key: String,
    token: String,
}

/// Acquire `lock:orders:<ticker>`-style key with a `SET key token NX PX lease_ms`
/// lease, retrying on a short poll interval until acquired. This is the Redis
/// analogue of the source's `redis.lock(name, timeout=5)` (an aioredis lock is
/// itself `SET NX PX` under the hood).
pub async fn acquire(
    conn: &mut ConnectionManager,
    key: &str,
    lease: Duration,
) -> redis::RedisResult<LockGuard> {
    let token = Uuid::new_v4().to_string();
    loop {
        let acquired: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(&token)
            .arg("NX")
            .arg("PX")
            .arg(lease.as_millis() as usize)
            .query_async(conn)
            .await?;

        if acquired.is_some() {
            return Ok(LockGuard {
                key: key.to_string(),
                token,
            });
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

/// Release the lease, but only if we still hold it (compare-and-delete via a
/// small Lua script) — a lease that already expired and was re-acquired by
/// another holder must not be deleted out from under them.
pub async fn release(conn: &mut ConnectionManager, guard: LockGuard) -> redis::RedisResult<()> {
    const RELEASE_SCRIPT: &str = r#"
        if redis.call("GET", KEYS[1]) == ARGV[1] then
            return redis.call("DEL", KEYS[1])
        else
            return 0
        end
    "#;

    redis::Script::new(RELEASE_SCRIPT)
        .key(&guard.key)
        .arg(&guard.token)
        .invoke_async(conn)
        .await
}

use std::time::{Duration, Instant};

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::DomainError;
use uuid::Uuid;

use crate::envelope::{queue_key, result_key, JobEnvelope, JobResult};

/// Default RPC timeout from spec §5: "RPC callers wait up to 10 seconds for a
/// result; on timeout the caller surfaces `RequestTimeout`". The worker job is
/// not cancelled — it keeps running and its result simply sits expired in Redis.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const POLL_DELAY: Duration = Duration::from_millis(20);
const RESULT_TTL_SECS: usize = 30;

/// Gateway-side handle for enqueuing jobs and awaiting their result future.
/// Named after (and playing the same role as) the source's `MicroKitClient`.
#[derive(Clone)]
pub struct RpcClient {
    conn: ConnectionManager,
}

impl RpcClient {
    pub async fn connect(redis_url: &str) -> redis::RedisResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    /// Enqueue `"<service>.<method>"` with `payload` and poll for the result,
    /// reconstructing the typed error on failure. Mirrors `MicroKitClient.__call__`
    /// followed by `job.result(timeout=10, poll_delay=...)`.
    pub async fn call<Req, Resp>(
        &self,
        service: &str,
        method: &str,
        payload: &Req,
    ) -> Result<Resp, DomainError>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let job_id = Uuid::new_v4();
        let envelope = JobEnvelope {
            job_id,
            method: method.to_string(),
            payload: serde_json::to_value(payload)
                .map_err(|e| DomainError::critical(format!("failed to encode request: {e}")))?,
        };

        let mut conn = self.conn.clone();
        let body = serde_json::to_string(&envelope)
            .map_err(|e| DomainError::critical(format!("failed to encode envelope: {e}")))?;

        conn.rpush::<_, _, ()>(queue_key(service), body)
            .await
            .map_err(|e| DomainError::critical(format!("failed to enqueue job: {e}")))?;

        self.await_result(job_id).await
    }

    async fn await_result<Resp>(&self, job_id: Uuid) -> Result<Resp, DomainError>
    where
        Resp: DeserializeOwned,
    {
        let key = result_key(job_id);
        let mut conn = self.conn.clone();
        let deadline = Instant::now() + DEFAULT_TIMEOUT;

        loop {
            let raw: Option<String> = conn
                .get(&key)
                .await
                .map_err(|e| DomainError::critical(format!("failed to poll result: {e}")))?;

            if let Some(raw) = raw {
                let result: JobResult = serde_json::from_str(&raw)
                    .map_err(|e| DomainError::critical(format!("malformed job result: {e}")))?;
                return match result.payload {
                    Ok(value) => serde_json::from_value(value).map_err(|e| {
                        DomainError::critical(format!("failed to decode response: {e}"))
                    }),
                    Err(err) => Err(err),
                };
            }

            if Instant::now() >= deadline {
                return Err(DomainError::RequestTimeout);
            }

            tokio::time::sleep(POLL_DELAY).await;
        }
    }
}

pub(crate) fn result_ttl() -> usize {
    RESULT_TTL_SECS
}

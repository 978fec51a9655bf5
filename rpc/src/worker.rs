use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use shared::DomainError;
use tracing::{error, info, warn};

use crate::client::result_ttl;
use crate::envelope::{queue_key, result_key, JobEnvelope, JobResult};

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<serde_json::Value, DomainError>> + Send>>;
pub type Handler = Arc<dyn Fn(serde_json::Value) -> HandlerFuture + Send + Sync>;

/// Explicit `{name -> handler}` registration table, replacing the source's
/// `inspect.getmembers`-based method discovery (REDESIGN FLAGS, spec §9).
#[derive(Clone, Default)]
pub struct HandlerTable {
    handlers: HashMap<String, Handler>,
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, method: &str, handler: Handler) -> Self {
        self.handlers.insert(method.to_string(), handler);
        self
    }
}

/// A fixed pool of tokio tasks, each a single-threaded cooperative scheduler
/// popping jobs from one named queue — the async-task analogue of the source's
/// `Runner` submitting `_start_worker` to a `ProcessPoolExecutor`.
pub struct WorkerPool {
    service: String,
    conn: ConnectionManager,
    handlers: Arc<HandlerTable>,
}

impl WorkerPool {
    pub fn new(service: impl Into<String>, conn: ConnectionManager, handlers: HandlerTable) -> Self {
        Self {
            service: service.into(),
            conn,
            handlers: Arc::new(handlers),
        }
    }

    /// Spawns `worker_count` tasks and blocks until all of them exit (they
    /// don't, barring a fatal Redis error, which matches the source's
    /// long-lived worker processes).
    pub async fn run(self, worker_count: usize) {
        let queue = queue_key(&self.service);
        info!(service = %self.service, worker_count, queue = %queue, "starting worker pool");

        let mut tasks = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let conn = self.conn.clone();
            let handlers = self.handlers.clone();
            let queue = queue.clone();
            let service = self.service.clone();
            tasks.push(tokio::spawn(async move {
                run_worker(worker_id, service, queue, conn, handlers).await;
            }));
        }

        for task in tasks {
            let _ = task.await;
        }
    }
}

async fn run_worker(
    worker_id: usize,
    service: String,
    queue: String,
    mut conn: ConnectionManager,
    handlers: Arc<HandlerTable>,
) {
    loop {
        let popped: redis::RedisResult<Option<(String, String)>> =
            conn.blpop(&queue, 5.0).await;

        let (_, body) = match popped {
            Ok(Some(pair)) => pair,
            Ok(None) => continue,
            Err(e) => {
                error!(service = %service, worker_id, error = %e, "queue pop failed, retrying");
                tokio::time::sleep(std::time::Duration::from_millis(250)).await;
                continue;
            }
        };

        let envelope: JobEnvelope = match serde_json::from_str(&body) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(service = %service, error = %e, "dropping malformed job envelope");
                continue;
            }
        };

        let job_id = envelope.job_id;
        let outcome = match handlers.handlers.get(envelope.method.as_str()) {
            Some(handler) => handler(envelope.payload).await,
            None => Err(DomainError::critical(format!(
                "no handler registered for {}.{}",
                service, envelope.method
            ))),
        };

        let result = JobResult { payload: outcome };
        match serde_json::to_string(&result) {
            Ok(encoded) => {
                let key = result_key(job_id);
                if let Err(e) = conn
                    .set_ex::<_, _, ()>(&key, encoded, result_ttl() as u64)
                    .await
                {
                    error!(service = %service, job_id = %job_id, error = %e, "failed to publish job result");
                }
            }
            Err(e) => error!(service = %service, job_id = %job_id, error = %e, "failed to encode job result"),
        }
    }
}

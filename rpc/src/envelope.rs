use serde::{Deserialize, Serialize};
use shared::DomainError;
use uuid::Uuid;

/// Wire format of one job on a named queue. `method` is `"<Service>.<method>"`
/// in `rpc::queue_name_for` terms, but the service is implicit in which list
/// the envelope was pushed onto — only the bare method name travels in the job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEnvelope {
    pub job_id: Uuid,
    pub method: String,
    pub payload: serde_json::Value,
}

/// What a worker writes back to `result:<job_id>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub payload: Result<serde_json::Value, DomainError>,
}

pub fn queue_key(service: &str) -> String {
    format!("queue:{service}")
}

pub fn result_key(job_id: Uuid) -> String {
    format!("result:{job_id}")
}

pub fn lock_key(ticker: &str) -> String {
    format!("lock:orders:{ticker}")
}

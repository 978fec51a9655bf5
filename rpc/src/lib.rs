pub mod client;
pub mod envelope;
pub mod lock;
pub mod worker;

pub use client::{RpcClient, DEFAULT_TIMEOUT};
pub use envelope::{lock_key, JobEnvelope, JobResult};
pub use worker::{Handler, HandlerTable, WorkerPool};

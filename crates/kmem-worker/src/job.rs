//! The unit of background work.

use async_trait::async_trait;
use serde_json::Value;

use kmem_core::error::AppError;

/// A job owns everything it needs and runs exactly once.
#[async_trait]
pub trait Job: Send + Sync + std::fmt::Debug + 'static {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Run the job. The returned summary is logged by the worker.
    async fn execute(&self) -> Result<Value, JobExecutionError>;
}

/// Error from job execution. Jobs are never retried.
#[derive(Debug, thiserror::Error)]
pub enum JobExecutionError {
    /// The job's input cannot be processed at all
    #[error("Unsupported job input: {0}")]
    Unsupported(String),

    /// The job ran but some of its work failed
    #[error("Job failed: {0}")]
    Failed(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] AppError),
}

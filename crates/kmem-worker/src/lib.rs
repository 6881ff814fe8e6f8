//! Background work for kmem.
//!
//! This crate provides:
//! - A fixed-size worker pool with synchronous hand-off
//! - The thumbnail and cleanup jobs
//! - A scheduler that queues cleanup at startup and periodically

pub mod context;
pub mod job;
pub mod jobs;
pub mod pool;
pub mod scheduler;

pub use context::JobContext;
pub use job::{Job, JobExecutionError};
pub use jobs::{CleanupJob, ThumbnailJob};
pub use pool::WorkerPool;
pub use scheduler::MaintenanceScheduler;

#[cfg(test)]
pub(crate) mod testing;

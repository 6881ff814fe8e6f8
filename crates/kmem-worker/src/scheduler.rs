//! Periodic maintenance schedule.

use std::time::Duration;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing;

use kmem_core::config::WorkerConfig;
use kmem_core::error::AppError;

use crate::context::JobContext;
use crate::jobs::CleanupJob;
use crate::pool::WorkerPool;

/// Queues cleanup passes onto the worker pool
pub struct MaintenanceScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Pool the cleanup jobs are submitted to
    pool: WorkerPool,
    /// Capabilities captured by each cleanup job
    ctx: JobContext,
    config: WorkerConfig,
    /// Time between scheduled cleanups
    interval: Duration,
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler")
            .field("interval", &self.interval)
            .finish()
    }
}

impl MaintenanceScheduler {
    /// Create a new maintenance scheduler
    pub async fn new(pool: WorkerPool, ctx: JobContext, config: WorkerConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            pool,
            ctx,
            interval: config.cleanup_interval(),
            config,
        })
    }

    fn cleanup_job(&self) -> CleanupJob {
        CleanupJob::new(self.ctx.clone(), self.config.retention())
    }

    /// Register the periodic cleanup
    pub async fn register_cleanup(&self) -> Result<(), AppError> {
        let pool = self.pool.clone();
        let ctx = self.ctx.clone();
        let retention = self.config.retention();

        let job = CronJob::new_repeated_async(self.interval, move |_uuid, _lock| {
            let pool = pool.clone();
            let ctx = ctx.clone();
            Box::pin(async move {
                tracing::debug!("Scheduling cleanup job");
                if let Err(e) = pool.submit(Box::new(CleanupJob::new(ctx, retention))).await {
                    tracing::error!("Failed to submit cleanup: {}", e);
                }
            })
        })
        .map_err(|e| AppError::internal(format!("Failed to create cleanup schedule: {}", e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add cleanup schedule: {}", e)))?;

        tracing::info!("Registered: cleanup (every {:?})", self.interval);
        Ok(())
    }

    /// Queue one cleanup now and start the schedule
    pub async fn start(&self) -> Result<(), AppError> {
        let pool = self.pool.clone();
        let job = self.cleanup_job();
        tokio::spawn(async move {
            if let Err(e) = pool.submit(Box::new(job)).await {
                tracing::error!("Failed to submit startup cleanup: {}", e);
            }
        });

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Maintenance scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Maintenance scheduler shut down");
        Ok(())
    }
}

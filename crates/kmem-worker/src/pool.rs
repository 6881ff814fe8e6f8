//! Fixed-size worker pool with synchronous hand-off.
//!
//! `submit` returns only once a worker has taken the job, so a busy pool
//! pushes back on producers instead of queueing without bound.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tracing;

use kmem_core::error::AppError;
use kmem_core::result::AppResult;

use crate::job::{Job, JobExecutionError};

/// A job in transit plus the acknowledgement its submitter waits on.
#[derive(Debug)]
struct Handoff {
    job: Box<dyn Job>,
    accepted: oneshot::Sender<()>,
}

type Intake = Arc<Mutex<mpsc::Receiver<Handoff>>>;

/// Handle for submitting jobs. Cheap to clone.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    intake: mpsc::Sender<Handoff>,
}

impl WorkerPool {
    /// Spawn `workers` workers that run until `cancel` turns `true`.
    pub fn start(workers: usize, cancel: watch::Receiver<bool>) -> (Self, JoinSet<()>) {
        let (tx, rx) = mpsc::channel(1);
        let intake: Intake = Arc::new(Mutex::new(rx));

        let mut set = JoinSet::new();
        for worker_id in 0..workers.max(1) {
            set.spawn(run_worker(worker_id, Arc::clone(&intake), cancel.clone()));
        }

        tracing::info!("Worker pool started with {} workers", workers.max(1));
        (Self { intake: tx }, set)
    }

    /// Hand a job to the next free worker, waiting until one takes it.
    ///
    /// Fails with `ServiceUnavailable` once the pool has shut down.
    pub async fn submit(&self, job: Box<dyn Job>) -> AppResult<()> {
        let name = job.name();
        let (accepted, ack) = oneshot::channel();

        self.intake
            .send(Handoff { job, accepted })
            .await
            .map_err(|_| AppError::service_unavailable("Worker pool is shut down"))?;

        ack.await.map_err(|_| {
            AppError::service_unavailable(format!("Worker pool shut down before taking '{name}'"))
        })?;

        tracing::debug!("Job '{}' accepted", name);
        Ok(())
    }
}

async fn run_worker(worker_id: usize, intake: Intake, mut cancel: watch::Receiver<bool>) {
    tracing::debug!("Worker {} started", worker_id);

    loop {
        if *cancel.borrow() {
            break;
        }

        let handoff = tokio::select! {
            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    break;
                }
                continue;
            }
            next = async { intake.lock().await.recv().await } => match next {
                Some(handoff) => handoff,
                None => break,
            },
        };

        // The submitter stopped waiting; the job was never accepted.
        if handoff.accepted.send(()).is_err() {
            continue;
        }

        run_job(worker_id, handoff.job).await;
    }

    tracing::debug!("Worker {} stopped", worker_id);
}

async fn run_job(worker_id: usize, job: Box<dyn Job>) {
    let name = job.name();
    let started = Instant::now();

    let outcome = tokio::spawn(async move { job.execute().await }).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(Ok(summary)) => {
            tracing::info!(worker_id, job = name, elapsed_ms, %summary, "Job completed");
        }
        Ok(Err(JobExecutionError::Unsupported(msg))) => {
            tracing::warn!(worker_id, job = name, elapsed_ms, "Job rejected: {}", msg);
        }
        Ok(Err(e)) => {
            tracing::error!(worker_id, job = name, elapsed_ms, error = %e, "Job failed");
        }
        Err(join_err) => {
            tracing::error!(worker_id, job = name, elapsed_ms, error = %join_err, "Job panicked");
        }
    }
}

//! Admission gate
//!
//! Polls the CI platform until our job is the oldest running singleton job.
//! Each poll collects the running singleton jobs, ranks them by start time
//! and either admits us (rank 0) or sleeps for the poll interval.
//!
//! Errors are never retried at this level: a failed query (after the
//! per-query retry policy) or our job missing from the ranking ends the wait.
//! Cancellation and the optional deadline interrupt both in-flight queries
//! and the sleep between polls.

use std::sync::Arc;
use std::time::Duration;

use queue_core::{RankError, RankedJobs};
use thiserror::Error;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::repository::JobSource;
use crate::service::{CollectError, Collector};

/// Fatal errors that end the wait
#[derive(Debug, Error)]
pub enum GateError {
    #[error(transparent)]
    Collect(#[from] CollectError),

    #[error(transparent)]
    Rank(#[from] RankError),
}

/// How the wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Our job is the oldest running singleton job
    Admitted { polls: u32, waited: Duration },
    /// The cancellation token fired
    Cancelled { polls: u32 },
    /// The configured maximum wait elapsed
    DeadlineExceeded { polls: u32 },
}

/// Waits for the configured job's turn
pub struct AdmissionGate {
    config: Config,
    collector: Collector,
}

impl AdmissionGate {
    /// Creates a new admission gate
    pub fn new(config: Config, source: Arc<dyn JobSource>) -> Self {
        let collector = Collector::new(source, config.retry);
        Self { config, collector }
    }

    /// Polls until admitted, cancelled, out of time, or failed
    ///
    /// `polls` in the outcome counts completed polls.
    pub async fn await_turn(&self, cancel: &CancellationToken) -> Result<Outcome, GateError> {
        let started = Instant::now();
        let deadline = self.config.max_wait.map(|wait| started + wait);
        let mut polls = 0;

        info!(
            "Waiting for job {} to be first among {} in project {}",
            self.config.job_id, self.config.singleton_jobs, self.config.project_id
        );

        loop {
            info!("Checking if we're first in line...");

            let rank = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(Outcome::Cancelled { polls }),
                _ = expire(deadline) => return Ok(Outcome::DeadlineExceeded { polls }),
                rank = self.poll() => rank?,
            };
            polls += 1;

            if rank == 0 {
                let waited = started.elapsed();
                info!(
                    "Job {} is first in line after {} poll(s) ({:?})",
                    self.config.job_id, polls, waited
                );
                return Ok(Outcome::Admitted { polls, waited });
            }

            info!(
                "We're not first ({} job(s) ahead). Trying again in {:?}",
                rank, self.config.poll_interval
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(Outcome::Cancelled { polls }),
                _ = expire(deadline) => return Ok(Outcome::DeadlineExceeded { polls }),
                _ = time::sleep(self.config.poll_interval) => {}
            }
        }
    }

    /// One poll cycle: collect, rank, locate our job
    async fn poll(&self) -> Result<usize, GateError> {
        let jobs = self
            .collector
            .collect(self.config.project_id, &self.config.singleton_jobs)
            .await?;
        let ranked = RankedJobs::from_jobs(jobs);

        for job in ranked.unparseable() {
            warn!(
                "Job {} ({}) has no parseable start time ({}), ranking it first",
                job.id, job.name, job.started_at
            );
        }

        for (index, job) in ranked.iter().enumerate() {
            debug!(
                "Rank {}: job {} ({}) started at {}",
                index, job.id, job.name, job.started_at
            );
        }

        let rank = ranked.position_of(self.config.job_id)?;

        if rank > 0 {
            if let Some(holder) = ranked.holder() {
                info!(
                    "Job {} ({}) holds the gate, started at {}{}",
                    holder.id,
                    holder.name,
                    holder.started_at,
                    holder
                        .web_url
                        .as_deref()
                        .map(|url| format!(" ({})", url))
                        .unwrap_or_default()
                );
            }
        }

        Ok(rank)
    }
}

/// Completes at the deadline, or never without one
async fn expire(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

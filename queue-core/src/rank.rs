//! Rank calculation
//!
//! Orders running singleton jobs by start time and locates a job within that
//! order. Rank 0 is the oldest job and the one allowed to proceed.
//!
//! Tie rule: the sort is stable. Jobs with identical start times, and jobs
//! whose start time is missing or unparseable, keep the relative order in
//! which they were collected. Unknown start times sort before every valid
//! timestamp (see [`StartKey`]).

use thiserror::Error;

use crate::domain::job::{JobId, JobRecord, StartKey};

/// Errors produced while ranking
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    /// The job is not among the collected jobs
    ///
    /// Usually a wrong job id, a job name outside the singleton set, or the
    /// platform not listing the job yet. Never the same as "not first".
    #[error("job {job_id} not found among {inspected} running singleton job(s)")]
    NotFound { job_id: JobId, inspected: usize },
}

/// Jobs ordered by start time, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedJobs {
    jobs: Vec<JobRecord>,
}

impl RankedJobs {
    pub fn from_jobs(mut jobs: Vec<JobRecord>) -> Self {
        // stable, and parses each timestamp once
        jobs.sort_by_cached_key(|job| job.started_at.sort_key());
        Self { jobs }
    }

    /// Zero-based rank of `job_id`
    pub fn position_of(&self, job_id: JobId) -> Result<usize, RankError> {
        self.jobs
            .iter()
            .position(|job| job.id == job_id)
            .ok_or(RankError::NotFound {
                job_id,
                inspected: self.jobs.len(),
            })
    }

    /// The oldest job, which currently holds the gate
    pub fn holder(&self) -> Option<&JobRecord> {
        self.jobs.first()
    }

    /// Jobs ranked before `job_id`; empty when the job is first or absent
    pub fn ahead_of(&self, job_id: JobId) -> &[JobRecord] {
        match self.position_of(job_id) {
            Ok(position) => &self.jobs[..position],
            Err(_) => &[],
        }
    }

    /// Jobs whose start time could not be parsed
    pub fn unparseable(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs
            .iter()
            .filter(|job| job.started_at.sort_key() == StartKey::Unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobRecord> {
        self.jobs.iter()
    }

    pub fn as_slice(&self) -> &[JobRecord] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

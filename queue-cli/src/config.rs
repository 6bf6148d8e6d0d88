//! Gate configuration
//!
//! Defines everything the admission gate needs to know: which GitLab
//! instance and project to query, which job we are, which job names are
//! mutually exclusive, and how patiently to poll.

use std::time::Duration;

use queue_client::Token;
use queue_core::{JobId, ProjectId, SingletonJobs};

use crate::scheduler::RetryPolicy;

/// Admission gate configuration
///
/// Built once from the command line and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// GitLab instance URL (e.g., "https://gitlab.com")
    pub hostname: String,

    /// Credentials for the API
    pub token: Token,

    /// Project whose running jobs are inspected
    pub project_id: ProjectId,

    /// The job waiting for its turn
    pub job_id: JobId,

    /// Job names that must not run concurrently
    pub singleton_jobs: SingletonJobs,

    /// How long to sleep between polls while not first
    pub poll_interval: Duration,

    /// Timeout applied to each HTTP request
    pub request_timeout: Duration,

    /// Give up waiting after this long; `None` waits indefinitely
    pub max_wait: Option<Duration>,

    /// Retry policy for a single failed query
    pub retry: RetryPolicy,
}

impl Config {
    /// Creates a configuration with defaults for everything but identity
    pub fn new(project_id: ProjectId, job_id: JobId, singleton_jobs: SingletonJobs) -> Self {
        Self {
            hostname: "https://gitlab.com".to_string(),
            token: Token::default(),
            project_id,
            job_id,
            singleton_jobs,
            poll_interval: Duration::from_secs(30),
            request_timeout: Duration::from_secs(30),
            max_wait: None,
            retry: RetryPolicy::none(),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.singleton_jobs.is_empty() {
            anyhow::bail!("at least one singleton job name is required (--singletonjobs)");
        }

        if self.project_id == 0 {
            anyhow::bail!("project id must be set (--project or $CI_PROJECT_ID)");
        }

        if self.job_id == 0 {
            anyhow::bail!("job id must be set (--jobid or $CI_JOB_ID)");
        }

        if !self.hostname.starts_with("http://") && !self.hostname.starts_with("https://") {
            anyhow::bail!("hostname must start with http:// or https://");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("interval-time must be greater than 0");
        }

        if self.max_wait.is_some_and(|max_wait| max_wait.is_zero()) {
            anyhow::bail!("max-wait must be greater than 0 when set");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request-timeout must be greater than 0");
        }

        if self.retry.first > self.retry.max {
            anyhow::bail!("retry-backoff must not exceed retry-backoff-max");
        }

        Ok(())
    }
}

//! Jobs repository
//!
//! Read-only access to a project's jobs on the CI platform:
//! - Listing the jobs currently running
//! - Fetching a single job's authoritative detail record

use async_trait::async_trait;
use queue_client::{ClientError, GitLabClient};
use queue_core::{JobId, JobRecord, ProjectId};

/// Repository trait for job queries against the CI platform
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Lists all jobs in the running state, in any order
    ///
    /// # Arguments
    /// * `project_id` - The project to inspect
    async fn list_running_jobs(&self, project_id: ProjectId) -> Result<Vec<JobRecord>, ClientError>;

    /// Fetches one job by ID
    ///
    /// The detail record is authoritative for the job's start time.
    ///
    /// # Arguments
    /// * `project_id` - The project the job belongs to
    /// * `job_id` - The job to fetch
    async fn get_job(&self, project_id: ProjectId, job_id: JobId) -> Result<JobRecord, ClientError>;
}

#[async_trait]
impl JobSource for GitLabClient {
    async fn list_running_jobs(&self, project_id: ProjectId) -> Result<Vec<JobRecord>, ClientError> {
        GitLabClient::list_running_jobs(self, project_id).await
    }

    async fn get_job(&self, project_id: ProjectId, job_id: JobId) -> Result<JobRecord, ClientError> {
        GitLabClient::get_job(self, project_id, job_id).await
    }
}

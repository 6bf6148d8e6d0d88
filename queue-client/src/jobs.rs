//! Job-related API endpoints

use queue_core::domain::job::{JobId, JobRecord, ProjectId};
use reqwest::RequestBuilder;
use reqwest::header::HeaderMap;
use tracing::debug;

use crate::GitLabClient;
use crate::error::{ClientError, Result};

/// Page size requested from list endpoints (GitLab's maximum)
const PER_PAGE: u32 = 100;

/// Upper bound on pages followed by a single list call
const MAX_PAGES: u32 = 1000;

impl GitLabClient {
    // =============================================================================
    // Job Queries
    // =============================================================================

    /// List every job of a project that is currently running
    ///
    /// Follows GitLab's `x-next-page` pagination header until the last page
    /// and returns the pages concatenated in the order the API sent them.
    /// Jobs are requested in ascending id order, so jobs with identical start
    /// times keep their creation order.
    ///
    /// # Arguments
    /// * `project_id` - The numeric project ID
    ///
    /// # Returns
    /// All running jobs of the project
    pub async fn list_running_jobs(&self, project_id: ProjectId) -> Result<Vec<JobRecord>> {
        let url = self.api_url(&format!("projects/{}/jobs", project_id));
        let mut jobs = Vec::new();
        let mut page = 1;

        loop {
            let response = self.running_jobs_page(&url, page).send().await?;

            let next = next_page(response.headers());
            let batch: Vec<JobRecord> = self.handle_response(response).await?;

            debug!(
                "Fetched page {} of running jobs for project {} ({} job(s))",
                page,
                project_id,
                batch.len()
            );
            jobs.extend(batch);

            match advance(page, next)? {
                Some(next) => page = next,
                None => break,
            }
        }

        Ok(jobs)
    }

    fn running_jobs_page(&self, url: &str, page: u32) -> RequestBuilder {
        self.get(url)
            .query(&[
                ("scope[]", "running"),
                ("order_by", "id"),
                ("sort", "asc"),
            ])
            .query(&[("per_page", PER_PAGE), ("page", page)])
    }

    /// Get a single job by ID
    ///
    /// # Arguments
    /// * `project_id` - The numeric project ID
    /// * `job_id` - The job ID
    ///
    /// # Returns
    /// The job details
    pub async fn get_job(&self, project_id: ProjectId, job_id: JobId) -> Result<JobRecord> {
        let url = self.api_url(&format!("projects/{}/jobs/{}", project_id, job_id));
        let response = self.get(&url).send().await?;

        self.handle_response(response).await
    }
}

/// Decides which page to fetch after `page`
///
/// Stops when there is no next page or the header does not move forward.
fn advance(page: u32, next: Option<u32>) -> Result<Option<u32>> {
    match next {
        Some(next) if next > MAX_PAGES => Err(ClientError::PageLimit(MAX_PAGES)),
        Some(next) if next > page => Ok(Some(next)),
        _ => Ok(None),
    }
}

/// Reads the `x-next-page` header; absent or blank means last page
fn next_page(headers: &HeaderMap) -> Option<u32> {
    headers
        .get("x-next-page")?
        .to_str()
        .ok()
        .map(str::trim)
        .filter(|value| !value.is_empty())?
        .parse()
        .ok()
}

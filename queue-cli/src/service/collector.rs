//! Job collector
//!
//! Gathers the running singleton jobs of a project. The list endpoint is
//! only used to discover candidates; every candidate is then re-fetched
//! individually because the detail record is authoritative for the start
//! time. Any failed query fails the whole collection.

use std::sync::Arc;

use queue_client::ClientError;
use queue_core::{JobId, JobRecord, ProjectId, SingletonJobs};
use thiserror::Error;
use tracing::debug;

use crate::repository::JobSource;
use crate::scheduler::RetryPolicy;

/// Errors raised while collecting jobs
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("failed to list running jobs of project {project_id}")]
    List {
        project_id: ProjectId,
        source: ClientError,
    },

    #[error("failed to fetch details of job {job_id}")]
    Detail { job_id: JobId, source: ClientError },
}

impl CollectError {
    /// The underlying API error
    pub fn client_error(&self) -> &ClientError {
        match self {
            Self::List { source, .. } | Self::Detail { source, .. } => source,
        }
    }
}

/// Collects the running jobs whose names are in the singleton set
pub struct Collector {
    source: Arc<dyn JobSource>,
    retry: RetryPolicy,
}

impl Collector {
    pub fn new(source: Arc<dyn JobSource>, retry: RetryPolicy) -> Self {
        Self { source, retry }
    }

    /// Returns detail records of the running singleton jobs
    ///
    /// Jobs come back in the order the list endpoint returned them. An empty
    /// singleton set is not rejected here; it simply matches nothing.
    pub async fn collect(
        &self,
        project_id: ProjectId,
        singleton_jobs: &SingletonJobs,
    ) -> Result<Vec<JobRecord>, CollectError> {
        let running = self
            .retry
            .run("list running jobs", || self.source.list_running_jobs(project_id))
            .await
            .map_err(|source| CollectError::List { project_id, source })?;

        debug!(
            "Project {} has {} running job(s)",
            project_id,
            running.len()
        );

        let mut details = Vec::new();

        for candidate in running.iter().filter(|job| singleton_jobs.matches(job)) {
            let job_id = candidate.id;
            let detail = self
                .retry
                .run("fetch job details", || self.source.get_job(project_id, job_id))
                .await
                .map_err(|source| CollectError::Detail { job_id, source })?;

            debug!(
                "Singleton job {} ({}) is {}, started at {}",
                detail.id,
                detail.name,
                detail.status.as_deref().unwrap_or("of unknown status"),
                detail.started_at
            );
            details.push(detail);
        }

        Ok(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fake::{Detail, FakeSource, Listing, job};
    use queue_core::StartedAt;

    const T0: &str = "2024-03-01T09:00:00Z";
    const T1: &str = "2024-03-01T09:05:00Z";

    fn collector(source: &Arc<FakeSource>) -> Collector {
        Collector::new(source.clone(), RetryPolicy::none())
    }

    #[tokio::test]
    async fn test_filters_to_singleton_names() {
        let source = Arc::new(FakeSource::new([Listing::Jobs(vec![
            job(1, "build", T0),
            job(2, "deploy", T0),
            job(3, "test", T1),
            job(4, "deploy", T1),
        ])]));

        let jobs = collector(&source)
            .collect(103, &SingletonJobs::new(["deploy"]))
            .await
            .unwrap();

        let ids: Vec<JobId> = jobs.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![2, 4]);
        assert_eq!(source.detail_calls(), 2);
    }

    #[tokio::test]
    async fn test_multiple_names() {
        let source = Arc::new(FakeSource::new([Listing::Jobs(vec![
            job(1, "migrate", T0),
            job(2, "deploy", T0),
            job(3, "lint", T1),
        ])]));

        let jobs = collector(&source)
            .collect(103, &SingletonJobs::new(["deploy", "migrate"]))
            .await
            .unwrap();

        assert_eq!(jobs.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_set_matches_nothing() {
        let source = Arc::new(FakeSource::new([Listing::Jobs(vec![job(1, "build", T0)])]));

        let jobs = collector(&source)
            .collect(103, &SingletonJobs::default())
            .await
            .unwrap();

        assert!(jobs.is_empty());
        assert_eq!(source.detail_calls(), 0);
    }

    #[tokio::test]
    async fn test_detail_record_is_authoritative() {
        let listed = JobRecord::new(2, "deploy", StartedAt::missing());
        let source = Arc::new(
            FakeSource::new([Listing::Jobs(vec![listed])])
                .with_detail(2, Detail::Record(job(2, "deploy", T1))),
        );

        let jobs = collector(&source)
            .collect(103, &SingletonJobs::new(["deploy"]))
            .await
            .unwrap();

        assert_eq!(jobs[0].started_at, StartedAt::new(T1));
    }

    #[tokio::test]
    async fn test_list_failure_propagates() {
        let source = Arc::new(FakeSource::new([Listing::Fail(502)]));

        let err = collector(&source)
            .collect(103, &SingletonJobs::new(["deploy"]))
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::List { project_id: 103, .. }));
        assert_eq!(source.detail_calls(), 0);
    }

    #[tokio::test]
    async fn test_detail_failure_discards_partial_results() {
        let source = Arc::new(
            FakeSource::new([Listing::Jobs(vec![
                job(1, "deploy", T0),
                job(2, "deploy", T1),
                job(3, "deploy", T1),
            ])])
            .with_detail(2, Detail::Fail(500)),
        );

        let err = collector(&source)
            .collect(103, &SingletonJobs::new(["deploy"]))
            .await
            .unwrap_err();

        assert!(matches!(err, CollectError::Detail { job_id: 2, .. }));
        assert!(err.client_error().is_server_error());
        // job 3 is never fetched once job 2 failed
        assert_eq!(source.detail_calls(), 2);
    }

    #[tokio::test]
    async fn test_transient_list_failure_is_retried() {
        let source = Arc::new(
            FakeSource::new([Listing::Fail(503), Listing::Jobs(vec![job(1, "deploy", T0)])]),
        );
        let retry = RetryPolicy::new(
            2,
            std::time::Duration::from_millis(1),
            std::time::Duration::from_millis(2),
        );

        let jobs = Collector::new(source.clone(), retry)
            .collect(103, &SingletonJobs::new(["deploy"]))
            .await
            .unwrap();

        assert_eq!(jobs.len(), 1);
        assert_eq!(source.list_calls(), 2);
    }

    #[test]
    fn test_error_messages_name_the_step() {
        let err = CollectError::List {
            project_id: 103,
            source: ClientError::api_error(401, "401 Unauthorized"),
        };
        assert_eq!(err.to_string(), "failed to list running jobs of project 103");
        assert_eq!(
            format!("{:#}", anyhow::Error::from(err)),
            "failed to list running jobs of project 103: API error (status 401): 401 Unauthorized"
        );

        let err = CollectError::Detail {
            job_id: 7,
            source: ClientError::api_error(404, "404 Not found"),
        };
        assert_eq!(err.to_string(), "failed to fetch details of job 7");
    }
}

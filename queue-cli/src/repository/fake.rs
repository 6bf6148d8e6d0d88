//! Scripted job source for tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use queue_client::ClientError;
use queue_core::{JobId, JobRecord, ProjectId, StartedAt};

use super::JobSource;

/// One scripted answer to `list_running_jobs`
#[derive(Debug, Clone)]
pub enum Listing {
    Jobs(Vec<JobRecord>),
    Fail(u16),
    Hang,
}

/// Scripted answer to `get_job` for a specific job
#[derive(Debug, Clone)]
pub enum Detail {
    Record(JobRecord),
    Fail(u16),
}

/// Answers list calls from a script; the last listing repeats forever
///
/// Detail calls return the override registered for the job, or else echo
/// the job as it appeared in the most recent listing.
#[derive(Default)]
pub struct FakeSource {
    listings: Mutex<VecDeque<Listing>>,
    details: HashMap<JobId, Detail>,
    last_listed: Mutex<Vec<JobRecord>>,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
}

impl FakeSource {
    pub fn new(listings: impl IntoIterator<Item = Listing>) -> Self {
        Self {
            listings: Mutex::new(listings.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn with_detail(mut self, job_id: JobId, detail: Detail) -> Self {
        self.details.insert(job_id, detail);
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    fn next_listing(&self) -> Listing {
        let mut listings = self.listings.lock().unwrap();
        if listings.len() > 1 {
            listings.pop_front().unwrap()
        } else {
            listings
                .front()
                .cloned()
                .unwrap_or(Listing::Jobs(Vec::new()))
        }
    }
}

#[async_trait]
impl JobSource for FakeSource {
    async fn list_running_jobs(&self, _project_id: ProjectId) -> Result<Vec<JobRecord>, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        match self.next_listing() {
            Listing::Jobs(jobs) => {
                *self.last_listed.lock().unwrap() = jobs.clone();
                Ok(jobs)
            }
            Listing::Fail(status) => Err(ClientError::api_error(status, "scripted failure")),
            Listing::Hang => std::future::pending().await,
        }
    }

    async fn get_job(&self, _project_id: ProjectId, job_id: JobId) -> Result<JobRecord, ClientError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);

        match self.details.get(&job_id) {
            Some(Detail::Record(job)) => Ok(job.clone()),
            Some(Detail::Fail(status)) => Err(ClientError::api_error(*status, "scripted failure")),
            None => self
                .last_listed
                .lock()
                .unwrap()
                .iter()
                .find(|job| job.id == job_id)
                .cloned()
                .ok_or_else(|| ClientError::api_error(404, "404 Not found")),
        }
    }
}

/// Shorthand for a job record
pub fn job(id: JobId, name: &str, started_at: &str) -> JobRecord {
    JobRecord::new(id, name, StartedAt::new(started_at))
}

//! Job domain types
//!
//! GitLab reports jobs with integer ids and RFC 3339 `started_at` strings.
//! The start time is kept as the raw text the platform sent so that a missing
//! or malformed value stays representable; [`StartKey`] turns it into
//! something orderable.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job identifier, unique within a project
pub type JobId = u64;

/// Project identifier
pub type ProjectId = u64;

/// A job as reported by the CI platform
///
/// Only `id`, `name` and `started_at` take part in ranking. The remaining
/// fields are carried along for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub name: String,
    #[serde(default)]
    pub started_at: StartedAt,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
    #[serde(default)]
    pub pipeline: Option<PipelineRef>,
    #[serde(default)]
    pub web_url: Option<String>,
}

impl JobRecord {
    /// Creates a record with just the attributes ranking needs
    pub fn new(id: JobId, name: impl Into<String>, started_at: StartedAt) -> Self {
        Self {
            id,
            name: name.into(),
            started_at,
            status: None,
            git_ref: None,
            pipeline: None,
            web_url: None,
        }
    }
}

/// Pipeline a job belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineRef {
    pub id: u64,
}

/// Start time of a job, exactly as the platform reported it
///
/// `None` covers both a JSON `null` and a missing field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StartedAt(Option<String>);

impl StartedAt {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Some(raw.into()))
    }

    pub fn missing() -> Self {
        Self(None)
    }

    pub fn raw(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Parses the timestamp as RFC 3339
    ///
    /// Returns `None` for a missing, blank or malformed value.
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        let raw = self.0.as_deref()?.trim();
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    pub fn sort_key(&self) -> StartKey {
        self.parse().map_or(StartKey::Unknown, StartKey::At)
    }
}

impl From<&str> for StartedAt {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for StartedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_deref() {
            Some(raw) if !raw.trim().is_empty() => f.write_str(raw),
            _ => f.write_str("<not started>"),
        }
    }
}

/// Ordering key for a job's start time
///
/// Unknown start times sort before every valid timestamp. The variant order
/// is load-bearing: the derived `Ord` ranks `Unknown` below any `At`, and two
/// `Unknown` keys compare equal so a stable sort keeps their input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StartKey {
    Unknown,
    At(DateTime<Utc>),
}

impl StartKey {
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

//! Singleton job name set

use std::collections::BTreeSet;
use std::fmt;

use crate::domain::job::JobRecord;

/// Names of the jobs that must not run concurrently
///
/// Names are trimmed and blank entries dropped, so an unset
/// `--singletonjobs ""` yields an empty set rather than a set holding `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SingletonJobs {
    names: BTreeSet<String>,
}

impl SingletonJobs {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| name.as_ref().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Whether the job's name is one of the singleton names
    pub fn matches(&self, job: &JobRecord) -> bool {
        self.contains(&job.name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl fmt::Display for SingletonJobs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().collect();
        write!(f, "[{}]", names.join(", "))
    }
}

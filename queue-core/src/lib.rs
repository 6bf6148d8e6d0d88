//! Pipeline Queue Core
//!
//! Platform-independent pieces of the admission gate.
//!
//! This crate contains:
//! - Domain types: running job records and the singleton job name set
//! - Ranking: the start-time ordering that decides who may proceed

pub mod domain;
pub mod rank;

pub use domain::job::{JobId, JobRecord, ProjectId, StartKey, StartedAt};
pub use domain::singleton::SingletonJobs;
pub use rank::{RankError, RankedJobs};

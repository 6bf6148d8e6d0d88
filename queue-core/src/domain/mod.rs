//! Core domain types
//!
//! Jobs as the CI platform reports them and the set of job names that
//! must not run concurrently.

pub mod job;
pub mod singleton;

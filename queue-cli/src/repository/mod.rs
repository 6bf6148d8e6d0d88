//! Repository layer
//!
//! The job source is the only way the gate observes the outside world.
//! It is trait-based so the collector and the gate can be exercised
//! against scripted data in tests.

mod jobs;

#[cfg(test)]
pub mod fake;

pub use jobs::JobSource;

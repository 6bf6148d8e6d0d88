//! Service layer
//!
//! Business logic between the repository and the scheduler.

pub mod collector;

pub use collector::{CollectError, Collector};

//! Scheduler layer
//!
//! Drives the poll loop that decides when our job may proceed, and the
//! retry policy applied to individual queries within a poll.

pub mod gate;
pub mod retry;

pub use gate::{AdmissionGate, GateError, Outcome};
pub use retry::RetryPolicy;

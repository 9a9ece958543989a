//! Core types for the prioload harness.
//!
//! These types are shared by the store gateways and the load generator.
//! Nothing in here performs I/O.

pub mod duration;
mod outcome;
mod priority;
mod record;

pub use outcome::Outcome;
pub use priority::PriorityClass;
pub use record::{ParseRecordIdError, Record, RecordId};

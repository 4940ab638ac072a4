//! Shared utilities for the examcert ledger.

pub mod digest;
pub mod stats;
pub mod time;

pub use digest::evidence_digest;
pub use stats::StatsCounter;
pub use time::{format_duration, Clock, SystemClock};

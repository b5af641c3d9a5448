//! Logging infrastructure for Textframe
//!
//! Append-only usage audit trail for metered searches.

pub mod usage;

pub use usage::{InMemoryUsageSink, MongoUsageSink, UsageRecord, UsageSink};

//! Database schemas for Textframe
//!
//! Defines MongoDB document structures for client keys and usage records.

mod metadata;
mod public_key;
mod usage;

pub use metadata::Metadata;
pub use public_key::{PublicKeyDoc, PUBLIC_KEY_COLLECTION};
pub use usage::{UsageDoc, USAGE_COLLECTION};

//! Database layer for Textframe
//!
//! MongoDB storage for registered client keys and the usage audit trail.

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
pub use schemas::{Metadata, PublicKeyDoc, UsageDoc};

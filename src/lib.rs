//! Textframe - signed-nonce gateway for video transcript search
//!
//! A browser extension registers an Ed25519 public key under a client
//! identifier, asks for a single-use nonce, and signs it to authorize one
//! search. A search fetches the video's transcript, asks a generative model
//! where in the video the query is answered, records token usage, and returns
//! the model's JSON.
//!
//! ## Modules
//!
//! - **auth**: nonce issuance, signature checks, key registry
//! - **services**: transcript and generation clients, gated-call orchestration
//! - **logging**: usage audit trail
//! - **db**: MongoDB persistence
//! - **server** / **routes**: HTTP surface with CORS

pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, TextframeError};

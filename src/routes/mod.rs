//! HTTP route handlers
//!
//! - `POST /register_public_key` - bind an Ed25519 key to an identifier
//! - `POST /get_nonce` - issue a single-use challenge
//! - `POST /search` - signed transcript search
//! - `GET /health`, `GET /version` - probes

pub mod health;
pub mod nonce;
pub mod register;
pub mod response;
pub mod search;

pub use health::{health_check, version_info};
pub use nonce::handle_get_nonce;
pub use register::handle_register_public_key;
pub use response::{error_response, json_response};
pub use search::handle_search;

/// Client identifier header
pub const UUID_HEADER: &str = "X-UUID";
/// Base64 signature over the pending nonce
pub const SIGNATURE_HEADER: &str = "X-Nonce-Signature";

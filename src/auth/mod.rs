//! Challenge/response authentication for Textframe
//!
//! ```text
//!  client                          textframe
//!    │  POST /register_public_key      │
//!    │ ───────────────────────────────▶│  IdentityStore::register (TOFU)
//!    │  POST /get_nonce (X-UUID)       │
//!    │ ───────────────────────────────▶│  NonceAuthority::issue
//!    │ ◀──────────── {nonce} ──────────│
//!    │  sign(nonce) with private key   │
//!    │  POST /search (X-UUID,          │
//!    │     X-Nonce-Signature)          │
//!    │ ───────────────────────────────▶│  lookup → consume → verify
//! ```
//!
//! Provides:
//! - Registered public key storage (MongoDB or in-memory)
//! - Single-use nonce issuance and atomic consumption
//! - Ed25519 detached signature verification

pub mod identity;
pub mod nonce;
pub mod signature;

pub use identity::{IdentityStore, InMemoryIdentityStore, MongoIdentityStore, RegisterOutcome};
pub use nonce::{spawn_cleanup_task, NonceAuthority, NonceStats};
pub use signature::{decode_base64, decode_verifying_key, verify, verify_detached, SignatureError};

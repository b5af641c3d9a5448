//! HTTP server

pub mod cors;
pub mod http;

pub use cors::CorsPolicy;
pub use http::{run, AppState};

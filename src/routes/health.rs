//! Health and version endpoints
//!
//! `/health` is a liveness probe: it answers 200 whenever the process is
//! serving, whichever stores it ended up with.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use super::response::json_response;
use crate::auth::NonceStats;
use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub healthy: bool,
    pub version: &'static str,
    /// Uptime in seconds
    pub uptime: u64,
    pub timestamp: String,
    /// "persistent" with MongoDB, "in-memory" otherwise
    pub storage: &'static str,
    pub nonces: NonceStats,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub commit: &'static str,
    pub commit_full: &'static str,
    pub build_time: &'static str,
}

pub fn health_check(state: Arc<AppState>) -> Response<Full<Bytes>> {
    let response = HealthResponse {
        status: "ok",
        healthy: true,
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        storage: if state.persistent { "persistent" } else { "in-memory" },
        nonces: state.gateway.nonces().stats(),
    };

    json_response(StatusCode::OK, &response)
}

pub fn version_info() -> Response<Full<Bytes>> {
    let response = VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
        commit: env!("GIT_COMMIT_SHORT"),
        commit_full: env!("GIT_COMMIT_FULL"),
        build_time: env!("BUILD_TIMESTAMP"),
    };

    json_response(StatusCode::OK, &response)
}

//! Public key registration
//!
//! `POST /register_public_key` binds an Ed25519 public key to a client
//! identifier. Registration is open: the first caller to claim an identifier
//! owns it, and any later call overwrites the stored key.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::response::{json_response, parse_json_body};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterPublicKeyRequest {
    pub uuid: String,
    pub public_key: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterPublicKeyResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RegisterPublicKeyResponse {
    fn success() -> Self {
        Self {
            status: "success",
            message: None,
        }
    }

    fn error(message: String) -> Self {
        Self {
            status: "error",
            message: Some(message),
        }
    }
}

pub async fn handle_register_public_key<B>(
    req: Request<B>,
    state: Arc<AppState>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let body: RegisterPublicKeyRequest = match parse_json_body(req).await {
        Ok(body) => body,
        Err(e) => {
            return json_response(
                e.status_code(),
                &RegisterPublicKeyResponse::error(e.public_message()),
            )
        }
    };

    match state.gateway.register(&body.uuid, &body.public_key).await {
        Ok(outcome) => {
            info!(uuid = %body.uuid, outcome = ?outcome, "Public key registered");
            json_response(StatusCode::OK, &RegisterPublicKeyResponse::success())
        }
        Err(e) => {
            warn!(uuid = %body.uuid, error = %e, "Public key registration failed");
            json_response(
                e.status_code(),
                &RegisterPublicKeyResponse::error(e.public_message()),
            )
        }
    }
}

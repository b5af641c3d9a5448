//! Nonce issuance
//!
//! `POST /get_nonce` hands the caller a fresh single-use challenge for the
//! identifier in its `X-UUID` header. Issuing never checks registration, and
//! a new nonce replaces any earlier unconsumed one.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use super::response::{error_response, json_response, required_header};
use super::UUID_HEADER;
use crate::server::AppState;
use crate::types::TextframeError;

#[derive(Debug, Serialize)]
pub struct NonceResponse {
    pub nonce: String,
}

pub async fn handle_get_nonce<B>(req: Request<B>, state: Arc<AppState>) -> Response<Full<Bytes>> {
    let Some(uuid) = required_header(req.headers(), UUID_HEADER) else {
        return error_response(&TextframeError::BadRequest("X-UUID header missing".into()));
    };

    match state.gateway.issue_nonce(&uuid) {
        Ok(nonce) => {
            debug!(uuid = %uuid, "Nonce issued");
            json_response(StatusCode::OK, &NonceResponse { nonce })
        }
        Err(e) => error_response(&e),
    }
}

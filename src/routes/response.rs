//! Shared response and request-body helpers for route handlers

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::{HeaderMap, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::TextframeError;

/// Request bodies larger than this are rejected before parsing
pub const MAX_BODY_BYTES: usize = 64 * 1024;

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let bytes = match serde_json::to_vec(body) {
        Ok(bytes) => bytes,
        Err(e) => return error_response(&TextframeError::Internal(e.to_string())),
    };

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(bytes)))
        .unwrap_or_default()
}

/// Render an error as `{"error": kind, "message": ...}` with its own status
pub fn error_response(err: &TextframeError) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": err.kind(),
        "message": err.public_message(),
    });

    Response::builder()
        .status(err.status_code())
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_default()
}

/// Non-empty value of a request header
pub fn required_header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Collect the body (bounded) and deserialize it as JSON
pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T, TextframeError>
where
    T: DeserializeOwned,
    B: Body,
    B::Error: std::fmt::Display,
{
    if let Some(len) = req.body().size_hint().upper() {
        if len > MAX_BODY_BYTES as u64 {
            return Err(TextframeError::BadRequest("Request body too large".into()));
        }
    }

    let bytes = req
        .into_body()
        .collect()
        .await
        .map_err(|e| TextframeError::BadRequest(format!("Failed to read body: {}", e)))?
        .to_bytes();

    if bytes.len() > MAX_BODY_BYTES {
        return Err(TextframeError::BadRequest("Request body too large".into()));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| TextframeError::BadRequest(format!("Invalid JSON body: {}", e)))
}

#[cfg(test)]
pub(crate) async fn body_json(response: Response<Full<Bytes>>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

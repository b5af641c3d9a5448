//! Gated transcript search
//!
//! `POST /search` requires `X-UUID` and `X-Nonce-Signature` headers. The
//! signature must cover the nonce most recently issued to that identifier.
//! On success the body is whatever JSON the generation upstream produced,
//! usually an array of timestamp strings.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use std::sync::Arc;

use super::response::{error_response, json_response, parse_json_body, required_header};
use super::{SIGNATURE_HEADER, UUID_HEADER};
use crate::server::AppState;
use crate::services::SearchRequest;
use crate::types::TextframeError;

pub async fn handle_search<B>(req: Request<B>, state: Arc<AppState>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: std::fmt::Display,
{
    let uuid = required_header(req.headers(), UUID_HEADER);
    let signature = required_header(req.headers(), SIGNATURE_HEADER);
    let (Some(uuid), Some(signature)) = (uuid, signature) else {
        return error_response(&TextframeError::BadRequest(
            "X-UUID and X-Nonce-Signature headers are required".into(),
        ));
    };

    let request: SearchRequest = match parse_json_body(req).await {
        Ok(body) => body,
        Err(e) => return error_response(&e),
    };

    match state
        .gateway
        .perform_gated_call(&uuid, &signature, &request)
        .await
    {
        Ok(value) => json_response(StatusCode::OK, &value),
        Err(e) => error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::response::body_json;
    use crate::testutil::{register_and_sign, test_state};

    fn request(uuid: Option<&str>, signature: Option<&str>, body: &str) -> Request<Full<Bytes>> {
        let mut builder = Request::post("/search").header("Content-Type", "application/json");
        if let Some(uuid) = uuid {
            builder = builder.header("X-UUID", uuid);
        }
        if let Some(signature) = signature {
            builder = builder.header("X-Nonce-Signature", signature);
        }
        builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
    }

    const BODY: &str = r#"{"query":"where is the answer","video_id":"dQw4w9WgXcQ"}"#;

    #[tokio::test]
    async fn test_search_success_records_usage() {
        let harness = test_state();
        let signature = register_and_sign(&harness, "client-1").await;

        let response =
            handle_search(request(Some("client-1"), Some(&signature), BODY), harness.state.clone())
                .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, serde_json::json!(["00:42"]));

        let records = harness.usage.records().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].uuid, "client-1");
        assert_eq!(records[0].query, "where is the answer");
    }

    #[tokio::test]
    async fn test_replayed_signature_rejected() {
        let harness = test_state();
        let signature = register_and_sign(&harness, "client-1").await;

        let first =
            handle_search(request(Some("client-1"), Some(&signature), BODY), harness.state.clone())
                .await;
        assert_eq!(first.status(), StatusCode::OK);

        let replay =
            handle_search(request(Some("client-1"), Some(&signature), BODY), harness.state.clone())
                .await;
        assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(replay).await["message"], "Invalid credentials");
        assert_eq!(harness.usage.records().await.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_headers_is_bad_request() {
        let harness = test_state();
        let response =
            handle_search(request(Some("client-1"), None, BODY), harness.state.clone()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unregistered_identity_unauthorized() {
        let harness = test_state();
        harness.nonces.issue("ghost");

        let response =
            handle_search(request(Some("ghost"), Some("AAAA"), BODY), harness.state.clone()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["message"], "Invalid credentials");
    }

    #[tokio::test]
    async fn test_missing_field_rejected_without_spending_nonce() {
        let harness = test_state();
        let signature = register_and_sign(&harness, "client-1").await;

        let response = handle_search(
            request(Some("client-1"), Some(&signature), r#"{"query":"x"}"#),
            harness.state.clone(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(harness.nonces.stats().pending, 1);
    }
}

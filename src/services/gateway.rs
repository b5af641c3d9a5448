//! Gated search orchestration
//!
//! A search runs only after the caller proves possession of the key
//! registered for its identifier by signing the nonce it was issued:
//!
//! ```text
//! Unauthenticated ──lookup──▶ Verifying ──consume+verify──▶ Verified
//!        │                        │                            │
//!        └──────────────┬─────────┘                 transcript + generation
//!                       ▼                                      ▼
//!                    Rejected                      ExternalCallInFlight
//!                                                    │              │
//!                                                    ▼              ▼
//!                                               Completed    UpstreamFailure
//! ```
//!
//! Every authentication failure surfaces as the same
//! [`TextframeError::Unauthorized`]; the distinguishing cause is only logged at
//! debug level. A usage record is written only for completed searches.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::auth::{
    decode_verifying_key, verify_detached, IdentityStore, NonceAuthority, RegisterOutcome,
};
use crate::logging::{UsageRecord, UsageSink};
use crate::services::generation::Generator;
use crate::services::prompt;
use crate::services::transcript::{format_transcript, TranscriptFetcher};
use crate::types::{Result, TextframeError};

/// Body of a search request
#[derive(Debug, Clone, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub video_id: String,
}

/// Where a gated call currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Unauthenticated,
    Verifying,
    Verified,
    ExternalCallInFlight,
    Completed,
    Rejected,
    UpstreamFailure,
}

impl CallState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Verifying => "verifying",
            Self::Verified => "verified",
            Self::ExternalCallInFlight => "external_call_in_flight",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::UpstreamFailure => "upstream_failure",
        }
    }

    /// Terminal state reached when a call fails with `err`
    pub fn on_error(err: &TextframeError) -> Self {
        if err.is_upstream() {
            Self::UpstreamFailure
        } else {
            Self::Rejected
        }
    }
}

impl std::fmt::Display for CallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinates identity, nonce, signature and the metered upstreams
pub struct Gateway {
    identities: Arc<dyn IdentityStore>,
    nonces: Arc<NonceAuthority>,
    transcripts: Arc<dyn TranscriptFetcher>,
    generator: Arc<dyn Generator>,
    usage: Arc<dyn UsageSink>,
    upstream_timeout: Duration,
}

impl Gateway {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        nonces: Arc<NonceAuthority>,
        transcripts: Arc<dyn TranscriptFetcher>,
        generator: Arc<dyn Generator>,
        usage: Arc<dyn UsageSink>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            identities,
            nonces,
            transcripts,
            generator,
            usage,
            upstream_timeout,
        }
    }

    pub fn nonces(&self) -> &Arc<NonceAuthority> {
        &self.nonces
    }

    /// Register or rotate the key for `uuid` (trust-on-first-use)
    pub async fn register(&self, uuid: &str, public_key: &str) -> Result<RegisterOutcome> {
        if uuid.is_empty() || public_key.is_empty() {
            return Err(TextframeError::BadRequest(
                "uuid and public_key are required".into(),
            ));
        }
        decode_verifying_key(public_key).map_err(|_| {
            TextframeError::BadRequest("public_key is not a valid Ed25519 key".into())
        })?;

        self.identities.register(uuid, public_key).await
    }

    /// Issue a challenge for `uuid`
    pub fn issue_nonce(&self, uuid: &str) -> Result<String> {
        if uuid.is_empty() {
            return Err(TextframeError::BadRequest("X-UUID header missing".into()));
        }
        Ok(self.nonces.issue(uuid))
    }

    /// Check that `signature` is the registered key's signature over the
    /// pending nonce for `uuid`. The nonce is spent whatever the outcome.
    pub async fn authenticate(&self, uuid: &str, signature: &str) -> Result<()> {
        let public_key = match self.identities.lookup(uuid).await {
            Ok(key) => key,
            Err(TextframeError::NotFound(_)) => {
                return Err(TextframeError::Unauthorized("identity not registered".into()));
            }
            Err(e) => return Err(e),
        };

        debug!(uuid = %uuid, state = %CallState::Verifying, "Identity found");

        let nonce = self
            .nonces
            .consume(uuid)
            .ok_or_else(|| TextframeError::Unauthorized("no pending nonce".into()))?;

        verify_detached(&public_key, nonce.as_bytes(), signature)
            .map_err(|cause| TextframeError::Unauthorized(cause.to_string()))
    }

    /// Authenticate, then fetch the transcript, run the prompt, record usage
    /// and return the parsed generation result.
    pub async fn perform_gated_call(
        &self,
        uuid: &str,
        signature: &str,
        request: &SearchRequest,
    ) -> Result<serde_json::Value> {
        if request.query.trim().is_empty() || request.video_id.trim().is_empty() {
            return Err(TextframeError::BadRequest(
                "query and video_id are required".into(),
            ));
        }

        debug!(uuid = %uuid, state = %CallState::Unauthenticated, "Gated call started");

        if let Err(e) = self.authenticate(uuid, signature).await {
            match &e {
                TextframeError::Unauthorized(cause) => {
                    warn!(uuid = %uuid, state = %CallState::Rejected, "Search rejected");
                    debug!(uuid = %uuid, cause = %cause, "Rejection cause");
                }
                other => error!(uuid = %uuid, error = %other, "Authentication lookup failed"),
            }
            return Err(e);
        }

        debug!(uuid = %uuid, state = %CallState::Verified, "Signature verified");

        let (value, output_text, tokens) = match self.run_upstreams(request).await {
            Ok(result) => result,
            Err(e) => {
                error!(
                    uuid = %uuid,
                    video_id = %request.video_id,
                    state = %CallState::on_error(&e),
                    error = %e,
                    "Search failed upstream"
                );
                return Err(e);
            }
        };

        let record = UsageRecord::new(uuid.to_string(), tokens, output_text, request.query.clone());
        if let Err(e) = self.usage.record(record).await {
            error!(uuid = %uuid, error = %e, "Failed to record usage");
        }

        info!(
            uuid = %uuid,
            video_id = %request.video_id,
            tokens = tokens,
            state = %CallState::Completed,
            "Search completed"
        );

        Ok(value)
    }

    async fn run_upstreams(
        &self,
        request: &SearchRequest,
    ) -> Result<(serde_json::Value, String, u64)> {
        debug!(
            video_id = %request.video_id,
            state = %CallState::ExternalCallInFlight,
            "Fetching transcript"
        );

        let segments = self
            .bounded("transcript fetch", self.transcripts.fetch(&request.video_id))
            .await?;
        let transcript = format_transcript(&segments)?;
        let prompt = prompt::render(&transcript, &request.query);

        let output = self
            .bounded("generation", self.generator.generate(&prompt))
            .await?;

        let value: serde_json::Value = serde_json::from_str(&output.text).map_err(|e| {
            TextframeError::Upstream(format!("Generation returned invalid JSON: {}", e))
        })?;

        Ok((value, output.text, output.total_token_count))
    }

    async fn bounded<T>(&self, what: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.upstream_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(TextframeError::Timeout(format!(
                "{} exceeded {}ms",
                what,
                self.upstream_timeout.as_millis()
            ))),
        }
    }
}

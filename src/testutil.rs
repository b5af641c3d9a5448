//! Shared fixtures for handler and server tests

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::Parser;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{InMemoryIdentityStore, NonceAuthority};
use crate::config::Args;
use crate::logging::InMemoryUsageSink;
use crate::server::AppState;
use crate::services::{GenerationOutput, Generator, Gateway, TranscriptFetcher, TranscriptSegment};
use crate::types::Result;

pub struct StaticTranscripts;

#[async_trait]
impl TranscriptFetcher for StaticTranscripts {
    async fn fetch(&self, _video_id: &str) -> Result<Vec<TranscriptSegment>> {
        Ok(vec![TranscriptSegment {
            text: "the answer".into(),
            start: 42.0,
            duration: 2.0,
        }])
    }
}

pub struct StaticGenerator;

#[async_trait]
impl Generator for StaticGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GenerationOutput> {
        Ok(GenerationOutput {
            text: r#"["00:42"]"#.into(),
            total_token_count: 12,
        })
    }
}

pub struct Harness {
    pub state: Arc<AppState>,
    pub identities: Arc<InMemoryIdentityStore>,
    pub nonces: Arc<NonceAuthority>,
    pub usage: Arc<InMemoryUsageSink>,
    pub signing_key: SigningKey,
}

pub fn test_args() -> Args {
    Args::try_parse_from([
        "textframe",
        "--mongodb-uri",
        "mongodb://localhost:27017",
        "--extension-id",
        "testextension",
        "--gemini-api-key",
        "key",
        "--gemini-model-name",
        "test-model",
        "--proxy-username",
        "user",
        "--proxy-password",
        "pass",
        "--proxy-domain",
        "proxy.test",
        "--proxy-port",
        "8080",
    ])
    .unwrap()
}

/// Fresh Ed25519 key pair and its standard-base64 public key
pub fn test_keypair() -> (SigningKey, String) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let public_key = STANDARD.encode(signing_key.verifying_key().as_bytes());
    (signing_key, public_key)
}

pub fn test_state() -> Harness {
    let identities = Arc::new(InMemoryIdentityStore::new());
    let nonces = Arc::new(NonceAuthority::new(None));
    let usage = Arc::new(InMemoryUsageSink::new());

    let gateway = Gateway::new(
        identities.clone(),
        nonces.clone(),
        Arc::new(StaticTranscripts),
        Arc::new(StaticGenerator),
        usage.clone(),
        Duration::from_secs(5),
    );
    let state = Arc::new(AppState::new(test_args(), Arc::new(gateway), false));
    let (signing_key, _) = test_keypair();

    Harness {
        state,
        identities,
        nonces,
        usage,
        signing_key,
    }
}

/// Register the harness key for `uuid`, issue a nonce and return its
/// signature the way the browser extension encodes it.
pub async fn register_and_sign(harness: &Harness, uuid: &str) -> String {
    let public_key = STANDARD.encode(harness.signing_key.verifying_key().as_bytes());
    harness.state.gateway.register(uuid, &public_key).await.unwrap();

    let nonce = harness.state.gateway.issue_nonce(uuid).unwrap();
    STANDARD.encode(harness.signing_key.sign(nonce.as_bytes()).to_bytes())
}

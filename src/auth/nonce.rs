//! Single-use nonce issuance
//!
//! Each client identifier holds at most one pending nonce. Issuing replaces
//! any earlier nonce; consuming removes it in the same map operation that
//! reads it, so two concurrent requests can never both spend one challenge.
//! Nothing here is persisted: after a restart clients simply ask again.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use tracing::{debug, info};

/// Random bytes per nonce before encoding
pub const NONCE_BYTES: usize = 16;

#[derive(Debug, Clone)]
struct PendingNonce {
    value: String,
    issued_at: Instant,
}

/// Issues and consumes per-identifier challenges
pub struct NonceAuthority {
    pending: DashMap<String, PendingNonce>,
    /// Optional lifetime; `None` means a nonce lives until consumed or replaced
    ttl: Option<Duration>,
}

impl NonceAuthority {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            pending: DashMap::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Issue a fresh nonce for `identifier`, discarding any pending one
    pub fn issue(&self, identifier: &str) -> String {
        let mut bytes = [0u8; NONCE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let value = URL_SAFE_NO_PAD.encode(bytes);

        let replaced = self.pending.insert(
            identifier.to_string(),
            PendingNonce {
                value: value.clone(),
                issued_at: Instant::now(),
            },
        );

        debug!(
            uuid = %identifier,
            replaced = replaced.is_some(),
            "Issued nonce"
        );

        value
    }

    /// Take the pending nonce for `identifier`.
    ///
    /// Returns `None` when nothing is pending: never issued, already
    /// consumed, or expired. The entry is gone after this call whatever the
    /// caller does with the value.
    pub fn consume(&self, identifier: &str) -> Option<String> {
        let (_, entry) = self.pending.remove(identifier)?;

        if self.is_expired(&entry) {
            debug!(uuid = %identifier, "Discarded expired nonce");
            return None;
        }

        Some(entry.value)
    }

    fn is_expired(&self, entry: &PendingNonce) -> bool {
        match self.ttl {
            Some(ttl) => entry.issued_at.elapsed() >= ttl,
            None => false,
        }
    }

    /// Drop expired nonces, returning how many were removed
    pub fn cleanup(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }

        let before = self.pending.len();
        self.pending.retain(|_, entry| !self.is_expired(entry));
        before.saturating_sub(self.pending.len())
    }

    pub fn stats(&self) -> NonceStats {
        NonceStats {
            pending: self.pending.len(),
            ttl_secs: self.ttl.map(|t| t.as_secs()),
        }
    }
}

impl Default for NonceAuthority {
    fn default() -> Self {
        Self::new(None)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NonceStats {
    pub pending: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
}

/// Periodically sweep expired nonces. No-op when no TTL is configured.
pub fn spawn_cleanup_task(authority: Arc<NonceAuthority>) {
    let Some(ttl) = authority.ttl() else {
        return;
    };

    tokio::spawn(async move {
        let interval = ttl.max(Duration::from_secs(30));
        loop {
            tokio::time::sleep(interval).await;
            let removed = authority.cleanup();
            if removed > 0 {
                debug!("Nonce cleanup: removed {} expired entries", removed);
            }
        }
    });
    info!("Nonce cleanup task started (ttl {}s)", ttl.as_secs());
}

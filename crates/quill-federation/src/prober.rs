// crates/quill-federation/src/prober.rs
//
// Reverse-trust probing: "does `remote` trust me?"
//
// A probe never fails. Every failure mode (connection error, timeout,
// non-success status, undecodable body) is logged and reported as
// "not trusted".

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::client::FederationClient;

/// Asks a remote instance whether it holds a Connection for `me`.
#[async_trait]
pub trait TrustProber: Send + Sync {
    async fn probe(&self, remote: &str, me: &str) -> bool;
}

/// JSON truthiness of a trust-check answer.
///
/// `null`, `false`, `0`, `""`, `[]` and `{}` are falsy; everything else is
/// truthy.
pub fn json_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ---------------------------------------------------------------------------
// HttpTrustProber
// ---------------------------------------------------------------------------

/// Probes over HTTP via the remote's trust-check surface.
#[derive(Debug, Clone)]
pub struct HttpTrustProber {
    client: FederationClient,
}

impl HttpTrustProber {
    pub fn new(client: FederationClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TrustProber for HttpTrustProber {
    async fn probe(&self, remote: &str, me: &str) -> bool {
        match self.client.check_connection(remote, me).await {
            Ok(answer) => {
                let trusted = json_truthy(&answer);
                tracing::debug!("Probe {} trusts {}: {} ({})", remote, me, trusted, answer);
                trusted
            }
            Err(e) => {
                tracing::warn!("Probe of {} for {} failed, assuming untrusted: {}", remote, me, e);
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// CachedTrustProber
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct CachedProbe {
    trusted: bool,
    at: Instant,
}

/// Short-TTL cache in front of another prober.
///
/// Keyed by `(remote, me)`. Positive and negative outcomes are both cached,
/// so a burst of visits from one origin produces at most one outbound probe
/// per TTL window. A zero TTL disables caching.
pub struct CachedTrustProber {
    inner: Arc<dyn TrustProber>,
    ttl: Duration,
    entries: RwLock<HashMap<(String, String), CachedProbe>>,
}

impl CachedTrustProber {
    pub fn new(inner: Arc<dyn TrustProber>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn lookup(&self, key: &(String, String)) -> Option<bool> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|c| c.at.elapsed() < self.ttl)
            .map(|c| c.trusted)
    }

    /// Drop expired entries.
    pub async fn purge_expired(&self) {
        let ttl = self.ttl;
        let mut entries = self.entries.write().await;
        entries.retain(|_, c| c.at.elapsed() < ttl);
    }

    /// Number of cached outcomes, expired ones included until purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl TrustProber for CachedTrustProber {
    async fn probe(&self, remote: &str, me: &str) -> bool {
        if self.ttl.is_zero() {
            return self.inner.probe(remote, me).await;
        }

        let key = (remote.to_string(), me.to_string());
        if let Some(trusted) = self.lookup(&key).await {
            tracing::debug!("Probe cache hit for {} -> {}: {}", remote, me, trusted);
            return trusted;
        }

        let trusted = self.inner.probe(remote, me).await;
        self.entries.write().await.insert(
            key,
            CachedProbe {
                trusted,
                at: Instant::now(),
            },
        );
        trusted
    }
}

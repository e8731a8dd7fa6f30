//! Incoming-advertisement handler.
//!
//! Consumes parsed presence notifications, derives the `node#ver` cache key
//! from any capability advertisement they carry, and drives the cache's
//! resolution path. The actual disco#info round trip goes through the
//! [`InfoQuery`] capability so the handler can be wired to a real session
//! or to a fake in tests.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use beacon_core::config::DiscoConfig;
use beacon_core::Info;

use crate::cache::CapsCache;
use crate::caps::Presence;
use crate::error::DiscoError;

/// The typed request/reply capability the fetch path needs from the
/// transport layer: send a disco#info query, await the parsed reply.
///
/// `node` is the full `node#ver` key, which the advertising peer echoes in
/// its reply element. Implementations map transport failures and malformed
/// replies to [`DiscoError::Query`].
#[async_trait]
pub trait InfoQuery: Send + Sync {
    async fn query_info(&self, to: &str, node: &str) -> Result<Info, DiscoError>;
}

/// Handles capability advertisements attached to incoming presence.
///
/// Owns the cache and the fetch collaborator; construct one per observer
/// and share it between presence-processing tasks.
pub struct CapsHandler {
    cache: CapsCache,
    query: Arc<dyn InfoQuery>,
    /// Zero disables the timeout.
    fetch_timeout: Duration,
}

impl CapsHandler {
    pub fn new(query: Arc<dyn InfoQuery>) -> Self {
        Self::with_timeout(query, Duration::from_secs(DiscoConfig::default().fetch_timeout_secs))
    }

    pub fn with_timeout(query: Arc<dyn InfoQuery>, fetch_timeout: Duration) -> Self {
        Self {
            cache: CapsCache::new(),
            query,
            fetch_timeout,
        }
    }

    pub fn from_config(query: Arc<dyn InfoQuery>, config: &DiscoConfig) -> Self {
        Self::with_timeout(query, Duration::from_secs(config.fetch_timeout_secs))
    }

    /// The cache this handler populates. Useful for lookups by later
    /// advertisements and for introspection.
    pub fn cache(&self) -> &CapsCache {
        &self.cache
    }

    /// Process one presence notification.
    ///
    /// Presence without an advertisement is a no-op (`Ok(None)`). Otherwise
    /// resolves the advertised fingerprint through the cache, fetching from
    /// the peer on a genuine miss. A fetched record is verified against the
    /// advertised fingerprint before it is cached; mismatch is
    /// [`DiscoError::VerMismatch`] and poisons nothing.
    pub async fn handle_presence(&self, presence: &Presence) -> Result<Option<Info>, DiscoError> {
        let Some(caps) = &presence.caps else {
            return Ok(None);
        };
        let key = caps.cache_key();

        let query = Arc::clone(&self.query);
        let to = presence.from.clone();
        let node = key.clone();
        let algo = caps.hash;
        let advertised = caps.ver.clone();
        let timeout = self.fetch_timeout;

        let info = self
            .cache
            .resolve(&key, move || async move {
                let info = if timeout.is_zero() {
                    query.query_info(&to, &node).await?
                } else {
                    match tokio::time::timeout(timeout, query.query_info(&to, &node)).await {
                        Ok(reply) => reply?,
                        Err(_) => return Err(DiscoError::Timeout(timeout.as_secs())),
                    }
                };

                // Hash the reply ourselves. A record that does not reproduce
                // the advertised fingerprint never reaches the cache.
                let computed = info.fingerprint(algo);
                if computed != advertised {
                    return Err(DiscoError::VerMismatch {
                        advertised,
                        computed,
                    });
                }
                Ok(info)
            })
            .await?;

        Ok(Some(info))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

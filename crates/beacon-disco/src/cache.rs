//! Capability cache — fingerprint cache key to resolved [`Info`].
//!
//! Entries are immutable once stored: the key is derived from a hash of the
//! value, so if the key is present the value is correct. No TTLs, no
//! invalidation (same policy as a content-addressed store).
//!
//! The interesting part is the miss path. Many presence notifications
//! referencing the same fingerprint can arrive at once; exactly one of the
//! concurrent resolvers runs the fetch, the rest subscribe to its outcome.
//! No lock is ever held across the fetch — hits and unrelated keys proceed
//! at full speed while a fetch is in flight.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures::FutureExt;
use tokio::sync::broadcast;

use beacon_core::Info;

use crate::error::DiscoError;

type Outcome = Result<Info, DiscoError>;

/// Concurrent map from cache key (`node#ver`) to resolved capability record,
/// with fetch-or-join resolution.
///
/// Cheap to clone-by-Arc internally; share one instance between every task
/// that processes presence.
pub struct CapsCache {
    /// Resolved records. Values are never mutated after insertion.
    entries: Arc<DashMap<String, Info>>,
    /// One sender per key currently being fetched. Late arrivals subscribe
    /// instead of fetching again. Removed when the fetch reports, either way.
    inflight: Arc<DashMap<String, broadcast::Sender<Outcome>>>,
}

impl CapsCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            inflight: Arc::new(DashMap::new()),
        }
    }

    /// Look up `key`, running `fetch` on a genuine miss.
    ///
    /// Guarantees:
    ///   - a stored entry is returned without invoking `fetch`;
    ///   - at most one fetch is in flight per key — concurrent callers for
    ///     the same key all receive the winner's outcome;
    ///   - a successful result is stored before any caller sees it;
    ///   - a failed fetch stores nothing, so the next call retries.
    ///
    /// The fetch runs as its own task: cancelling a `resolve` caller abandons
    /// only that caller's wait, never the fetch other callers are joined on.
    pub async fn resolve<F, Fut>(&self, key: &str, fetch: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let mut fetch = Some(fetch);
        loop {
            if let Some(hit) = self.entries.get(key) {
                tracing::debug!(key, "caps cache hit");
                return Ok(hit.value().clone());
            }

            // Race to claim the fetch. The entry guard pins a shard lock, so
            // it must not live across an await — decide a role, drop it,
            // then wait.
            let mut rx = match self.inflight.entry(key.to_string()) {
                Entry::Occupied(occupied) => {
                    tracing::debug!(key, "joining in-flight capability fetch");
                    occupied.get().subscribe()
                }
                Entry::Vacant(vacant) => {
                    // A fetch may have completed between the miss above and
                    // winning this slot; the entry check must repeat here or
                    // a cached key would be fetched a second time.
                    if let Some(hit) = self.entries.get(key) {
                        return Ok(hit.value().clone());
                    }
                    let Some(fetch) = fetch.take() else {
                        // Reachable only when the winner's broadcast closed
                        // without a message (runtime shutdown dropped the
                        // fetch task) and the retry lap won a slot with its
                        // closure already spent. Nothing left to run.
                        return Err(DiscoError::Query(
                            "resolve attempted to start a second fetch".into(),
                        ));
                    };
                    let (tx, rx) = broadcast::channel(1);
                    vacant.insert(tx);
                    tracing::debug!(key, "capability fetch dispatched");
                    self.spawn_fetch(key.to_string(), fetch());
                    rx
                }
            };

            match rx.recv().await {
                Ok(outcome) => return outcome,
                // The fetch task went away without reporting (runtime
                // shutdown). Take another lap: either the entry landed or
                // the key is free to claim again.
                Err(_) => continue,
            }
        }
    }

    /// Run the fetch to completion on its own task, store the result, then
    /// clear the in-flight record and wake every subscriber.
    fn spawn_fetch<Fut>(&self, key: String, fut: Fut)
    where
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let entries = Arc::clone(&self.entries);
        let inflight = Arc::clone(&self.inflight);
        tokio::spawn(async move {
            // A panicking fetch must still clear the in-flight record or
            // every later resolve for this key would wait forever.
            let outcome = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(outcome) => outcome,
                Err(_) => Err(DiscoError::Query("capability fetch panicked".into())),
            };

            match &outcome {
                Ok(info) => {
                    // The entry goes in before the in-flight record comes
                    // out: no caller can observe the key as neither cached
                    // nor in flight.
                    entries.insert(key.clone(), info.clone());
                    tracing::info!(key = %key, "capability info cached");
                }
                Err(error) => {
                    tracing::warn!(key = %key, error = %error, "capability fetch failed");
                }
            }

            if let Some((_, tx)) = inflight.remove(&key) {
                // No receivers left means every waiter was cancelled; the
                // entry is already stored, so nothing is lost.
                let _ = tx.send(outcome);
            }
        });
    }

    /// A stored record, if the key has been resolved.
    pub fn get(&self, key: &str) -> Option<Info> {
        self.entries.get(key).map(|e| e.value().clone())
    }

    /// Is the key resolved? In-flight fetches do not count.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of resolved entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every resolved entry. In-flight fetches are unaffected and will
    /// re-populate their keys when they complete.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for CapsCache {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

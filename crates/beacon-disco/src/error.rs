//! Discovery error taxonomy.

use thiserror::Error;

/// Errors surfaced by capability resolution.
///
/// `Clone` is required: one fetch outcome is broadcast to every caller
/// joined on the same cache key, so transport failures are carried as
/// messages rather than source errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoError {
    /// The disco#info request failed: transport error or malformed reply.
    #[error("discovery query failed: {0}")]
    Query(String),

    /// The disco#info request did not complete within the configured window.
    #[error("discovery query timed out after {0}s")]
    Timeout(u64),

    /// The fetched record does not hash to the advertised fingerprint.
    /// Nothing is cached; the peer is either buggy or lying.
    #[error("fetched info hashes to {computed}, advertisement claimed {advertised}")]
    VerMismatch { advertised: String, computed: String },
}

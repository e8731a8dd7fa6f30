//! Canonical serialization and fingerprinting of capability records.
//!
//! Provides two things:
//!   1. A deterministic byte serialization of [`Info`] that is independent
//!      of the order identities, features, and form fields arrived in.
//!   2. A fingerprint: the canonical bytes run through a registered digest
//!      algorithm and Base64-encoded. The result is short, comparable, and
//!      suitable as a cache key.
//!
//! The serialization rules must be followed exactly or two peers computing
//! the fingerprint of the same capability set will disagree:
//!   - identities sorted by (category, type, lang); name is emitted but
//!     never compared
//!   - features sorted by var, byte-wise
//!   - forms kept in input order; within each form the FORM_TYPE value
//!     leads, remaining fields sorted by var, values sorted within a field
//!   - every token is terminated by `<`
//!
//! Sorting happens on scratch copies — the caller's `Info` is never
//! reordered.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;

use crate::info::{Field, Info};

// ── Algorithm selection ───────────────────────────────────────────────────────

/// Digest algorithm named in a capability advertisement.
///
/// Identifiers follow the IANA hash-function registry spelling, which is
/// what appears in the `hash` attribute on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "sha-256")]
    Sha256,
    #[serde(rename = "sha-512")]
    Sha512,
}

impl HashAlgorithm {
    /// The wire identifier, e.g. `"sha-256"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha-256",
            HashAlgorithm::Sha512 => "sha-512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = UnsupportedAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha-256" => Ok(HashAlgorithm::Sha256),
            "sha-512" => Ok(HashAlgorithm::Sha512),
            other => Err(UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// An advertisement named a digest algorithm this build does not support.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported hash algorithm: {0}")]
pub struct UnsupportedAlgorithm(pub String);

// ── Canonical serialization ───────────────────────────────────────────────────

impl Info {
    /// Append the canonical serialization of this record to `out`.
    ///
    /// An empty record appends nothing.
    pub fn append_canonical(&self, out: &mut Vec<u8>) {
        // Identities: sort by (category, type, lang). Ties are left in
        // input order — name does not break them.
        let mut identities: Vec<_> = self.identities.iter().collect();
        identities.sort_by(|a, b| {
            a.category
                .cmp(&b.category)
                .then_with(|| a.itype.cmp(&b.itype))
                .then_with(|| a.lang.cmp(&b.lang))
        });
        for ident in identities {
            // Writes to a Vec cannot fail.
            let _ = write!(
                out,
                "{}/{}/{}/{}<",
                ident.category, ident.itype, ident.lang, ident.name
            );
        }

        // Features: sort by var, byte-wise.
        let mut features: Vec<_> = self.features.iter().map(|f| f.var.as_str()).collect();
        features.sort_unstable();
        for var in features {
            out.extend_from_slice(var.as_bytes());
            out.push(b'<');
        }

        // Forms: input order is significant, fields within a form are not.
        for form in &self.forms {
            let form_type = form.form_type().unwrap_or("");
            let mut fields: Vec<&Field> = form
                .fields
                .iter()
                .filter(|f| f.var != "FORM_TYPE")
                .collect();
            fields.sort_by(|a, b| a.var.cmp(&b.var));

            out.extend_from_slice(form_type.as_bytes());
            out.push(b'<');
            for field in fields {
                out.extend_from_slice(field.var.as_bytes());
                out.push(b'<');
                let mut values: Vec<_> = field.values.iter().map(String::as_str).collect();
                values.sort_unstable();
                for value in values {
                    out.extend_from_slice(value.as_bytes());
                    out.push(b'<');
                }
            }
        }
    }

    /// The canonical serialization as a fresh byte vector.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.append_canonical(&mut out);
        out
    }

    // ── Fingerprint ───────────────────────────────────────────────────────────

    /// The fingerprint of this record under `algo`: digest of the canonical
    /// bytes, Base64 standard encoding. This is the `ver` string carried in
    /// capability advertisements and the second half of the cache key.
    pub fn fingerprint(&self, algo: HashAlgorithm) -> String {
        let mut out = String::new();
        self.append_fingerprint(&mut out, algo);
        out
    }

    /// Like [`Info::fingerprint`] but appends to an existing buffer, so a
    /// cache key can be composed without an intermediate allocation.
    pub fn append_fingerprint(&self, dst: &mut String, algo: HashAlgorithm) {
        let canonical = self.canonical_bytes();
        match algo {
            HashAlgorithm::Sha256 => STANDARD.encode_string(Sha256::digest(&canonical), dst),
            HashAlgorithm::Sha512 => STANDARD.encode_string(Sha512::digest(&canonical), dst),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Entity-capabilities advertisement types.
//!
//! A [`Caps`] triple rides along with every presence broadcast and names a
//! capability set by fingerprint instead of shipping the full record. The
//! framing layer parses the wire element (attributes `node`, `hash`, `ver`
//! in the [`NS_CAPS`] namespace) into this type; everything below the
//! attribute level is its problem, not ours.

use serde::{Deserialize, Serialize};

use beacon_core::{HashAlgorithm, Info};

/// Namespace of the capability advertisement element.
pub const NS_CAPS: &str = "http://jabber.org/protocol/caps";

/// Namespace of the service discovery info query and reply.
pub const NS_DISCO_INFO: &str = "http://jabber.org/protocol/disco#info";

/// A capability advertisement: `ver` is the fingerprint of some [`Info`]
/// under `hash`, `node` identifies the advertising software (conventionally
/// its homepage URI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caps {
    pub node: String,
    pub hash: HashAlgorithm,
    pub ver: String,
}

impl Caps {
    /// Build the advertisement a local entity embeds in its own presence
    /// broadcasts for the given capability record.
    pub fn for_info(node: impl Into<String>, hash: HashAlgorithm, info: &Info) -> Self {
        Self {
            node: node.into(),
            hash,
            ver: info.fingerprint(hash),
        }
    }

    /// The cache key for this advertisement: `node#ver`.
    ///
    /// Both components are opaque strings; the key is only meaningful for
    /// equality.
    pub fn cache_key(&self) -> String {
        let mut key = String::with_capacity(self.node.len() + 1 + self.ver.len());
        key.push_str(&self.node);
        key.push('#');
        key.push_str(&self.ver);
        key
    }
}

/// An inbound presence notification, already parsed by the framing layer.
///
/// `caps` is `None` when the presence carried no advertisement element —
/// a perfectly normal presence, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    /// Address of the broadcasting peer, used as the disco#info destination.
    pub from: String,
    #[serde(default)]
    pub caps: Option<Caps>,
}

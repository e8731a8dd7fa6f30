//! beacon-disco — entity-capabilities cache and presence advertisement
//! handling.
//!
//! Peers broadcast a `(node, hash, ver)` triple alongside presence. The
//! [`CapsHandler`] turns each triple into a cache key and asks the
//! [`CapsCache`] for the full capability record, fetching it from the
//! advertising peer at most once per distinct fingerprint.

pub mod cache;
pub mod caps;
pub mod error;
pub mod handler;

pub use cache::CapsCache;
pub use caps::{Caps, Presence, NS_CAPS, NS_DISCO_INFO};
pub use error::DiscoError;
pub use handler::{CapsHandler, InfoQuery};

//! Capability records — what an entity says it can do.
//!
//! An [`Info`] value is the parsed body of a `disco#info` reply: service
//! identities, supported feature namespaces, and extended data forms.
//! The collections carry no inherent order; two `Info` values holding the
//! same multiset of identities, features, and forms must produce the same
//! fingerprint regardless of the order they arrived in (see `hash.rs`).
//!
//! Data forms are treated as opaque, already-parsed field lists. This crate
//! has no opinion about form semantics beyond the `FORM_TYPE` convention.

use serde::{Deserialize, Serialize};

/// A service identity: who/what the entity is.
///
/// `name` is a human-readable label only — it appears in the canonical
/// serialization but never participates in ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub category: String,
    #[serde(rename = "type")]
    pub itype: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub name: String,
}

/// A supported protocol namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub var: String,
}

/// One field of a data form. Multi-valued; zero values is legal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub var: String,
    #[serde(default)]
    pub values: Vec<String>,
}

/// An extended data form attached to a capability record.
///
/// By convention a form carries a `FORM_TYPE` field naming its namespace.
/// A form without one is still valid — the canonical serialization treats
/// the missing type as an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Form {
    pub fields: Vec<Field>,
}

impl Form {
    /// The first value of the `FORM_TYPE` field, if any.
    pub fn form_type(&self) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.var == "FORM_TYPE")
            .and_then(|f| f.values.first())
            .map(String::as_str)
    }
}

/// A full capability record: identities, features, and extended forms.
///
/// Identity and feature order is irrelevant. Form order is significant —
/// multiple forms of different `FORM_TYPE` may appear and their relative
/// sequence is preserved by the canonical serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub identities: Vec<Identity>,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub forms: Vec<Form>,
}

impl Info {
    /// Does this record advertise the given feature namespace?
    pub fn has_feature(&self, var: &str) -> bool {
        self.features.iter().any(|f| f.var == var)
    }
}

//! Cross-peer fingerprint agreement scenarios.
//!
//! Two implementations parsing the same capability set from the wire in
//! different orders must still agree on the advertisement — otherwise every
//! observer cache-misses on records it already holds.

use beacon_core::{Field, Form, HashAlgorithm};
use beacon_disco::Caps;

use crate::client_info;

#[test]
fn reordered_parse_produces_the_same_advertisement() {
    let info = client_info();
    let mut reordered = info.clone();
    reordered.identities.reverse();
    reordered.features.reverse();

    let a = Caps::for_info("https://example/client", HashAlgorithm::Sha256, &info);
    let b = Caps::for_info("https://example/client", HashAlgorithm::Sha256, &reordered);
    assert_eq!(a, b);
    assert_eq!(a.cache_key(), b.cache_key());
}

#[test]
fn form_field_order_does_not_change_the_key() {
    let mut info = client_info();
    info.forms.push(Form {
        fields: vec![
            Field {
                var: "FORM_TYPE".into(),
                values: vec!["urn:example:profile".into()],
            },
            Field {
                var: "os".into(),
                values: vec!["Linux".into()],
            },
            Field {
                var: "os_version".into(),
                values: vec!["6.1".into(), "6.0".into()],
            },
        ],
    });

    let mut shuffled = info.clone();
    shuffled.forms[0].fields.reverse();
    shuffled.forms[0].fields[0].values.reverse();

    assert_eq!(
        info.fingerprint(HashAlgorithm::Sha256),
        shuffled.fingerprint(HashAlgorithm::Sha256)
    );
}

#[test]
fn different_algorithms_produce_different_advertisements() {
    let info = client_info();
    let sha256 = Caps::for_info("https://example/client", HashAlgorithm::Sha256, &info);
    let sha512 = Caps::for_info("https://example/client", HashAlgorithm::Sha512, &info);
    assert_ne!(sha256.ver, sha512.ver);
    assert_ne!(sha256.cache_key(), sha512.cache_key());
}

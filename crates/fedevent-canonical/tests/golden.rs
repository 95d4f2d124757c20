use fedevent_canonical::{
    canonicalize, canonicalize_value, encode_verifying_key, list_key_ids, sign_json, verify_json,
    Base64Bytes, KeyId, Sha256Hash, SigningKey,
};
use proptest::prelude::*;
use serde_json::{json, Value};

#[test]
fn base64_bytes_serialize_to_golden_json() {
    let bytes = Base64Bytes::new(b"foobar".to_vec());
    assert_eq!(serde_json::to_string(&bytes).unwrap(), r#""Zm9vYmFy""#);
}

#[test]
fn canonicalizer_produces_ordered_bytes() {
    let value = json!({"b": 1, "a": {"nested": 2}});
    let bytes = canonicalize_value(&value).unwrap();
    assert_eq!(bytes, br#"{"a":{"nested":2},"b":1}"#.to_vec());
}

#[test]
fn canonical_form_of_signed_object_is_stable() {
    let key = SigningKey::from_bytes(&hex_seed());
    let key_id = KeyId::parse("ed25519:1").unwrap();
    let signed = sign_json("example.org", &key_id, &key, br#"{ "one": 1, "two": "Two" }"#).unwrap();

    assert_eq!(canonicalize(&signed).unwrap(), signed);
    assert_eq!(list_key_ids("example.org", &signed).unwrap(), vec![key_id.clone()]);
    verify_json("example.org", &key_id, &key.verifying_key(), &signed).unwrap();

    let text = String::from_utf8(signed).unwrap();
    assert!(text.starts_with(r#"{"one":1,"signatures":{"example.org":{"ed25519:1":""#));
    assert!(text.ends_with(r#""}},"two":"Two"}"#));
}

#[test]
fn hash_of_canonical_bytes_is_reproducible() {
    let a = canonicalize(br#"{"b":[1,2],"a":"x"}"#).unwrap();
    let b = canonicalize(br#"{ "a" : "x", "b" : [ 1, 2 ] }"#).unwrap();
    assert_eq!(Sha256Hash::of(&a), Sha256Hash::of(&b));
}

// Published federation signing vectors: server "domain", key "ed25519:1".
fn published_key() -> SigningKey {
    let seed = hex::decode("6090c103d5e7af6b15a970fd563ed75549e6159719ae5c3c31dee4316fb75c0d")
        .unwrap();
    SigningKey::from_bytes(&seed.try_into().unwrap())
}

fn published_key_id() -> KeyId {
    KeyId::parse("ed25519:1").unwrap()
}

#[test]
fn published_key_encodes_to_known_public_key() {
    assert_eq!(
        encode_verifying_key(&published_key().verifying_key()),
        "XGX0JRS2Af3be3knz2fBiRbApjm2Dh61gXDJA8kcJNI"
    );
}

#[test]
fn signs_empty_object_like_published_vector() {
    let signed = sign_json("domain", &published_key_id(), &published_key(), b"{}").unwrap();
    assert_eq!(
        String::from_utf8(signed).unwrap(),
        r#"{"signatures":{"domain":{"ed25519:1":"K8280/U9SSy9IVtjBuVeLr+HpOB4BQFWbg+UZaADMtTdGYI7Geitb76LTrr5QV/7Xg4ahLwYGYZzuHGZKM5ZAQ"}}}"#
    );
}

#[test]
fn signs_simple_object_like_published_vector() {
    let signed = sign_json(
        "domain",
        &published_key_id(),
        &published_key(),
        br#"{"two": "Two", "one": 1}"#,
    )
    .unwrap();
    assert_eq!(
        String::from_utf8(signed).unwrap(),
        r#"{"one":1,"signatures":{"domain":{"ed25519:1":"KqmLSbO39/Bzb0QIYE82zqLwsA+PDzYIpIRA2sRQ4sL53+sN6/fpNSoqE7BP7vBZhG6kYdD13EIMJpvhJI+6Bw"}},"two":"Two"}"#
    );
}

#[test]
fn non_ascii_and_astral_keys_match_known_bytes() {
    let value = json!({
        "\u{10000}": "\u{1f600}",
        "\u{ff61}": "\u{65e5}\u{672c}",
        "a": "caf\u{e9}\u{7f}\u{1}",
    });
    let bytes = canonicalize_value(&value).unwrap();
    assert_eq!(
        hex::encode(&bytes),
        "7b2261223a22636166c3a97f5c7530303031222c22efbda1223a22e697a5e69cac222c22f0908080223a22f09f9880227d"
    );
    assert_eq!(
        Sha256Hash::of(&bytes).to_base64(),
        "b6UaSPWK1h5XTggzWr5vxHJkvObrJo+BLh7c2/7OMps"
    );

    let signed = sign_json("domain", &published_key_id(), &published_key(), &bytes).unwrap();
    let signature = serde_json::from_slice::<Value>(&signed).unwrap()["signatures"]["domain"]
        ["ed25519:1"]
        .clone();
    assert_eq!(
        signature,
        json!("KQr8XAc839zLqZAliFe8+Xkkl6YfUkCKq82bQ+lEbeYD4ON5Y+h4ykmjnTr37xqFIUEyu0gD0pCevsqu2EzzAw")
    );
}

fn hex_seed() -> [u8; 32] {
    let bytes = hex::decode("9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60")
        .unwrap();
    bytes.try_into().unwrap()
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-1_000_000i64..1_000_000).prop_map(|n| json!(n)),
        "[a-zA-Z0-9 _\u{e9}\u{4e2d}]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn canonicalization_is_idempotent(value in arb_json()) {
        let once = canonicalize_value(&value).unwrap();
        let twice = canonicalize(&once).unwrap();
        prop_assert_eq!(&once, &twice);
    }

    #[test]
    fn canonical_bytes_parse_back_to_the_same_value(value in arb_json()) {
        let bytes = canonicalize_value(&value).unwrap();
        let parsed: Value = serde_json::from_slice(&bytes).unwrap();
        prop_assert_eq!(parsed, value);
    }
}

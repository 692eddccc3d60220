// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const TEST_KEY: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcd";

#[test]
fn round_trips_plaintext_through_envelope() {
    let envelope = encrypt_secret("super-secret-token", TEST_KEY).unwrap();
    assert!(is_secret_envelope(&envelope));
    let plaintext = decrypt_secret(&envelope, TEST_KEY).unwrap();
    assert_eq!(plaintext, "super-secret-token");
}

#[test]
fn encrypting_twice_yields_different_ciphertext() {
    let a = encrypt_secret("same-value", TEST_KEY).unwrap();
    let b = encrypt_secret("same-value", TEST_KEY).unwrap();
    assert_ne!(a, b);
}

#[test]
fn decrypt_is_noop_on_plain_value() {
    let plaintext = decrypt_secret("not-enveloped", TEST_KEY).unwrap();
    assert_eq!(plaintext, "not-enveloped");
}

#[test]
fn is_secret_envelope_requires_prefix() {
    assert!(!is_secret_envelope("plain-value"));
    assert!(is_secret_envelope("enc:v1:abc123"));
}

#[test]
fn rejects_malformed_key_length() {
    assert!(encrypt_secret("value", "too-short").is_err());
}

#[test]
fn decrypting_with_wrong_key_fails() {
    let envelope = encrypt_secret("value", TEST_KEY).unwrap();
    let other_key = "ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
    assert!(decrypt_secret(&envelope, other_key).is_err());
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secret envelope (C17, spec §4.17). Wraps values destined for storage
//! (env vars handed into a sandbox, registry auth tokens) in an
//! AES-256-GCM envelope so they're never at rest in plaintext.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine;
use edw_core::Error;
use rand::RngCore;

const ENVELOPE_PREFIX: &str = "enc:v1:";
const IV_LEN: usize = 12;

/// Derives the AES-256 key from a 64-character hex string (`ENCRYPTION_KEY`
/// env var, spec §6).
fn parse_key_hex(key_hex: &str) -> Result<[u8; 32], Error> {
    if key_hex.len() != 64 {
        return Err(Error::InvalidArgument("ENCRYPTION_KEY must be 64 hex characters (32 bytes)".to_string()));
    }
    let mut key = [0u8; 32];
    for (i, chunk) in key_hex.as_bytes().chunks(2).enumerate() {
        let byte_str = std::str::from_utf8(chunk).map_err(|_| Error::InvalidArgument("ENCRYPTION_KEY is not valid hex".to_string()))?;
        key[i] = u8::from_str_radix(byte_str, 16).map_err(|_| Error::InvalidArgument("ENCRYPTION_KEY is not valid hex".to_string()))?;
    }
    Ok(key)
}

/// True if `value` is already wrapped in a secret envelope; callers use
/// this to decide whether a stored value needs decrypting.
pub fn is_secret_envelope(value: &str) -> bool {
    value.starts_with(ENVELOPE_PREFIX)
}

/// Encrypts `plaintext` into `"enc:v1:" + base64(iv || authTag || ciphertext)`.
pub fn encrypt_secret(plaintext: &str, key_hex: &str) -> Result<String, Error> {
    let key_bytes = parse_key_hex(key_hex)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    let nonce = Nonce::from_slice(&iv);

    let ciphertext_and_tag =
        cipher.encrypt(nonce, plaintext.as_bytes()).map_err(|e| Error::Internal(format!("secret encryption failed: {e}")))?;

    let mut envelope = Vec::with_capacity(IV_LEN + ciphertext_and_tag.len());
    envelope.extend_from_slice(&iv);
    envelope.extend_from_slice(&ciphertext_and_tag);

    Ok(format!("{ENVELOPE_PREFIX}{}", base64::engine::general_purpose::STANDARD.encode(envelope)))
}

/// Decrypts an envelope produced by [`encrypt_secret`]. A value that isn't
/// enveloped is returned unchanged (spec §4.17: `decryptSecret` is a no-op
/// on non-enveloped values).
pub fn decrypt_secret(value: &str, key_hex: &str) -> Result<String, Error> {
    let Some(encoded) = value.strip_prefix(ENVELOPE_PREFIX) else {
        return Ok(value.to_string());
    };
    let key_bytes = parse_key_hex(key_hex)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

    let raw = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| Error::InvalidArgument(format!("malformed secret envelope: {e}")))?;
    if raw.len() < IV_LEN {
        return Err(Error::InvalidArgument("malformed secret envelope: too short".to_string()));
    }
    let (iv, ciphertext_and_tag) = raw.split_at(IV_LEN);
    let nonce = Nonce::from_slice(iv);

    let plaintext =
        cipher.decrypt(nonce, ciphertext_and_tag).map_err(|e| Error::Internal(format!("secret decryption failed: {e}")))?;
    String::from_utf8(plaintext).map_err(|e| Error::Internal(format!("decrypted secret is not valid utf-8: {e}")))
}

#[cfg(test)]
#[path = "secret_tests.rs"]
mod tests;

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Preview routing (C14, spec §4.13): deterministic preview URL derivation
//! for the two deployment modes, plus the edge-KV upsert HTTPS PUT for
//! subdomain mode. The edge worker itself (host lookup, cache headers,
//! CSP injection, per-subdomain rate limit) is a separate program that
//! only *consumes* this namespace — out of scope here, per spec §4.13.

use async_trait::async_trait;
use edw_core::{ChatId, Error, UserId};
use sha2::{Digest, Sha256};

/// Word lists for the human-readable half of a subdomain. Picked the same
/// way Docker/Heroku-style slug generators do: two short, unambiguous
/// lists indexed deterministically off a hash, not meant to be
/// exhaustive or branded.
const ADJECTIVES: &[&str] = &[
    "amber", "brisk", "calm", "dusty", "eager", "fleet", "gentle", "hazy", "icy", "jolly", "keen",
    "lively", "misty", "nimble", "orderly", "plain", "quiet", "rapid", "sandy", "tidy", "urban",
    "vivid", "warm", "young", "zesty", "bold", "crisp", "deep", "east", "fair", "grand", "humble",
];
const NOUNS: &[&str] = &[
    "river", "canyon", "meadow", "harbor", "ridge", "forest", "delta", "plateau", "valley",
    "summit", "coast", "prairie", "glacier", "island", "marsh", "basin", "trail", "grove",
    "cove", "dune", "reef", "spring", "bay", "peak", "field", "garden", "shore", "creek",
    "hollow", "ledge", "brook", "pond",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentMode {
    Subdomain,
    Path,
}

/// Replaces any char outside `[A-Za-z0-9-_.]` with `_` (spec §4.13).
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

fn hash_bytes(user_id: &UserId, chat_id: &ChatId) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(user_id.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(chat_id.as_str().as_bytes());
    hasher.finalize().into()
}

const BASE36_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn base36_chars(bytes: &[u8], count: usize) -> String {
    let mut n: u64 = bytes.iter().take(8).fold(0u64, |acc, b| (acc << 8) | *b as u64);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(BASE36_ALPHABET[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Derives the stable `<adjective>-<noun>-<5-char-base36>` subdomain for a
/// `(userId, chatId)` pair. Stable across builds because it is pure in its
/// inputs.
pub fn derive_subdomain(user_id: &UserId, chat_id: &ChatId) -> String {
    let hash = hash_bytes(user_id, chat_id);
    let adjective = ADJECTIVES[hash[0] as usize % ADJECTIVES.len()];
    let noun = NOUNS[hash[1] as usize % NOUNS.len()];
    let suffix = base36_chars(&hash[2..], 5);
    format!("{adjective}-{noun}-{suffix}")
}

/// Registers a subdomain → `<user>/<chat>` mapping in the edge worker's KV
/// namespace. The edge worker that consumes this namespace is a separate
/// program, out of scope here (spec §1) — only the write contract is.
#[async_trait]
pub trait EdgeKvClient: Send + Sync {
    async fn put_mapping(&self, subdomain: &str, value: &str) -> Result<(), Error>;
}

/// Cloudflare Workers KV-style REST PUT, matching the `CLOUDFLARE_*` env
/// vars in spec §6 and the same bearer-auth `reqwest` shape
/// `edw-container::object_store`'s CDN invalidation call uses.
pub struct HttpEdgeKvClient {
    http: reqwest::Client,
    put_url_base: String,
    api_token: String,
}

impl HttpEdgeKvClient {
    pub fn new(put_url_base: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), put_url_base: put_url_base.into(), api_token: api_token.into() }
    }
}

#[async_trait]
impl EdgeKvClient for HttpEdgeKvClient {
    async fn put_mapping(&self, subdomain: &str, value: &str) -> Result<(), Error> {
        let url = format!("{}/{}", self.put_url_base.trim_end_matches('/'), subdomain);
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.api_token)
            .body(value.to_string())
            .send()
            .await
            .map_err(|e| Error::StorageUnavailable(format!("edge kv upsert failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::StorageUnavailable(format!("edge kv upsert returned {}", response.status())));
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct FakeEdgeKvClient {
        pub mappings: Mutex<Vec<(String, String)>>,
    }

    impl FakeEdgeKvClient {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl EdgeKvClient for FakeEdgeKvClient {
        async fn put_mapping(&self, subdomain: &str, value: &str) -> Result<(), Error> {
            self.mappings.lock().push((subdomain.to_string(), value.to_string()));
            Ok(())
        }
    }
}

/// Builds the preview URL for `mode`, performing the edge-KV upsert in
/// subdomain mode.
pub async fn route_preview(
    edge_kv: &dyn EdgeKvClient,
    config: &PreviewConfig,
    user_id: &UserId,
    chat_id: &ChatId,
) -> Result<String, Error> {
    match config.mode {
        DeploymentMode::Path => {
            Ok(format!("{}/{}/{}/", config.cloudfront_base.trim_end_matches('/'), sanitize(user_id.as_str()), sanitize(chat_id.as_str())))
        }
        DeploymentMode::Subdomain => {
            let subdomain = derive_subdomain(user_id, chat_id);
            let value = format!("{}/{}", user_id.as_str(), chat_id.as_str());
            edge_kv.put_mapping(&subdomain, &value).await?;
            Ok(format!("https://{subdomain}.{}", config.root_domain))
        }
    }
}

/// Config for preview routing, sourced from daemon env vars (spec §6):
/// `EDWARD_DEPLOYMENT_TYPE`, `PREVIEW_ROOT_DOMAIN`, `CLOUDFLARE_*`,
/// `CLOUDFRONT_DISTRIBUTION_URL`.
#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub mode: DeploymentMode,
    pub root_domain: String,
    pub cloudfront_base: String,
}

#[cfg(test)]
#[path = "preview_tests.rs"]
mod tests;

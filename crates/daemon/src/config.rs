// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration (spec §6): every setting is read from environment
//! variables, no config file. Centralizing the fallback chains here mirrors
//! the teacher's `env.rs` ("Centralized environment variable access"), just
//! re-pointed at this domain's own variable list.

use edw_core::Error;
use edw_engine::DeploymentMode;

/// Trust-proxy setting shape the spec names but doesn't uniformly resolve a
/// fallback for (§9 open question). We document the decision here: absent
/// the env var, trust nothing but the loopback interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustProxy {
    Loopback,
    Bool(bool),
    HopCount(u32),
    Cidr(String),
    AllowList(Vec<String>),
}

fn parse_trust_proxy(raw: &str) -> TrustProxy {
    let trimmed = raw.trim();
    if let Ok(b) = trimmed.parse::<bool>() {
        return TrustProxy::Bool(b);
    }
    if let Ok(hops) = trimmed.parse::<u32>() {
        return TrustProxy::HopCount(hops);
    }
    if trimmed.contains(',') {
        return TrustProxy::AllowList(trimmed.split(',').map(|s| s.trim().to_string()).collect());
    }
    if trimmed.contains('/') {
        return TrustProxy::Cidr(trimmed.to_string());
    }
    TrustProxy::AllowList(vec![trimmed.to_string()])
}

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub deployment_mode: DeploymentMode,
    pub preview_root_domain: String,
    pub cloudfront_distribution_url: String,
    pub cloudflare_api_token: String,
    pub cloudflare_kv_put_url_base: String,
    pub s3_bucket: String,
    pub s3_region: String,
    pub cdn_invalidation_url: String,
    pub cdn_api_token: String,
    pub encryption_key_hex: String,
    pub trust_proxy: TrustProxy,
    pub max_active_runs_per_user: i64,
    pub max_agent_tool_calls_per_run: u32,
    pub tool_gateway_timeout_ms: u64,
    pub worker_concurrency: usize,
    pub cors_origin: String,
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn require_env(name: &str) -> Result<String, Error> {
    env_var(name).ok_or_else(|| Error::InvalidArgument(format!("missing required env var {name}")))
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    env_var(name).and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Loads every setting from the process environment, applying each
    /// fallback chain the spec names (`REDIS_URL | REDIS_HOST+REDIS_PORT`,
    /// etc). Fails closed: a setting with no sensible default and no value
    /// present is a hard error rather than a silently empty string.
    pub fn from_env() -> Result<Self, Error> {
        let redis_url = match env_var("REDIS_URL") {
            Some(url) => url,
            None => {
                let host = env_var("REDIS_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
                let port = env_var("REDIS_PORT").unwrap_or_else(|| "6379".to_string());
                format!("redis://{host}:{port}")
            }
        };

        let deployment_mode = match env_var("EDWARD_DEPLOYMENT_TYPE").as_deref() {
            Some("subdomain") => DeploymentMode::Subdomain,
            Some("path") | None => DeploymentMode::Path,
            Some(other) => return Err(Error::InvalidArgument(format!("EDWARD_DEPLOYMENT_TYPE must be 'path' or 'subdomain', got {other:?}"))),
        };

        let trust_proxy = env_var("TRUST_PROXY").map(|raw| parse_trust_proxy(&raw)).unwrap_or(TrustProxy::Loopback);

        Ok(Self {
            redis_url,
            deployment_mode,
            preview_root_domain: env_var("PREVIEW_ROOT_DOMAIN").unwrap_or_default(),
            cloudfront_distribution_url: env_var("CLOUDFRONT_DISTRIBUTION_URL").unwrap_or_default(),
            cloudflare_api_token: env_var("CLOUDFLARE_API_TOKEN").unwrap_or_default(),
            cloudflare_kv_put_url_base: env_var("CLOUDFLARE_KV_PUT_URL_BASE").unwrap_or_default(),
            s3_bucket: require_env("S3_BUCKET")?,
            s3_region: env_var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            cdn_invalidation_url: env_var("CDN_INVALIDATION_URL").unwrap_or_default(),
            cdn_api_token: env_var("CDN_API_TOKEN").unwrap_or_default(),
            encryption_key_hex: require_env("ENCRYPTION_KEY")?,
            trust_proxy,
            max_active_runs_per_user: parse_env("MAX_ACTIVE_RUNS_PER_USER", 3),
            max_agent_tool_calls_per_run: parse_env("MAX_AGENT_TOOL_CALLS_PER_RUN", 18),
            tool_gateway_timeout_ms: parse_env("TOOL_GATEWAY_TIMEOUT_MS", 15_000),
            worker_concurrency: parse_env("WORKER_CONCURRENCY", edw_engine::WORKER_CONCURRENCY),
            cors_origin: env_var("CORS_ORIGIN").unwrap_or_else(|| "*".to_string()),
        })
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

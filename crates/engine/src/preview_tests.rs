// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::fake::FakeEdgeKvClient;
use super::*;
use edw_core::{ChatId, UserId};

#[test]
fn sanitize_replaces_disallowed_characters_with_underscore() {
    assert_eq!(sanitize("hello world/../etc"), "hello_world_.._etc");
    assert_eq!(sanitize("user-123_abc.def"), "user-123_abc.def");
}

#[test]
fn derive_subdomain_is_deterministic_for_the_same_pair() {
    let user = UserId::new("u1");
    let chat = ChatId::new("c1");
    let a = derive_subdomain(&user, &chat);
    let b = derive_subdomain(&user, &chat);
    assert_eq!(a, b);
}

#[test]
fn derive_subdomain_differs_across_chats_for_the_same_user() {
    let user = UserId::new("u1");
    let a = derive_subdomain(&user, &ChatId::new("c1"));
    let b = derive_subdomain(&user, &ChatId::new("c2"));
    assert_ne!(a, b);
}

#[test]
fn derive_subdomain_has_the_adjective_noun_suffix_shape() {
    let subdomain = derive_subdomain(&UserId::new("u1"), &ChatId::new("c1"));
    let parts: Vec<&str> = subdomain.split('-').collect();
    assert_eq!(parts.len(), 3, "expected adjective-noun-suffix, got {subdomain}");
    assert!(ADJECTIVES.contains(&parts[0]));
    assert!(NOUNS.contains(&parts[1]));
    assert_eq!(parts[2].len(), 5);
    assert!(parts[2].chars().all(|c| c.is_ascii_alphanumeric() && c.is_lowercase() || c.is_ascii_digit()));
}

#[tokio::test]
async fn route_preview_in_path_mode_builds_the_sanitized_url_without_touching_edge_kv() {
    let config = PreviewConfig {
        mode: DeploymentMode::Path,
        root_domain: "preview.example.com".to_string(),
        cloudfront_base: "https://cdn.example.com".to_string(),
    };
    let edge_kv = FakeEdgeKvClient::new();
    let url = route_preview(&edge_kv, &config, &UserId::new("u 1"), &ChatId::new("c/1")).await.unwrap();
    assert_eq!(url, "https://cdn.example.com/u_1/c_1/");
    assert!(edge_kv.mappings.lock().is_empty());
}

#[tokio::test]
async fn route_preview_in_subdomain_mode_upserts_the_mapping_and_returns_the_subdomain_url() {
    let config = PreviewConfig {
        mode: DeploymentMode::Subdomain,
        root_domain: "preview.example.com".to_string(),
        cloudfront_base: "https://cdn.example.com".to_string(),
    };
    let edge_kv = FakeEdgeKvClient::new();
    let user = UserId::new("u1");
    let chat = ChatId::new("c1");
    let url = route_preview(&edge_kv, &config, &user, &chat).await.unwrap();
    let subdomain = derive_subdomain(&user, &chat);
    assert_eq!(url, format!("https://{subdomain}.preview.example.com"));
    let mappings = edge_kv.mappings.lock();
    assert_eq!(mappings.as_slice(), [(subdomain, "u1/c1".to_string())]);
}

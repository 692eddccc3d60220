// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn http_status_mapping_matches_spec_table() {
    assert_eq!(Error::InvalidArgument("x".into()).http_status(), 400);
    assert_eq!(Error::Unauthorized.http_status(), 401);
    assert_eq!(Error::Forbidden.http_status(), 403);
    assert_eq!(Error::NotFound("x".into()).http_status(), 404);
    assert_eq!(Error::Conflict("x".into()).http_status(), 409);
    assert_eq!(Error::RateLimited.http_status(), 429);
    assert_eq!(Error::Internal("x".into()).http_status(), 500);
    assert_eq!(Error::StorageUnavailable("x".into()).http_status(), 503);
}

#[test]
fn only_storage_and_registry_are_retryable() {
    assert!(Error::StorageUnavailable("x".into()).is_retryable());
    assert!(Error::RegistryUnavailable("x".into()).is_retryable());
    assert!(!Error::BuildFailed("x".into()).is_retryable());
    assert!(!Error::Internal("x".into()).is_retryable());
}

#[test]
fn error_response_carries_message_and_timestamp() {
    let err = Error::NotFound("sandbox sbx-1".into());
    let resp = ErrorResponse::from_error(&err, SystemTime::now());
    assert!(resp.message.contains("sandbox sbx-1"));
    assert!(!resp.timestamp.is_empty());
}

#[test]
fn retryable_transport_markers_detected() {
    for msg in ["HTTP 503 Service Unavailable", "connect ECONNREFUSED", "request timed out", "rate limit: slowdown"] {
        assert!(is_retryable_transport_error(msg), "{msg} should be retryable");
    }
    assert!(!is_retryable_transport_error("permission denied"));
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Preview storage upload + CDN invalidation (spec §4.12 step 6): one
//! trait, an S3-backed implementation, and a fake for tests — the same
//! trait-plus-fake split `driver.rs` uses for the container runtime.

use async_trait::async_trait;
use edw_core::Error;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Uploads `bytes` to `key` under the configured bucket.
    async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), Error>;

    /// Fetches `key`, or `None` if it doesn't exist. Used by restore-on-
    /// provision (spec §4.7) to fetch a chat's snapshot or backup tar.
    async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;

    /// Invalidates every cached object whose key starts with `prefix`.
    async fn invalidate_prefix(&self, prefix: &str) -> Result<(), Error>;
}

/// S3 object storage plus an HTTP call to the CDN's invalidation API.
/// `cdn_invalidation_url` and `cdn_api_token` come from daemon config
/// (spec §6); no CDN Rust SDK exists in this corpus, so invalidation is a
/// plain authenticated POST, the same shape `edw-engine`'s preview routing
/// uses for its edge-KV upsert.
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    http: reqwest::Client,
    cdn_invalidation_url: String,
    cdn_api_token: String,
}

impl S3ObjectStore {
    pub fn new(
        client: aws_sdk_s3::Client,
        bucket: impl Into<String>,
        cdn_invalidation_url: impl Into<String>,
        cdn_api_token: impl Into<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            http: reqwest::Client::new(),
            cdn_invalidation_url: cdn_invalidation_url.into(),
            cdn_api_token: cdn_api_token.into(),
        }
    }

    pub async fn connect(bucket: impl Into<String>, cdn_invalidation_url: impl Into<String>, cdn_api_token: impl Into<String>) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(aws_sdk_s3::Client::new(&config), bucket, cdn_invalidation_url, cdn_api_token)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), Error> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(bytes.into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| Error::StorageUnavailable(format!("s3 put_object failed: {e}")))?;
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        use aws_sdk_s3::error::SdkError;

        match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(output) => {
                let bytes = output.body.collect().await.map_err(|e| Error::StorageUnavailable(format!("s3 get_object body read failed: {e}")))?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(SdkError::ServiceError(e)) if e.err().is_no_such_key() => Ok(None),
            Err(e) => Err(Error::StorageUnavailable(format!("s3 get_object failed: {e}"))),
        }
    }

    async fn invalidate_prefix(&self, prefix: &str) -> Result<(), Error> {
        let response = self
            .http
            .post(&self.cdn_invalidation_url)
            .bearer_auth(&self.cdn_api_token)
            .json(&serde_json::json!({ "prefix": prefix }))
            .send()
            .await
            .map_err(|e| Error::StorageUnavailable(format!("cdn invalidation request failed: {e}")))?;
        if !response.status().is_success() {
            return Err(Error::StorageUnavailable(format!("cdn invalidation returned {}", response.status())));
        }
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub struct FakeObjectStore {
        pub objects: Mutex<Vec<(String, Vec<u8>, String)>>,
        pub invalidated_prefixes: Mutex<Vec<String>>,
    }

    impl FakeObjectStore {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ObjectStore for FakeObjectStore {
        async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), Error> {
            self.objects.lock().push((key.to_string(), bytes, content_type.to_string()));
            Ok(())
        }

        async fn get_object(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
            Ok(self.objects.lock().iter().find(|(k, _, _)| k == key).map(|(_, bytes, _)| bytes.clone()))
        }

        async fn invalidate_prefix(&self, prefix: &str) -> Result<(), Error> {
            self.invalidated_prefixes.lock().push(prefix.to_string());
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "object_store_tests.rs"]
mod tests;

//! Publishing packages and manifests to object storage.
//!
//! The manifest builder only depends on the narrow [`Publisher`] trait;
//! [`S3Publisher`] is the production implementation. Alternate backends
//! (or test stubs) substitute without touching the builder.

use crate::config::PublishConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3 as s3;
use std::path::Path;
use std::time::Duration;

/// Presign lifetime for URL generation. The query string is stripped from
/// the result, so this only needs to be a valid duration.
const PRESIGN_EXPIRY: Duration = Duration::from_secs(3600);

/// Capability to upload a local file to publicly readable storage and
/// return a durable retrieval URL.
///
/// Implementations must make the object publicly readable and fail loudly
/// on any upload or URL-generation error; callers never retry.
#[async_trait]
pub trait Publisher {
    /// Upload `local` to `bucket` under `key` with the given content type,
    /// returning a retrieval URL.
    async fn publish(
        &self,
        local: &Path,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<String>;
}

/// Drop any query parameters from a URL, leaving the durable object path.
///
/// Signed URLs carry expiring query parameters; manifests must only ever
/// record the stable part.
pub fn strip_query(url: &str) -> &str {
    match url.split_once('?') {
        Some((base, _)) => base,
        None => url,
    }
}

/// [`Publisher`] backed by an S3 bucket.
#[derive(Debug)]
pub struct S3Publisher {
    client: s3::Client,
}

impl S3Publisher {
    /// Create a client from resolved publishing settings.
    pub async fn new(config: &PublishConfig) -> Self {
        let credentials = s3::config::Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "stagehand",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        Self {
            client: s3::Client::new(&sdk_config),
        }
    }
}

#[async_trait]
impl Publisher for S3Publisher {
    async fn publish(
        &self,
        local: &Path,
        bucket: &str,
        key: &str,
        content_type: &str,
    ) -> Result<String> {
        let body = s3::primitives::ByteStream::from_path(local)
            .await
            .with_context(|| format!("Failed to open {} for upload", local.display()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .acl(s3::types::ObjectCannedAcl::PublicRead)
            .content_type(content_type)
            .send()
            .await
            .with_context(|| format!("Failed to upload {key} to {bucket}"))?;

        // Presign a GET and keep only the stable part of the URL.
        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(
                s3::presigning::PresigningConfig::expires_in(PRESIGN_EXPIRY)
                    .context("Invalid presigning configuration")?,
            )
            .await
            .with_context(|| format!("Failed to generate retrieval URL for {key}"))?;

        tracing::info!("Uploaded {key} to {bucket}");
        Ok(strip_query(presigned.uri()).to_string())
    }
}

//! S3 backend: v1 `ListObjects` pagination and `GetObject` fetch.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::trace;

use super::{ObjectPage, ObjectRef, Store};

/// Credentials and region come from the ambient AWS environment
/// (env vars, profile, IAM role) unless overridden here.
#[derive(Debug, Deserialize, Clone)]
pub struct S3SourceConfig {
    /// `"bucket/prefix"` path naming the folder to import.
    pub path: String,
    /// Region override.
    #[serde(default)]
    pub region: Option<String>,
    /// Endpoint override for S3-compatible stores (MinIO, LocalStack).
    /// Switches the client to path-style addressing.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

#[derive(Debug)]
pub(crate) struct S3Store {
    client: aws_sdk_s3::Client,
}

impl S3Store {
    pub(crate) async fn new(config: &S3SourceConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(ref region) = config.region {
            loader = loader.region(aws_sdk_s3::config::Region::new(region.clone()));
        }
        if let Some(ref endpoint) = config.endpoint_url {
            loader = loader.endpoint_url(endpoint.as_str());
        }
        let shared_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if config.endpoint_url.is_some() {
            // Virtual-hosted addressing breaks against single-host stores.
            builder = builder.force_path_style(true);
        }

        Ok(Self {
            client: aws_sdk_s3::Client::from_conf(builder.build()),
        })
    }
}

#[async_trait]
impl Store for S3Store {
    async fn list(&self, bucket: &str, prefix: &str, marker: Option<&str>) -> Result<ObjectPage> {
        let response = self
            .client
            .list_objects()
            .bucket(bucket)
            .prefix(prefix)
            .set_marker(marker.map(str::to_string))
            .send()
            .await
            .context(format!("ListObjects failed for s3://{bucket}/{prefix}"))?;

        let keys: Vec<String> = response
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();
        let truncated = response.is_truncated().unwrap_or(false);
        trace!(
            "listed {} keys under s3://{bucket}/{prefix} (truncated: {truncated})",
            keys.len()
        );

        Ok(ObjectPage { keys, truncated })
    }

    async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .context(format!("GetObject failed for s3://{object}"))?;

        // A zero-length object collects into an empty buffer here, which is
        // a valid (if useless) record file, not an error.
        let body = response
            .body
            .collect()
            .await
            .context(format!("reading the body of s3://{object} failed"))?;

        Ok(body.into_bytes().to_vec())
    }
}

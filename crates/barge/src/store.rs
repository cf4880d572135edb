//! Object store capability: paginated listing and object fetch.

use std::fmt;

use anyhow::{Result, bail};
use async_trait::async_trait;

use crate::app_config::SourceConfig;

#[cfg(test)]
pub(crate) mod in_mem;
pub mod s3;

/// Bucket plus key prefix, parsed from a `"bucket/prefix"` path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub bucket: String,
    pub prefix: String,
}

impl SourceLocation {
    /// Splits on the first `/`; everything after it is the key prefix,
    /// which may be empty.
    pub fn parse(path: &str) -> Result<Self> {
        let (bucket, prefix) = match path.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix),
            None => (path, ""),
        };
        if bucket.is_empty() {
            bail!("source path '{path}' has no bucket name");
        }
        Ok(Self {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        })
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.bucket)
        } else {
            write!(f, "{}/{}", self.bucket, self.prefix)
        }
    }
}

/// One listed object. Displays as `"bucket/key"` in logs and errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ObjectRef {
    pub(crate) bucket: String,
    pub(crate) key: String,
}

impl ObjectRef {
    pub(crate) fn new(bucket: &str, key: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            key: key.to_string(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default)]
pub(crate) struct ObjectPage {
    pub(crate) keys: Vec<String>,
    pub(crate) truncated: bool,
}

/// Listing and fetch over an object store.
///
/// # Contract
/// - `list` returns one page of keys in listing order; `truncated` means
///   more pages may follow after the last returned key.
/// - An empty page ends pagination regardless of `truncated`.
/// - `fetch` returns the raw body; an empty object is an empty buffer, not
///   an error.
#[async_trait]
pub(crate) trait Store: std::fmt::Debug {
    async fn list(&self, bucket: &str, prefix: &str, marker: Option<&str>) -> Result<ObjectPage>;
    async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>>;
}

/// Concrete store implementations, dispatched without dynamic trait objects.
#[derive(Debug)]
pub(crate) enum StoreBackend {
    S3(s3::S3Store),
    #[cfg(test)]
    InMemory(in_mem::InMemoryStore),
}

impl StoreBackend {
    pub(crate) async fn from_config(config: &SourceConfig) -> Result<Self> {
        match config {
            SourceConfig::S3(s3_config) => Ok(StoreBackend::S3(s3::S3Store::new(s3_config).await?)),
        }
    }
}

#[async_trait]
impl Store for StoreBackend {
    async fn list(&self, bucket: &str, prefix: &str, marker: Option<&str>) -> Result<ObjectPage> {
        match self {
            StoreBackend::S3(store) => store.list(bucket, prefix, marker).await,
            #[cfg(test)]
            StoreBackend::InMemory(store) => store.list(bucket, prefix, marker).await,
        }
    }

    async fn fetch(&self, object: &ObjectRef) -> Result<Vec<u8>> {
        match self {
            StoreBackend::S3(store) => store.fetch(object).await,
            #[cfg(test)]
            StoreBackend::InMemory(store) => store.fetch(object).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_location_splits_on_the_first_slash() {
        let location = SourceLocation::parse("logs/2015/03/07").unwrap();
        assert_eq!(location.bucket, "logs");
        assert_eq!(location.prefix, "2015/03/07");
        assert_eq!(location.to_string(), "logs/2015/03/07");
    }

    #[test]
    fn bare_bucket_has_an_empty_prefix() {
        let location = SourceLocation::parse("logs").unwrap();
        assert_eq!(location.bucket, "logs");
        assert_eq!(location.prefix, "");
        assert_eq!(location.to_string(), "logs");
    }

    #[test]
    fn empty_bucket_is_rejected() {
        assert!(SourceLocation::parse("").is_err());
        assert!(SourceLocation::parse("/key").is_err());
    }

    #[test]
    fn object_ref_displays_as_a_path() {
        assert_eq!(
            ObjectRef::new("logs", "2015/03/07.json").to_string(),
            "logs/2015/03/07.json"
        );
    }
}

//! barge: hauls JSON record files from an object store into a search
//! engine's bulk endpoint.
//!
//! One call to [`run`] walks the configured folder's paginated listing,
//! imports every file with bounded concurrency, and returns the additive
//! [`ImportSummary`] for the whole job. Per-file trouble becomes failure
//! counters; only a listing failure aborts.

pub mod app_config;
mod bulk;
pub mod error;
mod importer;
mod progress;
pub mod store;
pub mod summary;
pub mod transform;

pub use error::ImportError;
pub use summary::ImportSummary;

use anyhow::{Context, Result};
use tracing::info;

use crate::app_config::{AppConfig, SourceConfig};
use crate::bulk::BulkClient;
use crate::importer::Importer;
use crate::store::{SourceLocation, StoreBackend};

/// Runs one import job to completion and returns its summary.
pub async fn run(config: AppConfig) -> Result<ImportSummary> {
    let SourceConfig::S3(ref source) = config.source;
    let location =
        SourceLocation::parse(&source.path).context("invalid source path in configuration")?;

    let store = StoreBackend::from_config(&config.source)
        .await
        .context("failed to initialize the object store client")?;
    let bulk =
        BulkClient::new(&config.destination).context("failed to initialize the bulk client")?;

    let importer = Importer::new(store, bulk, config.runtime);
    let summary = importer.import_folder(&location).await?;
    info!("finished importing {location}: {summary:?}");
    Ok(summary)
}

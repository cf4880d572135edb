//! The import pipeline: pagination driver, windowed scheduler, and the
//! per-file fetch/decode/submit chain.

use std::borrow::Cow;
use std::io::Read;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use futures::future::join_all;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::app_config::RuntimeConfig;
use crate::bulk::BulkClient;
use crate::error::ImportError;
use crate::progress::ProgressMetrics;
use crate::store::{ObjectRef, SourceLocation, Store, StoreBackend};
use crate::summary::ImportSummary;
use crate::transform;

/// Pagination cursor. Owned by the driver, advanced once per page.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    After(String),
    Done,
}

pub(crate) struct Importer {
    store: StoreBackend,
    bulk: BulkClient,
    runtime: RuntimeConfig,
}

impl Importer {
    pub(crate) fn new(store: StoreBackend, bulk: BulkClient, runtime: RuntimeConfig) -> Self {
        Self {
            store,
            bulk,
            runtime,
        }
    }

    /// Walks the paginated listing and imports every page.
    ///
    /// Only a listing failure ends the job; per-file trouble is absorbed
    /// into the counters by `import_files`. Each page filters out the key
    /// equal to the current marker, so stores that repeat the boundary key
    /// never cause a double import. An empty-but-truncated page terminates
    /// rather than spinning on a cursor that cannot advance.
    pub(crate) async fn import_folder(
        &self,
        location: &SourceLocation,
    ) -> Result<ImportSummary, ImportError> {
        info!("importing folder {location}");
        let mut progress = ProgressMetrics::new(location.to_string());
        let mut cursor = Cursor::Start;
        let mut total = ImportSummary::default();

        loop {
            let marker = match &cursor {
                Cursor::Start => None,
                Cursor::After(key) => Some(key.as_str()),
                Cursor::Done => break,
            };

            let page = self
                .store
                .list(&location.bucket, &location.prefix, marker)
                .await
                .map_err(|source| ImportError::Listing {
                    bucket: location.bucket.clone(),
                    source,
                })?;

            let files: Vec<ObjectRef> = page
                .keys
                .iter()
                .filter(|key| marker != Some(key.as_str()))
                .map(|key| ObjectRef::new(&location.bucket, key))
                .collect();

            let mut page_summary = self.import_files(&files).await;
            page_summary.pages += 1;
            progress.update(page_summary.files, page_summary.records);
            total.merge(page_summary);

            cursor = if page.truncated {
                match page.keys.last() {
                    // The marker advances to the last *listed* key, filtered
                    // or not, matching what the store will resume from.
                    Some(last) => Cursor::After(last.clone()),
                    None => Cursor::Done,
                }
            } else {
                Cursor::Done
            };
        }

        progress.finish();
        Ok(total)
    }

    /// Imports a page's files in windows of at most `concurrency` items.
    ///
    /// Windows run strictly one after another; within a window all files
    /// are in flight at once. Never fails: a file that errors is logged and
    /// folded in as one failure unit, so the returned summary accounts for
    /// every input file exactly once.
    pub(crate) async fn import_files(&self, files: &[ObjectRef]) -> ImportSummary {
        let mut summary = ImportSummary::default();
        let window_size = self.runtime.concurrency.max(1);

        for window in files.chunks(window_size) {
            debug!("processing {} files", window.len());
            let results = join_all(window.iter().map(|object| self.import_file(object))).await;
            for (object, result) in window.iter().zip(results) {
                match result {
                    Ok(file_summary) => summary.merge(file_summary),
                    Err(err) => {
                        let err = anyhow::Error::new(err);
                        if self.runtime.debug {
                            warn!("import of '{object}' failed: {err:#}");
                        } else {
                            debug!("import of '{object}' failed: {err:#}");
                        }
                        summary.merge(ImportSummary::failed_file());
                    }
                }
            }
        }

        summary.files += files.len() as u64;
        summary
    }

    /// Fetch, decode, and submit one file.
    async fn import_file(&self, object: &ObjectRef) -> Result<ImportSummary, ImportError> {
        debug!("importing file {object}");

        let bytes = self
            .store
            .fetch(object)
            .await
            .map_err(|source| ImportError::Fetch {
                file: object.to_string(),
                source,
            })?;

        let records = decode_records(&object.key, &bytes).map_err(|err| ImportError::Decode {
            file: object.to_string(),
            reason: format!("{err:#}"),
        })?;
        if records.is_empty() {
            return Ok(ImportSummary::default());
        }

        let payload = transform::build_bulk_payload(records, self.bulk.index(), self.bulk.doc_type())
            .map_err(|err| ImportError::Decode {
                file: object.to_string(),
                reason: format!("{err:#}"),
            })?;

        self.bulk.submit(payload).await
    }
}

/// Decodes a file body into its records, gunzipping `.gz` keys first.
fn decode_records(key: &str, bytes: &[u8]) -> Result<Vec<Map<String, Value>>> {
    let body: Cow<'_, [u8]> = if key.ends_with(".gz") {
        let mut decoded = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut decoded)
            .context("gzip decode failed")?;
        Cow::Owned(decoded)
    } else {
        Cow::Borrowed(bytes)
    };
    serde_json::from_slice(&body).context("expected a JSON array of record objects")
}

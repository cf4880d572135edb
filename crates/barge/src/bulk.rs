//! Bulk submission: URL handling, the POST itself, and per-item tallying.

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use reqwest::Url;
use serde::Deserialize;
use tracing::trace;

use crate::app_config::DestinationConfig;
use crate::error::ImportError;
use crate::summary::ImportSummary;

#[derive(Debug, Deserialize)]
struct BulkResponse {
    items: Vec<BulkItem>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(default)]
    create: Option<BulkItemStatus>,
}

#[derive(Debug, Deserialize)]
struct BulkItemStatus {
    status: u16,
}

/// Client for one bulk destination.
///
/// The configured URL's path names the target index; submissions always go
/// to `/_bulk` on the same scheme/host/port (query preserved).
#[derive(Debug)]
pub(crate) struct BulkClient {
    client: reqwest::Client,
    bulk_url: Url,
    index: String,
    doc_type: String,
}

impl BulkClient {
    pub(crate) fn new(config: &DestinationConfig) -> Result<Self> {
        let destination = Url::parse(&config.url)
            .context(format!("invalid destination url '{}'", config.url))?;

        let index = destination.path().trim_matches('/').to_string();
        if index.is_empty() {
            bail!(
                "destination url '{}' names no index; the url path is the target index",
                config.url
            );
        }

        let mut bulk_url = destination;
        bulk_url.set_path("/_bulk");

        // 10 s to connect, 30 s for the whole request; bulk bodies are big.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to build the http client")?;

        Ok(Self {
            client,
            bulk_url,
            index,
            doc_type: config.doc_type.clone(),
        })
    }

    pub(crate) fn index(&self) -> &str {
        &self.index
    }

    pub(crate) fn doc_type(&self) -> &str {
        &self.doc_type
    }

    #[cfg(test)]
    pub(crate) fn bulk_url(&self) -> &Url {
        &self.bulk_url
    }

    /// POSTs one rendered payload and tallies the itemized response.
    ///
    /// Transport-level trouble (send failure, non-2xx, or a 2xx whose body
    /// is not the expected items document) fails the whole call; per-item
    /// statuses inside a good response only move counters.
    pub(crate) async fn submit(&self, payload: String) -> Result<ImportSummary, ImportError> {
        let transport = |source: anyhow::Error| ImportError::Transport {
            url: self.bulk_url.to_string(),
            source,
        };

        let response = self
            .client
            .post(self.bulk_url.clone())
            .header("Content-Type", "application/x-ndjson")
            .body(payload)
            .send()
            .await
            .map_err(|err| transport(anyhow::Error::new(err).context("sending the bulk request failed")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| transport(anyhow::Error::new(err).context("reading the bulk response failed")))?;

        if !status.is_success() {
            return Err(transport(anyhow!("bulk endpoint returned {status}: {body}")));
        }

        let parsed: BulkResponse = serde_json::from_str(&body).map_err(|err| {
            transport(anyhow::Error::new(err).context("bulk response was not an items document"))
        })?;

        let mut summary = ImportSummary::default();
        for item in parsed.items {
            summary.records += 1;
            match item.create {
                Some(BulkItemStatus { status: 201 }) => summary.success += 1,
                _ => summary.failure += 1,
            }
        }
        trace!(
            "bulk response: {} created, {} rejected of {} items",
            summary.success, summary.failure, summary.records
        );
        Ok(summary)
    }
}

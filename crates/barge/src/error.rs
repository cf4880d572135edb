//! Import failures, tagged with where in the pipeline they happened.

use thiserror::Error;

/// A contextualized pipeline failure.
///
/// Only `Listing` is fatal to a job: without a listing the cursor cannot
/// advance. The other variants are absorbed by the scheduler as one
/// `failure` unit for the file they belong to.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("listing objects in bucket '{bucket}' failed")]
    Listing {
        bucket: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("fetching object '{file}' failed")]
    Fetch {
        file: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("decoding '{file}' failed: {reason}")]
    Decode { file: String, reason: String },

    #[error("bulk submission to '{url}' failed")]
    Transport {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}

//! Application configuration: env vars merged with an optional TOML file.

use std::path::Path;

use anyhow::Context;
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use tracing::info;

use crate::store::s3::S3SourceConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Where the records come from, keyed by backend.
#[derive(Debug, Deserialize, Clone)]
pub enum SourceConfig {
    S3(S3SourceConfig),
}

#[derive(Debug, Deserialize, Clone)]
pub struct DestinationConfig {
    /// Bulk destination; the URL path names the target index.
    pub url: String,
    /// `_type` label stamped on every action line.
    #[serde(default = "default_doc_type")]
    pub doc_type: String,
}

fn default_doc_type() -> String {
    "fluentd".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Upper bound on files imported concurrently within one window.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Log absorbed per-file errors at warn instead of debug.
    #[serde(default)]
    pub debug: bool,
}

fn default_concurrency() -> usize {
    10
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            debug: false,
        }
    }
}

/// Loads configuration from BARGE_* env vars, with an optional TOML file
/// layered on top. TOML wins on conflicts.
pub fn load_config(config_file_name: Option<&Path>) -> anyhow::Result<AppConfig> {
    info!(
        "loading configuration: {}",
        config_file_name.unwrap_or(Path::new("<env only>")).display()
    );

    let config = Figment::new().merge(Env::prefixed("BARGE_"));
    let config = match config_file_name {
        Some(file_name) => config.merge(Toml::file(file_name)),
        None => config,
    };

    let context_msg = match config_file_name {
        Some(path) => format!(
            "failed to parse configuration from file '{}' and environment variables (BARGE_*)",
            path.display()
        ),
        None => "failed to parse configuration from environment variables (BARGE_*); \
                 no config file was provided"
            .to_string(),
    };

    config.extract().context(context_msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_test_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("failed to create a temp config file");
        file.write_all(contents.as_bytes())
            .expect("failed to write the test config");
        file
    }

    #[test]
    fn a_full_config_parses() {
        let config_file = write_test_config(
            r#"
            [source.S3]
            path = "logs/2015"
            region = "eu-west-1"

            [destination]
            url = "http://es.example.com/my-index"
            doc_type = "syslog"

            [runtime]
            concurrency = 4
            debug = true
            "#,
        );

        let app_config = load_config(Some(config_file.path())).expect("config should parse");

        let SourceConfig::S3(ref source) = app_config.source;
        assert_eq!(source.path, "logs/2015");
        assert_eq!(source.region.as_deref(), Some("eu-west-1"));
        assert_eq!(source.endpoint_url, None);
        assert_eq!(app_config.destination.url, "http://es.example.com/my-index");
        assert_eq!(app_config.destination.doc_type, "syslog");
        assert_eq!(app_config.runtime.concurrency, 4);
        assert!(app_config.runtime.debug);
    }

    #[test]
    fn omitted_knobs_fall_back_to_defaults() {
        let config_file = write_test_config(
            r#"
            [source.S3]
            path = "logs"

            [destination]
            url = "http://es.example.com/my-index"
            "#,
        );

        let app_config: AppConfig = Figment::new()
            .merge(Toml::file(config_file.path()))
            .extract()
            .expect("defaults should fill the gaps");

        assert_eq!(app_config.runtime.concurrency, 10);
        assert!(!app_config.runtime.debug);
        assert_eq!(app_config.destination.doc_type, "fluentd");
    }

    #[test]
    fn a_config_without_a_destination_is_rejected() {
        let config_file = write_test_config(
            r#"
            [source.S3]
            path = "logs"
            "#,
        );

        let result: Result<AppConfig, _> =
            Figment::new().merge(Toml::file(config_file.path())).extract();
        assert!(result.is_err());
    }
}

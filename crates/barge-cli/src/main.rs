//! barge-cli: loads config, sets up logging, runs the import, reports.

use anyhow::{Context, Result};
use comfy_table::{Cell, CellAlignment, Table, presets::NOTHING};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().collect();
    let path_arg = args.get(1).map(String::as_str).unwrap_or("barge.toml");

    // Only hand figment a file that actually exists; otherwise env vars
    // alone have to carry the configuration.
    let config_file = std::path::Path::new(path_arg);
    let config_file = match config_file.try_exists().context(format!(
        "could not check for configuration file '{}'",
        config_file.display()
    ))? {
        true => Some(config_file),
        false => None,
    };

    let app_config =
        barge::app_config::load_config(config_file).context("failed to load configuration")?;

    match barge::run(app_config).await {
        Ok(summary) => {
            println!("{}", summary_table(&summary));
            Ok(())
        }
        Err(err) => {
            error!("error: {}", err);
            let mut connection_trouble = false;
            for cause in err.chain().skip(1) {
                error!("cause: {}", cause);
                let cause_str = cause.to_string();
                if cause_str.contains("error sending request")
                    || cause_str.contains("connection refused")
                    || cause_str.contains("Connection refused")
                    || cause_str.contains("tcp connect error")
                    || cause_str.contains("dns error")
                {
                    connection_trouble = true;
                }
            }
            if connection_trouble {
                error!(
                    "hint: a backing service looks unreachable. Check that the object store \
                     and the bulk endpoint are both up before retrying."
                );
            }
            std::process::exit(1);
        }
    }
}

fn summary_table(summary: &barge::ImportSummary) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    for (name, value) in [
        ("success", summary.success),
        ("failure", summary.failure),
        ("records", summary.records),
        ("files", summary.files),
        ("pages", summary.pages),
    ] {
        table.add_row(vec![
            Cell::new(name),
            Cell::new(value).set_alignment(CellAlignment::Right),
        ]);
    }
    table
}

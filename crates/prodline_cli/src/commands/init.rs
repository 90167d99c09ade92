//! Init command - Write a line configuration into the store.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use prodline_core::{ConfigStore, LineConfiguration, LineError, ProductionLine};

use super::{print_json, LineArgs};

#[derive(Args)]
pub struct InitArgs {
    /// YAML line configuration to import (defaults to the reference line)
    #[arg(short, long)]
    from: Option<PathBuf>,

    /// Overwrite an existing configuration
    #[arg(short, long)]
    force: bool,
}

pub async fn execute(args: InitArgs, line: &LineArgs) -> Result<()> {
    let settings = line.settings()?;
    let store = line.open_store(&settings)?;

    if store.load_configuration(&settings.config_id).await?.is_some() && !args.force {
        return Err(LineError::ConfigurationExists(settings.config_id.clone())).with_context(|| {
            format!(
                "Line already configured in {:?}. Use --force to overwrite.",
                settings.data_dir
            )
        });
    }

    let configuration = match &args.from {
        Some(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {:?}", path))?;
            LineConfiguration::from_yaml(&content)
                .with_context(|| format!("Invalid line configuration in {:?}", path))?
        }
        None => LineConfiguration::test_line(),
    };

    // Refuse to store a line that could not be loaded back.
    let production_line = ProductionLine::from_configuration(&configuration)
        .context("Line configuration rejected")?;

    store
        .write_configuration(&settings.config_id, &configuration)
        .await?;
    info!(
        "Configured line '{}' with {} stations in {:?}",
        settings.config_id,
        production_line.registry().len(),
        settings.data_dir
    );

    print_json(&serde_json::json!({
        "configId": settings.config_id,
        "dataDir": settings.data_dir,
        "path": production_line.path(),
    }))
}

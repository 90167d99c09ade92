//! CLI command definitions.
//!
//! This module defines the command structure for the prodline CLI.
//! Each subcommand maps to one line operation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use prodline_core::{LineService, LineSettings};
use prodline_store::FileStore;

pub mod init;
pub mod items;
pub mod stations;
pub mod transition;

/// prodline - production line transition engine
#[derive(Parser)]
#[command(name = "prodline")]
#[command(version, about = "prodline - production line transition engine")]
#[command(long_about = r#"
prodline tracks items moving through the stations of a production line and
decides which state changes and station advances are legal.

COMMANDS:
  init      → Write the reference line configuration
  stations  → Show the configured stations and their order
  start     → Put a new item on the line
  arrive    → Record an outcome at the item's current station
  depart    → Move the item past its current station
  get/list  → Read items
  delete    → Remove an item and its clock entries (refused in live mode)
  clock     → Show an item's dwell clock entries

EXIT CODES:
  0 - Success
  1 - Internal error
  2 - Bad request
  3 - Not found
  4 - Conflict
  5 - Forbidden (live mode)
  6 - Line unavailable
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(flatten)]
    pub line: LineArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where the line lives and how it runs.
#[derive(Args, Debug, Clone)]
pub struct LineArgs {
    /// Settings file
    #[arg(long, global = true, default_value = "prodline.toml")]
    pub settings: PathBuf,

    /// Data directory of the file store (overrides settings)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Line configuration to load (overrides settings)
    #[arg(long, global = true)]
    pub config_id: Option<String>,

    /// Run in live mode (overrides settings)
    #[arg(long, global = true)]
    pub live: bool,
}

impl LineArgs {
    /// Settings from file and environment, with flags applied last.
    pub fn settings(&self) -> Result<LineSettings> {
        self.settings_with(|key| std::env::var(key).ok())
    }

    /// Like [`LineArgs::settings`], with environment lookups through `lookup`.
    pub fn settings_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<LineSettings> {
        let mut settings = LineSettings::load_with(&self.settings, lookup)
            .with_context(|| format!("Failed to read settings from {:?}", self.settings))?;

        if let Some(data_dir) = &self.data_dir {
            settings = settings.data_dir(data_dir);
        }
        if let Some(config_id) = &self.config_id {
            settings = settings.config_id(config_id);
        }
        if self.live {
            settings = settings.live(true);
        }

        debug!("Effective settings: {:?}", settings);
        Ok(settings)
    }

    pub fn open_store(&self, settings: &LineSettings) -> Result<FileStore> {
        FileStore::open(&settings.data_dir)
            .with_context(|| format!("Failed to open store at {:?}", settings.data_dir))
    }

    /// Open the store and load the configured line.
    pub async fn service(&self) -> Result<LineService> {
        let settings = self.settings()?;
        let store = self.open_store(&settings)?;
        let service = LineService::load(Arc::new(store), &settings)
            .await
            .with_context(|| format!("Failed to load line '{}'", settings.config_id))?;
        Ok(service)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write the reference line configuration
    Init(init::InitArgs),

    /// Show the configured stations and their order
    Stations,

    /// Put a new item on the line at the START station
    Start(items::ItemArgs),

    /// Record an outcome at the item's current station
    Arrive(transition::TransitionArgs),

    /// Move the item past its current station
    Depart(transition::TransitionArgs),

    /// Show one item
    Get(items::ItemArgs),

    /// Show every item on the line
    List,

    /// Remove an item and its clock entries
    Delete(items::ItemArgs),

    /// Show an item's dwell clock entries
    Clock(items::ItemArgs),
}

/// Print a result as pretty JSON on stdout.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

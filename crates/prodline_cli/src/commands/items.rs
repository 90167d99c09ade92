//! Item commands - start, get, list, delete and clock.

use anyhow::{Context, Result};
use clap::Args;

use prodline_core::Transition;

use super::{print_json, LineArgs};

#[derive(Args)]
pub struct ItemArgs {
    /// Item id
    pub id: String,
}

pub async fn start(args: ItemArgs, line: &LineArgs) -> Result<()> {
    let service = line.service().await?;
    let item = service
        .start_production(&Transition::new(&args.id))
        .await
        .with_context(|| format!("Failed to start {}", args.id))?;
    print_json(&item)
}

pub async fn get(args: ItemArgs, line: &LineArgs) -> Result<()> {
    let service = line.service().await?;
    print_json(&service.get_item(&args.id).await?)
}

pub async fn list(line: &LineArgs) -> Result<()> {
    let service = line.service().await?;
    print_json(&service.get_all_items().await?)
}

pub async fn delete(args: ItemArgs, line: &LineArgs) -> Result<()> {
    let service = line.service().await?;
    let item = service
        .delete_item(&args.id)
        .await
        .with_context(|| format!("Failed to delete {}", args.id))?;
    print_json(&item)
}

pub async fn clock(args: ItemArgs, line: &LineArgs) -> Result<()> {
    let service = line.service().await?;
    print_json(&service.clock_entries(&args.id).await?)
}

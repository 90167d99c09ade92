//! Arrive and depart commands.

use anyhow::{Context, Result};
use clap::Args;

use prodline_core::{State, Transition};

use super::{print_json, LineArgs};

#[derive(Args)]
pub struct TransitionArgs {
    /// Item id
    pub id: String,

    /// Outcome to record (PASSED, FAILED, RETRIED, SCRAPED)
    #[arg(short, long, value_parser = parse_state)]
    pub state: State,

    /// Station the item is at (defaults to its current station)
    #[arg(long)]
    pub station: Option<String>,
}

impl TransitionArgs {
    fn transition(&self) -> Transition {
        let transition = Transition::new(&self.id).with_state(self.state);
        match &self.station {
            Some(station) => transition.at_station(station),
            None => transition,
        }
    }
}

fn parse_state(value: &str) -> Result<State, String> {
    State::parse(value).ok_or_else(|| format!("unknown state '{}'", value))
}

pub async fn arrive(args: TransitionArgs, line: &LineArgs) -> Result<()> {
    let service = line.service().await?;
    let item = service
        .station_arrive(&args.id, &args.transition())
        .await
        .with_context(|| format!("Arrival of {} rejected", args.id))?;
    print_json(&item)
}

pub async fn depart(args: TransitionArgs, line: &LineArgs) -> Result<()> {
    let service = line.service().await?;
    let item = service
        .station_depart(&args.id, &args.transition())
        .await
        .with_context(|| format!("Departure of {} rejected", args.id))?;
    print_json(&item)
}

//! prodline CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Internal error
//! - 2: Bad request
//! - 3: Not found
//! - 4: Conflict
//! - 5: Forbidden (live mode)
//! - 6: Line unavailable (configuration missing or invalid)

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use prodline_core::{ErrorKind, LineError};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const INTERNAL: u8 = 1;
    pub const BAD_REQUEST: u8 = 2;
    pub const NOT_FOUND: u8 = 3;
    pub const CONFLICT: u8 = 4;
    pub const FORBIDDEN: u8 = 5;
    pub const UNAVAILABLE: u8 = 6;
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "prodline=debug,warn"
    } else if cli.quiet {
        "error"
    } else {
        "prodline=info,warn"
    };

    // Logging goes to stderr; stdout carries JSON results only.
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .try_init();

    let line = cli.line;
    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, &line).await,
        Commands::Stations => commands::stations::execute(&line).await,
        Commands::Start(args) => commands::items::start(args, &line).await,
        Commands::Arrive(args) => commands::transition::arrive(args, &line).await,
        Commands::Depart(args) => commands::transition::depart(args, &line).await,
        Commands::Get(args) => commands::items::get(args, &line).await,
        Commands::List => commands::items::list(&line).await,
        Commands::Delete(args) => commands::items::delete(args, &line).await,
        Commands::Clock(args) => commands::items::clock(args, &line).await,
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

/// Map the first line error in the chain onto an exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    let kind = e
        .chain()
        .find_map(|cause| cause.downcast_ref::<LineError>())
        .map(LineError::kind);

    match kind {
        Some(ErrorKind::BadRequest) => ExitCodes::BAD_REQUEST,
        Some(ErrorKind::NotFound) => ExitCodes::NOT_FOUND,
        Some(ErrorKind::Conflict) => ExitCodes::CONFLICT,
        Some(ErrorKind::Forbidden) => ExitCodes::FORBIDDEN,
        Some(ErrorKind::Unavailable) => ExitCodes::UNAVAILABLE,
        Some(ErrorKind::Internal) | None => ExitCodes::INTERNAL,
    }
}

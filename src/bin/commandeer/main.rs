//! commandeer CLI - inspect and exercise the command engines

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("commandeer=debug")
    } else {
        EnvFilter::new("commandeer=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match cli.command {
        Commands::Status(args) => commands::status::execute(args),
        Commands::Test(args) => commands::test::execute(args, cli.verbose),
        Commands::Doctor(args) => commands::doctor::execute(args, cli.verbose),
        Commands::Preview(args) => commands::preview::execute(args),
    }
}

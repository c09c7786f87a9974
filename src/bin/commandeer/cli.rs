//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};

/// commandeer - inspect and exercise the command engines
#[derive(Parser)]
#[command(name = "commandeer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show which engine is active and why
    Status(StatusArgs),

    /// Exercise the native engine end to end
    Test(TestArgs),

    /// Status, self test, and troubleshooting steps
    Doctor(DoctorArgs),

    /// Show how an argv dispatches against a sample command tree
    Preview(PreviewArgs),
}

#[derive(Args)]
pub struct StatusArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct TestArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct DoctorArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PreviewArgs {
    /// Build the sample tree on the fallback engine
    #[arg(long)]
    pub fallback: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Dispatch through `parse`, which prints help or the version and exits
    #[arg(long, conflicts_with = "json")]
    pub parse: bool,

    /// Arguments to dispatch, after `--`
    #[arg(last = true)]
    pub argv: Vec<String>,
}

#![forbid(unsafe_code)]

mod cmd;
mod views;
mod wire;

use clap::{Parser, Subcommand};
use std::env;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cadence: temporal workflow engine for milestone-driven ticket tracking",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Process a command batch",
        long_about = "Process an ordered JSON command batch against a fresh engine \
                      and write the resulting view documents.",
        after_help = "EXAMPLES:\n    # Run a batch\n    cad run --users users.json \
                      --commands batch.json --output out.json"
    )]
    Run(cmd::run::RunArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CADENCE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "cadence=debug,info"
        } else {
            "cadence=info,warn"
        })
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Run(args) => cmd::run::run_batch(&args),
    }
}

mod commands;
mod manifest;

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "weave")]
#[command(about = "Declare API front-ends and serverless building blocks as one resource graph", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the manifest and compose it without printing the plan
    Validate {
        /// Manifest path (defaults to discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show the resources that would be created, in creation order
    Plan {
        /// Manifest path (defaults to discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the plan through the dry-run engine
    Apply {
        /// Manifest path (defaults to discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the values exported by every composed unit
    Outputs {
        /// Manifest path (defaults to discovery)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Show version information
    Version,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate { config } => commands::validate::handle(config.as_deref()).await,
        Commands::Plan { config, json } => commands::plan::handle(config.as_deref(), json).await,
        Commands::Apply { config } => commands::apply::handle(config.as_deref()).await,
        Commands::Outputs { config } => commands::outputs::handle(config.as_deref()).await,
        Commands::Version => {
            println!("skyweave {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

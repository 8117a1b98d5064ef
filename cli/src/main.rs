mod charts;
mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::{cmd_build, cmd_load, cmd_save, cmd_search, cmd_users};
use crate::config::Config;

#[derive(Parser)]
#[command(
    name = "plate",
    version,
    about = "Build a plate and compare it to daily recommended values",
    long_about = "Build a plate of foods, look them up in the USDA Foundation Foods \
                  dataset, and see how the plate compares to daily recommended values."
)]
struct Cli {
    /// Data directory holding the dataset and saved plates
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// USDA Foundation Foods CSV directory (default: <data-dir>/foundationfoodcsv)
    #[arg(long, global = true, value_name = "DIR")]
    dataset: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up the foods on a plate and chart them against daily values
    Build {
        /// Foods on the plate, one per argument (quote names with spaces)
        #[arg(required = true)]
        foods: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search the dataset for foods whose description contains a query
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a plate under a username
    Save {
        /// Username
        username: String,
        /// Password required to load the plate again
        #[arg(short, long)]
        password: String,
        /// Foods on the plate, one per argument (quote names with spaces)
        #[arg(required = true)]
        foods: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Load a saved plate
    Load {
        /// Username
        username: String,
        /// Password the plate was saved with
        #[arg(short, long)]
        password: String,
        /// Also look up the plate and chart it
        #[arg(long)]
        analyze: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List usernames with a saved plate
    Users {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir, cli.dataset)?;
    debug!(
        data_dir = %config.data_dir.display(),
        store = %config.store_path.display(),
        "resolved config"
    );

    match cli.command {
        Commands::Build { foods, json } => cmd_build(&config, &foods, json),
        Commands::Search { query, json } => cmd_search(&config, &query, json),
        Commands::Save {
            username,
            password,
            foods,
            json,
        } => cmd_save(&config, &username, &password, &foods, json),
        Commands::Load {
            username,
            password,
            analyze,
            json,
        } => cmd_load(&config, &username, &password, analyze, json),
        Commands::Users { json } => cmd_users(&config, json),
    }
}

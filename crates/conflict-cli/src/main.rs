//! `conflict` - fetch, store and query cyber-conflict incidents.
//!
//! Usage:
//!   conflict init
//!   conflict fetch --ingest
//!   conflict ingest data_2023-10-11.json
//!   conflict search --from 2023-01-01 --to 2023-12-31 --allegiance "Russian Federation"
//!   conflict search --ukraine-russia --export results.csv
//!   conflict actor <key>
//!   conflict summary --counts

mod commands;
mod config;
mod logging;

use clap::{Args, Parser, Subcommand};
use config::Config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "conflict")]
#[command(about = "Cyber-conflict incident store", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a RON configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Store file, overriding the configured path
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store if it does not exist
    Init,

    /// Download the impacts feed to a dated JSON file
    Fetch {
        /// Ingest the downloaded file afterwards
        #[arg(long)]
        ingest: bool,

        /// Directory for the downloaded file
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Ingest a saved API response
    Ingest {
        /// JSON file holding an array of records
        file: PathBuf,

        /// Overwrite rows whose key is already stored
        #[arg(long)]
        replace: bool,
    },

    /// Search stored events
    Search(SearchArgs),

    /// Show a threat actor profile
    Actor {
        /// Threat actor key
        key: String,
    },

    /// Summarize the store
    Summary {
        /// Show occurrence counts per event type and threat actor
        #[arg(long)]
        counts: bool,
    },
}

/// Search criteria; all given criteria must hold.
#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Start date (YYYY-MM-DD), inclusive
    #[arg(long, value_name = "DATE", requires = "to")]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD), inclusive
    #[arg(long, value_name = "DATE", requires = "from")]
    pub to: Option<String>,

    /// Exact event type
    #[arg(long = "type", value_name = "TYPE")]
    pub event_type: Option<String>,

    /// Case-insensitive text in the event name or description
    #[arg(long)]
    pub keyword: Option<String>,

    /// Exact country of the event
    #[arg(long)]
    pub country: Option<String>,

    /// Threat actor key referenced by the event
    #[arg(long, value_name = "KEY")]
    pub actor_key: Option<String>,

    /// Exact threat actor name
    #[arg(long, value_name = "NAME")]
    pub actor_name: Option<String>,

    /// Exact threat actor allegiance
    #[arg(long)]
    pub allegiance: Option<String>,

    /// Events in Ukraine attributed to actors allied with the Russian Federation
    #[arg(long)]
    pub ukraine_russia: bool,

    /// Write the attributed results to a file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Output format for attributed results: csv, json or text
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::resolve(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }

    logging::init_logging(cli.verbose, config.log_filter.as_deref());
    tracing::debug!(database = %config.database_path.display(), "configuration loaded");

    match cli.command {
        Commands::Init => commands::init(&config),
        Commands::Fetch { ingest, output_dir } => commands::fetch(&config, ingest, output_dir),
        Commands::Ingest { file, replace } => commands::ingest(&config, &file, replace),
        Commands::Search(args) => commands::search(&config, &args),
        Commands::Actor { key } => commands::actor(&config, &key),
        Commands::Summary { counts } => commands::summary(&config, counts),
    }
}

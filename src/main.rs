use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use drugstore::Config;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    author,
    version = env!("CARGO_PKG_VERSION"),
    about = "Local DrugBank knowledge store",
    long_about = None
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the store from the DrugBank XML dump
    Init {
        /// XML dump to ingest (overrides source.xml_path)
        #[arg(long)]
        xml: Option<PathBuf>,

        /// Store file to create (overrides store.path)
        #[arg(long)]
        store: Option<PathBuf>,

        /// Rebuild even if the store already exists
        #[arg(long)]
        force: bool,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Resolve a drug name to its record
    Lookup {
        name: String,

        /// Case-insensitive exact match only, no fuzzy fallback
        #[arg(long)]
        exact: bool,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Substring search over drug names
    Search {
        term: String,

        /// Maximum number of results
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Interactions among two or more drugs
    Interactions {
        #[arg(required = true, num_args = 1..)]
        names: Vec<String>,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Food interaction notes for a drug
    Food {
        name: String,

        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Row counts and ingestion metadata
    Stats {
        /// Output results as JSON
        #[arg(short, long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("drugstore=debug")
    } else {
        EnvFilter::new("drugstore=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    debug!("Logging initialized (verbose={})", cli.verbose);

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Init {
            xml,
            store,
            force,
            json,
        } => commands::init::execute(&config, xml, store, force, json)?,
        Commands::Lookup { name, exact, json } => {
            commands::lookup::execute(&config, &name, exact, json)?
        }
        Commands::Search { term, limit, json } => {
            commands::search::execute(&config, &term, limit, json)?
        }
        Commands::Interactions { names, json } => {
            commands::interactions::execute(&config, &names, json)?
        }
        Commands::Food { name, json } => commands::food::execute(&config, &name, json)?,
        Commands::Stats { json } => commands::stats::execute(&config, json)?,
    }

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

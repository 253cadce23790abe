//! CLI binary entry point for bronze-loader

#[cfg(feature = "cli")]
use bronze_loader::cli::commands::{
    check::{CheckArgs, handle_check},
    config::{ConfigArgs, handle_config},
    init::{InitArgs, handle_init},
    load::{LoadArgs, handle_load},
    preview::{PreviewArgs, handle_preview},
};
#[cfg(feature = "cli")]
use bronze_loader::cli::logging::{LogConfig, init_logging};
#[cfg(feature = "cli")]
use bronze_loader::config::CONFIG_FILENAME;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "bronze-loader")]
#[command(about = "Load CSV exports into bronze staging tables")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Load every configured dataset into the staging schema
    Load {
        /// Configuration file
        #[arg(short, long, default_value = CONFIG_FILENAME)]
        config: PathBuf,
        /// Only load this dataset (repeatable)
        #[arg(short, long = "dataset")]
        datasets: Vec<String>,
        /// Skip the single-transaction fast path
        #[arg(long)]
        batched: bool,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the staging store is reachable
    Check {
        /// Configuration file
        #[arg(short, long, default_value = CONFIG_FILENAME)]
        config: PathBuf,
    },

    /// Load one CSV file and show the normalized columns (no database access)
    Preview {
        /// CSV file
        file: PathBuf,
        /// Field delimiter
        #[arg(short, long, default_value_t = ',')]
        delimiter: char,
        /// Sample rows to print
        #[arg(short = 'n', long, default_value_t = 5)]
        rows: usize,
    },

    /// Write a sample configuration file
    Init {
        /// Directory to write into
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration (file + defaults + environment)
    Config {
        /// Configuration file
        #[arg(short, long, default_value = CONFIG_FILENAME)]
        config: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(&LogConfig::from_verbosity(cli.verbose));

    let result = match cli.command {
        Commands::Load {
            config,
            datasets,
            batched,
            json,
        } => {
            let args = LoadArgs {
                config,
                datasets,
                batched,
                json,
            };
            handle_load(&args)
        }
        Commands::Check { config } => handle_check(&CheckArgs { config }),
        Commands::Preview {
            file,
            delimiter,
            rows,
        } => {
            let args = PreviewArgs {
                file,
                delimiter,
                rows,
            };
            handle_preview(&args)
        }
        Commands::Init { dir, force } => handle_init(&InitArgs { dir, force }).map(|_| ()),
        Commands::Config { config } => handle_config(&ConfigArgs { config }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}

//! clausewatch: check a website's terms before you agree to them

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use clausewatch::config::{Config, LogFormat, LogLevel, DEFAULT_CONFIG_FILE};
use std::path::PathBuf;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "clausewatch")]
#[command(about = "Find a website's terms and privacy policy and flag risky clauses")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Directory for the analysis database
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more websites
    Check {
        /// Website URLs (https:// is assumed when no scheme is given)
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Interactive prompt: enter URLs one at a time
    Repl {
        /// Skip the disclaimer prompt
        #[arg(long)]
        accept_disclaimer: bool,
    },

    /// Classify legal text from a file, or stdin with "-"
    Scan {
        input: PathBuf,
    },

    /// Write a default configuration file
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the stored analysis for a website
    History {
        url: String,
    },
}

fn init_logging(level: LogLevel, format: LogFormat) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level.to_tracing())
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Init writes the config; it must not depend on one being readable.
    if let Commands::Init { path, force } = &cli.command {
        let level = LogLevel::from_verbosity(cli.verbose).unwrap_or(LogLevel::Info);
        init_logging(level, LogFormat::Text)?;
        return commands::init_config(path, *force).await;
    }

    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(data_dir) = cli.data_dir {
        config.store.data_dir = data_dir;
    }

    let level = LogLevel::from_verbosity(cli.verbose).unwrap_or(config.logging.level);
    init_logging(level, config.logging.format)?;

    match cli.command {
        Commands::Check { urls } => commands::check_sites(&config, &urls, cli.json).await,
        Commands::Repl { accept_disclaimer } => {
            commands::run_repl(&config, accept_disclaimer, cli.json).await
        }
        Commands::Scan { input } => commands::scan_text(&config, &input, cli.json).await,
        Commands::History { url } => commands::show_history(&config, &url, cli.json),
        Commands::Init { .. } => Ok(()),
    }
}

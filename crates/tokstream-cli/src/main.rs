use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokstream_infrastructure::BackendKind;

mod commands;
mod logging;
mod settings;

use settings::Overrides;

#[derive(Parser, Debug)]
#[command(name = "tokstream")]
#[command(about = "tokstream - streaming answer client for line-framed token protocols", long_about = None)]
struct Cli {
    /// Token source: synthetic or http
    #[arg(long, global = true)]
    backend: Option<BackendKind>,

    /// Endpoint for the http backend
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Config file (default: ~/.config/tokstream/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stream one answer to stdout
    Ask {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Interactive session keeping conversation history
    Chat,
    /// Run the reference endpoint
    Serve {
        /// Address to listen on
        #[arg(long)]
        bind: Option<String>,
    },
    /// Show the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_service = settings::config_service(cli.config.as_deref())?;
    let mut config = config_service.load()?;
    let bind = match &cli.command {
        Commands::Serve { bind } => bind.clone(),
        _ => None,
    };
    Overrides {
        backend: cli.backend,
        endpoint: cli.endpoint,
        bind,
    }
    .apply(&mut config);

    logging::init(&config.log_level);
    tracing::debug!(path = %config_service.path().display(), backend = %config.backend.kind, "configuration loaded");

    match cli.command {
        Commands::Ask { query } => commands::ask::run(&config, &query.join(" ")).await?,
        Commands::Chat => commands::chat::run(&config).await?,
        Commands::Serve { .. } => commands::serve::run(&config).await?,
        Commands::Config { init } => commands::config::run(&config_service, &config, init)?,
    }

    Ok(())
}

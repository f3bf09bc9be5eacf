mod config_cmd;
mod extract_cmd;
mod review_cmd;
mod terminal_output;
mod wiring;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use chequeforge_config::{apply_all_defaults, config_dir, config_file_path, load_config, ChequeForgeConfig};

#[derive(Parser)]
#[command(name = "chequeforge")]
#[command(about = "ChequeForge — cheque field extraction service")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.chequeforge/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP service
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Extract fields from one cheque image and print the record
    Extract {
        /// Cheque image (jpeg, png, gif or webp)
        image: PathBuf,
        /// Skip the model-based secondary pass
        #[arg(long)]
        no_secondary: bool,
        /// Use this file's text instead of running recognition
        #[arg(long, value_name = "FILE")]
        text: Option<PathBuf>,
    },
    /// List cheques awaiting review
    Review,
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config with secrets masked
    Show,
    /// Check the config and report problems
    Validate,
    /// Write a config file holding the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .unwrap_or_else(|| config_file_path(&config_dir()));

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => config_cmd::show(&config_path).await?,
            ConfigAction::Validate => config_cmd::validate_file(&config_path).await?,
            ConfigAction::Init { force } => config_cmd::init(&config_path, force).await?,
        },
        Commands::Serve { port } => {
            let (mut config, _guard) = runtime_config(&config_path).await?;
            if let Some(port) = port {
                config.server.get_or_insert_with(Default::default).port = Some(port);
            }
            run_server(config).await?;
        }
        Commands::Extract {
            image,
            no_secondary,
            text,
        } => {
            let (config, _guard) = runtime_config(&config_path).await?;
            extract_cmd::run(&config, &image, text.as_deref(), no_secondary).await?;
        }
        Commands::Review => {
            let (config, _guard) = runtime_config(&config_path).await?;
            let store = wiring::open_store(&config)?;
            review_cmd::run(&store).await?;
        }
    }

    Ok(())
}

/// Load the config, start logging at its level, then validate it.
///
/// Logging comes up before validation so config warnings reach the log.
async fn runtime_config(
    path: &Path,
) -> Result<(ChequeForgeConfig, logging::WorkerGuard)> {
    let config = apply_all_defaults(load_config(path).await?);
    let logging_config = config.logging();
    let guard = logging::init_logger(logging_config.dir(), logging_config.level())?;
    let config = chequeforge_config::prepare(config)
        .with_context(|| format!("Invalid config at {}", path.display()))?;
    Ok((config, guard))
}

async fn run_server(config: ChequeForgeConfig) -> Result<()> {
    let server = config.server();
    let addr: SocketAddr = format!("{}:{}", server.host(), server.port())
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", server.host(), server.port()))?;

    info!(
        addr = %addr,
        db = %config.storage().db_path().display(),
        uploads = %server.upload_dir().display(),
        "Starting ChequeForge"
    );

    let state = wiring::build_gateway_state(&config)?;
    chequeforge_gateway::start_server(addr, state).await
}

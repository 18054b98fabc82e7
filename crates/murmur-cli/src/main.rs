//! `murmur` -- voice command dispatcher for lights and media.
//!
//! Provides the following subcommands:
//!
//! - `murmur listen` -- Listen for speech (or stdin lines) and run commands.
//! - `murmur dispatch` -- Dispatch a single transcript.
//! - `murmur score` -- Show fuzzy match scores for a phrase.
//! - `murmur pair` -- Pair the hue CLI with a bridge.
//! - `murmur status` -- Show configuration and environment diagnostics.
//! - `murmur config` -- Show resolved configuration.

use clap::{Parser, Subcommand};

mod commands;

/// Voice command dispatcher CLI.
#[derive(Parser)]
#[command(
    name = "murmur",
    about = "Voice command dispatcher for lights and media",
    version
)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (overrides auto-discovery).
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Listen for commands until Ctrl+C.
    Listen(commands::listen::ListenArgs),

    /// Dispatch one transcript and exit.
    Dispatch(commands::dispatch::DispatchArgs),

    /// Print token-set match scores for a phrase.
    Score(commands::score::ScoreArgs),

    /// Pair the hue CLI with a bridge on the local network.
    Pair,

    /// Show configuration status.
    Status,

    /// Show resolved configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCmd,
    },
}

/// Subcommands for `murmur config`.
#[derive(Subcommand)]
enum ConfigCmd {
    /// Show the full resolved configuration.
    Show,

    /// Show a specific configuration section.
    Section {
        /// Section name (e.g., "dispatch", "hue", "kodi", "voice").
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_override = cli.config.as_deref();

    match cli.command {
        Commands::Listen(args) => commands::listen::run(args, config_override).await?,
        Commands::Dispatch(args) => commands::dispatch::run(args, config_override).await?,
        Commands::Score(args) => commands::score::run(args, config_override).await?,
        Commands::Pair => commands::pair::run(config_override).await?,
        Commands::Status => commands::status::run(config_override).await?,
        Commands::Config { action } => {
            let platform = murmur_platform::NativePlatform::new();
            let config = commands::load_config(&platform, config_override).await?;
            match action {
                ConfigCmd::Show => commands::config_cmd::config_show(&config),
                ConfigCmd::Section { name } => {
                    commands::config_cmd::config_section(&config, &name)?
                }
            }
        }
    }

    Ok(())
}

//! `murmur listen` -- run the listen loop until Ctrl+C.
//!
//! Startup order: load config, build the command tree, check the speech
//! model (microphone mode only), pair with the hue bridge if lighting is
//! enabled, then listen. Any failure before listening is fatal.
//!
//! # Example
//!
//! ```text
//! murmur listen
//! echo "hue on" | murmur listen --stdin
//! ```

use std::sync::Arc;

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use murmur_core::{Dispatcher, build_registry, pairing};
use murmur_platform::{NativePlatform, Platform};
use murmur_types::config::Config;
use murmur_voice::{ListenStats, Listener, ThreadedLines};

use super::load_config;

/// Arguments for the `murmur listen` subcommand.
#[derive(Args)]
pub struct ListenArgs {
    /// Read transcripts from stdin, one per line, instead of the microphone.
    #[arg(long)]
    pub stdin: bool,

    /// Do not run hue pairing at startup.
    #[arg(long)]
    pub skip_pairing: bool,
}

/// Run the listen command.
pub async fn run(args: ListenArgs, config_override: Option<&str>) -> anyhow::Result<()> {
    let bootstrap = NativePlatform::new();
    let config = load_config(&bootstrap, config_override).await?;
    let platform = NativePlatform::with_process_timeout(config.dispatch.process_timeout_secs);

    let registry = Arc::new(build_registry(&config)?);
    info!(
        domains = registry.nodes().len(),
        threshold = config.dispatch.threshold,
        "command tree ready"
    );

    if !args.stdin {
        check_microphone_support()?;
        murmur_voice::ensure_model(platform.fs(), &config.voice.stt.model_path).await?;
    }

    if config.hue.enabled && !args.skip_pairing {
        let status =
            pairing::ensure_paired(platform.fs(), platform.process().as_ref(), &config.hue).await?;
        info!(?status, "hue pairing checked");
    }

    let dispatcher = Arc::new(Dispatcher::new(
        registry,
        platform.process(),
        config.dispatch.clone(),
    ));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received shutdown signal");
            signal_cancel.cancel();
        }
    });

    let mut listener = Listener::new(dispatcher, cancel);
    let stats = if args.stdin {
        listener.run(ThreadedLines::stdin()?).await?
    } else {
        listen_microphone(&config, &mut listener).await?
    };

    print_summary(&stats);
    Ok(())
}

#[cfg(feature = "microphone")]
fn check_microphone_support() -> anyhow::Result<()> {
    Ok(())
}

#[cfg(not(feature = "microphone"))]
fn check_microphone_support() -> anyhow::Result<()> {
    anyhow::bail!(
        "this build has no microphone support; rebuild with `--features microphone` \
         or pipe transcripts into `murmur listen --stdin`"
    )
}

#[cfg(feature = "microphone")]
async fn listen_microphone(config: &Config, listener: &mut Listener) -> anyhow::Result<ListenStats> {
    let (capture, source) = murmur_voice::pipeline::open_microphone(config)?;
    let stats = listener.run(source).await?;
    drop(capture);
    Ok(stats)
}

#[cfg(not(feature = "microphone"))]
async fn listen_microphone(_config: &Config, _listener: &mut Listener) -> anyhow::Result<ListenStats> {
    check_microphone_support()?;
    Ok(ListenStats::default())
}

fn print_summary(stats: &ListenStats) {
    eprintln!(
        "heard {} transcript(s): {} executed, {} unmatched, {} failed, {} ignored",
        stats.transcripts, stats.executed, stats.unmatched, stats.failed, stats.ignored
    );
    if stats.abandoned > 0 {
        eprintln!("{} command(s) still running at exit", stats.abandoned);
    }
}

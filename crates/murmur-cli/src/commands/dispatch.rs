//! `murmur dispatch` -- dispatch one transcript and exit.
//!
//! Runs the same resolution as `murmur listen` on the given words. With
//! `--dry-run` the selected command is printed instead of run.
//!
//! # Example
//!
//! ```text
//! murmur dispatch hue lights off
//! murmur dispatch --dry-run kodi pause
//! ```

use std::sync::Arc;

use clap::Args;

use murmur_core::{DispatchOutcome, Dispatcher, IgnoreReason, build_registry};
use murmur_platform::{NativePlatform, Platform, ProcessSpawner, RecordingSpawner};

use super::load_config;

/// Arguments for the `murmur dispatch` subcommand.
#[derive(Args)]
pub struct DispatchArgs {
    /// Transcript to dispatch, e.g. `hue on`.
    #[arg(required = true)]
    pub words: Vec<String>,

    /// Print the selected command instead of running it.
    #[arg(long)]
    pub dry_run: bool,
}

/// Run the dispatch command.
pub async fn run(args: DispatchArgs, config_override: Option<&str>) -> anyhow::Result<()> {
    let platform = NativePlatform::new();
    let config = load_config(&platform, config_override).await?;
    let registry = Arc::new(build_registry(&config)?);

    let spawner: Arc<dyn ProcessSpawner> = if args.dry_run {
        Arc::new(RecordingSpawner::new())
    } else {
        NativePlatform::with_process_timeout(config.dispatch.process_timeout_secs).process()
    };

    let dispatcher = Dispatcher::new(registry, spawner, config.dispatch.clone());
    let text = args.words.join(" ");
    let outcome = dispatcher.dispatch_text(&text).await;
    report(&outcome, args.dry_run)
}

/// Print the outcome; anything but a clean run is an error.
fn report(outcome: &DispatchOutcome, dry_run: bool) -> anyhow::Result<()> {
    match outcome {
        DispatchOutcome::Executed {
            path,
            invocation,
            output,
        } => {
            println!("matched: {}", path.join(" > "));
            if dry_run {
                println!("would run: {invocation}");
                return Ok(());
            }
            println!("ran: {invocation}");
            if !output.stdout.trim().is_empty() {
                print!("{}", output.stdout);
            }
            if !output.stderr.trim().is_empty() {
                eprint!("{}", output.stderr);
            }
            if !output.success() {
                anyhow::bail!("`{invocation}` exited with status {:?}", output.exit_code);
            }
            Ok(())
        }
        DispatchOutcome::Failed {
            invocation, error, ..
        } => anyhow::bail!("could not run `{invocation}`: {error}"),
        DispatchOutcome::NoMatch { level, best } => match best {
            Some(best) => anyhow::bail!(
                "no command matched at '{level}' (closest: '{}' scored {})",
                best.candidate,
                best.score
            ),
            None => anyhow::bail!("no command matched at '{level}': nothing left to match"),
        },
        DispatchOutcome::Ignored(IgnoreReason::Empty) => anyhow::bail!("nothing to dispatch"),
        DispatchOutcome::Ignored(IgnoreReason::Partial) => {
            anyhow::bail!("partial transcript ignored")
        }
    }
}

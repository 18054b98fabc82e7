//! `murmur score` -- inspect fuzzy match scores.
//!
//! Scores a phrase against explicit candidates, or, when none are given,
//! walks the command tree and shows the scores at every level it reaches.
//! Useful for tuning aliases to what the speech model actually hears.
//!
//! # Example
//!
//! ```text
//! murmur score "cody pause" kodi cody hue
//! murmur score "hue lights off"
//! ```

use std::sync::Arc;

use clap::Args;
use comfy_table::{Table, presets::UTF8_FULL};

use murmur_core::fuzzy::{self, MatchOptions, MatchResult};
use murmur_core::{Dispatcher, LevelScores, Route, build_registry};
use murmur_platform::{NativePlatform, RecordingSpawner};
use murmur_types::config::Config;

use super::load_config;

/// Arguments for the `murmur score` subcommand.
#[derive(Args)]
pub struct ScoreArgs {
    /// Phrase to score.
    pub query: String,

    /// Candidates to score against (defaults to the command tree).
    pub candidates: Vec<String>,
}

/// Run the score command.
pub async fn run(args: ScoreArgs, config_override: Option<&str>) -> anyhow::Result<()> {
    let platform = NativePlatform::new();
    let config = load_config(&platform, config_override).await?;
    let threshold = config.dispatch.threshold;

    if !args.candidates.is_empty() {
        let options = MatchOptions {
            fold_case: config.dispatch.case_insensitive,
        };
        let ranked = fuzzy::extract_with(&args.query, &args.candidates, options);
        println!("{}", score_table(&args.query, &ranked, threshold));
        return Ok(());
    }

    let (route, levels) = explain(&config, &args.query)?;
    for level in &levels {
        let title = format!("{} / {}", level.level, level.query);
        println!("{}", score_table(&title, &level.ranked, threshold));
    }
    match route {
        Route::Invoke { invocation, .. } => println!("resolves to: {invocation}"),
        Route::NoMatch { level, .. } => println!("no match at '{level}'"),
        Route::Empty => println!("nothing to score"),
    }
    Ok(())
}

/// Walk the configured tree without running anything.
fn explain(config: &Config, text: &str) -> anyhow::Result<(Route, Vec<LevelScores>)> {
    let registry = Arc::new(build_registry(config)?);
    let dispatcher = Dispatcher::new(
        registry,
        Arc::new(RecordingSpawner::new()),
        config.dispatch.clone(),
    );
    Ok(dispatcher.explain(text))
}

fn score_table(title: &str, ranked: &[MatchResult], threshold: u8) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header([title, "SCORE", "MATCH"]);
    for result in ranked {
        let mark = if result.score >= threshold { "yes" } else { "" };
        table.add_row([
            result.candidate.clone(),
            result.score.to_string(),
            mark.to_string(),
        ]);
    }
    table
}

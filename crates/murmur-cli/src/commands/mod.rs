//! CLI command implementations for `murmur`.
//!
//! Each subcommand is implemented in its own module:
//!
//! - [`listen`] -- The long-running listen loop.
//! - [`dispatch`] -- One-shot dispatch of a transcript.
//! - [`score`] -- Fuzzy score inspection.
//! - [`pair`] -- Hue bridge pairing.
//! - [`status`] -- Configuration and environment diagnostics.
//! - [`config_cmd`] -- Resolved configuration display.

pub mod config_cmd;
pub mod dispatch;
pub mod listen;
pub mod pair;
pub mod score;
pub mod status;

use std::path::{Path, PathBuf};

use murmur_platform::Platform;
use murmur_platform::config_loader;
use murmur_types::config::Config;

/// Load configuration from the given path override or via auto-discovery.
///
/// If `config_override` is provided, loads from that path. Otherwise,
/// uses the platform's config discovery chain:
/// 1. `MURMUR_CONFIG` env var
/// 2. `~/.murmur/config.json`
///
/// Returns a default `Config` if no config file is found.
pub async fn load_config<P: Platform>(
    platform: &P,
    config_override: Option<&str>,
) -> anyhow::Result<Config> {
    let raw = if let Some(path_str) = config_override {
        let path = Path::new(path_str);
        if !platform.fs().exists(path).await {
            anyhow::bail!("config file not found: {path_str}");
        }
        config_loader::read_config_raw(platform.fs(), path).await?
    } else {
        config_loader::load_config_raw(platform.fs(), platform.env()).await?
    };

    Ok(config_loader::parse_config(raw)?)
}

/// Discover the config file path (for display in `murmur status`).
pub fn discover_config_path<P: Platform>(platform: &P, config_override: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = config_override {
        return Some(PathBuf::from(path));
    }
    let home = platform.fs().home_dir();
    config_loader::discover_config_path(platform.env(), home)
}

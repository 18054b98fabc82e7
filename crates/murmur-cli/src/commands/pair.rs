//! `murmur pair` -- pair the hue CLI with a bridge.
//!
//! Does nothing when the credential file already exists. Otherwise searches
//! for bridges and registers with the first one; press the bridge's link
//! button before running this.

use murmur_core::pairing::{self, PairingStatus};
use murmur_platform::{NativePlatform, Platform};

use super::load_config;

/// Run the pair command.
pub async fn run(config_override: Option<&str>) -> anyhow::Result<()> {
    let platform = NativePlatform::new();
    let config = load_config(&platform, config_override).await?;

    if !config.hue.enabled {
        println!("Lighting domain is disabled; nothing to pair.");
        return Ok(());
    }

    let status =
        pairing::ensure_paired(platform.fs(), platform.process().as_ref(), &config.hue).await?;
    match status {
        PairingStatus::AlreadyPaired { credential } => {
            println!("Already paired (credential: {})", credential.display());
        }
        PairingStatus::Paired { bridge } => {
            println!("Paired with bridge {bridge}");
        }
    }
    Ok(())
}

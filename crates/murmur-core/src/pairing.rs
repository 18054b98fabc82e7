//! One-time pairing with a hue bridge.
//!
//! The `hue` CLI keeps its bridge credential in a file (`~/.hue.json` by
//! default). When that file is missing we ask the CLI to search the network
//! for bridges and register with the first one it reports. Registration
//! writes the credential file itself, so a successful run makes the next
//! startup skip straight past this step.

use std::path::PathBuf;

use serde_json::Value;
use tracing::{info, warn};

use murmur_platform::ProcessSpawner;
use murmur_platform::fs::FileSystem;
use murmur_types::config::HueConfig;
use murmur_types::{ActionInvocation, MurmurError, Result};

/// Result of [`ensure_paired`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingStatus {
    /// The credential file was already there.
    AlreadyPaired { credential: PathBuf },
    /// Registered with `bridge` during this call.
    Paired { bridge: String },
}

/// Make sure the hue CLI is paired with a bridge.
///
/// Fails with [`MurmurError::NoBridgeFound`] when the search reports no
/// bridges, and with [`MurmurError::Pairing`] when either CLI call cannot
/// be run or registration exits with a failure status.
pub async fn ensure_paired(
    fs: &dyn FileSystem,
    spawner: &dyn ProcessSpawner,
    hue: &HueConfig,
) -> Result<PairingStatus> {
    let credential = hue.pairing_path();
    if fs.exists(&credential).await {
        info!(path = %credential.display(), "hue credential present");
        return Ok(PairingStatus::AlreadyPaired { credential });
    }

    info!(path = %credential.display(), "no hue credential, searching for a bridge");
    let search = ActionInvocation::new(&hue.program, ["--json", "search"]);
    let output = spawner
        .execute(&search)
        .await
        .map_err(|e| MurmurError::Pairing(e.to_string()))?;
    if !output.success() {
        warn!(exit_code = ?output.exit_code, stderr = %output.stderr.trim_end(), "bridge search failed");
    }

    let bridge = first_bridge(&output.stdout)?;
    info!(bridge = %bridge, "registering with bridge, press the link button");

    let register = ActionInvocation::new(&hue.program, ["-H", bridge.as_str(), "register"]);
    let output = spawner
        .execute(&register)
        .await
        .map_err(|e| MurmurError::Pairing(e.to_string()))?;
    if !output.success() {
        return Err(MurmurError::Pairing(format!(
            "`{register}` exited with {:?}: {}",
            output.exit_code,
            output.stderr.trim_end()
        )));
    }

    info!(bridge = %bridge, "paired");
    Ok(PairingStatus::Paired { bridge })
}

/// Pick the first bridge from `hue --json search` output.
///
/// The CLI prints a JSON array. Entries are host strings; object entries
/// with an `ip` or `host` field are accepted as well.
pub fn first_bridge(stdout: &str) -> Result<String> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(MurmurError::NoBridgeFound);
    }

    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| MurmurError::Pairing(format!("unexpected search output: {e}")))?;
    let Value::Array(entries) = value else {
        return Err(MurmurError::Pairing(
            "unexpected search output: expected a JSON array".into(),
        ));
    };

    let first = entries.into_iter().next().ok_or(MurmurError::NoBridgeFound)?;
    match first {
        Value::String(host) if !host.trim().is_empty() => Ok(host),
        Value::Object(map) => map
            .get("ip")
            .or_else(|| map.get("host"))
            .and_then(Value::as_str)
            .filter(|h| !h.trim().is_empty())
            .map(str::to_string)
            .ok_or(MurmurError::NoBridgeFound),
        _ => Err(MurmurError::NoBridgeFound),
    }
}

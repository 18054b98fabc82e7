//! Configuration schema types.
//!
//! All structs accept both `snake_case` and `camelCase` field names in JSON
//! via `#[serde(alias)]`. Unknown fields are ignored, and every section has a
//! default so an empty `{}` document is a valid configuration describing the
//! reference setup (lighting + media domains).
//!
//! # Module Structure
//!
//! - [`voice`] -- Audio capture and speech engine settings
//! - [`devices`] -- Per-domain device settings (hue lighting, kodi media)

pub mod devices;
pub mod voice;

pub use devices::*;
pub use voice::*;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{MurmurError, Result};

/// Shared default function: returns `true`.
pub(crate) fn default_true() -> bool {
    true
}

// ── Root config ──────────────────────────────────────────────────────────

/// Root configuration for murmur.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Audio capture and speech engine.
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Fuzzy dispatch tuning.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Lighting domain (hue CLI).
    #[serde(default)]
    pub hue: HueConfig,

    /// Media domain (kodi CLI).
    #[serde(default)]
    pub kodi: KodiConfig,
}

impl Config {
    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        self.dispatch.validate()
    }
}

// ── Dispatch ─────────────────────────────────────────────────────────────

/// Fuzzy dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Minimum token-set score (0-100) for a handler to fire.
    #[serde(default = "default_threshold")]
    pub threshold: u8,

    /// Scores at or below this value are left out of diagnostic logs.
    /// Has no effect on which handler fires.
    #[serde(default = "default_diagnostic_threshold", alias = "diagnosticThreshold")]
    pub diagnostic_threshold: u8,

    /// Lowercase query and aliases before scoring.
    ///
    /// Off by default: matching is case-sensitive unless this is set.
    #[serde(default, alias = "caseInsensitive")]
    pub case_insensitive: bool,

    /// Dispatch partial (in-progress) transcripts as well as final ones.
    #[serde(default, alias = "partialResults")]
    pub partial_results: bool,

    /// Kill external programs that run longer than this many seconds.
    #[serde(default, alias = "processTimeoutSecs")]
    pub process_timeout_secs: Option<u64>,
}

fn default_threshold() -> u8 {
    75
}

fn default_diagnostic_threshold() -> u8 {
    25
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            diagnostic_threshold: default_diagnostic_threshold(),
            case_insensitive: false,
            partial_results: false,
            process_timeout_secs: None,
        }
    }
}

impl DispatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.threshold > 100 {
            return Err(MurmurError::ConfigInvalid {
                reason: format!("dispatch.threshold must be 0-100, got {}", self.threshold),
            });
        }
        if self.diagnostic_threshold > 100 {
            return Err(MurmurError::ConfigInvalid {
                reason: format!(
                    "dispatch.diagnostic_threshold must be 0-100, got {}",
                    self.diagnostic_threshold
                ),
            });
        }
        Ok(())
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_reference_setup() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.dispatch.threshold, 75);
        assert_eq!(config.dispatch.diagnostic_threshold, 25);
        assert!(!config.dispatch.case_insensitive);
        assert!(!config.dispatch.partial_results);
        assert!(config.hue.enabled);
        assert!(config.kodi.enabled);
        assert_eq!(config.voice.audio.sample_rate, 16000);
    }

    #[test]
    fn camel_case_aliases_accepted() {
        let json = r#"{
            "dispatch": {
                "diagnosticThreshold": 10,
                "caseInsensitive": true,
                "partialResults": true,
                "processTimeoutSecs": 5
            }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.dispatch.diagnostic_threshold, 10);
        assert!(config.dispatch.case_insensitive);
        assert!(config.dispatch.partial_results);
        assert_eq!(config.dispatch.process_timeout_secs, Some(5));
    }

    #[test]
    fn unknown_fields_ignored() {
        let config: Config =
            serde_json::from_str(r#"{"dispatch": {"threshold": 80}, "mqtt": {}}"#).unwrap();
        assert_eq!(config.dispatch.threshold, 80);
    }

    #[test]
    fn validate_rejects_threshold_above_100() {
        let mut config = Config::default();
        config.dispatch.threshold = 101;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("dispatch.threshold"));
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn expand_home_leaves_plain_paths() {
        assert_eq!(expand_home("/etc/hue.json"), PathBuf::from("/etc/hue.json"));
        assert_eq!(expand_home("model"), PathBuf::from("model"));
    }

    #[test]
    fn expand_home_resolves_tilde() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.hue.json"), home.join(".hue.json"));
        }
    }
}

//! Error types for murmur.
//!
//! [`MurmurError`] covers the fatal conditions: configuration problems
//! detected while building the dispatch tree, and startup preconditions
//! (speech model, device pairing). No-match conditions and external
//! process failures are deliberately *not* errors; they are reported as
//! dispatch outcomes instead.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for murmur.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MurmurError {
    // ── Configuration ────────────────────────────────────────────────

    /// Configuration is malformed or semantically invalid.
    #[error("invalid config: {reason}")]
    ConfigInvalid {
        /// What is wrong with the configuration.
        reason: String,
    },

    /// Two sibling nodes in one registry level share an alias.
    #[error("duplicate alias '{alias}' in registry '{registry}'")]
    DuplicateAlias {
        /// Name of the registry level.
        registry: String,
        /// The alias claimed twice.
        alias: String,
    },

    /// A node was declared without aliases, or with an empty alias.
    #[error("node '{node}' in registry '{registry}' has an empty alias set")]
    EmptyAlias {
        /// Name of the registry level.
        registry: String,
        /// Name of the offending node.
        node: String,
    },

    // ── Startup ──────────────────────────────────────────────────────

    /// The speech model directory does not exist.
    #[error(
        "speech model not found at {}. Please download a model from \
         https://alphacephei.com/vosk/models and unpack it to that folder",
        path.display()
    )]
    ModelMissing {
        /// Directory that was expected to hold the model.
        path: PathBuf,
    },

    /// Pairing found no controllable bridge on the network.
    #[error("could not find a hue bridge to pair with")]
    NoBridgeFound,

    /// The pairing program failed in some other way.
    #[error("pairing failed: {0}")]
    Pairing(String),

    /// Underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout murmur.
pub type Result<T> = std::result::Result<T, MurmurError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_alias_display() {
        let err = MurmurError::DuplicateAlias {
            registry: "lights".into(),
            alias: "on".into(),
        };
        assert_eq!(err.to_string(), "duplicate alias 'on' in registry 'lights'");
    }

    #[test]
    fn model_missing_mentions_download_location() {
        let err = MurmurError::ModelMissing {
            path: PathBuf::from("model"),
        };
        let msg = err.to_string();
        assert!(msg.contains("alphacephei.com/vosk/models"));
        assert!(msg.contains("model"));
    }

    #[test]
    fn no_bridge_found_display() {
        assert_eq!(
            MurmurError::NoBridgeFound.to_string(),
            "could not find a hue bridge to pair with"
        );
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = MurmurError::from(io_err);
        assert!(matches!(err, MurmurError::Io(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: MurmurError = json_err.into();
        assert!(matches!(err, MurmurError::Json(_)));
    }
}

//! Voice pipeline errors.

use thiserror::Error;

/// Errors raised while capturing or recognizing speech.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum VoiceError {
    /// The speech model could not be loaded.
    #[error("failed to load speech model from '{path}'")]
    ModelLoad { path: String },

    /// The recognizer could not be created for the given sample rate.
    #[error("failed to create recognizer at {sample_rate} Hz")]
    RecognizerInit { sample_rate: u32 },

    /// The recognizer rejected audio.
    #[error("speech decoding failed: {0}")]
    Decode(String),

    /// The host has no default input device.
    #[error("no audio input device found")]
    NoInputDevice,

    /// No input device name contains the configured string.
    #[error("no audio input device matching '{name}'")]
    DeviceNotFound { name: String },

    /// The input device could not be configured or started.
    #[error("audio capture error: {0}")]
    Audio(String),

    /// Reading a transcript stream failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_input_device_message() {
        assert_eq!(
            VoiceError::NoInputDevice.to_string(),
            "no audio input device found"
        );
        assert_eq!(
            VoiceError::DeviceNotFound { name: "USB".into() }.to_string(),
            "no audio input device matching 'USB'"
        );
    }

    #[test]
    fn io_conversion() {
        let err: VoiceError = std::io::Error::other("closed").into();
        assert!(matches!(err, VoiceError::Io(_)));
    }
}

//! Voice pipeline configuration: audio capture and speech engine.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Voice pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VoiceConfig {
    /// Audio capture settings.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Speech-to-text settings.
    #[serde(default)]
    pub stt: SttConfig,
}

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz. Must match what the speech model expects.
    #[serde(default = "default_sample_rate", alias = "sampleRate")]
    pub sample_rate: u32,

    /// Number of audio channels (1 = mono).
    #[serde(default = "default_audio_channels")]
    pub channels: u16,

    /// Input device name substring (None = system default).
    #[serde(default, alias = "inputDevice")]
    pub input_device: Option<String>,
}

fn default_sample_rate() -> u32 {
    16000
}
fn default_audio_channels() -> u16 {
    1
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            channels: default_audio_channels(),
            input_device: None,
        }
    }
}

/// Speech-to-text configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// Directory holding the unpacked speech model.
    #[serde(default = "default_model_path", alias = "modelPath")]
    pub model_path: PathBuf,
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model")
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
        }
    }
}

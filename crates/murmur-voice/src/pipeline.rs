//! Wiring microphone capture to the speech engine.

use murmur_types::config::Config;

use crate::capture::{AudioSource, MicrophoneCapture};
use crate::error::VoiceError;
use crate::source::RecognizerTranscripts;
use crate::stt::VoskRecognizer;

/// Open the microphone and attach a vosk recognizer at the device's rate.
///
/// Keep the returned capture alive for as long as the source is read;
/// dropping it stops the input stream.
pub fn open_microphone(
    config: &Config,
) -> Result<(MicrophoneCapture, RecognizerTranscripts<VoskRecognizer>), VoiceError> {
    let mut capture = MicrophoneCapture::new(config.voice.audio.clone());
    let stream = capture.start()?;
    let recognizer = VoskRecognizer::new(
        &config.voice.stt.model_path,
        stream.sample_rate,
        config.dispatch.partial_results,
    )?;
    Ok((capture, RecognizerTranscripts::new(stream.chunks, recognizer)))
}

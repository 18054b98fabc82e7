//! Speech-to-text.
//!
//! [`SpeechRecognizer`] is the seam between raw PCM audio and transcript
//! events. The vosk implementation lives behind the `vosk` feature; the
//! rest of the pipeline only sees the trait.

use murmur_types::TranscriptEvent;

use crate::error::VoiceError;

/// Streaming speech recognizer fed with 16-bit mono PCM.
pub trait SpeechRecognizer: Send {
    /// Feed one chunk of samples.
    ///
    /// Returns an event when the engine finalizes an utterance, or a
    /// partial event when partial results are enabled and the in-progress
    /// text changed. Returns `Ok(None)` otherwise.
    fn accept_waveform(&mut self, samples: &[i16]) -> Result<Option<TranscriptEvent>, VoiceError>;

    /// Flush whatever is buffered once the audio stream has ended.
    fn finish(&mut self) -> Option<TranscriptEvent>;
}

#[cfg(feature = "vosk")]
pub use self::vosk_engine::VoskRecognizer;

#[cfg(feature = "vosk")]
mod vosk_engine {
    use std::path::Path;

    use tracing::{debug, info, trace};
    use vosk::{DecodingState, Model, Recognizer};

    use murmur_types::TranscriptEvent;

    use super::SpeechRecognizer;
    use crate::error::VoiceError;

    /// Offline recognizer backed by a vosk model directory.
    pub struct VoskRecognizer {
        // Dropped before `model`.
        recognizer: Recognizer,
        _model: Model,
        partial_results: bool,
        last_partial: String,
    }

    impl VoskRecognizer {
        /// Load the model at `model_path` and create a recognizer for
        /// `sample_rate` Hz audio.
        pub fn new(
            model_path: &Path,
            sample_rate: u32,
            partial_results: bool,
        ) -> Result<Self, VoiceError> {
            let path = model_path.to_string_lossy().into_owned();
            let model = Model::new(path.as_str()).ok_or(VoiceError::ModelLoad { path })?;
            let mut recognizer = Recognizer::new(&model, sample_rate as f32)
                .ok_or(VoiceError::RecognizerInit { sample_rate })?;
            recognizer.set_words(false);
            recognizer.set_partial_words(false);
            recognizer.set_max_alternatives(0);

            info!(
                model = %model_path.display(),
                sample_rate,
                partial_results,
                "speech recognizer ready"
            );
            Ok(Self {
                recognizer,
                _model: model,
                partial_results,
                last_partial: String::new(),
            })
        }

        fn take_final(&mut self) -> Option<TranscriptEvent> {
            self.last_partial.clear();
            let result = self.recognizer.result();
            let text = result.single()?.text.trim().to_string();
            if text.is_empty() {
                trace!("empty utterance");
                return None;
            }
            debug!(%text, "utterance finalized");
            Some(TranscriptEvent::final_text(text))
        }

        fn take_partial(&mut self) -> Option<TranscriptEvent> {
            let partial = self.recognizer.partial_result().partial.trim().to_string();
            if partial.is_empty() || partial == self.last_partial {
                return None;
            }
            self.last_partial = partial.clone();
            Some(TranscriptEvent::partial(partial))
        }
    }

    impl SpeechRecognizer for VoskRecognizer {
        fn accept_waveform(
            &mut self,
            samples: &[i16],
        ) -> Result<Option<TranscriptEvent>, VoiceError> {
            let state = self
                .recognizer
                .accept_waveform(samples)
                .map_err(|e| VoiceError::Decode(format!("{e:?}")))?;
            match state {
                DecodingState::Finalized => Ok(self.take_final()),
                DecodingState::Running if self.partial_results => Ok(self.take_partial()),
                DecodingState::Running => Ok(None),
                DecodingState::Failed => Err(VoiceError::Decode("recognizer reported failure".into())),
            }
        }

        fn finish(&mut self) -> Option<TranscriptEvent> {
            let text = self.recognizer.final_result().single()?.text.trim().to_string();
            (!text.is_empty()).then(|| TranscriptEvent::final_text(text))
        }
    }

    impl Drop for VoskRecognizer {
        fn drop(&mut self) {
            debug!("releasing speech recognizer and model");
        }
    }
}

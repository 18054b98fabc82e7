//! Speech input for murmur.
//!
//! # Module Structure
//!
//! - [`capture`] -- Microphone PCM capture (cpal, feature `cpal`)
//! - [`stt`] -- Speech recognizer seam (vosk, feature `vosk`)
//! - [`source`] -- Transcript sources: text lines or recognized audio
//! - [`listener`] -- The listen loop feeding the dispatcher
//! - [`model`] -- Speech model presence check

pub mod capture;
pub mod error;
pub mod listener;
pub mod model;
#[cfg(all(feature = "vosk", feature = "cpal"))]
pub mod pipeline;
pub mod source;
pub mod stt;

pub use error::VoiceError;
pub use listener::{ListenStats, Listener, ListenerStatus};
pub use model::ensure_model;
pub use source::{LineTranscripts, RecognizerTranscripts, ThreadedLines, TranscriptSource};
pub use stt::SpeechRecognizer;

//! Transcript events emitted by the speech engine.

use serde::{Deserialize, Serialize};

/// A unit of speech-to-text output.
///
/// Either a finalized utterance or an in-progress partial result. The
/// dispatcher only acts on final events unless partial handling is
/// explicitly enabled in the dispatch config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEvent {
    /// Transcribed text, as produced by the engine.
    pub text: String,
    /// Whether this is a partial (not yet finalized) result.
    #[serde(default, alias = "isPartial")]
    pub is_partial: bool,
}

impl TranscriptEvent {
    /// A finalized utterance.
    pub fn final_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_partial: false,
        }
    }

    /// An in-progress partial result.
    pub fn partial(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_partial: true,
        }
    }

    /// True when the text holds nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

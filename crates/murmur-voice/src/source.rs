//! Transcript sources.
//!
//! The listener pulls [`TranscriptEvent`]s from a [`TranscriptSource`]
//! without caring where they come from: a line-oriented text stream
//! (stdin, a pipe, a test buffer) or live audio run through a
//! [`SpeechRecognizer`].

use std::io::BufRead;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tokio::sync::mpsc;
use tracing::trace;

use murmur_types::TranscriptEvent;

use crate::error::VoiceError;
use crate::stt::SpeechRecognizer;

/// An ordered stream of transcript events.
#[async_trait]
pub trait TranscriptSource: Send {
    /// Next event, or `None` once the source is exhausted.
    async fn next_event(&mut self) -> Result<Option<TranscriptEvent>, VoiceError>;
}

/// One final transcript per input line.
pub struct LineTranscripts<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> LineTranscripts<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> TranscriptSource for LineTranscripts<R> {
    async fn next_event(&mut self) -> Result<Option<TranscriptEvent>, VoiceError> {
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| final_line(&l)))
    }
}

const LINE_QUEUE: usize = 16;

/// One final transcript per line, read on a dedicated OS thread.
///
/// A blocking read cannot be interrupted, so the reader thread is never
/// joined. Dropping the source stops listening to it and lets the runtime
/// shut down while the thread is still parked in `read`.
pub struct ThreadedLines {
    lines: mpsc::Receiver<std::io::Result<String>>,
}

impl ThreadedLines {
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Result<Self, VoiceError> {
        let (tx, rx) = mpsc::channel(LINE_QUEUE);
        std::thread::Builder::new()
            .name("murmur-lines".into())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if tx.blocking_send(line).is_err() || failed {
                        break;
                    }
                }
            })?;
        Ok(Self { lines: rx })
    }

    /// Read transcripts from standard input.
    pub fn stdin() -> Result<Self, VoiceError> {
        Self::spawn(std::io::BufReader::new(std::io::stdin()))
    }
}

#[async_trait]
impl TranscriptSource for ThreadedLines {
    async fn next_event(&mut self) -> Result<Option<TranscriptEvent>, VoiceError> {
        match self.lines.recv().await {
            Some(line) => Ok(Some(final_line(&line?))),
            None => Ok(None),
        }
    }
}

fn final_line(line: &str) -> TranscriptEvent {
    TranscriptEvent::final_text(line.trim_end_matches('\r'))
}

/// Audio chunks fed through a recognizer.
///
/// Owns the recognizer: dropping the source releases the speech engine.
pub struct RecognizerTranscripts<S> {
    chunks: mpsc::Receiver<Vec<i16>>,
    recognizer: S,
    finished: bool,
}

impl<S: SpeechRecognizer> RecognizerTranscripts<S> {
    pub fn new(chunks: mpsc::Receiver<Vec<i16>>, recognizer: S) -> Self {
        Self {
            chunks,
            recognizer,
            finished: false,
        }
    }
}

#[async_trait]
impl<S: SpeechRecognizer> TranscriptSource for RecognizerTranscripts<S> {
    async fn next_event(&mut self) -> Result<Option<TranscriptEvent>, VoiceError> {
        if self.finished {
            return Ok(None);
        }
        while let Some(chunk) = self.chunks.recv().await {
            trace!(samples = chunk.len(), "audio chunk");
            if let Some(event) = self.recognizer.accept_waveform(&chunk)? {
                return Ok(Some(event));
            }
        }
        self.finished = true;
        Ok(self.recognizer.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lines_become_final_events() {
        let input: &[u8] = b"hue on\r\n\nkodi pause";
        let mut source = LineTranscripts::new(input);

        assert_eq!(
            source.next_event().await.unwrap(),
            Some(TranscriptEvent::final_text("hue on"))
        );
        assert_eq!(
            source.next_event().await.unwrap(),
            Some(TranscriptEvent::final_text(""))
        );
        assert_eq!(
            source.next_event().await.unwrap(),
            Some(TranscriptEvent::final_text("kodi pause"))
        );
        assert_eq!(source.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn threaded_lines_until_eof() {
        let mut source = ThreadedLines::spawn(&b"hue on\r\nkodi pause\n"[..]).unwrap();
        assert_eq!(
            source.next_event().await.unwrap(),
            Some(TranscriptEvent::final_text("hue on"))
        );
        assert_eq!(
            source.next_event().await.unwrap(),
            Some(TranscriptEvent::final_text("kodi pause"))
        );
        assert_eq!(source.next_event().await.unwrap(), None);
    }

    /// Finalizes "<n> chunks" every time it has seen `every` chunks.
    struct Counting {
        every: usize,
        seen: usize,
        flushed: bool,
    }

    impl SpeechRecognizer for Counting {
        fn accept_waveform(
            &mut self,
            _samples: &[i16],
        ) -> Result<Option<TranscriptEvent>, VoiceError> {
            self.seen += 1;
            Ok((self.seen % self.every == 0)
                .then(|| TranscriptEvent::final_text(format!("{} chunks", self.seen))))
        }

        fn finish(&mut self) -> Option<TranscriptEvent> {
            self.flushed = true;
            Some(TranscriptEvent::final_text("tail"))
        }
    }

    #[tokio::test]
    async fn recognizer_source_emits_then_flushes_once() {
        let (tx, rx) = mpsc::channel(8);
        for _ in 0..5 {
            tx.send(vec![0i16; 160]).await.unwrap();
        }
        drop(tx);

        let mut source = RecognizerTranscripts::new(
            rx,
            Counting {
                every: 2,
                seen: 0,
                flushed: false,
            },
        );
        let mut texts = Vec::new();
        while let Some(event) = source.next_event().await.unwrap() {
            texts.push(event.text);
        }
        assert_eq!(texts, vec!["2 chunks", "4 chunks", "tail"]);
        assert!(source.recognizer.flushed);
        assert_eq!(source.next_event().await.unwrap(), None);
    }

    struct Broken;

    impl SpeechRecognizer for Broken {
        fn accept_waveform(
            &mut self,
            _samples: &[i16],
        ) -> Result<Option<TranscriptEvent>, VoiceError> {
            Err(VoiceError::Decode("bad audio".into()))
        }

        fn finish(&mut self) -> Option<TranscriptEvent> {
            None
        }
    }

    #[tokio::test]
    async fn recognizer_errors_propagate() {
        let (tx, rx) = mpsc::channel(1);
        tx.send(vec![1]).await.unwrap();
        let mut source = RecognizerTranscripts::new(rx, Broken);
        assert!(matches!(
            source.next_event().await,
            Err(VoiceError::Decode(_))
        ));
    }
}

//! The listen loop.
//!
//! Pulls events from a [`TranscriptSource`] and hands each one to the
//! dispatcher on its own task, so a slow external program never holds up
//! recognition of the next utterance. The loop ends when the source is
//! exhausted or the [`CancellationToken`] fires. The source (with any speech
//! engine it owns) is dropped first; in-flight dispatches then get a short
//! grace period and are detached if still running when it expires.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use murmur_core::{DispatchOutcome, Dispatcher};

use crate::error::VoiceError;
use crate::source::TranscriptSource;

/// What the listener is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerStatus {
    Idle,
    Listening,
    Draining,
}

impl fmt::Display for ListenerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Listening => write!(f, "listening"),
            Self::Draining => write!(f, "draining"),
        }
    }
}

/// Counters for one [`Listener::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenStats {
    /// Events received from the source.
    pub transcripts: usize,
    /// Dispatches that ran a program, whatever its exit status.
    pub executed: usize,
    /// Dispatches that matched nothing.
    pub unmatched: usize,
    /// Dispatches whose program could not be run.
    pub failed: usize,
    /// Partial or blank events.
    pub ignored: usize,
    /// Dispatches still running when the drain grace period ran out.
    pub abandoned: usize,
}

impl ListenStats {
    fn record(&mut self, outcome: &DispatchOutcome) {
        match outcome {
            DispatchOutcome::Executed { .. } => self.executed += 1,
            DispatchOutcome::NoMatch { .. } => self.unmatched += 1,
            DispatchOutcome::Failed { .. } => self.failed += 1,
            DispatchOutcome::Ignored(_) => self.ignored += 1,
        }
    }
}

/// How long [`Listener::run`] waits for in-flight dispatches after the loop ends.
pub const DEFAULT_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Drives a transcript source into a dispatcher.
pub struct Listener {
    dispatcher: Arc<Dispatcher>,
    cancel: CancellationToken,
    status: ListenerStatus,
    drain_grace: Duration,
}

impl Listener {
    pub fn new(dispatcher: Arc<Dispatcher>, cancel: CancellationToken) -> Self {
        Self {
            dispatcher,
            cancel,
            status: ListenerStatus::Idle,
            drain_grace: DEFAULT_DRAIN_GRACE,
        }
    }

    /// Override how long to wait for in-flight dispatches on shutdown.
    pub fn with_drain_grace(mut self, grace: Duration) -> Self {
        self.drain_grace = grace;
        self
    }

    pub fn status(&self) -> ListenerStatus {
        self.status
    }

    fn set_status(&mut self, status: ListenerStatus) {
        if self.status != status {
            debug!(from = %self.status, to = %status, "listener status");
            self.status = status;
        }
    }

    /// Run until `source` ends or the token is cancelled.
    ///
    /// A source error stops the loop and is returned after the drain.
    /// Dispatches that outlive the grace period are detached, not awaited.
    pub async fn run<S: TranscriptSource>(&mut self, mut source: S) -> Result<ListenStats, VoiceError> {
        let mut stats = ListenStats::default();
        let mut tasks: JoinSet<DispatchOutcome> = JoinSet::new();
        let mut result = Ok(());

        self.set_status(ListenerStatus::Listening);
        info!("listening");

        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("listener cancelled");
                    break;
                }
                next = source.next_event() => next,
            };

            match next {
                Ok(Some(event)) => {
                    stats.transcripts += 1;
                    if event.is_blank() {
                        stats.ignored += 1;
                        continue;
                    }
                    info!(text = %event.text, partial = event.is_partial, "heard");
                    let dispatcher = self.dispatcher.clone();
                    tasks.spawn(async move { dispatcher.dispatch(&event).await });
                }
                Ok(None) => {
                    debug!("transcript source exhausted");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "transcript source failed");
                    result = Err(e);
                    break;
                }
            }

            while let Some(done) = tasks.try_join_next() {
                record_join(&mut stats, done);
            }
        }

        self.set_status(ListenerStatus::Draining);
        drop(source);
        let grace = tokio::time::sleep(self.drain_grace);
        tokio::pin!(grace);
        loop {
            tokio::select! {
                done = tasks.join_next() => match done {
                    Some(done) => record_join(&mut stats, done),
                    None => break,
                },
                _ = &mut grace => {
                    stats.abandoned = tasks.len();
                    warn!(
                        abandoned = stats.abandoned,
                        "commands still running after shutdown grace, not waiting"
                    );
                    tasks.detach_all();
                    break;
                }
            }
        }
        self.set_status(ListenerStatus::Idle);

        info!(
            transcripts = stats.transcripts,
            executed = stats.executed,
            unmatched = stats.unmatched,
            failed = stats.failed,
            abandoned = stats.abandoned,
            "listener stopped"
        );
        result.map(|()| stats)
    }
}

fn record_join(stats: &mut ListenStats, done: Result<DispatchOutcome, tokio::task::JoinError>) {
    match done {
        Ok(outcome) => stats.record(&outcome),
        Err(e) => {
            warn!(error = %e, "dispatch task did not complete");
            stats.failed += 1;
        }
    }
}

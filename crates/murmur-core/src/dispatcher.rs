//! Transcript dispatch.
//!
//! [`Dispatcher::dispatch`] walks the registry tree for one transcript:
//!
//! 1. Partial transcripts are ignored unless `partial_results` is set.
//! 2. At a keyword level the input is split into `(keyword, remainder)`; at
//!    an utterance level the whole input is matched and passed on whole.
//! 3. The best-scoring alias must reach `threshold` or the walk stops with
//!    [`DispatchOutcome::NoMatch`].
//! 4. Nested registries repeat the walk; actions run through the
//!    [`ProcessSpawner`], at most once per transcript.
//!
//! Resolution is pure ([`Dispatcher::route`], [`Dispatcher::explain`]); only
//! execution has side effects.

use std::sync::Arc;

use tracing::{debug, info, warn};

use murmur_platform::{ProcessError, ProcessOutput, ProcessSpawner};
use murmur_types::config::DispatchConfig;
use murmur_types::{ActionInvocation, TranscriptEvent};

use crate::decompose::decompose;
use crate::fuzzy::{MatchOptions, MatchResult};
use crate::registry::{Handler, MatchMode, Registry};

/// Why a transcript was dropped before matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Nothing but whitespace.
    Empty,
    /// An in-progress result while partial dispatch is disabled.
    Partial,
}

/// Pure result of walking the tree for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// A terminal action was selected.
    Invoke {
        /// Matched alias at each level, outermost first.
        path: Vec<String>,
        invocation: ActionInvocation,
    },
    /// Empty input.
    Empty,
    /// No alias reached the threshold at `level`.
    NoMatch {
        /// Registry (or parameter node) where matching stopped.
        level: String,
        /// Best candidate there, if the level had any input to score.
        best: Option<MatchResult>,
        /// Aliases matched before the failing level.
        path: Vec<String>,
    },
}

/// Scores computed at one level of a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelScores {
    /// Registry or parameter node name.
    pub level: String,
    /// Text scored at this level.
    pub query: String,
    /// Every candidate, best first.
    pub ranked: Vec<MatchResult>,
}

/// What happened to one transcript.
#[derive(Debug)]
pub enum DispatchOutcome {
    Ignored(IgnoreReason),
    NoMatch {
        level: String,
        best: Option<MatchResult>,
    },
    /// The action ran. The exit status may still be non-zero.
    Executed {
        path: Vec<String>,
        invocation: ActionInvocation,
        output: ProcessOutput,
    },
    /// The action was selected but could not be run.
    Failed {
        path: Vec<String>,
        invocation: ActionInvocation,
        error: ProcessError,
    },
}

impl DispatchOutcome {
    /// True if an external program was started and exited 0.
    pub fn succeeded(&self) -> bool {
        matches!(self, DispatchOutcome::Executed { output, .. } if output.success())
    }

    /// The invocation that was run or attempted, if any.
    pub fn invocation(&self) -> Option<&ActionInvocation> {
        match self {
            DispatchOutcome::Executed { invocation, .. }
            | DispatchOutcome::Failed { invocation, .. } => Some(invocation),
            DispatchOutcome::Ignored(_) | DispatchOutcome::NoMatch { .. } => None,
        }
    }
}

/// Routes transcripts through a registry tree and runs the selected action.
///
/// Cheap to share: the registry and spawner are reference counted, and
/// `dispatch` takes `&self`, so one dispatcher can serve concurrent
/// transcripts.
pub struct Dispatcher {
    registry: Arc<Registry>,
    spawner: Arc<dyn ProcessSpawner>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<Registry>,
        spawner: Arc<dyn ProcessSpawner>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            registry,
            spawner,
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    fn options(&self) -> MatchOptions {
        MatchOptions {
            fold_case: self.config.case_insensitive,
        }
    }

    /// Dispatch one transcript event.
    pub async fn dispatch(&self, event: &TranscriptEvent) -> DispatchOutcome {
        if event.is_partial && !self.config.partial_results {
            debug!(text = %event.text, "ignoring partial transcript");
            return DispatchOutcome::Ignored(IgnoreReason::Partial);
        }
        self.dispatch_text(&event.text).await
    }

    /// Dispatch raw text, as if it were a final transcript.
    pub async fn dispatch_text(&self, text: &str) -> DispatchOutcome {
        match self.route(text) {
            Route::Empty => DispatchOutcome::Ignored(IgnoreReason::Empty),
            Route::NoMatch { level, best, .. } => {
                debug!(
                    text,
                    registry = %level,
                    best = ?best.as_ref().map(|b| (&b.candidate, b.score)),
                    "no command matched"
                );
                DispatchOutcome::NoMatch { level, best }
            }
            Route::Invoke { path, invocation } => self.execute(path, invocation).await,
        }
    }

    /// Walk the tree for `text` without running anything.
    pub fn route(&self, text: &str) -> Route {
        self.walk(text, |level, query, ranked| self.log_scores(level, query, ranked))
    }

    /// Walk the tree for `text` and return the scores seen at each level,
    /// outermost first, alongside the resulting route.
    pub fn explain(&self, text: &str) -> (Route, Vec<LevelScores>) {
        let mut levels = Vec::new();
        let route = self.walk(text, |level, query, ranked| {
            levels.push(LevelScores {
                level: level.to_string(),
                query: query.to_string(),
                ranked: ranked.to_vec(),
            });
        });
        (route, levels)
    }

    fn walk<F>(&self, text: &str, mut observe: F) -> Route
    where
        F: FnMut(&str, &str, &[MatchResult]),
    {
        let options = self.options();
        let mut registry: &Registry = &self.registry;
        let mut input = text;
        let mut path = Vec::new();

        loop {
            let (query, passed_on) = match registry.mode() {
                MatchMode::Keyword => match decompose(input) {
                    Some(d) => (d.keyword, d.remainder),
                    None if path.is_empty() => return Route::Empty,
                    None => return no_match(registry.name(), None, path),
                },
                MatchMode::Utterance => {
                    if input.trim().is_empty() {
                        if path.is_empty() {
                            return Route::Empty;
                        }
                        return no_match(registry.name(), None, path);
                    }
                    (input, input)
                }
            };

            let ranked = registry.resolve(query, options);
            observe(registry.name(), query, &ranked);

            let Some(best) = ranked.into_iter().next() else {
                return no_match(registry.name(), None, path);
            };
            if best.score < self.config.threshold {
                return no_match(registry.name(), Some(best), path);
            }
            let Some(node) = registry.lookup(&best.candidate) else {
                return no_match(registry.name(), Some(best), path);
            };
            path.push(best.candidate);

            match node.handler() {
                Handler::Registry(child) => {
                    registry = child;
                    input = passed_on;
                }
                Handler::Action(invocation) => {
                    return Route::Invoke {
                        path,
                        invocation: invocation.clone(),
                    };
                }
                Handler::Parameter(action) => {
                    let ranked = action.resolve(passed_on, options);
                    observe(node.name(), passed_on, &ranked);
                    return match ranked.into_iter().next() {
                        Some(best) if best.score >= self.config.threshold => {
                            let invocation = action.base.with_arg(best.candidate.as_str());
                            path.push(best.candidate);
                            Route::Invoke { path, invocation }
                        }
                        best => no_match(node.name(), best, path),
                    };
                }
            }
        }
    }

    async fn execute(&self, path: Vec<String>, invocation: ActionInvocation) -> DispatchOutcome {
        info!(command = %invocation, path = ?path, "running command");
        match self.spawner.execute(&invocation).await {
            Ok(output) => {
                if output.success() {
                    debug!(command = %invocation, stdout = %output.stdout.trim_end(), "command finished");
                } else {
                    warn!(
                        command = %invocation,
                        exit_code = ?output.exit_code,
                        stderr = %output.stderr.trim_end(),
                        "command exited with failure status"
                    );
                }
                DispatchOutcome::Executed {
                    path,
                    invocation,
                    output,
                }
            }
            Err(error) => {
                warn!(command = %invocation, error = %error, "command could not be run");
                DispatchOutcome::Failed {
                    path,
                    invocation,
                    error,
                }
            }
        }
    }

    /// Log scores above the diagnostic floor. Never affects selection.
    fn log_scores(&self, level: &str, query: &str, ranked: &[MatchResult]) {
        let shown = diagnostic_scores(ranked, self.config.diagnostic_threshold);
        debug!(registry = level, query, scores = ?shown, "match scores");
    }
}

/// Scores worth logging: strictly above `floor`, best first.
fn diagnostic_scores(ranked: &[MatchResult], floor: u8) -> Vec<(&str, u8)> {
    ranked
        .iter()
        .filter(|r| r.score > floor)
        .map(|r| (r.candidate.as_str(), r.score))
        .collect()
}

fn no_match(level: &str, best: Option<MatchResult>, path: Vec<String>) -> Route {
    Route::NoMatch {
        level: level.to_string(),
        best,
        path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_platform::RecordingSpawner;
    use murmur_types::config::Config;

    use crate::catalog::build_registry;

    fn dispatcher_with(config: Config) -> (Dispatcher, Arc<RecordingSpawner>) {
        let registry = Arc::new(build_registry(&config).unwrap());
        let spawner = Arc::new(RecordingSpawner::new());
        let dispatcher = Dispatcher::new(registry, spawner.clone(), config.dispatch);
        (dispatcher, spawner)
    }

    fn dispatcher() -> (Dispatcher, Arc<RecordingSpawner>) {
        dispatcher_with(Config::default())
    }

    fn scored(candidate: &str, score: u8) -> MatchResult {
        MatchResult {
            candidate: candidate.into(),
            score,
        }
    }

    #[test]
    fn diagnostic_floor_is_strict() {
        let ranked = [scored("hue", 100), scored("kodi", 26), scored("cody", 25), scored("lights", 0)];
        assert_eq!(diagnostic_scores(&ranked, 25), vec![("hue", 100), ("kodi", 26)]);
        assert_eq!(diagnostic_scores(&ranked, 100), Vec::<(&str, u8)>::new());
        assert_eq!(diagnostic_scores(&ranked, 0).len(), 3);
    }

    #[test]
    fn route_hue_on() {
        let (d, _) = dispatcher();
        let Route::Invoke { path, invocation } = d.route("hue on") else {
            panic!("expected an invocation");
        };
        assert_eq!(path, vec!["hue", "on"]);
        assert_eq!(invocation.to_string(), "hue lights 2 on");
    }

    #[test]
    fn route_uses_whole_remainder_at_domain_level() {
        let (d, _) = dispatcher();
        let Route::Invoke { path, invocation } = d.route("hue lights off") else {
            panic!("expected an invocation");
        };
        assert_eq!(path, vec!["hue", "off"]);
        assert_eq!(invocation.to_string(), "hue lights 2 off");
    }

    #[test]
    fn route_color_parameter() {
        let (d, _) = dispatcher();
        let Route::Invoke { path, invocation } = d.route("lights color blue") else {
            panic!("expected an invocation");
        };
        assert_eq!(path, vec!["lights", "color", "blue"]);
        assert_eq!(invocation.to_string(), "hue lights 2 blue");
    }

    #[test]
    fn route_color_without_known_colour_is_no_match() {
        let (d, _) = dispatcher();
        match d.route("hue color purple") {
            Route::NoMatch { level, path, .. } => {
                assert_eq!(level, "color");
                assert_eq!(path, vec!["hue", "color"]);
            }
            other => panic!("unexpected route: {other:?}"),
        }
    }

    #[test]
    fn route_unknown_keyword() {
        let (d, _) = dispatcher();
        match d.route("weather tomorrow") {
            Route::NoMatch { level, best, path } => {
                assert_eq!(level, "domains");
                assert!(best.unwrap().score < 75);
                assert!(path.is_empty());
            }
            other => panic!("unexpected route: {other:?}"),
        }
    }

    #[test]
    fn route_keyword_without_remainder() {
        let (d, _) = dispatcher();
        assert_eq!(
            d.route("kodi"),
            Route::NoMatch {
                level: "media".into(),
                best: None,
                path: vec!["kodi".into()],
            }
        );
    }

    #[test]
    fn route_empty() {
        let (d, _) = dispatcher();
        assert_eq!(d.route(""), Route::Empty);
        assert_eq!(d.route("  \t "), Route::Empty);
    }

    #[test]
    fn route_is_case_sensitive_by_default() {
        let (d, _) = dispatcher();
        assert!(matches!(d.route("HUE ON"), Route::NoMatch { .. }));

        let mut config = Config::default();
        config.dispatch.case_insensitive = true;
        let (d, _) = dispatcher_with(config);
        let Route::Invoke { path, .. } = d.route("HUE ON") else {
            panic!("expected an invocation");
        };
        assert_eq!(path, vec!["hue", "on"]);
    }

    #[test]
    fn threshold_is_configurable() {
        // "kody" scores exactly 75 against "kodi"
        let (d, _) = dispatcher();
        let Route::Invoke { invocation, .. } = d.route("kody pause") else {
            panic!("expected an invocation");
        };
        assert_eq!(invocation.program, "kodi-cli");

        let mut config = Config::default();
        config.dispatch.threshold = 80;
        let (d, _) = dispatcher_with(config);
        match d.route("kody pause") {
            Route::NoMatch { level, best, .. } => {
                assert_eq!(level, "domains");
                assert_eq!(best.unwrap().score, 75);
            }
            other => panic!("unexpected route: {other:?}"),
        }
    }

    #[test]
    fn explain_reports_every_level() {
        let (d, spawner) = dispatcher();
        let (route, levels) = d.explain("hue color blue");
        assert!(matches!(route, Route::Invoke { .. }));
        let seen: Vec<(&str, &str)> = levels
            .iter()
            .map(|l| (l.level.as_str(), l.query.as_str()))
            .collect();
        assert_eq!(
            seen,
            vec![("domains", "hue"), ("lights", "color blue"), ("color", "color blue")]
        );
        assert_eq!(levels[2].ranked[0].candidate, "blue");
        assert!(spawner.calls().is_empty());
    }

    #[test]
    fn explain_stops_at_failing_level() {
        let (d, _) = dispatcher();
        let (route, levels) = d.explain("weather tomorrow");
        assert!(matches!(route, Route::NoMatch { .. }));
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].ranked.len(), 4);
    }

    #[tokio::test]
    async fn dispatch_runs_once() {
        let (d, spawner) = dispatcher();
        let outcome = d.dispatch(&TranscriptEvent::final_text("kodi pause")).await;
        assert!(outcome.succeeded());
        assert_eq!(outcome.invocation().unwrap().to_string(), "kodi-cli -p");
        assert_eq!(spawner.calls().len(), 1);
    }

    #[tokio::test]
    async fn partial_events_are_ignored_by_default() {
        let (d, spawner) = dispatcher();
        let outcome = d.dispatch(&TranscriptEvent::partial("hue on")).await;
        assert!(matches!(
            outcome,
            DispatchOutcome::Ignored(IgnoreReason::Partial)
        ));
        assert!(spawner.calls().is_empty());
    }

    #[tokio::test]
    async fn partial_events_dispatch_when_enabled() {
        let mut config = Config::default();
        config.dispatch.partial_results = true;
        let (d, spawner) = dispatcher_with(config);
        let outcome = d.dispatch(&TranscriptEvent::partial("hue on")).await;
        assert!(outcome.succeeded());
        assert_eq!(spawner.calls().len(), 1);
    }

    #[tokio::test]
    async fn spawn_failure_is_reported_not_raised() {
        let config = Config::default();
        let registry = Arc::new(build_registry(&config).unwrap());
        let spawner = Arc::new(RecordingSpawner::new().missing("hue"));
        let d = Dispatcher::new(registry, spawner.clone(), config.dispatch);

        let outcome = d.dispatch_text("hue off").await;
        match outcome {
            DispatchOutcome::Failed { path, error, .. } => {
                assert_eq!(path, vec!["hue", "off"]);
                assert!(matches!(error, ProcessError::Spawn { .. }));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(spawner.calls().len(), 1);
    }

    #[tokio::test]
    async fn empty_text_is_ignored() {
        let (d, spawner) = dispatcher();
        let outcome = d.dispatch(&TranscriptEvent::final_text("")).await;
        assert!(matches!(outcome, DispatchOutcome::Ignored(IgnoreReason::Empty)));
        assert!(outcome.invocation().is_none());
        assert!(spawner.calls().is_empty());
    }
}

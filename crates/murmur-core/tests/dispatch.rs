//! End-to-end dispatch scenarios against the built-in command tree.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use murmur_core::{
    DispatchOutcome, Dispatcher, Handler, IgnoreReason, MatchMode, Registry, build_registry,
};
use murmur_platform::{ProcessError, ProcessOutput, ProcessSpawner, RecordingSpawner};
use murmur_types::config::{Config, DispatchConfig};
use murmur_types::{ActionInvocation, TranscriptEvent};

fn default_dispatcher() -> (Dispatcher, Arc<RecordingSpawner>) {
    let config = Config::default();
    let registry = Arc::new(build_registry(&config).unwrap());
    let spawner = Arc::new(RecordingSpawner::new());
    (
        Dispatcher::new(registry, spawner.clone(), config.dispatch),
        spawner,
    )
}

fn invoked(spawner: &RecordingSpawner) -> Vec<String> {
    spawner.calls().iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn hue_on_switches_light_two_on() {
    let (dispatcher, spawner) = default_dispatcher();
    let outcome = dispatcher
        .dispatch(&TranscriptEvent::final_text("hue on"))
        .await;
    assert!(outcome.succeeded());
    assert_eq!(invoked(&spawner), vec!["hue lights 2 on"]);
}

#[tokio::test]
async fn lights_alias_reaches_the_same_domain() {
    let (dispatcher, spawner) = default_dispatcher();
    dispatcher
        .dispatch(&TranscriptEvent::final_text("lights off"))
        .await;
    assert_eq!(invoked(&spawner), vec!["hue lights 2 off"]);
}

#[tokio::test]
async fn extra_words_do_not_hide_the_action() {
    let (dispatcher, spawner) = default_dispatcher();
    dispatcher
        .dispatch(&TranscriptEvent::final_text("hue lights off"))
        .await;
    assert_eq!(invoked(&spawner), vec!["hue lights 2 off"]);
}

#[tokio::test]
async fn kodi_pause_and_misheard_variants() {
    let (dispatcher, spawner) = default_dispatcher();
    for text in ["kodi pause", "cody pause", "kodi pose"] {
        dispatcher
            .dispatch(&TranscriptEvent::final_text(text))
            .await;
    }
    assert_eq!(
        invoked(&spawner),
        vec!["kodi-cli -p", "kodi-cli -p", "kodi-cli -p"]
    );
}

#[tokio::test]
async fn colour_change() {
    let (dispatcher, spawner) = default_dispatcher();
    dispatcher
        .dispatch(&TranscriptEvent::final_text("hue color red"))
        .await;
    dispatcher
        .dispatch(&TranscriptEvent::final_text("lights color white"))
        .await;
    assert_eq!(invoked(&spawner), vec!["hue lights 2 red", "hue lights 2 white"]);
}

#[tokio::test]
async fn unknown_keyword_runs_nothing() {
    let (dispatcher, spawner) = default_dispatcher();
    let outcome = dispatcher
        .dispatch(&TranscriptEvent::final_text("weather tomorrow"))
        .await;
    match outcome {
        DispatchOutcome::NoMatch { level, best } => {
            assert_eq!(level, "domains");
            assert_eq!(best.unwrap().candidate, "hue");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(spawner.calls().is_empty());
}

#[tokio::test]
async fn known_keyword_unknown_action_runs_nothing() {
    let (dispatcher, spawner) = default_dispatcher();
    let outcome = dispatcher
        .dispatch(&TranscriptEvent::final_text("kodi rewind"))
        .await;
    assert!(matches!(outcome, DispatchOutcome::NoMatch { ref level, .. } if level == "media"));
    assert!(spawner.calls().is_empty());
}

#[tokio::test]
async fn empty_transcript_is_ignored() {
    let (dispatcher, spawner) = default_dispatcher();
    for text in ["", "   "] {
        let outcome = dispatcher
            .dispatch(&TranscriptEvent::final_text(text))
            .await;
        assert!(matches!(outcome, DispatchOutcome::Ignored(IgnoreReason::Empty)));
    }
    assert!(spawner.calls().is_empty());
}

#[tokio::test]
async fn disabled_domain_never_fires() {
    let mut config = Config::default();
    config.hue.enabled = false;
    let registry = Arc::new(build_registry(&config).unwrap());
    let spawner = Arc::new(RecordingSpawner::new());
    let dispatcher = Dispatcher::new(registry, spawner.clone(), config.dispatch);

    dispatcher
        .dispatch(&TranscriptEvent::final_text("hue on"))
        .await;
    dispatcher
        .dispatch(&TranscriptEvent::final_text("kodi pause"))
        .await;
    assert_eq!(invoked(&spawner), vec!["kodi-cli -p"]);
}

#[tokio::test]
async fn diagnostic_threshold_only_shapes_logs() {
    let mut config = Config::default();
    config.dispatch.diagnostic_threshold = 100;
    let registry = Arc::new(build_registry(&config).unwrap());
    let spawner = Arc::new(RecordingSpawner::new());
    let dispatcher = Dispatcher::new(registry, spawner.clone(), config.dispatch);

    let outcome = dispatcher
        .dispatch(&TranscriptEvent::final_text("hue on"))
        .await;
    assert!(outcome.succeeded());

    // "kody" scores 75 against "kodi": at the dispatch threshold, below the floor.
    let outcome = dispatcher
        .dispatch(&TranscriptEvent::final_text("kody pause"))
        .await;
    assert!(outcome.succeeded());
    assert_eq!(invoked(&spawner), vec!["hue lights 2 on", "kodi-cli -p"]);
}

/// Spawner that reports a failing exit status and counts calls.
struct FailingSpawner {
    calls: AtomicUsize,
}

#[async_trait]
impl ProcessSpawner for FailingSpawner {
    async fn execute(&self, _invocation: &ActionInvocation) -> Result<ProcessOutput, ProcessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProcessOutput {
            exit_code: Some(1),
            stdout: String::new(),
            stderr: "bridge unreachable".into(),
        })
    }
}

#[tokio::test]
async fn failing_exit_status_is_reported_once() {
    let config = Config::default();
    let registry = Arc::new(build_registry(&config).unwrap());
    let spawner = Arc::new(FailingSpawner {
        calls: AtomicUsize::new(0),
    });
    let dispatcher = Dispatcher::new(registry, spawner.clone(), config.dispatch);

    let outcome = dispatcher
        .dispatch(&TranscriptEvent::final_text("hue off"))
        .await;
    match &outcome {
        DispatchOutcome::Executed { output, .. } => {
            assert_eq!(output.exit_code, Some(1));
            assert_eq!(output.stderr, "bridge unreachable");
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!outcome.succeeded());
    assert_eq!(spawner.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn custom_registry_three_levels_deep() {
    let scenes = Registry::builder("scenes", MatchMode::Utterance)
        .node(
            "movie",
            ["movie night"],
            Handler::Action(ActionInvocation::new("scene", ["movie"])),
        )
        .build()
        .unwrap();
    let living = Registry::builder("rooms", MatchMode::Keyword)
        .node("living", ["living"], Handler::Registry(scenes))
        .build()
        .unwrap();
    let root = Registry::builder("root", MatchMode::Keyword)
        .node("house", ["house", "home"], Handler::Registry(living))
        .build()
        .unwrap();
    assert_eq!(root.depth(), 3);

    let spawner = Arc::new(RecordingSpawner::new());
    let dispatcher = Dispatcher::new(Arc::new(root), spawner.clone(), DispatchConfig::default());

    let outcome = dispatcher.dispatch_text("home living movie night").await;
    match outcome {
        DispatchOutcome::Executed { path, .. } => {
            assert_eq!(path, vec!["home", "living", "movie night"]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(invoked(&spawner), vec!["scene movie"]);
}

#[tokio::test]
async fn concurrent_dispatches_each_run_once() {
    let (dispatcher, spawner) = default_dispatcher();
    let dispatcher = Arc::new(dispatcher);

    let mut handles = Vec::new();
    for text in ["hue on", "kodi pause", "hue off", "weather"] {
        let d = dispatcher.clone();
        handles.push(tokio::spawn(async move {
            d.dispatch(&TranscriptEvent::final_text(text)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut calls = invoked(&spawner);
    calls.sort();
    assert_eq!(calls, vec!["hue lights 2 off", "hue lights 2 on", "kodi-cli -p"]);
}

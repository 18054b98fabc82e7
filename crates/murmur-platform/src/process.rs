//! Process spawning: the command execution port.
//!
//! Terminal actions in the dispatch tree never touch `tokio::process`
//! directly; they go through the [`ProcessSpawner`] trait. The native
//! implementation spawns a real child process, while [`RecordingSpawner`]
//! records invocations without side effects (tests, `--dry-run`).
//!
//! The exit status of a child is reported in [`ProcessOutput`] but is never
//! turned into an error here. Only failing to start, a timeout, or an
//! explicit cancellation produce a [`ProcessError`].

use std::collections::HashMap;
use std::process::{ExitStatus, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use murmur_types::ActionInvocation;

/// Result of running an external process to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured standard output, fragments concatenated in arrival order.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ProcessOutput {
    /// Output of a process that exited 0 after printing `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// True if the process exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Failure to run an external process.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The program could not be started (not found, not executable, ...).
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the process or reading its pipes failed.
    #[error("i/o error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exceeded the configured timeout and was killed.
    #[error("process '{program}' timed out after {secs}s")]
    TimedOut { program: String, secs: u64 },

    /// The kill handle was triggered before the process exited.
    #[error("process '{program}' was cancelled")]
    Cancelled { program: String },
}

/// Runs external programs and captures their output.
///
/// This is the single capability terminal actions depend on.
#[async_trait]
pub trait ProcessSpawner: Send + Sync {
    /// Run `invocation` to completion and capture its output.
    async fn execute(&self, invocation: &ActionInvocation) -> Result<ProcessOutput, ProcessError>;
}

// ── Native ───────────────────────────────────────────────────────────────

/// Native process spawner using [`tokio::process`].
#[derive(Debug, Clone, Default)]
pub struct NativeProcessSpawner {
    timeout: Option<Duration>,
}

impl NativeProcessSpawner {
    /// Spawner without a timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawner that kills children after `secs` seconds, if set.
    pub fn with_timeout(secs: Option<u64>) -> Self {
        Self {
            timeout: secs.map(Duration::from_secs),
        }
    }

    /// Start `invocation` and return a handle to the running process.
    ///
    /// The handle exposes the OS process id and a kill token; call
    /// [`SpawnedProcess::wait`] to collect the output. Dropping the handle
    /// without waiting kills the child.
    pub fn spawn(&self, invocation: &ActionInvocation) -> Result<SpawnedProcess, ProcessError> {
        let mut cmd = tokio::process::Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let pid = child.id();
        debug!(program = %invocation.program, ?pid, "spawned process");

        let stdout = child.stdout.take().map(|pipe| tokio::spawn(collect(pipe)));
        let stderr = child.stderr.take().map(|pipe| tokio::spawn(collect(pipe)));

        Ok(SpawnedProcess {
            program: invocation.program.clone(),
            pid,
            child,
            stdout,
            stderr,
            cancel: CancellationToken::new(),
            timeout: self.timeout,
        })
    }
}

#[async_trait]
impl ProcessSpawner for NativeProcessSpawner {
    async fn execute(&self, invocation: &ActionInvocation) -> Result<ProcessOutput, ProcessError> {
        self.spawn(invocation)?.wait().await
    }
}

/// A running child process.
///
/// [`wait`](Self::wait) consumes the handle, so the result resolves
/// exactly once no matter how much output the child produces.
pub struct SpawnedProcess {
    program: String,
    pid: Option<u32>,
    child: Child,
    stdout: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    stderr: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    cancel: CancellationToken,
    timeout: Option<Duration>,
}

enum Exit {
    Status(std::io::Result<ExitStatus>),
    Cancelled,
    TimedOut,
}

impl SpawnedProcess {
    /// OS process id, if the process has not already been reaped.
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    /// Token that terminates the process when cancelled.
    pub fn kill_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the process to exit and collect its output.
    pub async fn wait(mut self) -> Result<ProcessOutput, ProcessError> {
        let exit = tokio::select! {
            status = self.child.wait() => Exit::Status(status),
            _ = self.cancel.cancelled() => Exit::Cancelled,
            _ = deadline(self.timeout) => Exit::TimedOut,
        };

        let status = match exit {
            Exit::Status(status) => status.map_err(|source| ProcessError::Io {
                program: self.program.clone(),
                source,
            })?,
            Exit::Cancelled => {
                self.terminate().await;
                return Err(ProcessError::Cancelled {
                    program: self.program,
                });
            }
            Exit::TimedOut => {
                self.terminate().await;
                return Err(ProcessError::TimedOut {
                    secs: self.timeout.map(|t| t.as_secs()).unwrap_or_default(),
                    program: self.program,
                });
            }
        };

        let stdout = join_pipe(&self.program, self.stdout.take()).await?;
        let stderr = join_pipe(&self.program, self.stderr.take()).await?;

        Ok(ProcessOutput {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }

    async fn terminate(&mut self) {
        if let Err(e) = self.child.kill().await {
            debug!(program = %self.program, error = %e, "kill failed (already exited?)");
        }
        for pipe in [self.stdout.take(), self.stderr.take()].into_iter().flatten() {
            pipe.abort();
        }
    }
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(t) => tokio::time::sleep(t).await,
        None => std::future::pending().await,
    }
}

/// Drain a pipe, appending each fragment as it arrives.
async fn collect<R: AsyncRead + Unpin>(mut pipe: R) -> std::io::Result<Vec<u8>> {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = pipe.read(&mut buf).await?;
        if n == 0 {
            return Ok(data);
        }
        data.extend_from_slice(&buf[..n]);
    }
}

async fn join_pipe(
    program: &str,
    handle: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
) -> Result<String, ProcessError> {
    let Some(handle) = handle else {
        return Ok(String::new());
    };
    let bytes = handle
        .await
        .map_err(std::io::Error::other)
        .and_then(|r| r)
        .map_err(|source| ProcessError::Io {
            program: program.to_string(),
            source,
        })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

// ── Recording ────────────────────────────────────────────────────────────

/// Spawner that records invocations instead of running them.
///
/// Returns an empty successful output by default; canned stdout can be
/// configured per program, and programs can be marked as missing to
/// simulate a spawn failure.
#[derive(Default)]
pub struct RecordingSpawner {
    calls: Mutex<Vec<ActionInvocation>>,
    responses: HashMap<String, String>,
    missing: Vec<String>,
}

impl RecordingSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `stdout` whenever `program` is invoked.
    pub fn respond(mut self, program: &str, stdout: &str) -> Self {
        self.responses.insert(program.to_string(), stdout.to_string());
        self
    }

    /// Fail to spawn `program`, as if it were not installed.
    pub fn missing(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    /// All invocations seen so far, in call order.
    pub fn calls(&self) -> Vec<ActionInvocation> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ProcessSpawner for RecordingSpawner {
    async fn execute(&self, invocation: &ActionInvocation) -> Result<ProcessOutput, ProcessError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(invocation.clone());

        if self.missing.contains(&invocation.program) {
            return Err(ProcessError::Spawn {
                program: invocation.program.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
            });
        }

        let stdout = self
            .responses
            .get(&invocation.program)
            .cloned()
            .unwrap_or_default();
        Ok(ProcessOutput::ok(stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inv(program: &str, args: &[&str]) -> ActionInvocation {
        ActionInvocation::new(program, args.iter().copied())
    }

    #[tokio::test]
    async fn test_run_echo() {
        let spawner = NativeProcessSpawner::new();
        let output = spawner.execute(&inv("echo", &["hello", "world"])).await.unwrap();

        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello world");
        assert!(output.stderr.is_empty());
    }

    #[tokio::test]
    async fn test_fragments_concatenated_in_order() {
        let spawner = NativeProcessSpawner::new();
        let script = "printf one; sleep 0.05; printf two; sleep 0.05; printf three";
        let output = spawner.execute(&inv("sh", &["-c", script])).await.unwrap();
        assert_eq!(output.stdout, "onetwothree");
    }

    #[tokio::test]
    async fn test_large_output_resolves() {
        let spawner = NativeProcessSpawner::new();
        let output = spawner
            .execute(&inv("sh", &["-c", "yes murmur | head -n 50000"]))
            .await
            .unwrap();
        assert_eq!(output.stdout.lines().count(), 50000);
    }

    #[tokio::test]
    async fn test_nonexistent_command_is_spawn_error() {
        let spawner = NativeProcessSpawner::new();
        let err = spawner
            .execute(&inv("murmur_nonexistent_command_xyz", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_an_error() {
        let spawner = NativeProcessSpawner::new();
        let output = spawner.execute(&inv("sh", &["-c", "exit 42"])).await.unwrap();
        assert_eq!(output.exit_code, Some(42));
        assert!(!output.success());
    }

    #[tokio::test]
    async fn test_captures_stderr() {
        let spawner = NativeProcessSpawner::new();
        let output = spawner
            .execute(&inv("sh", &["-c", "echo error >&2"]))
            .await
            .unwrap();
        assert_eq!(output.stderr.trim(), "error");
    }

    #[tokio::test]
    async fn test_timeout_kills_process() {
        let spawner = NativeProcessSpawner::with_timeout(Some(1));
        let err = spawner.execute(&inv("sleep", &["60"])).await.unwrap_err();
        assert!(
            err.to_string().contains("timed out"),
            "expected timeout error, got: {err}"
        );
    }

    #[tokio::test]
    async fn test_kill_handle_cancels() {
        let spawner = NativeProcessSpawner::new();
        let process = spawner.spawn(&inv("sleep", &["60"])).unwrap();
        assert!(process.id().is_some());

        let kill = process.kill_handle();
        let waiter = tokio::spawn(process.wait());
        tokio::time::sleep(Duration::from_millis(50)).await;
        kill.cancel();

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(ProcessError::Cancelled { .. })));
    }

    #[tokio::test]
    async fn test_dropping_handle_kills_child() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let script = format!("sleep 1; touch '{}'", marker.display());

        let spawner = NativeProcessSpawner::new();
        let process = spawner.spawn(&inv("sh", &["-c", &script])).unwrap();
        drop(process);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "child outlived its handle");
    }

    #[tokio::test]
    async fn test_recording_spawner_records_without_running() {
        let spawner = RecordingSpawner::new().respond("hue", "[\"10.0.0.2\"]");
        let out = spawner.execute(&inv("hue", &["--json", "search"])).await.unwrap();
        assert_eq!(out.stdout, "[\"10.0.0.2\"]");

        let out = spawner.execute(&inv("kodi-cli", &["-p"])).await.unwrap();
        assert!(out.stdout.is_empty());
        assert!(out.success());

        let calls = spawner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1], inv("kodi-cli", &["-p"]));
    }

    #[tokio::test]
    async fn test_recording_spawner_missing_program() {
        let spawner = RecordingSpawner::new().missing("hue");
        let err = spawner.execute(&inv("hue", &["lights"])).await.unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
        assert_eq!(spawner.calls().len(), 1);
    }
}

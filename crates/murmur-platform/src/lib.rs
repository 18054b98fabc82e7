//! Platform abstraction layer for murmur.
//!
//! Provides traits for the platform-dependent operations murmur needs
//! (filesystem, environment, process spawning) so the dispatcher and the
//! pairing flow can be exercised against fakes.
//!
//! # Architecture
//!
//! The [`Platform`] trait bundles the capabilities via accessor methods.
//! Each capability has its own trait ([`fs::FileSystem`],
//! [`env::Environment`], [`process::ProcessSpawner`]) with a native
//! implementation. [`NativePlatform`] is what the CLI uses.

pub mod config_loader;
pub mod env;
pub mod fs;
pub mod process;

use std::sync::Arc;

pub use process::{
    NativeProcessSpawner, ProcessError, ProcessOutput, ProcessSpawner, RecordingSpawner,
    SpawnedProcess,
};

/// Bundle of all platform capabilities.
pub trait Platform: Send + Sync {
    /// Filesystem operations.
    fn fs(&self) -> &dyn fs::FileSystem;

    /// Environment variable access.
    fn env(&self) -> &dyn env::Environment;

    /// Shared process spawner (the dispatcher keeps its own `Arc`).
    fn process(&self) -> Arc<dyn process::ProcessSpawner>;
}

/// Native platform implementation using tokio and std.
pub struct NativePlatform {
    fs: fs::NativeFileSystem,
    env: env::NativeEnvironment,
    process: Arc<process::NativeProcessSpawner>,
}

impl NativePlatform {
    /// Create a new native platform with no process timeout.
    pub fn new() -> Self {
        Self::with_process_timeout(None)
    }

    /// Create a native platform whose spawned processes are killed after
    /// `secs` seconds.
    pub fn with_process_timeout(secs: Option<u64>) -> Self {
        Self {
            fs: fs::NativeFileSystem,
            env: env::NativeEnvironment,
            process: Arc::new(process::NativeProcessSpawner::with_timeout(secs)),
        }
    }
}

impl Default for NativePlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl Platform for NativePlatform {
    fn fs(&self) -> &dyn fs::FileSystem {
        &self.fs
    }

    fn env(&self) -> &dyn env::Environment {
        &self.env
    }

    fn process(&self) -> Arc<dyn process::ProcessSpawner> {
        self.process.clone()
    }
}

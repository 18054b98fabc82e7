//! # murmur-types
//!
//! Core type definitions for the murmur voice command dispatcher.
//!
//! Every other murmur crate depends on this one. It contains:
//!
//! - **[`error`]** -- [`MurmurError`], the shared error type
//! - **[`config`]** -- Configuration schema (voice, dispatch, devices)
//! - **[`transcript`]** -- Transcript events produced by the speech engine
//! - **[`invocation`]** -- External program invocations

pub mod config;
pub mod error;
pub mod invocation;
pub mod transcript;

pub use error::{MurmurError, Result};
pub use invocation::ActionInvocation;
pub use transcript::TranscriptEvent;

//! Command dispatch for murmur.
//!
//! Turns a transcript such as `"hue lights off"` into exactly one external
//! program invocation, or into a no-match that is logged and dropped.
//!
//! # Module Structure
//!
//! - [`fuzzy`] -- Token-set similarity scoring
//! - [`decompose`] -- Keyword / remainder splitting
//! - [`registry`] -- One level of the command tree
//! - [`catalog`] -- The built-in lighting and media tree, from config
//! - [`dispatcher`] -- Walks the tree and runs the selected action
//! - [`pairing`] -- First-run hue bridge pairing

pub mod catalog;
pub mod decompose;
pub mod dispatcher;
pub mod fuzzy;
pub mod pairing;
pub mod registry;

pub use catalog::{Domain, build_registry};
pub use dispatcher::{DispatchOutcome, Dispatcher, IgnoreReason, LevelScores, Route};
pub use fuzzy::{MatchOptions, MatchResult};
pub use registry::{CommandNode, Handler, MatchMode, ParameterAction, Registry};

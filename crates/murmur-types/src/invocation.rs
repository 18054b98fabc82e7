//! External program invocations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An external program together with its ordered argument list.
///
/// Terminal actions in the dispatch tree resolve to one of these; the
/// process spawner turns it into a running process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionInvocation {
    /// Executable name or path.
    pub program: String,
    /// Command-line arguments, in order.
    #[serde(default)]
    pub args: Vec<String>,
}

impl ActionInvocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Return a copy with one more trailing argument.
    pub fn with_arg(&self, arg: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.args.push(arg.into());
        next
    }
}

impl fmt::Display for ActionInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

//! Command registries: one level of the dispatch tree.
//!
//! A [`Registry`] is an ordered list of [`CommandNode`]s. Each node carries a
//! non-empty set of aliases and a [`Handler`], which is either a nested
//! registry, a terminal program invocation, or a parameterised invocation
//! that picks its final argument from a fixed palette.
//!
//! Registries are immutable once built. [`RegistryBuilder::build`] rejects
//! empty alias sets and aliases claimed by two sibling nodes, so lookups by
//! alias are always unambiguous.

use std::collections::HashMap;

use murmur_types::{ActionInvocation, MurmurError, Result};

use crate::fuzzy::{self, MatchOptions, MatchResult};

/// How a registry level consumes its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Split the input into `(keyword, remainder)`, match the keyword and
    /// hand only the remainder to the chosen handler.
    #[default]
    Keyword,
    /// Match the whole input against the aliases and hand the whole input
    /// on to the chosen handler.
    Utterance,
}

/// Terminal action whose last argument is chosen from a palette.
///
/// "color red" resolves to `base` followed by `red`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterAction {
    /// Invocation without the trailing parameter.
    pub base: ActionInvocation,
    /// Allowed parameter values.
    pub parameters: Vec<String>,
}

impl ParameterAction {
    pub fn new<I, S>(base: ActionInvocation, parameters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            base,
            parameters: parameters.into_iter().map(Into::into).collect(),
        }
    }

    /// Score `input` against the palette, best first.
    pub fn resolve(&self, input: &str, options: MatchOptions) -> Vec<MatchResult> {
        fuzzy::extract_with(input, &self.parameters, options)
    }
}

/// What happens when a node is selected.
#[derive(Debug, Clone)]
pub enum Handler {
    /// Descend into a nested level.
    Registry(Registry),
    /// Run a fixed program invocation.
    Action(ActionInvocation),
    /// Pick a parameter from a palette, then run the invocation.
    Parameter(ParameterAction),
}

/// One named entry in a registry level.
#[derive(Debug, Clone)]
pub struct CommandNode {
    name: String,
    aliases: Vec<String>,
    handler: Handler,
}

impl CommandNode {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }
}

/// An immutable level of the dispatch tree.
#[derive(Debug, Clone)]
pub struct Registry {
    name: String,
    mode: MatchMode,
    nodes: Vec<CommandNode>,
    /// Every alias of every node, in declaration order.
    aliases: Vec<String>,
    /// Alias to index into `nodes`.
    owners: HashMap<String, usize>,
}

impl Registry {
    pub fn builder(name: impl Into<String>, mode: MatchMode) -> RegistryBuilder {
        RegistryBuilder {
            name: name.into(),
            mode,
            nodes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn nodes(&self) -> &[CommandNode] {
        &self.nodes
    }

    /// Flat alias list across all nodes, in declaration order.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node owning exactly `alias`.
    pub fn lookup(&self, alias: &str) -> Option<&CommandNode> {
        self.owners.get(alias).map(|&idx| &self.nodes[idx])
    }

    /// Score `query` against every alias at this level, best first.
    pub fn resolve(&self, query: &str, options: MatchOptions) -> Vec<MatchResult> {
        fuzzy::extract_with(query, &self.aliases, options)
    }

    /// Number of levels below and including this one.
    pub fn depth(&self) -> usize {
        1 + self
            .nodes
            .iter()
            .map(|node| match &node.handler {
                Handler::Registry(child) => child.depth(),
                Handler::Action(_) | Handler::Parameter(_) => 0,
            })
            .max()
            .unwrap_or(0)
    }
}

/// Collects nodes for a [`Registry`] and validates them on [`build`](Self::build).
#[derive(Debug)]
pub struct RegistryBuilder {
    name: String,
    mode: MatchMode,
    nodes: Vec<CommandNode>,
}

impl RegistryBuilder {
    /// Append a node. Declaration order is the tie-break order.
    pub fn node<I, S>(mut self, name: impl Into<String>, aliases: I, handler: Handler) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes.push(CommandNode {
            name: name.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
            handler,
        });
        self
    }

    pub fn build(self) -> Result<Registry> {
        let mut aliases = Vec::new();
        let mut owners = HashMap::new();

        for (idx, node) in self.nodes.iter().enumerate() {
            if node.aliases.is_empty() || node.aliases.iter().any(|a| a.trim().is_empty()) {
                return Err(MurmurError::EmptyAlias {
                    registry: self.name.clone(),
                    node: node.name.clone(),
                });
            }
            if let Handler::Parameter(action) = &node.handler {
                check_palette(&self.name, &node.name, &action.parameters)?;
            }
            for alias in &node.aliases {
                if owners.insert(alias.clone(), idx).is_some() {
                    return Err(MurmurError::DuplicateAlias {
                        registry: self.name.clone(),
                        alias: alias.clone(),
                    });
                }
                aliases.push(alias.clone());
            }
        }

        Ok(Registry {
            name: self.name,
            mode: self.mode,
            nodes: self.nodes,
            aliases,
            owners,
        })
    }
}

fn check_palette(registry: &str, node: &str, parameters: &[String]) -> Result<()> {
    if parameters.is_empty() || parameters.iter().any(|p| p.trim().is_empty()) {
        return Err(MurmurError::EmptyAlias {
            registry: registry.to_string(),
            node: node.to_string(),
        });
    }
    for (i, p) in parameters.iter().enumerate() {
        if parameters[..i].contains(p) {
            return Err(MurmurError::DuplicateAlias {
                registry: format!("{registry}.{node}"),
                alias: p.clone(),
            });
        }
    }
    Ok(())
}

//! Ordered command registry plus the matcher/authorizer that turns a comment
//! into invocations.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use regex::{Regex, RegexBuilder};

use crate::command_envelope::collect_invocation_lines;
use crate::requester::{RequesterIdentity, RequesterRole};
use crate::RelayError;

/// One command the relay understands. Immutable once constructed.
pub struct CommandDefinition<H> {
    name: String,
    pattern: Regex,
    handler: H,
    allowed_roles: BTreeSet<RequesterRole>,
    pull_request_only: bool,
}

impl<H> CommandDefinition<H> {
    /// Compiles `pattern` case-insensitively. The pattern may match anywhere
    /// in the line; authors add `^`/`$` themselves when they want anchoring.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        handler: H,
        allowed_roles: impl IntoIterator<Item = RequesterRole>,
        pull_request_only: bool,
    ) -> Result<Self, RelayError> {
        let name = name.into();
        let pattern = RegexBuilder::new(pattern.trim())
            .case_insensitive(true)
            .build()
            .map_err(|source| RelayError::InvalidPattern {
                command: name.clone(),
                source,
            })?;
        Ok(Self {
            name,
            pattern,
            handler,
            allowed_roles: allowed_roles.into_iter().collect(),
            pull_request_only,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn allowed_roles(&self) -> &BTreeSet<RequesterRole> {
        &self.allowed_roles
    }

    pub fn pull_request_only(&self) -> bool {
        self.pull_request_only
    }

    pub fn authorizes(&self, requester: &RequesterIdentity) -> bool {
        self.allowed_roles.contains(&requester.role)
            && (!self.pull_request_only || requester.is_pull_request)
    }

    /// Returns the named captures when `text` matches this command.
    pub fn match_text(&self, text: &str) -> Option<BTreeMap<String, String>> {
        let captures = self.pattern.captures(text)?;
        let arguments = self
            .pattern
            .capture_names()
            .flatten()
            .filter_map(|name| {
                captures
                    .name(name)
                    .map(|value| (name.to_string(), value.as_str().trim().to_string()))
            })
            .collect();
        Some(arguments)
    }
}

impl<H> fmt::Debug for CommandDefinition<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .field("allowed_roles", &self.allowed_roles)
            .field("pull_request_only", &self.pull_request_only)
            .finish_non_exhaustive()
    }
}

/// A parsed occurrence of a command inside a comment.
pub struct Invocation<'a, H> {
    pub line: String,
    pub arguments: BTreeMap<String, String>,
    pub command: &'a CommandDefinition<H>,
}

impl<H> fmt::Debug for Invocation<'_, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("line", &self.line)
            .field("arguments", &self.arguments)
            .field("command", &self.command.name())
            .finish()
    }
}

pub struct CommandRegistry<H> {
    prefix: String,
    commands: Vec<CommandDefinition<H>>,
}

impl<H> CommandRegistry<H> {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into().trim().to_string(),
            commands: Vec::new(),
        }
    }

    pub fn register(&mut self, command: CommandDefinition<H>) {
        self.commands.push(command);
    }

    pub fn with_command(mut self, command: CommandDefinition<H>) -> Self {
        self.register(command);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandDefinition<H>> {
        self.commands.iter()
    }

    /// Extracts every authorized invocation from `body`.
    ///
    /// Invocations are ordered by line, then by registry position. A line may
    /// produce several invocations when more than one command matches it.
    /// Commands the requester may not run are skipped without a trace.
    pub fn match_invocations(
        &self,
        body: &str,
        requester: &RequesterIdentity,
    ) -> Vec<Invocation<'_, H>> {
        let authorized = self
            .commands
            .iter()
            .filter(|command| command.authorizes(requester))
            .collect::<Vec<_>>();
        if authorized.is_empty() {
            return Vec::new();
        }

        let mut invocations = Vec::new();
        for line in collect_invocation_lines(body, &self.prefix) {
            for command in authorized.iter().copied() {
                if let Some(arguments) = command.match_text(line.text) {
                    invocations.push(Invocation {
                        line: line.text.to_string(),
                        arguments,
                        command,
                    });
                }
            }
        }
        invocations
    }
}

impl<H> fmt::Debug for CommandRegistry<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("prefix", &self.prefix)
            .field("commands", &self.commands)
            .finish()
    }
}

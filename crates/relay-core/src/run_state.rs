use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
/// Correlation token for one run: `{seed}-{ordinal}`.
pub struct DistinctId(String);

impl DistinctId {
    pub fn new(seed: u64, ordinal: usize) -> Self {
        Self(format!("{seed}-{ordinal}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DistinctId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// Lifecycle of one dispatched job.
pub enum RunState {
    Unresolved,
    Resolved { url: String },
    Error { message: String },
    TimedOut { polls: u32 },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unresolved => "unresolved",
            Self::Resolved { .. } => "resolved",
            Self::Error { .. } => "error",
            Self::TimedOut { .. } => "timed_out",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Run {
    distinct_id: DistinctId,
    display_name: String,
    state: RunState,
}

impl Run {
    pub fn new(distinct_id: DistinctId, display_name: impl Into<String>, state: RunState) -> Self {
        Self {
            distinct_id,
            display_name: display_name.into(),
            state,
        }
    }

    pub fn distinct_id(&self) -> &DistinctId {
        &self.distinct_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn is_unresolved(&self) -> bool {
        !self.state.is_terminal()
    }

    pub fn resolve(&mut self, url: impl Into<String>) -> bool {
        self.transition(RunState::Resolved { url: url.into() })
    }

    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        self.transition(RunState::Error {
            message: message.into(),
        })
    }

    pub fn time_out(&mut self, polls: u32) -> bool {
        self.transition(RunState::TimedOut { polls })
    }

    // Terminal states are final; only `Unresolved` may move.
    fn transition(&mut self, next: RunState) -> bool {
        if self.state.is_terminal() || !next.is_terminal() {
            return false;
        }
        self.state = next;
        true
    }
}

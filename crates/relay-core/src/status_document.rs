//! Rendering and rewriting of the status document.

use crate::placeholder::{replace_marker_once, result_marker, status_marker};
use crate::run_state::{DistinctId, Run, RunState};
use crate::transport_helpers::truncate_for_error;

pub const STATUS_DOCUMENT_HEADING: &str = "Starting jobs...";
const ERROR_MESSAGE_MAX_CHARS: usize = 300;

#[derive(Debug, Clone, Copy)]
/// One row of the status table.
pub struct StatusRowView<'a> {
    pub distinct_id: &'a DistinctId,
    pub display_name: &'a str,
}

impl<'a> From<&'a Run> for StatusRowView<'a> {
    fn from(run: &'a Run) -> Self {
        Self {
            distinct_id: run.distinct_id(),
            display_name: run.display_name(),
        }
    }
}

/// Keeps free text from breaking out of a markdown table cell.
///
/// Angle brackets become entities so user text can never open an HTML
/// comment or forge a status marker.
pub fn escape_table_cell(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '|' => escaped.push_str("\\|"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\r' => {}
            '\n' => escaped.push(' '),
            _ => escaped.push(ch),
        }
    }
    escaped.trim().to_string()
}

pub fn render_status_document<'a>(rows: impl IntoIterator<Item = StatusRowView<'a>>) -> String {
    let mut lines = vec![
        STATUS_DOCUMENT_HEADING.to_string(),
        String::new(),
        "| Command | Status | Results |".to_string(),
        "| ------- | ------ | ------- |".to_string(),
    ];
    for row in rows {
        let id = row.distinct_id.as_str();
        lines.push(format!(
            "| {} | {} | {} |",
            escape_table_cell(row.display_name),
            status_marker(id),
            result_marker(id)
        ));
    }
    lines.join("\n")
}

/// Human-readable replacement for a terminal state; `None` while unresolved.
pub fn render_status_cell(state: &RunState) -> Option<String> {
    match state {
        RunState::Unresolved => None,
        RunState::Resolved { url } => Some(format!("[started]({url})")),
        RunState::Error { message } => Some(format!(
            "error: {}",
            escape_table_cell(&truncate_for_error(message, ERROR_MESSAGE_MAX_CHARS))
        )),
        RunState::TimedOut { polls } => Some(format!(
            "timed out: no matching run after {polls} polls"
        )),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRewrite {
    pub body: String,
    pub replaced: Vec<DistinctId>,
}

impl StatusRewrite {
    pub fn is_unchanged(&self) -> bool {
        self.replaced.is_empty()
    }
}

/// Writes every terminal run's outcome over its status marker.
///
/// Runs whose marker is no longer present verbatim are left alone, so
/// applying the same run table twice is a no-op the second time.
pub fn apply_terminal_states(body: &str, runs: &[Run]) -> StatusRewrite {
    let mut rewritten = body.to_string();
    let mut replaced = Vec::new();
    for run in runs {
        let Some(replacement) = render_status_cell(run.state()) else {
            continue;
        };
        let marker = status_marker(run.distinct_id().as_str());
        if let Some(next) = replace_marker_once(&rewritten, &marker, &replacement) {
            rewritten = next;
            replaced.push(run.distinct_id().clone());
        }
    }
    StatusRewrite {
        body: rewritten,
        replaced,
    }
}

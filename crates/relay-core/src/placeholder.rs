//! Marker tokens embedded in the status document.
//!
//! Every run owns two markers keyed by its distinct id: a status marker that the
//! relay replaces exactly once, and a result marker reserved for the launched
//! job to fill in on its own.

pub const STATUS_MARKER_PREFIX: &str = "<!--status-";
pub const RESULT_MARKER_PREFIX: &str = "<!--result-";
pub const MARKER_SUFFIX: &str = "-->";

pub fn status_marker(distinct_id: &str) -> String {
    format!("{STATUS_MARKER_PREFIX}{distinct_id}{MARKER_SUFFIX}")
}

pub fn result_marker(distinct_id: &str) -> String {
    format!("{RESULT_MARKER_PREFIX}{distinct_id}{MARKER_SUFFIX}")
}

/// Replaces the first verbatim occurrence of `marker`.
///
/// Returns `None` when the marker is absent, leaving the caller's text as-is.
pub fn replace_marker_once(body: &str, marker: &str, replacement: &str) -> Option<String> {
    if marker.is_empty() {
        return None;
    }
    let start = body.find(marker)?;
    let mut rewritten = String::with_capacity(body.len() + replacement.len());
    rewritten.push_str(&body[..start]);
    rewritten.push_str(replacement);
    rewritten.push_str(&body[start + marker.len()..]);
    Some(rewritten)
}

/// Lists the distinct ids of every status marker still present in `text`.
pub fn extract_status_marker_ids(text: &str) -> Vec<String> {
    extract_marker_ids(text, STATUS_MARKER_PREFIX)
}

/// Lists the distinct ids of every result marker still present in `text`.
pub fn extract_result_marker_ids(text: &str) -> Vec<String> {
    extract_marker_ids(text, RESULT_MARKER_PREFIX)
}

fn extract_marker_ids(text: &str, prefix: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut cursor = text;
    while let Some(start) = cursor.find(prefix) {
        let after_start = &cursor[start + prefix.len()..];
        let Some(end) = after_start.find(MARKER_SUFFIX) else {
            break;
        };
        let id = after_start[..end].trim();
        if !id.is_empty() {
            ids.push(id.to_string());
        }
        cursor = &after_start[end + MARKER_SUFFIX.len()..];
    }
    ids
}

//! Matching of externally listed runs back to the runs that launched them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// A run reported by the external run-listing API.
pub struct CandidateRun {
    pub name: String,
    pub url: String,
}

/// True when `token` occurs in `name` without an adjacent ASCII digit.
///
/// The digit guard keeps `42-1` from claiming a run named after `42-10`.
pub fn name_contains_token(name: &str, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    name.match_indices(token).any(|(start, matched)| {
        let before = name[..start].chars().next_back();
        let after = name[start + matched.len()..].chars().next();
        !before.is_some_and(|ch| ch.is_ascii_digit())
            && !after.is_some_and(|ch| ch.is_ascii_digit())
    })
}

/// Finds the first unclaimed candidate carrying `distinct_id` in its name.
pub fn find_matching_candidate<'a>(
    candidates: &'a [CandidateRun],
    distinct_id: &str,
    claimed: &HashSet<usize>,
) -> Option<(usize, &'a CandidateRun)> {
    candidates
        .iter()
        .enumerate()
        .find(|(index, candidate)| {
            !claimed.contains(index) && name_contains_token(&candidate.name, distinct_id)
        })
}

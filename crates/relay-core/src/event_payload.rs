//! Model of the inbound `issue_comment` webhook payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::requester::{RequesterIdentity, RequesterRole};
use crate::RelayError;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubComment {
    pub id: u64,
    pub body: Option<String>,
    pub user: GithubUser,
    #[serde(default)]
    pub author_association: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GithubIssueRef {
    pub number: u64,
    #[serde(default)]
    pub pull_request: Option<Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub comment: GithubComment,
    pub issue: GithubIssueRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// The comment that starts an episode.
pub struct TriggerComment {
    pub comment_id: u64,
    pub issue_number: u64,
    pub body: String,
    pub requester: RequesterIdentity,
}

impl IssueCommentEvent {
    pub fn from_json_str(raw: &str) -> Result<Self, RelayError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Converts a newly created, non-bot comment into a trigger.
    pub fn into_trigger(self, bot_login: Option<&str>) -> Option<TriggerComment> {
        if self.action != "created" {
            return None;
        }
        if let Some(bot_login) = bot_login.map(str::trim).filter(|login| !login.is_empty()) {
            if self.comment.user.login.eq_ignore_ascii_case(bot_login) {
                return None;
            }
        }
        let body = self.comment.body.unwrap_or_default();
        if body.trim().is_empty() {
            return None;
        }
        Some(TriggerComment {
            comment_id: self.comment.id,
            issue_number: self.issue.number,
            body,
            requester: RequesterIdentity {
                login: self.comment.user.login,
                role: RequesterRole::from_author_association(&self.comment.author_association),
                is_pull_request: self.issue.pull_request.is_some(),
            },
        })
    }
}

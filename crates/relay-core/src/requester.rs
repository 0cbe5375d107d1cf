use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Closed set of requester roles used by command authorization.
pub enum RequesterRole {
    Owner,
    Member,
    Collaborator,
    Other,
}

impl RequesterRole {
    /// Maps a GitHub `author_association` value onto a requester role.
    pub fn from_author_association(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "OWNER" => Self::Owner,
            "MEMBER" => Self::Member,
            "COLLABORATOR" => Self::Collaborator,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Member => "member",
            Self::Collaborator => "collaborator",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Who posted the triggering comment, as reported by the inbound trigger.
pub struct RequesterIdentity {
    pub login: String,
    pub role: RequesterRole,
    pub is_pull_request: bool,
}

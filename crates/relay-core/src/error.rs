use thiserror::Error;

#[derive(Debug, Error)]
/// Errors surfaced by relay collaborators and command construction.
pub enum RelayError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{operation} failed with status {status}: {body}")]
    HttpStatus {
        operation: String,
        status: u16,
        body: String,
    },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("status document {document_id} cannot be reconciled: {reason}")]
    DocumentPrecondition { document_id: u64, reason: String },
    #[error("invalid pattern for command '{command}': {source}")]
    InvalidPattern {
        command: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

//! Error taxonomy for crewline.

use std::path::PathBuf;

/// Errors produced by capability invocation.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("missing credential: set {variable}")]
    MissingCredential { variable: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised across the agent-execution boundary.
#[derive(Debug, thiserror::Error)]
pub enum CollaboratorError {
    #[error("missing credential: set {variable}")]
    MissingCredential { variable: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("api request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("agent stopped after reaching its iteration limit of {max_iterations}")]
    IterationLimit { max_iterations: u32 },
}

impl From<reqwest::Error> for CollaboratorError {
    fn from(err: reqwest::Error) -> Self {
        CollaboratorError::Http(err.to_string())
    }
}

/// Pipeline-level errors.
#[derive(Debug, thiserror::Error)]
pub enum CrewError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("task '{description}' has no agent bound")]
    UnboundTask { description: String },

    #[error("task {task_index} ({role}) failed: {cause}")]
    ExecutionFailed {
        task_index: usize,
        role: String,
        #[source]
        cause: CollaboratorError,
    },

    #[error("failed to persist result to {}: {source}", path.display())]
    PersistenceFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for crewline operations.
pub type Result<T> = std::result::Result<T, CrewError>;

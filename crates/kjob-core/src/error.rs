use std::time::Duration;

use thiserror::Error;

use kjob_model::ModelError;

/// Failure to observe how many jobs are active.
///
/// Never the same thing as "zero active": the dispatcher does not admit on it.
#[derive(Debug, Error)]
pub enum ObserveError {
    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("backend refused to list jobs: {0}")]
    Rejected(String),

    #[error("malformed backend response: {0}")]
    Decode(String),

    #[error("observation timed out after {0:?}")]
    Timeout(Duration),
}

/// Failure to create a job. The unit is abandoned, never retried.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("job {name} already exists")]
    Conflict { name: String },

    #[error("backend rejected job: {0}")]
    Rejected(String),

    #[error("invalid job spec: {0}")]
    InvalidSpec(String),

    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("submission timed out after {0:?}")]
    Timeout(Duration),
}

impl From<ModelError> for SubmitError {
    fn from(e: ModelError) -> Self {
        SubmitError::InvalidSpec(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid dispatch config: {0}")]
    InvalidConfig(String),
}

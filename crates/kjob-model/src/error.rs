use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid job name {name:?}: {reason}")]
    InvalidJobName { name: String, reason: &'static str },

    #[error("failed to serialize work item: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure to read a [`WorkItem`](crate::WorkItem) back out of its message.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("message is missing")]
    Missing,

    #[error("message is not valid json: {0}")]
    Json(#[source] serde_json::Error),

    #[error("message has no string `id` field")]
    MissingId,
}

use serde::{Deserialize, Serialize};

use crate::DEFAULT_TTL_SECONDS_AFTER_FINISHED;

/// What the backend does when the unit's process exits unsuccessfully.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestartPolicy {
    #[default]
    Never,
    OnFailure,
}

impl RestartPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestartPolicy::Never => "Never",
            RestartPolicy::OnFailure => "OnFailure",
        }
    }
}

/// When the backend fetches the unit's image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullPolicy {
    Always,
    #[default]
    IfNotPresent,
    Never,
}

impl PullPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullPolicy::Always => "Always",
            PullPolicy::IfNotPresent => "IfNotPresent",
            PullPolicy::Never => "Never",
        }
    }
}

/// Execution rules the backend enforces for each unit.
///
/// The defaults describe a one-shot unit: a single replica, a single required
/// completion, no retries, cleaned up shortly after it finishes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionPolicy {
    /// Retries after a failed run.
    pub backoff_limit: u32,
    /// Seconds a finished unit is kept before deletion.
    pub ttl_seconds_after_finished: u32,
    pub parallelism: u32,
    pub completions: u32,
    pub restart: RestartPolicy,
    pub pull: PullPolicy,
}

impl Default for ExecutionPolicy {
    fn default() -> Self {
        Self {
            backoff_limit: 0,
            ttl_seconds_after_finished: DEFAULT_TTL_SECONDS_AFTER_FINISHED,
            parallelism: 1,
            completions: 1,
            restart: RestartPolicy::Never,
            pull: PullPolicy::IfNotPresent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_one_shot() {
        let p = ExecutionPolicy::default();
        assert_eq!(p.backoff_limit, 0);
        assert_eq!(p.restart, RestartPolicy::Never);
        assert_eq!(p.parallelism, 1);
        assert_eq!(p.completions, 1);
        assert_eq!(p.ttl_seconds_after_finished, 1);
        assert_eq!(p.pull.as_str(), "IfNotPresent");
    }
}

use serde::{Deserialize, Serialize};

/// Backend-reported state of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStatus {
    /// Accepted, not yet running.
    Pending,
    /// Currently executing.
    Running,
    /// Finished with its required completion.
    Succeeded,
    /// Finished without success; never retried.
    Failed,
}

impl JobStatus {
    /// Returns `true` if the job is in a terminal state (won't transition further).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Returns `true` if the job counts against the admission ceiling.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_and_terminal_are_disjoint() {
        for s in [
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Succeeded,
            JobStatus::Failed,
        ] {
            assert_ne!(s.is_active(), s.is_terminal(), "{s:?}");
        }
    }

    #[test]
    fn serde_camel_case() {
        let json = serde_json::to_string(&JobStatus::Running).unwrap();
        assert_eq!(json, r#""running""#);
    }
}

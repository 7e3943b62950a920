use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Env, ExecutionPolicy, JobName, QUEUE_MESSAGE_ENV, SecretRef, UnitIndex};

/// Labels attached to a job; ordered so manifests are stable.
pub type Labels = BTreeMap<String, String>;

/// Backend-neutral description of one unit of work.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
    pub name: JobName,
    /// Index of the unit within its dispatch run.
    pub index: UnitIndex,
    /// Container image reference.
    pub image: String,
    /// Name of the single container inside the job.
    pub container: String,
    /// Environment of the unit; carries the serialized work item.
    pub env: Env,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<SecretRef>,
    pub policy: ExecutionPolicy,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
}

impl JobSpec {
    /// Serialized work item embedded in the environment.
    pub fn message(&self) -> Option<&str> {
        self.env.get(QUEUE_MESSAGE_ENV)
    }
}

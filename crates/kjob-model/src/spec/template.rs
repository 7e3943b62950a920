use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_CONTAINER_NAME, DEFAULT_IMAGE, DEFAULT_JOB_PREFIX, Env, ExecutionPolicy, JobName,
    JobSpec, LABEL_INDEX, LABEL_MANAGED_BY, Labels, MANAGED_BY, ModelError, QUEUE_MESSAGE_ENV,
    SecretRef, UnitIndex, WorkItem,
};

/// Recipe turning a unit index into a [`JobSpec`].
///
/// [`JobTemplate::build`] is a pure function of the template and the index:
/// building the same index twice yields the same name and the same payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobTemplate {
    /// Job names are `{prefix}-{index}`.
    pub prefix: String,
    pub image: String,
    pub container: String,
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub secrets: Vec<SecretRef>,
    #[serde(default)]
    pub policy: ExecutionPolicy,
}

impl Default for JobTemplate {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_JOB_PREFIX.to_string(),
            image: DEFAULT_IMAGE.to_string(),
            container: DEFAULT_CONTAINER_NAME.to_string(),
            labels: Labels::new(),
            secrets: Vec::new(),
            policy: ExecutionPolicy::default(),
        }
    }
}

impl JobTemplate {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Default::default()
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    pub fn with_secret(mut self, secret: SecretRef) -> Self {
        self.secrets.push(secret);
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    pub fn build(&self, index: UnitIndex) -> Result<JobSpec, ModelError> {
        let name = JobName::indexed(&self.prefix, index)?;
        let message = WorkItem::for_index(index).to_message()?;

        let mut labels = self.labels.clone();
        labels.insert(LABEL_MANAGED_BY.to_string(), MANAGED_BY.to_string());
        labels.insert(LABEL_INDEX.to_string(), index.to_string());

        Ok(JobSpec {
            name,
            index,
            image: self.image.clone(),
            container: self.container.clone(),
            env: Env::single(QUEUE_MESSAGE_ENV, message),
            secrets: self.secrets.clone(),
            policy: self.policy.clone(),
            labels,
        })
    }
}

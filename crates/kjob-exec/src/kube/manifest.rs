//! `batch/v1` Job manifests built from a [`JobSpec`].

use std::collections::BTreeMap;

use serde::Serialize;

use kjob_model::{JobSpec, Labels};

/// Annotation recording which host submitted the job.
pub const ANNOTATION_SUBMITTED_BY: &str = "kjob.io/submitted-by";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobManifest {
    api_version: &'static str,
    kind: &'static str,
    metadata: ObjectMeta,
    spec: JobBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ObjectMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    labels: Labels,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    annotations: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobBody {
    backoff_limit: u32,
    ttl_seconds_after_finished: u32,
    parallelism: u32,
    completions: u32,
    template: PodTemplate,
}

#[derive(Debug, Serialize)]
struct PodTemplate {
    metadata: ObjectMeta,
    spec: PodSpec,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PodSpec {
    containers: Vec<Container>,
    restart_policy: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Container {
    name: String,
    image: String,
    image_pull_policy: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    env: Vec<EnvVar>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvVar {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_from: Option<EnvVarSource>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EnvVarSource {
    secret_key_ref: SecretKeySelector,
}

#[derive(Debug, Serialize)]
struct SecretKeySelector {
    name: String,
    key: String,
    optional: bool,
}

impl JobManifest {
    pub fn from_spec(spec: &JobSpec, submitted_by: &str) -> Self {
        let mut env: Vec<EnvVar> = spec
            .env
            .resolved()
            .into_iter()
            .map(|(name, value)| EnvVar {
                name: name.to_string(),
                value: Some(value.to_string()),
                value_from: None,
            })
            .collect();
        env.extend(spec.secrets.iter().map(|s| EnvVar {
            name: s.env.clone(),
            value: None,
            value_from: Some(EnvVarSource {
                secret_key_ref: SecretKeySelector {
                    name: s.secret.clone(),
                    key: s.key.clone(),
                    optional: true,
                },
            }),
        }));

        let mut annotations = BTreeMap::new();
        annotations.insert(
            ANNOTATION_SUBMITTED_BY.to_string(),
            submitted_by.to_string(),
        );

        Self {
            api_version: "batch/v1",
            kind: "Job",
            metadata: ObjectMeta {
                name: Some(spec.name.to_string()),
                labels: spec.labels.clone(),
                annotations,
            },
            spec: JobBody {
                backoff_limit: spec.policy.backoff_limit,
                ttl_seconds_after_finished: spec.policy.ttl_seconds_after_finished,
                parallelism: spec.policy.parallelism,
                completions: spec.policy.completions,
                template: PodTemplate {
                    metadata: ObjectMeta {
                        name: None,
                        labels: spec.labels.clone(),
                        annotations: BTreeMap::new(),
                    },
                    spec: PodSpec {
                        containers: vec![Container {
                            name: spec.container.clone(),
                            image: spec.image.clone(),
                            image_pull_policy: spec.policy.pull.as_str(),
                            env,
                        }],
                        restart_policy: spec.policy.restart.as_str(),
                    },
                },
            },
        }
    }
}

//! Kubernetes backend: one `batch/v1` Job per unit of work.

mod config;
pub use config::{ClientIdentity, DEFAULT_NAMESPACE, KubeConfig, PemSource, SERVICE_ACCOUNT_DIR};

mod error;
pub use error::KubeError;

mod kubeconfig;

pub mod list;
pub mod manifest;

use async_trait::async_trait;
use reqwest::{Certificate, Client, Identity, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, trace};

use kjob_core::{Backend, ObserveError, SubmitError};
use kjob_model::{JobSpec, LABEL_MANAGED_BY, MANAGED_BY};

use list::JobList;
use manifest::JobManifest;

/// Talks to the API server's REST interface directly.
///
/// Jobs are created in one namespace and counted through the
/// `app.kubernetes.io/managed-by=kjob` label, so jobs created by anyone else
/// never count against the ceiling.
pub struct KubeBackend {
    client: Client,
    jobs_url: Url,
    list_url: Url,
    token: Option<String>,
    submitted_by: String,
}

impl KubeBackend {
    pub fn new(cfg: KubeConfig) -> Result<Self, KubeError> {
        let mut builder = Client::builder().danger_accept_invalid_certs(cfg.insecure);
        if let Some(ca) = &cfg.ca {
            for cert in Certificate::from_pem_bundle(&ca.read()?).map_err(KubeError::InvalidCa)? {
                builder = builder.add_root_certificate(cert);
            }
        }
        if let Some(identity) = &cfg.identity {
            let mut pem = identity.cert.read()?;
            pem.push(b'\n');
            pem.extend(identity.key.read()?);
            let identity = Identity::from_pem(&pem).map_err(KubeError::InvalidIdentity)?;
            builder = builder.identity(identity);
        }
        let client = builder.build().map_err(KubeError::Client)?;

        let (jobs_url, list_url) = job_urls(&cfg.api_server, &cfg.namespace)?;
        let submitted_by = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());

        debug!(
            api_server = %cfg.api_server,
            namespace = %cfg.namespace,
            client_cert = cfg.identity.is_some(),
            "kubernetes backend ready"
        );
        Ok(Self {
            client,
            jobs_url,
            list_url,
            token: cfg.token,
            submitted_by,
        })
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl Backend for KubeBackend {
    fn name(&self) -> &'static str {
        "kube"
    }

    async fn submit(&self, spec: &JobSpec) -> Result<(), SubmitError> {
        let manifest = JobManifest::from_spec(spec, &self.submitted_by);
        trace!(job = %spec.name, "posting job manifest");

        let response = self
            .authorized(self.client.post(self.jobs_url.clone()).json(&manifest))
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = api_message(response).await;
        Err(submit_error(status, spec.name.as_str(), message))
    }

    async fn count_active(&self) -> Result<usize, ObserveError> {
        let response = self
            .authorized(self.client.get(self.list_url.clone()))
            .send()
            .await
            .map_err(|e| ObserveError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = api_message(response).await;
            return Err(observe_error(status, message));
        }

        let list: JobList = response
            .json()
            .await
            .map_err(|e| ObserveError::Decode(e.to_string()))?;
        let active = list.count_active();
        trace!(listed = list.items.len(), active, "counted active jobs");
        Ok(active)
    }
}

/// `metav1.Status` body returned with API errors.
#[derive(Debug, Deserialize)]
struct ApiStatus {
    #[serde(default)]
    message: String,
}

async fn api_message(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    match serde_json::from_str::<ApiStatus>(&body) {
        Ok(status) if !status.message.is_empty() => status.message,
        _ => body,
    }
}

fn submit_error(status: StatusCode, name: &str, message: String) -> SubmitError {
    match status {
        StatusCode::CONFLICT => SubmitError::Conflict {
            name: name.to_string(),
        },
        s if s.is_client_error() => SubmitError::Rejected(format!("{s}: {message}")),
        s => SubmitError::Transport(format!("{s}: {message}")),
    }
}

fn observe_error(status: StatusCode, message: String) -> ObserveError {
    if status.is_client_error() {
        ObserveError::Rejected(format!("{status}: {message}"))
    } else {
        ObserveError::Transport(format!("{status}: {message}"))
    }
}

fn job_urls(api_server: &str, namespace: &str) -> Result<(Url, Url), KubeError> {
    let invalid = |reason: String| KubeError::InvalidApiServer {
        url: api_server.to_string(),
        reason,
    };
    let jobs = format!(
        "{}/apis/batch/v1/namespaces/{}/jobs",
        api_server.trim_end_matches('/'),
        namespace
    );
    let jobs_url = Url::parse(&jobs).map_err(|e| invalid(e.to_string()))?;
    let selector = format!("{LABEL_MANAGED_BY}={MANAGED_BY}");
    let list_url = Url::parse_with_params(&jobs, [("labelSelector", selector.as_str())])
        .map_err(|e| invalid(e.to_string()))?;
    Ok((jobs_url, list_url))
}

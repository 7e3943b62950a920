use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum KubeError {
    #[error("no api server configured (set KJOB_API_SERVER, provide a kubeconfig or run in-cluster)")]
    MissingApiServer,

    #[error("invalid api server url {url}: {reason}")]
    InvalidApiServer { url: String, reason: String },

    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse kubeconfig {}", path.display())]
    KubeconfigSyntax {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid kubeconfig {}: {reason}", path.display())]
    InvalidKubeconfig { path: PathBuf, reason: String },

    #[error("invalid CA bundle")]
    InvalidCa(#[source] reqwest::Error),

    #[error("invalid client certificate or key")]
    InvalidIdentity(#[source] reqwest::Error),

    #[error("failed to build http client")]
    Client(#[source] reqwest::Error),
}

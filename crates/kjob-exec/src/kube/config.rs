use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use super::{KubeError, kubeconfig};

/// Mount point of the pod's service-account credentials.
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

pub const DEFAULT_NAMESPACE: &str = "default";

/// PEM material, either on disk or already decoded.
#[derive(Clone, PartialEq, Eq)]
pub enum PemSource {
    File(PathBuf),
    Inline(Vec<u8>),
}

impl PemSource {
    pub(crate) fn read(&self) -> Result<Vec<u8>, KubeError> {
        match self {
            PemSource::File(path) => fs::read(path).map_err(|source| KubeError::Read {
                path: path.clone(),
                source,
            }),
            PemSource::Inline(bytes) => Ok(bytes.clone()),
        }
    }
}

impl fmt::Debug for PemSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PemSource::File(path) => f.debug_tuple("File").field(path).finish(),
            PemSource::Inline(bytes) => write!(f, "Inline(<{} bytes>)", bytes.len()),
        }
    }
}

/// Client certificate and its private key, for clusters that authenticate with mTLS.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientIdentity {
    pub cert: PemSource,
    pub key: PemSource,
}

/// Connection settings for the Kubernetes API server.
///
/// Built once at startup and handed to [`KubeBackend::new`](super::KubeBackend::new).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KubeConfig {
    /// Base URL, e.g. `https://10.0.0.1:443`.
    pub api_server: String,
    pub namespace: String,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// CA bundle used to verify the API server.
    pub ca: Option<PemSource>,
    pub identity: Option<ClientIdentity>,
    /// Skip TLS verification. Local clusters only.
    pub insecure: bool,
}

impl KubeConfig {
    pub fn new(api_server: impl Into<String>) -> Self {
        Self {
            api_server: api_server.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            token: None,
            ca: None,
            identity: None,
            insecure: false,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Resolve connection settings the way `kubectl` users expect.
    ///
    /// The server comes from the first source that has one:
    /// `KJOB_API_SERVER`, then the kubeconfig (`$KUBECONFIG`, else
    /// `~/.kube/config`), then the pod's service account. The remaining
    /// variables override whatever that source provided.
    ///
    /// | Variable          | Meaning                                 |
    /// |-------------------|-----------------------------------------|
    /// | `KJOB_API_SERVER` | API server URL                          |
    /// | `KJOB_CONTEXT`    | kubeconfig context instead of the current one |
    /// | `KJOB_NAMESPACE`  | target namespace (default `default`)    |
    /// | `KJOB_TOKEN`      | bearer token                            |
    /// | `KJOB_TOKEN_FILE` | file holding the bearer token           |
    /// | `KJOB_CA_FILE`    | PEM CA bundle                           |
    /// | `KJOB_INSECURE`   | `true`/`1` disables TLS verification    |
    pub fn from_env() -> Result<Self, KubeError> {
        Self::from_lookup(Path::new(SERVICE_ACCOUNT_DIR), |k| std::env::var(k).ok())
    }

    pub(crate) fn from_lookup<F>(sa_dir: &Path, lookup: F) -> Result<Self, KubeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let set = |key: &str| lookup(key).filter(|s| !s.is_empty());

        let mut cfg = if let Some(api_server) = set("KJOB_API_SERVER") {
            Self::new(api_server)
        } else if let Some(path) = kubeconfig::locate(&lookup) {
            kubeconfig::load(&path, set("KJOB_CONTEXT").as_deref())?
        } else {
            Self::in_cluster_with(sa_dir, &lookup)?
        };

        if let Some(ns) = set("KJOB_NAMESPACE") {
            cfg.namespace = ns;
        }
        if let Some(token) = set("KJOB_TOKEN") {
            cfg.token = Some(token);
        } else if let Some(path) = set("KJOB_TOKEN_FILE") {
            cfg.token = Some(read_trimmed(Path::new(&path))?);
        }
        if let Some(ca) = set("KJOB_CA_FILE") {
            cfg.ca = Some(PemSource::File(PathBuf::from(ca)));
        }
        if let Some(flag) = lookup("KJOB_INSECURE") {
            cfg.insecure = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        Ok(cfg)
    }

    pub(crate) fn in_cluster_with<F>(sa_dir: &Path, lookup: F) -> Result<Self, KubeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("KUBERNETES_SERVICE_HOST").ok_or(KubeError::MissingApiServer)?;
        let port = lookup("KUBERNETES_SERVICE_PORT").unwrap_or_else(|| "443".to_string());
        let host = if host.contains(':') {
            format!("[{host}]")
        } else {
            host
        };

        let mut cfg = Self::new(format!("https://{host}:{port}"));

        let token = sa_dir.join("token");
        if token.exists() {
            cfg.token = Some(read_trimmed(&token)?);
        }
        let namespace = sa_dir.join("namespace");
        if namespace.exists() {
            cfg.namespace = read_trimmed(&namespace)?;
        }
        let ca = sa_dir.join("ca.crt");
        if ca.exists() {
            cfg.ca = Some(PemSource::File(ca));
        }
        Ok(cfg)
    }
}

pub(super) fn read_trimmed(path: &Path) -> Result<String, KubeError> {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|source| KubeError::Read {
            path: path.to_path_buf(),
            source,
        })
}

//! Reader for `kubectl` kubeconfig files.
//!
//! Only static credentials are understood: bearer tokens, token files and
//! client certificates. `exec` and `auth-provider` plugins are not run.

use std::path::{Path, PathBuf};

use base64::{Engine as _, prelude::BASE64_STANDARD};
use serde::{Deserialize, de::IgnoredAny};
use tracing::{debug, warn};

use super::{ClientIdentity, KubeConfig, KubeError, PemSource, config::read_trimmed};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Kubeconfig {
    #[serde(default)]
    current_context: Option<String>,
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    users: Vec<NamedUser>,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: Cluster,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Cluster {
    server: String,
    #[serde(default)]
    certificate_authority: Option<PathBuf>,
    #[serde(default)]
    certificate_authority_data: Option<String>,
    #[serde(default)]
    insecure_skip_tls_verify: bool,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: Context,
}

#[derive(Debug, Deserialize)]
struct Context {
    cluster: String,
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    namespace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    #[serde(default)]
    user: User,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct User {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "tokenFile")]
    token_file: Option<PathBuf>,
    #[serde(default)]
    client_certificate: Option<PathBuf>,
    #[serde(default)]
    client_certificate_data: Option<String>,
    #[serde(default)]
    client_key: Option<PathBuf>,
    #[serde(default)]
    client_key_data: Option<String>,
    #[serde(default)]
    exec: Option<IgnoredAny>,
    #[serde(default)]
    auth_provider: Option<IgnoredAny>,
}

/// Kubeconfig to use: the first entry of `$KUBECONFIG`, else `~/.kube/config` if present.
///
/// Multiple `$KUBECONFIG` entries are not merged.
pub(super) fn locate<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(list) = lookup("KUBECONFIG").filter(|s| !s.is_empty()) {
        return std::env::split_paths(&list).find(|p| !p.as_os_str().is_empty());
    }
    let home = lookup("HOME").or_else(|| lookup("USERPROFILE"))?;
    let path = Path::new(&home).join(".kube").join("config");
    path.is_file().then_some(path)
}

/// Settings of `context`, or of the file's `current-context`.
pub(super) fn load(path: &Path, context: Option<&str>) -> Result<KubeConfig, KubeError> {
    let text = read_trimmed(path)?;
    let file: Kubeconfig =
        serde_yaml::from_str(&text).map_err(|source| KubeError::KubeconfigSyntax {
            path: path.to_path_buf(),
            source,
        })?;
    file.resolve(path, context)
}

impl Kubeconfig {
    fn resolve(self, path: &Path, context: Option<&str>) -> Result<KubeConfig, KubeError> {
        let invalid = |reason: String| KubeError::InvalidKubeconfig {
            path: path.to_path_buf(),
            reason,
        };
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let name = context
            .map(str::to_string)
            .or(self.current_context)
            .ok_or_else(|| invalid("no current-context set".into()))?;
        let ctx = self
            .contexts
            .into_iter()
            .find(|c| c.name == name)
            .ok_or_else(|| invalid(format!("context {name:?} not found")))?
            .context;
        let cluster = self
            .clusters
            .into_iter()
            .find(|c| c.name == ctx.cluster)
            .ok_or_else(|| invalid(format!("cluster {:?} not found", ctx.cluster)))?
            .cluster;
        let user = match &ctx.user {
            Some(user) => {
                self.users
                    .into_iter()
                    .find(|u| &u.name == user)
                    .ok_or_else(|| invalid(format!("user {user:?} not found")))?
                    .user
            }
            None => User::default(),
        };

        let mut cfg = KubeConfig::new(cluster.server);
        if let Some(ns) = ctx.namespace.filter(|s| !s.is_empty()) {
            cfg.namespace = ns;
        }
        cfg.insecure = cluster.insecure_skip_tls_verify;
        cfg.ca = pem(
            "certificate-authority-data",
            cluster.certificate_authority_data,
            cluster.certificate_authority,
            base,
        )
        .map_err(invalid)?;

        cfg.token = match (user.token.filter(|t| !t.is_empty()), user.token_file) {
            (Some(token), _) => Some(token),
            (None, Some(file)) => Some(read_trimmed(&base.join(file))?),
            (None, None) => None,
        };

        let cert = pem(
            "client-certificate-data",
            user.client_certificate_data,
            user.client_certificate,
            base,
        )
        .map_err(invalid)?;
        let key = pem("client-key-data", user.client_key_data, user.client_key, base)
            .map_err(invalid)?;
        cfg.identity = match (cert, key) {
            (Some(cert), Some(key)) => Some(ClientIdentity { cert, key }),
            (None, None) => None,
            _ => return Err(invalid("client certificate and key must be set together".into())),
        };

        let plugin = user.exec.is_some() || user.auth_provider.is_some();
        if plugin && cfg.token.is_none() && cfg.identity.is_none() {
            warn!(
                context = %name,
                "kubeconfig user needs an exec or auth-provider plugin; continuing without credentials"
            );
        }
        debug!(path = %path.display(), context = %name, server = %cfg.api_server, "loaded kubeconfig");
        Ok(cfg)
    }
}

/// Inline base64 data wins over a file path; relative paths resolve against `base`.
fn pem(
    field: &str,
    data: Option<String>,
    file: Option<PathBuf>,
    base: &Path,
) -> Result<Option<PemSource>, String> {
    if let Some(data) = data.filter(|d| !d.trim().is_empty()) {
        let bytes = BASE64_STANDARD
            .decode(data.trim())
            .map_err(|e| format!("{field}: {e}"))?;
        return Ok(Some(PemSource::Inline(bytes)));
    }
    Ok(file.map(|f| PemSource::File(base.join(f))))
}

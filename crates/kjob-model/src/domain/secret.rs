use serde::{Deserialize, Serialize};

/// Secret value exposed to a unit of work as an environment variable.
///
/// References are always optional: a missing secret leaves the variable unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    /// Variable name inside the unit.
    pub env: String,
    /// Name of the secret object holding the value.
    pub secret: String,
    /// Key within the secret.
    pub key: String,
}

impl SecretRef {
    pub fn new(env: impl Into<String>, secret: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            env: env.into(),
            secret: secret.into(),
            key: key.into(),
        }
    }

    /// Parse `ENV=secret/key`.
    pub fn parse(s: &str) -> Option<Self> {
        let (env, rest) = s.split_once('=')?;
        let (secret, key) = rest.split_once('/')?;
        if env.is_empty() || secret.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self::new(env, secret, key))
    }
}

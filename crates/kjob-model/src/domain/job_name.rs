use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MAX_JOB_NAME_LEN, ModelError};

/// Name of a job, unique within its namespace for the job's lifetime.
///
/// Always a valid DNS-1123 label: 1..=63 characters of `[a-z0-9-]`,
/// starting and ending with an alphanumeric character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JobName(String);

impl JobName {
    pub fn new(name: impl Into<String>) -> Result<Self, ModelError> {
        let name = name.into();
        validate(&name).map_err(|reason| ModelError::InvalidJobName {
            name: name.clone(),
            reason,
        })?;
        Ok(Self(name))
    }

    /// `{prefix}-{index}`.
    pub fn indexed(prefix: &str, index: usize) -> Result<Self, ModelError> {
        Self::new(format!("{prefix}-{index}"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn validate(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("empty");
    }
    if name.len() > MAX_JOB_NAME_LEN {
        return Err("longer than 63 characters");
    }
    if !name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    {
        return Err("only lowercase alphanumerics and '-' are allowed");
    }
    let alnum = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit();
    let bytes = name.as_bytes();
    if !alnum(bytes[0]) || !alnum(bytes[bytes.len() - 1]) {
        return Err("must start and end with an alphanumeric character");
    }
    Ok(())
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for JobName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for JobName {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<JobName> for String {
    fn from(name: JobName) -> Self {
        name.0
    }
}

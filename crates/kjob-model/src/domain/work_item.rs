use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ModelError, PayloadError, UnitIndex};

/// Logical unit of work handed to exactly one job.
///
/// Carried as a JSON object with at least an `id` field; any other
/// fields travel along untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl WorkItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            extra: Map::new(),
        }
    }

    /// Work item for the unit at `index` of a dispatch run: `id_{index}`.
    pub fn for_index(index: UnitIndex) -> Self {
        Self::new(format!("id_{index}"))
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Serialized form placed in the unit's environment.
    pub fn to_message(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_message(message: &str) -> Result<Self, PayloadError> {
        let value: Value = serde_json::from_str(message).map_err(PayloadError::Json)?;
        let Value::Object(mut fields) = value else {
            return Err(PayloadError::MissingId);
        };
        let id = match fields.remove("id") {
            Some(Value::String(id)) => id,
            _ => return Err(PayloadError::MissingId),
        };
        Ok(Self { id, extra: fields })
    }
}

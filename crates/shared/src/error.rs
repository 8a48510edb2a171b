use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error body returned by the analysis service on a non-2xx response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ServiceErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
        }
    }

    /// Human-readable reason carried by the body, if any.
    ///
    /// String details come back verbatim; structured details (validation
    /// error lists) are rendered as compact JSON.
    pub fn reason(&self) -> Option<String> {
        match self.detail.as_ref()? {
            Value::Null => None,
            Value::String(detail) if detail.trim().is_empty() => None,
            Value::String(detail) => Some(detail.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown data format: {token:?}")]
pub struct ParseOrientationError {
    pub token: String,
}

impl ParseOrientationError {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

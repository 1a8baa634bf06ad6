use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{domain::PresetId, form::CommandValues};

/// Uniform `{success, message}` object returned by every write endpoint.
///
/// Extra fields the controller sends along (e.g. the stored preset) are kept
/// in `payload`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(default)]
    pub success: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl ResultEnvelope {
    pub fn ok() -> Self {
        Self {
            success: Value::Bool(true),
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: Value::Bool(false),
            message: Some(Value::String(message.into())),
            payload: Map::new(),
        }
    }

    /// Only a literal `true` counts; a missing or truthy-looking field does not.
    pub fn is_success(&self) -> bool {
        self.success == Value::Bool(true)
    }

    /// Server-supplied explanation, falling back to an `error` field.
    pub fn message_text(&self) -> Option<String> {
        self.message
            .as_ref()
            .or_else(|| self.payload.get("error"))
            .filter(|value| !value.is_null())
            .map(|value| match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetSummary {
    pub id: PresetId,
    pub name: String,
}

/// Body of a preset create or update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetSubmission {
    pub json: CommandValues,
    pub animation: String,
    pub name: String,
}

/// One server-sent message from the scan stream, passed on untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub data: String,
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Prefix of the choice group that can override a control of the same name.
pub const OVERRIDE_GROUP_PREFIX: &str = "drop-down_";
/// Selection in an override group that defers to the base control.
pub const OVERRIDE_DEFER_OPTION: &str = "other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Range,
    Checkbox,
    Color,
    Radio,
    Text,
    #[serde(other)]
    Other,
}

/// One raw input as rendered by the page: radio buttons appear once per option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ControlKind,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub checked: bool,
}

impl ControlDescriptor {
    pub fn new(name: impl Into<String>, kind: ControlKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            checked: false,
        }
    }

    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Name of the control this descriptor overrides, if it belongs to an override group.
    pub fn overridden_control(&self) -> Option<&str> {
        if self.kind != ControlKind::Radio {
            return None;
        }
        self.name
            .strip_prefix(OVERRIDE_GROUP_PREFIX)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDescription {
    pub id: String,
    pub controls: Vec<ControlDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandValue {
    Integer(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl CommandValue {
    /// Text shown next to the control, e.g. a slider's output label.
    pub fn display_text(&self) -> String {
        match self {
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => format!("{value:.2}"),
            Self::Bool(value) => value.to_string(),
            Self::Text(value) => value.clone(),
        }
    }
}

impl From<i64> for CommandValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for CommandValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for CommandValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for CommandValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for CommandValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandValues(BTreeMap<String, CommandValue>);

impl CommandValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: CommandValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&CommandValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CommandValue)> {
        self.0.iter()
    }
}

impl FromIterator<(String, CommandValue)> for CommandValues {
    fn from_iter<I: IntoIterator<Item = (String, CommandValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

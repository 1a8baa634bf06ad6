use std::fmt;

use shared::form::{CommandValue, CommandValues, OVERRIDE_DEFER_OPTION};
use tracing::debug;

use crate::{
    error::ClientError,
    form::{Control, ControlInput, Form},
};

/// Color used when a color input does not hold six hex digits.
pub const FALLBACK_RGB: &str = "255,255,255";

/// Largest integer an `f64` represents exactly.
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractIssue {
    /// Neither the control nor an override group exists.
    Missing { name: String },
    /// A choice group with no selected option.
    NoSelection { name: String },
    InvalidNumber { name: String, raw: String },
}

impl ExtractIssue {
    pub fn name(&self) -> &str {
        match self {
            Self::Missing { name } | Self::NoSelection { name } | Self::InvalidNumber { name, .. } => {
                name
            }
        }
    }
}

impl fmt::Display for ExtractIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { name } => write!(f, "no control named '{name}'"),
            Self::NoSelection { name } => write!(f, "nothing selected for '{name}'"),
            Self::InvalidNumber { name, raw } => write!(f, "'{name}' is not a number: {raw:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub form: String,
    pub values: CommandValues,
    pub issues: Vec<ExtractIssue>,
}

impl Extraction {
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    /// Values for every requested name, or the list of names that could not be read.
    pub fn into_complete(self) -> Result<CommandValues, ClientError> {
        if self.issues.is_empty() {
            Ok(self.values)
        } else {
            Err(ClientError::Extraction {
                form: self.form,
                issues: self.issues,
            })
        }
    }
}

/// Reads `names` from `form`, one entry per name that resolves.
pub fn collect_values<S: AsRef<str>>(form: &Form, names: &[S]) -> Extraction {
    let mut values = CommandValues::new();
    let mut issues = Vec::new();

    for name in names {
        let name = name.as_ref();
        let resolved = match form.control(name) {
            Some(control) => extract_control(control),
            None => Err(ExtractIssue::Missing {
                name: name.to_string(),
            }),
        };
        match resolved {
            Ok(value) => values.insert(name, value),
            Err(issue) => issues.push(issue),
        }
    }

    debug!(
        form = form.id(),
        collected = values.len(),
        issues = issues.len(),
        "collected form values"
    );

    Extraction {
        form: form.id().to_string(),
        values,
        issues,
    }
}

fn extract_control(control: &Control) -> Result<CommandValue, ExtractIssue> {
    let selected_override = control
        .override_group
        .as_ref()
        .and_then(|group| group.selected_value());

    if let Some(selection) = selected_override {
        if selection != OVERRIDE_DEFER_OPTION || control.base.is_none() {
            return Ok(CommandValue::Text(selection.to_string()));
        }
    }

    match &control.base {
        Some(ControlInput::Range(raw)) => {
            parse_number(raw).ok_or_else(|| ExtractIssue::InvalidNumber {
                name: control.name.clone(),
                raw: raw.clone(),
            })
        }
        Some(ControlInput::Toggle(checked)) => Ok(CommandValue::Bool(*checked)),
        Some(ControlInput::Color(raw)) => Ok(CommandValue::Text(hex_to_rgb(raw))),
        Some(ControlInput::Choice(group)) => group
            .selected_value()
            .map(|value| CommandValue::Text(value.to_string()))
            .ok_or_else(|| ExtractIssue::NoSelection {
                name: control.name.clone(),
            }),
        Some(ControlInput::Text(raw)) => Ok(CommandValue::Text(raw.clone())),
        None => Err(ExtractIssue::NoSelection {
            name: control.name.clone(),
        }),
    }
}

/// Parses slider text the way a browser's `Number()` does for plain decimals.
/// Empty text reads as zero.
pub fn parse_number(raw: &str) -> Option<CommandValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Some(CommandValue::Integer(0));
    }
    if let Ok(value) = raw.parse::<i64>() {
        return Some(CommandValue::Integer(value));
    }
    let value = raw.parse::<f64>().ok().filter(|value| value.is_finite())?;
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        #[allow(clippy::cast_possible_truncation)]
        return Some(CommandValue::Integer(value as i64));
    }
    Some(CommandValue::Float(value))
}

/// Converts `#rrggbb` (leading `#` optional, any case) to decimal `"r,g,b"`.
pub fn hex_to_rgb(hex: &str) -> String {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return FALLBACK_RGB.to_string();
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => format!("{r},{g},{b}"),
        _ => FALLBACK_RGB.to_string(),
    }
}

#[cfg(test)]
#[path = "tests/extract_tests.rs"]
mod tests;

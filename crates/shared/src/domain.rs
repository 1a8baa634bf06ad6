use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

id_newtype!(PresetId);

/// Fixed one-shot commands the controller front end exposes as buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerAction {
    StopAnimation,
    Shutdown,
    Restart,
}

impl ControllerAction {
    pub fn key(self) -> &'static str {
        match self {
            Self::StopAnimation => "stop",
            Self::Shutdown | Self::Restart => "option",
        }
    }

    pub fn value(self) -> serde_json::Value {
        match self {
            Self::StopAnimation => serde_json::Value::Bool(true),
            Self::Shutdown => serde_json::Value::from("shutdown"),
            Self::Restart => serde_json::Value::from("restart"),
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::StopAnimation => "/anim/",
            Self::Shutdown | Self::Restart => "/api/rpi/",
        }
    }
}

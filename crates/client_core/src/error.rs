use shared::error::{Failure, FailureKind};
use thiserror::Error;

use crate::extract::ExtractIssue;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("controller returned status {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("malformed response (status {status}): {reason}")]
    Malformed { status: u16, reason: String },
    #[error("controller reported failure: {message}")]
    Rejected { status: u16, message: String },
    #[error("{0}")]
    Validation(String),
    #[error("scan stream failed: {0}")]
    Stream(String),
    #[error("form '{form}' is incomplete: {}", describe_issues(.issues))]
    Extraction {
        form: String,
        issues: Vec<ExtractIssue>,
    },
    #[error("invalid controller url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Transport(_) | Self::Status { .. } | Self::Malformed { .. } | Self::InvalidUrl(_) => {
                FailureKind::Transport
            }
            Self::Rejected { .. } => FailureKind::Application,
            Self::Validation(_) | Self::Extraction { .. } => FailureKind::Validation,
            Self::Stream(_) => FailureKind::Stream,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. }
            | Self::Malformed { status, .. }
            | Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text for the user-facing alert.
    pub fn notification_text(&self) -> String {
        match self {
            Self::Status { status, .. } => format!("Got error: {status}"),
            Self::Rejected { message, .. } => format!("Something went wrong...\n{message}"),
            Self::Malformed { status, reason } => {
                format!("Got malformed response (status {status}): {reason}")
            }
            Self::Transport(reason) => format!("Request failed: {reason}"),
            Self::Stream(reason) => format!("Scan stopped: {reason}"),
            other => other.to_string(),
        }
    }

    pub fn failure(&self) -> Failure {
        let message = match self {
            Self::Status {
                message: Some(message),
                ..
            } => format!("{self}: {message}"),
            Self::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Failure::new(self.kind(), self.status(), message)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("timed out: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

fn describe_issues(issues: &[ExtractIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//! Load/save dialog for the presets of one animation.

use reqwest::Method;
use shared::{
    domain::PresetId,
    form::CommandValues,
    protocol::{PresetSubmission, PresetSummary, ResultEnvelope},
};
use tracing::{debug, info};
use url::form_urlencoded;

use crate::{
    command::{CommandClient, STATUS_CREATED, STATUS_OK},
    config::Settings,
    error::ClientError,
    notify::Dismissal,
};

pub const NO_PRESET_SENTINEL: &str = "none";
pub const NO_PRESET_LABEL: &str = "No presets available";
pub const INVALID_NAME_MESSAGE: &str = "That's not a valid name";

const STATUS_NOT_FOUND: u16 = 404;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresetEntry {
    Preset(PresetSummary),
    /// Placeholder shown when the animation has no presets.
    Sentinel,
}

impl PresetEntry {
    pub fn value(&self) -> String {
        match self {
            Self::Preset(summary) => summary.id.to_string(),
            Self::Sentinel => NO_PRESET_SENTINEL.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Preset(summary) => &summary.name,
            Self::Sentinel => NO_PRESET_LABEL,
        }
    }
}

/// Entries of an open dialog. The selector and the confirm button are enabled
/// together, and only when there is at least one real preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetSelection {
    entries: Vec<PresetEntry>,
    selected: usize,
    enabled: bool,
}

impl PresetSelection {
    pub fn from_presets(presets: Vec<PresetSummary>) -> Self {
        if presets.is_empty() {
            return Self {
                entries: vec![PresetEntry::Sentinel],
                selected: 0,
                enabled: false,
            };
        }
        Self {
            entries: presets.into_iter().map(PresetEntry::Preset).collect(),
            selected: 0,
            enabled: true,
        }
    }

    pub fn entries(&self) -> &[PresetEntry] {
        &self.entries
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> Option<&PresetEntry> {
        self.entries.get(self.selected)
    }

    pub fn selector_enabled(&self) -> bool {
        self.enabled
    }

    pub fn confirm_enabled(&self) -> bool {
        self.enabled
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogState {
    Closed,
    Listing,
    Ready(PresetSelection),
    Saving,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveTarget {
    Create,
    Update(PresetId),
}

/// A confirmed choice: which preset to put on which animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetApplication {
    pub animation: String,
    pub preset_id: PresetId,
}

impl PresetApplication {
    pub fn target(&self, home_path: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("animation", &self.animation)
            .append_pair("preset", &self.preset_id.to_string())
            .finish();
        format!("{home_path}?{query}")
    }
}

pub struct PresetDialog {
    client: CommandClient,
    presets_path: String,
    home_path: String,
    animation: String,
    state: DialogState,
}

impl PresetDialog {
    pub fn new(client: CommandClient, settings: &Settings, animation: impl Into<String>) -> Self {
        Self {
            client,
            presets_path: settings.presets_path.trim_end_matches('/').to_string(),
            home_path: settings.home_path.clone(),
            animation: animation.into(),
            state: DialogState::Closed,
        }
    }

    pub fn animation(&self) -> &str {
        &self.animation
    }

    pub fn state(&self) -> &DialogState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, DialogState::Closed)
    }

    /// Fetches the animation's presets. On failure the alert is posted and the
    /// dialog keeps its previous state.
    pub async fn open(&mut self) -> Result<PresetSelection, ClientError> {
        let prior = std::mem::replace(&mut self.state, DialogState::Listing);
        match self.list().await {
            Ok(presets) => {
                debug!(animation = %self.animation, count = presets.len(), "presets listed");
                let selection = PresetSelection::from_presets(presets);
                self.state = DialogState::Ready(selection.clone());
                Ok(selection)
            }
            Err(err) => {
                self.state = prior;
                self.client.report_failure(&err);
                Err(err)
            }
        }
    }

    /// Closes an open dialog, opens a closed one.
    pub async fn toggle(&mut self) -> Result<Option<PresetSelection>, ClientError> {
        if self.is_open() {
            self.cancel();
            Ok(None)
        } else {
            self.open().await.map(Some)
        }
    }

    pub fn select(&mut self, index: usize) -> Result<(), ClientError> {
        match &mut self.state {
            DialogState::Ready(selection) if selection.enabled => {
                if index >= selection.entries.len() {
                    return Err(ClientError::Validation(format!(
                        "no preset at position {index}"
                    )));
                }
                selection.selected = index;
                Ok(())
            }
            DialogState::Ready(_) => Err(ClientError::Validation(NO_PRESET_LABEL.to_string())),
            _ => Err(ClientError::Validation("preset dialog is not open".to_string())),
        }
    }

    pub fn cancel(&mut self) {
        self.state = DialogState::Closed;
    }

    /// Closes the dialog and returns the chosen preset, if a real one was selected.
    pub fn confirm(&mut self) -> Option<PresetApplication> {
        let DialogState::Ready(selection) = std::mem::replace(&mut self.state, DialogState::Closed)
        else {
            return None;
        };
        match selection.selected() {
            Some(PresetEntry::Preset(summary)) if selection.enabled => Some(PresetApplication {
                animation: self.animation.clone(),
                preset_id: summary.id,
            }),
            _ => None,
        }
    }

    /// Requests the application target. Only the status is checked since the
    /// controller answers with a page, not an envelope.
    pub async fn apply(&self, application: &PresetApplication) -> Result<u16, ClientError> {
        let target = application.target(&self.home_path);
        info!(%target, "applying preset");

        let result = match self.client.transport().request(Method::GET, &target, None).await {
            Ok(response) if response.is_success() => Ok(response.status),
            Ok(response) => Err(ClientError::Status {
                status: response.status,
                message: None,
            }),
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            self.client.report_failure(err);
        }
        result
    }

    /// Stores `payload` under `name`. A blank name is rejected before anything
    /// is sent.
    pub async fn save(
        &mut self,
        target: SaveTarget,
        payload: &CommandValues,
        name: &str,
    ) -> Result<ResultEnvelope, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            let err = ClientError::Validation(INVALID_NAME_MESSAGE.to_string());
            self.client.report_failure(&err);
            return Err(err);
        }

        let path = match target {
            SaveTarget::Create => format!("{}/create", self.presets_path),
            SaveTarget::Update(id) => format!("{}/{id}", self.presets_path),
        };
        let submission = PresetSubmission {
            json: payload.clone(),
            animation: self.animation.clone(),
            name: name.to_string(),
        };

        let prior = std::mem::replace(&mut self.state, DialogState::Saving);
        let result = match serde_json::to_value(&submission) {
            Ok(body) => {
                self.client
                    .exchange(Method::POST, &path, Some(body), STATUS_CREATED)
                    .await
            }
            Err(err) => Err(ClientError::Validation(format!(
                "preset cannot be encoded: {err}"
            ))),
        };
        self.client
            .report(&result, Dismissal::After(self.client.dismiss_after()));

        match &result {
            Ok(_) => {
                info!(animation = %self.animation, preset = name, ?target, "preset saved");
                self.state = DialogState::Closed;
            }
            Err(_) => self.state = prior,
        }
        result
    }

    async fn list(&self) -> Result<Vec<PresetSummary>, ClientError> {
        let path = format!(
            "{}/animation/{}",
            self.presets_path,
            encode_segment(&self.animation)
        );
        let response = self.client.transport().request(Method::GET, &path, None).await?;

        match response.status {
            STATUS_OK => serde_json::from_str(&response.body).map_err(|err| ClientError::Malformed {
                status: response.status,
                reason: err.to_string(),
            }),
            STATUS_NOT_FOUND => Ok(Vec::new()),
            status => Err(ClientError::Status {
                status,
                message: serde_json::from_str::<ResultEnvelope>(&response.body)
                    .ok()
                    .and_then(|envelope| envelope.message_text()),
            }),
        }
    }
}

fn encode_segment(segment: &str) -> String {
    form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
#[path = "tests/presets_tests.rs"]
mod tests;

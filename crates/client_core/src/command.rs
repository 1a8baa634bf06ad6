use std::{sync::Arc, time::Duration};

use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use shared::{domain::ControllerAction, protocol::ResultEnvelope};
use tracing::{info, warn};

use crate::{
    config::Settings,
    error::ClientError,
    notify::{Dismissal, NotificationBoard},
    transport::{HttpTransport, RawResponse, Transport},
};

pub const STATUS_OK: u16 = 200;
pub const STATUS_CREATED: u16 = 201;

/// Dispatches commands to the controller and reports every outcome on the
/// notification board, exactly one notification per call.
#[derive(Clone)]
pub struct CommandClient {
    transport: Arc<dyn Transport>,
    notifications: NotificationBoard,
    dismiss_after: Duration,
}

impl CommandClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        notifications: NotificationBoard,
        dismiss_after: Duration,
    ) -> Self {
        Self {
            transport,
            notifications,
            dismiss_after,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        let transport = HttpTransport::from_settings(settings)?;
        Ok(Self::new(
            Arc::new(transport),
            NotificationBoard::new(),
            settings.notification_dismiss(),
        ))
    }

    pub fn notifications(&self) -> &NotificationBoard {
        &self.notifications
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn dismiss_after(&self) -> Duration {
        self.dismiss_after
    }

    /// Sends `payload` as the JSON body. The success notification hides itself.
    pub async fn send<P>(
        &self,
        method: Method,
        path: &str,
        payload: &P,
    ) -> Result<ResultEnvelope, ClientError>
    where
        P: Serialize + ?Sized,
    {
        let result = match encode(payload) {
            Ok(body) => self.exchange(method, path, Some(body), STATUS_OK).await,
            Err(err) => Err(err),
        };
        self.report(&result, Dismissal::After(self.dismiss_after));
        result
    }

    /// Posts `{key: value}`. The success notification stays until replaced.
    pub async fn command<V>(
        &self,
        key: &str,
        value: V,
        path: &str,
    ) -> Result<ResultEnvelope, ClientError>
    where
        V: Serialize,
    {
        let result = match encode(&value) {
            Ok(value) => {
                let mut body = Map::new();
                body.insert(key.to_string(), value);
                self.exchange(Method::POST, path, Some(Value::Object(body)), STATUS_OK)
                    .await
            }
            Err(err) => Err(err),
        };
        self.report(&result, Dismissal::Sticky);
        result
    }

    pub async fn action(&self, action: ControllerAction) -> Result<ResultEnvelope, ClientError> {
        info!(?action, "controller action");
        self.command(action.key(), action.value(), action.path()).await
    }

    /// One round trip without touching the notification board.
    pub(crate) async fn exchange(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        expected_status: u16,
    ) -> Result<ResultEnvelope, ClientError> {
        let response = self.transport.request(method, path, body).await?;
        interpret(&response, expected_status)
    }

    pub(crate) fn report(&self, result: &Result<ResultEnvelope, ClientError>, dismissal: Dismissal) {
        match result {
            Ok(_) => {
                self.notifications.success(dismissal);
            }
            Err(err) => self.report_failure(err),
        }
    }

    pub(crate) fn report_failure(&self, err: &ClientError) {
        warn!(kind = ?err.kind(), status = ?err.status(), "controller call failed: {err}");
        self.notifications.error(err);
    }
}

/// Reads a response against the envelope contract. The status is checked before
/// the body, so an unexpected status fails even when the body reports success.
pub fn interpret(response: &RawResponse, expected_status: u16) -> Result<ResultEnvelope, ClientError> {
    let parsed = serde_json::from_str::<ResultEnvelope>(&response.body);

    if response.status != expected_status {
        return Err(ClientError::Status {
            status: response.status,
            message: parsed.ok().and_then(|envelope| envelope.message_text()),
        });
    }

    let envelope = parsed.map_err(|err| ClientError::Malformed {
        status: response.status,
        reason: err.to_string(),
    })?;

    if !envelope.is_success() {
        return Err(ClientError::Rejected {
            status: response.status,
            message: envelope.message_text().unwrap_or_default(),
        });
    }

    Ok(envelope)
}

fn encode<P: Serialize + ?Sized>(payload: &P) -> Result<Value, ClientError> {
    serde_json::to_value(payload)
        .map_err(|err| ClientError::Validation(format!("payload cannot be encoded: {err}")))
}

#[cfg(test)]
#[path = "tests/command_tests.rs"]
mod tests;

//! Request/response and push-stream primitives the rest of the client is written against.

use std::time::Duration;

use async_trait::async_trait;
use futures::{stream::BoxStream, StreamExt, TryStreamExt};
use reqwest::{header, Client, Method};
use serde_json::Value;
use shared::protocol::{ResultEnvelope, ScanEvent};
use tokio_util::{codec::FramedRead, io::StreamReader};
use tracing::debug;
use url::Url;

use crate::{config::Settings, error::ClientError, sse};

pub type EventStream = BoxStream<'static, Result<ScanEvent, ClientError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues one request. A JSON `body` is sent with a JSON content type.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<RawResponse, ClientError>;

    /// Opens a server-sent event stream; the stream ends on transport error or close.
    async fn open_stream(&self, path: &str) -> Result<EventStream, ClientError>;
}

/// [`Transport`] over HTTP, resolving paths against the controller base URL.
pub struct HttpTransport {
    http: Client,
    base_url: Url,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|err| ClientError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(base_url.to_string()));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = Client::builder()
            .connect_timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            request_timeout,
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        Self::new(&settings.controller_url, settings.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Paths are taken relative to the base URL, so a base of `http://host/rig`
    /// maps `/presets/create` to `http://host/rig/presets/create`.
    pub fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ClientError::InvalidUrl(format!("{path}: {err}")))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<RawResponse, ClientError> {
        let url = self.endpoint(path)?;
        debug!(%method, %url, "controller request");

        let mut request = self
            .http
            .request(method, url)
            .timeout(self.request_timeout);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }

    async fn open_stream(&self, path: &str) -> Result<EventStream, ClientError> {
        let url = self.endpoint(path)?;
        debug!(%url, "opening event stream");

        let response = self
            .http
            .get(url)
            .header(header::ACCEPT, "text/event-stream")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ResultEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.message_text());
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response.bytes_stream().map_err(std::io::Error::other);
        let lines = FramedRead::new(StreamReader::new(bytes), sse::line_codec());
        Ok(sse::decode(lines).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let transport =
            HttpTransport::new("http://rig.local:5000/rig", Duration::from_secs(1)).expect("transport");
        assert_eq!(
            transport.endpoint("/presets/create").expect("url").as_str(),
            "http://rig.local:5000/rig/presets/create"
        );
        assert_eq!(
            transport
                .endpoint("/home?animation=fade&preset=3")
                .expect("url")
                .as_str(),
            "http://rig.local:5000/rig/home?animation=fade&preset=3"
        );
    }

    #[test]
    fn rejects_unusable_base_urls() {
        assert!(matches!(
            HttpTransport::new("not a url", Duration::from_secs(1)),
            Err(ClientError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpTransport::new("mailto:rig@example.com", Duration::from_secs(1)),
            Err(ClientError::InvalidUrl(_))
        ));
    }
}

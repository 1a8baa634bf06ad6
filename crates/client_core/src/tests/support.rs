//! Local stand-in for the rig controller used by the HTTP tests.

use std::{
    collections::HashMap,
    convert::Infallible,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::State,
    http::{Method as HttpMethod, StatusCode, Uri},
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
    routing::get,
    Router,
};
use futures::StreamExt;
use serde_json::Value;
use tokio::{net::TcpListener, sync::mpsc};
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::{command::CommandClient, notify::NotificationBoard, transport::HttpTransport};

pub(crate) const DISMISS_AFTER: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
pub(crate) struct MockController {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responses: Arc<Mutex<HashMap<String, (u16, String)>>>,
    delays: Arc<Mutex<HashMap<String, Duration>>>,
    scan_feed: Arc<Mutex<Option<mpsc::UnboundedReceiver<String>>>>,
}

impl MockController {
    pub(crate) fn respond(&self, method: &str, path: &str, status: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .expect("responses lock")
            .insert(format!("{method} {path}"), (status, body.into()));
    }

    /// Like [`Self::respond`], but the answer is held back for `delay`.
    pub(crate) fn respond_after(
        &self,
        delay: Duration,
        method: &str,
        path: &str,
        status: u16,
        body: impl Into<String>,
    ) {
        self.delays
            .lock()
            .expect("delays lock")
            .insert(format!("{method} {path}"), delay);
        self.respond(method, path, status, body);
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub(crate) fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path == path)
            .collect()
    }

    /// Feeds the next scan stream connection; dropping the sender ends that stream.
    pub(crate) fn scan_feed(&self) -> mpsc::UnboundedSender<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.scan_feed.lock().expect("scan lock") = Some(rx);
        tx
    }

    fn record(&self, method: &HttpMethod, uri: &Uri, content_type: Option<String>, body: &[u8]) {
        let path = uri
            .path_and_query()
            .map_or_else(|| uri.path().to_string(), ToString::to_string);
        self.requests.lock().expect("requests lock").push(RecordedRequest {
            method: method.to_string(),
            path,
            content_type,
            body: serde_json::from_slice(body).ok(),
        });
    }
}

async fn handle_any(
    State(state): State<MockController>,
    method: HttpMethod,
    uri: Uri,
    headers: axum::http::HeaderMap,
    body: Bytes,
) -> Response {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.record(&method, &uri, content_type, &body);

    let key = format!("{method} {}", uri.path());
    let delay = state.delays.lock().expect("delays lock").get(&key).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    let canned = state.responses.lock().expect("responses lock").get(&key).cloned();
    match canned {
        Some((status, body)) => (
            StatusCode::from_u16(status).expect("valid status"),
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn handle_scan(State(state): State<MockController>, uri: Uri) -> Response {
    state.record(&HttpMethod::GET, &uri, None, &[]);
    let feed = state.scan_feed.lock().expect("scan lock").take();
    match feed {
        Some(rx) => {
            let events = UnboundedReceiverStream::new(rx)
                .map(|data| Ok::<_, Infallible>(Event::default().data(data)));
            Sse::new(events).into_response()
        }
        None => (
            StatusCode::CONFLICT,
            r#"{"success": false, "message": "scan already running"}"#,
        )
            .into_response(),
    }
}

pub(crate) async fn spawn_controller() -> (String, MockController) {
    let state = MockController::default();
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/bluetooth/scan", get(handle_scan))
        .fallback(handle_any)
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

pub(crate) fn client_for(base_url: &str) -> CommandClient {
    client_with_timeout(base_url, Duration::from_secs(5))
}

pub(crate) fn client_with_timeout(base_url: &str, request_timeout: Duration) -> CommandClient {
    let transport = HttpTransport::new(base_url, request_timeout).expect("transport");
    CommandClient::new(Arc::new(transport), NotificationBoard::new(), DISMISS_AFTER)
}

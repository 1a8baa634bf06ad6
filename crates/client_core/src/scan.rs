//! Device-discovery scan driven by a server-sent event stream.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt;
use reqwest::Method;
use shared::protocol::{ResultEnvelope, ScanEvent};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    command::{CommandClient, STATUS_OK},
    config::Settings,
    error::ClientError,
    transport::EventStream,
};

/// Receives what the scan stream produces. Both callbacks run on the runtime's
/// worker threads and must not block for long.
pub trait ScanSink: Send + Sync {
    fn on_event(&self, event: ScanEvent);

    /// Called once when the stream fails or the controller closes it.
    fn on_error(&self, _err: &ClientError) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Idle,
    Streaming,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStart {
    Started,
    AlreadyStreaming,
}

#[derive(Debug)]
pub struct ScanStop {
    /// Whether a local stream was still open.
    pub local_closed: bool,
    /// The controller's stop endpoint answers `{"message": ...}` without a
    /// `success` field, so a completed stop usually arrives as `Rejected`.
    pub remote: Result<ResultEnvelope, ClientError>,
}

pub struct ScanController {
    client: CommandClient,
    scan_path: String,
    stop_path: String,
    sink: Arc<dyn ScanSink>,
    /// Generation of the stream allowed to reach the sink, if any.
    active: Arc<Mutex<Option<u64>>>,
    task: Option<JoinHandle<()>>,
    generation: u64,
}

impl ScanController {
    pub fn new(client: CommandClient, settings: &Settings, sink: Arc<dyn ScanSink>) -> Self {
        Self {
            client,
            scan_path: settings.scan_path.clone(),
            stop_path: settings.stop_scan_path.clone(),
            sink,
            active: Arc::new(Mutex::new(None)),
            task: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> ScanState {
        if lock(&self.active).is_some() {
            ScanState::Streaming
        } else {
            ScanState::Idle
        }
    }

    pub async fn start(&mut self) -> Result<ScanStart, ClientError> {
        if self.state() == ScanState::Streaming {
            warn!(path = %self.scan_path, "scan already streaming; start ignored");
            return Ok(ScanStart::AlreadyStreaming);
        }

        let events = match self.client.transport().open_stream(&self.scan_path).await {
            Ok(events) => events,
            Err(err) => {
                self.client.report_failure(&err);
                return Err(err);
            }
        };

        self.generation += 1;
        let generation = self.generation;
        *lock(&self.active) = Some(generation);
        info!(generation, path = %self.scan_path, "scan started");

        if let Some(stale) = self.task.take() {
            stale.abort();
        }
        self.task = Some(tokio::spawn(forward(
            events,
            generation,
            Arc::clone(&self.active),
            Arc::clone(&self.sink),
            self.client.clone(),
        )));
        Ok(ScanStart::Started)
    }

    /// Closes the local stream, then asks the controller to stop scanning.
    /// The two halves are independent and neither failure is raised.
    pub async fn stop(&mut self) -> ScanStop {
        let local_closed = self.close_local();

        let remote = self
            .client
            .exchange(Method::POST, &self.stop_path, None, STATUS_OK)
            .await;
        match &remote {
            Ok(_) => info!(local_closed, "scan stopped"),
            Err(ClientError::Rejected { message, .. }) => {
                info!(local_closed, "scan stopped: {message}");
            }
            Err(err) => warn!(local_closed, "remote scan stop failed: {err}"),
        }

        ScanStop {
            local_closed,
            remote,
        }
    }

    fn close_local(&mut self) -> bool {
        let was_open = lock(&self.active).take().is_some();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        was_open
    }
}

impl Drop for ScanController {
    fn drop(&mut self) {
        if self.close_local() {
            debug!("scan stream closed on drop");
        }
    }
}

async fn forward(
    mut events: EventStream,
    generation: u64,
    active: Arc<Mutex<Option<u64>>>,
    sink: Arc<dyn ScanSink>,
    client: CommandClient,
) {
    let failure = loop {
        match events.next().await {
            Some(Ok(event)) => {
                // Delivered under the lock so that a concurrent stop() either
                // waits for this event or prevents it.
                let current = lock(&active);
                if *current != Some(generation) {
                    return;
                }
                sink.on_event(event);
            }
            Some(Err(err)) => break err,
            None => break ClientError::Stream("stream closed by controller".to_string()),
        }
    };

    {
        let mut current = lock(&active);
        if *current != Some(generation) {
            return;
        }
        *current = None;
    }

    warn!(generation, "scan stream ended: {failure}");
    sink.on_error(&failure);
    client.report_failure(&failure);
}

fn lock(active: &Mutex<Option<u64>>) -> MutexGuard<'_, Option<u64>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
#[path = "tests/scan_tests.rs"]
mod tests;

//! Server-sent events framing on top of a line stream.

use std::pin::Pin;

use futures::{stream, Stream, StreamExt};
use shared::protocol::ScanEvent;
use tokio_util::codec::LinesCodec;

use crate::error::ClientError;

/// Longest single line accepted from the stream.
pub(crate) const MAX_LINE_BYTES: usize = 64 * 1024;
/// Most data buffered for one message before its terminating blank line.
pub(crate) const MAX_EVENT_BYTES: usize = 1024 * 1024;

pub(crate) fn line_codec() -> LinesCodec {
    LinesCodec::new_with_max_length(MAX_LINE_BYTES)
}

#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    event: Option<String>,
    id: Option<String>,
    data: Vec<String>,
    buffered: usize,
}

impl SseDecoder {
    /// Feeds one line (without its terminator); a blank line completes a message.
    pub(crate) fn push_line(&mut self, line: &str) -> Result<Option<ScanEvent>, ClientError> {
        if line.is_empty() {
            return Ok(self.dispatch());
        }
        if line.starts_with(':') {
            return Ok(None);
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field.trim_start_matches('\u{feff}') {
            "data" => {
                self.buffered += value.len() + 1;
                if self.buffered > MAX_EVENT_BYTES {
                    self.event = None;
                    self.data.clear();
                    self.buffered = 0;
                    return Err(ClientError::Stream(format!(
                        "event data exceeds {MAX_EVENT_BYTES} bytes"
                    )));
                }
                self.data.push(value.to_string());
            }
            "event" => self.event = Some(value.to_string()),
            "id" if !value.contains('\0') => self.id = Some(value.to_string()),
            _ => {}
        }
        Ok(None)
    }

    /// Messages whose data is empty are dropped, as `EventSource` does.
    fn dispatch(&mut self) -> Option<ScanEvent> {
        let event = self.event.take();
        let data = std::mem::take(&mut self.data).join("\n");
        self.buffered = 0;
        if data.is_empty() {
            return None;
        }
        Some(ScanEvent {
            event,
            id: self.id.clone(),
            data,
        })
    }
}

/// Turns a stream of text lines into scan events. A line error ends the stream
/// after yielding it; a trailing message without its blank line is dropped.
pub(crate) fn decode<S, E>(lines: S) -> impl Stream<Item = Result<ScanEvent, ClientError>>
where
    S: Stream<Item = Result<String, E>> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let lines: Pin<Box<S>> = Box::pin(lines);
    stream::unfold(
        Some((lines, SseDecoder::default())),
        |state| async move {
            let (mut lines, mut decoder) = state?;
            loop {
                match lines.next().await {
                    Some(Ok(line)) => match decoder.push_line(&line) {
                        Ok(Some(event)) => return Some((Ok(event), Some((lines, decoder)))),
                        Ok(None) => {}
                        Err(err) => return Some((Err(err), None)),
                    },
                    Some(Err(err)) => {
                        return Some((Err(ClientError::Stream(err.to_string())), None));
                    }
                    None => return None,
                }
            }
        },
    )
}

//! The single user-facing notification slot.
//!
//! Every post bumps a generation counter and replaces whatever is showing, so the
//! last writer wins. A timed notification only hides itself: if a newer one was
//! posted in the meantime, the timer leaves it alone.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::ClientError;

pub const SUCCESS_TEXT: &str = "success!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dismissal {
    After(Duration),
    /// Stays until another notification replaces it or it is dismissed.
    Sticky,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub generation: u64,
    pub level: NotificationLevel,
    pub text: String,
    pub dismissal: Dismissal,
}

#[derive(Clone)]
pub struct NotificationBoard {
    inner: Arc<BoardInner>,
}

struct BoardInner {
    latest: watch::Sender<Option<Notification>>,
    generation: AtomicU64,
}

impl Default for NotificationBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBoard {
    pub fn new() -> Self {
        let (latest, _) = watch::channel(None);
        Self {
            inner: Arc::new(BoardInner {
                latest,
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Posts a notification and returns its generation.
    pub fn show(&self, level: NotificationLevel, text: impl Into<String>, dismissal: Dismissal) -> u64 {
        let text = text.into();
        let mut generation = 0;
        self.inner.latest.send_modify(|slot| {
            generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            *slot = Some(Notification {
                generation,
                level,
                text,
                dismissal,
            });
        });
        debug!(generation, ?level, "notification posted");

        if let Dismissal::After(delay) = dismissal {
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let board = self.clone();
                    handle.spawn(async move {
                        tokio::time::sleep(delay).await;
                        board.dismiss(generation);
                    });
                }
                Err(_) => warn!(generation, "no runtime available; notification will not auto-dismiss"),
            }
        }

        generation
    }

    pub fn success(&self, dismissal: Dismissal) -> u64 {
        self.show(NotificationLevel::Success, SUCCESS_TEXT, dismissal)
    }

    /// Errors stay visible until replaced, like a blocking alert would.
    pub fn error(&self, err: &ClientError) -> u64 {
        self.show(NotificationLevel::Error, err.notification_text(), Dismissal::Sticky)
    }

    /// Hides the notification only if `generation` is still the one showing.
    pub fn dismiss(&self, generation: u64) -> bool {
        self.inner.latest.send_if_modified(|slot| {
            if slot.as_ref().map(|current| current.generation) == Some(generation) {
                *slot = None;
                true
            } else {
                false
            }
        })
    }

    pub fn dismiss_current(&self) -> bool {
        self.inner.latest.send_if_modified(|slot| slot.take().is_some())
    }

    pub fn current(&self) -> Option<Notification> {
        self.inner.latest.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Notification>> {
        self.inner.latest.subscribe()
    }
}

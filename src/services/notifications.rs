//! User-facing notification channel
//!
//! Services never fail on local validation problems; they report them here and
//! leave state unchanged. The front end owns the receiving half and decides
//! how to display each message.

use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

pub type NotificationReceiver = UnboundedReceiver<Notification>;

/// Sending half, cheap to clone into every service
#[derive(Clone)]
pub struct Notifier {
    tx: UnboundedSender<Notification>,
}

impl Notifier {
    pub fn channel() -> (Self, NotificationReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn notify(&self, level: Level, message: impl Into<String>) {
        let message = message.into();
        // Dropped receivers just mean nobody is listening
        if self.tx.send(Notification { level, message }).is_err() {
            tracing::trace!("Notification dropped: no receiver");
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.notify(Level::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.notify(Level::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.notify(Level::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.notify(Level::Error, message);
    }
}

/// Collect everything currently queued
pub fn drain(rx: &mut NotificationReceiver) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

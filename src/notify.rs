//! User-facing notifications. Fire-and-forget: nothing the core does depends
//! on whether a notification was shown.

use std::sync::Arc;

use parking_lot::Mutex;

pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn failure(&self, message: &str);
}

/// Prints notifications for the command line, unless silenced.
pub struct ConsoleNotifier {
    pub silent: bool,
}

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        tracing::info!("{}", message);
        if !self.silent {
            println!("{}", message);
        }
    }

    fn failure(&self, message: &str) {
        tracing::warn!("{}", message);
        if !self.silent {
            eprintln!("{}", message);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Keeps the latest notification so the dashboard can show it in its status
/// line.
#[derive(Clone, Default)]
pub struct StatusLine {
    latest: Arc<Mutex<Option<Notice>>>,
}

impl StatusLine {
    pub fn latest(&self) -> Option<Notice> {
        self.latest.lock().clone()
    }

    pub fn clear(&self) {
        self.latest.lock().take();
    }

    fn set(&self, kind: NoticeKind, message: &str) {
        *self.latest.lock() = Some(Notice { kind, message: message.to_string() });
    }
}

impl Notifier for StatusLine {
    fn success(&self, message: &str) {
        tracing::info!("{}", message);
        self.set(NoticeKind::Success, message);
    }

    fn failure(&self, message: &str) {
        tracing::warn!("{}", message);
        self.set(NoticeKind::Failure, message);
    }
}

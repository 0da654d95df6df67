use std::time::{Duration, Instant};

/// Severity of a popup shown over the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Error,
}

impl NotificationKind {
    fn timeout(&self) -> Duration {
        match self {
            NotificationKind::Info => Duration::from_secs(3),
            NotificationKind::Error => Duration::from_secs(10),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            NotificationKind::Info => "Info",
            NotificationKind::Error => "Oops",
        }
    }
}

/// Auto-dismissing popup message.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    shown_at: Instant,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Info)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NotificationKind::Error)
    }

    fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            message: message.into(),
            kind,
            shown_at: Instant::now(),
        }
    }

    pub fn should_dismiss(&self) -> bool {
        self.shown_at.elapsed() > self.kind.timeout()
    }
}

//! User-facing side effects: transient notices and the login redirect.

use std::fmt;

use tracing::{error, info};

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// An operation completed.
    Success,
    /// Neutral information such as an expired session.
    Info,
    /// An operation failed.
    Error,
}

impl NoticeLevel {
    /// Short label used by text renderers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text shown to the user.
    pub message: String,
}

impl Notice {
    /// Build a notice.
    #[must_use]
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Sink for transient notices.
pub trait Notifier: Send + Sync {
    /// Show `notice` to the user.
    fn notify(&self, notice: Notice);
}

/// Sends notices to the tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success | NoticeLevel::Info => {
                info!(level = %notice.level, message = %notice.message, "notice");
            }
            NoticeLevel::Error => error!(message = %notice.message, "notice"),
        }
    }
}

/// Moves the user to the sign-in entry point once the session ends.
pub trait Navigator: Send + Sync {
    /// Send the user to the login screen.
    fn redirect_to_login(&self);
}

/// Navigator for headless callers that have no login screen.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn redirect_to_login(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_render_their_labels() {
        let rendered: Vec<String> = [NoticeLevel::Success, NoticeLevel::Info, NoticeLevel::Error]
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(rendered, ["success", "info", "error"]);
    }

    #[test]
    fn notice_keeps_level_and_text() {
        let notice = Notice::new(NoticeLevel::Error, "Failed to fetch budgets");
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Failed to fetch budgets");
    }
}

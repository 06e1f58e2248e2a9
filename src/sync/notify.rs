//! User-facing notification sink

use std::fmt;

use colored::Colorize;

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotifyLevel::Success => "success",
            NotifyLevel::Info => "info",
            NotifyLevel::Warning => "warning",
            NotifyLevel::Error => "error",
        };
        f.write_str(s)
    }
}

/// Receives toast-style messages about sync progress.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotifyLevel, message: &str);
}

/// Prints notifications to stderr.
#[derive(Debug, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        log_notification(level, message);
        let marker = match level {
            NotifyLevel::Success => "✓".green(),
            NotifyLevel::Info => "○".dimmed(),
            NotifyLevel::Warning => "⚠".yellow(),
            NotifyLevel::Error => "✗".red(),
        };
        eprintln!("{} {}", marker, message);
    }
}

/// Mirror a notification into the log.
pub fn log_notification(level: NotifyLevel, message: &str) {
    match level {
        NotifyLevel::Success | NotifyLevel::Info => log::info!("[{}] {}", level, message),
        NotifyLevel::Warning => log::warn!("[{}] {}", level, message),
        NotifyLevel::Error => log::error!("[{}] {}", level, message),
    }
}

#[cfg(test)]
pub use recording::RecordingNotifier;

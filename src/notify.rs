use std::sync::Mutex;

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}
pub(crate) use println_colored;

pub const GREEN: &str = "\x1b[32m";
pub const AMBER: &str = "\x1b[33m";
pub const DIM: &str = "\x1b[2m";
pub const BOLD: &str = "\x1b[1m";
pub const GOLD: &str = "\x1b[38;2;196;160;68m";

/// Where user-facing messages go. The daemon prints to the terminal; an
/// editor integration would map these onto its own popups and status bar.
pub trait Notifier: Send + Sync {
    /// Non-blocking informational popup (reminders, prayer notices).
    fn info(&self, message: &str);
    /// Non-blocking warning (fetch failures, bad settings).
    fn warn(&self, message: &str);
    /// Persistent one-line status, replaced on every call.
    fn status(&self, text: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn info(&self, message: &str) {
        println_colored!(GOLD, "  {}", message);
    }

    fn warn(&self, message: &str) {
        println_colored!(AMBER, "  ⚠ {}", message);
    }

    fn status(&self, text: &str) {
        println_colored!(DIM, "  ⏱ {}", text);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Warn(String),
    Status(String),
}

/// Keeps every message in memory; used to observe a session in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Warn(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::Info(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn push(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(notice);
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) {
        self.push(Notice::Info(message.to_string()));
    }

    fn warn(&self, message: &str) {
        self.push(Notice::Warn(message.to_string()));
    }

    fn status(&self, text: &str) {
        self.push(Notice::Status(text.to_string()));
    }
}

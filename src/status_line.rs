//! Status line shown by the host window
//!
//! Tracks leader state for display and holds the latest notice until it
//! expires.

use std::time::{Duration, Instant};

use crate::keymap::{sequence_display, Hotkey};
use crate::leader::StatusReporter;

pub const APP_TITLE: &str = "leader-keys";

/// How long a notice stays visible
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

/// A notice that auto-expires
#[derive(Debug, Clone)]
pub struct TransientNotice {
    pub text: String,
    pub expires_at: Instant,
}

impl TransientNotice {
    pub fn new(text: impl Into<String>, duration: Duration) -> Self {
        Self {
            text: text.into(),
            expires_at: Instant::now() + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

#[derive(Debug)]
pub struct StatusLine {
    active: bool,
    sequence: String,
    notice: Option<TransientNotice>,
    notice_duration: Duration,
    prompt_requested: bool,
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::new(NOTICE_DURATION)
    }
}

impl StatusLine {
    pub fn new(notice_duration: Duration) -> Self {
        Self {
            active: false,
            sequence: String::new(),
            notice: None,
            notice_duration,
            prompt_requested: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Current notice, if it has not expired
    pub fn notice(&self) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|n| !n.is_expired())
            .map(|n| n.text.as_str())
    }

    /// Drop an expired notice. Returns true if the display changed.
    pub fn expire_notice(&mut self) -> bool {
        if self.notice.as_ref().is_some_and(TransientNotice::is_expired) {
            self.notice = None;
            return true;
        }
        false
    }

    /// When the current notice expires, for scheduling a repaint
    pub fn notice_deadline(&self) -> Option<Instant> {
        self.notice.as_ref().map(|n| n.expires_at)
    }

    /// True once after the `:` escape was pressed
    pub fn take_prompt_request(&mut self) -> bool {
        std::mem::take(&mut self.prompt_requested)
    }

    /// Window title for the current state
    pub fn title(&self) -> String {
        if self.active {
            if self.sequence.is_empty() {
                return "Leader".to_string();
            }
            return format!("Leader: {}", self.sequence);
        }
        match self.notice() {
            Some(notice) => format!("{} | {}", APP_TITLE, notice.replace('\n', "; ")),
            None => APP_TITLE.to_string(),
        }
    }
}

impl StatusReporter for StatusLine {
    fn on_leader_active(&mut self) {
        self.active = true;
        self.sequence.clear();
        self.notice = None;
    }

    fn on_sequence_updated(&mut self, sequence: &[Hotkey]) {
        self.sequence = sequence_display(sequence);
    }

    fn on_leader_inactive(&mut self) {
        self.active = false;
        self.sequence.clear();
    }

    fn on_notice(&mut self, message: &str) {
        tracing::info!("{}", message);
        self.notice = Some(TransientNotice::new(message, self.notice_duration));
    }

    fn on_command_prompt(&mut self) {
        self.prompt_requested = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{parse_sequence, Platform};

    #[test]
    fn test_title_follows_session() {
        let mut status = StatusLine::default();
        assert_eq!(status.title(), APP_TITLE);

        status.on_leader_active();
        assert_eq!(status.title(), "Leader");

        let seq = parse_sequence("g g", Platform::current()).unwrap();
        status.on_sequence_updated(&seq);
        assert_eq!(status.title(), "Leader: G G");

        status.on_leader_inactive();
        assert_eq!(status.title(), APP_TITLE);
    }

    #[test]
    fn test_notice_in_title_until_expired() {
        let mut status = StatusLine::new(Duration::from_secs(60));
        status.on_notice("Leader mode timed out.");
        assert_eq!(status.title(), "leader-keys | Leader mode timed out.");
        assert!(!status.expire_notice());

        let mut status = StatusLine::new(Duration::ZERO);
        status.on_notice("gone");
        assert!(status.notice().is_none());
        assert!(status.expire_notice());
        assert_eq!(status.title(), APP_TITLE);
    }

    #[test]
    fn test_prompt_request_taken_once() {
        let mut status = StatusLine::default();
        status.on_command_prompt();
        assert!(status.take_prompt_request());
        assert!(!status.take_prompt_request());
    }
}

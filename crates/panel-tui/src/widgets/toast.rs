//! Toast notifications: transient one-line messages in the top-right corner.
//!
//! Every toast expires on its own timer; showing the same text twice shows
//! two toasts.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::theme::{C_SECONDARY, C_TOAST_ERROR, C_TOAST_SUCCESS};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug)]
struct Toast {
    message: String,
    severity: Severity,
    expires: Instant,
}

/// A persistent spinner toast that animates until resolved.
struct SpinnerToast {
    message: String,
    frame: usize,
}

const SPINNER_FRAMES: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub struct ToastManager {
    toasts: VecDeque<Toast>,
    spinner: Option<SpinnerToast>,
    lifetime: Duration,
    max_visible: usize,
}

impl ToastManager {
    pub fn new(lifetime: Duration) -> Self {
        Self {
            toasts: VecDeque::new(),
            spinner: None,
            lifetime,
            max_visible: 4,
        }
    }

    /// Show `message`; `success` picks the styling.
    pub fn show(&mut self, message: impl Into<String>, success: bool) {
        let severity = if success {
            Severity::Success
        } else {
            Severity::Error
        };
        self.show_at(message.into(), severity, Instant::now());
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.show(message, true);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.show(message, false);
    }

    fn show_at(&mut self, message: String, severity: Severity, now: Instant) {
        if message.is_empty() {
            return;
        }
        self.toasts.push_back(Toast {
            message,
            severity,
            expires: now + self.lifetime,
        });
        while self.toasts.len() > self.max_visible * 2 {
            self.toasts.pop_front();
        }
    }

    /// Start or replace the persistent spinner toast.
    pub fn spinner(&mut self, message: impl Into<String>) {
        self.spinner = Some(SpinnerToast {
            message: message.into(),
            frame: 0,
        });
    }

    pub fn dismiss_spinner(&mut self) {
        self.spinner = None;
    }

    /// Remove expired toasts and advance the spinner. Call each tick.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    fn tick_at(&mut self, now: Instant) {
        self.toasts.retain(|t| t.expires > now);
        if let Some(ref mut s) = self.spinner {
            s.frame = (s.frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty() && self.spinner.is_none()
    }

    /// Render toasts in the top-right corner of `area`, newest on top.
    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        if self.is_empty() {
            return;
        }
        let max_width = (area.width / 2).clamp(30.min(area.width), 60);
        let mut y = area.y + 1;

        let spinner_row = self.spinner.as_ref().map(|s| {
            let icon = SPINNER_FRAMES[s.frame % SPINNER_FRAMES.len()];
            (format!(" {} {} ", icon, s.message), C_SECONDARY)
        });
        let rows = spinner_row.into_iter().chain(
            self.toasts
                .iter()
                .rev()
                .take(self.max_visible)
                .map(|t| match t.severity {
                    Severity::Success => (format!(" ✓ {} ", t.message), C_TOAST_SUCCESS),
                    Severity::Error => (format!(" ✗ {} ", t.message), C_TOAST_ERROR),
                }),
        );

        for (text, color) in rows {
            if y >= area.y + area.height {
                break;
            }
            let w = (text.width() as u16).min(max_width);
            let x = area.x + area.width.saturating_sub(w + 1);
            let toast_area = Rect {
                x,
                y,
                width: w,
                height: 1,
            };
            frame.render_widget(Clear, toast_area);
            let paragraph = Paragraph::new(Line::from(vec![Span::styled(
                text,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )]));
            frame.render_widget(paragraph, toast_area);
            y += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_messages_are_separate_toasts() {
        let mut toasts = ToastManager::new(Duration::from_secs(3));
        toasts.success("Skipped");
        toasts.success("Skipped");
        assert_eq!(toasts.toasts.len(), 2);
    }

    #[test]
    fn test_each_toast_expires_independently() {
        let mut toasts = ToastManager::new(Duration::from_secs(3));
        let t0 = Instant::now();
        toasts.show_at("first".into(), Severity::Success, t0);
        toasts.show_at("second".into(), Severity::Error, t0 + Duration::from_secs(2));

        toasts.tick_at(t0 + Duration::from_millis(3500));
        assert_eq!(toasts.toasts.len(), 1);
        assert_eq!(toasts.toasts[0].message, "second");

        toasts.tick_at(t0 + Duration::from_millis(5500));
        assert!(toasts.is_empty());
    }

    #[test]
    fn test_empty_message_is_not_shown() {
        let mut toasts = ToastManager::new(Duration::from_secs(3));
        toasts.error("");
        assert!(toasts.is_empty());
    }
}

//! LineInput: one-line text entry wrapping tui-input.
//!
//! Used for the history search, the queue "add" prompt, the message composer
//! and the overlay forms.  The prompt is drawn in front of the text.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tui_input::{backend::crossterm::EventHandler, Input};
use unicode_width::UnicodeWidthStr;

use crate::theme::{C_FILTER_BG, C_FILTER_FG, C_MUTED, C_SECONDARY};

#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    Changed(String),
    Submitted(String),
    Cancelled,
    None,
}

pub struct LineInput {
    input: Input,
    active: bool,
    prompt: String,
    placeholder: String,
}

impl LineInput {
    pub fn new(prompt: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            input: Input::default(),
            active: false,
            prompt: prompt.into(),
            placeholder: placeholder.into(),
        }
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    pub fn clear(&mut self) {
        self.input = Input::default();
    }

    pub fn set_value(&mut self, value: &str) {
        self.input = Input::new(value.to_string());
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.input.value().is_empty()
    }

    /// Esc closes the input (keeping its text), Enter submits the trimmed
    /// text and closes it; every other key edits.
    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Esc => {
                self.deactivate();
                InputAction::Cancelled
            }
            KeyCode::Enter => {
                self.deactivate();
                InputAction::Submitted(self.input.value().trim().to_string())
            }
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                if before != self.input.value() {
                    InputAction::Changed(self.input.value().to_string())
                } else {
                    InputAction::None
                }
            }
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect) {
        let prompt = format!("{} ", self.prompt);
        let prompt_w = prompt.width();
        let scroll = self
            .input
            .visual_scroll(area.width.saturating_sub(prompt_w as u16 + 1) as usize);
        let value = self.input.value();

        let body = if value.is_empty() {
            Span::styled(self.placeholder.clone(), Style::default().fg(C_MUTED))
        } else {
            let visible: String = value.chars().skip(scroll).collect();
            Span::styled(visible, Style::default().fg(C_FILTER_FG))
        };
        let line = Line::from(vec![
            Span::styled(prompt, Style::default().fg(C_SECONDARY)),
            body,
        ]);
        frame.render_widget(
            Paragraph::new(line).style(Style::default().bg(C_FILTER_BG)),
            area,
        );

        if self.active && area.width > 0 {
            let cursor_x =
                area.x + prompt_w as u16 + (self.input.visual_cursor().saturating_sub(scroll)) as u16;
            frame.set_cursor_position((cursor_x.min(area.x + area.width - 1), area.y));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_typing_then_submit() {
        let mut input = LineInput::new("search", "title or artist");
        input.activate();
        assert_eq!(input.handle_key(key(KeyCode::Char('a'))), InputAction::Changed("a".into()));
        input.handle_key(key(KeyCode::Char(' ')));
        assert_eq!(input.handle_key(key(KeyCode::Enter)), InputAction::Submitted("a".into()));
        assert!(!input.is_active());
        assert_eq!(input.input.value(), "a ");
    }

    #[test]
    fn test_escape_keeps_text() {
        let mut input = LineInput::new(">", "");
        input.set_value("draft");
        input.activate();
        assert_eq!(input.handle_key(key(KeyCode::Esc)), InputAction::Cancelled);
        assert_eq!(input.input.value(), "draft");
    }
}

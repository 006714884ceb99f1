//! ConsolePanel — the bot's console: log tail, runtime config and commands.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use std::collections::VecDeque;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{info, warn};

use panel_proto::client::{ApiClient, ApiError};
use panel_proto::protocol::{Ack, CommandOutput, ConsoleConfig, ConsoleLogs};

use crate::action::Action;
use crate::app_state::AppState;
use crate::component::Component;
use crate::theme::{
    style_selected_focused, C_ACCENT, C_ERROR, C_MUTED, C_NAV_ACTIVE, C_PRIMARY, C_SECONDARY,
    C_TAG,
};
use crate::widgets::line_input::{InputAction, LineInput};
use crate::widgets::modal::{modal_frame, Modal};
use crate::widgets::scrollable_list::ScrollableList;
use crate::widgets::status_bar::InputMode;

use super::{OverlayEvent, OverlayScope};

/// Ticks (~100 ms each) between log refreshes while the Logs tab is shown.
const LOG_REFRESH_TICKS: u32 = 20;
const MAX_TRANSCRIPT: usize = 200;

#[derive(Debug)]
pub enum ConsoleEvent {
    Logs(Result<ConsoleLogs, ApiError>),
    Config(Result<ConsoleConfig, ApiError>),
    Saved(Result<Ack, ApiError>),
    Executed(String, Result<CommandOutput, ApiError>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Logs,
    Config,
    Command,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Logs, Tab::Config, Tab::Command];

    fn label(self) -> &'static str {
        match self {
            Self::Logs => "Logs",
            Self::Config => "Config",
            Self::Command => "Command",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Logs => Self::Config,
            Self::Config => Self::Command,
            Self::Command => Self::Logs,
        }
    }

    fn prev(self) -> Self {
        self.next().next()
    }
}

/// Text typed for a config value: JSON when it parses, a string otherwise.
pub fn parse_config_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// How a value is shown and pre-filled for editing.
pub fn config_value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub struct ConsolePanel {
    modal: Modal,
    scope: OverlayScope,
    api: ApiClient,
    tab: Tab,

    logs: Vec<String>,
    /// Lines scrolled up from the newest.
    log_scroll: usize,
    log_height: usize,
    since_refresh: u32,

    config: ScrollableList<(String, Value)>,
    config_height: usize,
    editing: Option<String>,

    transcript: VecDeque<(String, Result<String, String>)>,
    running: bool,

    input: LineInput,
    error: Option<String>,
}

impl ConsolePanel {
    pub fn new(api: ApiClient, tx: mpsc::UnboundedSender<OverlayEvent>) -> Self {
        Self {
            modal: Modal::default(),
            scope: OverlayScope::new("console", tx),
            api,
            tab: Tab::Logs,
            logs: Vec::new(),
            log_scroll: 0,
            log_height: 0,
            since_refresh: 0,
            config: ScrollableList::new(),
            config_height: 0,
            editing: None,
            transcript: VecDeque::new(),
            running: false,
            input: LineInput::new("/", "command"),
            error: None,
        }
    }

    fn fetch_logs(&mut self) {
        self.since_refresh = 0;
        let api = self.api.clone();
        self.scope.spawn(async move { api.console_logs().await }, |res| {
            OverlayEvent::Console(ConsoleEvent::Logs(res))
        });
    }

    fn fetch_config(&mut self) {
        let api = self.api.clone();
        self.scope.spawn(async move { api.console_config().await }, |res| {
            OverlayEvent::Console(ConsoleEvent::Config(res))
        });
    }

    fn current_config(&self) -> ConsoleConfig {
        ConsoleConfig {
            config: self.config.items.iter().cloned().collect(),
        }
    }

    fn save_value(&mut self, key: String, text: &str) -> Vec<Action> {
        let value = parse_config_value(text);
        let Some(entry) = self.config.items.iter_mut().find(|(k, _)| *k == key) else {
            return Vec::new();
        };
        if entry.1 == value {
            return Vec::new();
        }
        info!("console: setting {}", key);
        entry.1 = value;
        let config = self.current_config();
        let api = self.api.clone();
        self.scope
            .spawn(async move { api.save_console_config(&config).await }, |res| {
                OverlayEvent::Console(ConsoleEvent::Saved(res))
            });
        Vec::new()
    }

    fn execute(&mut self, command: String) -> Vec<Action> {
        if command.is_empty() || self.running {
            return Vec::new();
        }
        let command = command.trim_start_matches('/').to_string();
        info!("console: executing /{}", command);
        self.running = true;
        let api = self.api.clone();
        let echo = command.clone();
        self.scope
            .spawn(async move { api.execute_command(&command).await }, move |res| {
                OverlayEvent::Console(ConsoleEvent::Executed(echo, res))
            });
        Vec::new()
    }

    fn open_input(&mut self) {
        match self.tab {
            Tab::Logs => {}
            Tab::Config => {
                let Some((key, value)) = self.config.selected_item() else {
                    return;
                };
                self.input.set_prompt(format!("{key} ="));
                self.input.set_value(&config_value_text(value));
                self.editing = Some(key.clone());
                self.input.activate();
            }
            Tab::Command => {
                self.input.set_prompt("/");
                self.input.clear();
                self.input.activate();
            }
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![Span::raw(" ")];
        for tab in Tab::ALL {
            let style = if tab == self.tab {
                Style::default().fg(C_NAV_ACTIVE).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(C_MUTED)
            };
            spans.push(Span::styled(format!(" {} ", tab.label()), style));
        }
        if let Some(error) = &self.error {
            spans.push(Span::styled(format!("  {error}"), Style::default().fg(C_ERROR)));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_logs(&mut self, frame: &mut Frame, area: Rect) {
        self.log_height = area.height as usize;
        let end = self.logs.len().saturating_sub(self.log_scroll);
        let start = end.saturating_sub(self.log_height);
        let lines: Vec<Line> = self.logs[start..end]
            .iter()
            .map(|l| {
                let color = if l.contains("ERROR") || l.contains("error") {
                    C_ERROR
                } else if l.contains("WARN") {
                    C_ACCENT
                } else {
                    C_SECONDARY
                };
                Line::from(Span::styled(l.clone(), Style::default().fg(color)))
            })
            .collect();
        if lines.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(" No log lines yet.", Style::default().fg(C_MUTED))),
                area,
            );
        } else {
            frame.render_widget(Paragraph::new(lines), area);
        }
    }

    fn draw_config(&mut self, frame: &mut Frame, area: Rect) {
        self.config_height = area.height as usize;
        self.config.ensure_visible(self.config_height);
        let key_width = self
            .config
            .items
            .iter()
            .map(|(k, _)| k.chars().count())
            .max()
            .unwrap_or(0)
            .min(28);
        let lines: Vec<Line> = self
            .config
            .visible_items(self.config_height)
            .into_iter()
            .map(|(i, (key, value))| {
                let selected = i == self.config.selected;
                let base = if selected {
                    style_selected_focused()
                } else {
                    Style::default()
                };
                Line::from(vec![
                    Span::styled(format!(" {key:<key_width$}  "), base.fg(C_TAG)),
                    Span::styled(config_value_text(value), base.fg(C_PRIMARY)),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_transcript(&self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        for (command, result) in &self.transcript {
            lines.push(Line::from(Span::styled(
                format!(" /{command}"),
                Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
            )));
            let (text, color) = match result {
                Ok(out) => (out.as_str(), C_PRIMARY),
                Err(e) => (e.as_str(), C_ERROR),
            };
            for line in text.lines() {
                lines.push(Line::from(Span::styled(format!("   {line}"), Style::default().fg(color))));
            }
        }
        if self.running {
            lines.push(Line::from(Span::styled("   running…", Style::default().fg(C_MUTED))));
        }
        let skip = lines.len().saturating_sub(area.height as usize);
        frame.render_widget(
            Paragraph::new(lines.split_off(skip)).wrap(Wrap { trim: false }),
            area,
        );
    }
}

impl Component for ConsolePanel {
    fn is_open(&self) -> bool {
        self.modal.is_open()
    }

    fn set_open(&mut self, open: bool, _state: &AppState) -> Vec<Action> {
        if open {
            self.modal.open();
            self.scope.open();
            self.error = None;
            self.running = false;
            self.fetch_logs();
            self.fetch_config();
        } else {
            self.modal.close();
            self.scope.close();
            self.editing = None;
            self.input.deactivate();
        }
        Vec::new()
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        if self.input.is_active() {
            return match self.input.handle_key(key) {
                InputAction::Submitted(text) => match self.editing.take() {
                    Some(config_key) => self.save_value(config_key, &text),
                    None => self.execute(text),
                },
                InputAction::Cancelled => {
                    self.editing = None;
                    Vec::new()
                }
                InputAction::Changed(_) | InputAction::None => Vec::new(),
            };
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('c') => {
                return vec![Action::CloseOverlays]
            }
            KeyCode::Tab | KeyCode::Right => self.tab = self.tab.next(),
            KeyCode::BackTab | KeyCode::Left => self.tab = self.tab.prev(),
            KeyCode::Char('r') => match self.tab {
                Tab::Logs => self.fetch_logs(),
                Tab::Config => self.fetch_config(),
                Tab::Command => self.transcript.clear(),
            },
            KeyCode::Enter | KeyCode::Char('i') | KeyCode::Char('/') => self.open_input(),
            KeyCode::Up | KeyCode::Char('k') => match self.tab {
                Tab::Logs => {
                    let max = self.logs.len().saturating_sub(self.log_height);
                    self.log_scroll = (self.log_scroll + 1).min(max);
                }
                Tab::Config => self.config.select_up(1),
                Tab::Command => {}
            },
            KeyCode::Down | KeyCode::Char('j') => match self.tab {
                Tab::Logs => self.log_scroll = self.log_scroll.saturating_sub(1),
                Tab::Config => self.config.select_down(1),
                Tab::Command => {}
            },
            KeyCode::End => self.log_scroll = 0,
            _ => {}
        }
        Vec::new()
    }

    fn on_event(&mut self, event: OverlayEvent, _state: &AppState) -> Vec<Action> {
        let OverlayEvent::Console(event) = event else {
            return Vec::new();
        };
        match event {
            ConsoleEvent::Logs(Ok(logs)) => {
                self.error = None;
                self.logs = logs.logs;
                let max = self.logs.len().saturating_sub(self.log_height);
                self.log_scroll = self.log_scroll.min(max);
            }
            ConsoleEvent::Logs(Err(e)) => {
                warn!("console: logs failed: {}", e);
                self.error = Some(e.user_message());
            }
            ConsoleEvent::Config(Ok(config)) => {
                self.config.set_items(config.config.into_iter().collect());
            }
            ConsoleEvent::Config(Err(e)) => {
                warn!("console: config failed: {}", e);
                self.error = Some(e.user_message());
            }
            ConsoleEvent::Saved(Ok(_)) => return vec![Action::success("Config saved")],
            ConsoleEvent::Saved(Err(e)) => {
                warn!("console: saving config failed: {}", e);
                // Show what the bot actually has.
                self.fetch_config();
                return vec![Action::error(e.user_message())];
            }
            ConsoleEvent::Executed(command, result) => {
                self.running = false;
                let entry = match result {
                    Ok(out) => Ok(out
                        .output
                        .or(out.message)
                        .unwrap_or_else(|| "(no output)".to_string())),
                    Err(e) => Err(e.user_message()),
                };
                self.transcript.push_back((command, entry));
                if self.transcript.len() > MAX_TRANSCRIPT {
                    self.transcript.pop_front();
                }
            }
        }
        Vec::new()
    }

    fn tick(&mut self, _state: &AppState) -> Vec<Action> {
        if self.tab == Tab::Logs && self.log_scroll == 0 {
            self.since_refresh += 1;
            if self.since_refresh >= LOG_REFRESH_TICKS {
                self.fetch_logs();
            }
        }
        Vec::new()
    }

    fn input_mode(&self) -> InputMode {
        if self.input.is_active() {
            InputMode::Input
        } else {
            InputMode::Overlay
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _state: &AppState) {
        if !self.is_open() {
            return;
        }
        let height = area.height.saturating_sub(4).max(8);
        let (block, popup) = modal_frame(frame, area, 84, height, "Console");
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let [tabs, body, prompt, footer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        self.draw_tabs(frame, tabs);
        match self.tab {
            Tab::Logs => self.draw_logs(frame, body),
            Tab::Config => self.draw_config(frame, body),
            Tab::Command => self.draw_transcript(frame, body),
        }
        if self.input.is_active() {
            self.input.draw(frame, prompt);
        }
        let hint = match self.tab {
            Tab::Logs => " ↑↓ scroll · end newest · r refresh · tab switch · esc close",
            Tab::Config => " enter edit · r reload · tab switch · esc close",
            Tab::Command => " enter run · r clear · tab switch · esc close",
        };
        frame.render_widget(
            Paragraph::new(Span::styled(hint, Style::default().fg(C_MUTED))),
            footer,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Arc;

    use serde_json::json;

    use crate::app_state::SharedState;
    use crate::guild::GuildSelector;

    fn test_state(api: ApiClient) -> AppState {
        let (shared, _, _) = SharedState::new(Arc::new(GuildSelector::new(api)));
        AppState {
            shared,
            input_mode: InputMode::Overlay,
            log_path: PathBuf::new(),
        }
    }

    #[test]
    fn test_transcript_keeps_newest_commands() {
        let api = ApiClient::with_http(reqwest::Client::new(), "http://127.0.0.1:9");
        let state = test_state(api.clone());
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut console = ConsolePanel::new(api, tx);

        for i in 0..MAX_TRANSCRIPT + 5 {
            let output = CommandOutput {
                output: Some(format!("ok {i}")),
                message: None,
            };
            let event = ConsoleEvent::Executed(format!("cmd {i}"), Ok(output));
            assert!(console.on_event(OverlayEvent::Console(event), &state).is_empty());
        }

        assert_eq!(console.transcript.len(), MAX_TRANSCRIPT);
        assert_eq!(console.transcript.front().unwrap().0, "cmd 5");
        let (command, result) = console.transcript.back().unwrap();
        assert_eq!(command, "cmd 204");
        assert_eq!(result.as_deref(), Ok("ok 204"));
        assert!(!console.running);
    }

    #[test]
    fn test_config_values_parse_as_json_or_string() {
        assert_eq!(parse_config_value("42"), json!(42));
        assert_eq!(parse_config_value("true"), json!(true));
        assert_eq!(parse_config_value("[1, 2]"), json!([1, 2]));
        assert_eq!(parse_config_value("\"quoted\""), json!("quoted"));
        assert_eq!(parse_config_value("plain text"), json!("plain text"));
    }

    #[test]
    fn test_config_value_text_unquotes_strings() {
        assert_eq!(config_value_text(&json!("hello")), "hello");
        assert_eq!(config_value_text(&json!(0.5)), "0.5");
        assert_eq!(config_value_text(&json!({"a": 1})), "{\"a\":1}");
    }

    #[test]
    fn test_tabs_cycle_both_ways() {
        assert_eq!(Tab::Logs.next(), Tab::Config);
        assert_eq!(Tab::Logs.prev(), Tab::Command);
        assert_eq!(Tab::Command.next(), Tab::Logs);
    }
}

//! HelpOverlay component — centered popup with keyboard shortcut reference.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};

use crate::{
    action::Action,
    app_state::AppState,
    component::Component,
    theme::{C_MUTED, C_PRIMARY, C_SECONDARY},
    widgets::modal::{modal_frame, Modal},
};

pub struct HelpOverlay {
    modal: Modal,
}

impl HelpOverlay {
    pub fn new() -> Self {
        Self {
            modal: Modal::default(),
        }
    }
}

impl Component for HelpOverlay {
    fn is_open(&self) -> bool {
        self.modal.is_open()
    }

    fn set_open(&mut self, open: bool, _state: &AppState) -> Vec<Action> {
        if open {
            self.modal.open();
        } else {
            self.modal.close();
        }
        Vec::new()
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        // Any key closes the overlay; q still quits.
        match key.code {
            KeyCode::Char('q') => vec![Action::CloseOverlays, Action::Quit],
            _ => vec![Action::CloseOverlays],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        if !self.is_open() {
            return;
        }

        let help_lines: Vec<Line> = vec![
            Line::from(Span::styled(
                " keyboard shortcuts",
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            section(" views"),
            help_row("1 / 2 / 3", "player / history / channels"),
            help_row("[ / ]", "back / forward"),
            help_row(":", "command line (go <path>, back, quit)"),
            Line::from(""),
            section(" panels"),
            help_row("g", "pick server"),
            help_row("b", "bot profile & reboot"),
            help_row("c", "console: logs, config, commands"),
            help_row("?", "toggle this help"),
            Line::from(""),
            section(" player"),
            help_row("space / n / s", "play-pause / skip / stop"),
            help_row("← / →  or  h / l", "seek ∓10s  (= jumps to a time)"),
            help_row("a / A", "add to queue / play next"),
            help_row("d / J / K", "remove / move down / move up"),
            Line::from(""),
            section(" history"),
            help_row("t / T / u", "cycle source / time / requester"),
            help_row("/ / x", "search / clear filters"),
            help_row("enter", "queue selected track"),
            Line::from(""),
            section(" channels"),
            help_row("tab", "switch list / messages"),
            help_row("enter / m", "open channel / load older"),
            help_row("i", "write a message"),
            Line::from(""),
            help_row("y", "copy url or message"),
            help_row("q / Ctrl+C", "quit"),
            Line::from(""),
            Line::from(Span::styled(
                format!(" log: {}", state.log_path.display()),
                Style::default().fg(C_MUTED),
            )),
            Line::from(Span::styled(" press any key to close", Style::default().fg(C_MUTED))),
        ];

        let height = help_lines.len() as u16 + 2;
        let (block, popup) = modal_frame(frame, area, 64, height, "Help");
        frame.render_widget(
            Paragraph::new(help_lines)
                .block(block)
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}

fn section(title: &str) -> Line<'_> {
    Line::from(Span::styled(
        title,
        Style::default().fg(C_MUTED).add_modifier(Modifier::BOLD),
    ))
}

fn help_row<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("{:<18}", key),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ),
        Span::styled(desc, Style::default().fg(C_SECONDARY)),
    ])
}

//! Centered popups: overlay frames and yes/no confirmation.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::{C_ACCENT, C_MUTED, C_PANEL_BORDER_FOCUSED, C_PRIMARY};

pub const MODAL_BG: Color = Color::Rgb(18, 18, 26);

/// Open/closed state of an overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modal {
    open: bool,
}

impl Modal {
    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// Clear a centered popup and return its bordered block and area.
pub fn modal_frame<'a>(
    frame: &mut Frame,
    area: Rect,
    percent_x: u16,
    height: u16,
    title: &'a str,
) -> (Block<'a>, Rect) {
    let popup = centered_rect(percent_x, height.min(area.height), area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(C_PANEL_BORDER_FOCUSED))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(MODAL_BG));
    (block, popup)
}

pub fn draw_confirm(frame: &mut Frame, area: Rect, question: &str) {
    let (block, popup) = modal_frame(frame, area, 50, 6, "Confirm");
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!(" {question}"),
            Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(" y confirm · n / esc cancel", Style::default().fg(C_MUTED))),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        popup,
    );
}

pub fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_open_close() {
        let mut modal = Modal::default();
        assert!(!modal.is_open());
        modal.open();
        modal.open();
        assert!(modal.is_open());
        modal.close();
        assert!(!modal.is_open());
    }
}

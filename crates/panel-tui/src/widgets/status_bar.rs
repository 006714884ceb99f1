//! Top nav bar and bottom key-hint bar.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::markup::render::to_lines;
use crate::surface::{Surface, KEYS};
use crate::theme::{
    C_ACCENT, C_FILTER_FG, C_MUTED, C_NAV_ACTIVE, C_PLAYING, C_PRIMARY, C_SECONDARY, C_SEPARATOR,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    Normal,
    Input,
    Overlay,
}

impl InputMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Input => "INPUT",
            Self::Overlay => "PANEL",
        }
    }

    fn color(self) -> ratatui::style::Color {
        match self {
            Self::Normal => C_NAV_ACTIVE,
            Self::Input => C_FILTER_FG,
            Self::Overlay => C_SECONDARY,
        }
    }
}

/// What the nav bar shows besides the nav entries.
pub struct NavStatus<'a> {
    pub bot_name: Option<&'a str>,
    pub guild: Option<&'a str>,
    pub now_playing: Option<&'a str>,
    pub connected: bool,
}

/// One row: app name, nav entries, page title, now playing, guild and connection state.
pub fn draw_nav_bar(frame: &mut Frame, area: Rect, surface: &Surface, status: NavStatus<'_>) {
    let mut spans = vec![Span::styled(
        format!(" {} ", status.bot_name.unwrap_or("botpanel")),
        Style::default().fg(C_ACCENT).add_modifier(Modifier::BOLD),
    )];
    for (i, entry) in surface.nav().iter().enumerate() {
        let style = if entry.active {
            Style::default()
                .fg(C_PRIMARY)
                .bg(C_NAV_ACTIVE)
                .add_modifier(Modifier::BOLD)
        } else if entry.enabled {
            Style::default().fg(C_SECONDARY)
        } else {
            Style::default().fg(C_MUTED).add_modifier(Modifier::CROSSED_OUT)
        };
        spans.push(Span::styled(" ", Style::default()));
        spans.push(Span::styled(format!(" {} {} ", i + 1, entry.label), style));
    }
    if !surface.title().is_empty() {
        spans.push(Span::styled("  │ ", Style::default().fg(C_SEPARATOR)));
        spans.push(Span::styled(
            surface.title().to_string(),
            Style::default().fg(C_SECONDARY).add_modifier(Modifier::ITALIC),
        ));
    }

    if let Some(title) = status.now_playing {
        spans.push(Span::styled("  │ ♪ ", Style::default().fg(C_SEPARATOR)));
        spans.push(Span::styled(title.to_string(), Style::default().fg(C_PLAYING)));
    }

    spans.push(Span::styled("  │ ", Style::default().fg(C_SEPARATOR)));
    spans.push(Span::styled(
        status.guild.unwrap_or("no server selected").to_string(),
        Style::default().fg(if status.guild.is_some() { C_PRIMARY } else { C_MUTED }),
    ));
    spans.push(Span::raw(" "));
    spans.push(if status.connected {
        Span::styled("●", Style::default().fg(C_PLAYING))
    } else {
        Span::styled("○", Style::default().fg(C_ACCENT))
    });

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Mode label followed by the current `#keys` fragment, flattened to a row.
pub fn draw_keys_bar(frame: &mut Frame, area: Rect, mode: InputMode, surface: &Surface) {
    let mut spans = vec![Span::styled(
        format!(" {} ", mode.label()),
        Style::default().fg(mode.color()).add_modifier(Modifier::BOLD),
    )];

    if let Some(slot) = surface.slot(KEYS) {
        for line in to_lines(&slot.markup) {
            spans.push(Span::raw("  "));
            spans.extend(line.spans.into_iter().map(|s| {
                if s.style == Style::default() || s.style.fg == Some(C_PRIMARY) {
                    s.style(Style::default().fg(C_MUTED))
                } else {
                    s
                }
            }));
        }
    }
    spans.push(Span::styled(
        "  g server  b bot  c console  ? help  q quit",
        Style::default().fg(C_MUTED),
    ));
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Draw a horizontal separator line.
pub fn draw_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled(
        "─".repeat(area.width as usize),
        Style::default().fg(C_SEPARATOR),
    ));
    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn nav_row(surface: &Surface) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 1)).unwrap();
        terminal
            .draw(|f| {
                let status = NavStatus {
                    bot_name: Some("jukebox"),
                    guild: None,
                    now_playing: None,
                    connected: true,
                };
                draw_nav_bar(f, f.area(), surface, status);
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        (0..buffer.area.width)
            .map(|x| buffer[(x, 0)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_nav_bar_shows_page_title() {
        let mut surface = Surface::new();
        assert!(!nav_row(&surface).contains("Playback History"));

        surface.set_title("Playback History");
        let row = nav_row(&surface);
        assert!(row.starts_with(" jukebox "));
        assert!(row.contains("│ Playback History"));
    }
}

//! PaneChrome: bordered pane for a surface slot, with focus styling and badges.

use crate::theme::{style_focused_border, style_unfocused_border, C_MUTED, C_PRIMARY};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::markup::render::to_lines;
use crate::surface::Surface;

/// A badge shown in the top-right of the pane header (e.g. "LIVE", "3/45").
pub struct Badge<'a> {
    pub text: &'a str,
    pub color: Color,
    pub inverted: bool,
}

impl<'a> Badge<'a> {
    pub fn new(text: &'a str, color: Color) -> Self {
        Self {
            text,
            color,
            inverted: false,
        }
    }

    /// Filled badge: text drawn on `color`.
    pub fn filled(text: &'a str, color: Color) -> Self {
        Self {
            text,
            color,
            inverted: true,
        }
    }
}

pub fn pane_chrome<'a>(title: &'a str, focused: bool, badge: Option<Badge<'a>>) -> Block<'a> {
    let border_style = if focused {
        style_focused_border()
    } else {
        style_unfocused_border()
    };

    let title_style = if focused {
        Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(C_MUTED)
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Line::from(Span::styled(format!(" {title} "), title_style)));

    match badge {
        Some(b) => {
            let style = if b.inverted {
                Style::default()
                    .fg(Color::White)
                    .bg(b.color)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(b.color).add_modifier(Modifier::BOLD)
            };
            block.title_top(Line::from(Span::styled(format!(" {} ", b.text), style)).right_aligned())
        }
        None => block,
    }
}

/// Draw slot `id` as a pane: its `title` attribute in the border and its
/// markup as the body.  Returns the inner area, or `None` when the slot does
/// not exist.
pub fn draw_slot(
    frame: &mut Frame,
    area: Rect,
    surface: &Surface,
    id: &str,
    focused: bool,
    badge: Option<Badge<'_>>,
) -> Option<Rect> {
    let slot = surface.slot(id)?;
    let title = slot.title.as_deref().unwrap_or(id);
    let block = pane_chrome(title, focused, badge);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if !slot.markup.is_empty() {
        frame.render_widget(
            Paragraph::new(to_lines(&slot.markup)).wrap(Wrap { trim: false }),
            inner,
        );
    }
    Some(inner)
}

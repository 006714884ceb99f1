//! Smooth Unicode progress bar for the current track.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use panel_proto::format::{format_time, progress_percent};

use crate::theme::{C_BADGE_LIVE, C_MUTED, C_PAUSED, C_PLAYING, C_SECONDARY};

/// Render `position / duration` (milliseconds) as a bar with time labels.
/// `pending` marks a seek the backend has not confirmed yet.
pub fn draw_progress(
    frame: &mut Frame,
    area: Rect,
    position: u64,
    duration: u64,
    paused: bool,
    pending: bool,
) {
    if area.width < 4 || area.height == 0 {
        return;
    }

    let left_label = format_time(position);
    let right_label = format_time(duration);
    let label_w = (left_label.len() + right_label.len() + 2) as u16;
    let bar_w = area.width.saturating_sub(label_w).max(4) as usize;

    let bar = bar_cells(progress_percent(position, duration), bar_w);
    let color = if paused { C_PAUSED } else { C_PLAYING };
    let mut bar_style = Style::default().fg(color);
    if pending {
        bar_style = bar_style.add_modifier(Modifier::DIM);
    }

    let line = Line::from(vec![
        Span::styled(format!("{left_label} "), Style::default().fg(C_SECONDARY)),
        Span::styled(bar, bar_style),
        Span::styled(format!(" {right_label}"), Style::default().fg(C_MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Live sources have no duration: show a badge and the elapsed time only.
pub fn draw_live(frame: &mut Frame, area: Rect, position: u64) {
    if area.height == 0 {
        return;
    }
    let line = Line::from(vec![
        Span::styled(
            " LIVE ",
            Style::default()
                .fg(Color::White)
                .bg(C_BADGE_LIVE)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {}", format_time(position)), Style::default().fg(C_SECONDARY)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// `percent` of `width` cells filled, in eighths of a cell.
fn bar_cells(percent: f64, width: usize) -> String {
    const BLOCKS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

    let eighths = (percent.clamp(0.0, 100.0) / 100.0 * width as f64 * 8.0) as usize;
    let full_blocks = eighths / 8;
    let partial = eighths % 8;

    let mut bar = String::with_capacity(width + 4);
    for _ in 0..full_blocks.min(width) {
        bar.push('█');
    }
    if full_blocks < width {
        bar.push(BLOCKS[partial]);
        for _ in (full_blocks + 1)..width {
            bar.push(' ');
        }
    }
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_cells() {
        assert_eq!(bar_cells(0.0, 4), "    ");
        assert_eq!(bar_cells(50.0, 4), "██  ");
        assert_eq!(bar_cells(100.0, 4), "████");
        assert_eq!(bar_cells(12.5, 4).chars().next(), Some('▌'));
    }
}

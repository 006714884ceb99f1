//! Color palette and style constants for the bot panel.

use ratatui::style::{Color, Modifier, Style};

use panel_proto::protocol::SourceType;

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(12, 12, 18);
pub const C_ACCENT: Color = Color::Rgb(255, 95, 95);
pub const C_PLAYING: Color = Color::Rgb(80, 200, 120);
pub const C_PAUSED: Color = Color::Rgb(255, 184, 80);
pub const C_ERROR: Color = Color::Rgb(255, 80, 80);
pub const C_MUTED: Color = Color::Rgb(72, 72, 88);
pub const C_SEPARATOR: Color = Color::Rgb(40, 40, 52);
pub const C_SECONDARY: Color = Color::Rgb(115, 115, 138);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_SELECTION_BG: Color = Color::Rgb(28, 28, 40);
pub const C_PANEL_BORDER: Color = Color::Rgb(40, 40, 52);
pub const C_PANEL_BORDER_FOCUSED: Color = Color::Rgb(120, 100, 200);
pub const C_FILTER_BG: Color = Color::Rgb(20, 20, 32);
pub const C_FILTER_FG: Color = Color::Rgb(255, 200, 80);
pub const C_TAG: Color = Color::Rgb(80, 140, 200);
pub const C_TOAST_SUCCESS: Color = Color::Rgb(80, 200, 120);
pub const C_TOAST_ERROR: Color = Color::Rgb(255, 95, 95);
pub const C_BADGE_LIVE: Color = Color::Rgb(255, 70, 70);
pub const C_NAV_ACTIVE: Color = Color::Rgb(120, 100, 200);
pub const C_MENTION: Color = Color::Rgb(150, 160, 255);
pub const C_CODE_FG: Color = Color::Rgb(230, 170, 120);
pub const C_CODE_BG: Color = Color::Rgb(24, 24, 34);
pub const C_LINK: Color = Color::Rgb(80, 160, 220);
pub const C_QUOTE: Color = Color::Rgb(100, 160, 130);

// ── Source colors ─────────────────────────────────────────────────────────────

pub fn source_color(source: SourceType) -> Color {
    match source {
        SourceType::YouTube => Color::Rgb(255, 70, 70),
        SourceType::Spotify => Color::Rgb(30, 215, 96),
        SourceType::SoundCloud => Color::Rgb(255, 120, 30),
        SourceType::Radio => Color::Rgb(180, 120, 220),
        SourceType::GensokyoRadio => Color::Rgb(230, 110, 170),
        SourceType::LocalFile => Color::Rgb(100, 160, 130),
        SourceType::Generic => C_SECONDARY,
    }
}

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}

pub fn style_selected_focused() -> Style {
    Style::default()
        .bg(C_SELECTION_BG)
        .fg(C_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn style_focused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER_FOCUSED)
}

pub fn style_unfocused_border() -> Style {
    Style::default().fg(C_PANEL_BORDER)
}

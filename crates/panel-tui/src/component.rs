//! Component trait — the interface every overlay panel implements.
//!
//! Overlays float above the active view and outlive view changes:
//! - They own their state and render themselves.
//! - They receive `AppState` (read-only) for data they don't own.
//! - They produce `Vec<Action>` and never reach into the app.
//! - Work they start runs under an [`OverlayScope`](crate::components::OverlayScope)
//!   that is cancelled when the overlay closes.

use ratatui::crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};

use crate::action::Action;
use crate::app_state::AppState;
use crate::components::OverlayEvent;
use crate::widgets::status_bar::InputMode;

pub trait Component {
    fn is_open(&self) -> bool;

    /// Open or close the overlay.  Opening starts the fetches it shows.
    fn set_open(&mut self, open: bool, state: &AppState) -> Vec<Action>;

    /// Only called while the overlay is open; it gets every key.
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action>;

    /// A result of work the overlay started.
    fn on_event(&mut self, _event: OverlayEvent, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    /// Called each tick (~100ms) while open.
    fn tick(&mut self, _state: &AppState) -> Vec<Action> {
        Vec::new()
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Overlay
    }

    /// Render into `area`, the whole terminal.
    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState);
}

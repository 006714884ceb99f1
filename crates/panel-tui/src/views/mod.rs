//! View controllers.
//!
//! A view owns the state of one page of the panel.  The app calls
//! [`View::init`] once the view's template is in `#main`, passing a fresh
//! session; every request the view starts is bound to that session, and
//! results come back as [`ViewEvent`]s tagged with it.  Keys reach the
//! active view only, so a view never has to undo handler registrations.

pub mod channels;
pub mod history;
pub mod player;

use ratatui::crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};
use tracing::warn;

use crate::action::Action;
use crate::guild::CurrentGuild;
use crate::markup::Markup;
use crate::router::ViewName;
use crate::session::{SessionId, SessionTasks};
use crate::surface::Surface;
use crate::widgets::status_bar::InputMode;

use channels::ChannelsEvent;
use history::HistoryEvent;
use player::PlayerEvent;

#[derive(Debug)]
pub enum ViewEvent {
    Player(PlayerEvent),
    History(HistoryEvent),
    Channels(ChannelsEvent),
}

pub struct ViewContext<'a> {
    pub surface: &'a mut Surface,
    pub tasks: SessionTasks,
}

pub trait View {
    /// Start a session: reset local state, check the slots the template must
    /// provide, start polling and the initial fetches.
    fn init(&mut self, ctx: ViewContext<'_>) -> Vec<Action>;

    /// A component loaded with `.then(..)` naming this view is in place.
    fn after_load(&mut self, _component: &str, _surface: &mut Surface) -> Vec<Action> {
        Vec::new()
    }

    /// The view is being left.  Its session has already been invalidated.
    fn teardown(&mut self);

    /// A result of work started in `session`.
    fn on_event(&mut self, session: SessionId, event: ViewEvent, surface: &mut Surface)
        -> Vec<Action>;

    fn on_guild_changed(
        &mut self,
        _guild: Option<&CurrentGuild>,
        _surface: &mut Surface,
    ) -> Vec<Action> {
        Vec::new()
    }

    fn handle_key(&mut self, key: KeyEvent, surface: &mut Surface) -> Vec<Action>;

    /// Called every ~100 ms while the view is active.
    fn tick(&mut self, _surface: &mut Surface) -> Vec<Action> {
        Vec::new()
    }

    fn input_mode(&self) -> InputMode {
        InputMode::Normal
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, surface: &Surface);
}

/// True when every slot in `ids` exists; logs the first missing one.
pub(crate) fn require_slots(surface: &Surface, view: ViewName, ids: &[&str]) -> bool {
    match ids.iter().find(|id| !surface.contains(id)) {
        Some(missing) => {
            warn!(
                "{} view: slot #{} missing, skipping setup",
                view.as_str(),
                missing
            );
            false
        }
        None => true,
    }
}

/// Inline error line rendered into a slot.
pub(crate) fn error_markup(message: &str) -> Markup {
    Markup::element("p", Some("error"), message)
}

pub(crate) fn muted_markup(message: &str) -> Markup {
    Markup::element("p", Some("muted"), message)
}

/// Whether `session` is the one `tasks` belongs to.
pub(crate) fn is_current(tasks: &Option<SessionTasks>, session: SessionId) -> bool {
    tasks.as_ref().is_some_and(|t| t.id() == session)
}

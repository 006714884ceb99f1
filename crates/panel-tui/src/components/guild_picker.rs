//! GuildPicker — choose which Discord server the panel works on.
//!
//! Selection goes through [`GuildSelector`], so the views see the change on
//! the shared guild channel like any other.

use std::sync::Arc;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use panel_proto::client::{ApiClient, ApiError};
use panel_proto::protocol::{Guild, GuildList};

use crate::action::Action;
use crate::app_state::AppState;
use crate::component::Component;
use crate::guild::{CurrentGuild, GuildSelector};
use crate::theme::{style_selected_focused, C_ERROR, C_MUTED, C_PLAYING, C_PRIMARY, C_SECONDARY};
use crate::widgets::modal::{modal_frame, Modal};
use crate::widgets::scrollable_list::ScrollableList;

use super::{OverlayEvent, OverlayScope};

#[derive(Debug)]
pub enum GuildPickerEvent {
    Listed(Result<GuildList, ApiError>),
    Selected(Result<Option<CurrentGuild>, ApiError>),
}

pub struct GuildPicker {
    modal: Modal,
    scope: OverlayScope,
    api: ApiClient,
    selector: Arc<GuildSelector>,
    guilds: ScrollableList<Guild>,
    loading: bool,
    selecting: bool,
    error: Option<String>,
    height: usize,
}

impl GuildPicker {
    pub fn new(
        api: ApiClient,
        selector: Arc<GuildSelector>,
        tx: mpsc::UnboundedSender<OverlayEvent>,
    ) -> Self {
        Self {
            modal: Modal::default(),
            scope: OverlayScope::new("guild picker", tx),
            api,
            selector,
            guilds: ScrollableList::new(),
            loading: false,
            selecting: false,
            error: None,
            height: 0,
        }
    }

    fn fetch(&mut self) {
        self.loading = true;
        self.error = None;
        let api = self.api.clone();
        self.scope.spawn(async move { api.guilds().await }, |res| {
            OverlayEvent::Guilds(GuildPickerEvent::Listed(res))
        });
    }

    fn select(&mut self) -> Vec<Action> {
        if self.selecting {
            return Vec::new();
        }
        let Some(guild) = self.guilds.selected_item() else {
            return Vec::new();
        };
        info!("guild picker: selecting {} ({})", guild.name, guild.id);
        self.selecting = true;
        let selector = self.selector.clone();
        let id = guild.id.clone();
        self.scope.spawn(async move { selector.select(&id).await }, |res| {
            OverlayEvent::Guilds(GuildPickerEvent::Selected(res))
        });
        vec![Action::Spinner(format!("Switching to {}…", guild.name))]
    }
}

impl Component for GuildPicker {
    fn is_open(&self) -> bool {
        self.modal.is_open()
    }

    fn set_open(&mut self, open: bool, _state: &AppState) -> Vec<Action> {
        if open {
            self.modal.open();
            self.scope.open();
            self.selecting = false;
            self.fetch();
        } else {
            self.modal.close();
            self.scope.close();
            if self.selecting {
                self.selecting = false;
                return vec![Action::DismissSpinner];
            }
        }
        Vec::new()
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('g') => {
                return vec![Action::CloseOverlays]
            }
            KeyCode::Up | KeyCode::Char('k') => self.guilds.select_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.guilds.select_down(1),
            KeyCode::Home => self.guilds.select_first(),
            KeyCode::End => self.guilds.select_last(),
            KeyCode::Char('r') => self.fetch(),
            KeyCode::Enter => return self.select(),
            _ => {}
        }
        Vec::new()
    }

    fn on_event(&mut self, event: OverlayEvent, state: &AppState) -> Vec<Action> {
        let OverlayEvent::Guilds(event) = event else {
            return Vec::new();
        };
        match event {
            GuildPickerEvent::Listed(Ok(list)) => {
                self.loading = false;
                let current = state.shared.guild_id();
                let index = list
                    .guilds
                    .iter()
                    .position(|g| Some(&g.id) == current.as_ref())
                    .unwrap_or(0);
                self.guilds.set_items(list.guilds);
                self.guilds.select(index);
            }
            GuildPickerEvent::Listed(Err(e)) => {
                warn!("guild picker: list failed: {}", e);
                self.loading = false;
                self.error = Some(e.user_message());
            }
            GuildPickerEvent::Selected(res) => {
                self.selecting = false;
                let mut actions = vec![Action::DismissSpinner];
                match res {
                    Ok(guild) => {
                        let name = guild.map(|g| g.name).unwrap_or_default();
                        actions.push(Action::success(format!("Now managing {name}")));
                        actions.push(Action::CloseOverlays);
                    }
                    Err(e) => {
                        warn!("guild picker: select failed: {}", e);
                        actions.push(Action::error(e.user_message()));
                    }
                }
                return actions;
            }
        }
        Vec::new()
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        if !self.is_open() {
            return;
        }
        let rows = self.guilds.len().clamp(1, 14) as u16;
        let (block, popup) = modal_frame(frame, area, 50, rows + 4, "Servers");
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let mut lines: Vec<Line> = Vec::new();
        let body_height = inner.height.saturating_sub(2) as usize;
        if let Some(error) = &self.error {
            lines.push(Line::from(Span::styled(format!(" {error}"), Style::default().fg(C_ERROR))));
        } else if self.loading && self.guilds.is_empty() {
            lines.push(Line::from(Span::styled(" Loading servers…", Style::default().fg(C_MUTED))));
        } else if self.guilds.is_empty() {
            lines.push(Line::from(Span::styled(
                " The bot is not in any server.",
                Style::default().fg(C_MUTED),
            )));
        } else {
            self.height = body_height;
            self.guilds.ensure_visible(self.height);
            let current = state.shared.guild_id();
            for (i, guild) in self.guilds.visible_items(self.height) {
                let is_current = Some(&guild.id) == current.as_ref();
                let mut style = Style::default().fg(C_PRIMARY);
                if is_current {
                    style = style.fg(C_PLAYING).add_modifier(Modifier::BOLD);
                }
                if i == self.guilds.selected {
                    style = style.patch(style_selected_focused());
                }
                let marker = if is_current { "●" } else { " " };
                let mut spans = vec![Span::styled(format!(" {marker} {}", guild.name), style)];
                if let Some(members) = guild.member_count {
                    spans.push(Span::styled(
                        format!("  {members} members"),
                        Style::default().fg(C_SECONDARY),
                    ));
                }
                lines.push(Line::from(spans));
            }
        }
        while lines.len() < body_height + 1 {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            " enter select · r reload · esc close",
            Style::default().fg(C_MUTED),
        )));
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

//! BotPanel — the bot's profile (name, avatar, banner) and reboot.
//!
//! A reboot needs confirmation.  Once the backend accepts it the panel
//! probes the bot every [`PROBE_PERIOD`] until it answers again, for at most
//! [`PROBE_ATTEMPTS`] tries.  The probe keeps running when the panel is
//! closed.

use std::future::Future;
use std::time::Duration;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use panel_proto::client::{ApiClient, ApiError};
use panel_proto::format::format_uptime;
use panel_proto::protocol::{Ack, BotProfile};

use crate::action::Action;
use crate::app_state::{AppState, BotFeed};
use crate::component::Component;
use crate::theme::{C_ACCENT, C_ERROR, C_LINK, C_MUTED, C_PRIMARY, C_SECONDARY};
use crate::widgets::line_input::{InputAction, LineInput};
use crate::widgets::modal::{draw_confirm, modal_frame, Modal};
use crate::widgets::status_bar::InputMode;

use super::{OverlayEvent, OverlayScope};

pub const PROBE_PERIOD: Duration = Duration::from_secs(2);
pub const PROBE_ATTEMPTS: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Name,
    Avatar,
    Banner,
}

impl ProfileField {
    fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Avatar => "Avatar",
            Self::Banner => "Banner",
        }
    }

    fn prompt(self) -> &'static str {
        match self {
            Self::Name => "name:",
            Self::Avatar => "avatar url:",
            Self::Banner => "banner url:",
        }
    }

    async fn apply(self, api: ApiClient, value: String) -> Result<Ack, ApiError> {
        match self {
            Self::Name => api.set_name(&value).await,
            Self::Avatar => api.set_avatar(&value).await,
            Self::Banner => api.set_banner(&value).await,
        }
    }
}

#[derive(Debug)]
pub enum BotEvent {
    Info(Result<BotProfile, ApiError>),
    Updated(ProfileField, Result<Ack, ApiError>),
    Rebooted(Result<Ack, ApiError>),
    /// Outcome of the post-reboot probe.
    Back(bool),
}

/// Call `probe` every `period` (first call after one period) until it
/// returns true or `attempts` calls failed.
pub async fn probe_until_alive<F, Fut>(mut probe: F, period: Duration, attempts: u32) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await;
    for attempt in 1..=attempts {
        interval.tick().await;
        if probe().await {
            debug!("bot answered after {} probe(s)", attempt);
            return true;
        }
    }
    false
}

pub struct BotPanel {
    modal: Modal,
    scope: OverlayScope,
    api: ApiClient,
    feed: BotFeed,
    profile: Option<BotProfile>,
    loading: bool,
    error: Option<String>,

    editing: Option<ProfileField>,
    input: LineInput,
    confirm: Modal,
    probe: Option<CancellationToken>,
}

impl BotPanel {
    pub fn new(api: ApiClient, feed: BotFeed, tx: mpsc::UnboundedSender<OverlayEvent>) -> Self {
        Self {
            modal: Modal::default(),
            scope: OverlayScope::new("bot panel", tx),
            api,
            feed,
            profile: None,
            loading: false,
            error: None,
            editing: None,
            input: LineInput::new("", ""),
            confirm: Modal::default(),
            probe: None,
        }
    }

    fn fetch(&mut self) {
        self.loading = true;
        let api = self.api.clone();
        self.scope.spawn(async move { api.bot_info().await }, |res| {
            OverlayEvent::Bot(BotEvent::Info(res))
        });
    }

    fn edit(&mut self, field: ProfileField) {
        self.editing = Some(field);
        self.input.set_prompt(field.prompt());
        let current = self.profile.as_ref().and_then(|p| match field {
            ProfileField::Name => Some(p.username.clone()),
            ProfileField::Avatar => p.avatar_url.clone(),
            ProfileField::Banner => p.banner_url.clone(),
        });
        self.input.set_value(current.as_deref().unwrap_or_default());
        self.input.activate();
    }

    fn submit(&mut self, field: ProfileField, value: String) -> Vec<Action> {
        if value.is_empty() {
            return vec![Action::error(format!("{} cannot be empty", field.label()))];
        }
        info!("bot panel: updating {}", field.label());
        let api = self.api.clone();
        self.scope.spawn(field.apply(api, value), move |res| {
            OverlayEvent::Bot(BotEvent::Updated(field, res))
        });
        Vec::new()
    }

    fn reboot(&mut self) -> Vec<Action> {
        self.confirm.close();
        info!("bot panel: reboot requested");
        let api = self.api.clone();
        // Not bound to the panel: closing it must not lose the outcome.
        self.scope
            .spawn_with(CancellationToken::new(), async move { api.reboot().await }, |res| {
                OverlayEvent::Bot(BotEvent::Rebooted(res))
            });
        vec![Action::Spinner("Rebooting…".into())]
    }

    fn start_probe(&mut self) {
        if let Some(token) = self.probe.take() {
            token.cancel();
        }
        let token = CancellationToken::new();
        self.probe = Some(token.clone());
        let api = self.api.clone();
        self.scope.spawn_with(
            token,
            async move {
                let alive = probe_until_alive(
                    || {
                        let api = api.clone();
                        async move { api.is_alive().await }
                    },
                    PROBE_PERIOD,
                    PROBE_ATTEMPTS,
                )
                .await;
                Ok::<_, ApiError>(alive)
            },
            |res| OverlayEvent::Bot(BotEvent::Back(res.unwrap_or(false))),
        );
    }

    fn profile_lines(&self) -> Vec<Line<'static>> {
        let row = |label: &str, value: String, color| {
            Line::from(vec![
                Span::styled(format!(" {label:<10}"), Style::default().fg(C_MUTED)),
                Span::styled(value, Style::default().fg(color)),
            ])
        };
        let Some(p) = &self.profile else {
            let text = match &self.error {
                Some(e) => Span::styled(format!(" {e}"), Style::default().fg(C_ERROR)),
                None => Span::styled(" Loading…", Style::default().fg(C_MUTED)),
            };
            return vec![Line::from(text)];
        };
        let none = || "-".to_string();
        vec![
            Line::from(Span::styled(
                format!(" {}", p.username),
                Style::default().fg(C_PRIMARY).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            row("id", p.id.clone(), C_SECONDARY),
            row("servers", p.guild_count.to_string(), C_SECONDARY),
            row(
                "uptime",
                p.uptime_ms.map(format_uptime).unwrap_or_else(none),
                C_SECONDARY,
            ),
            row("avatar", p.avatar_url.clone().unwrap_or_else(none), C_LINK),
            row("banner", p.banner_url.clone().unwrap_or_else(none), C_LINK),
        ]
    }
}

impl Component for BotPanel {
    fn is_open(&self) -> bool {
        self.modal.is_open()
    }

    fn set_open(&mut self, open: bool, state: &AppState) -> Vec<Action> {
        if open {
            self.modal.open();
            self.scope.open();
            self.error = None;
            self.profile = state.shared.bot();
            self.fetch();
        } else {
            self.modal.close();
            self.scope.close();
            self.confirm.close();
            self.editing = None;
            self.input.deactivate();
        }
        Vec::new()
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        if self.confirm.is_open() {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => return self.reboot(),
                KeyCode::Char('n') | KeyCode::Esc => self.confirm.close(),
                _ => {}
            }
            return Vec::new();
        }
        if let Some(field) = self.editing {
            match self.input.handle_key(key) {
                InputAction::Submitted(value) => {
                    self.editing = None;
                    return self.submit(field, value);
                }
                InputAction::Cancelled => self.editing = None,
                InputAction::Changed(_) | InputAction::None => {}
            }
            return Vec::new();
        }
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('b') => {
                return vec![Action::CloseOverlays]
            }
            KeyCode::Char('n') => self.edit(ProfileField::Name),
            KeyCode::Char('a') => self.edit(ProfileField::Avatar),
            KeyCode::Char('B') => self.edit(ProfileField::Banner),
            KeyCode::Char('r') => self.fetch(),
            KeyCode::Char('R') => {
                if self.probe.as_ref().is_some_and(|t| !t.is_cancelled()) {
                    return vec![Action::error("Already waiting for the bot to come back")];
                }
                self.confirm.open();
            }
            _ => {}
        }
        Vec::new()
    }

    fn on_event(&mut self, event: OverlayEvent, _state: &AppState) -> Vec<Action> {
        let OverlayEvent::Bot(event) = event else {
            return Vec::new();
        };
        match event {
            BotEvent::Info(Ok(profile)) => {
                self.loading = false;
                self.error = None;
                self.feed.publish(profile.clone());
                self.profile = Some(profile);
            }
            BotEvent::Info(Err(e)) => {
                warn!("bot panel: info failed: {}", e);
                self.loading = false;
                self.error = Some(e.user_message());
            }
            BotEvent::Updated(field, Ok(ack)) => {
                self.fetch();
                let message = ack
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| format!("{} updated", field.label()));
                return vec![Action::success(message)];
            }
            BotEvent::Updated(field, Err(e)) => {
                warn!("bot panel: updating {} failed: {}", field.label(), e);
                return vec![Action::error(e.user_message())];
            }
            BotEvent::Rebooted(Ok(_)) => {
                info!("bot panel: reboot accepted, probing");
                self.start_probe();
                return vec![Action::Spinner("Waiting for the bot to come back…".into())];
            }
            BotEvent::Rebooted(Err(e)) => {
                warn!("bot panel: reboot failed: {}", e);
                return vec![Action::DismissSpinner, Action::error(e.user_message())];
            }
            BotEvent::Back(alive) => {
                self.probe = None;
                if self.is_open() {
                    self.fetch();
                }
                let toast = if alive {
                    Action::success("The bot is back online")
                } else {
                    let secs = PROBE_PERIOD.as_secs() * u64::from(PROBE_ATTEMPTS);
                    Action::error(format!("The bot did not answer within {secs}s"))
                };
                return vec![Action::DismissSpinner, toast];
            }
        }
        Vec::new()
    }

    fn input_mode(&self) -> InputMode {
        if self.editing.is_some() {
            InputMode::Input
        } else {
            InputMode::Overlay
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _state: &AppState) {
        if !self.is_open() {
            return;
        }
        let (block, popup) = modal_frame(frame, area, 60, 14, "Bot");
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let [body, prompt, footer] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        frame.render_widget(Paragraph::new(self.profile_lines()), body);
        if self.editing.is_some() {
            self.input.draw(frame, prompt);
        } else if self.probe.is_some() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    " waiting for the bot to come back…",
                    Style::default().fg(C_ACCENT),
                )),
                prompt,
            );
        }
        frame.render_widget(
            Paragraph::new(Span::styled(
                " n name · a avatar · B banner · R reboot · r reload · esc close",
                Style::default().fg(C_MUTED),
            )),
            footer,
        );

        if self.confirm.is_open() {
            draw_confirm(frame, area, "Reboot the bot?");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_probe_stops_at_first_answer() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let started = tokio::time::Instant::now();
        let alive = probe_until_alive(
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move { n == 3 }
            },
            PROBE_PERIOD,
            PROBE_ATTEMPTS,
        )
        .await;
        assert!(alive);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(started.elapsed(), PROBE_PERIOD * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_gives_up_after_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let alive = probe_until_alive(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { false }
            },
            PROBE_PERIOD,
            4,
        )
        .await;
        assert!(!alive);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}

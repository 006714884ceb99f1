//! Player view: now playing, progress and the queue.
//!
//! Status and queue are polled on their own intervals for as long as the
//! session lives.  Seeks are optimistic: the target is shown at once and
//! polls that still carry the old position are ignored for
//! [`SEEK_WINDOW`], unless the server already reports the target.

use std::time::{Duration, Instant};

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tracing::{debug, info, warn};

use panel_proto::client::{ApiClient, ApiError};
use panel_proto::format::{format_time, parse_time};
use panel_proto::protocol::{Ack, PlaybackStatus, QueueEntry, QueueResponse, SourceType};

use crate::action::Action;
use crate::app_state::PlaybackFeed;
use crate::markup::Markup;
use crate::optimistic::{Optimistic, SEEK_WINDOW};
use crate::router::ViewName;
use crate::session::{SessionId, SessionTasks};
use crate::surface::Surface;
use crate::theme::{
    source_color, style_selected_focused, C_BADGE_LIVE, C_ERROR, C_MUTED, C_PAUSED, C_PRIMARY,
    C_SECONDARY,
};
use crate::widgets::line_input::{InputAction, LineInput};
use crate::widgets::pane_chrome::{draw_slot, pane_chrome, Badge};
use crate::widgets::progress_bar::{draw_live, draw_progress};
use crate::widgets::scrollable_list::ScrollableList;
use crate::widgets::status_bar::InputMode;

use super::{error_markup, is_current, muted_markup, require_slots, View, ViewContext, ViewEvent};

pub const SEEK_STEP_MS: u64 = 10_000;
/// Delay before re-reading status and queue after a control succeeded.
const REFRESH_DELAY: Duration = Duration::from_millis(400);
/// A polled position up to this far past the seek target means the seek landed.
const SEEK_SETTLE_SPAN_MS: u64 = 2_000;

const NOW_PLAYING: &str = "now-playing";
const QUEUE: &str = "queue";

#[derive(Debug)]
pub enum PlayerEvent {
    /// Re-read status and queue now.
    Refresh,
    Status(Result<PlaybackStatus, ApiError>),
    Queue(Result<QueueResponse, ApiError>),
    Control(Control, Result<Ack, ApiError>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    Play,
    Pause,
    Skip,
    Stop,
    Seek(u64),
    Add(String),
    PlayNext(String),
    Remove(usize),
    Move { from: usize, to: usize },
}

impl Control {
    fn done_message(&self) -> String {
        match self {
            Self::Play => "Playing".to_string(),
            Self::Pause => "Paused".to_string(),
            Self::Skip => "Skipped".to_string(),
            Self::Stop => "Stopped".to_string(),
            Self::Seek(ms) => format!("Seeked to {}", format_time(*ms)),
            Self::Add(query) => format!("Added {query}"),
            Self::PlayNext(query) => format!("Playing next: {query}"),
            Self::Remove(index) => format!("Removed #{}", index + 1),
            Self::Move { from, to } => format!("Moved #{} to #{}", from + 1, to + 1),
        }
    }

    async fn send(self, api: ApiClient) -> Result<Ack, ApiError> {
        match self {
            Self::Play => api.play().await,
            Self::Pause => api.pause().await,
            Self::Skip => api.skip().await,
            Self::Stop => api.stop().await,
            Self::Seek(ms) => api.seek(ms).await,
            Self::Add(query) => api.queue_add(&query).await,
            Self::PlayNext(query) => api.queue_play_next(&query).await,
            Self::Remove(index) => api.queue_remove(index).await,
            Self::Move { from, to } => api.queue_move(from, to).await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Prompt {
    Add,
    PlayNext,
    Seek,
}

impl Prompt {
    fn label(self) -> &'static str {
        match self {
            Self::Add => "add:",
            Self::PlayNext => "play next:",
            Self::Seek => "seek to:",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            Self::Add | Self::PlayNext => "search terms or URL",
            Self::Seek => "m:ss",
        }
    }
}

pub struct PlayerView {
    api: ApiClient,
    feed: PlaybackFeed,
    status_interval: Duration,
    queue_interval: Duration,
    tasks: Option<SessionTasks>,

    status: Option<PlaybackStatus>,
    /// Set when the last status poll failed; the last good status stays shown.
    offline: bool,
    position: Optimistic<u64>,
    /// When the confirmed position was sampled.
    sampled_at: Instant,

    queue: ScrollableList<QueueEntry>,
    queue_loaded: bool,
    queue_height: usize,

    prompt: Option<Prompt>,
    input: LineInput,
}

impl PlayerView {
    pub fn new(
        api: ApiClient,
        feed: PlaybackFeed,
        status_interval: Duration,
        queue_interval: Duration,
    ) -> Self {
        Self {
            api,
            feed,
            status_interval,
            queue_interval,
            tasks: None,
            status: None,
            offline: false,
            position: Optimistic::new(0),
            sampled_at: Instant::now(),
            queue: ScrollableList::new(),
            queue_loaded: false,
            queue_height: 0,
            prompt: None,
            input: LineInput::new("add:", ""),
        }
    }

    fn reset(&mut self) {
        self.tasks = None;
        self.status = None;
        self.offline = false;
        self.position = Optimistic::new(0);
        self.queue.reset();
        self.queue_loaded = false;
        self.close_prompt();
    }

    // ── Requests ──────────────────────────────────────────────────────────────

    fn fetch_status(&self) {
        if let Some(tasks) = &self.tasks {
            let api = self.api.clone();
            tasks.spawn(async move { api.status().await }, |res| {
                ViewEvent::Player(PlayerEvent::Status(res))
            });
        }
    }

    fn fetch_queue(&self) {
        if let Some(tasks) = &self.tasks {
            let api = self.api.clone();
            tasks.spawn(async move { api.queue().await }, |res| {
                ViewEvent::Player(PlayerEvent::Queue(res))
            });
        }
    }

    fn control(&self, control: Control) {
        let Some(tasks) = &self.tasks else {
            return;
        };
        info!("player: {:?}", control);
        let api = self.api.clone();
        let request = control.clone().send(api);
        tasks.spawn(request, move |res| {
            ViewEvent::Player(PlayerEvent::Control(control, res))
        });
    }

    /// Ask for a refresh after the bot had a moment to apply a control.
    fn schedule_refresh(&self) {
        if let Some(tasks) = &self.tasks {
            tasks.spawn(
                async {
                    tokio::time::sleep(REFRESH_DELAY).await;
                    Ok::<_, ApiError>(())
                },
                |_| ViewEvent::Player(PlayerEvent::Refresh),
            );
        }
    }

    // ── State ─────────────────────────────────────────────────────────────────

    fn track_duration(&self) -> u64 {
        self.status
            .as_ref()
            .and_then(|s| s.current_track.as_ref())
            .map(|t| t.duration)
            .unwrap_or(0)
    }

    fn source(&self) -> Option<SourceType> {
        self.status
            .as_ref()
            .and_then(|s| s.current_track.as_ref())
            .map(|t| t.source())
    }

    fn is_running(&self) -> bool {
        self.status.as_ref().is_some_and(|s| s.playing && !s.paused)
    }

    /// Position to draw at `now`: the confirmed position (or the pending seek
    /// target) advanced by the time since it was taken while playing.
    pub fn shown_position(&self, now: Instant) -> u64 {
        let (base, since) = match &self.position {
            Optimistic::Pending { intended, since } => (*intended, *since),
            Optimistic::Confirmed(position) => (*position, self.sampled_at),
        };
        let mut position = base;
        if self.is_running() {
            position += now.saturating_duration_since(since).as_millis() as u64;
        }
        match self.track_duration() {
            0 => position,
            duration => position.min(duration),
        }
    }

    /// Take a polled status.  Returns `true` if the shown position changed.
    pub fn apply_status(&mut self, status: PlaybackStatus, now: Instant) -> bool {
        let same_track = match (&self.status, &status) {
            (Some(old), new) => {
                old.current_track.as_ref().map(|t| &t.uri)
                    == new.current_track.as_ref().map(|t| &t.uri)
            }
            _ => false,
        };
        let server = status.position;
        let replaced = if same_track {
            self.position
                .on_confirmed_where(server, SEEK_WINDOW, now, |target, server| {
                    *server >= *target && *server < target + SEEK_SETTLE_SPAN_MS
                })
        } else {
            self.position.revert(server);
            true
        };
        if replaced {
            self.sampled_at = now;
        } else {
            debug!("player: poll at {} ignored, seek pending", format_time(server));
        }
        self.offline = false;
        self.feed.publish(Some(status.clone()));
        self.status = Some(status);
        replaced
    }

    fn seek_to(&mut self, target: u64) -> Vec<Action> {
        match self.source() {
            None => return vec![Action::error("Nothing is playing")],
            Some(source) if source.is_live() => {
                return vec![Action::error("Live streams cannot be seeked")]
            }
            Some(_) => {}
        }
        let duration = self.track_duration();
        let target = if duration > 0 {
            target.min(duration)
        } else {
            target
        };
        self.position.set_intent(target);
        self.control(Control::Seek(target));
        Vec::new()
    }

    fn seek_relative(&mut self, delta_ms: i64) -> Vec<Action> {
        let current = self.shown_position(Instant::now()) as i64;
        self.seek_to((current + delta_ms).max(0) as u64)
    }

    fn move_selected(&mut self, down: bool) {
        let Some(entry) = self.queue.selected_item() else {
            return;
        };
        let from = entry.index;
        let to = if down {
            if from + 1 >= self.queue.len() {
                return;
            }
            from + 1
        } else {
            match from.checked_sub(1) {
                Some(to) => to,
                None => return,
            }
        };
        self.control(Control::Move { from, to });
        if down {
            self.queue.select_down(1);
        } else {
            self.queue.select_up(1);
        }
    }

    fn open_prompt(&mut self, prompt: Prompt) {
        self.input = LineInput::new(prompt.label(), prompt.placeholder());
        self.input.activate();
        self.prompt = Some(prompt);
    }

    fn close_prompt(&mut self) {
        self.input.deactivate();
        self.prompt = None;
    }

    fn submit(&mut self, prompt: Prompt, text: String) -> Vec<Action> {
        if text.is_empty() {
            return Vec::new();
        }
        match prompt {
            Prompt::Add => self.control(Control::Add(text)),
            Prompt::PlayNext => self.control(Control::PlayNext(text)),
            Prompt::Seek => match parse_time(&text) {
                Some(ms) => return self.seek_to(ms),
                None => return vec![Action::error(format!("Not a time: {text}"))],
            },
        }
        Vec::new()
    }

    // ── Rendering into slots ──────────────────────────────────────────────────

    fn render_now_playing(&self, surface: &mut Surface) {
        let markup = match &self.status {
            None if self.offline => error_markup("Could not reach the bot"),
            None => muted_markup("Waiting for the bot…"),
            Some(status) => match &status.current_track {
                Some(track) if status.playing || status.paused => {
                    let mut m = Markup::new();
                    m.push_markup(&Markup::element("p", Some("title"), &track.title));
                    if !track.author.is_empty() {
                        m.push_markup(&Markup::element("p", Some("secondary"), &track.author));
                    }
                    m.open("p", None);
                    m.push_markup(&Markup::element("span", Some("tag"), track.source().label()));
                    if let Some(album) = track.album.as_deref().filter(|a| !a.is_empty()) {
                        m.push_text(" ");
                        m.push_markup(&Markup::element("span", Some("muted"), album));
                    }
                    if let Some(requester) = &track.requester {
                        m.push_text(" ");
                        m.push_markup(&Markup::element(
                            "span",
                            Some("muted"),
                            &format!("requested by {requester}"),
                        ));
                    }
                    if let Some(volume) = status.volume {
                        m.push_text(" ");
                        m.push_markup(&Markup::element(
                            "span",
                            Some("muted"),
                            &format!("vol {volume}%"),
                        ));
                    }
                    m.close("p");
                    m
                }
                _ => muted_markup("Nothing playing"),
            },
        };
        if let Err(e) = surface.set(NOW_PLAYING, markup) {
            debug!("player: {}", e);
        }
    }

    fn render_queue(&self, surface: &mut Surface) {
        let markup = if self.queue.is_empty() {
            muted_markup("Queue is empty")
        } else {
            Markup::new()
        };
        if let Err(e) = surface.set(QUEUE, markup) {
            debug!("player: {}", e);
        }
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw_now_playing(&self, frame: &mut Frame, area: Rect, surface: &Surface) {
        let source = self.source();
        let badge = match (&self.status, source) {
            _ if self.offline => Some(Badge::filled("OFFLINE", C_ERROR)),
            (Some(status), _) if status.paused => Some(Badge::new("PAUSED", C_PAUSED)),
            (Some(_), Some(source)) if source.is_live() => Some(Badge::filled("LIVE", C_BADGE_LIVE)),
            (Some(_), Some(source)) => Some(Badge::new(source.label(), source_color(source))),
            _ => None,
        };
        let Some(inner) = draw_slot(frame, area, surface, NOW_PLAYING, false, badge) else {
            return;
        };
        if inner.height < 2 || source.is_none() {
            return;
        }
        let bar = Rect {
            y: inner.y + inner.height - 1,
            height: 1,
            ..inner
        };
        let position = self.shown_position(Instant::now());
        let paused = self.status.as_ref().is_some_and(|s| s.paused);
        if source.is_some_and(|s| s.is_live()) {
            draw_live(frame, bar, position);
        } else {
            draw_progress(
                frame,
                bar,
                position,
                self.track_duration(),
                paused,
                self.position.is_pending(),
            );
        }
    }

    fn draw_queue(&mut self, frame: &mut Frame, area: Rect, surface: &Surface) {
        if self.queue.is_empty() {
            draw_slot(frame, area, surface, QUEUE, true, None);
            return;
        }
        let Some(slot) = surface.slot(QUEUE) else {
            return;
        };
        let title = slot.title.as_deref().unwrap_or(QUEUE);
        let count = format!("{}", self.queue.len());
        let block = pane_chrome(title, true, Some(Badge::new(&count, C_SECONDARY)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        self.queue_height = inner.height as usize;
        self.queue.ensure_visible(self.queue_height);
        let lines: Vec<Line> = self
            .queue
            .visible_items(self.queue_height)
            .into_iter()
            .map(|(i, entry)| {
                let track = &entry.track;
                let selected = i == self.queue.selected;
                let base = if selected {
                    style_selected_focused()
                } else {
                    Style::default().fg(C_PRIMARY)
                };
                let duration = if track.source().is_live() || track.duration == 0 {
                    "live".to_string()
                } else {
                    format_time(track.duration)
                };
                Line::from(vec![
                    Span::styled(format!("{:>3} ", entry.index + 1), base.fg(C_MUTED)),
                    Span::styled(track.title.clone(), base),
                    Span::styled(
                        if track.author.is_empty() {
                            String::new()
                        } else {
                            format!(" · {}", track.author)
                        },
                        base.fg(C_SECONDARY),
                    ),
                    Span::styled(
                        format!("  {duration}"),
                        base.fg(source_color(track.source())).remove_modifier(Modifier::BOLD),
                    ),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl View for PlayerView {
    fn init(&mut self, ctx: ViewContext<'_>) -> Vec<Action> {
        self.reset();
        if !require_slots(ctx.surface, ViewName::Player, &[NOW_PLAYING, QUEUE]) {
            return Vec::new();
        }
        let tasks = ctx.tasks;

        let api = self.api.clone();
        tasks.spawn_polling(self.status_interval, move || {
            let api = api.clone();
            async move { ViewEvent::Player(PlayerEvent::Status(api.status().await)) }
        });
        let api = self.api.clone();
        tasks.spawn_polling(self.queue_interval, move || {
            let api = api.clone();
            async move { ViewEvent::Player(PlayerEvent::Queue(api.queue().await)) }
        });
        self.tasks = Some(tasks);
        Vec::new()
    }

    fn teardown(&mut self) {
        self.tasks = None;
        self.close_prompt();
    }

    fn on_event(
        &mut self,
        session: SessionId,
        event: ViewEvent,
        surface: &mut Surface,
    ) -> Vec<Action> {
        if !is_current(&self.tasks, session) {
            return Vec::new();
        }
        let ViewEvent::Player(event) = event else {
            return Vec::new();
        };
        match event {
            PlayerEvent::Refresh => {
                self.fetch_status();
                self.fetch_queue();
            }
            PlayerEvent::Status(Ok(status)) => {
                self.apply_status(status, Instant::now());
                self.render_now_playing(surface);
            }
            PlayerEvent::Status(Err(e)) => {
                warn!("player: status poll failed: {}", e);
                self.offline = true;
                self.feed.publish(None);
                self.render_now_playing(surface);
            }
            PlayerEvent::Queue(Ok(queue)) => {
                self.queue.set_items(queue.into_entries());
                self.queue_loaded = true;
                self.render_queue(surface);
            }
            PlayerEvent::Queue(Err(e)) => {
                warn!("player: queue poll failed: {}", e);
                if !self.queue_loaded {
                    if let Err(e) = surface.set(QUEUE, error_markup(&e.user_message())) {
                        debug!("player: {}", e);
                    }
                }
            }
            PlayerEvent::Control(control, Ok(ack)) => {
                self.schedule_refresh();
                let message = ack
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| control.done_message());
                return vec![Action::success(message)];
            }
            PlayerEvent::Control(control, Err(e)) => {
                warn!("player: {:?} failed: {}", control, e);
                if let Control::Seek(_) = control {
                    let server = self.status.as_ref().map(|s| s.position).unwrap_or(0);
                    self.position.revert(server);
                    self.sampled_at = Instant::now();
                }
                return vec![Action::error(e.user_message())];
            }
        }
        Vec::new()
    }

    fn handle_key(&mut self, key: KeyEvent, _surface: &mut Surface) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        if let Some(prompt) = self.prompt {
            return match self.input.handle_key(key) {
                InputAction::Submitted(text) => {
                    self.close_prompt();
                    self.submit(prompt, text)
                }
                InputAction::Cancelled => {
                    self.close_prompt();
                    Vec::new()
                }
                InputAction::Changed(_) | InputAction::None => Vec::new(),
            };
        }

        match key.code {
            KeyCode::Char(' ') => {
                if self.is_running() {
                    self.control(Control::Pause);
                } else {
                    self.control(Control::Play);
                }
            }
            KeyCode::Char('n') => self.control(Control::Skip),
            KeyCode::Char('s') => self.control(Control::Stop),
            KeyCode::Left | KeyCode::Char('h') => return self.seek_relative(-(SEEK_STEP_MS as i64)),
            KeyCode::Right | KeyCode::Char('l') => return self.seek_relative(SEEK_STEP_MS as i64),
            KeyCode::Char('=') => self.open_prompt(Prompt::Seek),
            KeyCode::Char('a') => self.open_prompt(Prompt::Add),
            KeyCode::Char('A') => self.open_prompt(Prompt::PlayNext),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(entry) = self.queue.selected_item() {
                    self.control(Control::Remove(entry.index));
                }
            }
            KeyCode::Char('K') => self.move_selected(false),
            KeyCode::Char('J') => self.move_selected(true),
            KeyCode::Up | KeyCode::Char('k') => self.queue.select_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.queue.select_down(1),
            KeyCode::PageUp => self.queue.select_up(10),
            KeyCode::PageDown => self.queue.select_down(10),
            KeyCode::Home => self.queue.select_first(),
            KeyCode::End => self.queue.select_last(),
            KeyCode::Char('y') => {
                let uri = self
                    .status
                    .as_ref()
                    .and_then(|s| s.current_track.as_ref())
                    .map(|t| t.uri.clone())
                    .filter(|u| !u.is_empty());
                return match uri {
                    Some(uri) => vec![Action::CopyToClipboard(uri)],
                    None => vec![Action::error("Nothing to copy")],
                };
            }
            KeyCode::Char('r') => {
                self.fetch_status();
                self.fetch_queue();
            }
            _ => {}
        }
        Vec::new()
    }

    fn input_mode(&self) -> InputMode {
        if self.prompt.is_some() {
            InputMode::Input
        } else {
            InputMode::Normal
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, surface: &Surface) {
        let [top, rest] = Layout::vertical([Constraint::Length(7), Constraint::Min(3)]).areas(area);
        self.draw_now_playing(frame, top, surface);

        if self.prompt.is_some() {
            let [list, prompt] =
                Layout::vertical([Constraint::Min(2), Constraint::Length(1)]).areas(rest);
            self.draw_queue(frame, list, surface);
            self.input.draw(frame, prompt);
        } else {
            self.draw_queue(frame, rest, surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::SharedState;
    use crate::guild::GuildSelector;
    use panel_proto::protocol::Track;
    use std::sync::Arc;

    fn view() -> PlayerView {
        let api = ApiClient::with_http(reqwest::Client::new(), "http://127.0.0.1:9");
        let (_, feed, _) = SharedState::new(Arc::new(GuildSelector::new(api.clone())));
        PlayerView::new(api, feed, Duration::from_secs(5), Duration::from_secs(10))
    }

    fn status(position: u64, paused: bool) -> PlaybackStatus {
        PlaybackStatus {
            playing: true,
            paused,
            position,
            current_track: Some(Track {
                title: "Bad Apple!!".into(),
                uri: "https://youtu.be/FtutLA63Cp8".into(),
                duration: 219_000,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_seek_target_wins_inside_window() {
        let mut player = view();
        let t0 = Instant::now();
        player.apply_status(status(10_000, true), t0);

        player.position.set_intent_at(70_000, t0);
        let changed = player.apply_status(status(10_400, true), t0 + Duration::from_millis(300));
        assert!(!changed);
        assert_eq!(player.shown_position(t0 + Duration::from_millis(300)), 70_000);
    }

    #[test]
    fn test_server_wins_after_window() {
        let mut player = view();
        let t0 = Instant::now();
        player.apply_status(status(10_000, true), t0);
        player.position.set_intent_at(70_000, t0);

        let later = t0 + Duration::from_millis(1_100);
        assert!(player.apply_status(status(12_000, true), later));
        assert_eq!(player.shown_position(later), 12_000);
    }

    #[test]
    fn test_reaching_target_settles_early() {
        let mut player = view();
        let t0 = Instant::now();
        player.apply_status(status(10_000, true), t0);
        player.position.set_intent_at(70_000, t0);

        let soon = t0 + Duration::from_millis(200);
        assert!(player.apply_status(status(70_150, true), soon));
        assert!(!player.position.is_pending());
    }

    #[test]
    fn test_position_advances_while_playing_and_clamps() {
        let mut player = view();
        let t0 = Instant::now();
        player.apply_status(status(218_000, false), t0);
        assert_eq!(player.shown_position(t0 + Duration::from_millis(500)), 218_500);
        assert_eq!(player.shown_position(t0 + Duration::from_secs(10)), 219_000);
    }

    #[test]
    fn test_track_change_drops_pending_seek() {
        let mut player = view();
        let t0 = Instant::now();
        player.apply_status(status(10_000, true), t0);
        player.position.set_intent_at(70_000, t0);

        let mut next = status(0, true);
        if let Some(track) = next.current_track.as_mut() {
            track.uri = "https://youtu.be/other".into();
        }
        assert!(player.apply_status(next, t0 + Duration::from_millis(100)));
        assert_eq!(player.position, Optimistic::Confirmed(0));
    }

    #[test]
    fn test_live_source_refuses_seek() {
        let mut player = view();
        let mut live = status(0, false);
        if let Some(track) = live.current_track.as_mut() {
            track.uri = "https://stream.gensokyoradio.net/1/".into();
            track.duration = 0;
        }
        player.apply_status(live, Instant::now());
        let actions = player.seek_relative(10_000);
        assert!(matches!(
            actions.as_slice(),
            [Action::Toast { success: false, .. }]
        ));
        assert!(!player.position.is_pending());
    }
}

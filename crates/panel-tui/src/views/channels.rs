//! Channels view: the selected guild's channels grouped by category, the
//! messages of one text channel and a composer to post into it.

use std::cmp::Ordering;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
    Frame,
};
use tracing::{debug, info, warn};

use panel_proto::client::{ApiClient, ApiError};
use panel_proto::format::format_timestamp;
use panel_proto::protocol::{
    snowflake_cmp, Channel, ChannelInfo, ChannelKind, ChannelList, Message, MessageList,
    SentMessage,
};

use crate::action::Action;
use crate::app_state::SharedState;
use crate::guild::CurrentGuild;
use crate::loader::LoadRequest;
use crate::markup::discord::{format_message, MentionNames};
use crate::markup::render::{to_lines, wrapped, wrapped_height};
use crate::markup::Markup;
use crate::router::ViewName;
use crate::session::{RequestSlot, SessionId, SessionTasks};
use crate::surface::Surface;
use crate::theme::{
    style_selected_focused, C_ACCENT, C_MUTED, C_PRIMARY, C_SECONDARY, C_SELECTION_BG,
};
use crate::widgets::line_input::{InputAction, LineInput};
use crate::widgets::pane_chrome::{draw_slot, pane_chrome, Badge};
use crate::widgets::scrollable_list::ScrollableList;
use crate::widgets::status_bar::InputMode;

use super::{error_markup, is_current, muted_markup, require_slots, View, ViewContext, ViewEvent};

const LIST: &str = "channel-list";
const VIEW: &str = "channel-view";
const HEADER: &str = "channel-header";
const MESSAGES: &str = "messages";
const COMPOSER: &str = "composer";

const LIST_WIDTH: u16 = 30;

#[derive(Debug)]
pub enum ChannelsEvent {
    Channels(Result<ChannelList, ApiError>),
    Opened {
        channel_id: String,
        result: Result<(Option<ChannelInfo>, MessageList), ApiError>,
    },
    Older {
        channel_id: String,
        result: Result<MessageList, ApiError>,
    },
    Sent {
        channel_id: String,
        result: Result<SentMessage, ApiError>,
    },
}

// ── Grouping ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ChannelGroup {
    /// `None` for channels outside any known category.
    pub category: Option<Channel>,
    pub channels: Vec<Channel>,
}

fn by_position(a: &Channel, b: &Channel) -> Ordering {
    a.position
        .cmp(&b.position)
        .then_with(|| snowflake_cmp(&a.id, &b.id))
}

/// Group channels under their categories.  The uncategorized group, when
/// not empty, comes first; a channel whose parent is not in `channels`
/// counts as uncategorized.
pub fn group_channels(channels: Vec<Channel>) -> Vec<ChannelGroup> {
    let (mut categories, members): (Vec<Channel>, Vec<Channel>) = channels
        .into_iter()
        .partition(|c| c.kind == ChannelKind::Category);
    categories.sort_by(by_position);

    let mut groups: Vec<ChannelGroup> = categories
        .into_iter()
        .map(|c| ChannelGroup {
            category: Some(c),
            channels: Vec::new(),
        })
        .collect();
    let mut loose = Vec::new();
    for channel in members {
        let parent = channel.parent_id.as_deref().and_then(|id| {
            groups
                .iter()
                .position(|g| g.category.as_ref().is_some_and(|c| c.id == id))
        });
        match parent {
            Some(i) => groups[i].channels.push(channel),
            None => loose.push(channel),
        }
    }
    for group in &mut groups {
        group.channels.sort_by(by_position);
    }
    if !loose.is_empty() {
        loose.sort_by(by_position);
        groups.insert(
            0,
            ChannelGroup {
                category: None,
                channels: loose,
            },
        );
    }
    groups
}

#[derive(Debug, Clone, PartialEq)]
enum ChannelRow {
    Category(String),
    Channel(Channel),
}

fn flatten(groups: Vec<ChannelGroup>) -> Vec<ChannelRow> {
    let mut rows = Vec::new();
    for group in groups {
        if let Some(category) = group.category {
            rows.push(ChannelRow::Category(category.name));
        }
        rows.extend(group.channels.into_iter().map(ChannelRow::Channel));
    }
    rows
}

// ── Transcript ────────────────────────────────────────────────────────────────

/// Loaded messages, oldest first, each pre-rendered to lines.
#[derive(Default)]
pub struct Transcript {
    messages: Vec<Message>,
    blocks: Vec<Vec<Line<'static>>>,
}

fn render_message(message: &Message) -> Vec<Line<'static>> {
    let mut m = Markup::new();
    m.open("p", None);
    m.push_markup(&Markup::element("strong", None, message.author.shown_name()));
    if message.author.bot {
        m.push_text(" ");
        m.push_markup(&Markup::element("span", Some("tag"), "BOT"));
    }
    m.push_text("  ");
    m.push_markup(&Markup::element(
        "span",
        Some("muted"),
        &format_timestamp(message.timestamp),
    ));
    if message.edited_timestamp.is_some() {
        m.push_markup(&Markup::element("span", Some("muted"), " (edited)"));
    }
    m.close("p");
    m.push_markup(&format_message(
        &message.content,
        &MentionNames::from_message(message),
    ));
    for attachment in &message.attachments {
        m.push_markup(&Markup::element(
            "p",
            Some("secondary"),
            &format!("📎 {}", attachment.filename),
        ));
    }
    let mut lines = to_lines(&m);
    lines.push(Line::default());
    lines
}

impl Transcript {
    pub fn new(messages: Vec<Message>) -> Self {
        let blocks = messages.iter().map(render_message).collect();
        Self { messages, blocks }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    pub fn oldest_id(&self) -> Option<&str> {
        self.messages.first().map(|m| m.id.as_str())
    }

    /// Put `older` (oldest first) in front, dropping anything not strictly
    /// older than what is loaded.  Returns how many were added.
    pub fn prepend(&mut self, older: Vec<Message>) -> usize {
        let older: Vec<Message> = match self.oldest_id() {
            Some(oldest) => older
                .into_iter()
                .filter(|m| snowflake_cmp(&m.id, oldest) == Ordering::Less)
                .collect(),
            None => older,
        };
        let added = older.len();
        let blocks: Vec<_> = older.iter().map(render_message).collect();
        self.messages.splice(0..0, older);
        self.blocks.splice(0..0, blocks);
        added
    }

    /// Append a message unless one with the same id is loaded.
    pub fn push(&mut self, message: Message) -> bool {
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.blocks.push(render_message(&message));
        self.messages.push(message);
        true
    }

    pub fn height(&self, width: u16) -> usize {
        self.blocks.iter().map(|b| wrapped_height(b, width)).sum()
    }

    /// Rows above message `index`.
    pub fn offset_of(&self, index: usize, width: u16) -> usize {
        self.blocks
            .iter()
            .take(index)
            .map(|b| wrapped_height(b, width))
            .sum()
    }

    fn block_height(&self, index: usize, width: u16) -> usize {
        self.blocks
            .get(index)
            .map_or(0, |b| wrapped_height(b, width))
    }

    fn lines(&self, selected: Option<usize>) -> Vec<Line<'static>> {
        let highlight = Style::default().bg(C_SELECTION_BG);
        self.blocks
            .iter()
            .enumerate()
            .flat_map(|(i, block)| {
                block.iter().cloned().map(move |line| {
                    if Some(i) == selected {
                        line.patch_style(highlight)
                    } else {
                        line
                    }
                })
            })
            .collect()
    }
}

/// Scroll offset that keeps the same rows on screen after content of
/// `after - before` rows was inserted above them.
pub fn preserved_offset(offset: usize, height_before: usize, height_after: usize) -> usize {
    offset + height_after.saturating_sub(height_before)
}

// ── View ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    Messages,
}

struct OpenChannel {
    channel: Channel,
    transcript: Transcript,
    loading: bool,
    loading_older: bool,
    /// The beginning of the channel is loaded.
    exhausted: bool,
}

pub struct ChannelsView {
    api: ApiClient,
    shared: SharedState,
    message_limit: u32,
    tasks: Option<SessionTasks>,

    focus: Focus,
    rows: ScrollableList<ChannelRow>,
    list_height: usize,
    open: Option<OpenChannel>,
    selected: usize,
    scroll: usize,
    /// Keep the newest message in view.
    follow: bool,
    viewport: (u16, usize),

    list_slot: RequestSlot,
    open_slot: RequestSlot,
    older_slot: RequestSlot,

    composer_ready: bool,
    composer: LineInput,
    sending: bool,
}

impl ChannelsView {
    pub fn new(api: ApiClient, shared: SharedState, message_limit: u32) -> Self {
        Self {
            api,
            shared,
            message_limit: message_limit.max(1),
            tasks: None,
            focus: Focus::List,
            rows: ScrollableList::new(),
            list_height: 0,
            open: None,
            selected: 0,
            scroll: 0,
            follow: true,
            viewport: (0, 0),
            list_slot: RequestSlot::default(),
            open_slot: RequestSlot::default(),
            older_slot: RequestSlot::default(),
            composer_ready: false,
            composer: LineInput::new("say:", "message"),
            sending: false,
        }
    }

    fn reset(&mut self) {
        self.list_slot.cancel();
        self.open_slot.cancel();
        self.older_slot.cancel();
        self.focus = Focus::List;
        self.rows.reset();
        self.open = None;
        self.selected = 0;
        self.scroll = 0;
        self.follow = true;
        self.composer_ready = false;
        self.composer.deactivate();
        self.composer.clear();
        self.sending = false;
    }

    // ── Requests ──────────────────────────────────────────────────────────────

    fn load_channels(&mut self, surface: &mut Surface) {
        let Some(tasks) = &self.tasks else {
            return;
        };
        let Some(guild_id) = self.shared.guild_id() else {
            self.list_slot.cancel();
            self.rows.reset();
            set_markup(surface, LIST, muted_markup("No server selected. Press g to pick one."));
            return;
        };
        debug!("channels: loading list of guild {}", guild_id);
        set_markup(surface, LIST, muted_markup("Loading channels…"));
        let token = self.list_slot.replace(tasks);
        let api = self.api.clone();
        tasks.spawn_with(
            token,
            async move { api.channels(&guild_id).await },
            |result| ViewEvent::Channels(ChannelsEvent::Channels(result)),
        );
    }

    fn open_selected(&mut self, surface: &mut Surface) -> Vec<Action> {
        let Some(ChannelRow::Channel(channel)) = self.rows.selected_item() else {
            return Vec::new();
        };
        if !channel.kind.is_textual() {
            return vec![Action::error(format!("#{} is not a text channel", channel.name))];
        }
        let channel = channel.clone();
        let Some(tasks) = &self.tasks else {
            return Vec::new();
        };
        info!("channels: opening #{} ({})", channel.name, channel.id);

        let token = self.open_slot.replace(tasks);
        self.older_slot.cancel();
        let api = self.api.clone();
        let channel_id = channel.id.clone();
        let limit = self.message_limit;
        let id = channel_id.clone();
        tasks.spawn_with(
            token,
            async move {
                let (info, messages) =
                    tokio::join!(api.channel(&id), api.messages(&id, limit, None));
                let info = info
                    .map_err(|e| warn!("channels: info of {} failed: {}", id, e))
                    .ok();
                Ok::<_, ApiError>((info, messages?))
            },
            move |result| ViewEvent::Channels(ChannelsEvent::Opened { channel_id, result }),
        );

        self.open = Some(OpenChannel {
            channel,
            transcript: Transcript::default(),
            loading: true,
            loading_older: false,
            exhausted: false,
        });
        self.selected = 0;
        self.scroll = 0;
        self.follow = true;
        self.render_header(surface);
        set_markup(surface, MESSAGES, muted_markup("Loading messages…"));
        Vec::new()
    }

    fn load_older(&mut self) -> Vec<Action> {
        let (Some(tasks), Some(open)) = (&self.tasks, &mut self.open) else {
            return Vec::new();
        };
        if open.loading || open.loading_older {
            return Vec::new();
        }
        if open.exhausted {
            return vec![Action::success("Already at the beginning of the channel")];
        }
        let Some(before) = open.transcript.oldest_id().map(str::to_string) else {
            return Vec::new();
        };
        open.loading_older = true;
        debug!("channels: older messages before {}", before);
        let token = self.older_slot.replace(tasks);
        let api = self.api.clone();
        let channel_id = open.channel.id.clone();
        let id = channel_id.clone();
        let limit = self.message_limit;
        tasks.spawn_with(
            token,
            async move { api.messages(&id, limit, Some(&before)).await },
            move |result| ViewEvent::Channels(ChannelsEvent::Older { channel_id, result }),
        );
        Vec::new()
    }

    fn send(&mut self, text: String) -> Vec<Action> {
        let (Some(tasks), Some(open)) = (&self.tasks, &self.open) else {
            return vec![Action::error("Open a channel first")];
        };
        if text.is_empty() || self.sending {
            return Vec::new();
        }
        info!("channels: sending to #{}", open.channel.name);
        self.sending = true;
        let api = self.api.clone();
        let channel_id = open.channel.id.clone();
        let id = channel_id.clone();
        tasks.spawn(
            async move { api.send_message(&id, &text).await },
            move |result| ViewEvent::Channels(ChannelsEvent::Sent { channel_id, result }),
        );
        Vec::new()
    }

    fn open_id(&self) -> Option<&str> {
        self.open.as_ref().map(|o| o.channel.id.as_str())
    }

    // ── Scrolling ─────────────────────────────────────────────────────────────

    fn width(&self) -> u16 {
        self.viewport.0.max(1)
    }

    fn select_message(&mut self, index: usize) {
        let Some(open) = &self.open else {
            return;
        };
        if open.transcript.is_empty() {
            return;
        }
        self.selected = index.min(open.transcript.len() - 1);
        let width = self.width();
        let height = self.viewport.1.max(1);
        let top = open.transcript.offset_of(self.selected, width);
        let bottom = top + open.transcript.block_height(self.selected, width);
        if top < self.scroll {
            self.scroll = top;
        } else if bottom > self.scroll + height {
            self.scroll = bottom.saturating_sub(height).min(top);
        }
        let max = open.transcript.height(width).saturating_sub(height);
        self.follow = self.scroll >= max;
    }

    fn scroll_by(&mut self, delta: isize) {
        let Some(open) = &self.open else {
            return;
        };
        let max = open
            .transcript
            .height(self.width())
            .saturating_sub(self.viewport.1);
        self.scroll = self.scroll.saturating_add_signed(delta).min(max);
        self.follow = self.scroll >= max;
    }

    // ── Slots ─────────────────────────────────────────────────────────────────

    fn render_header(&self, surface: &mut Surface) {
        let mut m = Markup::new();
        if let Some(open) = &self.open {
            m.push_markup(&Markup::element(
                "strong",
                None,
                &format!("# {}", open.channel.name),
            ));
            if let Some(topic) = open.channel.topic.as_deref().filter(|t| !t.is_empty()) {
                m.push_text("  ");
                m.push_markup(&Markup::element("span", Some("muted"), topic));
            }
        }
        set_markup(surface, HEADER, m);
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw_list(&mut self, frame: &mut Frame, area: Rect, surface: &Surface) {
        let focused = self.focus == Focus::List;
        if self.rows.is_empty() {
            draw_slot(frame, area, surface, LIST, focused, None);
            return;
        }
        let title = surface
            .slot(LIST)
            .and_then(|s| s.title.as_deref())
            .unwrap_or("Channels");
        let guild = self.shared.guild().map(|g| g.name).unwrap_or_default();
        let block = pane_chrome(title, focused, Some(Badge::new(&guild, C_SECONDARY)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        self.list_height = inner.height as usize;
        self.rows.ensure_visible(self.list_height);
        let open_id = self.open_id();
        let lines: Vec<Line> = self
            .rows
            .visible_items(self.list_height)
            .into_iter()
            .map(|(i, row)| match row {
                ChannelRow::Category(name) => Line::from(Span::styled(
                    name.to_uppercase(),
                    Style::default().fg(C_MUTED).add_modifier(Modifier::BOLD),
                )),
                ChannelRow::Channel(channel) => {
                    let mut style = if channel.kind.is_textual() {
                        Style::default().fg(C_PRIMARY)
                    } else {
                        Style::default().fg(C_MUTED)
                    };
                    if Some(channel.id.as_str()) == open_id {
                        style = style.fg(C_ACCENT);
                    }
                    if i == self.rows.selected {
                        style = style.patch(style_selected_focused());
                    }
                    let sigil = match channel.kind {
                        ChannelKind::Voice | ChannelKind::Stage => "🔊",
                        ChannelKind::Forum => "☰",
                        _ => "#",
                    };
                    Line::from(Span::styled(format!(" {sigil} {}", channel.name), style))
                }
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_messages(&mut self, frame: &mut Frame, area: Rect, surface: &Surface) {
        let focused = self.focus == Focus::Messages;
        let title = surface
            .slot(VIEW)
            .and_then(|s| s.title.as_deref())
            .unwrap_or("Messages");
        let badge = match &self.open {
            Some(open) if open.loading_older => Some("loading…".to_string()),
            Some(open) if !open.transcript.is_empty() => Some(open.transcript.len().to_string()),
            _ => None,
        };
        let block = pane_chrome(
            title,
            focused || self.composer.is_active(),
            badge.as_deref().map(|b| Badge::new(b, C_SECONDARY)),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [header, body, composer] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        if let Some(slot) = surface.slot(HEADER) {
            frame.render_widget(Paragraph::new(to_lines(&slot.markup)), header);
        }

        self.viewport = (body.width, body.height as usize);
        match &self.open {
            Some(open) if !open.transcript.is_empty() => {
                let width = body.width.max(1);
                let max = open
                    .transcript
                    .height(width)
                    .saturating_sub(self.viewport.1);
                self.scroll = if self.follow { max } else { self.scroll.min(max) };
                if self.follow {
                    self.selected = open.transcript.len() - 1;
                }
                let selected = focused.then_some(self.selected);
                let scroll = u16::try_from(self.scroll).unwrap_or(u16::MAX);
                frame.render_widget(
                    wrapped(open.transcript.lines(selected)).scroll((scroll, 0)),
                    body,
                );
            }
            _ => {
                if let Some(slot) = surface.slot(MESSAGES) {
                    frame.render_widget(
                        Paragraph::new(to_lines(&slot.markup)).wrap(Wrap { trim: false }),
                        body,
                    );
                }
            }
        }

        if self.composer.is_active() || (!self.composer.is_empty() && self.composer_ready) {
            self.composer.draw(frame, composer);
        } else if self.composer_ready {
            if let Some(slot) = surface.slot(COMPOSER) {
                frame.render_widget(Paragraph::new(to_lines(&slot.markup)), composer);
            }
        }
    }
}

fn set_markup(surface: &mut Surface, id: &str, markup: Markup) {
    if let Err(e) = surface.set(id, markup) {
        debug!("channels: {}", e);
    }
}

impl View for ChannelsView {
    fn init(&mut self, ctx: ViewContext<'_>) -> Vec<Action> {
        self.tasks = None;
        self.reset();
        if !require_slots(ctx.surface, ViewName::Channels, &[LIST, VIEW, HEADER, MESSAGES, COMPOSER]) {
            return Vec::new();
        }
        self.tasks = Some(ctx.tasks);
        self.load_channels(ctx.surface);
        vec![Action::Load(
            LoadRequest::new(COMPOSER, &format!("#{COMPOSER}")).then(ViewName::Channels),
        )]
    }

    fn after_load(&mut self, component: &str, _surface: &mut Surface) -> Vec<Action> {
        if component == COMPOSER {
            debug!("channels: composer ready");
            self.composer_ready = true;
        }
        Vec::new()
    }

    fn teardown(&mut self) {
        self.tasks = None;
        self.reset();
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
        let ViewEvent::Channels(event) = event else {
            return Vec::new();
        };
        match event {
            ChannelsEvent::Channels(Ok(list)) => {
                let rows = flatten(group_channels(list.channels));
                let first = rows
                    .iter()
                    .position(|r| matches!(r, ChannelRow::Channel(c) if c.kind.is_textual()))
                    .unwrap_or(0);
                let empty = rows.is_empty();
                self.rows.set_items(rows);
                self.rows.select(first);
                let markup = if empty {
                    muted_markup("This server has no channels the bot can see.")
                } else {
                    Markup::new()
                };
                set_markup(surface, LIST, markup);
            }
            ChannelsEvent::Channels(Err(e)) => {
                warn!("channels: list failed: {}", e);
                self.rows.reset();
                set_markup(surface, LIST, error_markup(&e.user_message()));
            }

            ChannelsEvent::Opened { channel_id, .. } if self.open_id() != Some(channel_id.as_str()) => {
                debug!("channels: result for {} dropped", channel_id);
            }
            ChannelsEvent::Opened { result, .. } => {
                let Some(open) = &mut self.open else {
                    return Vec::new();
                };
                open.loading = false;
                match result {
                    Ok((info, messages)) => {
                        if let Some(info) = info {
                            open.channel = info.channel;
                        }
                        let messages = messages.into_chronological();
                        open.exhausted = messages.len() < self.message_limit as usize;
                        open.transcript = Transcript::new(messages);
                        let markup = if open.transcript.is_empty() {
                            muted_markup("No messages yet.")
                        } else {
                            Markup::new()
                        };
                        self.follow = true;
                        self.selected = open.transcript.len().saturating_sub(1);
                        set_markup(surface, MESSAGES, markup);
                        self.render_header(surface);
                        self.focus = Focus::Messages;
                    }
                    Err(e) => {
                        warn!("channels: opening {} failed: {}", open.channel.id, e);
                        set_markup(surface, MESSAGES, error_markup(&e.user_message()));
                    }
                }
            }

            ChannelsEvent::Older { channel_id, .. } if self.open_id() != Some(channel_id.as_str()) => {}
            ChannelsEvent::Older { result, .. } => {
                let width = self.width();
                let Some(open) = &mut self.open else {
                    return Vec::new();
                };
                open.loading_older = false;
                match result {
                    Ok(list) => {
                        let older = list.into_chronological();
                        let received = older.len();
                        let before = open.transcript.height(width);
                        let added = open.transcript.prepend(older);
                        let after = open.transcript.height(width);
                        open.exhausted = received < self.message_limit as usize;
                        if added == 0 {
                            return vec![Action::success("Already at the beginning of the channel")];
                        }
                        self.scroll = preserved_offset(self.scroll, before, after);
                        self.selected += added;
                        self.follow = false;
                    }
                    Err(e) => {
                        warn!("channels: older messages failed: {}", e);
                        return vec![Action::error(e.user_message())];
                    }
                }
            }

            ChannelsEvent::Sent { channel_id, result } => {
                self.sending = false;
                match result {
                    Ok(sent) => {
                        self.composer.clear();
                        if let (Some(open), Some(message)) = (&mut self.open, sent.message) {
                            if open.channel.id == channel_id && open.transcript.push(message) {
                                self.follow = true;
                                set_markup(surface, MESSAGES, Markup::new());
                            }
                        }
                        return vec![Action::success("Message sent")];
                    }
                    Err(e) => {
                        warn!("channels: send failed: {}", e);
                        return vec![Action::error(e.user_message())];
                    }
                }
            }
        }
        Vec::new()
    }

    fn on_guild_changed(
        &mut self,
        _guild: Option<&CurrentGuild>,
        surface: &mut Surface,
    ) -> Vec<Action> {
        if self.tasks.is_none() {
            return Vec::new();
        }
        let composer_ready = self.composer_ready;
        self.reset();
        self.composer_ready = composer_ready;
        set_markup(surface, HEADER, Markup::new());
        set_markup(surface, MESSAGES, muted_markup("Pick a channel on the left."));
        self.load_channels(surface);
        Vec::new()
    }

    fn handle_key(&mut self, key: KeyEvent, surface: &mut Surface) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        if self.composer.is_active() {
            return match self.composer.handle_key(key) {
                InputAction::Submitted(text) => self.send(text),
                _ => Vec::new(),
            };
        }

        match key.code {
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::List if self.open.is_some() => Focus::Messages,
                    _ => Focus::List,
                };
                return Vec::new();
            }
            KeyCode::Char('i') => {
                if self.open.is_none() {
                    return vec![Action::error("Open a channel first")];
                }
                if !self.composer_ready {
                    return vec![Action::error("The composer is still loading")];
                }
                self.composer.activate();
                return Vec::new();
            }
            KeyCode::Char('m') => return self.load_older(),
            KeyCode::Char('r') => {
                self.load_channels(surface);
                return Vec::new();
            }
            _ => {}
        }

        match self.focus {
            Focus::List => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.rows.select_up(1),
                KeyCode::Down | KeyCode::Char('j') => self.rows.select_down(1),
                KeyCode::PageUp => self.rows.select_up(self.list_height.max(1)),
                KeyCode::PageDown => self.rows.select_down(self.list_height.max(1)),
                KeyCode::Home => self.rows.select_first(),
                KeyCode::End => self.rows.select_last(),
                KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                    return self.open_selected(surface)
                }
                _ => {}
            },
            Focus::Messages => match key.code {
                KeyCode::Up | KeyCode::Char('k') => {
                    self.select_message(self.selected.saturating_sub(1))
                }
                KeyCode::Down | KeyCode::Char('j') => self.select_message(self.selected + 1),
                KeyCode::PageUp => self.scroll_by(-(self.viewport.1.max(1) as isize)),
                KeyCode::PageDown => self.scroll_by(self.viewport.1.max(1) as isize),
                KeyCode::Home => self.select_message(0),
                KeyCode::End => self.select_message(usize::MAX),
                KeyCode::Left | KeyCode::Char('h') | KeyCode::Esc => self.focus = Focus::List,
                KeyCode::Char('y') => {
                    let message = self
                        .open
                        .as_ref()
                        .and_then(|o| o.transcript.get(self.selected));
                    if let Some(message) = message {
                        return vec![Action::CopyToClipboard(message.content.clone())];
                    }
                }
                _ => {}
            },
        }
        Vec::new()
    }

    fn input_mode(&self) -> InputMode {
        if self.composer.is_active() {
            InputMode::Input
        } else {
            InputMode::Normal
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, surface: &Surface) {
        let [list, view] =
            Layout::horizontal([Constraint::Length(LIST_WIDTH), Constraint::Min(20)]).areas(area);
        self.draw_list(frame, list, surface);
        self.draw_messages(frame, view, surface);
    }
}

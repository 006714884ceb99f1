//! History view: filtered, infinitely scrolling playback history.
//!
//! Pages are requested through one [`RequestSlot`]; any filter change
//! cancels the request in flight, clears the loaded rows and starts again
//! at offset 0.  The next page is requested from `tick` whenever the last
//! loaded row is inside the viewport.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use tracing::{debug, info, warn};

use panel_proto::client::{ApiClient, ApiError};
use panel_proto::format::format_timestamp;
use panel_proto::protocol::{
    Ack, HistoryPage, HistoryQuery, HistoryRecord, Requester, RequesterList, SourceType, TimeRange,
};

use crate::action::Action;
use crate::app_state::SharedState;
use crate::guild::CurrentGuild;
use crate::markup::Markup;
use crate::router::ViewName;
use crate::session::{RequestSlot, SessionId, SessionTasks};
use crate::surface::Surface;
use crate::theme::{source_color, style_selected_focused, C_MUTED, C_PRIMARY, C_SECONDARY};
use crate::widgets::line_input::{InputAction, LineInput};
use crate::widgets::pane_chrome::{draw_slot, pane_chrome, Badge};
use crate::widgets::scrollable_list::ScrollableList;
use crate::widgets::status_bar::InputMode;

use super::{error_markup, is_current, muted_markup, require_slots, View, ViewContext, ViewEvent};

const FILTERS: &str = "history-filters";
const LIST: &str = "history-list";

const SOURCE_CYCLE: [Option<SourceType>; 6] = [
    None,
    Some(SourceType::YouTube),
    Some(SourceType::Spotify),
    Some(SourceType::SoundCloud),
    Some(SourceType::Radio),
    Some(SourceType::LocalFile),
];

#[derive(Debug)]
pub enum HistoryEvent {
    Page {
        generation: u64,
        result: Result<HistoryPage, ApiError>,
    },
    Requesters(Result<RequesterList, ApiError>),
    Queued(String, Result<Ack, ApiError>),
}

// ── Pagination ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Pager {
    pub limit: u32,
    pub loaded: u64,
    /// Unknown until the first page arrived.
    pub total: Option<u64>,
    pub in_flight: bool,
    /// A page failed; no automatic fetches until the next reset.
    pub stalled: bool,
}

impl Pager {
    pub fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            loaded: 0,
            total: None,
            in_flight: false,
            stalled: false,
        }
    }

    pub fn has_more(&self) -> bool {
        self.total.map_or(true, |total| self.loaded < total)
    }

    /// Offset of the next page, now marked in flight.  `None` while a page
    /// is in flight or when nothing remains.
    pub fn begin(&mut self) -> Option<u64> {
        if self.in_flight || self.stalled || !self.has_more() {
            return None;
        }
        self.in_flight = true;
        Some(self.loaded)
    }

    pub fn finish(&mut self, received: usize, total: u64) {
        self.in_flight = false;
        self.loaded += received as u64;
        // An empty page ends the list even if `total` says otherwise.
        self.total = Some(if received == 0 { self.loaded } else { total });
    }

    pub fn fail(&mut self) {
        self.in_flight = false;
        self.stalled = true;
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.limit);
    }
}

// ── Filters ───────────────────────────────────────────────────────────────────

fn field(m: &mut Markup, label: &str, value: &str) {
    m.push_markup(&Markup::element("span", Some("muted"), label));
    m.push_text(" ");
    m.push_markup(&Markup::element("span", Some("tag"), value));
    m.push_text("   ");
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilters {
    pub source: Option<SourceType>,
    pub time_range: TimeRange,
    pub requester: Option<Requester>,
    pub search: Option<String>,
}

impl HistoryFilters {
    pub fn query(&self, limit: u32, offset: u64, guild_id: Option<String>) -> HistoryQuery {
        HistoryQuery {
            limit,
            offset,
            guild_id,
            source: self.source,
            requester: self.requester.as_ref().map(|r| r.id.clone()),
            time_range: self.time_range,
            search: self.search.clone(),
        }
    }

    pub fn cycle_source(&mut self) {
        let i = SOURCE_CYCLE
            .iter()
            .position(|s| *s == self.source)
            .unwrap_or(0);
        self.source = SOURCE_CYCLE[(i + 1) % SOURCE_CYCLE.len()];
    }

    /// None → first requester → … → last → None.
    pub fn cycle_requester(&mut self, requesters: &[Requester]) {
        let next = match &self.requester {
            None => requesters.first(),
            Some(current) => requesters
                .iter()
                .position(|r| r.id == current.id)
                .and_then(|i| requesters.get(i + 1)),
        };
        self.requester = next.cloned();
    }
}

pub struct HistoryView {
    api: ApiClient,
    shared: SharedState,
    tasks: Option<SessionTasks>,

    pager: Pager,
    /// Bumped on every reset; pages of older generations are dropped.
    generation: u64,
    filters: HistoryFilters,
    requesters: Vec<Requester>,
    records: ScrollableList<HistoryRecord>,
    viewport: usize,
    error: Option<String>,

    page_slot: RequestSlot,
    requester_slot: RequestSlot,
    search: LineInput,
}

impl HistoryView {
    pub fn new(api: ApiClient, shared: SharedState, page_size: u32) -> Self {
        Self {
            api,
            shared,
            tasks: None,
            pager: Pager::new(page_size),
            generation: 0,
            filters: HistoryFilters::default(),
            requesters: Vec::new(),
            records: ScrollableList::new(),
            viewport: 0,
            error: None,
            page_slot: RequestSlot::default(),
            requester_slot: RequestSlot::default(),
            search: LineInput::new("search:", "title, artist or URL"),
        }
    }

    // ── Requests ──────────────────────────────────────────────────────────────

    fn fetch_next(&mut self) {
        let Some(tasks) = &self.tasks else {
            return;
        };
        let Some(offset) = self.pager.begin() else {
            return;
        };
        let query = self
            .filters
            .query(self.pager.limit, offset, self.shared.guild_id());
        debug!("history: page at offset {} ({:?})", offset, query.params());
        let token = self.page_slot.replace(tasks);
        let generation = self.generation;
        let api = self.api.clone();
        tasks.spawn_with(
            token,
            async move { api.history(&query).await },
            move |result| ViewEvent::History(HistoryEvent::Page { generation, result }),
        );
    }

    fn load_requesters(&mut self) {
        let Some(tasks) = &self.tasks else {
            return;
        };
        let token = self.requester_slot.replace(tasks);
        let guild = self.shared.guild_id();
        let api = self.api.clone();
        tasks.spawn_with(
            token,
            async move { api.history_requesters(guild.as_deref()).await },
            |result| ViewEvent::History(HistoryEvent::Requesters(result)),
        );
    }

    /// Start over from page one with the current filters.
    fn reload(&mut self, surface: &mut Surface) {
        self.page_slot.cancel();
        self.pager.reset();
        self.generation += 1;
        self.records.reset();
        self.error = None;
        self.render_filters(surface);
        self.set_list_markup(surface, muted_markup("Loading history…"));
        self.fetch_next();
    }

    fn queue_selected(&self) -> Vec<Action> {
        let (Some(tasks), Some(record)) = (&self.tasks, self.records.selected_item()) else {
            return Vec::new();
        };
        if record.uri.is_empty() {
            return vec![Action::error("This entry has no URL")];
        }
        info!("history: queueing {}", record.uri);
        let api = self.api.clone();
        let uri = record.uri.clone();
        let title = record.title.clone();
        tasks.spawn(async move { api.queue_add(&uri).await }, move |res| {
            ViewEvent::History(HistoryEvent::Queued(title, res))
        });
        Vec::new()
    }

    // ── Rendering into slots ──────────────────────────────────────────────────

    fn render_filters(&self, surface: &mut Surface) {
        let mut m = Markup::new();
        field(
            &mut m,
            "source",
            self.filters.source.map(|s| s.label()).unwrap_or("all"),
        );
        field(&mut m, "time", self.filters.time_range.as_param());
        field(
            &mut m,
            "requester",
            self.filters
                .requester
                .as_ref()
                .map(|r| if r.name.is_empty() { r.id.as_str() } else { r.name.as_str() })
                .unwrap_or("anyone"),
        );
        if let Some(search) = &self.filters.search {
            field(&mut m, "search", search);
        }
        if let Some(guild) = self.shared.guild() {
            m.push_markup(&Markup::element("span", Some("secondary"), &guild.name));
        }
        if let Err(e) = surface.set(FILTERS, m) {
            debug!("history: {}", e);
        }
    }

    fn set_list_markup(&self, surface: &mut Surface, markup: Markup) {
        if let Err(e) = surface.set(LIST, markup) {
            debug!("history: {}", e);
        }
    }

    fn render_list(&self, surface: &mut Surface) {
        let markup = match &self.error {
            Some(message) if self.records.is_empty() => error_markup(message),
            _ if self.records.is_empty() => muted_markup("No plays match these filters"),
            _ => Markup::new(),
        };
        self.set_list_markup(surface, markup);
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw_list(&mut self, frame: &mut Frame, area: Rect, surface: &Surface) {
        if self.records.is_empty() {
            self.viewport = area.height.saturating_sub(2) as usize;
            draw_slot(frame, area, surface, LIST, true, None);
            return;
        }
        let Some(slot) = surface.slot(LIST) else {
            return;
        };
        let title = slot.title.as_deref().unwrap_or(LIST);
        let badge_text = if self.pager.in_flight {
            "loading…".to_string()
        } else {
            match self.pager.total {
                Some(total) => format!("{}/{}", self.pager.loaded, total),
                None => format!("{}", self.pager.loaded),
            }
        };
        let block = pane_chrome(title, true, Some(Badge::new(&badge_text, C_SECONDARY)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        self.viewport = inner.height as usize;
        self.records.ensure_visible(self.viewport);
        let lines: Vec<Line> = self
            .records
            .visible_items(self.viewport)
            .into_iter()
            .map(|(i, record)| {
                let base = if i == self.records.selected {
                    style_selected_focused()
                } else {
                    Style::default().fg(C_PRIMARY)
                };
                let when = record
                    .played_at()
                    .map(format_timestamp)
                    .unwrap_or_default();
                let source = record.source();
                let mut spans = vec![
                    Span::styled(format!("{when:<17}"), base.fg(C_MUTED)),
                    Span::styled(format!("{:<10} ", source.label()), base.fg(source_color(source))),
                    Span::styled(record.title.clone(), base),
                ];
                if !record.author.is_empty() {
                    spans.push(Span::styled(format!(" · {}", record.author), base.fg(C_SECONDARY)));
                }
                if let Some(name) = &record.requester_name {
                    spans.push(Span::styled(format!("  @{name}"), base.fg(C_MUTED)));
                }
                Line::from(spans)
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

impl View for HistoryView {
    fn init(&mut self, ctx: ViewContext<'_>) -> Vec<Action> {
        self.tasks = None;
        self.page_slot.cancel();
        self.requester_slot.cancel();
        self.search.deactivate();
        self.filters = HistoryFilters::default();
        self.requesters.clear();
        if !require_slots(ctx.surface, ViewName::History, &[FILTERS, LIST]) {
            return Vec::new();
        }
        self.tasks = Some(ctx.tasks);
        self.load_requesters();
        self.reload(ctx.surface);
        Vec::new()
    }

    fn teardown(&mut self) {
        self.tasks = None;
        self.page_slot.cancel();
        self.requester_slot.cancel();
        self.search.deactivate();
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
        let ViewEvent::History(event) = event else {
            return Vec::new();
        };
        match event {
            HistoryEvent::Page { generation, .. } if generation != self.generation => {
                debug!("history: page of generation {} dropped", generation);
            }
            HistoryEvent::Page {
                result: Err(e), ..
            } if e.is_cancelled() => {
                debug!("history: page request cancelled");
            }
            HistoryEvent::Page {
                result: Ok(page), ..
            } => {
                let received = page.history.len();
                self.records.extend(page.history);
                self.pager.finish(received, page.total);
                self.error = None;
                self.render_list(surface);
            }
            HistoryEvent::Page {
                result: Err(e), ..
            } => {
                warn!("history: page failed: {}", e);
                self.pager.fail();
                if self.records.is_empty() {
                    self.error = Some(e.user_message());
                    self.render_list(surface);
                } else {
                    return vec![Action::error(e.user_message())];
                }
            }
            HistoryEvent::Requesters(Ok(list)) => {
                self.requesters = list.requesters;
            }
            HistoryEvent::Requesters(Err(e)) => {
                warn!("history: requesters failed: {}", e);
            }
            HistoryEvent::Queued(title, Ok(ack)) => {
                let message = ack
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| format!("Queued {title}"));
                return vec![Action::success(message)];
            }
            HistoryEvent::Queued(_, Err(e)) => return vec![Action::error(e.user_message())],
        }
        Vec::new()
    }

    fn on_guild_changed(
        &mut self,
        guild: Option<&CurrentGuild>,
        surface: &mut Surface,
    ) -> Vec<Action> {
        if self.tasks.is_none() {
            return Vec::new();
        }
        info!(
            "history: guild changed to {}, resetting",
            guild.map(|g| g.name.as_str()).unwrap_or("none")
        );
        self.filters = HistoryFilters::default();
        self.search.clear();
        self.requesters.clear();
        self.load_requesters();
        self.reload(surface);
        Vec::new()
    }

    fn handle_key(&mut self, key: KeyEvent, surface: &mut Surface) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        if self.search.is_active() {
            match self.search.handle_key(key) {
                InputAction::Submitted(text) => {
                    let search = Some(text).filter(|t| !t.is_empty());
                    if search != self.filters.search {
                        self.filters.search = search;
                        self.reload(surface);
                    }
                }
                InputAction::Cancelled | InputAction::Changed(_) | InputAction::None => {}
            }
            return Vec::new();
        }

        match key.code {
            KeyCode::Char('/') => {
                self.search
                    .set_value(self.filters.search.as_deref().unwrap_or_default());
                self.search.activate();
            }
            KeyCode::Char('t') => {
                self.filters.cycle_source();
                self.reload(surface);
            }
            KeyCode::Char('T') => {
                self.filters.time_range = self.filters.time_range.next();
                self.reload(surface);
            }
            KeyCode::Char('u') => {
                if self.requesters.is_empty() {
                    return vec![Action::error("No requesters to filter by")];
                }
                self.filters.cycle_requester(&self.requesters);
                self.reload(surface);
            }
            KeyCode::Char('x') => {
                self.filters = HistoryFilters::default();
                self.search.clear();
                self.reload(surface);
            }
            KeyCode::Char('r') => self.reload(surface),
            KeyCode::Up | KeyCode::Char('k') => self.records.select_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.records.select_down(1),
            KeyCode::PageUp => self.records.select_up(self.viewport.max(1)),
            KeyCode::PageDown => self.records.select_down(self.viewport.max(1)),
            KeyCode::Home => self.records.select_first(),
            KeyCode::End => self.records.select_last(),
            KeyCode::Enter => return self.queue_selected(),
            KeyCode::Char('y') => {
                if let Some(record) = self.records.selected_item() {
                    return vec![Action::CopyToClipboard(record.uri.clone())];
                }
            }
            _ => {}
        }
        Vec::new()
    }

    /// The sentinel: request the next page once the last row is on screen.
    fn tick(&mut self, _surface: &mut Surface) -> Vec<Action> {
        if self.tasks.is_some() && !self.records.is_empty() && self.records.bottom_visible(self.viewport)
        {
            self.fetch_next();
        }
        Vec::new()
    }

    fn input_mode(&self) -> InputMode {
        if self.search.is_active() {
            InputMode::Input
        } else {
            InputMode::Normal
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, surface: &Surface) {
        let [filters, rest] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).areas(area);
        draw_slot(frame, filters, surface, FILTERS, false, None);
        if self.search.is_active() {
            let [list, prompt] =
                Layout::vertical([Constraint::Min(2), Constraint::Length(1)]).areas(rest);
            self.draw_list(frame, list, surface);
            self.search.draw(frame, prompt);
        } else {
            self.draw_list(frame, rest, surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pager_requests_exactly_three_pages_of_45() {
        let mut pager = Pager::new(20);
        let total = 45u64;
        let mut offsets = Vec::new();
        while let Some(offset) = pager.begin() {
            // A second begin while in flight is refused.
            assert_eq!(pager.begin(), None);
            offsets.push(offset);
            let received = (total - offset).min(pager.limit as u64) as usize;
            pager.finish(received, total);
        }
        assert_eq!(offsets, vec![0, 20, 40]);
        assert_eq!(pager.loaded, 45);
        assert!(!pager.has_more());
    }

    #[test]
    fn test_empty_page_ends_list() {
        let mut pager = Pager::new(20);
        pager.begin();
        pager.finish(0, 100);
        assert!(!pager.has_more());
        assert_eq!(pager.begin(), None);
    }

    #[test]
    fn test_failed_page_stalls_until_reset() {
        let mut pager = Pager::new(20);
        pager.begin();
        pager.fail();
        assert!(!pager.in_flight);
        assert_eq!(pager.begin(), None);
        pager.reset();
        assert_eq!(pager.begin(), Some(0));
    }

    #[test]
    fn test_filters_compose_into_query() {
        let filters = HistoryFilters {
            source: Some(SourceType::SoundCloud),
            time_range: TimeRange::Today,
            requester: Some(Requester {
                id: "11".into(),
                name: "reimu".into(),
            }),
            search: None,
        };
        let query = filters.query(20, 40, Some("9".into()));
        let params = query.params();
        assert!(params.contains(&("offset", "40".to_string())));
        assert!(params.contains(&("guildId", "9".to_string())));
        assert!(params.contains(&("type", "soundcloud".to_string())));
        assert!(params.contains(&("requester", "11".to_string())));
        assert!(params.contains(&("timeRange", "today".to_string())));
        assert!(!query.is_search());
    }

    #[test]
    fn test_cycles_wrap_to_all() {
        let mut filters = HistoryFilters::default();
        for _ in 0..SOURCE_CYCLE.len() {
            filters.cycle_source();
        }
        assert_eq!(filters.source, None);

        let requesters = vec![
            Requester {
                id: "1".into(),
                name: "a".into(),
            },
            Requester {
                id: "2".into(),
                name: "b".into(),
            },
        ];
        filters.cycle_requester(&requesters);
        assert_eq!(filters.requester.as_ref().map(|r| r.id.as_str()), Some("1"));
        filters.cycle_requester(&requesters);
        assert_eq!(filters.requester.as_ref().map(|r| r.id.as_str()), Some("2"));
        filters.cycle_requester(&requesters);
        assert_eq!(filters.requester, None);
    }

    #[tokio::test]
    async fn test_guild_change_resets_filters_before_next_fetch() {
        use std::sync::Arc;

        use tokio::sync::mpsc;

        use crate::guild::GuildSelector;
        use crate::session::SessionRegistry;
        use crate::surface::{Target, MAIN};

        let api = ApiClient::with_http(reqwest::Client::new(), "http://127.0.0.1:9");
        let (shared, _, _) = SharedState::new(Arc::new(GuildSelector::new(api.clone())));
        let mut view = HistoryView::new(api, shared, 20);
        let mut surface = Surface::new();
        surface
            .inject(
                &Target::Id(MAIN.into()),
                Markup::trusted(include_str!("../../templates/history.html")),
            )
            .unwrap();

        let (tx, _rx) = mpsc::unbounded_channel();
        let mut registry = SessionRegistry::default();
        let (id, token) = registry.begin(ViewName::History);
        view.init(ViewContext {
            surface: &mut surface,
            tasks: SessionTasks::new(id, token, tx),
        });
        assert!(view.pager.in_flight);

        // Two pages in, with every filter narrowed.
        view.pager.finish(20, 45);
        view.pager.begin();
        view.pager.finish(20, 45);
        view.filters.cycle_source();
        view.filters.time_range = TimeRange::Today;
        view.filters.requester = Some(Requester {
            id: "11".into(),
            name: "reimu".into(),
        });
        let generation = view.generation;

        view.on_guild_changed(None, &mut surface);

        assert_eq!(view.filters, HistoryFilters::default());
        assert_eq!(view.pager.loaded, 0);
        assert!(view.pager.in_flight);
        assert!(view.generation > generation);
        assert!(view.records.is_empty());
    }

    struct OpenHistory {
        view: HistoryView,
        surface: Surface,
        registry: crate::session::SessionRegistry,
        session: SessionId,
        _rx: tokio::sync::mpsc::UnboundedReceiver<crate::session::SessionMessage>,
    }

    /// A history view initialised on the bundled template, first page in flight.
    fn open_history() -> OpenHistory {
        use std::sync::Arc;

        use crate::guild::GuildSelector;
        use crate::session::SessionRegistry;
        use crate::surface::{Target, MAIN};

        let api = ApiClient::with_http(reqwest::Client::new(), "http://127.0.0.1:9");
        let (shared, _, _) = SharedState::new(Arc::new(GuildSelector::new(api.clone())));
        let mut view = HistoryView::new(api, shared, 2);
        let mut surface = Surface::new();
        surface
            .inject(
                &Target::Id(MAIN.into()),
                Markup::trusted(include_str!("../../templates/history.html")),
            )
            .unwrap();

        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let mut registry = SessionRegistry::default();
        let (session, token) = registry.begin(ViewName::History);
        view.init(ViewContext {
            surface: &mut surface,
            tasks: SessionTasks::new(session, token, tx),
        });
        OpenHistory {
            view,
            surface,
            registry,
            session,
            _rx: rx,
        }
    }

    fn page(titles: &[&str], total: u64) -> HistoryPage {
        HistoryPage {
            history: titles
                .iter()
                .map(|t| HistoryRecord {
                    title: t.to_string(),
                    ..Default::default()
                })
                .collect(),
            total,
        }
    }

    fn titles(view: &HistoryView) -> Vec<String> {
        view.records
            .visible_items(view.records.len())
            .into_iter()
            .map(|(_, r)| r.title.clone())
            .collect()
    }

    fn deliver(
        h: &mut OpenHistory,
        session: SessionId,
        generation: u64,
        result: Result<HistoryPage, ApiError>,
    ) -> Vec<Action> {
        let event = ViewEvent::History(HistoryEvent::Page { generation, result });
        h.view.on_event(session, event, &mut h.surface)
    }

    #[tokio::test]
    async fn test_stale_pages_leave_rows_alone() {
        let mut h = open_history();
        let (session, generation) = (h.session, h.view.generation);
        assert!(deliver(&mut h, session, generation, Ok(page(&["a", "b"], 5))).is_empty());
        assert_eq!(titles(&h.view), ["a", "b"]);

        // A page from before the last reset.
        deliver(&mut h, session, generation - 1, Ok(page(&["old"], 5)));
        assert_eq!(titles(&h.view), ["a", "b"]);
        assert_eq!(h.view.pager.loaded, 2);

        // A page addressed to an earlier session of the view.
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let (newer, token) = h.registry.begin(ViewName::History);
        h.view.init(ViewContext {
            surface: &mut h.surface,
            tasks: SessionTasks::new(newer, token, tx),
        });
        let generation = h.view.generation;
        deliver(&mut h, session, generation, Ok(page(&["ghost"], 5)));
        assert!(h.view.records.is_empty());
        assert!(h.view.pager.in_flight);
        assert_eq!(h.view.pager.loaded, 0);
    }

    #[tokio::test]
    async fn test_sentinel_page_appends_rows() {
        let mut h = open_history();
        let (session, generation) = (h.session, h.view.generation);
        deliver(&mut h, session, generation, Ok(page(&["a", "b"], 5)));
        assert!(!h.view.pager.in_flight);

        // The last row is on screen, so the next tick asks for more.
        h.view.viewport = 10;
        h.view.tick(&mut h.surface);
        assert!(h.view.pager.in_flight);

        deliver(&mut h, session, generation, Ok(page(&["c", "d"], 5)));
        assert_eq!(titles(&h.view), ["a", "b", "c", "d"]);
        assert_eq!(h.view.pager.loaded, 4);
        assert!(h.view.pager.has_more());
    }

    #[tokio::test]
    async fn test_cancelled_page_changes_nothing() {
        let mut h = open_history();
        let (session, generation) = (h.session, h.view.generation);
        deliver(&mut h, session, generation, Ok(page(&["a", "b"], 5)));
        h.view.viewport = 10;
        h.view.tick(&mut h.surface);
        let pager = h.view.pager.clone();
        assert!(pager.in_flight);

        let actions = deliver(&mut h, session, generation, Err(ApiError::Cancelled));
        assert!(actions.is_empty());
        assert_eq!(h.view.pager, pager);
        assert!(h.view.pager.has_more());
        assert!(h.view.error.is_none());
        assert_eq!(titles(&h.view), ["a", "b"]);
    }
}

//! App — the event loop of the panel.
//!
//! Architecture:
//! - `App` owns the router, the surface, the three views, the overlays and
//!   `AppState` (shared read-only data for components).
//! - Terminal input and template/component loads arrive as `AppMessage`s on
//!   a bounded mpsc channel.
//! - View work comes back as `SessionMessage`s; anything from a session that
//!   is no longer live is dropped before it reaches a view.
//! - Overlay work comes back as `OverlayEvent`s on its own channel.
//! - Views and overlays return `Vec<Action>`; `dispatch` applies them.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    widgets::{Block, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, trace, warn};

use panel_proto::client::{ApiClient, ApiError};
use panel_proto::config::Config;

use crate::{
    action::{parse_command, Action, OverlayId},
    app_state::{AppState, SharedState},
    component::Component,
    components::{
        bot_panel::BotPanel, console_panel::ConsolePanel, guild_picker::GuildPicker,
        help_overlay::HelpOverlay, OverlayEvent,
    },
    guild::{CurrentGuild, GuildSelector},
    loader::{source_from_config, ComponentLoader, Fragment, LoadError, LoadRequest},
    markup::render::to_lines,
    router::{Router, Transition, ViewName, ViewRegistry},
    session::{SessionMessage, SessionRegistry, SessionTasks},
    surface::{NavEntry, Surface, Target, MAIN},
    theme::C_BG,
    views::{
        channels::ChannelsView, error_markup, history::HistoryView, muted_markup,
        player::PlayerView, View, ViewContext,
    },
    widgets::{
        line_input::{InputAction, LineInput},
        status_bar::{self, InputMode, NavStatus},
        toast::ToastManager,
    },
};

/// Messages into the event loop from the input reader and load tasks.
#[derive(Debug)]
pub enum AppMessage {
    Event(Event),
    /// A view template fetched for the navigation holding `ticket`.
    Template {
        ticket: u64,
        view: ViewName,
        result: Result<Fragment, LoadError>,
    },
    /// A component fetched for an `Action::Load`.
    Fragment {
        request: LoadRequest,
        result: Result<Fragment, LoadError>,
    },
    /// Outcome of the startup guild refresh.
    GuildRefreshed(Result<Option<CurrentGuild>, ApiError>),
}

pub struct App {
    // ── Collaborators ────────────────────────────────────────────────────────
    loader: ComponentLoader,
    router: Router,
    sessions: SessionRegistry,
    surface: Surface,
    state: AppState,

    // ── Views ────────────────────────────────────────────────────────────────
    player: PlayerView,
    history: HistoryView,
    channels: ChannelsView,

    // ── Overlays ─────────────────────────────────────────────────────────────
    help: HelpOverlay,
    guild_picker: GuildPicker,
    bot_panel: BotPanel,
    console: ConsolePanel,

    // ── Chrome ───────────────────────────────────────────────────────────────
    toast: ToastManager,
    command_line: LineInput,

    // ── Channels ─────────────────────────────────────────────────────────────
    tx: mpsc::Sender<AppMessage>,
    rx: Option<mpsc::Receiver<AppMessage>>,
    session_tx: mpsc::UnboundedSender<SessionMessage>,
    session_rx: Option<mpsc::UnboundedReceiver<SessionMessage>>,
    overlay_rx: Option<mpsc::UnboundedReceiver<OverlayEvent>>,

    start_path: String,
    should_quit: bool,
}

impl App {
    pub fn new(config: &Config, api: ApiClient, log_path: PathBuf) -> Self {
        let selector = Arc::new(GuildSelector::new(api.clone()));
        let (shared, playback_feed, bot_feed) = SharedState::new(selector.clone());

        let (tx, rx) = mpsc::channel::<AppMessage>(1024);
        let (session_tx, session_rx) = mpsc::unbounded_channel();
        let (overlay_tx, overlay_rx) = mpsc::unbounded_channel();

        let router = Router::new(ViewRegistry::new());
        let mut surface = Surface::new();
        surface.set_nav(nav_entries(&router));

        Self {
            loader: ComponentLoader::new(source_from_config(&config.templates)),
            router,
            sessions: SessionRegistry::default(),
            surface,

            player: PlayerView::new(
                api.clone(),
                playback_feed,
                config.polling.status_interval(),
                config.polling.queue_interval(),
            ),
            history: HistoryView::new(api.clone(), shared.clone(), config.history.page_size),
            channels: ChannelsView::new(api.clone(), shared.clone(), config.channels.message_limit),

            help: HelpOverlay::new(),
            guild_picker: GuildPicker::new(api.clone(), selector, overlay_tx.clone()),
            bot_panel: BotPanel::new(api.clone(), bot_feed, overlay_tx.clone()),
            console: ConsolePanel::new(api, overlay_tx),

            toast: ToastManager::new(Duration::from_secs(config.ui.toast_secs.max(1))),
            command_line: LineInput::new(":", "go <path> · back · forward · quit"),

            state: AppState {
                shared,
                input_mode: InputMode::Normal,
                log_path,
            },

            tx,
            rx: Some(rx),
            session_tx,
            session_rx: Some(session_rx),
            overlay_rx: Some(overlay_rx),

            start_path: config.ui.start_path.clone(),
            should_quit: false,
        }
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let (Some(mut rx), Some(mut session_rx), Some(mut overlay_rx)) = (
            self.rx.take(),
            self.session_rx.take(),
            self.overlay_rx.take(),
        ) else {
            anyhow::bail!("event loop already ran");
        };

        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        // ── Background task: keyboard events ─────────────────────────────────
        let event_tx = self.tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: resolve the guild the bot is working on ─────────
        let guilds = self.state.shared.guilds.clone();
        let refresh_tx = self.tx.clone();
        tokio::spawn(async move {
            let result = guilds.refresh().await;
            let _ = refresh_tx.send(AppMessage::GuildRefreshed(result)).await;
        });

        let mut guild_rx = self.state.shared.guilds.subscribe();
        let mut ready_rx = self.loader.subscribe();

        let start = self.start_path.clone();
        if let Some(transition) = self.router.navigate_path(&start) {
            self.begin_transition(transition);
        }

        // ── Periodic timers ──────────────────────────────────────────────────
        // Toast expiry + spinner animation
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut needs_redraw = true;
        info!("botpanel event loop running");

        loop {
            if needs_redraw {
                self.sync_input_mode();
                terminal.draw(|f| self.draw(f))?;
                needs_redraw = false;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    needs_redraw = self.handle_message(msg).await;
                }

                Some(msg) = session_rx.recv() => {
                    if self.sessions.is_live(&msg.session) {
                        let SessionMessage { session, event } = msg;
                        let actions =
                            self.with_view(session.view, |v, s| v.on_event(session, event, s));
                        self.dispatch(actions);
                        needs_redraw = true;
                    } else {
                        trace!(
                            "dropped event of ended session {}#{}",
                            msg.session.view.as_str(),
                            msg.session.generation
                        );
                    }
                }

                Some(event) = overlay_rx.recv() => {
                    let target = event.target();
                    let actions = self.with_overlay(target, |o, s| o.on_event(event, s));
                    self.dispatch(actions);
                    needs_redraw = true;
                }

                Ok(()) = guild_rx.changed() => {
                    let guild = guild_rx.borrow_and_update().clone();
                    info!(
                        "managing guild {}",
                        guild.as_ref().map(|g| g.id.as_str()).unwrap_or("<none>")
                    );
                    if let Some(view) = self.router.active() {
                        let actions =
                            self.with_view(view, |v, s| v.on_guild_changed(guild.as_ref(), s));
                        self.dispatch(actions);
                    }
                    needs_redraw = true;
                }

                ready = ready_rx.recv() => {
                    match ready {
                        Ok(ready) => debug!("component {} ready in #{}", ready.name, ready.target),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("component-ready receiver lagged by {} messages", n);
                        }
                        Err(broadcast::error::RecvError::Closed) => {}
                    }
                }

                _ = toast_tick.tick() => {
                    self.toast.tick();
                    needs_redraw = true;
                }

                _ = ui_tick.tick() => {
                    let mut actions = Vec::new();
                    if let Some(view) = self.router.active() {
                        actions.extend(self.with_view(view, |v, s| v.tick(s)));
                    }
                    if let Some(id) = self.open_overlay() {
                        actions.extend(self.with_overlay(id, |o, s| o.tick(s)));
                    }
                    self.dispatch(actions);
                    needs_redraw = true;
                }
            }

            if self.should_quit {
                break;
            }
        }

        // ── Teardown ─────────────────────────────────────────────────────────
        info!("botpanel shutting down");
        self.sessions.cancel_all();
        for id in OVERLAYS {
            let _ = self.with_overlay(id, |o, s| o.set_open(false, s));
        }
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    // ── Component access ─────────────────────────────────────────────────────

    fn with_view<R>(
        &mut self,
        name: ViewName,
        f: impl FnOnce(&mut dyn View, &mut Surface) -> R,
    ) -> R {
        let surface = &mut self.surface;
        let view: &mut dyn View = match name {
            ViewName::Player => &mut self.player,
            ViewName::History => &mut self.history,
            ViewName::Channels => &mut self.channels,
        };
        f(view, surface)
    }

    fn view(&self, name: ViewName) -> &dyn View {
        match name {
            ViewName::Player => &self.player,
            ViewName::History => &self.history,
            ViewName::Channels => &self.channels,
        }
    }

    fn with_overlay<R>(
        &mut self,
        id: OverlayId,
        f: impl FnOnce(&mut dyn Component, &AppState) -> R,
    ) -> R {
        let state = &self.state;
        let overlay: &mut dyn Component = match id {
            OverlayId::Help => &mut self.help,
            OverlayId::Guilds => &mut self.guild_picker,
            OverlayId::Bot => &mut self.bot_panel,
            OverlayId::Console => &mut self.console,
        };
        f(overlay, state)
    }

    fn overlay(&self, id: OverlayId) -> &dyn Component {
        match id {
            OverlayId::Help => &self.help,
            OverlayId::Guilds => &self.guild_picker,
            OverlayId::Bot => &self.bot_panel,
            OverlayId::Console => &self.console,
        }
    }

    fn open_overlay(&self) -> Option<OverlayId> {
        OVERLAYS.into_iter().find(|id| self.overlay(*id).is_open())
    }

    fn sync_input_mode(&mut self) {
        self.state.input_mode = if self.command_line.is_active() {
            InputMode::Input
        } else if let Some(id) = self.open_overlay() {
            self.overlay(id).input_mode()
        } else {
            self.router
                .active()
                .map(|v| self.view(v).input_mode())
                .unwrap_or(InputMode::Normal)
        };
    }

    // ── Messages ─────────────────────────────────────────────────────────────

    /// Returns true when the frame needs redrawing.
    async fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                let actions = self.handle_key(key);
                self.dispatch(actions);
                true
            }
            AppMessage::Event(Event::Resize(..)) => true,
            AppMessage::Event(_) => false,
            AppMessage::Template {
                ticket,
                view,
                result,
            } => {
                self.on_template(ticket, view, result).await;
                true
            }
            AppMessage::Fragment { request, result } => {
                self.on_fragment(request, result).await;
                true
            }
            AppMessage::GuildRefreshed(Ok(Some(guild))) => {
                debug!("startup guild: {} ({})", guild.name, guild.id);
                false
            }
            AppMessage::GuildRefreshed(Ok(None)) => {
                self.toast.show("Pick a server with g", false);
                true
            }
            AppMessage::GuildRefreshed(Err(e)) => {
                warn!("guild refresh failed: {}", e);
                self.toast.error(e.user_message());
                true
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return Vec::new();
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return vec![Action::Quit];
        }

        if self.command_line.is_active() {
            return match self.command_line.handle_key(key) {
                InputAction::Submitted(line) => {
                    self.command_line.deactivate();
                    let line = line.trim().to_string();
                    if line.is_empty() {
                        Vec::new()
                    } else {
                        match parse_command(&line) {
                            Some(action) => vec![action],
                            None => vec![Action::error(format!("unknown command: {line}"))],
                        }
                    }
                }
                InputAction::Cancelled => {
                    self.command_line.deactivate();
                    Vec::new()
                }
                _ => Vec::new(),
            };
        }

        // An open overlay takes every key.
        if let Some(id) = self.open_overlay() {
            return self.with_overlay(id, |o, s| o.handle_key(key, s));
        }

        let active = self.router.active();
        let typing = active.is_some_and(|v| self.view(v).input_mode() == InputMode::Input);
        if typing {
            if let Some(view) = active {
                return self.with_view(view, |v, s| v.handle_key(key, s));
            }
        }

        match key.code {
            KeyCode::Char('q') => vec![Action::Quit],
            KeyCode::Char('?') => vec![Action::ToggleOverlay(OverlayId::Help)],
            KeyCode::Char('g') => vec![Action::ToggleOverlay(OverlayId::Guilds)],
            KeyCode::Char('b') => vec![Action::ToggleOverlay(OverlayId::Bot)],
            KeyCode::Char('c') => vec![Action::ToggleOverlay(OverlayId::Console)],
            KeyCode::Char(':') => vec![Action::OpenCommandLine],
            KeyCode::Char('1') => vec![Action::Navigate(ViewName::Player)],
            KeyCode::Char('2') => vec![Action::Navigate(ViewName::History)],
            KeyCode::Char('3') => vec![Action::Navigate(ViewName::Channels)],
            KeyCode::Char('[') => vec![Action::Back],
            KeyCode::Char(']') => vec![Action::Forward],
            _ => match active {
                Some(view) => self.with_view(view, |v, s| v.handle_key(key, s)),
                None => Vec::new(),
            },
        }
    }

    // ── Navigation ───────────────────────────────────────────────────────────

    /// Leave the current view and start fetching the template of the next.
    fn begin_transition(&mut self, transition: Transition) {
        if let Some(from) = transition.from {
            self.sessions.invalidate(from);
            self.with_view(from, |v, _| v.teardown());
        }

        let descriptor = self.router.registry().get(transition.to).clone();
        info!(
            "navigating to {} (ticket {})",
            descriptor.url_path, transition.ticket
        );
        let main = Target::Id(MAIN.to_string());
        if let Err(e) = self.surface.inject(
            &main,
            muted_markup(&format!("Loading {}…", descriptor.page_title)),
        ) {
            warn!("could not clear #{}: {}", MAIN, e);
        }

        let loader = self.loader.clone();
        let tx = self.tx.clone();
        let ticket = transition.ticket;
        let view = transition.to;
        tokio::spawn(async move {
            let result = loader.fetch(descriptor.template).await;
            let _ = tx.send(AppMessage::Template { ticket, view, result }).await;
        });
    }

    async fn on_template(
        &mut self,
        ticket: u64,
        view: ViewName,
        result: Result<Fragment, LoadError>,
    ) {
        if !self.router.is_current_ticket(ticket) {
            debug!("template of {} for stale ticket {} dropped", view.as_str(), ticket);
            return;
        }
        let descriptor = self.router.registry().get(view).clone();
        let main = Target::Id(MAIN.to_string());

        let injected =
            result.and_then(|fragment| self.loader.inject(&mut self.surface, &main, fragment));
        if let Err(e) = injected {
            error!("loading view {} failed: {}", view.as_str(), e);
            self.router.fail(ticket);
            // The previous view was torn down when the transition began.
            self.surface.clear_active_view();
            if let Err(e) = execute!(io::stdout(), SetTitle("botpanel")) {
                debug!("could not set terminal title: {}", e);
            }
            let message = format!("Could not load {}: {}", descriptor.page_title, e);
            if let Err(e) = self.surface.inject(&main, error_markup(&message)) {
                warn!("could not show load error: {}", e);
            }
            self.toast.error(message);
            return;
        }

        // Let the injected template settle before the view looks for its slots.
        tokio::task::yield_now().await;

        let (id, token) = self.sessions.begin(view);
        let tasks = SessionTasks::new(id, token, self.session_tx.clone());
        let mut actions = self.with_view(view, |v, surface| v.init(ViewContext { surface, tasks }));
        self.router.complete(ticket);
        self.surface.activate_nav(descriptor.nav_id);
        self.surface.set_title(descriptor.page_title);
        if let Err(e) = execute!(
            io::stdout(),
            SetTitle(format!("{} · botpanel", descriptor.page_title))
        ) {
            debug!("could not set terminal title: {}", e);
        }

        self.loader.announce(descriptor.template, MAIN);

        actions.push(Action::Load(LoadRequest::new(
            descriptor.keys_fragment,
            "#keys",
        )));
        self.dispatch(actions);
    }

    async fn on_fragment(&mut self, request: LoadRequest, result: Result<Fragment, LoadError>) {
        let fragment = match result {
            Ok(fragment) => fragment,
            Err(e) => {
                warn!("loading component {} failed: {}", request.name, e);
                self.toast.error(format!("Could not load {}", request.name));
                return;
            }
        };
        // The target may belong to a view the user already left.
        let id = match self
            .loader
            .inject(&mut self.surface, &request.target, fragment)
        {
            Ok(id) => id,
            Err(e) => {
                debug!("component {} not injected: {}", request.name, e);
                return;
            }
        };

        tokio::task::yield_now().await;

        if let Some(view) = request.after {
            if self.router.active() == Some(view) {
                let name = request.name.clone();
                let actions = self.with_view(view, |v, s| v.after_load(&name, s));
                self.dispatch(actions);
            }
        }
        self.loader.announce(&request.name, &id);
    }

    // ── Action dispatch ──────────────────────────────────────────────────────

    fn dispatch(&mut self, actions: impl IntoIterator<Item = Action>) {
        let mut queue: VecDeque<Action> = actions.into_iter().collect();
        while let Some(action) = queue.pop_front() {
            queue.extend(self.apply_action(action));
        }
    }

    /// Apply one action; returns follow-up actions from the components it
    /// touched.
    fn apply_action(&mut self, action: Action) -> Vec<Action> {
        debug!("apply_action: {:?}", action);
        match action {
            Action::Navigate(view) => {
                if let Some(transition) = self.router.navigate(view) {
                    self.begin_transition(transition);
                }
            }
            Action::NavigatePath(path) => {
                if let Some(transition) = self.router.navigate_path(&path) {
                    self.begin_transition(transition);
                }
            }
            Action::Back => match self.router.back() {
                Some(transition) => self.begin_transition(transition),
                None => debug!("nothing to go back to"),
            },
            Action::Forward => match self.router.forward() {
                Some(transition) => self.begin_transition(transition),
                None => debug!("nothing to go forward to"),
            },

            Action::Load(request) => {
                let loader = self.loader.clone();
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    let result = loader.fetch(&request.name).await;
                    let _ = tx.send(AppMessage::Fragment { request, result }).await;
                });
            }

            Action::Toast { message, success } => {
                if !message.is_empty() {
                    self.toast.show(message, success);
                }
            }
            Action::Spinner(message) => self.toast.spinner(message),
            Action::DismissSpinner => self.toast.dismiss_spinner(),

            Action::ToggleOverlay(id) => {
                let was_open = self.overlay(id).is_open();
                let mut follow = Vec::new();
                for other in OVERLAYS.into_iter().filter(|o| *o != id) {
                    if self.overlay(other).is_open() {
                        follow.extend(self.with_overlay(other, |o, s| o.set_open(false, s)));
                    }
                }
                follow.extend(self.with_overlay(id, |o, s| o.set_open(!was_open, s)));
                return follow;
            }
            Action::CloseOverlays => {
                let mut follow = Vec::new();
                for id in OVERLAYS {
                    if self.overlay(id).is_open() {
                        follow.extend(self.with_overlay(id, |o, s| o.set_open(false, s)));
                    }
                }
                return follow;
            }
            Action::OpenCommandLine => {
                self.command_line.clear();
                self.command_line.activate();
            }

            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => self.toast.success(format!("copied: {}", clipboard_preview(&text))),
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }
            Action::Quit => self.should_quit = true,
        }
        Vec::new()
    }

    // ── Drawing ──────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(C_BG)), area);

        // ── Outer layout: nav | separator | body | keys ──────────────────────
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        let bot_name = self.state.shared.bot().map(|b| b.username);
        let guild = self.state.shared.guild().map(|g| g.name);
        let now_playing = self.state.now_playing();
        status_bar::draw_nav_bar(
            frame,
            outer[0],
            &self.surface,
            NavStatus {
                bot_name: bot_name.as_deref(),
                guild: guild.as_deref(),
                now_playing: now_playing.as_deref(),
                connected: self.state.connected(),
            },
        );
        status_bar::draw_separator(frame, outer[1]);

        self.draw_body(frame, outer[2]);

        if self.command_line.is_active() {
            self.command_line.draw(frame, outer[3]);
        } else {
            status_bar::draw_keys_bar(frame, outer[3], self.state.input_mode, &self.surface);
        }

        // ── Overlays (on top of the view) ────────────────────────────────────
        self.help.draw(frame, area, &self.state);
        self.guild_picker.draw(frame, area, &self.state);
        self.bot_panel.draw(frame, area, &self.state);
        self.console.draw(frame, area, &self.state);

        // ── Toast notifications (topmost layer) ──────────────────────────────
        self.toast.draw(frame, area);
    }

    fn draw_body(&mut self, frame: &mut Frame, area: Rect) {
        match self.router.active() {
            Some(ViewName::Player) => self.player.draw(frame, area, &self.surface),
            Some(ViewName::History) => self.history.draw(frame, area, &self.surface),
            Some(ViewName::Channels) => self.channels.draw(frame, area, &self.surface),
            // Loading, or a failed load: whatever sits in #main.
            None => {
                if let Some(slot) = self.surface.slot(MAIN) {
                    frame.render_widget(
                        Paragraph::new(to_lines(&slot.markup)).wrap(Wrap { trim: false }),
                        area.inner(ratatui::layout::Margin::new(1, 1)),
                    );
                }
            }
        }
    }
}

const OVERLAYS: [OverlayId; 4] = [
    OverlayId::Help,
    OverlayId::Guilds,
    OverlayId::Bot,
    OverlayId::Console,
];

/// One nav entry per registered view, none active yet.
fn nav_entries(router: &Router) -> Vec<NavEntry> {
    router
        .registry()
        .views()
        .iter()
        .map(|v| NavEntry {
            element_id: v.nav_id.to_string(),
            path: v.url_path.to_string(),
            label: v.nav_label.to_string(),
            enabled: true,
            active: false,
        })
        .collect()
}

/// Clipboard text as shown in the confirmation toast.
fn clipboard_preview(text: &str) -> String {
    if text.chars().count() > 40 {
        format!("{}…", text.chars().take(40).collect::<String>())
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nav_entries_follow_registry_order() {
        let router = Router::new(ViewRegistry::new());
        let nav = nav_entries(&router);
        let labels: Vec<&str> = nav.iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, ["Player", "History", "Channels"]);
        assert_eq!(nav[1].path, "/history.html");
        assert!(nav.iter().all(|n| n.enabled && !n.active));
    }

    #[test]
    fn test_clipboard_preview_truncates_long_text() {
        assert_eq!(clipboard_preview("short"), "short");
        let long = "x".repeat(41);
        let preview = clipboard_preview(&long);
        assert_eq!(preview.chars().count(), 41);
        assert!(preview.ends_with('…'));
    }
}

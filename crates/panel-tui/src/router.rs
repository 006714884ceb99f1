//! View registry, navigation history and the view lifecycle state machine.
//!
//! ```text
//!   Idle ──begin──▶ Loading{view, ticket} ──complete(ticket)──▶ Active(view)
//!                        │                                         │
//!                        └──fail(ticket)──▶ Idle      begin ◀──────┘
//! ```
//!
//! Every transition hands out a fresh ticket.  A template result carrying an
//! older ticket belongs to a navigation the user already left and is
//! discarded.

use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ViewName {
    Player,
    History,
    Channels,
}

impl ViewName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::History => "history",
            Self::Channels => "channels",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewDescriptor {
    pub name: ViewName,
    /// Canonical path pushed to the history.
    pub url_path: &'static str,
    /// Template fragment injected into `#main`.
    pub template: &'static str,
    /// Fragment injected into `#keys`.
    pub keys_fragment: &'static str,
    pub page_title: &'static str,
    pub nav_id: &'static str,
    pub nav_label: &'static str,
}

pub struct ViewRegistry {
    views: Vec<ViewDescriptor>,
    default: ViewName,
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self {
            views: vec![
                ViewDescriptor {
                    name: ViewName::Player,
                    url_path: "/index.html",
                    template: "player",
                    keys_fragment: "player-keys",
                    page_title: "Music Player",
                    nav_id: "nav-player",
                    nav_label: "Player",
                },
                ViewDescriptor {
                    name: ViewName::History,
                    url_path: "/history.html",
                    template: "history",
                    keys_fragment: "history-keys",
                    page_title: "Playback History",
                    nav_id: "nav-history",
                    nav_label: "History",
                },
                ViewDescriptor {
                    name: ViewName::Channels,
                    url_path: "/channels.html",
                    template: "channels",
                    keys_fragment: "channels-keys",
                    page_title: "Channels",
                    nav_id: "nav-channels",
                    nav_label: "Channels",
                },
            ],
            default: ViewName::Player,
        }
    }

    pub fn get(&self, name: ViewName) -> &ViewDescriptor {
        self.views
            .iter()
            .find(|v| v.name == name)
            .unwrap_or(&self.views[0])
    }

    pub fn default_view(&self) -> ViewName {
        self.default
    }

    pub fn views(&self) -> &[ViewDescriptor] {
        &self.views
    }

    /// Map a path to a view.  `/` is an alias of the player page.
    pub fn lookup(&self, path: &str) -> Option<ViewName> {
        let path = path.trim();
        let path = path.split(['?', '#']).next().unwrap_or(path);
        if path.is_empty() || path == "/" {
            return Some(ViewName::Player);
        }
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        self.views
            .iter()
            .find(|v| v.url_path == path || v.url_path.trim_end_matches(".html") == path)
            .map(|v| v.name)
    }
}

// ── History ───────────────────────────────────────────────────────────────────

/// Back/forward stack of visited paths.
#[derive(Debug, Default)]
pub struct NavHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl NavHistory {
    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Push `path`, dropping any forward entries.
    pub fn push(&mut self, path: &str) {
        if self.current() == Some(path) {
            return;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(path.to_string());
        self.cursor = self.entries.len() - 1;
    }

    /// Replace the current entry without adding one.
    pub fn replace(&mut self, path: &str) {
        match self.entries.get_mut(self.cursor) {
            Some(entry) => *entry = path.to_string(),
            None => self.push(path),
        }
    }

    pub fn back(&mut self) -> Option<&str> {
        if self.cursor == 0 || self.entries.is_empty() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    pub fn forward(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }
}

// ── State machine ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterState {
    Idle,
    Loading { view: ViewName, ticket: u64 },
    Active(ViewName),
}

/// What the app has to do for a navigation: tear down `from` (if any),
/// fetch the template of `to` and hand the result back with `ticket`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Option<ViewName>,
    pub to: ViewName,
    pub ticket: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryOp {
    Push,
    Replace,
    Keep,
}

pub struct Router {
    registry: ViewRegistry,
    history: NavHistory,
    state: RouterState,
    next_ticket: u64,
}

impl Router {
    pub fn new(registry: ViewRegistry) -> Self {
        Self {
            registry,
            history: NavHistory::default(),
            state: RouterState::Idle,
            next_ticket: 0,
        }
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    /// The view whose template is on screen, or being loaded.
    pub fn current(&self) -> Option<ViewName> {
        match self.state {
            RouterState::Idle => None,
            RouterState::Loading { view, .. } | RouterState::Active(view) => Some(view),
        }
    }

    pub fn active(&self) -> Option<ViewName> {
        match self.state {
            RouterState::Active(view) => Some(view),
            _ => None,
        }
    }

    /// Navigate to `view`, pushing its path.  No-op when it is already
    /// active or loading.
    pub fn navigate(&mut self, view: ViewName) -> Option<Transition> {
        self.begin(view, HistoryOp::Push)
    }

    /// Navigate by path.  Unknown paths fall back to the default view and
    /// replace the current history entry.
    pub fn navigate_path(&mut self, path: &str) -> Option<Transition> {
        match self.registry.lookup(path) {
            Some(view) => self.begin(view, HistoryOp::Push),
            None => {
                info!("unknown path {:?}, showing default view", path);
                let view = self.registry.default_view();
                let transition = self.begin(view, HistoryOp::Replace);
                if transition.is_none() {
                    let url = self.registry.get(view).url_path;
                    self.history.replace(url);
                }
                transition
            }
        }
    }

    pub fn back(&mut self) -> Option<Transition> {
        let path = self.history.back()?.to_string();
        let view = self.registry.lookup(&path)?;
        self.begin(view, HistoryOp::Keep)
    }

    pub fn forward(&mut self) -> Option<Transition> {
        let path = self.history.forward()?.to_string();
        let view = self.registry.lookup(&path)?;
        self.begin(view, HistoryOp::Keep)
    }

    fn begin(&mut self, view: ViewName, op: HistoryOp) -> Option<Transition> {
        if self.current() == Some(view) {
            debug!("navigation to {} ignored: already current", view.as_str());
            return None;
        }
        let from = self.current();
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.state = RouterState::Loading { view, ticket };

        let url = self.registry.get(view).url_path;
        match op {
            HistoryOp::Push => self.history.push(url),
            HistoryOp::Replace => self.history.replace(url),
            HistoryOp::Keep => {}
        }
        debug!("router: loading {} (ticket {})", view.as_str(), ticket);
        Some(Transition {
            from,
            to: view,
            ticket,
        })
    }

    /// The template for `ticket` was injected.  Returns the now active view,
    /// or `None` when the ticket is stale.
    pub fn complete(&mut self, ticket: u64) -> Option<ViewName> {
        match self.state {
            RouterState::Loading { view, ticket: t } if t == ticket => {
                self.state = RouterState::Active(view);
                Some(view)
            }
            _ => {
                debug!("router: stale ticket {} discarded", ticket);
                None
            }
        }
    }

    /// The template for `ticket` could not be loaded.  Returns the view that
    /// failed when the ticket is current.
    pub fn fail(&mut self, ticket: u64) -> Option<ViewName> {
        match self.state {
            RouterState::Loading { view, ticket: t } if t == ticket => {
                self.state = RouterState::Idle;
                Some(view)
            }
            _ => None,
        }
    }

    pub fn is_current_ticket(&self, ticket: u64) -> bool {
        matches!(self.state, RouterState::Loading { ticket: t, .. } if t == ticket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> Router {
        Router::new(ViewRegistry::new())
    }

    #[test]
    fn test_root_and_index_are_player() {
        let registry = ViewRegistry::new();
        assert_eq!(registry.lookup("/"), Some(ViewName::Player));
        assert_eq!(registry.lookup("/index.html"), Some(ViewName::Player));
        assert_eq!(registry.lookup("history.html"), Some(ViewName::History));
        assert_eq!(registry.lookup("/channels"), Some(ViewName::Channels));
        assert_eq!(registry.lookup("/nope.html"), None);
    }

    #[test]
    fn test_navigate_loads_then_activates() {
        let mut r = router();
        let t = r.navigate(ViewName::History).unwrap();
        assert_eq!(t.from, None);
        assert_eq!(r.state, RouterState::Loading { view: ViewName::History, ticket: t.ticket });
        assert_eq!(r.complete(t.ticket), Some(ViewName::History));
        assert_eq!(r.active(), Some(ViewName::History));
        assert_eq!(r.history.current(), Some("/history.html"));
    }

    #[test]
    fn test_navigate_to_current_is_noop() {
        let mut r = router();
        let t = r.navigate(ViewName::Player).unwrap();
        assert!(r.navigate(ViewName::Player).is_none());
        r.complete(t.ticket);
        assert!(r.navigate(ViewName::Player).is_none());
        assert_eq!(r.history.entries.len(), 1);
    }

    #[test]
    fn test_stale_template_is_discarded() {
        let mut r = router();
        let first = r.navigate(ViewName::History).unwrap();
        let second = r.navigate(ViewName::Channels).unwrap();
        assert_eq!(second.from, Some(ViewName::History));
        assert_eq!(r.complete(first.ticket), None);
        assert_eq!(r.fail(first.ticket), None);
        assert_eq!(r.complete(second.ticket), Some(ViewName::Channels));
    }

    #[test]
    fn test_failed_load_returns_to_idle() {
        let mut r = router();
        let t = r.navigate(ViewName::Channels).unwrap();
        assert_eq!(r.fail(t.ticket), Some(ViewName::Channels));
        assert_eq!(r.state, RouterState::Idle);
        // The same view can be retried.
        assert!(r.navigate(ViewName::Channels).is_some());
    }

    #[test]
    fn test_unknown_path_replaces_history_entry() {
        let mut r = router();
        let t = r.navigate(ViewName::History).unwrap();
        r.complete(t.ticket);
        let t = r.navigate_path("/missing.html").unwrap();
        assert_eq!(t.to, ViewName::Player);
        assert_eq!(r.history.entries.len(), 1);
        assert_eq!(r.history.current(), Some("/index.html"));
    }

    #[test]
    fn test_back_and_forward() {
        let mut r = router();
        for view in [ViewName::Player, ViewName::History, ViewName::Channels] {
            let t = r.navigate(view).unwrap();
            r.complete(t.ticket);
        }
        let t = r.back().unwrap();
        assert_eq!(t.to, ViewName::History);
        r.complete(t.ticket);
        let t = r.back().unwrap();
        assert_eq!(t.to, ViewName::Player);
        r.complete(t.ticket);
        assert!(r.back().is_none());
        let t = r.forward().unwrap();
        assert_eq!(t.to, ViewName::History);
        r.complete(t.ticket);
        // A new navigation drops the forward entry.
        let t = r.navigate(ViewName::Player).unwrap();
        r.complete(t.ticket);
        assert!(r.forward().is_none());
        assert_eq!(r.history.entries.len(), 3);
    }
}

//! The panel's document: named slots, the nav bar and the window title.
//!
//! A slot is a region a fragment can be injected into.  Injecting markup
//! registers every element of the markup that carries an `id` as a child slot
//! (with its `class` and `title` attributes) and drops the slots the previous
//! content had registered.  Views look slots up by id and fill them; the
//! app draws them.

use std::collections::BTreeMap;
use std::fmt;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::markup::Markup;

/// Root slot fragments and view templates are injected into.
pub const MAIN: &str = "main";
/// Root slot holding the key hints of the current view.
pub const KEYS: &str = "keys";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SurfaceError {
    #[error("no single element matches {0}")]
    NotFound(String),
}

/// `#id`, `.class`, or a bare id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Id(String),
    Class(String),
}

impl Target {
    pub fn parse(s: &str) -> Self {
        if let Some(class) = s.strip_prefix('.') {
            Self::Class(class.to_string())
        } else {
            Self::Id(s.strip_prefix('#').unwrap_or(s).to_string())
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Class(class) => write!(f, ".{class}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Slot {
    pub id: String,
    pub classes: Vec<String>,
    pub title: Option<String>,
    pub parent: Option<String>,
    pub markup: Markup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavEntry {
    pub element_id: String,
    pub path: String,
    pub label: String,
    pub enabled: bool,
    pub active: bool,
}

#[derive(Debug)]
pub struct Surface {
    slots: BTreeMap<String, Slot>,
    nav: Vec<NavEntry>,
    title: String,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    pub fn new() -> Self {
        let mut slots = BTreeMap::new();
        for id in [MAIN, KEYS] {
            slots.insert(
                id.to_string(),
                Slot {
                    id: id.to_string(),
                    ..Default::default()
                },
            );
        }
        Self {
            slots,
            nav: Vec::new(),
            title: String::new(),
        }
    }

    /// The id of the one slot `target` names.
    pub fn resolve(&self, target: &Target) -> Result<String, SurfaceError> {
        match target {
            Target::Id(id) if self.slots.contains_key(id) => Ok(id.clone()),
            Target::Id(_) => Err(SurfaceError::NotFound(target.to_string())),
            Target::Class(class) => {
                let mut matches = self
                    .slots
                    .values()
                    .filter(|s| s.classes.iter().any(|c| c == class));
                match (matches.next(), matches.next()) {
                    (Some(slot), None) => Ok(slot.id.clone()),
                    _ => Err(SurfaceError::NotFound(target.to_string())),
                }
            }
        }
    }

    /// Replace the content of the slot `target` names with `markup`.
    /// Returns the slot id.
    pub fn inject(&mut self, target: &Target, markup: Markup) -> Result<String, SurfaceError> {
        let id = self.resolve(target)?;
        self.remove_descendants(&id);

        let children = scan_slots(&markup, &id);
        for child in children {
            if self.slots.contains_key(&child.id) {
                warn!("duplicate element id #{} ignored", child.id);
                continue;
            }
            self.slots.insert(child.id.clone(), child);
        }
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.markup = markup;
        }
        debug!("injected into #{}", id);
        Ok(id)
    }

    /// Set the content of a slot without scanning it for child slots.
    pub fn set(&mut self, id: &str, markup: Markup) -> Result<(), SurfaceError> {
        match self.slots.get_mut(id) {
            Some(slot) => {
                slot.markup = markup;
                Ok(())
            }
            None => Err(SurfaceError::NotFound(format!("#{id}"))),
        }
    }

    pub fn slot(&self, id: &str) -> Option<&Slot> {
        self.slots.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    fn remove_descendants(&mut self, id: &str) {
        let mut stack = vec![id.to_string()];
        while let Some(parent) = stack.pop() {
            let children: Vec<String> = self
                .slots
                .values()
                .filter(|s| s.parent.as_deref() == Some(parent.as_str()))
                .map(|s| s.id.clone())
                .collect();
            for child in children {
                self.slots.remove(&child);
                stack.push(child);
            }
        }
    }

    // ── Nav / title ───────────────────────────────────────────────────────────

    pub fn set_nav(&mut self, nav: Vec<NavEntry>) {
        self.nav = nav;
    }

    pub fn nav(&self) -> &[NavEntry] {
        &self.nav
    }

    /// Mark `element_id` active and disabled; every other entry becomes
    /// inactive and enabled again.
    pub fn activate_nav(&mut self, element_id: &str) {
        if !self.nav.iter().any(|n| n.element_id == element_id) {
            warn!("nav entry #{} not found", element_id);
        }
        for entry in &mut self.nav {
            entry.active = entry.element_id == element_id;
            entry.enabled = !entry.active;
        }
    }

    /// No view is on screen: every nav entry is selectable again and the
    /// title and key hints are emptied.
    pub fn clear_active_view(&mut self) {
        for entry in &mut self.nav {
            entry.active = false;
            entry.enabled = true;
        }
        self.title.clear();
        self.remove_descendants(KEYS);
        if let Some(slot) = self.slots.get_mut(KEYS) {
            slot.markup = Markup::new();
        }
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}

fn scan_slots(markup: &Markup, parent: &str) -> Vec<Slot> {
    let fragment = Html::parse_fragment(markup.as_str());
    let Ok(selector) = Selector::parse("[id]") else {
        return Vec::new();
    };
    fragment
        .select(&selector)
        .filter_map(|el| {
            let id = el.value().id()?.to_string();
            let parent = el
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find_map(|a| a.value().id().map(str::to_string))
                .unwrap_or_else(|| parent.to_string());
            Some(Slot {
                id,
                classes: el.value().classes().map(str::to_string).collect(),
                title: el.value().attr("title").map(str::to_string),
                parent: Some(parent),
                markup: Markup::new(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = r#"<section id="now-playing" class="card" title="Now Playing"></section>
<section id="queue" class="card list" title="Queue"><div id="queue-empty" class="muted"></div></section>"#;

    #[test]
    fn test_inject_registers_child_slots() {
        let mut surface = Surface::new();
        let id = surface
            .inject(&Target::parse("#main"), Markup::trusted(TEMPLATE))
            .unwrap();
        assert_eq!(id, "main");
        let queue = surface.slot("queue").unwrap();
        assert_eq!(queue.title.as_deref(), Some("Queue"));
        assert_eq!(queue.parent.as_deref(), Some("main"));
        assert_eq!(
            surface.slot("queue-empty").unwrap().parent.as_deref(),
            Some("queue")
        );
    }

    #[test]
    fn test_reinject_drops_previous_slots() {
        let mut surface = Surface::new();
        surface
            .inject(&Target::parse("main"), Markup::trusted(TEMPLATE))
            .unwrap();
        surface
            .inject(
                &Target::parse("main"),
                Markup::trusted(r#"<div id="channel-list"></div>"#),
            )
            .unwrap();
        assert!(!surface.contains("queue"));
        assert!(!surface.contains("queue-empty"));
        assert!(surface.contains("channel-list"));
        assert!(surface.contains(KEYS));
    }

    #[test]
    fn test_target_must_match_exactly_one() {
        let mut surface = Surface::new();
        surface
            .inject(&Target::parse("#main"), Markup::trusted(TEMPLATE))
            .unwrap();
        assert_eq!(
            surface.resolve(&Target::parse(".list")).unwrap(),
            "queue".to_string()
        );
        assert_eq!(
            surface.resolve(&Target::parse(".card")),
            Err(SurfaceError::NotFound(".card".into()))
        );
        assert_eq!(
            surface.inject(&Target::parse("#missing"), Markup::new()),
            Err(SurfaceError::NotFound("#missing".into()))
        );
    }

    #[test]
    fn test_activate_nav_is_exclusive() {
        let mut surface = Surface::new();
        let entry = |id: &str| NavEntry {
            element_id: id.into(),
            path: format!("/{id}"),
            label: id.into(),
            enabled: true,
            active: false,
        };
        surface.set_nav(vec![entry("nav-player"), entry("nav-history")]);
        surface.activate_nav("nav-history");
        surface.activate_nav("nav-player");
        let active: Vec<&str> = surface
            .nav()
            .iter()
            .filter(|n| n.active)
            .map(|n| n.element_id.as_str())
            .collect();
        assert_eq!(active, vec!["nav-player"]);
        assert!(!surface.nav()[0].enabled);
        assert!(surface.nav()[1].enabled);
    }

    #[test]
    fn test_clear_active_view_resets_nav_and_keys() {
        let mut surface = Surface::new();
        let entry = |id: &str| NavEntry {
            element_id: id.into(),
            path: format!("/{id}"),
            label: id.into(),
            enabled: true,
            active: false,
        };
        surface.set_nav(vec![entry("nav-player"), entry("nav-history")]);
        surface.activate_nav("nav-player");
        surface.set_title("Music Player");
        surface
            .inject(
                &Target::parse("#keys"),
                Markup::trusted(r#"<span id="player-keys">space pause</span>"#),
            )
            .unwrap();

        surface.clear_active_view();

        assert!(surface.nav().iter().all(|n| !n.active && n.enabled));
        assert_eq!(surface.title(), "");
        assert!(surface.slot(KEYS).unwrap().markup.is_empty());
        assert!(!surface.contains("player-keys"));
        assert!(surface.contains(MAIN));
    }
}

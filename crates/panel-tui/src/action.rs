//! Action enum — user intents and internal requests.
//!
//! Views and overlays never reach into the app: they return `Vec<Action>`
//! and the event loop applies them.

use crate::loader::LoadRequest;
use crate::router::ViewName;

/// Floating panels drawn above the active view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayId {
    Help,
    Guilds,
    Bot,
    Console,
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Navigation ───────────────────────────────────────────────────────────
    Navigate(ViewName),
    /// `:go <path>`; unknown paths fall back to the default view.
    NavigatePath(String),
    Back,
    Forward,

    // ── Components ───────────────────────────────────────────────────────────
    /// Fetch a fragment and inject it; the request's view gets its
    /// after-load hook called once it is in place.
    Load(LoadRequest),

    // ── Feedback ─────────────────────────────────────────────────────────────
    Toast { message: String, success: bool },
    Spinner(String),
    DismissSpinner,

    // ── Overlays ─────────────────────────────────────────────────────────────
    ToggleOverlay(OverlayId),
    CloseOverlays,
    OpenCommandLine,

    // ── System ───────────────────────────────────────────────────────────────
    CopyToClipboard(String),
    Quit,
}

impl Action {
    pub fn success(message: impl Into<String>) -> Self {
        Self::Toast {
            message: message.into(),
            success: true,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Toast {
            message: message.into(),
            success: false,
        }
    }
}

/// Parse a `:` command line.  `None` for anything unrecognised.
pub fn parse_command(line: &str) -> Option<Action> {
    let line = line.trim().trim_start_matches(':').trim();
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };
    match cmd {
        "go" | "open" if !arg.is_empty() => Some(Action::NavigatePath(arg.to_string())),
        "back" => Some(Action::Back),
        "forward" => Some(Action::Forward),
        "player" => Some(Action::Navigate(ViewName::Player)),
        "history" => Some(Action::Navigate(ViewName::History)),
        "channels" => Some(Action::Navigate(ViewName::Channels)),
        "q" | "quit" => Some(Action::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_go_takes_path() {
        match parse_command(":go /history.html") {
            Some(Action::NavigatePath(p)) => assert_eq!(p, "/history.html"),
            other => panic!("unexpected {other:?}"),
        }
        match parse_command("go  channels ") {
            Some(Action::NavigatePath(p)) => assert_eq!(p, "channels"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_and_bare_go() {
        assert!(parse_command("go").is_none());
        assert!(parse_command("reboot").is_none());
        assert!(matches!(parse_command("back"), Some(Action::Back)));
        assert!(matches!(
            parse_command("history"),
            Some(Action::Navigate(ViewName::History))
        ));
    }
}

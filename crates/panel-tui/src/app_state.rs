//! AppState — shared read-only data passed to views and overlays.
//!
//! The values that outlive a single view (selected guild, playback status,
//! bot profile) are `watch` channels with exactly one writer each:
//!
//! ```text
//!  guild     GuildSelector
//!  playback  player view   (PlaybackFeed)
//!  bot       bot panel     (BotFeed)
//! ```
//!
//! Everyone else holds a receiver through [`SharedState`].

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;

use panel_proto::protocol::{BotProfile, PlaybackStatus};

use crate::guild::{CurrentGuild, GuildSelector};
use crate::widgets::status_bar::InputMode;

/// Write side of the playback status.  Held by the player view only.
pub struct PlaybackFeed(watch::Sender<Option<PlaybackStatus>>);

impl PlaybackFeed {
    /// Publish a poll result; `None` means the bot could not be reached.
    pub fn publish(&self, status: Option<PlaybackStatus>) {
        self.0.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}

/// Write side of the bot profile.  Held by the bot panel only.
pub struct BotFeed(watch::Sender<Option<BotProfile>>);

impl BotFeed {
    pub fn publish(&self, profile: BotProfile) {
        self.0.send_replace(Some(profile));
    }
}

#[derive(Clone)]
pub struct SharedState {
    pub guilds: Arc<GuildSelector>,
    pub playback: watch::Receiver<Option<PlaybackStatus>>,
    pub bot: watch::Receiver<Option<BotProfile>>,
}

impl SharedState {
    /// Build the shared state around `guilds` and hand out the two writers.
    pub fn new(guilds: Arc<GuildSelector>) -> (Self, PlaybackFeed, BotFeed) {
        let (playback_tx, playback) = watch::channel(None);
        let (bot_tx, bot) = watch::channel(None);
        (
            Self {
                guilds,
                playback,
                bot,
            },
            PlaybackFeed(playback_tx),
            BotFeed(bot_tx),
        )
    }

    pub fn guild(&self) -> Option<CurrentGuild> {
        self.guilds.current()
    }

    pub fn guild_id(&self) -> Option<String> {
        self.guild().map(|g| g.id)
    }

    pub fn bot(&self) -> Option<BotProfile> {
        self.bot.borrow().clone()
    }
}

/// Components read this; only the app event loop writes to it.
pub struct AppState {
    pub shared: SharedState,
    pub input_mode: InputMode,
    pub log_path: PathBuf,
}

impl AppState {
    /// True while the last status poll reached the bot.
    pub fn connected(&self) -> bool {
        self.shared.playback.borrow().is_some()
    }

    /// Title of the track the bot is playing, if any.
    pub fn now_playing(&self) -> Option<String> {
        let status = self.shared.playback.borrow();
        let status = status.as_ref()?;
        if !status.playing {
            return None;
        }
        status.current_track.as_ref().map(|t| t.title.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_proto::client::ApiClient;
    use panel_proto::protocol::Track;

    fn shared() -> (SharedState, PlaybackFeed, BotFeed) {
        let api = ApiClient::with_http(reqwest::Client::new(), "http://127.0.0.1:9");
        SharedState::new(Arc::new(GuildSelector::new(api)))
    }

    #[test]
    fn test_playback_feed_skips_identical_status() {
        let (shared, feed, _) = shared();
        let mut rx = shared.playback.clone();
        let status = PlaybackStatus {
            playing: true,
            current_track: Some(Track {
                title: "Night of Nights".into(),
                ..Default::default()
            }),
            ..Default::default()
        };
        feed.publish(Some(status.clone()));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();
        feed.publish(Some(status));
        assert!(!rx.has_changed().unwrap());

        let state = AppState {
            shared,
            input_mode: InputMode::Normal,
            log_path: PathBuf::new(),
        };
        assert!(state.connected());
        assert_eq!(state.now_playing().as_deref(), Some("Night of Nights"));
        feed.publish(None);
        assert!(!state.connected());
    }

    #[test]
    fn test_bot_feed_reaches_readers() {
        let (shared, _, bot) = shared();
        assert!(shared.bot().is_none());
        bot.publish(BotProfile {
            username: "Mystia".into(),
            ..Default::default()
        });
        assert_eq!(shared.bot().unwrap().username, "Mystia");
    }
}

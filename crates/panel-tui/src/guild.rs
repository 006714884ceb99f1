//! The selected guild (Discord server).
//!
//! [`GuildSelector`] is the only writer of the current guild.  Views read it
//! through a `watch` receiver; the app forwards each change to the active
//! view's `on_guild_changed`.

use tokio::sync::watch;
use tracing::info;

use panel_proto::client::{ApiClient, ApiError};
use panel_proto::protocol::SelectedGuild;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurrentGuild {
    pub id: String,
    pub name: String,
}

impl CurrentGuild {
    fn from_selected(selected: SelectedGuild) -> Option<Self> {
        let id = selected.guild_id.filter(|id| !id.is_empty())?;
        let name = selected.guild_name.unwrap_or_else(|| id.clone());
        Some(Self { id, name })
    }
}

pub struct GuildSelector {
    api: ApiClient,
    tx: watch::Sender<Option<CurrentGuild>>,
}

impl GuildSelector {
    pub fn new(api: ApiClient) -> Self {
        let (tx, _) = watch::channel(None);
        Self { api, tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<CurrentGuild>> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> Option<CurrentGuild> {
        self.tx.borrow().clone()
    }

    /// Ask the backend which guild is selected.
    pub async fn refresh(&self) -> Result<Option<CurrentGuild>, ApiError> {
        let selected = self.api.selected_guild().await?;
        let guild = CurrentGuild::from_selected(selected);
        self.publish(guild.clone());
        Ok(guild)
    }

    /// Select `guild_id` on the backend and publish the result.
    pub async fn select(&self, guild_id: &str) -> Result<Option<CurrentGuild>, ApiError> {
        let selected = self.api.select_guild(guild_id).await?;
        let guild = CurrentGuild::from_selected(selected).or_else(|| {
            Some(CurrentGuild {
                id: guild_id.to_string(),
                name: guild_id.to_string(),
            })
        });
        self.publish(guild.clone());
        Ok(guild)
    }

    /// Publish `guild`; receivers only see a change when the id differs.
    fn publish(&self, guild: Option<CurrentGuild>) {
        self.tx.send_if_modified(|current| {
            let changed = current.as_ref().map(|g| &g.id) != guild.as_ref().map(|g| &g.id);
            if changed {
                info!(
                    "guild changed to {}",
                    guild.as_ref().map(|g| g.name.as_str()).unwrap_or("none")
                );
            }
            *current = guild;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_selection_is_none() {
        assert_eq!(
            CurrentGuild::from_selected(SelectedGuild {
                guild_id: Some(String::new()),
                guild_name: None
            }),
            None
        );
        assert_eq!(
            CurrentGuild::from_selected(SelectedGuild {
                guild_id: Some("7".into()),
                guild_name: None
            }),
            Some(CurrentGuild {
                id: "7".into(),
                name: "7".into()
            })
        );
    }

    #[test]
    fn test_publish_notifies_only_on_id_change() {
        let api = ApiClient::with_http(reqwest::Client::new(), "http://127.0.0.1:9");
        let selector = GuildSelector::new(api);
        let mut rx = selector.subscribe();

        let guild = |id: &str, name: &str| {
            Some(CurrentGuild {
                id: id.into(),
                name: name.into(),
            })
        };
        selector.publish(guild("1", "One"));
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        selector.publish(guild("1", "One renamed"));
        assert!(!rx.has_changed().unwrap());
        assert_eq!(selector.current().unwrap().name, "One renamed");

        selector.publish(None);
        assert!(rx.has_changed().unwrap());
    }
}

//! Wire types mirrored from the bot's REST API.
//!
//! Every response is a JSON object carrying `success` and, on failure, a
//! human-readable `message`.  Payload fields sit next to `success` in the same
//! object, so each type here deserializes from the whole response body and
//! ignores the envelope fields.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Extract the failure message of an envelope, if `success` is `false`.
///
/// A body without a `success` field is treated as successful.
pub fn envelope_failure(body: &serde_json::Value) -> Option<String> {
    match body.get("success").and_then(|v| v.as_bool()) {
        Some(false) => Some(
            body.get("message")
                .and_then(|m| m.as_str())
                .filter(|m| !m.is_empty())
                .unwrap_or("request failed")
                .to_string(),
        ),
        _ => None,
    }
}

// ── Playback ──────────────────────────────────────────────────────────────────

/// Where a playable track originated.  Drives artwork, metadata panel and
/// whether a duration is shown at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceType {
    YouTube,
    Spotify,
    SoundCloud,
    Radio,
    GensokyoRadio,
    LocalFile,
    #[default]
    Generic,
}

impl SourceType {
    /// Classify a track from the backend's source tag and its URI.
    ///
    /// Gensokyo Radio is recognised by its stream host even when the backend
    /// tags it as plain radio or http.
    pub fn classify(tag: Option<&str>, uri: &str) -> Self {
        let uri_lc = uri.to_ascii_lowercase();
        if uri_lc.contains("gensokyoradio.net") {
            return Self::GensokyoRadio;
        }
        let tag_lc = tag.map(|t| t.to_ascii_lowercase()).unwrap_or_default();
        match tag_lc.as_str() {
            "youtube" | "yt" => return Self::YouTube,
            "spotify" => return Self::Spotify,
            "soundcloud" => return Self::SoundCloud,
            "radio" | "stream" => return Self::Radio,
            "gensokyo" | "gensokyoradio" | "gensokyo_radio" => return Self::GensokyoRadio,
            "local" | "localfile" | "local_file" | "file" => return Self::LocalFile,
            _ => {}
        }
        if uri_lc.contains("youtube.com") || uri_lc.contains("youtu.be") {
            Self::YouTube
        } else if uri_lc.contains("spotify.com") || uri_lc.starts_with("spotify:") {
            Self::Spotify
        } else if uri_lc.contains("soundcloud.com") {
            Self::SoundCloud
        } else if uri_lc.starts_with("file:") || uri_lc.starts_with('/') {
            Self::LocalFile
        } else {
            Self::Generic
        }
    }

    /// Live sources show a LIVE indicator instead of a duration.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Radio | Self::GensokyoRadio)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::YouTube => "YouTube",
            Self::Spotify => "Spotify",
            Self::SoundCloud => "SoundCloud",
            Self::Radio => "Radio",
            Self::GensokyoRadio => "Gensokyo Radio",
            Self::LocalFile => "Local File",
            Self::Generic => "Track",
        }
    }

    /// Value of the history `type` filter that selects this source.
    pub fn filter_value(self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::Spotify => "spotify",
            Self::SoundCloud => "soundcloud",
            Self::Radio | Self::GensokyoRadio => "radio",
            Self::LocalFile => "local",
            Self::Generic => "other",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub uri: String,
    /// Duration in milliseconds; 0 when unknown.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub album: Option<String>,
    #[serde(default)]
    pub requester: Option<String>,
    #[serde(default)]
    pub is_stream: bool,
}

impl Track {
    pub fn source(&self) -> SourceType {
        let source = SourceType::classify(self.source_type.as_deref(), &self.uri);
        if self.is_stream && source == SourceType::Generic {
            SourceType::Radio
        } else {
            source
        }
    }
}

/// `GET /api/status`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    #[serde(default)]
    pub playing: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub current_track: Option<Track>,
    /// Position in milliseconds.
    #[serde(default)]
    pub position: u64,
    #[serde(default)]
    pub volume: Option<u32>,
    #[serde(default)]
    pub queue_size: usize,
    #[serde(default)]
    pub guild_id: Option<String>,
}

/// `GET /api/queue`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueueResponse {
    #[serde(default)]
    pub queue: Vec<Track>,
}

/// One row of the queue with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub index: usize,
    pub track: Track,
}

impl QueueResponse {
    pub fn into_entries(self) -> Vec<QueueEntry> {
        self.queue
            .into_iter()
            .enumerate()
            .map(|(index, track)| QueueEntry { index, track })
            .collect()
    }
}

// ── History ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub uri: String,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub requester_id: Option<String>,
    #[serde(default)]
    pub requester_name: Option<String>,
    #[serde(default)]
    pub guild_id: Option<String>,
    /// Epoch milliseconds.
    #[serde(default)]
    pub played_at: i64,
    #[serde(default)]
    pub duration: u64,
}

impl HistoryRecord {
    pub fn source(&self) -> SourceType {
        SourceType::classify(self.source_type.as_deref(), &self.uri)
    }

    pub fn played_at(&self) -> Option<DateTime<Utc>> {
        DateTime::<Utc>::from_timestamp_millis(self.played_at)
    }
}

/// `GET /api/history` and `GET /api/history/search`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub history: Vec<HistoryRecord>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requester {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// `GET /api/history/requesters`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequesterList {
    #[serde(default)]
    pub requesters: Vec<Requester>,
}

/// Time window of the history `timeRange` filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl TimeRange {
    pub fn as_param(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::All => Self::Today,
            Self::Today => Self::Week,
            Self::Week => Self::Month,
            Self::Month => Self::All,
        }
    }
}

/// Query of one history page.  `None`/`All` filters are left out of the URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryQuery {
    pub limit: u32,
    pub offset: u64,
    pub guild_id: Option<String>,
    pub source: Option<SourceType>,
    pub requester: Option<String>,
    pub time_range: TimeRange,
    /// Free-text search; switches the request to the search endpoint.
    pub search: Option<String>,
}

impl HistoryQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        if let Some(query) = self.search.as_deref().filter(|q| !q.trim().is_empty()) {
            params.push(("query", query.trim().to_string()));
        }
        if let Some(guild) = &self.guild_id {
            params.push(("guildId", guild.clone()));
        }
        if let Some(source) = self.source {
            params.push(("type", source.filter_value().to_string()));
        }
        if let Some(requester) = &self.requester {
            params.push(("requester", requester.clone()));
        }
        if self.time_range != TimeRange::All {
            params.push(("timeRange", self.time_range.as_param().to_string()));
        }
        params
    }

    pub fn is_search(&self) -> bool {
        self.search.as_deref().is_some_and(|q| !q.trim().is_empty())
    }
}

// ── Guilds ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guild {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub member_count: Option<u64>,
}

/// `GET /api/guilds`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuildList {
    #[serde(default)]
    pub guilds: Vec<Guild>,
}

/// `GET /api/guild/selected` and the reply of `POST /api/guild/select/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedGuild {
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub guild_name: Option<String>,
}

// ── Channels / messages ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    #[default]
    Text,
    Voice,
    Category,
    News,
    Stage,
    Forum,
    #[serde(other)]
    Other,
}

impl ChannelKind {
    /// Kinds whose messages can be read and written.
    pub fn is_textual(self) -> bool {
        matches!(self, Self::Text | Self::News)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: ChannelKind,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub topic: Option<String>,
}

/// `GET /api/servers/{id}/channels`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelList {
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// `GET /api/channels/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub channel: Channel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl Author {
    pub fn shown_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mention {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub content: String,
    pub author: Author,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub mentions: Vec<Mention>,
    #[serde(default)]
    pub role_mentions: Vec<Mention>,
    #[serde(default)]
    pub channel_mentions: Vec<Mention>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub edited_timestamp: Option<DateTime<Utc>>,
}

/// `GET /api/channels/{id}/messages`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageList {
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl MessageList {
    /// Oldest first, whatever order the backend used.
    pub fn into_chronological(mut self) -> Vec<Message> {
        self.messages
            .sort_by(|a, b| snowflake_cmp(&a.id, &b.id));
        self.messages
    }
}

/// `POST /api/channels/{id}/messages` reply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentMessage {
    #[serde(default)]
    pub message: Option<Message>,
}

/// Discord ids are decimal snowflakes; compare numerically without parsing.
pub fn snowflake_cmp(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

// ── Bot / console ─────────────────────────────────────────────────────────────

/// `GET /api/bot/info`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotProfile {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
    #[serde(default)]
    pub guild_count: u64,
    #[serde(default)]
    pub uptime_ms: Option<u64>,
}

/// `GET /api/console/logs`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsoleLogs {
    #[serde(default)]
    pub logs: Vec<String>,
}

/// `GET /api/console/config`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub config: BTreeMap<String, serde_json::Value>,
}

/// `POST /api/command/execute` reply
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandOutput {
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply of plain action endpoints (play, skip, setname, …).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

// ── Request bodies ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct QueueAddRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct NameRequest<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct UrlRequest<'a> {
    pub url: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContentRequest<'a> {
    pub content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommandRequest<'a> {
    pub command: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gensokyo_stream_is_live_regardless_of_tag() {
        let uri = "https://stream.gensokyoradio.net/1/";
        assert_eq!(SourceType::classify(Some("http"), uri), SourceType::GensokyoRadio);
        assert_eq!(SourceType::classify(None, uri), SourceType::GensokyoRadio);
        assert!(SourceType::GensokyoRadio.is_live());
        assert!(SourceType::Radio.is_live());
        assert!(!SourceType::YouTube.is_live());
    }

    #[test]
    fn test_classify_falls_back_to_uri() {
        assert_eq!(
            SourceType::classify(None, "https://youtu.be/dQw4w9WgXcQ"),
            SourceType::YouTube
        );
        assert_eq!(
            SourceType::classify(Some("SPOTIFY"), "https://example.com"),
            SourceType::Spotify
        );
        assert_eq!(
            SourceType::classify(None, "https://example.com/a.mp3"),
            SourceType::Generic
        );
    }

    #[test]
    fn test_stream_track_without_tag_is_radio() {
        let track = Track {
            uri: "http://icecast.example.org/live".into(),
            is_stream: true,
            ..Default::default()
        };
        assert_eq!(track.source(), SourceType::Radio);
    }

    #[test]
    fn test_envelope_failure() {
        let ok = serde_json::json!({"success": true, "queue": []});
        let missing = serde_json::json!({"queue": []});
        let failed = serde_json::json!({"success": false, "message": "Not in a voice channel"});
        let bare = serde_json::json!({"success": false});
        assert_eq!(envelope_failure(&ok), None);
        assert_eq!(envelope_failure(&missing), None);
        assert_eq!(envelope_failure(&failed).as_deref(), Some("Not in a voice channel"));
        assert_eq!(envelope_failure(&bare).as_deref(), Some("request failed"));
    }

    #[test]
    fn test_history_query_params_skip_all_filters() {
        let query = HistoryQuery {
            limit: 20,
            offset: 40,
            guild_id: Some("42".into()),
            ..Default::default()
        };
        let params = query.params();
        assert_eq!(
            params,
            vec![
                ("limit", "20".to_string()),
                ("offset", "40".to_string()),
                ("guildId", "42".to_string()),
            ]
        );
        assert!(!query.is_search());
    }

    #[test]
    fn test_history_query_params_compose() {
        let query = HistoryQuery {
            limit: 20,
            offset: 0,
            guild_id: None,
            source: Some(SourceType::GensokyoRadio),
            requester: Some("7".into()),
            time_range: TimeRange::Week,
            search: Some("  touhou ".into()),
        };
        let params = query.params();
        assert!(params.contains(&("query", "touhou".to_string())));
        assert!(params.contains(&("type", "radio".to_string())));
        assert!(params.contains(&("requester", "7".to_string())));
        assert!(params.contains(&("timeRange", "week".to_string())));
        assert!(query.is_search());
    }

    #[test]
    fn test_messages_sorted_oldest_first() {
        let body = serde_json::json!({
            "success": true,
            "messages": [
                {"id": "1000000000000000002", "content": "b", "author": {"id": "1"}, "timestamp": "2024-05-01T10:00:01Z"},
                {"id": "999999999999999999", "content": "a", "author": {"id": "1"}, "timestamp": "2024-05-01T10:00:00Z"},
            ]
        });
        let list: MessageList = serde_json::from_value(body).unwrap();
        let ordered = list.into_chronological();
        assert_eq!(ordered[0].content, "a");
        assert_eq!(ordered[1].content, "b");
    }

    #[test]
    fn test_unknown_channel_kind_is_other() {
        let channel: Channel =
            serde_json::from_value(serde_json::json!({"id": "5", "type": "thread"})).unwrap();
        assert_eq!(channel.kind, ChannelKind::Other);
        assert!(!channel.kind.is_textual());
    }
}

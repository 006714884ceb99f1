//! HTTP client for the bot's REST API.
//!
//! [`ApiClient`] maps every endpoint the panel uses to one method and sorts
//! failures into the four kinds the views care about: transport failures,
//! HTTP error statuses, application-level rejections (`success: false`) and
//! cancellation.  Cancellation is applied from the outside with
//! [`with_cancel`], so any request can be bound to a view session's token.

use std::future::Future;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::BackendConfig;
use crate::protocol::{
    envelope_failure, Ack, BotProfile, ChannelInfo, ChannelList, CommandOutput, CommandRequest,
    ConsoleConfig, ConsoleLogs, ContentRequest, GuildList, HistoryPage, HistoryQuery,
    MessageList, NameRequest, PlaybackStatus, QueueAddRequest, QueueResponse, RequesterList,
    SelectedGuild, SentMessage, UrlRequest,
};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never completed (connection refused, timeout, reset).
    #[error("network error: {0}")]
    Transport(#[source] reqwest::Error),
    /// The backend answered with an HTTP error status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },
    /// `success: false` in an otherwise successful reply.
    #[error("{0}")]
    Rejected(String),
    #[error("invalid response: {0}")]
    Decode(String),
    /// The owning view session ended before the reply arrived.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Only transport failures are worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Text suitable for a toast or an inline error line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => "Could not reach the bot".to_string(),
            Self::Status { status, message } if message.is_empty() => {
                format!("Request failed ({status})")
            }
            Self::Status { message, .. } => message.clone(),
            Self::Rejected(message) => message.clone(),
            Self::Decode(_) => "Unexpected reply from the bot".to_string(),
            Self::Cancelled => String::new(),
        }
    }
}

/// Run `fut` until it finishes or `token` is cancelled.
///
/// The request future is dropped on cancellation, which aborts the HTTP
/// request, and the caller gets [`ApiError::Cancelled`].
pub async fn with_cancel<T, F>(token: &CancellationToken, fut: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ApiError::Cancelled),
        res = fut => res,
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("botpanel/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .map_err(ApiError::Transport)?;
        Ok(Self::with_http(http, &config.base_url))
    }

    pub fn with_http(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ── Playback ──────────────────────────────────────────────────────────────

    pub async fn status(&self) -> Result<PlaybackStatus, ApiError> {
        self.get("/api/status", &[]).await
    }

    pub async fn queue(&self) -> Result<QueueResponse, ApiError> {
        self.get("/api/queue", &[]).await
    }

    pub async fn play(&self) -> Result<Ack, ApiError> {
        self.post("/api/play", &[], None::<&()>).await
    }

    pub async fn pause(&self) -> Result<Ack, ApiError> {
        self.post("/api/pause", &[], None::<&()>).await
    }

    pub async fn skip(&self) -> Result<Ack, ApiError> {
        self.post("/api/skip", &[], None::<&()>).await
    }

    pub async fn stop(&self) -> Result<Ack, ApiError> {
        self.post("/api/stop", &[], None::<&()>).await
    }

    /// Seek to `position_ms`.
    pub async fn seek(&self, position_ms: u64) -> Result<Ack, ApiError> {
        self.post("/api/seek", &[("position", position_ms.to_string())], None::<&()>)
            .await
    }

    pub async fn queue_add(&self, query: &str) -> Result<Ack, ApiError> {
        self.post("/api/queue/add", &[], Some(&QueueAddRequest { query }))
            .await
    }

    pub async fn queue_play_next(&self, query: &str) -> Result<Ack, ApiError> {
        self.post("/api/queue/playnext", &[], Some(&QueueAddRequest { query }))
            .await
    }

    pub async fn queue_remove(&self, index: usize) -> Result<Ack, ApiError> {
        self.send(Method::DELETE, &format!("/api/queue/{index}"), &[], None::<&()>)
            .await
    }

    pub async fn queue_move(&self, from: usize, to: usize) -> Result<Ack, ApiError> {
        self.post(
            "/api/queue/move",
            &[("from", from.to_string()), ("to", to.to_string())],
            None::<&()>,
        )
        .await
    }

    // ── History ───────────────────────────────────────────────────────────────

    /// One history page; a non-empty `search` switches to the search endpoint.
    pub async fn history(&self, query: &HistoryQuery) -> Result<HistoryPage, ApiError> {
        let path = if query.is_search() {
            "/api/history/search"
        } else {
            "/api/history"
        };
        self.get(path, &query.params()).await
    }

    pub async fn history_requesters(
        &self,
        guild_id: Option<&str>,
    ) -> Result<RequesterList, ApiError> {
        let params: Vec<(&str, String)> = guild_id
            .map(|g| vec![("guildId", g.to_string())])
            .unwrap_or_default();
        self.get("/api/history/requesters", &params).await
    }

    // ── Guilds ────────────────────────────────────────────────────────────────

    pub async fn guilds(&self) -> Result<GuildList, ApiError> {
        self.get("/api/guilds", &[]).await
    }

    pub async fn selected_guild(&self) -> Result<SelectedGuild, ApiError> {
        self.get("/api/guild/selected", &[]).await
    }

    pub async fn select_guild(&self, guild_id: &str) -> Result<SelectedGuild, ApiError> {
        self.post(&format!("/api/guild/select/{guild_id}"), &[], None::<&()>)
            .await
    }

    // ── Channels ──────────────────────────────────────────────────────────────

    pub async fn channels(&self, guild_id: &str) -> Result<ChannelList, ApiError> {
        self.get(&format!("/api/servers/{guild_id}/channels"), &[])
            .await
    }

    pub async fn channel(&self, channel_id: &str) -> Result<ChannelInfo, ApiError> {
        self.get(&format!("/api/channels/{channel_id}"), &[]).await
    }

    pub async fn messages(
        &self,
        channel_id: &str,
        limit: u32,
        before: Option<&str>,
    ) -> Result<MessageList, ApiError> {
        let mut params = vec![("limit", limit.to_string())];
        if let Some(before) = before {
            params.push(("before", before.to_string()));
        }
        self.get(&format!("/api/channels/{channel_id}/messages"), &params)
            .await
    }

    pub async fn send_message(
        &self,
        channel_id: &str,
        content: &str,
    ) -> Result<SentMessage, ApiError> {
        self.post(
            &format!("/api/channels/{channel_id}/messages"),
            &[],
            Some(&ContentRequest { content }),
        )
        .await
    }

    // ── Bot ───────────────────────────────────────────────────────────────────

    pub async fn bot_info(&self) -> Result<BotProfile, ApiError> {
        self.get("/api/bot/info", &[]).await
    }

    pub async fn set_name(&self, name: &str) -> Result<Ack, ApiError> {
        self.post("/api/bot/setname", &[], Some(&NameRequest { name }))
            .await
    }

    pub async fn set_avatar(&self, url: &str) -> Result<Ack, ApiError> {
        self.post("/api/bot/setavatar", &[], Some(&UrlRequest { url }))
            .await
    }

    pub async fn set_banner(&self, url: &str) -> Result<Ack, ApiError> {
        self.post("/api/bot/setbanner", &[], Some(&UrlRequest { url }))
            .await
    }

    pub async fn reboot(&self) -> Result<Ack, ApiError> {
        self.post("/api/reboot", &[], None::<&()>).await
    }

    /// Liveness probe: true when `/api/status` answers at all.
    pub async fn is_alive(&self) -> bool {
        self.status().await.is_ok()
    }

    pub async fn execute_command(&self, command: &str) -> Result<CommandOutput, ApiError> {
        self.post("/api/command/execute", &[], Some(&CommandRequest { command }))
            .await
    }

    // ── Console ───────────────────────────────────────────────────────────────

    pub async fn console_logs(&self) -> Result<ConsoleLogs, ApiError> {
        self.get("/api/console/logs", &[]).await
    }

    pub async fn console_config(&self) -> Result<ConsoleConfig, ApiError> {
        self.get("/api/console/config", &[]).await
    }

    pub async fn save_console_config(&self, config: &ConsoleConfig) -> Result<Ack, ApiError> {
        self.post("/api/console/config", &[], Some(config)).await
    }

    // ── Plumbing ──────────────────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.send(Method::GET, path, query, None::<&()>).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        self.send(Method::POST, path, query, body).await
    }

    async fn send<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        trace!("{} {}", method, url);
        let mut request = self.http.request(method.clone(), &url).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(ApiError::Transport)?;
        let status = response.status();
        let text = response.text().await.map_err(ApiError::Transport)?;
        debug!("{} {} -> {}", method, path, status);
        decode_reply(status, &text)
    }
}

/// Sort a reply into payload, HTTP failure or application failure.
fn decode_reply<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<T, ApiError> {
    let body: Option<serde_json::Value> = serde_json::from_str(text).ok();

    if !status.is_success() {
        let message = body
            .as_ref()
            .and_then(|b| b.get("message"))
            .and_then(|m| m.as_str())
            .unwrap_or_default()
            .to_string();
        return Err(ApiError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let body = body.ok_or_else(|| ApiError::Decode("body is not JSON".to_string()))?;
    if let Some(message) = envelope_failure(&body) {
        return Err(ApiError::Rejected(message));
    }
    serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PlaybackStatus;

    #[test]
    fn test_decode_http_error_keeps_backend_message() {
        let err = decode_reply::<Ack>(
            StatusCode::FORBIDDEN,
            r#"{"success":false,"message":"Missing permission"}"#,
        )
        .unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Missing permission");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_decode_http_error_without_body() {
        let err = decode_reply::<Ack>(StatusCode::BAD_GATEWAY, "<html>").unwrap_err();
        assert_eq!(err.user_message(), "Request failed (502)");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_decode_rejection() {
        let err = decode_reply::<Ack>(
            StatusCode::OK,
            r#"{"success":false,"message":"Queue is empty"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "Queue is empty"));
    }

    #[test]
    fn test_decode_payload_next_to_envelope() {
        let status: PlaybackStatus = decode_reply(
            StatusCode::OK,
            r#"{"success":true,"playing":true,"position":1500,"currentTrack":{"title":"Song","uri":"u","duration":3000}}"#,
        )
        .unwrap();
        assert!(status.playing);
        assert_eq!(status.position, 1500);
        assert_eq!(status.current_track.unwrap().duration, 3000);
    }

    #[tokio::test]
    async fn test_with_cancel_returns_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let res: Result<(), ApiError> =
            with_cancel(&token, std::future::pending::<Result<(), ApiError>>()).await;
        assert!(res.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_cancelled_has_no_user_message() {
        assert!(ApiError::Cancelled.user_message().is_empty());
    }
}

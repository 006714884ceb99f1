//! Client behaviour against a mock bot backend.
//!
//! Run with: cargo test -p panel-proto --test api_client

mod common;

use common::mock_bot::{self, HISTORY_TOTAL};
use panel_proto::client::{with_cancel, ApiClient, ApiError};
use panel_proto::config::BackendConfig;
use panel_proto::protocol::{HistoryQuery, SourceType};
use tokio_util::sync::CancellationToken;

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(&BackendConfig {
        base_url: base_url.to_string(),
        request_timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn status_decodes_current_track() {
    let (url, _) = mock_bot::start().await;
    let status = client(&url).status().await.unwrap();
    assert!(status.playing);
    let track = status.current_track.unwrap();
    assert_eq!(track.source(), SourceType::YouTube);
    assert_eq!(track.duration, 219_000);
}

#[tokio::test]
async fn history_pages_until_total() {
    let (url, state) = mock_bot::start().await;
    let api = client(&url);

    let mut loaded = 0u64;
    let mut pages = 0;
    loop {
        let page = api
            .history(&HistoryQuery {
                limit: 20,
                offset: loaded,
                ..Default::default()
            })
            .await
            .unwrap();
        pages += 1;
        loaded += page.history.len() as u64;
        if loaded >= page.total {
            break;
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(loaded, HISTORY_TOTAL);
    let offsets: Vec<String> = state
        .lock()
        .unwrap()
        .history_requests
        .iter()
        .map(|p| p["offset"].clone())
        .collect();
    assert_eq!(offsets, vec!["0", "20", "40"]);
}

#[tokio::test]
async fn search_goes_to_search_endpoint_with_filters() {
    let (url, state) = mock_bot::start().await;
    let query = HistoryQuery {
        limit: 20,
        search: Some("apple".into()),
        requester: Some("99".into()),
        ..Default::default()
    };
    client(&url).history(&query).await.unwrap();
    let requests = &state.lock().unwrap().history_requests;
    assert_eq!(requests[0]["query"], "apple");
    assert_eq!(requests[0]["requester"], "99");
}

#[tokio::test]
async fn queue_mutations_round_trip() {
    let (url, _) = mock_bot::start().await;
    let api = client(&url);

    api.queue_add("fourth").await.unwrap();
    api.queue_move(3, 0).await.unwrap();
    api.queue_remove(1).await.unwrap();

    let titles: Vec<String> = api
        .queue()
        .await
        .unwrap()
        .into_entries()
        .into_iter()
        .map(|e| e.track.title)
        .collect();
    assert_eq!(titles, vec!["fourth", "second", "third"]);
}

#[tokio::test]
async fn application_failure_is_rejected() {
    let (url, _) = mock_bot::start().await;
    let err = client(&url).queue_remove(17).await.unwrap_err();
    assert!(matches!(err, ApiError::Rejected(ref m) if m == "No such entry"));
    assert_eq!(err.user_message(), "No such entry");
}

#[tokio::test]
async fn http_status_failure_is_not_transient() {
    let (url, _) = mock_bot::start().await;
    let err = client(&url).reboot().await.unwrap_err();
    match &err {
        ApiError::Status { status, message } => {
            assert_eq!(*status, 403);
            assert_eq!(message, "Reboot is disabled");
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!err.is_transient());
}

#[tokio::test]
async fn unreachable_backend_is_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}")).status().await.unwrap_err();
    assert!(err.is_transient());
    assert_eq!(err.user_message(), "Could not reach the bot");
}

#[tokio::test]
async fn select_guild_updates_backend() {
    let (url, state) = mock_bot::start().await;
    let selected = client(&url).select_guild("1234").await.unwrap();
    assert_eq!(selected.guild_id.as_deref(), Some("1234"));
    assert_eq!(state.lock().unwrap().selected_guild.as_deref(), Some("1234"));
}

#[tokio::test]
async fn cancelled_request_reports_cancellation() {
    let (url, _) = mock_bot::start().await;
    let api = client(&url);
    let token = CancellationToken::new();
    token.cancel();
    let err = with_cancel(&token, api.status()).await.unwrap_err();
    assert!(err.is_cancelled());
}

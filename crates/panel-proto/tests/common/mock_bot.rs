//! Stateful mock of the bot backend used by the client integration tests.
//!
//! Serves a fixed history of `HISTORY_TOTAL` records, a small queue that
//! honours add/remove/move, and a guild selection.  Everything is kept in
//! one `Mutex` because the tests only ever run a handful of requests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const HISTORY_TOTAL: u64 = 45;

#[derive(Default)]
pub struct MockState {
    pub queue: Vec<String>,
    pub selected_guild: Option<String>,
    pub history_requests: Vec<HashMap<String, String>>,
}

pub type Shared = Arc<Mutex<MockState>>;

/// Start the mock on an ephemeral port; returns its base URL and state.
pub async fn start() -> (String, Shared) {
    let state: Shared = Arc::new(Mutex::new(MockState {
        queue: vec!["first".into(), "second".into(), "third".into()],
        ..Default::default()
    }));

    let app = Router::new()
        .route("/api/status", get(status))
        .route("/api/queue", get(queue))
        .route("/api/queue/add", post(queue_add))
        .route("/api/queue/move", post(queue_move))
        .route("/api/queue/:index", delete(queue_remove))
        .route("/api/skip", post(skip))
        .route("/api/history", get(history))
        .route("/api/history/search", get(history))
        .route("/api/guild/select/:id", post(select_guild))
        .route("/api/reboot", post(forbidden))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), state)
}

async fn status() -> Json<Value> {
    Json(json!({
        "success": true,
        "playing": true,
        "paused": false,
        "position": 61000,
        "currentTrack": {
            "title": "Bad Apple!!",
            "author": "Alstroemeria Records",
            "uri": "https://www.youtube.com/watch?v=FtutLA63Cp8",
            "duration": 219000,
            "sourceType": "youtube"
        }
    }))
}

async fn queue(State(state): State<Shared>) -> Json<Value> {
    let queue = state.lock().unwrap().queue.clone();
    let tracks: Vec<Value> = queue
        .iter()
        .map(|t| json!({"title": t, "uri": format!("https://example.com/{t}"), "duration": 1000}))
        .collect();
    Json(json!({"success": true, "queue": tracks}))
}

async fn queue_add(State(state): State<Shared>, Json(body): Json<Value>) -> Json<Value> {
    let query = body["query"].as_str().unwrap_or_default().to_string();
    if query.is_empty() {
        return Json(json!({"success": false, "message": "Nothing to add"}));
    }
    state.lock().unwrap().queue.push(query);
    Json(json!({"success": true, "message": "Added"}))
}

async fn queue_move(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let from: usize = params["from"].parse().unwrap();
    let to: usize = params["to"].parse().unwrap();
    let mut st = state.lock().unwrap();
    let item = st.queue.remove(from);
    st.queue.insert(to, item);
    Json(json!({"success": true}))
}

async fn queue_remove(State(state): State<Shared>, Path(index): Path<usize>) -> Json<Value> {
    let mut st = state.lock().unwrap();
    if index >= st.queue.len() {
        return Json(json!({"success": false, "message": "No such entry"}));
    }
    st.queue.remove(index);
    Json(json!({"success": true}))
}

async fn skip() -> Json<Value> {
    Json(json!({"success": true, "message": "Skipped"}))
}

async fn history(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.lock().unwrap().history_requests.push(params.clone());
    let limit: u64 = params.get("limit").and_then(|v| v.parse().ok()).unwrap_or(20);
    let offset: u64 = params.get("offset").and_then(|v| v.parse().ok()).unwrap_or(0);
    let end = (offset + limit).min(HISTORY_TOTAL);
    let records: Vec<Value> = (offset..end)
        .map(|i| {
            json!({
                "id": i,
                "title": format!("Track {i}"),
                "uri": format!("https://example.com/{i}"),
                "playedAt": 1_700_000_000_000i64 - i as i64 * 60_000,
            })
        })
        .collect();
    Json(json!({"success": true, "history": records, "total": HISTORY_TOTAL}))
}

async fn select_guild(State(state): State<Shared>, Path(id): Path<String>) -> Json<Value> {
    state.lock().unwrap().selected_guild = Some(id.clone());
    Json(json!({"success": true, "guildId": id, "guildName": "Test Server"}))
}

async fn forbidden() -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        Json(json!({"success": false, "message": "Reboot is disabled"})),
    )
}

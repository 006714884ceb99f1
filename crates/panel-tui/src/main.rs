mod action;
mod app;
mod app_state;
mod component;
mod components;
mod guild;
mod loader;
mod markup;
mod optimistic;
mod router;
mod session;
mod surface;
mod theme;
mod views;
mod widgets;

use panel_proto::client::ApiClient;
use panel_proto::config::Config;
use panel_proto::platform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = platform::log_path();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Allow RUST_LOG override; default to debug for app code but suppress noisy
    // connection-level DEBUG from HTTP client internals (hyper_util, reqwest).
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("botpanel log: {}", log_path.display());

    tracing::info!("botpanel starting…");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("config not loaded, using defaults: {:#}", e);
            Config::default()
        }
    };
    tracing::info!("backend at {}", config.backend.base_url);

    // ── Backend client ───────────────────────────────────────────────────────
    let api = ApiClient::new(&config.backend)?;

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let result = app::App::new(&config, api, log_path).run().await;
    if let Err(e) = &result {
        tracing::error!("botpanel exited with error: {:#}", e);
    }
    result
}

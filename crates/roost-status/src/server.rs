//! The dashboard HTTP surface: one JSON endpoint and one page.
//!
//! The reporter is strictly read-only. It holds a watch receiver onto
//! the supervisor's snapshots and renders whatever was last published;
//! it never reaches into the state machine and cannot block it.

use std::future::Future;
use std::io;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use roost_lifecycle::{Health, StatusSnapshot};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::watch;

/// Everything a handler needs, cloned per request.
#[derive(Clone)]
struct DashboardState {
    status: watch::Receiver<StatusSnapshot>,
    identity: String,
    started: Instant,
}

/// The `/api/status` response body.
#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub health: Health,
    pub connected: bool,
    pub in_game: bool,
    pub current_target: String,
    pub attempts: u32,
    pub total_cool_downs: u64,
    pub last_update: DateTime<Utc>,
    /// Seconds since the reporter came up, not since the last connect.
    pub uptime_seconds: u64,
    pub identity: String,
}

/// Builds the dashboard router over a live snapshot receiver.
pub fn router(status: watch::Receiver<StatusSnapshot>, identity: impl Into<String>) -> Router {
    let state = DashboardState {
        status,
        identity: identity.into(),
        started: Instant::now(),
    };
    Router::new()
        .route("/", get(index))
        .route("/api/status", get(api_status))
        .fallback(not_found)
        .with_state(state)
}

/// Serves the router until the shutdown future resolves.
pub async fn serve(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> io::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "dashboard listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

async fn api_status(State(state): State<DashboardState>) -> Json<StatusBody> {
    let snapshot = state.status.borrow().clone();
    Json(StatusBody {
        health: snapshot.health(),
        connected: snapshot.connected,
        in_game: snapshot.in_game,
        current_target: snapshot.current_target,
        attempts: snapshot.attempts,
        total_cool_downs: snapshot.total_cool_downs,
        last_update: snapshot.last_update,
        uptime_seconds: state.started.elapsed().as_secs(),
        identity: state.identity.clone(),
    })
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

/// The whole front end. Static on purpose: the page polls
/// `/api/status` and re-renders, so there is nothing to build or
/// bundle.
const INDEX_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>roost</title>
<style>
  body { font-family: system-ui, sans-serif; background: #111; color: #eee;
         display: flex; justify-content: center; padding-top: 4rem; }
  .card { background: #1c1c1c; border-radius: 8px; padding: 2rem 3rem; min-width: 22rem; }
  h1 { margin: 0 0 1rem; font-size: 1.3rem; }
  .badge { display: inline-block; padding: 0.2rem 0.8rem; border-radius: 999px;
           font-weight: 600; text-transform: uppercase; font-size: 0.8rem; }
  .online { background: #14532d; color: #86efac; }
  .connecting { background: #713f12; color: #fde047; }
  .offline { background: #7f1d1d; color: #fca5a5; }
  dl { display: grid; grid-template-columns: auto auto; gap: 0.4rem 1.5rem; }
  dt { color: #888; }
  dd { margin: 0; text-align: right; font-variant-numeric: tabular-nums; }
</style>
</head>
<body>
<div class="card">
  <h1>roost <span id="health" class="badge offline">offline</span></h1>
  <dl>
    <dt>identity</dt><dd id="identity">-</dd>
    <dt>target</dt><dd id="target">-</dd>
    <dt>attempts</dt><dd id="attempts">0</dd>
    <dt>cool-downs</dt><dd id="cooldowns">0</dd>
    <dt>uptime</dt><dd id="uptime">0s</dd>
    <dt>updated</dt><dd id="updated">-</dd>
  </dl>
</div>
<script>
  async function refresh() {
    try {
      const s = await (await fetch('/api/status')).json();
      const badge = document.getElementById('health');
      badge.textContent = s.health;
      badge.className = 'badge ' + s.health;
      document.getElementById('identity').textContent = s.identity;
      document.getElementById('target').textContent = s.current_target;
      document.getElementById('attempts').textContent = s.attempts;
      document.getElementById('cooldowns').textContent = s.total_cool_downs;
      document.getElementById('uptime').textContent = s.uptime_seconds + 's';
      document.getElementById('updated').textContent =
        new Date(s.last_update).toLocaleTimeString();
    } catch (e) { /* keep the last render */ }
  }
  refresh();
  setInterval(refresh, 5000);
</script>
</body>
</html>
"#;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::ScanError,
    ledger::SessionLedger,
    runner::{self, ScannerConfig},
    store::HistoryStore,
    types::ScanRecord,
    workflow,
};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<RwLock<ServerState>>, // store + session ledgers behind one lock
    scanner: Arc<ScannerConfig>,
}

/// Upper bound on live sessions. Server-minted session ids never expire on
/// their own, so the map must evict or it grows with every client that
/// omits its session id.
const MAX_SESSIONS: usize = 256;

#[derive(Debug)]
struct ServerState {
    store: HistoryStore,
    sessions: SessionMap,
}

/// Session ledgers keyed by session id, bounded at `MAX_SESSIONS` with
/// least-recently-used eviction.
#[derive(Debug, Default)]
struct SessionMap {
    entries: HashMap<String, SessionEntry>,
    /// Monotonic access counter backing the eviction order.
    ticks: u64,
}

#[derive(Debug, Default)]
struct SessionEntry {
    ledger: SessionLedger,
    last_used: u64,
}

impl SessionMap {
    /// Ledger for `id`, created on first use. Touching a session marks it
    /// most recently used; once the map is full, minting a new session
    /// evicts the stalest.
    fn ledger(&mut self, id: &str) -> &mut SessionLedger {
        self.ticks += 1;
        if !self.entries.contains_key(id) && self.entries.len() >= MAX_SESSIONS {
            let stalest = self
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone());
            if let Some(key) = stalest {
                self.entries.remove(&key);
            }
        }
        let entry = self.entries.entry(id.to_string()).or_default();
        entry.last_used = self.ticks;
        &mut entry.ledger
    }

    fn get(&self, id: &str) -> Option<&SessionLedger> {
        self.entries.get(id).map(|entry| &entry.ledger)
    }
}

impl AppState {
    pub fn new(store: HistoryStore, scanner: ScannerConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ServerState {
                store,
                sessions: SessionMap::default(),
            })),
            scanner: Arc::new(scanner),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub target: String,
    #[serde(default)]
    pub advanced: bool,
    /// Session id from an earlier response; omitted on the first call, in
    /// which case the server mints one and returns it.
    #[serde(default)]
    pub session: Option<String>,
}

#[derive(Debug, Serialize)]
struct ScanResponse {
    session: String,
    target: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    time: Option<String>,
    messages: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ScanSummary {
    target: String,
    time: String,
    results: Vec<String>,
}

impl ScanSummary {
    fn from_record(record: &ScanRecord) -> Self {
        Self {
            target: record.target.clone(),
            time: record.time.clone(),
            results: record.rendered(),
        }
    }
}

#[derive(Debug, Serialize)]
struct CompareResponse {
    scans: [ScanSummary; 2],
    new: Vec<String>,
    gone: Vec<String>,
}

pub async fn spawn_server(bind: &str, state: AppState) -> Result<()> {
    let api = Router::new()
        .route("/scan", post(post_scan))
        .route("/compare", get(get_compare))
        .route("/history/{target}", get(get_history))
        .with_state(state);

    let static_svc = ServeDir::new("ui").append_index_html_on_directories(true);

    let app = Router::new()
        .nest("/api", api)
        .fallback_service(static_svc)
        .layer(TraceLayer::new_for_http());

    info!(%bind, "serving UI");
    axum::serve(tokio::net::TcpListener::bind(bind).await?, app).await?;
    Ok(())
}

async fn post_scan(State(app): State<AppState>, Json(req): Json<ScanRequest>) -> impl IntoResponse {
    let target = req.target.trim().to_string();
    let session = req
        .session
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    // Validation happens before anything is launched.
    if target.is_empty() {
        let resp = ScanResponse {
            session,
            target,
            time: None,
            messages: vec![ScanError::EmptyTarget.to_message()],
        };
        return (StatusCode::BAD_REQUEST, Json(resp)).into_response();
    }

    let raw = match runner::run_scan(&app.scanner, &target, req.advanced).await {
        Ok(raw) => raw,
        Err(e) => {
            let resp = ScanResponse {
                session,
                target,
                time: None,
                messages: vec![e.to_message()],
            };
            return (StatusCode::OK, Json(resp)).into_response();
        }
    };

    // Exclusive access across the whole read-modify-write so concurrent
    // requests cannot interleave on the comparison baseline.
    let mut s = app.inner.write().await;
    let ServerState { store, sessions } = &mut *s;
    let ledger = sessions.ledger(&session);

    match workflow::scan_and_compare(store, ledger, &target, &raw) {
        Ok(report) => {
            let resp = ScanResponse {
                session,
                target,
                time: Some(report.record.time.clone()),
                messages: report.lines(),
            };
            (StatusCode::OK, Json(resp)).into_response()
        }
        Err(e) => {
            let resp = ScanResponse {
                session,
                target,
                time: None,
                messages: vec![e.to_message()],
            };
            (StatusCode::OK, Json(resp)).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompareParams {
    session: String,
}

async fn get_compare(
    State(app): State<AppState>,
    Query(params): Query<CompareParams>,
) -> impl IntoResponse {
    let s = app.inner.read().await;
    let comparison = s
        .sessions
        .get(&params.session)
        .and_then(SessionLedger::compare_last_two);

    match comparison {
        Some(cmp) => {
            let resp = CompareResponse {
                scans: [
                    ScanSummary::from_record(&cmp.older),
                    ScanSummary::from_record(&cmp.newer),
                ],
                new: cmp.diff.added.iter().map(|f| f.render()).collect(),
                gone: cmp.diff.removed.iter().map(|f| f.render()).collect(),
            };
            (StatusCode::OK, Json(resp)).into_response()
        }
        // Fewer than two scans in this session is a distinct outcome, not
        // an empty diff.
        None => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "Not enough scans to compare." })),
        )
            .into_response(),
    }
}

async fn get_history(
    State(app): State<AppState>,
    Path(target): Path<String>,
) -> impl IntoResponse {
    let s = app.inner.read().await;
    match s.store.get(&target) {
        Some(stored) => {
            let results: Vec<String> = stored.results.iter().map(|f| f.render()).collect();
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "target": target,
                    "time": stored.time,
                    "results": results,
                })),
            )
                .into_response()
        }
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_map_stays_bounded() {
        let mut sessions = SessionMap::default();
        for i in 0..MAX_SESSIONS + 10 {
            sessions.ledger(&format!("session-{i}"));
        }
        assert_eq!(sessions.entries.len(), MAX_SESSIONS);
    }

    #[test]
    fn eviction_drops_the_stalest_session() {
        let mut sessions = SessionMap::default();
        for i in 0..MAX_SESSIONS {
            sessions.ledger(&format!("session-{i}"));
        }
        // Touch the oldest so it is no longer the eviction candidate.
        sessions.ledger("session-0");
        sessions.ledger("brand-new");

        assert_eq!(sessions.entries.len(), MAX_SESSIONS);
        assert!(sessions.get("session-0").is_some());
        assert!(sessions.get("brand-new").is_some());
        assert!(sessions.get("session-1").is_none());
    }

    #[test]
    fn ledger_contents_survive_repeat_lookups() {
        let mut sessions = SessionMap::default();
        sessions.ledger("s").push(ScanRecord::new("10.0.0.1", vec![]));
        sessions.ledger("s").push(ScanRecord::new("10.0.0.2", vec![]));
        assert_eq!(sessions.entries.len(), 1);
        assert_eq!(sessions.get("s").unwrap().len(), 2);
    }
}

//! HTTP + WebSocket API for the check-in dashboard
//!
//! Endpoints:
//! - GET /health - Health check
//! - GET /api/checkins?limit=&phone= - Merged remote check-ins
//! - GET /api/stats?window=&tab= - Fresh dashboard snapshot
//! - GET /api/status - Backend status
//! - WS /ws/dashboard - Snapshots from the polling loop

use axum::{
    extract::{ws::{Message, WebSocket}, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::core::backend::StateBackend;
use crate::core::dashboard::{user_facing, Dashboard, DashboardSnapshot};
use crate::core::pipeline::CheckinPipeline;
use crate::core::sources::FetchQuery;
use crate::types::{CanonicalCheckin, DataTab, SystemStatus, TimeWindow};
use crate::DEFAULT_CHECKIN_LIMIT;

/// App state
pub struct AppState {
    pub pipeline: CheckinPipeline,
    pub dashboard: Arc<Dashboard>,
    pub backend: Arc<dyn StateBackend>,
    /// Latest snapshot from the polling loop
    pub snapshots: watch::Receiver<DashboardSnapshot>,
}

/// Check-ins query
#[derive(Debug, Default, Deserialize)]
pub struct CheckinsQuery {
    pub limit: Option<usize>,
    pub phone: Option<String>,
}

/// Check-ins response
#[derive(Debug, Serialize)]
pub struct CheckinsResponse {
    pub checkins: Vec<CanonicalCheckin>,
}

/// Stats query
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    pub window: Option<TimeWindow>,
    pub tab: Option<DataTab>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/checkins", get(get_checkins))
        .route("/api/stats", get(get_stats))
        .route("/api/status", get(get_status))
        .route("/ws/dashboard", get(websocket_handler))
        .with_state(state)
}

/// Health check endpoint
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

/// Merged check-ins across remote sources
async fn get_checkins(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CheckinsQuery>,
) -> Result<Json<CheckinsResponse>, (StatusCode, Json<ErrorResponse>)> {
    let fetch = FetchQuery {
        limit: query.limit.unwrap_or(DEFAULT_CHECKIN_LIMIT),
        phone: query.phone.filter(|p| !p.is_empty()),
    };

    match state.pipeline.fetch_checkins(&fetch).await {
        Ok(checkins) => Ok(Json(CheckinsResponse { checkins })),
        Err(e) => {
            warn!(error = %e, "Check-in fetch failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error: user_facing(&e) }),
            ))
        }
    }
}

/// Fresh dashboard snapshot for the requested window and tab
async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Json<DashboardSnapshot> {
    let snapshot = state
        .dashboard
        .refresh(query.window.unwrap_or_default(), query.tab.unwrap_or_default())
        .await;
    Json(snapshot)
}

/// Backend status
async fn get_status(State(state): State<Arc<AppState>>) -> Json<SystemStatus> {
    Json(state.backend.status().await)
}

/// WebSocket handler for live snapshots
async fn websocket_handler(
    State(state): State<Arc<AppState>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let rx = state.snapshots.clone();
    ws.on_upgrade(move |socket| async move {
        handle_websocket(socket, rx).await;
    })
}

/// Push the current snapshot, then every new one
async fn handle_websocket(mut socket: WebSocket, mut rx: watch::Receiver<DashboardSnapshot>) {
    loop {
        let json = {
            let snapshot = rx.borrow_and_update();
            serde_json::to_string(&*snapshot).unwrap_or_default()
        };
        if socket.send(Message::Text(json)).await.is_err() {
            debug!("Dashboard socket closed");
            break;
        }
        if rx.changed().await.is_err() {
            break;
        }
    }
}

/// Run the API server
pub async fn run_server(addr: &str, state: Arc<AppState>) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "API listening");
    println!("MuseShift API running on {}", addr);
    println!("  GET  /health        - Health check");
    println!("  GET  /api/checkins  - Merged check-ins (?limit=&phone=)");
    println!("  GET  /api/stats     - Dashboard snapshot (?window=&tab=)");
    println!("  GET  /api/status    - Backend status");
    println!("  WS   /ws/dashboard  - Live snapshots");
    axum::serve(listener, router).await?;
    Ok(())
}

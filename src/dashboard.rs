use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::accumulator::Accumulator;
use crate::config::{Config, EmptyResponse, ResetPolicy};
use crate::error::ServeError;
use crate::query::{TrafficQuery, TrafficReport};
use crate::store::AggregationStore;

pub const EMPTY_MESSAGE: &str = "no traffic observed in the current window";

#[derive(Clone)]
pub struct DashboardState {
    pub query: TrafficQuery,
    pub store: Arc<AggregationStore>,
    pub accumulator: Arc<Accumulator>,
    pub config: Arc<Config>,
}

#[derive(Debug, Serialize)]
struct StatusDTO<'a> {
    host: String,
    interface: Option<&'a str>,
    reset_policy: ResetPolicy,
    window_secs: u64,
    window_started_at: DateTime<Utc>,
    peers: usize,
    observations_ingested: u64,
    observations_discarded: u64,
}

async fn root(State(state): State<DashboardState>) -> impl IntoResponse {
    Json(json!({
        "message": format!("hostwatch running, capturing traffic for {}", state.config.host)
    }))
}

async fn traffic(State(state): State<DashboardState>) -> Response {
    match state.query.current_traffic() {
        TrafficReport::Peers(peers) => Json(peers).into_response(),
        TrafficReport::Empty => match state.config.empty_response {
            EmptyResponse::Object => Json(json!({})).into_response(),
            EmptyResponse::Message => Json(json!({ "message": EMPTY_MESSAGE })).into_response(),
        },
    }
}

async fn status(State(state): State<DashboardState>) -> Response {
    let config = &state.config;
    Json(StatusDTO {
        host: config.host.to_string(),
        interface: config.interface.as_deref(),
        reset_policy: config.reset_policy,
        window_secs: config.window_secs,
        window_started_at: state.store.window_started_at(),
        peers: state.store.peer_count(),
        observations_ingested: state.accumulator.ingested(),
        observations_discarded: state.accumulator.discarded(),
    })
    .into_response()
}

pub fn create_router(state: DashboardState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/traffic", get(traffic))
        // path used by existing timer-driven dashboards
        .route("/data", get(traffic))
        .route("/status", get(status))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the dashboard API until Ctrl-C.
pub async fn serve(state: DashboardState) -> Result<(), ServeError> {
    let address = state.config.listen;
    let app = create_router(state);

    let server = axum::Server::try_bind(&address)
        .map_err(|source| ServeError::Bind { address, source })?;
    info!(%address, "dashboard API listening");

    server
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServeError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("shutting down dashboard API");
}

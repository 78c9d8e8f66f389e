//! Router assembly and server lifecycle.

use super::admin_routes;
use super::http_layers::{
    log_requests, submission_rate_limit_error_handler, ClientIpKeyExtractor,
};
use super::listing_routes;
use super::state::ServerState;
use super::submission_routes;
use anyhow::{Context, Result};
use axum::{
    extract::State,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tracing::info;

#[derive(Serialize)]
struct ServerStats {
    uptime: String,
    hash: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

async fn home(State(state): State<ServerState>) -> Json<ServerStats> {
    Json(ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
    })
}

/// Build the full application router. Separated from `run_server` so tests
/// can serve it on an ephemeral port.
pub fn make_app(state: ServerState) -> Router {
    // One submission token replenishes every period; burst is the hourly
    // budget, so a client gets at most `submissions_per_hour` per hour.
    let replenish_secs = (3600 / state.config.submissions_per_hour.max(1)) as u64;
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(ClientIpKeyExtractor)
            .per_second(replenish_secs.max(1))
            .burst_size(state.config.submissions_per_hour.max(1))
            .finish()
            .expect("invalid governor configuration"),
    );

    let submission_router = Router::new()
        .route("/api/submissions", post(submission_routes::submit_server))
        .layer(GovernorLayer::new(governor_config).error_handler(submission_rate_limit_error_handler));

    let admin_router = Router::new()
        .route("/api/admin/servers", post(admin_routes::create_server))
        .route(
            "/api/admin/servers/{id}",
            put(admin_routes::update_server).delete(admin_routes::delete_server),
        )
        .route(
            "/api/admin/submissions",
            get(admin_routes::list_submissions),
        )
        .route(
            "/api/admin/submissions/{id}/approve",
            post(admin_routes::approve_submission),
        )
        .route(
            "/api/admin/submissions/{id}/reject",
            post(admin_routes::reject_submission),
        )
        .route(
            "/api/admin/cache/invalidate",
            post(admin_routes::invalidate_cache),
        )
        .route("/api/admin/events", get(admin_routes::recent_events));

    Router::new()
        .route("/", get(home))
        .route("/api/servers", get(listing_routes::list_servers))
        .route("/api/servers/{slug}", get(listing_routes::get_server))
        .route("/api/categories", get(listing_routes::get_categories))
        .merge(submission_router)
        .merge(admin_router)
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server(state: ServerState, port: u16, shutdown: CancellationToken) -> Result<()> {
    let app = make_app(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Listening on port {}", port);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .context("Server error")
}

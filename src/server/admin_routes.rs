//! Admin routes: direct entry CRUD, submission review, cache invalidation,
//! and event-run inspection. All guarded by the bearer-token AdminSession.

use super::auth::AdminSession;
use super::state::ServerState;
use crate::directory_store::{EntryPatch, SubmissionStatus};
use crate::enrichment::{CreateServerRequest, SERVER_CREATED_EVENT};
use crate::listing::SERVERS_TAG;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

impl ActionOutcome {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
        })
    }

    fn failure(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: false,
            message: message.into(),
        })
    }
}

/// Queue the enrichment workflow for a new server. The entry appears once
/// the background pipeline has run its create step.
pub async fn create_server(
    _admin: AdminSession,
    State(state): State<ServerState>,
    Json(request): Json<CreateServerRequest>,
) -> Response {
    if request.name.trim().is_empty() || request.homepage_url.trim().is_empty() {
        return ActionOutcome::failure("Missing required fields: name and homepage_url")
            .into_response();
    }

    let payload = match serde_json::to_value(&request) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to serialize creation payload: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match state.dispatcher.dispatch(SERVER_CREATED_EVENT, payload) {
        Ok(()) => ActionOutcome::ok("Server creation queued.").into_response(),
        Err(e) => {
            error!("Failed to dispatch creation event: {}", e);
            ActionOutcome::failure("Failed to queue server creation.").into_response()
        }
    }
}

pub async fn update_server(
    _admin: AdminSession,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(patch): Json<EntryPatch>,
) -> Response {
    match state.store.update_entry(&id, &patch) {
        Ok(Some(entry)) => {
            state.cache.invalidate_tag(SERVERS_TAG);
            Json(entry).into_response()
        }
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to update entry {}: {:#}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn delete_server(
    _admin: AdminSession,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    match state.store.delete_entry(&id) {
        Ok(true) => {
            state.cache.invalidate_tag(SERVERS_TAG);
            StatusCode::OK.into_response()
        }
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to delete entry {}: {:#}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmissionsParams {
    pub status: Option<String>,
}

pub async fn list_submissions(
    _admin: AdminSession,
    State(state): State<ServerState>,
    Query(params): Query<SubmissionsParams>,
) -> Response {
    let status = match params.status.as_deref() {
        None => None,
        Some(raw) => match SubmissionStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                return (StatusCode::BAD_REQUEST, format!("Unknown status '{}'", raw))
                    .into_response()
            }
        },
    };

    match state.store.list_submissions(status) {
        Ok(submissions) => Json(submissions).into_response(),
        Err(e) => {
            error!("Failed to list submissions: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Approve a submission: mark it and fire the enrichment event built from
/// its fields. The repo URL doubles as the homepage until enrichment learns
/// better.
pub async fn approve_submission(
    _admin: AdminSession,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    let submission = match state.store.get_submission(&id) {
        Ok(Some(submission)) => submission,
        Ok(None) => return StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to load submission {}: {:#}", id, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if let Err(e) = state
        .store
        .set_submission_status(&id, SubmissionStatus::Approved)
    {
        error!("Failed to mark submission {} approved: {:#}", id, e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let request = CreateServerRequest {
        name: submission.server_name.clone(),
        homepage_url: submission.repo_url.clone(),
        repo_url: Some(submission.repo_url.clone()),
        docs_url: None,
        logo_url: None,
        ai_context: submission.description.clone(),
        submission_id: Some(submission.id.clone()),
    };
    let payload = match serde_json::to_value(&request) {
        Ok(payload) => payload,
        Err(e) => {
            error!("Failed to serialize approval payload: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match state.dispatcher.dispatch(SERVER_CREATED_EVENT, payload) {
        Ok(()) => ActionOutcome::ok("Submission approved, server creation queued.").into_response(),
        Err(e) => {
            error!("Failed to dispatch approval event: {}", e);
            ActionOutcome::failure("Approved, but failed to queue server creation.")
                .into_response()
        }
    }
}

pub async fn reject_submission(
    _admin: AdminSession,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Response {
    match state
        .store
        .set_submission_status(&id, SubmissionStatus::Rejected)
    {
        Ok(true) => ActionOutcome::ok("Submission rejected.").into_response(),
        Ok(false) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to reject submission {}: {:#}", id, e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct InvalidateCacheBody {
    pub tag: String,
}

pub async fn invalidate_cache(
    _admin: AdminSession,
    State(state): State<ServerState>,
    Json(body): Json<InvalidateCacheBody>,
) -> Response {
    let purged = state.cache.invalidate_tag(&body.tag);
    Json(json!({ "success": true, "purged": purged })).into_response()
}

#[derive(Debug, Deserialize)]
pub struct EventsParams {
    pub limit: Option<usize>,
}

pub async fn recent_events(
    _admin: AdminSession,
    State(state): State<ServerState>,
    Query(params): Query<EventsParams>,
) -> Response {
    let limit = params.limit.unwrap_or(50).clamp(1, 500);
    match state.store.recent_event_runs(limit) {
        Ok(runs) => Json(runs).into_response(),
        Err(e) => {
            error!("Failed to list event runs: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

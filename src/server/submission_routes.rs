//! Public submission endpoint.
//!
//! Every expected outcome is a `{ success, message }` result object, never
//! an error status - the presentation layer renders the message either way.
//! The rate-limit layer in front of this route is the one exception (429).

use super::state::GuardedDirectoryStore;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::directory_store::{NewSubmission, Submission};

pub const MSG_ALREADY_LISTED: &str = "This MCP server already exists in our directory.";
pub const MSG_ALREADY_SUBMITTED: &str =
    "This MCP server has already been submitted and is pending review.";
pub const MSG_SUBMITTED: &str = "MCP server submitted successfully! We'll review it shortly.";
pub const MSG_SUBMIT_FAILED: &str = "An error occurred while submitting your MCP server.";

#[derive(Debug, Deserialize)]
pub struct SubmitServerBody {
    pub name: String,
    pub email: String,
    pub server_name: String,
    pub repo_url: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission: Option<Submission>,
}

impl SubmitOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            submission: None,
        }
    }
}

fn validate(body: &SubmitServerBody) -> Result<NewSubmission, String> {
    if body.name.trim().is_empty() {
        return Err("Your name is required.".to_string());
    }
    if body.email.trim().is_empty() || !body.email.contains('@') {
        return Err("A valid email address is required.".to_string());
    }
    if body.server_name.trim().is_empty() {
        return Err("The server name is required.".to_string());
    }
    let repo_url = body.repo_url.trim();
    if !repo_url.starts_with("http://") && !repo_url.starts_with("https://") {
        return Err("The repository URL must be a valid http(s) URL.".to_string());
    }

    Ok(NewSubmission {
        name: body.name.trim().to_string(),
        email: body.email.trim().to_string(),
        server_name: body.server_name.trim().to_string(),
        repo_url: repo_url.to_string(),
        description: body
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    })
}

pub async fn submit_server(
    State(store): State<GuardedDirectoryStore>,
    Json(body): Json<SubmitServerBody>,
) -> impl IntoResponse {
    let new_submission = match validate(&body) {
        Ok(new_submission) => new_submission,
        Err(message) => return Json(SubmitOutcome::failure(message)),
    };

    // Two separate existence checks, not a transaction: a duplicate racing
    // through both is tolerated, admin review catches it.
    match store.find_entry_by_repo_url(&new_submission.repo_url) {
        Ok(Some(_)) => return Json(SubmitOutcome::failure(MSG_ALREADY_LISTED)),
        Ok(None) => {}
        Err(e) => {
            error!("Entry dedup check failed: {:#}", e);
            return Json(SubmitOutcome::failure(MSG_SUBMIT_FAILED));
        }
    }

    match store.submission_exists_for_repo(&new_submission.repo_url) {
        Ok(true) => return Json(SubmitOutcome::failure(MSG_ALREADY_SUBMITTED)),
        Ok(false) => {}
        Err(e) => {
            error!("Submission dedup check failed: {:#}", e);
            return Json(SubmitOutcome::failure(MSG_SUBMIT_FAILED));
        }
    }

    match store.insert_submission(&new_submission) {
        Ok(submission) => Json(SubmitOutcome {
            success: true,
            message: MSG_SUBMITTED.to_string(),
            submission: Some(submission),
        }),
        Err(e) => {
            error!("Failed to insert submission: {:#}", e);
            Json(SubmitOutcome::failure(MSG_SUBMIT_FAILED))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_body() -> SubmitServerBody {
        SubmitServerBody {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            server_name: "Weather".to_string(),
            repo_url: "https://github.com/acme/weather".to_string(),
            description: Some("  ".to_string()),
        }
    }

    #[test]
    fn validate_accepts_good_input() {
        let new_submission = validate(&valid_body()).unwrap();
        assert_eq!(new_submission.name, "Ada");
        // Blank description collapses to None.
        assert!(new_submission.description.is_none());
    }

    #[test]
    fn validate_rejects_bad_email() {
        let mut body = valid_body();
        body.email = "not-an-email".to_string();
        assert!(validate(&body).is_err());
    }

    #[test]
    fn validate_rejects_non_http_repo() {
        let mut body = valid_body();
        body.repo_url = "git@github.com:acme/weather.git".to_string();
        assert!(validate(&body).is_err());
    }

    #[test]
    fn validate_rejects_empty_fields() {
        let mut body = valid_body();
        body.server_name = " ".to_string();
        assert!(validate(&body).is_err());
    }
}

//! Admin authentication: a static bearer token from config.
//!
//! The public site needs no accounts; the identity provider for real users
//! is an external collaborator. Admin routes compare one shared token.

use super::state::ServerState;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::IntoResponse,
};

#[derive(Debug)]
pub struct AdminSession;

pub enum AdminAuthError {
    Unauthorized,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminAuthError::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

fn extract_bearer_token(parts: &Parts) -> Option<String> {
    let value = parts.headers.get("Authorization")?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value);
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl FromRequestParts<ServerState> for AdminSession {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        ctx: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = &ctx.config.admin_token else {
            return Err(AdminAuthError::Unauthorized);
        };
        match extract_bearer_token(parts) {
            Some(token) if token == *expected => Ok(AdminSession),
            _ => Err(AdminAuthError::Unauthorized),
        }
    }
}

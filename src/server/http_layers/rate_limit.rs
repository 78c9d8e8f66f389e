//! Rate limiting for the public submission endpoint using tower-governor.
//!
//! Keyed by client IP: proxy headers first, then the socket peer address.
//! The governor config itself is built in server.rs next to the router, so
//! the per-hour budget can come from ServerConfig.

use axum::{
    body::Body,
    extract::{ConnectInfo, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::net::SocketAddr;
use tower_governor::{key_extractor::KeyExtractor, GovernorError};
use tracing::warn;

/// Client-IP key extractor: honors the usual proxy headers before falling
/// back to the connection's peer address.
#[derive(Clone)]
pub struct ClientIpKeyExtractor;

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl KeyExtractor for ClientIpKeyExtractor {
    type Key = String;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if let Some(ip) = header_ip(req, "cf-connecting-ip")
            .or_else(|| header_ip(req, "x-real-ip"))
            .or_else(|| header_ip(req, "x-forwarded-for"))
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// 429 handler for the submission route: the body stays in the same
/// `{ success, message }` shape as every other submission outcome.
pub fn submission_rate_limit_error_handler(err: GovernorError) -> Response {
    match err {
        GovernorError::TooManyRequests { wait_time, .. } => {
            warn!("Submission rate limit exceeded, retry in {}s", wait_time);
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({
                    "success": false,
                    "message": format!(
                        "Rate limit exceeded. Try again in {} seconds.",
                        wait_time
                    ),
                })),
            )
                .into_response()
        }
        other => {
            warn!("Rate limiting error: {:?}", other);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn request_with_header(name: &'static str, value: &'static str) -> Request<Body> {
        Request::builder().header(name, value).body(Body::empty()).unwrap()
    }

    #[test]
    fn prefers_proxy_headers() {
        let req = request_with_header("cf-connecting-ip", "1.2.3.4");
        assert_eq!(ClientIpKeyExtractor.extract(&req).unwrap(), "1.2.3.4");

        let req = request_with_header("x-forwarded-for", "5.6.7.8, 10.0.0.1");
        assert_eq!(ClientIpKeyExtractor.extract(&req).unwrap(), "5.6.7.8");
    }

    #[test]
    fn falls_back_to_peer_address() {
        let mut req = Request::builder().body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo("9.9.9.9:1234".parse::<SocketAddr>().unwrap()));
        assert_eq!(ClientIpKeyExtractor.extract(&req).unwrap(), "9.9.9.9");
    }

    #[test]
    fn missing_everything_is_an_error() {
        let req = Request::builder().body(Body::empty()).unwrap();
        assert!(ClientIpKeyExtractor.extract(&req).is_err());
    }
}

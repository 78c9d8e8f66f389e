use super::http_layers::RequestsLoggingLevel;

/// Settings the HTTP layer needs at request time.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    /// Bearer token for admin routes; None means admin access is disabled.
    pub admin_token: Option<String>,
    /// Submission budget per client IP per hour.
    pub submissions_per_hour: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            requests_logging_level: RequestsLoggingLevel::default(),
            admin_token: None,
            submissions_per_hour: 10,
        }
    }
}

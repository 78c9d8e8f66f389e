mod rate_limit;
mod requests_logging;

pub use rate_limit::{submission_rate_limit_error_handler, ClientIpKeyExtractor};
pub use requests_logging::{log_requests, RequestsLoggingLevel};

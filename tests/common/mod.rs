//! Shared e2e test infrastructure.
//!
//! Each test spawns an isolated server instance on a random port with its
//! own temp database and stubbed external collaborators (repository host
//! and LLM provider); requests go through the real HTTP stack.

pub mod fixtures;
pub mod server;

pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

use std::future::Future;
use std::time::Duration;

/// Poll `check` until it returns Some or the timeout elapses.
pub async fn wait_for<T, F, Fut>(timeout: Duration, mut check: F) -> Option<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if let Some(value) = check().await {
            return Some(value);
        }
        if tokio::time::Instant::now() >= deadline {
            return None;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

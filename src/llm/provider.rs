//! Provider trait and shared types for structured LLM calls.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("provider request timed out")]
    Timeout,
    #[error("provider rate limited the request")]
    RateLimited,
    #[error("connection error: {0}")]
    Connection(String),
    #[error("provider API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// One structured-output request: a system prompt, a rendered user prompt,
/// and the JSON schema the reply must satisfy.
#[derive(Debug, Clone)]
pub struct ObjectRequest {
    pub system: String,
    pub prompt: String,
    pub schema_name: String,
    pub schema: Value,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub timeout: Duration,
}

impl ObjectRequest {
    pub fn new(
        system: impl Into<String>,
        prompt: impl Into<String>,
        schema_name: impl Into<String>,
        schema: Value,
    ) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            schema_name: schema_name.into(),
            schema,
            temperature: 0.2,
            max_tokens: Some(1024),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ObjectResponse {
    /// The parsed object; guaranteed to be valid JSON, schema conformance is
    /// the provider's contract.
    pub object: Value,
    pub usage: Option<TokenUsage>,
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    async fn generate_object(&self, request: &ObjectRequest) -> Result<ObjectResponse, LlmError>;
}

//! LLM provider integration
//!
//! The provider is reached through the object-safe [`ChatClient`] trait so
//! the planning pipelines can be exercised against a scripted mock. The
//! retry policy wraps the trait rather than living inside one concrete
//! client, keeping transient-failure handling uniform across providers.

pub mod azure;
pub mod client;

pub use azure::AzureOpenAiClient;
pub use client::ChatClient;

use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// A single chat completion request: optional system prompt plus one user
/// message. Each call is independent; no conversation state is kept.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub user: String,
}

impl ChatRequest {
    pub fn user(prompt: impl Into<String>) -> Self {
        Self {
            system: None,
            user: prompt.into(),
        }
    }

    pub fn with_system(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            user: user.into(),
        }
    }
}

/// Errors from the LLM provider
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limited by provider")]
    RateLimited,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Provider returned an empty response")]
    EmptyResponse,
}

impl LlmError {
    /// Transient errors are retried; everything else fails immediately.
    ///
    /// Only the rate-limit and server-error classes count as transient.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RateLimited => true,
            LlmError::Api { status, .. } => *status >= 500,
            LlmError::Network(_) => false,
            LlmError::EmptyResponse => false,
        }
    }
}

/// Retry policy for transient provider errors: bounded attempts with
/// exponential backoff (doubling from `base_delay`, capped at `max_delay`).
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Backoff before the given retry attempt (attempt numbering is
    /// 1-based; the first retry is attempt 2).
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(2));
        self.base_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Issue a completion, retrying transient failures per the policy.
///
/// At most `max_attempts` calls are made; non-transient errors and
/// exhausted attempts propagate the last provider error.
pub async fn complete_with_retry(
    client: &dyn ChatClient,
    request: ChatRequest,
    policy: &RetryPolicy,
) -> Result<String, LlmError> {
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        if attempt > 1 {
            let backoff = policy.backoff(attempt);
            warn!(
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                "Retrying LLM call after transient error"
            );
            tokio::time::sleep(backoff).await;
        }

        match client.complete(request.clone()).await {
            Ok(text) => return Ok(text),
            Err(e) if e.is_transient() => {
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or(LlmError::EmptyResponse))
}

#[cfg(test)]
mod tests {
    use super::client::mock::MockChatClient;
    use super::*;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_then_succeeds() {
        let client = MockChatClient::new(vec![
            Err(LlmError::RateLimited),
            Err(LlmError::RateLimited),
            Ok("{}".to_string()),
        ]);

        let result = complete_with_retry(&client, ChatRequest::user("hi"), &fast_policy()).await;

        assert_eq!(result.unwrap(), "{}");
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let client = MockChatClient::new(vec![
            Err(LlmError::RateLimited),
            Err(LlmError::RateLimited),
            Err(LlmError::RateLimited),
            Ok("never reached".to_string()),
        ]);

        let result = complete_with_retry(&client, ChatRequest::user("hi"), &fast_policy()).await;

        assert!(matches!(result, Err(LlmError::RateLimited)));
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let client = MockChatClient::new(vec![
            Err(LlmError::Api {
                status: 400,
                message: "bad request".to_string(),
            }),
            Ok("never reached".to_string()),
        ]);

        let result = complete_with_retry(&client, ChatRequest::user("hi"), &fast_policy()).await;

        assert!(matches!(result, Err(LlmError::Api { status: 400, .. })));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn server_errors_are_transient() {
        let client = MockChatClient::new(vec![
            Err(LlmError::Api {
                status: 503,
                message: "overloaded".to_string(),
            }),
            Ok("ok".to_string()),
        ]);

        let result = complete_with_retry(&client, ChatRequest::user("hi"), &fast_policy()).await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(client.call_count(), 2);
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_secs(4),
            max_delay: Duration::from_secs(10),
        };
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
        assert_eq!(policy.backoff(4), Duration::from_secs(10));
    }
}

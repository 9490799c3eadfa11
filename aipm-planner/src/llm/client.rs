//! ChatClient trait definition

use async_trait::async_trait;

use super::{ChatRequest, LlmError};

/// Stateless chat-completion client - each call is independent.
///
/// The planning pipelines depend on this trait rather than a concrete
/// provider so they can be driven by a scripted mock in tests and so a
/// single long-lived client can be shared by every request.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Send one completion request and return the raw response text.
    async fn complete(&self, request: ChatRequest) -> Result<String, LlmError>;
}

/// Scripted mock client for tests.
///
/// Replays a fixed sequence of results and counts calls, which is what the
/// retry-policy tests need to assert exact call counts.
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub struct MockChatClient {
        responses: Mutex<VecDeque<Result<String, LlmError>>>,
        call_count: AtomicUsize,
    }

    impl MockChatClient {
        pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                call_count: AtomicUsize::new(0),
            }
        }

        /// One successful response, the common case for handler tests.
        pub fn replying(text: impl Into<String>) -> Self {
            Self::new(vec![Ok(text.into())])
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChatClient for MockChatClient {
        async fn complete(&self, _request: ChatRequest) -> Result<String, LlmError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .expect("mock responses poisoned")
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyResponse))
        }
    }
}

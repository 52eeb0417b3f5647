/*!
 * Mock provider implementations for testing.
 *
 * This module provides a mock provider that simulates different behaviors:
 * - `MockProvider::working()` - Always succeeds with tagged text
 * - `MockProvider::intermittent(n)` - Fails every nth request
 * - `MockProvider::failing()` - Always fails with a server error
 *
 * Failures can also be injected for individual target codes, and every
 * request is recorded so tests can assert what reached the provider.
 */

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{ProviderUsage, TranslationProvider};
use crate::errors::ProviderError;

/// A request seen by the mock provider
#[derive(Debug, Clone, PartialEq)]
pub struct MockRequest {
    /// The text to translate
    pub text: String,
    /// Source provider code
    pub source_code: String,
    /// Target provider code
    pub target_code: String,
}

/// Behavior mode for the mock provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Fails intermittently (every Nth request)
    Intermittent { fail_every: usize },
    /// Answers "too many requests" for the first N requests
    RateLimited { times: usize },
    /// Always fails with an error
    Failing,
    /// Returns empty text
    Empty,
    /// Simulates slow response (for timeout testing)
    Slow { delay_ms: u64 },
}

/// Mock provider for testing translation behavior
#[derive(Debug)]
pub struct MockProvider {
    /// Behavior mode
    behavior: MockBehavior,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every translate request, in order
    requests: Arc<Mutex<Vec<MockRequest>>>,
    /// Custom response generator (optional)
    custom_response: Option<fn(&MockRequest) -> String>,
    /// Target codes that always fail
    failing_targets: HashSet<String>,
    /// Usage returned by `usage()`; `None` makes it fail
    usage: Option<ProviderUsage>,
}

impl MockProvider {
    /// Create a new mock provider with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            request_count: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
            custom_response: None,
            failing_targets: HashSet::new(),
            usage: Some(ProviderUsage {
                character_count: 0,
                character_limit: 500_000,
            }),
        }
    }

    /// Create a working mock provider that always succeeds
    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    /// Create an intermittently failing mock provider
    pub fn intermittent(fail_every: usize) -> Self {
        Self::new(MockBehavior::Intermittent {
            fail_every: fail_every.max(1),
        })
    }

    /// Create a mock that is rate limited for its first `times` requests
    pub fn rate_limited(times: usize) -> Self {
        Self::new(MockBehavior::RateLimited { times })
    }

    /// Create a failing mock provider that always errors
    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    /// Create a mock that returns empty responses
    pub fn empty() -> Self {
        Self::new(MockBehavior::Empty)
    }

    /// Create a mock that answers after a delay
    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    /// Set a custom response generator
    pub fn with_custom_response(mut self, generator: fn(&MockRequest) -> String) -> Self {
        self.custom_response = Some(generator);
        self
    }

    /// Make every request for `target_code` fail with a client error
    pub fn failing_for(mut self, target_code: impl Into<String>) -> Self {
        self.failing_targets.insert(target_code.into().to_uppercase());
        self
    }

    /// Report the given usage from `usage()`
    pub fn with_usage(mut self, character_count: u64, character_limit: u64) -> Self {
        self.usage = Some(ProviderUsage {
            character_count,
            character_limit,
        });
        self
    }

    /// Make `usage()` fail
    pub fn without_usage(mut self) -> Self {
        self.usage = None;
        self
    }

    /// Number of translate requests received
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Copy of every translate request received
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received for one target code
    pub fn requests_for(&self, target_code: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.target_code.eq_ignore_ascii_case(target_code))
            .count()
    }

    /// Default translation: the text tagged with the target code
    pub fn tagged(request: &MockRequest) -> String {
        format!("[{}] {}", request.target_code, request.text)
    }

    fn respond(&self, request: &MockRequest) -> String {
        match self.custom_response {
            Some(generator) => generator(request),
            None => Self::tagged(request),
        }
    }
}

impl Clone for MockProvider {
    fn clone(&self) -> Self {
        Self {
            behavior: self.behavior,
            request_count: Arc::clone(&self.request_count),
            requests: Arc::clone(&self.requests),
            custom_response: self.custom_response,
            failing_targets: self.failing_targets.clone(),
            usage: self.usage,
        }
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    async fn translate(&self, text: &str, source_code: &str, target_code: &str) -> Result<String, ProviderError> {
        let count = self.request_count.fetch_add(1, Ordering::SeqCst);
        let request = MockRequest {
            text: text.to_string(),
            source_code: source_code.to_string(),
            target_code: target_code.to_string(),
        };
        self.requests.lock().push(request.clone());

        if self.failing_targets.contains(&target_code.to_uppercase()) {
            return Err(ProviderError::ApiError {
                message: format!("Simulated failure for {}", target_code),
                status_code: 400,
            });
        }

        match self.behavior {
            MockBehavior::Working => Ok(self.respond(&request)),

            MockBehavior::Intermittent { fail_every } => {
                if count % fail_every == fail_every - 1 {
                    Err(ProviderError::ApiError {
                        message: format!("Simulated intermittent failure (request #{})", count + 1),
                        status_code: 503,
                    })
                } else {
                    Ok(self.respond(&request))
                }
            }

            MockBehavior::RateLimited { times } => {
                if count < times {
                    Err(ProviderError::RateLimitExceeded("Simulated rate limit".to_string()))
                } else {
                    Ok(self.respond(&request))
                }
            }

            MockBehavior::Failing => Err(ProviderError::ApiError {
                message: "Simulated provider failure".to_string(),
                status_code: 500,
            }),

            MockBehavior::Empty => Ok(String::new()),

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(tokio::time::Duration::from_millis(delay_ms)).await;
                Ok(self.respond(&request))
            }
        }
    }

    async fn usage(&self) -> Result<ProviderUsage, ProviderError> {
        self.usage
            .ok_or_else(|| ProviderError::ConnectionError("Simulated usage endpoint outage".to_string()))
    }
}

//! Timeout and retry around any completion provider.

use std::time::Duration;

use async_trait::async_trait;

use super::CompletionProvider;
use crate::error::TeamError;
use crate::types::Message;
use crate::util::retry::RetryPolicy;
use crate::util::timeout::with_timeout;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Bounds every attempt with a timeout and retries retryable failures.
///
/// Authentication and malformed-response errors surface on the first
/// attempt; rate limits, timeouts, network and 5xx errors are retried per
/// the [`RetryPolicy`].
pub struct ResilientProvider<P> {
    inner: P,
    timeout: Duration,
    retry_policy: RetryPolicy,
}

impl<P: CompletionProvider> ResilientProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            timeout: DEFAULT_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: CompletionProvider> CompletionProvider for ResilientProvider<P> {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    async fn complete(&self, model_id: &str, messages: &[Message]) -> Result<Message, TeamError> {
        self.retry_policy
            .execute(|| with_timeout(self.timeout, self.inner.complete(model_id, messages)))
            .await
    }
}

//! Caller side of the request/reply protocol.
//!
//! A `Requester` sends requests to a shared request queue and waits for the
//! matching reply on its own private reply queue. Each request carries a
//! fresh correlation id. The reply queue address travels inside the request
//! itself, so any number of callers can share one request queue without
//! seeing each other's replies.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::bus::{QueueTransport, TransportError};

use super::envelope::Envelope;
use super::response::ResolvedResponse;

/// Error type for request operations.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Sending the request or reading the reply queue failed
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The request could not be serialized
    #[error("request encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    /// No matching reply arrived in time
    #[error("timed out waiting for reply to {correlation_id}")]
    TimedOut { correlation_id: String },
}

/// Sends requests and waits for correlated replies.
///
/// ## Example
///
/// ```ignore
/// let requester = Requester::new(Arc::new(queue), "user-profile-requests", "reply-7f3a")
///     .with_timeout(Duration::from_secs(30));
///
/// let response = requester
///     .request("USER_PROFILE_REQUESTED", json!({ "userId": 1 }))
///     .await?;
///
/// match response.into_result() {
///     Ok(profile) => println!("{}", profile),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
pub struct Requester {
    transport: Arc<dyn QueueTransport>,
    request_queue: String,
    reply_queue: String,
    timeout: Duration,
    poll_wait: Duration,
}

impl Requester {
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        request_queue: impl Into<String>,
        reply_queue: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            request_queue: request_queue.into(),
            reply_queue: reply_queue.into(),
            timeout: Duration::from_secs(30),
            poll_wait: Duration::from_secs(3),
        }
    }

    /// Overall time to wait for a reply.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Long-poll wait of each receive on the reply queue.
    pub fn with_poll_wait(mut self, wait: Duration) -> Self {
        self.poll_wait = wait;
        self
    }

    pub fn reply_queue(&self) -> &str {
        &self.reply_queue
    }

    /// Send a request and wait for the reply carrying its correlation id.
    pub async fn request(
        &self,
        event_type: &str,
        payload: Value,
    ) -> Result<ResolvedResponse, RequestError> {
        let correlation_id = Uuid::new_v4().to_string();
        let envelope = Envelope::request(event_type, &correlation_id, &self.reply_queue, payload);

        self.transport
            .send(&self.request_queue, serde_json::to_string(&envelope)?)
            .await?;

        tracing::debug!(
            queue = %self.request_queue,
            event_type = %event_type,
            correlation_id = %correlation_id,
            "Request sent"
        );

        self.await_reply(&correlation_id).await
    }

    /// Poll the reply queue until a reply for `correlation_id` arrives.
    ///
    /// Every reply read from the queue is deleted. Replies for other
    /// correlation ids belong to earlier, abandoned requests and are dropped.
    pub async fn await_reply(
        &self,
        correlation_id: &str,
    ) -> Result<ResolvedResponse, RequestError> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(RequestError::TimedOut {
                    correlation_id: correlation_id.to_string(),
                });
            }

            let batch = self
                .transport
                .receive(&self.reply_queue, 10, self.poll_wait.min(remaining))
                .await?;

            let mut matched = None;
            for message in batch {
                self.transport
                    .delete(&self.reply_queue, &message.receipt)
                    .await?;

                match serde_json::from_str::<ResolvedResponse>(&message.body) {
                    Ok(response) if response.correlation_id() == correlation_id => {
                        matched = Some(response);
                    }
                    Ok(response) => {
                        tracing::debug!(
                            queue = %self.reply_queue,
                            correlation_id = %response.correlation_id(),
                            "Dropping stale reply"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(
                            queue = %self.reply_queue,
                            error = %e,
                            "Dropping unparseable reply"
                        );
                    }
                }
            }

            if let Some(response) = matched {
                return Ok(response);
            }
        }
    }
}

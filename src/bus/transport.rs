//! Core transport trait for the queue bus.

use std::error::Error;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use super::message::{RawMessage, ReceiptHandle};

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection to the broker failed
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    /// The addressed queue does not exist
    #[error("queue not found: {0}")]
    QueueNotFound(String),
    /// The receipt does not match a message currently in flight
    #[error("invalid receipt handle: {0}")]
    InvalidReceipt(String),
    /// The broker rejected the request
    #[error("request rejected: {0}")]
    Rejected(String),
    /// Timeout waiting for the broker
    #[error("transport timeout")]
    Timeout,
    /// Other error
    #[error("transport error: {0}")]
    Other(Box<dyn Error + Send + Sync>),
}

/// Trait for the queue capability the consumer and publisher are built on.
///
/// Implementations might include:
/// - `InMemoryQueue` - For testing and single-process scenarios
/// - an SQS client (real AWS or LocalStack)
/// - a RabbitMQ or Redis Streams adapter
///
/// Queue addresses are opaque strings and are passed on every call, so one
/// transport handle can receive from the request queue and send to any
/// number of caller-owned reply queues.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Long-poll `queue` for up to `max_messages` messages.
    ///
    /// Returns as soon as at least one message is available, or an empty
    /// vec once `wait` elapses. An empty result is not an error.
    async fn receive(
        &self,
        queue: &str,
        max_messages: usize,
        wait: Duration,
    ) -> Result<Vec<RawMessage>, TransportError>;

    /// Remove a received message from `queue` so it is never redelivered.
    async fn delete(&self, queue: &str, receipt: &ReceiptHandle) -> Result<(), TransportError>;

    /// Send a serialized body to `queue`.
    async fn send(&self, queue: &str, body: String) -> Result<(), TransportError>;
}

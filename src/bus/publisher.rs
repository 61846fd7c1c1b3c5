//! Reply publisher for the queue bus.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::transport::{QueueTransport, TransportError};

/// Error type for publish operations.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The message could not be serialized to JSON
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
    /// The transport refused or failed the send
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Serializes messages to JSON and sends them to a queue address.
///
/// Thin wrapper over [`QueueTransport::send`]. Failures are returned to the
/// caller as they are: no retry, no swallowing. Retrying a failed reply is
/// the consumer's job, by leaving the originating message undeleted.
///
/// ## Example
///
/// ```ignore
/// use std::sync::Arc;
/// use profile_relay::bus::{InMemoryQueue, Publisher};
///
/// let queue = InMemoryQueue::new();
/// queue.create_queue("replies");
///
/// let publisher = Publisher::new(Arc::new(queue.clone()));
/// publisher.publish("replies", &serde_json::json!({ "ok": true })).await.unwrap();
///
/// assert_eq!(queue.sent("replies"), vec![r#"{"ok":true}"#.to_string()]);
/// ```
#[derive(Clone)]
pub struct Publisher {
    transport: Arc<dyn QueueTransport>,
}

impl Publisher {
    pub fn new(transport: Arc<dyn QueueTransport>) -> Self {
        Self { transport }
    }

    /// Serialize `message` and send it to `queue`.
    pub async fn publish<T>(&self, queue: &str, message: &T) -> Result<(), PublishError>
    where
        T: Serialize + ?Sized + Sync,
    {
        let body = serde_json::to_string(message)?;
        self.transport.send(queue, body).await?;
        tracing::debug!(queue = %queue, "Message published");
        Ok(())
    }
}

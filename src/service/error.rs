//! Error types for message handlers and the handler registry.

use std::error::Error;

use thiserror::Error;

use crate::bus::PublishError;

/// Error returned by a message handler.
///
/// Returning an error tells the consumer that processing did not conclude:
/// the message is left on the queue and delivered again after the
/// visibility window. Outcomes that have been reported to the caller (for
/// example "user not found") are not errors.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The reply could not be published.
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
    /// Other error.
    #[error("handler error: {0}")]
    Other(Box<dyn Error + Send + Sync>),
}

/// Error building a handler registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Two handlers claim the same event type.
    #[error("a handler is already registered for event type '{0}'")]
    DuplicateHandler(String),
}

//! Message handler contract.

use async_trait::async_trait;

use super::envelope::Envelope;
use super::error::HandlerError;

/// Business logic for one event type.
///
/// `handle` never returns a value. Results reach the caller by publishing
/// to the envelope's reply channel. The return value only tells the
/// consumer what to do with the message:
///
/// - `Ok(())`: processing concluded, delete the message
/// - `Err(_)`: keep the message so the transport delivers it again
///
/// Handlers must tolerate duplicate deliveries of the same envelope.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// The event type this handler is responsible for.
    fn event_type(&self) -> &str;

    /// Process one envelope of this handler's event type.
    async fn handle(&self, envelope: &Envelope) -> Result<(), HandlerError>;
}

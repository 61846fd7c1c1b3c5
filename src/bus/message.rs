//! Transport-level message as handed out by a queue.

use std::fmt;

/// Opaque token identifying one delivery of a message.
///
/// A fresh receipt is issued on every delivery, so a receipt from an
/// expired delivery no longer deletes the message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReceiptHandle(String);

impl ReceiptHandle {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message received from a queue, before any parsing.
#[derive(Clone, Debug)]
pub struct RawMessage {
    /// Stable identifier of the message across redeliveries
    pub message_id: String,
    /// Receipt for this particular delivery
    pub receipt: ReceiptHandle,
    /// Serialized body (JSON for every message this crate produces)
    pub body: String,
    /// How many times the message has been delivered, starting at 1
    pub receive_count: u32,
}

impl RawMessage {
    pub fn new(
        message_id: impl Into<String>,
        receipt: ReceiptHandle,
        body: impl Into<String>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            receipt,
            body: body.into(),
            receive_count: 1,
        }
    }

    /// Whether this delivery is a redelivery of an earlier one.
    pub fn is_redelivery(&self) -> bool {
        self.receive_count > 1
    }
}

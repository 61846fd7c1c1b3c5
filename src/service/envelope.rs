//! Inbound event envelope and its reply channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The message body could not be parsed as an envelope.
///
/// Such a message is poison: no amount of redelivery makes it parse.
#[derive(Debug, Error)]
#[error("invalid envelope: {0}")]
pub struct EnvelopeError(#[from] serde_json::Error);

/// The parsed form of one inbound queue message.
///
/// Only `eventType` is required to parse. The reply fields are optional at
/// this boundary so that a request without them still reaches its handler,
/// which decides what a missing reply channel means. Use
/// [`reply_channel`](Self::reply_channel) rather than the raw fields.
///
/// ```json
/// {
///   "eventType": "USER_PROFILE_REQUESTED",
///   "correlationId": "corr-123",
///   "replyQueueUrl": "https://queue.example/reply-7f3a",
///   "payload": { "userId": 5 }
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Selects the handler
    pub event_type: String,
    /// Caller-chosen token echoed on the reply
    #[serde(default)]
    pub correlation_id: Option<String>,
    /// Caller-owned queue the reply is sent to
    #[serde(default, rename = "replyQueueUrl", alias = "replyAddress")]
    pub reply_address: Option<String>,
    /// Event-specific data
    #[serde(default)]
    pub payload: Value,
}

/// Where and under which correlation id a reply must be sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplyChannel<'a> {
    pub correlation_id: &'a str,
    pub reply_address: &'a str,
}

impl Envelope {
    /// Build a request envelope with a reply channel.
    pub fn request(
        event_type: impl Into<String>,
        correlation_id: impl Into<String>,
        reply_address: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            correlation_id: Some(correlation_id.into()),
            reply_address: Some(reply_address.into()),
            payload,
        }
    }

    /// Parse a raw message body.
    pub fn parse(body: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(body)?)
    }

    /// The reply channel, if both the correlation id and the reply address
    /// are present and non-empty.
    pub fn reply_channel(&self) -> Option<ReplyChannel<'_>> {
        let correlation_id = self.correlation_id.as_deref().filter(|s| !s.is_empty())?;
        let reply_address = self.reply_address.as_deref().filter(|s| !s.is_empty())?;
        Some(ReplyChannel {
            correlation_id,
            reply_address,
        })
    }

    /// Look up a field of an object payload.
    pub fn payload_field(&self, name: &str) -> Option<&Value> {
        self.payload.as_object()?.get(name)
    }
}

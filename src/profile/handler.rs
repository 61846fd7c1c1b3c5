//! Handler for `USER_PROFILE_REQUESTED` events.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::bus::Publisher;
use crate::service::{Envelope, ErrorCode, HandlerError, MessageHandler, ResolvedResponse};

use super::resolver::{ProfileResolver, ResolveError};

/// Event type of a profile request.
pub const USER_PROFILE_REQUESTED: &str = "USER_PROFILE_REQUESTED";

/// Resolves the full profile (user plus client or professional extension)
/// for the requested user and publishes a `USER_PROFILE_RESOLVED` reply on
/// the caller's reply queue.
///
/// Request payload: `{ "userId": <integer> }`.
///
/// A request without a correlation id, a reply queue or a `userId` is
/// dropped with a warning: without a reply channel there is nowhere to
/// report the problem. A `userId` that is present but not an integer is
/// answered with an `INTERNAL_ERROR` reply.
pub struct UserProfileRequestedHandler {
    resolver: Arc<dyn ProfileResolver>,
    publisher: Publisher,
}

impl UserProfileRequestedHandler {
    pub fn new(resolver: Arc<dyn ProfileResolver>, publisher: Publisher) -> Self {
        Self {
            resolver,
            publisher,
        }
    }

    async fn resolve(
        &self,
        event_type: &str,
        correlation_id: &str,
        user_id: i64,
    ) -> ResolvedResponse {
        match self.resolver.resolve_full_profile(user_id).await {
            Ok(profile) => match serde_json::to_value(&profile) {
                Ok(payload) => ResolvedResponse::success(event_type, correlation_id, payload),
                Err(e) => ResolvedResponse::failure(
                    event_type,
                    correlation_id,
                    ErrorCode::InternalError,
                    e.to_string(),
                ),
            },
            Err(e @ ResolveError::NotFound { .. }) => ResolvedResponse::failure(
                event_type,
                correlation_id,
                ErrorCode::UserNotFound,
                e.to_string(),
            ),
            Err(e) => {
                tracing::error!(
                    correlation_id = %correlation_id,
                    user_id,
                    error = %e,
                    "Profile resolution failed"
                );
                ResolvedResponse::failure(
                    event_type,
                    correlation_id,
                    ErrorCode::InternalError,
                    internal_message(&e),
                )
            }
        }
    }
}

/// The `userId` of a request payload.
#[derive(Debug, PartialEq)]
enum RequestedUserId<'a> {
    /// Absent, `null`, `false`, `0` or `""`.
    Missing,
    /// An integer, or a float with no fractional part.
    Id(i64),
    /// Present but not usable as an id.
    Invalid(&'a Value),
}

fn requested_user_id(envelope: &Envelope) -> RequestedUserId<'_> {
    let Some(value) = envelope.payload_field("userId") else {
        return RequestedUserId::Missing;
    };

    match value {
        Value::Null | Value::Bool(false) => RequestedUserId::Missing,
        Value::String(s) if s.is_empty() => RequestedUserId::Missing,
        Value::Number(n) => match n.as_i64().or_else(|| n.as_f64().and_then(integral)) {
            Some(0) => RequestedUserId::Missing,
            Some(id) => RequestedUserId::Id(id),
            None => RequestedUserId::Invalid(value),
        },
        _ => RequestedUserId::Invalid(value),
    }
}

/// `5.0` as `5`; `None` for fractions and values outside the `i64` range.
fn integral(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn internal_message(err: &ResolveError) -> String {
    let message = err.to_string();
    if message.is_empty() {
        "Unknown error".to_string()
    } else {
        message
    }
}

#[async_trait]
impl MessageHandler for UserProfileRequestedHandler {
    fn event_type(&self) -> &str {
        USER_PROFILE_REQUESTED
    }

    async fn handle(&self, envelope: &Envelope) -> Result<(), HandlerError> {
        let (channel, user_id) = match (envelope.reply_channel(), requested_user_id(envelope)) {
            (Some(channel), RequestedUserId::Id(id)) => (channel, Ok(id)),
            (Some(channel), RequestedUserId::Invalid(value)) => (channel, Err(value)),
            _ => {
                tracing::warn!(
                    correlation_id = ?envelope.correlation_id,
                    reply_address = ?envelope.reply_address,
                    payload = %envelope.payload,
                    "Malformed profile request, missing required fields"
                );
                return Ok(());
            }
        };

        let response = match user_id {
            Ok(id) => {
                self.resolve(&envelope.event_type, channel.correlation_id, id)
                    .await
            }
            Err(value) => {
                tracing::warn!(
                    correlation_id = %channel.correlation_id,
                    user_id = %value,
                    "Profile request with a non-integer userId"
                );
                ResolvedResponse::failure(
                    &envelope.event_type,
                    channel.correlation_id,
                    ErrorCode::InternalError,
                    format!("Invalid userId: {}", value),
                )
            }
        };

        self.publisher
            .publish(channel.reply_address, &response)
            .await?;

        tracing::debug!(
            correlation_id = %channel.correlation_id,
            reply_address = %channel.reply_address,
            success = response.is_success(),
            "Profile reply published"
        );

        Ok(())
    }
}

//! Outbound reply sent on a caller's reply queue.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

const REQUESTED_SUFFIX: &str = "_REQUESTED";
const RESOLVED_SUFFIX: &str = "_RESOLVED";

/// Derive the reply event type from a request event type.
///
/// `USER_PROFILE_REQUESTED` becomes `USER_PROFILE_RESOLVED`. A request type
/// without the `_REQUESTED` suffix gets `_RESOLVED` appended.
pub fn resolved_event_type(request_event_type: &str) -> String {
    let base = request_event_type
        .strip_suffix(REQUESTED_SUFFIX)
        .unwrap_or(request_event_type);
    format!("{}{}", base, RESOLVED_SUFFIX)
}

/// Machine-readable reason carried by an error reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The requested user does not exist
    UserNotFound,
    /// Resolution failed for any other reason
    InternalError,
    /// A code this crate does not know about
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::Unknown => "UNKNOWN",
        };
        f.write_str(code)
    }
}

/// Error body of a reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseError {
    pub code: ErrorCode,
    pub message: String,
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ResponseError {}

/// Reply to a request, in one of two shapes:
///
/// - success: `payload` set, `error` null
/// - error: `payload` null, `error` set
///
/// Both fields are always serialized, as `null` when absent. The correlation
/// id is copied from the request and never generated here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedResponse {
    event_type: String,
    correlation_id: String,
    payload: Option<Value>,
    error: Option<ResponseError>,
}

impl ResolvedResponse {
    /// A success reply to a request of `request_event_type`.
    pub fn success(request_event_type: &str, correlation_id: &str, payload: Value) -> Self {
        Self {
            event_type: resolved_event_type(request_event_type),
            correlation_id: correlation_id.to_string(),
            payload: Some(payload),
            error: None,
        }
    }

    /// An error reply to a request of `request_event_type`.
    pub fn failure(
        request_event_type: &str,
        correlation_id: &str,
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event_type: resolved_event_type(request_event_type),
            correlation_id: correlation_id.to_string(),
            payload: None,
            error: Some(ResponseError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn payload(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn error(&self) -> Option<&ResponseError> {
        self.error.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The payload on success, the error otherwise.
    ///
    /// A success reply with a null payload yields `Value::Null`.
    pub fn into_result(self) -> Result<Value, ResponseError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.payload.unwrap_or(Value::Null)),
        }
    }
}

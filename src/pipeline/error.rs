//! Denial reasons and their HTTP mapping.

use axum::http::StatusCode;
use thiserror::Error;

/// Broad class of a denial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RateLimited,
    PolicyRejected,
    MalformedRequest,
    Unauthorized,
    ExecutionFailed,
    Internal,
}

/// Why a request was not admitted or not executed.
///
/// The `Display` text is the public message returned to the caller; it never
/// carries request data or internal detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("Too Many Requests")]
    RateLimited,

    #[error("Origin not allowed")]
    OriginNotAllowed,

    #[error("IP not allowed")]
    IpNotAllowed,

    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Invalid request body")]
    BodyRead,

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Missing fields")]
    MissingFields,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Stale timestamp")]
    StaleTimestamp,

    #[error("Bad signature")]
    BadSignature,

    #[error("Command not whitelisted")]
    CommandNotWhitelisted,

    #[error("Empty command")]
    EmptyCommand,

    #[error("Execution error")]
    ExecutionFailed,

    #[error("Internal error")]
    Internal,
}

impl GateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GateError::RateLimited => ErrorKind::RateLimited,
            GateError::OriginNotAllowed
            | GateError::IpNotAllowed
            | GateError::CommandNotWhitelisted => ErrorKind::PolicyRejected,
            GateError::PayloadTooLarge
            | GateError::BodyRead
            | GateError::InvalidJson
            | GateError::MissingFields
            | GateError::EmptyCommand => ErrorKind::MalformedRequest,
            GateError::Unauthorized | GateError::StaleTimestamp | GateError::BadSignature => {
                ErrorKind::Unauthorized
            }
            GateError::ExecutionFailed => ErrorKind::ExecutionFailed,
            GateError::Internal => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GateError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GateError::OriginNotAllowed
            | GateError::IpNotAllowed
            | GateError::CommandNotWhitelisted => StatusCode::FORBIDDEN,
            GateError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            GateError::BodyRead
            | GateError::InvalidJson
            | GateError::MissingFields
            | GateError::EmptyCommand => StatusCode::BAD_REQUEST,
            GateError::Unauthorized | GateError::StaleTimestamp | GateError::BadSignature => {
                StatusCode::UNAUTHORIZED
            }
            GateError::ExecutionFailed | GateError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            GateError::RateLimited => "rate_limited",
            GateError::OriginNotAllowed => "origin_not_allowed",
            GateError::IpNotAllowed => "ip_not_allowed",
            GateError::PayloadTooLarge => "payload_too_large",
            GateError::BodyRead => "body_read",
            GateError::InvalidJson => "invalid_json",
            GateError::MissingFields => "missing_fields",
            GateError::Unauthorized => "unauthorized",
            GateError::StaleTimestamp => "stale_timestamp",
            GateError::BadSignature => "bad_signature",
            GateError::CommandNotWhitelisted => "command_not_whitelisted",
            GateError::EmptyCommand => "empty_command",
            GateError::ExecutionFailed => "execution_failed",
            GateError::Internal => "internal",
        }
    }
}

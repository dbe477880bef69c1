//! JSON response envelopes.
//!
//! # Responsibilities
//! - Every response body is JSON with a `status` field
//! - Failures carry a short public `message`
//! - Map gate errors and handler panics to status codes
//!
//! # Design Decisions
//! - Messages come from `GateError`'s Display text only; request data is never echoed
//! - Panics become 500 "Internal error" without the panic payload

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::any::Any;

use crate::pipeline::GateError;

#[derive(Debug, Serialize)]
pub struct OkBody {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub status: &'static str,
    pub message: &'a str,
}

/// `200 {"status":"ok"}`
pub fn ok_response() -> Response {
    (StatusCode::OK, Json(OkBody { status: "ok", ts: None })).into_response()
}

/// `200 {"status":"ok","ts":<unix seconds>}`
pub fn ping_response(ts: i64) -> Response {
    (StatusCode::OK, Json(OkBody { status: "ok", ts: Some(ts) })).into_response()
}

/// `<status> {"status":"error","message":<message>}`
pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorBody {
            status: "error",
            message,
        }),
    )
        .into_response()
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        error_response(self.status(), &self.to_string())
    }
}

/// Handler for `CatchPanicLayer`.
pub fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Handler panicked");
    GateError::Internal.into_response()
}

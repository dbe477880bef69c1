//! Request body limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size
//! - Reject an oversized declared Content-Length before reading
//! - Count streamed bytes as they arrive and stop at the limit
//!
//! # Design Decisions
//! - Limits checked before full parsing (early rejection)
//! - Reading stops on the first frame that crosses the limit; nothing more is buffered

use axum::body::{Body, Bytes};
use futures_util::StreamExt;
use thiserror::Error;

/// Largest accepted `/zcf/exec` body in bytes.
pub const MAX_BODY_BYTES: usize = 2048;

#[derive(Debug, Error)]
pub enum BodyError {
    #[error("body exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to read body: {0}")]
    Read(String),
}

/// Read a body to completion, failing as soon as it exceeds `limit` bytes.
pub async fn read_bounded(
    body: Body,
    declared_len: Option<u64>,
    limit: usize,
) -> Result<Bytes, BodyError> {
    if declared_len.is_some_and(|len| len > limit as u64) {
        return Err(BodyError::TooLarge { limit });
    }

    let mut stream = body.into_data_stream();
    let mut buf: Vec<u8> = Vec::new();

    while let Some(frame) = stream.next().await {
        let chunk = frame.map_err(|e| BodyError::Read(e.to_string()))?;
        if buf.len() + chunk.len() > limit {
            return Err(BodyError::TooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buf))
}

//! Client for the command gate's `/zcf` endpoints.

pub mod client;

pub use client::{sign_command, ExecRequest, GateClient, GateResponse};

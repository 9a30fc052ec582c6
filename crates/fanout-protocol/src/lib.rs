//! Signaling protocol for the Fanout SFU
//!
//! Request and response bodies exchanged between publishing/playing clients
//! and the SFU's HTTP signaling endpoints.

pub mod messages;
pub mod types;

pub use messages::{SignalRequest, SignalResponse};
pub use types::{ResponseCode, UnknownResponseCode};

//! Wire encoding of session descriptions
//!
//! Offers and answers travel through the signaling layer as base64 text
//! wrapping the JSON form (`{"type": ..., "sdp": ...}`) of an
//! [`RTCSessionDescription`].

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

use crate::error::{Result, SfuError};

/// Encode a session description for the signaling layer
pub fn encode(description: &RTCSessionDescription) -> Result<String> {
    let json = serde_json::to_vec(description)
        .map_err(|e| SfuError::negotiation("encode local description", e))?;
    Ok(STANDARD.encode(json))
}

/// Decode a session description received from the signaling layer
pub fn decode(payload: &str) -> Result<RTCSessionDescription> {
    let json = STANDARD
        .decode(payload.trim())
        .map_err(|e| SfuError::Decode(format!("invalid base64: {e}")))?;

    serde_json::from_slice(&json).map_err(|e| SfuError::Decode(format!("invalid JSON: {e}")))
}

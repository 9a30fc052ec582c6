//! Offer/answer exchange shared by the publish and play pipelines

use std::time::Duration;

use tokio::sync::mpsc;

use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;

use super::signal;
use crate::error::{Result, SfuError};

/// Apply `offer`, answer it, and wait for ICE gathering so the returned
/// (encoded) answer carries every candidate. Trickle ICE is not supported.
pub(crate) async fn answer_offer(
    peer_connection: &RTCPeerConnection,
    offer: RTCSessionDescription,
    gather_timeout: Duration,
) -> Result<String> {
    peer_connection
        .set_remote_description(offer)
        .await
        .map_err(|e| SfuError::negotiation("set remote description", e))?;

    let answer = peer_connection
        .create_answer(None)
        .await
        .map_err(|e| SfuError::negotiation("create answer", e))?;

    let mut gather_complete = peer_connection.gathering_complete_promise().await;

    peer_connection
        .set_local_description(answer)
        .await
        .map_err(|e| SfuError::negotiation("set local description", e))?;

    wait_for_gathering(&mut gather_complete, gather_timeout).await?;

    let local_description = peer_connection
        .local_description()
        .await
        .ok_or_else(|| SfuError::Negotiation("local description unavailable after ICE gathering".to_string()))?;

    signal::encode(&local_description)
}

/// Bound the wait for the gathering-complete signal
async fn wait_for_gathering(gather_complete: &mut mpsc::Receiver<()>, gather_timeout: Duration) -> Result<()> {
    tokio::time::timeout(gather_timeout, gather_complete.recv())
        .await
        .map(|_| ())
        .map_err(|_| {
            SfuError::Negotiation(format!(
                "ICE gathering did not complete within {}s",
                gather_timeout.as_secs_f32()
            ))
        })
}
